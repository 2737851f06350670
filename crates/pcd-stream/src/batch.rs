use crate::decoder::DecodeSummary;

/// A bundle of decoded point attributes plus the byte progress when it was emitted.
///
/// Each sequence is only populated when the header declares the matching fields. An empty
/// sequence means the attribute is absent, not that it is zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBatch {
    /// Point positions, 3 components per point.
    pub position: Vec<f32>,
    /// Point normals, 3 components per point.
    pub normal: Vec<f32>,
    /// Linear RGB colors in `[0, 1]`, 3 components per point.
    pub color: Vec<f32>,
    /// Intensity, 1 component per point.
    pub intensity: Vec<f32>,
    /// Label, 1 component per point.
    pub label: Vec<i32>,
    /// Bytes of the source buffer accounted for so far.
    pub loaded: usize,
    /// Total bytes of the source buffer.
    pub total: usize,
}

impl AttributeBatch {
    /// Create an empty batch with the given progress.
    pub fn new(loaded: usize, total: usize) -> Self {
        Self {
            loaded,
            total,
            ..Default::default()
        }
    }

    /// Check if no attribute holds any value.
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
            && self.normal.is_empty()
            && self.color.is_empty()
            && self.intensity.is_empty()
            && self.label.is_empty()
    }

    /// Number of points in the batch, taken from the longest attribute.
    pub fn num_points(&self) -> usize {
        (self.position.len() / 3)
            .max(self.normal.len() / 3)
            .max(self.color.len() / 3)
            .max(self.intensity.len())
            .max(self.label.len())
    }

    /// Fraction of the source buffer decoded when this batch was emitted.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f64 / self.total as f64
        }
    }

    /// Append the attributes of `other` and take over its progress.
    pub fn append(&mut self, mut other: AttributeBatch) {
        self.position.append(&mut other.position);
        self.normal.append(&mut other.normal);
        self.color.append(&mut other.color);
        self.intensity.append(&mut other.intensity);
        self.label.append(&mut other.label);
        self.loaded = other.loaded;
        self.total = other.total;
    }
}

/// Receives the batches produced by a decoder.
///
/// Any `FnMut(AttributeBatch)` closure is a sink that ignores completion.
pub trait BatchSink {
    /// Called once per emitted batch, in order.
    fn on_batch(&mut self, batch: AttributeBatch);

    /// Called exactly once after the last batch of a successful decode.
    fn on_complete(&mut self, _summary: &DecodeSummary) {}
}

impl<F> BatchSink for F
where
    F: FnMut(AttributeBatch),
{
    fn on_batch(&mut self, batch: AttributeBatch) {
        self(batch)
    }
}

/// A sink that merges every batch into one.
#[derive(Debug, Default)]
pub struct BatchCollector {
    merged: AttributeBatch,
    batches: usize,
    summary: Option<DecodeSummary>,
}

impl BatchCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches received.
    pub fn num_batches(&self) -> usize {
        self.batches
    }

    /// The completion summary, once the decode has finished.
    pub fn summary(&self) -> Option<&DecodeSummary> {
        self.summary.as_ref()
    }

    /// Check if the decode signalled completion.
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    /// Get as reference the merged attributes.
    pub fn merged(&self) -> &AttributeBatch {
        &self.merged
    }

    /// Consume the collector and return the merged attributes.
    pub fn into_batch(self) -> AttributeBatch {
        self.merged
    }
}

impl BatchSink for BatchCollector {
    fn on_batch(&mut self, batch: AttributeBatch) {
        self.batches += 1;
        self.merged.append(batch);
    }

    fn on_complete(&mut self, summary: &DecodeSummary) {
        self.summary = Some(summary.clone());
    }
}
