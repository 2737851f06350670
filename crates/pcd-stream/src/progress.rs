/// Combines the byte progress of several concurrent decodes into one fraction.
///
/// Every source weighs the same regardless of its size.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    fractions: Vec<f64>,
}

impl ProgressAggregator {
    /// Create an aggregator for `num_sources` sources, all at zero.
    pub fn new(num_sources: usize) -> Self {
        Self {
            fractions: vec![0.0; num_sources],
        }
    }

    /// Number of sources tracked.
    pub fn num_sources(&self) -> usize {
        self.fractions.len()
    }

    /// Record the progress of source `index` and return the overall fraction.
    ///
    /// Out-of-range indices are ignored. A source with `total == 0` counts as done.
    pub fn update(&mut self, index: usize, loaded: usize, total: usize) -> f64 {
        if let Some(fraction) = self.fractions.get_mut(index) {
            *fraction = if total == 0 {
                1.0
            } else {
                (loaded as f64 / total as f64).clamp(0.0, 1.0)
            };
        }
        self.overall()
    }

    /// Mean of the per-source fractions, in `[0, 1]`.
    pub fn overall(&self) -> f64 {
        if self.fractions.is_empty() {
            return 1.0;
        }
        self.fractions.iter().sum::<f64>() / self.fractions.len() as f64
    }

    /// Overall progress expressed in sources, `overall() * num_sources()`.
    pub fn overall_loaded(&self) -> f64 {
        self.fractions.iter().sum()
    }
}
