use crate::{
    batch::{AttributeBatch, BatchSink},
    color,
    error::PcdError,
    header::PcdHeader,
    layout::{FieldEntry, FieldType},
};

/// Column index and declared type of one ASCII field.
#[derive(Debug, Clone, Copy)]
struct Column {
    index: usize,
    field_type: FieldType,
}

impl Column {
    fn resolve(field: &FieldEntry) -> Result<Self, PcdError> {
        Ok(Self {
            index: field.offset,
            field_type: field.field_type,
        })
    }

    /// Missing or unparsable values decode as NaN.
    fn float(&self, tokens: &[&str]) -> f32 {
        tokens
            .get(self.index)
            .and_then(|t| t.parse().ok())
            .unwrap_or(f32::NAN)
    }

    /// Integers written with a fractional part are truncated; anything else decodes as 0.
    fn int(&self, tokens: &[&str]) -> i64 {
        tokens
            .get(self.index)
            .and_then(|t| {
                t.parse::<i64>()
                    .ok()
                    .or_else(|| t.parse::<f64>().ok().map(|v| v as i64))
            })
            .unwrap_or(0)
    }

    /// A float-typed rgb column stores the packed value in the bit pattern of an f32.
    fn rgb(&self, tokens: &[&str]) -> [f32; 3] {
        let packed = match self.field_type {
            FieldType::Float => self.float(tokens).to_bits(),
            FieldType::Unsigned | FieldType::Signed => self.int(tokens) as u32,
        };
        color::unpack_rgb(packed)
    }
}

/// Decode ASCII point data in windows of `chunk_size` bytes.
///
/// The unterminated tail of each window is carried over and completed by the next one. A
/// batch is emitted after every window; a final unterminated line is decoded last.
pub(crate) fn decode<S: BatchSink + ?Sized>(
    data: &[u8],
    header: &PcdHeader,
    chunk_size: usize,
    sink: &mut S,
) -> Result<(), PcdError> {
    let header_len = header.header_len();
    let total = data.len();
    let body = &data[header_len..];
    let slots = header.layout().attribute_slots(Column::resolve)?;

    let decode_line = |line: &[u8], batch: &mut AttributeBatch| {
        let text = String::from_utf8_lossy(line);
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return;
        }

        if let Some(xyz) = &slots.position {
            batch
                .position
                .extend(xyz.iter().map(|c| c.map_or(f32::NAN, |c| c.float(&tokens))));
        }
        if let Some(column) = &slots.rgb {
            batch.color.extend(column.rgb(&tokens));
        }
        if let Some(nxyz) = &slots.normal {
            batch
                .normal
                .extend(nxyz.iter().map(|c| c.map_or(f32::NAN, |c| c.float(&tokens))));
        }
        if let Some(column) = &slots.intensity {
            batch.intensity.push(column.float(&tokens));
        }
        if let Some(column) = &slots.label {
            batch.label.push(column.int(&tokens) as i32);
        }
    };

    let mut carry: Vec<u8> = Vec::new();
    let mut consumed = 0;

    for window in body.chunks(chunk_size) {
        consumed += window.len();
        carry.extend_from_slice(window);

        let mut batch = AttributeBatch::new(consumed + header_len, total);
        if let Some(last) = carry.iter().rposition(|&b| b == b'\n') {
            for line in carry[..last].split(|&b| b == b'\n') {
                decode_line(line, &mut batch);
            }
            carry.drain(..=last);
        }

        log::trace!("ascii batch: {} points, {}/{}", batch.num_points(), batch.loaded, total);
        sink.on_batch(batch);
    }

    if !carry.is_empty() {
        let mut batch = AttributeBatch::new(total, total);
        decode_line(&carry, &mut batch);
        log::trace!("ascii final line: {} points", batch.num_points());
        sink.on_batch(batch);
    }

    Ok(())
}
