use super::row::RowReader;
use crate::{
    batch::{AttributeBatch, BatchSink},
    error::PcdError,
    header::PcdHeader,
    lzf,
};

/// Decode LZF-compressed column-major point data in one pass.
///
/// The body starts with the compressed and decompressed sizes as little-endian `u32`.
/// Exactly one batch is emitted, with `loaded == total`.
pub(crate) fn decode<S: BatchSink + ?Sized>(
    data: &[u8],
    header: &PcdHeader,
    sink: &mut S,
) -> Result<(), PcdError> {
    let total = data.len();
    let body = &data[header.header_len()..];
    let reader = RowReader::new(header.layout())?;

    let sizes = body.get(..8).ok_or(PcdError::TruncatedData {
        expected: 8,
        actual: body.len(),
    })?;
    let compressed_size = read_u32(&sizes[..4]) as usize;
    let decompressed_size = read_u32(&sizes[4..]) as usize;

    let compressed = body
        .get(8..8 + compressed_size)
        .ok_or(PcdError::TruncatedData {
            expected: 8 + compressed_size,
            actual: body.len(),
        })?;

    let points = header.points();
    let row_size = header.layout().row_size();
    let required = points
        .checked_mul(row_size)
        .ok_or_else(|| PcdError::MalformedHeader("POINTS x row size overflows".into()))?;
    if decompressed_size < required {
        return Err(PcdError::TruncatedData {
            expected: required,
            actual: decompressed_size,
        });
    }

    log::debug!("lzf: {compressed_size} -> {decompressed_size} bytes");
    let decompressed = lzf::decompress(compressed, decompressed_size)?;

    // field f of point i lives at points * offset[f] + stride[f] * i
    let mut batch = AttributeBatch::new(total, total);
    for i in 0..points {
        reader.read_point(
            &decompressed,
            |slot| points * slot.offset + slot.stride * i,
            &mut batch,
        )?;
    }

    log::trace!("binary_compressed batch: {points} points");
    sink.on_batch(batch);

    Ok(())
}

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}
