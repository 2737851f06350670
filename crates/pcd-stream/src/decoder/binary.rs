use std::borrow::Cow;

use super::row::RowReader;
use crate::{
    batch::{AttributeBatch, BatchSink},
    error::PcdError,
    header::PcdHeader,
};

/// Decode row-major binary point data in windows of `chunk_size` bytes.
///
/// Bytes of a row cut by the window edge are carried into the next window. Windows that
/// complete no row emit nothing. Bytes left over after the last window are an error.
pub(crate) fn decode<S: BatchSink + ?Sized>(
    data: &[u8],
    header: &PcdHeader,
    chunk_size: usize,
    sink: &mut S,
) -> Result<(), PcdError> {
    let header_len = header.header_len();
    let total = data.len();
    let body = &data[header_len..];
    let row_size = header.layout().row_size();
    let reader = RowReader::new(header.layout())?;

    let mut carry: Vec<u8> = Vec::new();
    let mut consumed = 0;

    for window in body.chunks(chunk_size) {
        consumed += window.len();

        let view: Cow<[u8]> = if carry.is_empty() {
            Cow::Borrowed(window)
        } else {
            let mut joined = std::mem::take(&mut carry);
            joined.extend_from_slice(window);
            Cow::Owned(joined)
        };

        let rows = view.len() / row_size;
        let complete = rows * row_size;

        let mut batch = AttributeBatch::new(consumed + header_len, total);
        for row in 0..rows {
            let base = row * row_size;
            reader.read_point(&view, |slot| base + slot.offset, &mut batch)?;
        }
        carry.extend_from_slice(&view[complete..]);

        if !batch.is_empty() {
            log::trace!("binary batch: {rows} rows, {}/{}", batch.loaded, total);
            sink.on_batch(batch);
        }
    }

    if !carry.is_empty() {
        log::warn!(
            "binary data ends with a partial row of {} bytes (row size {})",
            carry.len(),
            row_size
        );
        return Err(PcdError::TruncatedRow {
            remaining: carry.len(),
            row_size,
        });
    }

    Ok(())
}
