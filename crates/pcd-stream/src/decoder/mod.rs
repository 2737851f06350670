mod ascii;
mod binary;
mod compressed;
mod row;

use crate::{
    batch::{AttributeBatch, BatchCollector, BatchSink},
    error::PcdError,
    header::{Encoding, PcdHeader, DEFAULT_HEADER_CHUNK_SIZE},
};

/// Default window, in bytes, used by the streaming decoders.
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// Configuration of a [`PcdDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Bytes of point data decoded per emitted batch.
    pub chunk_size: usize,
    /// Bytes scanned per step while looking for the end of the header.
    pub header_chunk_size: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            header_chunk_size: DEFAULT_HEADER_CHUNK_SIZE,
        }
    }
}

impl DecodeOptions {
    /// Set the point data window.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the header scan window.
    pub fn with_header_chunk_size(mut self, header_chunk_size: usize) -> Self {
        self.header_chunk_size = header_chunk_size;
        self
    }

    fn validate(&self) -> Result<(), PcdError> {
        if self.chunk_size == 0 {
            return Err(PcdError::InvalidChunkSize(self.chunk_size));
        }
        if self.header_chunk_size == 0 {
            return Err(PcdError::InvalidChunkSize(self.header_chunk_size));
        }
        Ok(())
    }
}

/// Summary handed to [`BatchSink::on_complete`] after a successful decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeSummary {
    /// The encoding of the point data.
    pub encoding: Encoding,
    /// Number of points declared by the header.
    pub declared_points: usize,
    /// Number of points emitted across all batches.
    pub decoded_points: usize,
    /// Number of batches emitted.
    pub batches: usize,
    /// Size of the source buffer in bytes.
    pub total: usize,
}

/// Counts what passes through to the caller's sink.
struct Counting<'a, S: ?Sized> {
    inner: &'a mut S,
    batches: usize,
    points: usize,
}

impl<S: BatchSink + ?Sized> BatchSink for Counting<'_, S> {
    fn on_batch(&mut self, batch: AttributeBatch) {
        self.batches += 1;
        self.points += batch.num_points();
        self.inner.on_batch(batch);
    }
}

/// Streaming PCD decoder.
///
/// A decoder holds only its configuration; every call to [`PcdDecoder::decode`] owns its
/// own state, so one decoder can be shared across threads.
///
/// # Example
///
/// ```
/// use pcd_stream::{AttributeBatch, DecodeOptions, PcdDecoder};
///
/// let data = b"FIELDS x y z\nPOINTS 2\nDATA ascii\n1 2 3\n4 5 6";
/// let decoder = PcdDecoder::new(DecodeOptions::default().with_chunk_size(4));
///
/// let mut progress = Vec::new();
/// let summary = decoder
///     .decode(data, &mut |batch: AttributeBatch| progress.push(batch.loaded))
///     .unwrap();
///
/// assert_eq!(summary.decoded_points, 2);
/// assert_eq!(progress.last(), Some(&data.len()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PcdDecoder {
    options: DecodeOptions,
}

impl PcdDecoder {
    /// Create a decoder with the given options.
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Get the decoder options.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Parse only the header of `data`.
    pub fn decode_header(&self, data: &[u8]) -> Result<PcdHeader, PcdError> {
        self.options.validate()?;
        PcdHeader::parse_with_window(data, self.options.header_chunk_size)
    }

    /// Decode `data`, emitting batches into `sink`.
    ///
    /// ASCII and binary data emit one batch per window with growing `loaded`; compressed
    /// data emits a single batch. On success `sink.on_complete` is called exactly once and
    /// the same summary is returned. On error nothing emitted should be used.
    ///
    /// # Arguments
    ///
    /// * `data` - The whole PCD buffer.
    /// * `sink` - Receives the batches and the completion signal.
    pub fn decode<S: BatchSink + ?Sized>(
        &self,
        data: &[u8],
        sink: &mut S,
    ) -> Result<DecodeSummary, PcdError> {
        let header = self.decode_header(data)?;
        log::debug!(
            "pcd header: {} fields {:?}, {} points, {} header bytes, row size {}",
            header.encoding(),
            header.fields(),
            header.points(),
            header.header_len(),
            header.layout().row_size()
        );

        let mut counting = Counting {
            inner: &mut *sink,
            batches: 0,
            points: 0,
        };

        let chunk_size = self.options.chunk_size;
        match header.encoding() {
            Encoding::Ascii => ascii::decode(data, &header, chunk_size, &mut counting)?,
            Encoding::Binary => binary::decode(data, &header, chunk_size, &mut counting)?,
            Encoding::BinaryCompressed => compressed::decode(data, &header, &mut counting)?,
        }

        let summary = DecodeSummary {
            encoding: header.encoding(),
            declared_points: header.points(),
            decoded_points: counting.points,
            batches: counting.batches,
            total: data.len(),
        };
        if summary.decoded_points != summary.declared_points {
            log::debug!(
                "decoded {} points, header declares {}",
                summary.decoded_points,
                summary.declared_points
            );
        }

        sink.on_complete(&summary);
        Ok(summary)
    }

    /// Decode `data` and merge every batch into one.
    pub fn decode_all(&self, data: &[u8]) -> Result<AttributeBatch, PcdError> {
        let mut collector = BatchCollector::new();
        self.decode(data, &mut collector)?;
        let mut merged = collector.into_batch();
        merged.loaded = data.len();
        merged.total = data.len();
        Ok(merged)
    }
}

/// Decode `data` with the default options, emitting batches into `sink`.
pub fn decode<S: BatchSink + ?Sized>(data: &[u8], sink: &mut S) -> Result<DecodeSummary, PcdError> {
    PcdDecoder::default().decode(data, sink)
}

/// Decode PCD text in a single pass and return the merged attributes.
///
/// # Example
///
/// ```
/// let batch = pcd_stream::decode_str("FIELDS x y z intensity\nDATA ascii\n1 2 3 0.5\n").unwrap();
///
/// assert_eq!(batch.position, vec![1.0, 2.0, 3.0]);
/// assert_eq!(batch.intensity, vec![0.5]);
/// assert!(batch.color.is_empty());
/// ```
pub fn decode_str(text: &str) -> Result<AttributeBatch, PcdError> {
    let data = text.as_bytes();
    let options = DecodeOptions::default().with_chunk_size(data.len().max(1));
    PcdDecoder::new(options).decode_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_signalled_once() {
        let data = b"FIELDS x y z\nPOINTS 2\nDATA ascii\n1 2 3\n4 5 6";
        let mut collector = BatchCollector::new();
        let summary = decode(data, &mut collector).unwrap();
        assert!(collector.is_complete());
        assert_eq!(collector.summary(), Some(&summary));
        assert_eq!(summary.decoded_points, 2);
        assert_eq!(summary.declared_points, 2);
        assert_eq!(summary.encoding, Encoding::Ascii);
        assert_eq!(collector.merged().position, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn errors_skip_completion() {
        let mut collector = BatchCollector::new();
        assert!(matches!(
            decode(b"FIELDS x y z\n1 2 3\n", &mut collector),
            Err(PcdError::HeaderNotFound)
        ));
        assert!(!collector.is_complete());
        assert_eq!(collector.num_batches(), 0);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let decoder = PcdDecoder::new(DecodeOptions::default().with_chunk_size(0));
        assert!(matches!(
            decoder.decode_all(b"FIELDS x\nDATA ascii\n"),
            Err(PcdError::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn decode_str_binary() {
        let mut text = String::from("FIELDS label\nSIZE 1\nTYPE U\nDATA binary\n");
        text.push_str("ABC");
        let batch = decode_str(&text).unwrap();
        assert_eq!(batch.label, vec![65, 66, 67]);
        assert_eq!(batch.loaded, text.len());
    }

    #[test]
    fn decode_str_empty_is_header_not_found() {
        assert!(matches!(decode_str(""), Err(PcdError::HeaderNotFound)));
    }

    #[test]
    fn default_options() {
        let options = DecodeOptions::default();
        assert_eq!(options.chunk_size, 2 * 1024 * 1024);
        assert_eq!(options.header_chunk_size, 200);
    }
}
