#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Attribute batches and the sinks that receive them.
pub mod batch;

/// sRGB to linear color conversion.
pub mod color;

/// Decoders for the ASCII, binary and compressed encodings.
pub mod decoder;

/// Error types.
pub mod error;

/// PCD header parsing.
pub mod header;

/// Reading PCD files from disk.
pub mod io;

/// Field layout derived from the header.
pub mod layout;

/// LZF decompression.
pub mod lzf;

/// Progress aggregation across several sources.
pub mod progress;

pub use batch::{AttributeBatch, BatchCollector, BatchSink};
pub use decoder::{
    decode, decode_str, DecodeOptions, DecodeSummary, PcdDecoder, DEFAULT_CHUNK_SIZE,
};
pub use error::PcdError;
pub use header::{Encoding, PcdHeader, DEFAULT_HEADER_CHUNK_SIZE};
pub use io::{read_pcd, read_pcd_with_sink};
pub use layout::{FieldEntry, FieldKind, FieldLayout, FieldType};
pub use progress::ProgressAggregator;
