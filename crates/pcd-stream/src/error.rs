use crate::lzf::LzfError;

/// Error types for the PCD decoder.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PcdError {
    /// Failed to read PCD file
    #[error("Failed to read PCD file")]
    Io(#[from] std::io::Error),

    /// Invalid PCD file extension
    #[error("Invalid PCD file extension. Got:{0}")]
    InvalidFileExtension(String),

    /// No `DATA` line was found in the buffer
    #[error("PCD header not found")]
    HeaderNotFound,

    /// Malformed PCD header
    #[error("Malformed PCD header: {0}")]
    MalformedHeader(String),

    /// The `DATA` line declares an unknown encoding
    #[error("Unsupported PCD encoding: {0}")]
    UnsupportedEncoding(String),

    /// A point field has a layout the decoder cannot read
    #[error("Unsupported PCD field `{name}`: {reason}")]
    UnsupportedField {
        /// The field name as declared in `FIELDS`.
        name: String,
        /// Why the field cannot be decoded.
        reason: String,
    },

    /// The compressed point data is corrupt
    #[error("Malformed compressed PCD data. {0}")]
    MalformedInput(#[from] LzfError),

    /// The binary point data ends with a partial row
    #[error("Truncated PCD row: {remaining} trailing bytes with a row size of {row_size}")]
    TruncatedRow {
        /// Number of bytes left over after the last complete row.
        remaining: usize,
        /// The row size declared by the header.
        row_size: usize,
    },

    /// The point data is shorter than the header declares
    #[error("Truncated PCD data: expected {expected} bytes, got {actual}")]
    TruncatedData {
        /// Number of bytes required.
        expected: usize,
        /// Number of bytes available.
        actual: usize,
    },

    /// The decoder was configured with an empty window
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),
}
