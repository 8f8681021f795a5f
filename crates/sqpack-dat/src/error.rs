//! Error types for dat file decoding

use thiserror::Error;

/// Result type for dat file operations
pub type Result<T> = std::result::Result<T, Error>;

/// Dat file decoding error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file record header declares a kind this crate does not know
    #[error("Unknown file kind: {0}")]
    UnknownFileKind(u32),

    /// Inflating a compressed block failed outright
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    /// A block inflated to a different length than its header declared
    #[error("Corrupt block: declared {declared} bytes, inflated {actual}")]
    CorruptBlock { declared: u32, actual: u64 },

    /// Assembled file data does not fit the declared raw file size
    #[error("File size mismatch: declared {declared} bytes, assembled {actual}")]
    SizeMismatch { declared: u32, actual: u64 },

    /// A chunk references block size table entries that do not exist
    #[error("Block table range {start}..{end} exceeds {len} entries")]
    BlockTableOutOfRange {
        start: usize,
        end: usize,
        len: usize,
    },
}
