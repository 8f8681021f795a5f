//! SqPack dat file decoding
//!
//! Dat files hold the actual record bytes of a SqPack archive, addressed by
//! byte offset from an index lookup. Every record starts with a fixed file
//! header that declares one of four framings (empty, standard, model,
//! texture); the framed payload is assembled from one or more
//! deflate-compressed blocks. This crate decodes a record at a given offset
//! into its fully decompressed logical bytes.

pub mod block;
pub mod error;
pub mod header;
pub mod model;
pub mod read;

mod standard;
mod texture;

pub use block::{DatBlockHeader, read_block};
pub use error::{Error, Result};
pub use header::{FileType, SqPackFileInfo};
pub use model::{MODEL_FILE_HEADER_SIZE, ModelFileHeader};
pub use read::{SqPackFile, read_file, read_file_at};
