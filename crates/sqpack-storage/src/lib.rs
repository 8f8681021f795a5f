//! SqPack storage for local game installations
//!
//! A SqPack install is a tree of repositories (the base game plus one
//! directory per expansion), each holding categories backed by hash-indexed
//! lookup tables and flat dat files. This crate discovers that tree, parses
//! both index formats into one unified lookup per category, and resolves
//! logical paths such as `chara/equipment/e0000/model/body.mdl` to their
//! decompressed record bytes via the `sqpack-dat` codec.
//!
//! Everything is built once from disk and immutable afterwards; lookups and
//! fetches never mutate shared state, so a storage value can be shared
//! freely across threads.

pub mod category;
pub mod error;
pub mod hash;
pub mod index;
pub mod repository;
pub mod storage;
pub mod types;

pub use category::{Category, category_id, category_name};
pub use error::{Result, SqPackError};
pub use hash::ParsedFilePath;
pub use index::{SqPackHeader, SqPackIndexHeader, parse_index, parse_index2};
pub use repository::Repository;
pub use storage::SqPackStorage;
pub use types::IndexEntry;

// Decoded records surface in this crate's API
pub use sqpack_dat::{FileType, SqPackFile};
