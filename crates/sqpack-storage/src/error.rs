//! Error types for SqPack storage operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqPackError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Dat file {0} does not exist")]
    MissingDatFile(PathBuf),

    #[error("Not enough dat files: index declares {declared}, found {available}")]
    NotEnoughDatFiles { declared: u32, available: usize },

    #[error("Category {0:02x} has neither an index nor an index2 file")]
    NoIndex(u8),

    #[error("Invalid index format: {0}")]
    InvalidIndexFormat(String),

    #[error("Dat error: {0}")]
    Dat(#[from] sqpack_dat::Error),
}

pub type Result<T> = std::result::Result<T, SqPackError>;
