//! Record dispatch
//!
//! Reads the file record header at an offset and hands off to the framing
//! strategy it names.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

use crate::header::{FileType, SqPackFileInfo};
use crate::{Result, model, standard, texture};

/// A fully decoded dat file record
#[derive(Debug, Clone)]
pub struct SqPackFile {
    info: SqPackFileInfo,
    data: Vec<u8>,
}

impl SqPackFile {
    /// The record header the payload was framed from.
    pub fn info(&self) -> &SqPackFileInfo {
        &self.info
    }

    /// The decompressed logical payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the record, keeping only the payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Decode the record at `offset` from an open reader.
pub fn read_file<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<SqPackFile> {
    reader.seek(SeekFrom::Start(offset))?;
    let info = SqPackFileInfo::read(reader)?;

    debug!(
        "Record at {offset:#x}: {:?}, raw size {}, {} blocks",
        info.file_type, info.raw_file_size, info.block_count
    );

    let data = match info.file_type {
        // Empty records hold no blocks; the payload is all zeroes.
        FileType::Empty => vec![0u8; info.raw_file_size as usize],
        FileType::Standard => standard::read_standard_file(reader, offset, &info)?,
        FileType::Texture => texture::read_texture_file(reader, offset, &info)?,
        FileType::Model => model::read_model_file(reader, offset, &info)?,
    };

    Ok(SqPackFile { info, data })
}

/// Decode the record at `offset` in the dat file at `path`.
///
/// Opens its own handle for the single read, so concurrent calls never share
/// a file cursor.
pub fn read_file_at(path: impl AsRef<Path>, offset: u64) -> Result<SqPackFile> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_file(&mut reader, offset)
}
