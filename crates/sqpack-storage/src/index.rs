//! Parsers for the two on-disk index formats
//!
//! Both formats share the same outer layout: a `SqPackHeader`, an index
//! header at its declared size, then a flat run of fixed-size hash table
//! entries. They differ only in entry shape: 16 bytes with a 64-bit
//! folder/filename hash for index, 8 bytes with a 32-bit full-path hash for
//! index2. Index2 hashes are widened so both feed one unified map.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::{debug, trace};

use crate::error::{Result, SqPackError};
use crate::types::IndexEntry;

/// Magic bytes at the start of every index file
pub const SQPACK_MAGIC: [u8; 8] = *b"SqPack\0\0";

/// Outer file header shared by both index formats
#[derive(Debug, Clone, Copy)]
pub struct SqPackHeader {
    pub platform_id: u8,
    /// Size of this header; the index header follows at this offset
    pub size: u32,
    pub version: u32,
    pub kind: u32,
}

impl SqPackHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if magic != SQPACK_MAGIC {
            return Err(SqPackError::InvalidIndexFormat(format!(
                "bad magic {magic:02x?}"
            )));
        }

        let platform_id = reader.read_u8()?;
        let mut reserved = [0u8; 3];
        reader.read_exact(&mut reserved)?;
        let size = reader.read_u32::<LittleEndian>()?;
        let version = reader.read_u32::<LittleEndian>()?;
        let kind = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            platform_id,
            size,
            version,
            kind,
        })
    }
}

/// Index header describing where the hash table entries live
#[derive(Debug, Clone, Copy)]
pub struct SqPackIndexHeader {
    pub size: u32,
    pub version: u32,
    pub index_data_offset: u32,
    pub index_data_size: u32,
    /// How many dat files the category spans
    pub data_file_count: u32,
}

impl SqPackIndexHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let size = reader.read_u32::<LittleEndian>()?;
        let version = reader.read_u32::<LittleEndian>()?;
        let index_data_offset = reader.read_u32::<LittleEndian>()?;
        let index_data_size = reader.read_u32::<LittleEndian>()?;
        let mut index_data_hash = [0u8; 64];
        reader.read_exact(&mut index_data_hash)?;
        let data_file_count = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            size,
            version,
            index_data_offset,
            index_data_size,
            data_file_count,
        })
    }
}

fn read_headers(bytes: &[u8]) -> Result<(Cursor<&[u8]>, SqPackIndexHeader)> {
    let mut cursor = Cursor::new(bytes);
    let header = SqPackHeader::read(&mut cursor)?;
    cursor.seek(SeekFrom::Start(u64::from(header.size)))?;
    let index_header = SqPackIndexHeader::read(&mut cursor)?;

    let data_end = u64::from(index_header.index_data_offset) + u64::from(index_header.index_data_size);
    if data_end > bytes.len() as u64 {
        return Err(SqPackError::InvalidIndexFormat(format!(
            "index data spans {data_end} bytes but only {} are available",
            bytes.len()
        )));
    }

    cursor.seek(SeekFrom::Start(u64::from(index_header.index_data_offset)))?;
    Ok((cursor, index_header))
}

/// Parse an index file: 16-byte entries keyed by the 64-bit wide hash.
pub fn parse_index(bytes: &[u8]) -> Result<(SqPackIndexHeader, Vec<IndexEntry>)> {
    let (mut cursor, index_header) = read_headers(bytes)?;

    let entry_count = index_header.index_data_size / 16;
    debug!("Parsing {entry_count} index entries");

    let mut entries = Vec::with_capacity(entry_count as usize);
    for i in 0..entry_count {
        let hash = cursor.read_u64::<LittleEndian>()?;
        let data = cursor.read_u32::<LittleEndian>()?;
        let _padding = cursor.read_u32::<LittleEndian>()?;

        let entry = IndexEntry { hash, data };
        if i < 5 {
            trace!(
                "Entry {i}: hash={hash:016x}, dat={}, offset={:#x}",
                entry.data_file_id(),
                entry.offset()
            );
        }
        entries.push(entry);
    }

    Ok((index_header, entries))
}

/// Parse an index2 file: 8-byte entries keyed by the 32-bit full-path hash,
/// widened to fit the unified map.
pub fn parse_index2(bytes: &[u8]) -> Result<(SqPackIndexHeader, Vec<IndexEntry>)> {
    let (mut cursor, index_header) = read_headers(bytes)?;

    let entry_count = index_header.index_data_size / 8;
    debug!("Parsing {entry_count} index2 entries");

    let mut entries = Vec::with_capacity(entry_count as usize);
    for i in 0..entry_count {
        let hash = cursor.read_u32::<LittleEndian>()?;
        let data = cursor.read_u32::<LittleEndian>()?;

        let entry = IndexEntry {
            hash: u64::from(hash),
            data,
        };
        if i < 5 {
            trace!(
                "Entry {i}: hash={hash:08x}, dat={}, offset={:#x}",
                entry.data_file_id(),
                entry.offset()
            );
        }
        entries.push(entry);
    }

    Ok((index_header, entries))
}
