//! Standard file framing
//!
//! A standard record is a flat list of block descriptors following the file
//! header; the logical payload is the concatenation of every block in
//! descriptor order.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek};
use tracing::trace;

use crate::block::read_block;
use crate::header::SqPackFileInfo;
use crate::{Error, Result};

/// Block descriptor of a standard record
#[derive(Debug, Clone, Copy)]
struct StandardBlockInfo {
    /// Byte offset relative to the end of the record header
    offset: u32,
    #[allow(dead_code)]
    compressed_size: u16,
    #[allow(dead_code)]
    decompressed_size: u16,
}

impl StandardBlockInfo {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            offset: reader.read_u32::<LittleEndian>()?,
            compressed_size: reader.read_u16::<LittleEndian>()?,
            decompressed_size: reader.read_u16::<LittleEndian>()?,
        })
    }
}

/// Assemble a standard record at `offset`.
///
/// The reader must be positioned just past the record header. The assembled
/// length must match the header's declared raw file size exactly.
pub(crate) fn read_standard_file<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    info: &SqPackFileInfo,
) -> Result<Vec<u8>> {
    let mut blocks = Vec::with_capacity(info.block_count as usize);
    for _ in 0..info.block_count {
        blocks.push(StandardBlockInfo::read(reader)?);
    }

    let mut data = Vec::with_capacity(info.raw_file_size as usize);
    for block in &blocks {
        let block_offset = offset + u64::from(info.size) + u64::from(block.offset);
        trace!("Standard block at {block_offset:#x}");
        let bytes = read_block(reader, block_offset)?;
        data.extend_from_slice(&bytes);
    }

    if data.len() as u64 != u64::from(info.raw_file_size) {
        return Err(Error::SizeMismatch {
            declared: info.raw_file_size,
            actual: data.len() as u64,
        });
    }

    Ok(data)
}
