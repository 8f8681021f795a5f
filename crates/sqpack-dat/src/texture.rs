//! Texture file framing
//!
//! A texture record groups its blocks per level of detail. The header is
//! followed by one lod descriptor per level and a table of 16-bit on-disk
//! block sizes; an optional embedded mip index sits in front of the first
//! block and is copied verbatim.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};
use tracing::trace;

use crate::block::read_block;
use crate::header::SqPackFileInfo;
use crate::{Error, Result};

/// Per-lod block group descriptor
#[derive(Debug, Clone, Copy)]
struct LodBlock {
    /// Byte offset of the group's first block, relative to end of header
    compressed_offset: u32,
    #[allow(dead_code)]
    compressed_size: u32,
    #[allow(dead_code)]
    decompressed_size: u32,
    #[allow(dead_code)]
    block_offset: u32,
    /// Number of blocks in this group
    block_count: u32,
}

impl LodBlock {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            compressed_offset: reader.read_u32::<LittleEndian>()?,
            compressed_size: reader.read_u32::<LittleEndian>()?,
            decompressed_size: reader.read_u32::<LittleEndian>()?,
            block_offset: reader.read_u32::<LittleEndian>()?,
            block_count: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Assemble a texture record at `offset`.
///
/// The reader must be positioned just past the record header. After each
/// block decode the cursor advances by the next entry of the block size
/// table, which continues at the reader's position behind the lod
/// descriptors.
pub(crate) fn read_texture_file<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    info: &SqPackFileInfo,
) -> Result<Vec<u8>> {
    let mut lods = Vec::with_capacity(info.block_count as usize);
    for _ in 0..info.block_count {
        lods.push(LodBlock::read(reader)?);
    }

    let mut data = Vec::with_capacity(info.raw_file_size as usize);

    // Bytes in front of the first block are the embedded mip index, copied
    // through untouched.
    let mip_size = lods.first().map_or(0, |lod| lod.compressed_offset);
    if mip_size != 0 {
        let saved = reader.stream_position()?;
        reader.seek(SeekFrom::Start(offset + u64::from(info.size)))?;
        let mut mip = vec![0u8; mip_size as usize];
        reader.read_exact(&mut mip)?;
        data.extend_from_slice(&mip);
        reader.seek(SeekFrom::Start(saved))?;
    }

    for lod in &lods {
        let mut block_offset = offset + u64::from(info.size) + u64::from(lod.compressed_offset);
        for _ in 0..lod.block_count {
            trace!("Texture block at {block_offset:#x}");
            let bytes = read_block(reader, block_offset)?;
            data.extend_from_slice(&bytes);
            let size = reader.read_u16::<LittleEndian>()?;
            block_offset += u64::from(size);
        }
    }

    if data.len() as u64 != u64::from(info.raw_file_size) {
        return Err(Error::SizeMismatch {
            declared: info.raw_file_size,
            actual: data.len() as u64,
        });
    }

    Ok(data)
}
