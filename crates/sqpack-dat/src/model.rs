//! Model file framing
//!
//! A model record stores up to eleven independently compressed chunks: the
//! stack and runtime segments plus vertex, edge geometry and index buffers
//! for three levels of detail. On-disk chunk offsets are meaningless to
//! consumers of the decoded payload, so the framer reassembles every chunk
//! into one contiguous buffer and synthesizes a fresh file header whose
//! buffer offsets point into that buffer.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::trace;

use crate::block::read_block;
use crate::header::SqPackFileInfo;
use crate::{Error, Result};

/// Serialized size of the synthesized [`ModelFileHeader`]
pub const MODEL_FILE_HEADER_SIZE: usize = 68;

/// On-disk record header of a model file.
///
/// Shares its first fields with [`SqPackFileInfo`] but diverges after the
/// raw file size, so the framer re-reads it from the record offset in full.
#[derive(Debug, Clone, Copy)]
pub struct ModelBlock {
    pub size: u32,
    pub raw_file_size: u32,
    pub block_count: u32,
    pub used_block_count: u32,
    pub version: u32,
    pub stack_size: u32,
    pub runtime_size: u32,
    pub vertex_buffer_size: [u32; 3],
    pub edge_geometry_vertex_buffer_size: [u32; 3],
    pub index_buffer_size: [u32; 3],
    pub compressed_stack_size: u32,
    pub compressed_runtime_size: u32,
    pub compressed_vertex_buffer_size: [u32; 3],
    pub compressed_edge_geometry_vertex_buffer_size: [u32; 3],
    pub compressed_index_buffer_size: [u32; 3],
    pub stack_offset: u32,
    pub runtime_offset: u32,
    pub vertex_buffer_offset: [u32; 3],
    pub edge_geometry_vertex_buffer_offset: [u32; 3],
    pub index_buffer_offset: [u32; 3],
    pub stack_block_index: u16,
    pub runtime_block_index: u16,
    pub vertex_buffer_block_index: [u16; 3],
    pub edge_geometry_vertex_buffer_block_index: [u16; 3],
    pub index_buffer_block_index: [u16; 3],
    pub stack_block_count: u16,
    pub runtime_block_count: u16,
    pub vertex_buffer_block_count: [u16; 3],
    pub edge_geometry_vertex_buffer_block_count: [u16; 3],
    pub index_buffer_block_count: [u16; 3],
    pub vertex_declaration_count: u16,
    pub material_count: u16,
    pub lod_count: u8,
    pub index_buffer_streaming_enabled: bool,
    pub edge_geometry_enabled: bool,
}

impl ModelBlock {
    /// Read the record header at the reader's current position.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        fn read_u32x3<R: Read>(reader: &mut R) -> Result<[u32; 3]> {
            let mut values = [0u32; 3];
            reader.read_u32_into::<LittleEndian>(&mut values)?;
            Ok(values)
        }
        fn read_u16x3<R: Read>(reader: &mut R) -> Result<[u16; 3]> {
            let mut values = [0u16; 3];
            reader.read_u16_into::<LittleEndian>(&mut values)?;
            Ok(values)
        }

        let size = reader.read_u32::<LittleEndian>()?;
        let _file_type = reader.read_u32::<LittleEndian>()?;
        let raw_file_size = reader.read_u32::<LittleEndian>()?;
        let block_count = reader.read_u32::<LittleEndian>()?;
        let used_block_count = reader.read_u32::<LittleEndian>()?;
        let version = reader.read_u32::<LittleEndian>()?;
        let stack_size = reader.read_u32::<LittleEndian>()?;
        let runtime_size = reader.read_u32::<LittleEndian>()?;
        let vertex_buffer_size = read_u32x3(reader)?;
        let edge_geometry_vertex_buffer_size = read_u32x3(reader)?;
        let index_buffer_size = read_u32x3(reader)?;
        let compressed_stack_size = reader.read_u32::<LittleEndian>()?;
        let compressed_runtime_size = reader.read_u32::<LittleEndian>()?;
        let compressed_vertex_buffer_size = read_u32x3(reader)?;
        let compressed_edge_geometry_vertex_buffer_size = read_u32x3(reader)?;
        let compressed_index_buffer_size = read_u32x3(reader)?;
        let stack_offset = reader.read_u32::<LittleEndian>()?;
        let runtime_offset = reader.read_u32::<LittleEndian>()?;
        let vertex_buffer_offset = read_u32x3(reader)?;
        let edge_geometry_vertex_buffer_offset = read_u32x3(reader)?;
        let index_buffer_offset = read_u32x3(reader)?;
        let stack_block_index = reader.read_u16::<LittleEndian>()?;
        let runtime_block_index = reader.read_u16::<LittleEndian>()?;
        let vertex_buffer_block_index = read_u16x3(reader)?;
        let edge_geometry_vertex_buffer_block_index = read_u16x3(reader)?;
        let index_buffer_block_index = read_u16x3(reader)?;
        let stack_block_count = reader.read_u16::<LittleEndian>()?;
        let runtime_block_count = reader.read_u16::<LittleEndian>()?;
        let vertex_buffer_block_count = read_u16x3(reader)?;
        let edge_geometry_vertex_buffer_block_count = read_u16x3(reader)?;
        let index_buffer_block_count = read_u16x3(reader)?;
        let vertex_declaration_count = reader.read_u16::<LittleEndian>()?;
        let material_count = reader.read_u16::<LittleEndian>()?;
        let lod_count = reader.read_u8()?;
        let index_buffer_streaming_enabled = reader.read_u8()? != 0;
        let edge_geometry_enabled = reader.read_u8()? != 0;
        let _padding = reader.read_u8()?;

        Ok(Self {
            size,
            raw_file_size,
            block_count,
            used_block_count,
            version,
            stack_size,
            runtime_size,
            vertex_buffer_size,
            edge_geometry_vertex_buffer_size,
            index_buffer_size,
            compressed_stack_size,
            compressed_runtime_size,
            compressed_vertex_buffer_size,
            compressed_edge_geometry_vertex_buffer_size,
            compressed_index_buffer_size,
            stack_offset,
            runtime_offset,
            vertex_buffer_offset,
            edge_geometry_vertex_buffer_offset,
            index_buffer_offset,
            stack_block_index,
            runtime_block_index,
            vertex_buffer_block_index,
            edge_geometry_vertex_buffer_block_index,
            index_buffer_block_index,
            stack_block_count,
            runtime_block_count,
            vertex_buffer_block_count,
            edge_geometry_vertex_buffer_block_count,
            index_buffer_block_count,
            vertex_declaration_count,
            material_count,
            lod_count,
            index_buffer_streaming_enabled,
            edge_geometry_enabled,
        })
    }

    /// Number of entries in the combined block size table.
    fn total_block_count(&self) -> usize {
        let mut total = usize::from(self.stack_block_count) + usize::from(self.runtime_block_count);
        for lod in 0..3 {
            total += usize::from(self.vertex_buffer_block_count[lod])
                + usize::from(self.edge_geometry_vertex_buffer_block_count[lod])
                + usize::from(self.index_buffer_block_count[lod]);
        }
        total
    }
}

/// Header synthesized in front of the reassembled model buffer.
///
/// Buffer offsets are byte positions into the decoded payload, which starts
/// with this header itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelFileHeader {
    pub version: u32,
    pub stack_size: u32,
    pub runtime_size: u32,
    pub vertex_declaration_count: u16,
    pub material_count: u16,
    pub vertex_offset: [u32; 3],
    pub index_offset: [u32; 3],
    pub vertex_buffer_size: [u32; 3],
    pub index_buffer_size: [u32; 3],
    pub lod_count: u8,
    pub index_buffer_streaming_enabled: bool,
    pub edge_geometry_enabled: bool,
}

impl ModelFileHeader {
    /// Parse a synthesized header from the front of a decoded model payload.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let version = reader.read_u32::<LittleEndian>()?;
        let stack_size = reader.read_u32::<LittleEndian>()?;
        let runtime_size = reader.read_u32::<LittleEndian>()?;
        let vertex_declaration_count = reader.read_u16::<LittleEndian>()?;
        let material_count = reader.read_u16::<LittleEndian>()?;
        let mut vertex_offset = [0u32; 3];
        reader.read_u32_into::<LittleEndian>(&mut vertex_offset)?;
        let mut index_offset = [0u32; 3];
        reader.read_u32_into::<LittleEndian>(&mut index_offset)?;
        let mut vertex_buffer_size = [0u32; 3];
        reader.read_u32_into::<LittleEndian>(&mut vertex_buffer_size)?;
        let mut index_buffer_size = [0u32; 3];
        reader.read_u32_into::<LittleEndian>(&mut index_buffer_size)?;
        let lod_count = reader.read_u8()?;
        let index_buffer_streaming_enabled = reader.read_u8()? != 0;
        let edge_geometry_enabled = reader.read_u8()? != 0;
        let _padding = reader.read_u8()?;

        Ok(Self {
            version,
            stack_size,
            runtime_size,
            vertex_declaration_count,
            material_count,
            vertex_offset,
            index_offset,
            vertex_buffer_size,
            index_buffer_size,
            lod_count,
            index_buffer_streaming_enabled,
            edge_geometry_enabled,
        })
    }

    /// Serialize into `buf`, which must be [`MODEL_FILE_HEADER_SIZE`] bytes.
    fn write(&self, buf: &mut [u8]) -> Result<()> {
        let mut cursor = Cursor::new(buf);
        cursor.write_u32::<LittleEndian>(self.version)?;
        cursor.write_u32::<LittleEndian>(self.stack_size)?;
        cursor.write_u32::<LittleEndian>(self.runtime_size)?;
        cursor.write_u16::<LittleEndian>(self.vertex_declaration_count)?;
        cursor.write_u16::<LittleEndian>(self.material_count)?;
        for value in self.vertex_offset {
            cursor.write_u32::<LittleEndian>(value)?;
        }
        for value in self.index_offset {
            cursor.write_u32::<LittleEndian>(value)?;
        }
        for value in self.vertex_buffer_size {
            cursor.write_u32::<LittleEndian>(value)?;
        }
        for value in self.index_buffer_size {
            cursor.write_u32::<LittleEndian>(value)?;
        }
        cursor.write_u8(self.lod_count)?;
        cursor.write_u8(u8::from(self.index_buffer_streaming_enabled))?;
        cursor.write_u8(u8::from(self.edge_geometry_enabled))?;
        cursor.write_u8(0)?;
        Ok(())
    }
}

/// Decode one chunk's run of consecutive blocks into the output buffer.
///
/// Returns the byte position where the chunk's data began and its decoded
/// length.
#[allow(clippy::too_many_arguments)]
fn decode_chunk<R: Read + Seek>(
    reader: &mut R,
    block_origin: u64,
    chunk_offset: u32,
    block_index: u16,
    block_count: u16,
    block_sizes: &[u16],
    declared: u32,
    data: &mut [u8],
    position: &mut usize,
) -> Result<(usize, usize)> {
    let start = usize::from(block_index);
    let end = start + usize::from(block_count);
    if end > block_sizes.len() {
        return Err(Error::BlockTableOutOfRange {
            start,
            end,
            len: block_sizes.len(),
        });
    }

    let chunk_start = *position;
    let mut cursor = block_origin + u64::from(chunk_offset);
    for &size in &block_sizes[start..end] {
        let bytes = read_block(reader, cursor)?;
        let write_end = *position + bytes.len();
        if write_end > data.len() {
            return Err(Error::SizeMismatch {
                declared,
                actual: write_end as u64,
            });
        }
        data[*position..write_end].copy_from_slice(&bytes);
        *position = write_end;
        cursor += u64::from(size);
    }

    Ok((chunk_start, *position - chunk_start))
}

/// Assemble a model record at `offset` and prepend the synthesized header.
pub(crate) fn read_model_file<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    info: &SqPackFileInfo,
) -> Result<Vec<u8>> {
    // The model header diverges from the generic file header early on, so
    // parse it fresh from the record start.
    reader.seek(SeekFrom::Start(offset))?;
    let model = ModelBlock::read(reader)?;

    let total_blocks = model.total_block_count();
    let mut block_sizes = vec![0u16; total_blocks];
    reader.read_u16_into::<LittleEndian>(&mut block_sizes)?;

    trace!(
        "Model record at {offset:#x}: {total_blocks} blocks, raw size {}",
        info.raw_file_size
    );

    let raw_size = info.raw_file_size as usize;
    if raw_size < MODEL_FILE_HEADER_SIZE {
        return Err(Error::SizeMismatch {
            declared: info.raw_file_size,
            actual: MODEL_FILE_HEADER_SIZE as u64,
        });
    }

    let block_origin = offset + u64::from(model.size);
    let mut data = vec![0u8; raw_size];
    let mut position = MODEL_FILE_HEADER_SIZE;

    let (_, stack_size) = decode_chunk(
        reader,
        block_origin,
        model.stack_offset,
        model.stack_block_index,
        model.stack_block_count,
        &block_sizes,
        info.raw_file_size,
        &mut data,
        &mut position,
    )?;
    let (_, runtime_size) = decode_chunk(
        reader,
        block_origin,
        model.runtime_offset,
        model.runtime_block_index,
        model.runtime_block_count,
        &block_sizes,
        info.raw_file_size,
        &mut data,
        &mut position,
    )?;

    let mut vertex_offset = [0u32; 3];
    let mut vertex_buffer_size = [0u32; 3];
    let mut index_offset = [0u32; 3];
    let mut index_buffer_size = [0u32; 3];

    for lod in 0..3 {
        if model.vertex_buffer_block_count[lod] != 0 {
            let (start, len) = decode_chunk(
                reader,
                block_origin,
                model.vertex_buffer_offset[lod],
                model.vertex_buffer_block_index[lod],
                model.vertex_buffer_block_count[lod],
                &block_sizes,
                info.raw_file_size,
                &mut data,
                &mut position,
            )?;
            vertex_offset[lod] = start as u32;
            vertex_buffer_size[lod] = len as u32;
        }

        if model.edge_geometry_vertex_buffer_block_count[lod] != 0 {
            decode_chunk(
                reader,
                block_origin,
                model.edge_geometry_vertex_buffer_offset[lod],
                model.edge_geometry_vertex_buffer_block_index[lod],
                model.edge_geometry_vertex_buffer_block_count[lod],
                &block_sizes,
                info.raw_file_size,
                &mut data,
                &mut position,
            )?;
        }

        if model.index_buffer_block_count[lod] != 0 {
            let (start, len) = decode_chunk(
                reader,
                block_origin,
                model.index_buffer_offset[lod],
                model.index_buffer_block_index[lod],
                model.index_buffer_block_count[lod],
                &block_sizes,
                info.raw_file_size,
                &mut data,
                &mut position,
            )?;
            index_offset[lod] = start as u32;
            index_buffer_size[lod] = len as u32;
        }
    }

    let header = ModelFileHeader {
        version: model.version,
        stack_size: stack_size as u32,
        runtime_size: runtime_size as u32,
        vertex_declaration_count: model.vertex_declaration_count,
        material_count: model.material_count,
        vertex_offset,
        index_offset,
        vertex_buffer_size,
        index_buffer_size,
        lod_count: model.lod_count,
        index_buffer_streaming_enabled: model.index_buffer_streaming_enabled,
        edge_geometry_enabled: model.edge_geometry_enabled,
    };
    header.write(&mut data[..MODEL_FILE_HEADER_SIZE])?;

    Ok(data)
}
