//! Block decompression
//!
//! The block is the smallest decompressible unit in a dat file; every framing
//! strategy is built on top of this single primitive. A block is a 16-byte
//! header followed by either raw bytes or a raw-deflate stream.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::io::{Read, Seek, SeekFrom};
use tracing::trace;

use crate::{Error, Result};

/// Compression field sentinel marking a block as stored uncompressed.
///
/// Any other value is the length in bytes of the deflate stream that follows
/// the header.
pub const UNCOMPRESSED_SENTINEL: u32 = 32_000;

/// Header in front of every block's payload
#[derive(Debug, Clone, Copy)]
pub struct DatBlockHeader {
    /// Size of this header on disk
    pub size: u32,
    /// [`UNCOMPRESSED_SENTINEL`] or the compressed payload length
    pub compression: u32,
    /// Declared decompressed payload size
    pub decompressed_size: u32,
}

impl DatBlockHeader {
    /// Read the 16-byte block header at the reader's current position.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let size = reader.read_u32::<LittleEndian>()?;
        let _reserved = reader.read_u32::<LittleEndian>()?;
        let compression = reader.read_u32::<LittleEndian>()?;
        let decompressed_size = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            size,
            compression,
            decompressed_size,
        })
    }

    /// Whether the payload is stored without compression.
    pub fn is_uncompressed(&self) -> bool {
        self.compression == UNCOMPRESSED_SENTINEL
    }
}

/// Decode the block at `offset` into its decompressed bytes.
///
/// The reader's position is restored afterwards, whether the decode succeeded
/// or not, so callers can keep stepping through a block size table while
/// blocks are fetched out of line.
///
/// Inflating to any length other than the header's declared size is a
/// corrupt-archive error; no truncated result is ever returned.
pub fn read_block<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Vec<u8>> {
    let saved = reader.stream_position()?;
    let result = read_block_inner(reader, offset);
    reader.seek(SeekFrom::Start(saved))?;
    result
}

fn read_block_inner<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let header = DatBlockHeader::read(reader)?;

    trace!(
        "Block at {offset:#x}: compression={}, decompressed_size={}",
        header.compression, header.decompressed_size
    );

    if header.is_uncompressed() {
        let mut data = vec![0u8; header.decompressed_size as usize];
        reader.read_exact(&mut data)?;
        return Ok(data);
    }

    let mut compressed = vec![0u8; header.compression as usize];
    reader.read_exact(&mut compressed)?;

    let mut data = Vec::with_capacity(header.decompressed_size as usize);
    let mut decoder = DeflateDecoder::new(compressed.as_slice());
    decoder
        .read_to_end(&mut data)
        .map_err(|e| Error::DecompressionFailed(format!("deflate failed at {offset:#x}: {e}")))?;

    if data.len() as u64 != u64::from(header.decompressed_size) {
        return Err(Error::CorruptBlock {
            declared: header.decompressed_size,
            actual: data.len() as u64,
        });
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::{Cursor, Write};

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn raw_block(payload: &[u8]) -> Vec<u8> {
        let mut block = Vec::new();
        block.extend_from_slice(&16u32.to_le_bytes());
        block.extend_from_slice(&0u32.to_le_bytes());
        block.extend_from_slice(&UNCOMPRESSED_SENTINEL.to_le_bytes());
        block.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        block.extend_from_slice(payload);
        block
    }

    fn compressed_block(payload: &[u8]) -> Vec<u8> {
        let compressed = deflate(payload);
        let mut block = Vec::new();
        block.extend_from_slice(&16u32.to_le_bytes());
        block.extend_from_slice(&0u32.to_le_bytes());
        block.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        block.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        block.extend_from_slice(&compressed);
        block
    }

    #[test]
    fn test_uncompressed_block() {
        let data = raw_block(b"Hello, SqPack!");
        let mut cursor = Cursor::new(&data);

        let result = read_block(&mut cursor, 0).unwrap();
        assert_eq!(result, b"Hello, SqPack!");
    }

    #[test]
    fn test_compressed_block() {
        let payload = b"Hello, SqPack! This is a longer string to get better compression.";
        let data = compressed_block(payload);
        let mut cursor = Cursor::new(&data);

        let result = read_block(&mut cursor, 0).unwrap();
        assert_eq!(result, payload.as_slice());
    }

    #[test]
    fn test_position_restored() {
        let mut data = vec![0xAA; 32]; // padding in front of the block
        data.extend_from_slice(&raw_block(b"payload"));
        let mut cursor = Cursor::new(&data);
        cursor.set_position(7);

        read_block(&mut cursor, 32).unwrap();
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn test_position_restored_on_error() {
        let mut block = compressed_block(b"some payload bytes");
        // Lie about the decompressed size
        block[12..16].copy_from_slice(&999u32.to_le_bytes());
        let mut cursor = Cursor::new(&block);
        cursor.set_position(3);

        let err = read_block(&mut cursor, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::CorruptBlock {
                declared: 999,
                actual: 18
            }
        ));
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_garbage_deflate_stream() {
        let mut block = Vec::new();
        block.extend_from_slice(&16u32.to_le_bytes());
        block.extend_from_slice(&0u32.to_le_bytes());
        block.extend_from_slice(&4u32.to_le_bytes()); // 4 "compressed" bytes
        block.extend_from_slice(&100u32.to_le_bytes());
        block.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);

        let mut cursor = Cursor::new(&block);
        let err = read_block(&mut cursor, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::DecompressionFailed(_) | Error::CorruptBlock { .. }
        ));
    }
}
