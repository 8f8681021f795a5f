//! File record header parsing
//!
//! Every record in a dat file starts with a `SqPackFileInfo` header naming
//! the framing strategy, the decompressed payload size, and how many blocks
//! follow.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::{Error, Result};

/// Size of the on-disk file record header in bytes
pub const FILE_INFO_SIZE: u32 = 24;

/// Framing strategy of a dat file record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Placeholder record, no blocks on disk
    Empty,
    /// Generic blob assembled from a flat list of blocks
    Standard,
    /// 3D model, independently compressed chunks reassembled into one buffer
    Model,
    /// Mip-mapped texture, blocks grouped per level of detail
    Texture,
}

impl FileType {
    /// Map the on-disk kind value to a framing strategy.
    ///
    /// Returns `None` for values outside the known 1..=4 range.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Empty),
            2 => Some(Self::Standard),
            3 => Some(Self::Model),
            4 => Some(Self::Texture),
            _ => None,
        }
    }
}

/// File record header at the start of every dat record
#[derive(Debug, Clone, Copy)]
pub struct SqPackFileInfo {
    /// Total size of the record header, including framing descriptors
    pub size: u32,
    /// Framing strategy for the record
    pub file_type: FileType,
    /// Size of the fully decompressed logical payload
    pub raw_file_size: u32,
    /// Number of blocks (standard) or lod descriptors (texture)
    pub block_count: u32,
}

impl SqPackFileInfo {
    /// Read the 24-byte header at the reader's current position.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let size = reader.read_u32::<LittleEndian>()?;
        let raw_type = reader.read_u32::<LittleEndian>()?;
        let file_type = FileType::from_u32(raw_type).ok_or(Error::UnknownFileKind(raw_type))?;
        let raw_file_size = reader.read_u32::<LittleEndian>()?;
        let mut reserved = [0u8; 8];
        reader.read_exact(&mut reserved)?;
        let block_count = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            size,
            file_type,
            raw_file_size,
            block_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_file_info() {
        let mut data = Vec::new();
        data.extend_from_slice(&128u32.to_le_bytes()); // header size
        data.extend_from_slice(&2u32.to_le_bytes()); // standard
        data.extend_from_slice(&350u32.to_le_bytes()); // raw file size
        data.extend_from_slice(&[0; 8]); // reserved
        data.extend_from_slice(&3u32.to_le_bytes()); // block count

        let info = SqPackFileInfo::read(&mut Cursor::new(&data)).unwrap();
        assert_eq!(info.size, 128);
        assert_eq!(info.file_type, FileType::Standard);
        assert_eq!(info.raw_file_size, 350);
        assert_eq!(info.block_count, 3);
    }

    #[test]
    fn test_unknown_file_kind() {
        let mut data = Vec::new();
        data.extend_from_slice(&24u32.to_le_bytes());
        data.extend_from_slice(&9u32.to_le_bytes()); // not a known kind
        data.extend_from_slice(&[0; 16]);

        let err = SqPackFileInfo::read(&mut Cursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::UnknownFileKind(9)));
    }

    #[test]
    fn test_file_type_values() {
        assert_eq!(FileType::from_u32(1), Some(FileType::Empty));
        assert_eq!(FileType::from_u32(2), Some(FileType::Standard));
        assert_eq!(FileType::from_u32(3), Some(FileType::Model));
        assert_eq!(FileType::from_u32(4), Some(FileType::Texture));
        assert_eq!(FileType::from_u32(0), None);
        assert_eq!(FileType::from_u32(5), None);
    }
}
