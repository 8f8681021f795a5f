//! Path hashing for index lookups
//!
//! Index keys are CRC-32 hashes of lowercased path components. The same
//! path feeds two schemes: the wide hash packs the folder and filename
//! hashes into one `u64`, index2 hashes the full path into a `u32`.

/// Hash a path component the way the index tables expect.
///
/// Standard reflected CRC-32 (polynomial `0xEDB88320`, initial value and
/// final XOR `0xFFFFFFFF`) over the UTF-8 bytes of the lowercased input.
/// Case-insensitive by construction.
pub fn hash(value: &str) -> u32 {
    crc32fast::hash(value.to_lowercase().as_bytes())
}

/// A logical path resolved into its lookup hashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilePath {
    path: String,
    category: String,
    index1_hash: u64,
    index2_hash: u32,
}

impl ParsedFilePath {
    /// Normalize and hash a logical path.
    ///
    /// The path is trimmed and lowercased before hashing, so two paths
    /// differing only in case parse identically.
    pub fn parse(path: &str) -> Self {
        let path = path.trim().to_lowercase();

        let category = path.split('/').next().unwrap_or_default().to_string();
        let (folder, filename) = match path.rsplit_once('/') {
            Some((folder, filename)) => (folder, filename),
            None => ("", path.as_str()),
        };

        let index1_hash = (u64::from(hash(folder)) << 32) | u64::from(hash(filename));
        let index2_hash = hash(&path);

        Self {
            path,
            category,
            index1_hash,
            index2_hash,
        }
    }

    /// The normalized path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The category name, i.e. the first path segment.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Folder hash in the high 32 bits, filename hash in the low 32 bits.
    pub fn index1_hash(&self) -> u64 {
        self.index1_hash
    }

    /// Hash of the full path, used by the index2 format.
    pub fn index2_hash(&self) -> u32 {
        self.index2_hash
    }

    /// The folder portion of the wide hash.
    pub fn folder_hash(&self) -> u32 {
        (self.index1_hash >> 32) as u32
    }

    /// The filename portion of the wide hash.
    pub fn filename_hash(&self) -> u32 {
        self.index1_hash as u32
    }
}
