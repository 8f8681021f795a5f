//! Categories: one unified lookup table over one or more dat files

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Result, SqPackError};
use crate::index::{parse_index, parse_index2};
use crate::types::IndexEntry;
use sqpack_dat::SqPackFile;

/// Fixed mapping between category names (the first path segment) and ids
pub const CATEGORY_NAMES: &[(&str, u8)] = &[
    ("common", 0x00),
    ("bgcommon", 0x01),
    ("bg", 0x02),
    ("cut", 0x03),
    ("chara", 0x04),
    ("shader", 0x05),
    ("ui", 0x06),
    ("sound", 0x07),
    ("vfx", 0x08),
    ("ui_script", 0x09),
    ("exd", 0x0A),
    ("game_script", 0x0B),
    ("music", 0x0C),
    ("sqpack_test", 0x12),
    ("debug", 0x13),
];

/// Look up the id of a category name, e.g. `chara` -> `0x04`.
pub fn category_id(name: &str) -> Option<u8> {
    CATEGORY_NAMES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|&(_, id)| id)
}

/// Look up the name of a category id, e.g. `0x04` -> `chara`.
pub fn category_name(id: u8) -> Option<&'static str> {
    CATEGORY_NAMES
        .iter()
        .find(|&&(_, known)| known == id)
        .map(|&(name, _)| name)
}

/// One logical table of records within a repository.
///
/// Holds the unified hash table merged from whichever index formats were
/// present, plus the ordered dat file paths the entries point into. Built
/// once from the index bytes; read-only afterwards.
#[derive(Debug)]
pub struct Category {
    id: u8,
    dat_paths: Vec<PathBuf>,
    entries: HashMap<u64, IndexEntry>,
    has_index: bool,
    has_index2: bool,
}

impl Category {
    /// Build a category from its index file contents and dat file paths.
    ///
    /// `dat_paths` must be ordered so that position equals the data file id.
    /// Fails if neither index is provided, if any dat path is missing on
    /// disk, or if an index declares more dat files than were supplied.
    pub fn new(
        id: u8,
        index: Option<&[u8]>,
        index2: Option<&[u8]>,
        dat_paths: Vec<PathBuf>,
    ) -> Result<Self> {
        if index.is_none() && index2.is_none() {
            return Err(SqPackError::NoIndex(id));
        }

        for path in &dat_paths {
            if !path.is_file() {
                return Err(SqPackError::MissingDatFile(path.clone()));
            }
        }

        let mut entries = HashMap::new();
        let mut has_index = false;
        let mut has_index2 = false;

        if let Some(bytes) = index {
            has_index = true;
            let (header, parsed) = parse_index(bytes)?;
            if header.data_file_count as usize > dat_paths.len() {
                return Err(SqPackError::NotEnoughDatFiles {
                    declared: header.data_file_count,
                    available: dat_paths.len(),
                });
            }
            for entry in parsed {
                entries.insert(entry.hash, entry);
            }
        }

        if let Some(bytes) = index2 {
            has_index2 = true;
            let (header, parsed) = parse_index2(bytes)?;
            if header.data_file_count as usize > dat_paths.len() {
                return Err(SqPackError::NotEnoughDatFiles {
                    declared: header.data_file_count,
                    available: dat_paths.len(),
                });
            }
            for entry in parsed {
                entries.insert(entry.hash, entry);
            }
        }

        debug!(
            "Category {id:02x}: {} entries, {} dat files",
            entries.len(),
            dat_paths.len()
        );

        Ok(Self {
            id,
            dat_paths,
            entries,
            has_index,
            has_index2,
        })
    }

    /// The category id.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The dat file paths, ordered by data file id.
    pub fn dat_paths(&self) -> &[PathBuf] {
        &self.dat_paths
    }

    /// Whether the wide-hash index contributed entries.
    pub fn has_index(&self) -> bool {
        self.has_index
    }

    /// Whether the full-path-hash index contributed entries.
    pub fn has_index2(&self) -> bool {
        self.has_index2
    }

    /// Number of entries in the unified table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the unified table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by either hash scheme.
    pub fn lookup(&self, hash: u64) -> Option<&IndexEntry> {
        self.entries.get(&hash)
    }

    /// Whether the table holds an entry for `hash`.
    pub fn file_exists(&self, hash: u64) -> bool {
        self.entries.contains_key(&hash)
    }

    /// Look up `hash` and decode the record it points at.
    ///
    /// Returns `Ok(None)` when the hash is absent. Opens the target dat file
    /// fresh for the single read, so concurrent fetches never share a file
    /// cursor.
    pub fn fetch(&self, hash: u64) -> Result<Option<SqPackFile>> {
        let Some(entry) = self.entries.get(&hash) else {
            return Ok(None);
        };

        let dat_path = self
            .dat_paths
            .get(usize::from(entry.data_file_id()))
            .ok_or_else(|| {
                SqPackError::InvalidIndexFormat(format!(
                    "entry {hash:016x} points at dat file {} of {}",
                    entry.data_file_id(),
                    self.dat_paths.len()
                ))
            })?;

        let file = sqpack_dat::read_file_at(dat_path, entry.offset())?;
        Ok(Some(file))
    }
}
