//! Repository discovery: one install unit (base game or expansion)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::category::Category;
use crate::error::{Result, SqPackError};

/// What role a file plays within its category set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetFileKind {
    Index,
    Index2,
    Dat(u32),
}

/// Split `NNNNNN.platform.(index|index2|datN)` into the set key and kind.
///
/// The six leading hex digits are the category, expansion and chunk ids, one
/// byte each.
fn parse_set_filename(name: &str) -> Option<((u8, u8, u8), SetFileKind)> {
    let mut parts = name.split('.');
    let set_id = parts.next()?;
    let _platform = parts.next()?;
    let kind = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    if set_id.len() != 6 || !set_id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let category = u8::from_str_radix(&set_id[0..2], 16).ok()?;
    let expansion = u8::from_str_radix(&set_id[2..4], 16).ok()?;
    let chunk = u8::from_str_radix(&set_id[4..6], 16).ok()?;

    let kind = match kind {
        "index" => SetFileKind::Index,
        "index2" => SetFileKind::Index2,
        _ => SetFileKind::Dat(kind.strip_prefix("dat")?.parse().ok()?),
    };

    Some(((category, expansion, chunk), kind))
}

/// Files collected for one category set before it is built
#[derive(Default)]
struct SetFiles {
    index: Option<PathBuf>,
    index2: Option<PathBuf>,
    dats: BTreeMap<u32, PathBuf>,
}

/// One install unit: the base game directory or a single expansion.
///
/// Owns every category discovered beneath its directory, keyed by
/// (category, expansion, chunk) id.
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    version: String,
    expansion_id: Option<u32>,
    categories: BTreeMap<(u8, u8, u8), Category>,
}

impl Repository {
    /// Discover the categories directly under `path`.
    ///
    /// A category set without dat files is skipped; a set with dat files but
    /// neither index format is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(SqPackError::DirectoryNotFound(path.to_path_buf()));
        }

        let version = parse_version(path);
        let expansion_id = parse_expansion_id(path);

        let mut sets: BTreeMap<(u8, u8, u8), SetFiles> = BTreeMap::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            match parse_set_filename(name) {
                Some((key, SetFileKind::Index)) => {
                    sets.entry(key).or_default().index = Some(entry.path());
                }
                Some((key, SetFileKind::Index2)) => {
                    sets.entry(key).or_default().index2 = Some(entry.path());
                }
                Some((key, SetFileKind::Dat(id))) => {
                    sets.entry(key).or_default().dats.insert(id, entry.path());
                }
                None => {
                    warn!("File {name} does not match the expected set pattern");
                }
            }
        }

        let mut categories = BTreeMap::new();
        for ((category, expansion, chunk), files) in sets {
            if files.dats.is_empty() {
                // Some category slots legitimately ship without data
                warn!(
                    "No dat files for set {category:02x}{expansion:02x}{chunk:02x} in {}",
                    path.display()
                );
                continue;
            }

            let index = files.index.map(fs::read).transpose()?;
            let index2 = files.index2.map(fs::read).transpose()?;
            let dat_paths: Vec<PathBuf> = files.dats.into_values().collect();

            let cat = Category::new(
                category,
                index.as_deref(),
                index2.as_deref(),
                dat_paths,
            )?;
            categories.insert((category, expansion, chunk), cat);
        }

        debug!(
            "Repository {} ({}): {} categories",
            path.display(),
            if version.is_empty() { "unversioned" } else { &version },
            categories.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            version,
            expansion_id,
            categories,
        })
    }

    /// The repository directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The resolved version string, empty when no version file was found.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The expansion number for `exN` repositories.
    pub fn expansion_id(&self) -> Option<u32> {
        self.expansion_id
    }

    /// Every category keyed by (category, expansion, chunk) id.
    pub fn categories(&self) -> &BTreeMap<(u8, u8, u8), Category> {
        &self.categories
    }

    /// The categories matching a category id, in chunk order.
    pub fn categories_with_id(&self, id: u8) -> impl Iterator<Item = &Category> {
        self.categories
            .iter()
            .filter(move |((category, _, _), _)| *category == id)
            .map(|(_, category)| category)
    }
}

/// Resolve the repository version string.
///
/// The base game keeps its version two levels up next to the `game`
/// directory; expansions keep theirs inside their own directory. A missing
/// file is not an error.
fn parse_version(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    let version_file = if name == "ffxiv" {
        path.parent()
            .and_then(Path::parent)
            .map(|game| game.join("ffxivgame.ver"))
    } else if name.starts_with("ex") {
        Some(path.join(format!("{name}.ver")))
    } else {
        None
    };

    version_file
        .and_then(|file| fs::read_to_string(file).ok())
        .map(|contents| contents.trim().to_string())
        .unwrap_or_default()
}

fn parse_expansion_id(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("ex")?.parse().ok()
}
