//! Install root discovery and path-based fetching

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::category::{Category, category_id};
use crate::error::{Result, SqPackError};
use crate::hash::ParsedFilePath;
use crate::repository::Repository;
use sqpack_dat::SqPackFile;

/// The root of a SqPack install: every repository under the sqpack
/// directory, in discovery order.
///
/// Lookups probe repositories in order and return the first category hit by
/// either hash scheme.
#[derive(Debug)]
pub struct SqPackStorage {
    repositories: Vec<Repository>,
}

impl SqPackStorage {
    /// Discover the repositories of an install.
    ///
    /// Accepts either the install root (containing `game/sqpack`) or the
    /// `game` directory itself (containing `sqpack`).
    pub fn open(install_root: impl AsRef<Path>) -> Result<Self> {
        let install_root = install_root.as_ref();
        if !install_root.is_dir() {
            return Err(SqPackError::DirectoryNotFound(install_root.to_path_buf()));
        }

        let is_game_dir = install_root.file_name().and_then(|n| n.to_str()) == Some("game");
        let sqpack_dir = if is_game_dir {
            install_root.join("sqpack")
        } else {
            install_root.join("game").join("sqpack")
        };
        if !sqpack_dir.is_dir() {
            return Err(SqPackError::DirectoryNotFound(sqpack_dir));
        }

        info!("Loading SqPack repositories from {}", sqpack_dir.display());

        let mut repository_dirs: Vec<PathBuf> = fs::read_dir(&sqpack_dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        repository_dirs.sort();

        let mut repositories = Vec::with_capacity(repository_dirs.len());
        for dir in repository_dirs {
            repositories.push(Repository::open(&dir)?);
        }

        info!("Loaded {} repositories", repositories.len());

        Ok(Self { repositories })
    }

    /// The discovered repositories, in probe order.
    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// Whether any repository holds a record for `path`.
    pub fn file_exists(&self, path: &str) -> bool {
        let parsed = ParsedFilePath::parse(path);
        self.candidates(&parsed)
            .any(|(category, hash)| category.file_exists(hash))
    }

    /// Resolve `path` and decode the first record it hits.
    ///
    /// Repositories are probed in discovery order; within each repository
    /// only categories matching the path's first segment are considered when
    /// the segment names a known category. Per category the wide hash is
    /// tried before the full-path hash. Returns `Ok(None)` when no
    /// repository holds the path.
    pub fn fetch(&self, path: &str) -> Result<Option<SqPackFile>> {
        let parsed = ParsedFilePath::parse(path);
        debug!(
            "Fetching {} (index1={:016x}, index2={:08x})",
            parsed.path(),
            parsed.index1_hash(),
            parsed.index2_hash()
        );

        for (category, hash) in self.candidates(&parsed) {
            if let Some(file) = category.fetch(hash)? {
                return Ok(Some(file));
            }
        }
        Ok(None)
    }

    /// Decode every record `path` hits across all repositories and
    /// categories, in probe order.
    pub fn fetch_all(&self, path: &str) -> Result<Vec<SqPackFile>> {
        let parsed = ParsedFilePath::parse(path);

        let mut files = Vec::new();
        for (category, hash) in self.candidates(&parsed) {
            if let Some(file) = category.fetch(hash)? {
                files.push(file);
            }
        }
        Ok(files)
    }

    /// Every (category, hash) pair to probe for a parsed path, in order.
    fn candidates<'a>(
        &'a self,
        parsed: &ParsedFilePath,
    ) -> impl Iterator<Item = (&'a Category, u64)> {
        let wanted_id = category_id(parsed.category());
        let index1 = parsed.index1_hash();
        let index2 = u64::from(parsed.index2_hash());

        self.repositories
            .iter()
            .flat_map(move |repository| {
                repository
                    .categories()
                    .iter()
                    .filter(move |((category, _, _), _)| {
                        wanted_id.map_or(true, |id| *category == id)
                    })
                    .map(|(_, category)| category)
            })
            .flat_map(move |category| [(category, index1), (category, index2)])
    }
}
