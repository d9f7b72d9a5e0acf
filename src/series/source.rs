//! Storage backends for series files.
//!
//! The reader never touches the filesystem directly. Opening image files,
//! checking that a referenced file exists and listing a project directory
//! all go through a [`SeriesSource`], so the same resolution and decoding
//! code runs over local files and over in-memory fixtures.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::IoError;
use crate::io::{
    BlockCache, FileRangeReader, MemoryRangeReader, RangeReader, DEFAULT_BLOCK_SIZE,
    DEFAULT_CACHE_CAPACITY,
};

// =============================================================================
// SeriesSource Trait
// =============================================================================

/// Trait for reaching the files of a dataset.
///
/// This abstraction lets the resolver and the reader work against different
/// storage backends without being tied to `std::fs`.
pub trait SeriesSource: Send + Sync {
    /// The type of range reader this source creates.
    type Reader: RangeReader + 'static;

    /// Create a range reader for the file at `path`.
    fn open(&self, path: &Path) -> Result<Self::Reader, IoError>;

    /// Whether `path` names an existing file or directory.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` names a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// List the entries of directory `dir`.
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, IoError>;
}

// =============================================================================
// LocalFileSource
// =============================================================================

/// Local filesystem source.
///
/// Every opened file is wrapped in a [`BlockCache`] so the many small cursor
/// reads made while decoding metadata are served from memory.
#[derive(Debug, Clone, Copy)]
pub struct LocalFileSource {
    block_size: usize,
    cache_blocks: usize,
}

impl LocalFileSource {
    /// Create a source with the default block cache settings.
    pub fn new() -> Self {
        Self::with_cache(DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY)
    }

    /// Create a source with a custom block size and per-file block count.
    pub fn with_cache(block_size: usize, cache_blocks: usize) -> Self {
        Self {
            block_size,
            cache_blocks,
        }
    }

    /// Block size used for opened files.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks cached per opened file.
    pub fn cache_blocks(&self) -> usize {
        self.cache_blocks
    }
}

impl Default for LocalFileSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesSource for LocalFileSource {
    type Reader = BlockCache<FileRangeReader>;

    fn open(&self, path: &Path) -> Result<Self::Reader, IoError> {
        if !path.is_file() {
            return Err(IoError::NotFound(path.display().to_string()));
        }
        let file = FileRangeReader::open(path)?;
        Ok(BlockCache::with_capacity(
            file,
            self.block_size,
            self.cache_blocks,
        ))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, IoError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }
}

// =============================================================================
// MemorySource
// =============================================================================

/// In-memory source keyed by path.
///
/// Directories are implied by the parents of the stored files. Paths created
/// with [`MemorySource::add_dir`] exist as empty directories.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, Bytes>,
    dirs: BTreeSet<PathBuf>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` at `path`, replacing any previous content.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, data: impl Into<Bytes>) -> &mut Self {
        self.files.insert(path.into(), data.into());
        self
    }

    /// Register an explicit directory entry.
    pub fn add_dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.dirs.insert(path.into());
        self
    }

    fn implied_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
            || self
                .paths()
                .any(|p| p.parent().is_some_and(|parent| parent.starts_with(path)))
    }

    fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys().chain(self.dirs.iter())
    }
}

impl SeriesSource for MemorySource {
    type Reader = MemoryRangeReader;

    fn open(&self, path: &Path) -> Result<Self::Reader, IoError> {
        self.files
            .get(path)
            .map(|data| MemoryRangeReader::new(data.clone(), path.display().to_string()))
            .ok_or_else(|| IoError::NotFound(path.display().to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.implied_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        !self.files.contains_key(path) && self.implied_dir(path)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, IoError> {
        if !self.is_dir(dir) {
            return Err(IoError::NotFound(dir.display().to_string()));
        }
        let mut entries: Vec<PathBuf> = self
            .paths()
            .flat_map(|p| p.ancestors())
            .filter(|a| a.parent() == Some(dir))
            .map(Path::to_path_buf)
            .collect();
        entries.sort();
        entries.dedup();
        Ok(entries)
    }
}

// =============================================================================
// Tests
// =============================================================================
