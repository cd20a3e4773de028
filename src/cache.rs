//! On-disk thumbnail cache.
//!
//! Decoding and resizing a full-size photo is the expensive part of serving a
//! gallery page; a grid of thirty thumbnails can otherwise cost seconds of CPU
//! on every visit. This module maps each (source image, size) pair to a file
//! under the cache root so that work is done once.
//!
//! # Cache keys
//!
//! The cache is **path-addressed**: the key is the source path relative to
//! the gallery root plus the requested size, encoded directly into the file
//! name:
//!
//! ```text
//! <cache_root>/<source_relative_path>_<size>
//!
//! gallery/2016/beach.jpg @ 300  →  imgcache/gallery/2016/beach.jpg_300
//! gallery/2016/beach.jpg @ 1200 →  imgcache/gallery/2016/beach.jpg_1200
//! ```
//!
//! The size is always the digits after the final `_`, so the mapping is
//! injective. The layout is the only persisted state: a restarted process
//! finds existing thumbnails by recomputing the same path.
//!
//! # No invalidation
//!
//! A cache file that exists is served as-is, forever. Replacing a source image
//! does not refresh its thumbnails; delete the matching files under the cache
//! root to force regeneration.
//!
//! # Writes
//!
//! Thumbnails are written to `<cache_path>.tmp` and renamed into place, so a
//! crash mid-write never leaves a truncated file under a valid cache name.
//! The store does no locking; the worker is the only writer.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix for in-progress writes. Never ends in a digit, so it can't collide
/// with a cache path.
const TEMP_SUFFIX: &str = ".tmp";

/// Filesystem-backed thumbnail cache rooted at a single directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache file for `source` (relative to the gallery root) at `size`.
    pub fn cache_path(&self, source: &Path, size: u32) -> PathBuf {
        let mut name = OsString::from(source.as_os_str());
        name.push(format!("_{size}"));
        self.root.join(name)
    }

    /// Whether a cache file is present. A directory squatting on the cache
    /// path does not count.
    pub fn exists(&self, cache_path: &Path) -> bool {
        fs::metadata(cache_path).is_ok_and(|m| m.is_file())
    }

    /// Create every missing directory above `cache_path`.
    pub fn ensure_parent_dir(&self, cache_path: &Path) -> io::Result<()> {
        match cache_path.parent() {
            Some(parent) => fs::create_dir_all(parent),
            None => Ok(()),
        }
    }

    /// Write `bytes` to `cache_path` via a temp file and rename.
    pub fn write_atomic(&self, cache_path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.ensure_parent_dir(cache_path)?;

        let temp_path = temp_path_for(cache_path);
        if let Err(e) = fs::write(&temp_path, bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        fs::rename(&temp_path, cache_path).inspect_err(|_| {
            let _ = fs::remove_file(&temp_path);
        })
    }
}

fn temp_path_for(cache_path: &Path) -> PathBuf {
    let mut name = OsString::from(cache_path.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Summary of what the worker did with the requests it served.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests for the unresized original.
    pub originals: u64,
    pub hits: u64,
    pub generated: u64,
    pub failures: u64,
}

impl CacheStats {
    pub fn original(&mut self) {
        self.originals = self.originals.saturating_add(1);
    }

    pub fn hit(&mut self) {
        self.hits = self.hits.saturating_add(1);
    }

    pub fn generate(&mut self) {
        self.generated = self.generated.saturating_add(1);
    }

    pub fn fail(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.originals
            .saturating_add(self.hits)
            .saturating_add(self.generated)
            .saturating_add(self.failures)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cached, {} generated, {} original, {} failed ({} total)",
            self.hits,
            self.generated,
            self.originals,
            self.failures,
            self.total()
        )
    }
}
