//! Cache warming.
//!
//! Walks a gallery directory and resolves every image at the requested sizes
//! so that the first visitor gets cache hits. Requests are submitted from a
//! rayon pool, many at once, and all of them funnel through the single
//! worker; warming therefore exercises the same path a busy web server does.

use crate::gateway::{Gateway, GalleryError, Origin, validate_gallery_path};
use crate::listing::{looks_like_image, names_gallery_root};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WarmError {
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

/// What to warm.
#[derive(Debug, Clone)]
pub struct WarmOptions {
    /// Sizes to generate for every image. Zero is skipped.
    pub sizes: Vec<u32>,
    /// Descend into subdirectories.
    pub recursive: bool,
}

/// Outcome of resolving one image at one size.
#[derive(Debug)]
pub struct WarmOutcome {
    pub size: u32,
    pub result: Result<Origin, GalleryError>,
}

/// All outcomes for one image, in the order of [`WarmOptions::sizes`].
#[derive(Debug)]
pub struct WarmedImage {
    pub path: String,
    pub outcomes: Vec<WarmOutcome>,
}

/// Collect the gallery paths of every image-named file under `rel_dir`,
/// sorted by path.
pub fn collect_images(
    gallery_root: &Path,
    rel_dir: &str,
    recursive: bool,
) -> Result<Vec<String>, WarmError> {
    let relative = if names_gallery_root(rel_dir) {
        PathBuf::new()
    } else {
        validate_gallery_path(rel_dir)?
    };
    let dir = gallery_root.join(&relative);
    if !dir.is_dir() {
        return Err(WarmError::NotADirectory(dir));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images = Vec::new();
    for entry in WalkDir::new(&dir)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !looks_like_image(name) {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(gallery_root) {
            images.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    images.sort();
    Ok(images)
}

/// Resolve every image under `rel_dir` at every size in `options`.
///
/// Individual failures are reported per image and never stop the run.
pub fn warm_directory(
    gateway: &Gateway,
    gallery_root: &Path,
    rel_dir: &str,
    options: &WarmOptions,
) -> Result<Vec<WarmedImage>, WarmError> {
    let images = collect_images(gallery_root, rel_dir, options.recursive)?;
    let sizes: Vec<u32> = options.sizes.iter().copied().filter(|&s| s > 0).collect();

    tracing::info!(
        dir = rel_dir,
        images = images.len(),
        sizes = ?sizes,
        "warming thumbnail cache"
    );

    let warmed = images
        .into_par_iter()
        .map(|path| {
            let outcomes = sizes
                .iter()
                .map(|&size| WarmOutcome {
                    size,
                    // The handle is not needed; dropping it closes the file
                    result: gateway.resolve(path.as_str(), size).map(|r| r.origin),
                })
                .collect();
            WarmedImage { path, outcomes }
        })
        .collect();
    Ok(warmed)
}
