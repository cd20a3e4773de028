//! Directory listings for gallery browsing.
//!
//! A listing is the data behind a gallery page: the subdirectories to
//! navigate into, and the images in this directory with the sizes a page
//! should request for them. Rendering it as HTML is left to the web layer.
//!
//! ```text
//! gallery/                       list_directory(root, "gallery")
//! ├── 2015/                  →   directories: ["2015", "2016"]
//! ├── 2016/
//! ├── beach.JPG              →   images: ["beach.JPG", "dunes.png"]
//! ├── dunes.png
//! └── notes.txt              →   (skipped)
//! ```
//!
//! Image detection is by file name only ([`looks_like_image`]), so a listed
//! file can still fail to decode when its thumbnail is requested.

use crate::config::ListingConfig;
use crate::gateway::validate_gallery_path;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions treated as images, compared case-insensitively.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Invalid gallery path: {0:?}")]
    InvalidPath(String),
}

/// Contents of one gallery directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// Directory path relative to the gallery root.
    pub path: String,
    pub breadcrumbs: Vec<Crumb>,
    pub directories: Vec<String>,
    pub images: Vec<ListedImage>,
}

/// An image in a listing, with the request sizes for its two renditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedImage {
    pub name: String,
    /// Gallery path to pass to the resolver.
    pub path: String,
    pub thumb_size: u32,
    pub slide_size: u32,
}

/// One step of the navigation trail above a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub title: String,
    pub href: String,
}

/// Permissive name-based image check: `.jpg`, `.jpeg`, `.png`, `.gif` in any case.
pub fn looks_like_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|i| ext.eq_ignore_ascii_case(i)))
}

/// Build the cumulative navigation trail for a request path.
///
/// `/gallery/2016/summer/` → `gallery → /gallery/`, `2016 → /gallery/2016/`,
/// `summer → /gallery/2016/summer/`. Empty components are skipped.
pub fn breadcrumbs(request_path: &str) -> Vec<Crumb> {
    let mut prefix = String::new();
    request_path
        .split('/')
        .filter(|c| !c.is_empty())
        .map(|component| {
            prefix.push('/');
            prefix.push_str(component);
            Crumb {
                title: component.to_string(),
                href: format!("{prefix}/"),
            }
        })
        .collect()
}

/// List `rel_dir` under `gallery_root`.
///
/// Directories and images are each sorted by name. Entries that are neither
/// directories nor regular image files are skipped.
pub fn list_directory(
    gallery_root: &Path,
    rel_dir: &str,
    config: &ListingConfig,
) -> Result<Listing, ListingError> {
    let relative = if names_gallery_root(rel_dir) {
        PathBuf::new()
    } else {
        validate_gallery_path(rel_dir)
            .map_err(|_| ListingError::InvalidPath(rel_dir.to_string()))?
    };
    let dir = gallery_root.join(&relative);

    if !dir.is_dir() {
        return Err(ListingError::NotADirectory(dir));
    }

    let mut directories = Vec::new();
    let mut image_names = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            directories.push(name);
        } else if file_type.is_file() && looks_like_image(&name) {
            image_names.push(name);
        }
    }
    directories.sort();
    image_names.sort();

    let path = relative.to_string_lossy().replace('\\', "/");
    let images = image_names
        .into_iter()
        .map(|name| ListedImage {
            path: join_gallery_path(&path, &name),
            name,
            thumb_size: config.thumb_size,
            slide_size: config.slide_size,
        })
        .collect();

    Ok(Listing {
        breadcrumbs: breadcrumbs(&path),
        path,
        directories,
        images,
    })
}

/// True for directory arguments that mean the gallery root: `""`, `/`, `.`, `./`.
pub(crate) fn names_gallery_root(rel_dir: &str) -> bool {
    rel_dir.split('/').all(|c| c.is_empty() || c == ".")
}

fn join_gallery_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
