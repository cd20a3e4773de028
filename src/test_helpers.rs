//! Shared test utilities for the thumbwell test suite.
//!
//! Fixtures are generated on the fly with the `image` crate rather than
//! checked in, so every test gets an isolated gallery it can mutate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_gallery();
//! let config = test_config(tmp.path());
//! let (gateway, _worker) = crate::worker::spawn(&config).unwrap();
//! let thumb = gateway.resolve("gallery/foo.jpg", 100).unwrap();
//! ```

use crate::config::GalleryConfig;
use image::{ImageEncoder, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a gradient of the given size as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode a gradient of the given size as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Build a small gallery in a temp directory:
///
/// ```text
/// gallery/
/// ├── foo.jpg        640x480
/// ├── bar.png        200x100
/// ├── broken.jpg     HTML bytes behind an image name
/// ├── notes.txt
/// └── sub/
///     └── baz.jpg    300x600
/// ```
pub fn setup_gallery() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let gallery = tmp.path().join("gallery");
    fs::create_dir_all(gallery.join("sub")).unwrap();

    fs::write(gallery.join("foo.jpg"), jpeg_bytes(640, 480)).unwrap();
    fs::write(gallery.join("bar.png"), png_bytes(200, 100)).unwrap();
    fs::write(gallery.join("broken.jpg"), b"<html>404 not found</html>").unwrap();
    fs::write(gallery.join("notes.txt"), b"not an image").unwrap();
    fs::write(gallery.join("sub/baz.jpg"), jpeg_bytes(300, 600)).unwrap();
    tmp
}

/// Config rooted at `root` with the cache under `root/imgcache`.
pub fn test_config(root: &Path) -> GalleryConfig {
    GalleryConfig {
        gallery_root: root.to_path_buf(),
        cache_root: root.join("imgcache"),
        ..GalleryConfig::default()
    }
}
