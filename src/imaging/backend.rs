//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three steps every thumbnail goes
//! through: decode, fit, encode. The worker only ever talks to this trait, so
//! tests can swap in a recording backend to observe what gets decoded and when.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::Quality;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Width and height of a decoded or fitted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<&DynamicImage> for Dimensions {
    fn from(img: &DynamicImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
        }
    }
}

/// Trait for image processing backends.
///
/// `Send` because the backend is moved into the worker thread.
pub trait ImageBackend: Send {
    /// Parse raw file bytes into an image. The format is sniffed from the
    /// content; bytes that are not an image must come back as
    /// [`BackendError::Decode`], never a panic.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Shrink an image into a `max_dim × max_dim` box, preserving aspect ratio.
    fn fit_thumbnail(&self, img: &DynamicImage, max_dim: u32) -> DynamicImage;

    /// Encode an image to the cache format.
    fn encode(&self, img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
