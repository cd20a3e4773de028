//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image::ImageReader` with content sniffing |
//! | Fit | [`calculate_fit_dimensions`] + `DynamicImage::resize_exact` (`Nearest`) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_fit_dimensions;
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn fit_thumbnail(&self, img: &DynamicImage, max_dim: u32) -> DynamicImage {
        let Dimensions { width, height } = Dimensions::from(img);
        let (fit_w, fit_h) = calculate_fit_dimensions((width, height), max_dim);
        if (fit_w, fit_h) == (width, height) {
            return img.clone();
        }
        img.resize_exact(fit_w, fit_h, FilterType::Nearest)
    }

    fn encode(&self, img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        // JPEG has no alpha channel; flatten everything to RGB8 first
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
        rgb.write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(buf)
    }
}
