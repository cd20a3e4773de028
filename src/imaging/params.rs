//! Parameter types for image operations.
//!
//! These describe *what* to produce, not *how*. They sit between the
//! [`operations`](super::operations) module (which decides the output) and the
//! [`backend`](super::backend) (which does the pixel work), so a mock backend
//! can stand in during tests without touching operation logic.

/// Quality setting for lossy JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Full description of a thumbnail to derive from a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailParams {
    /// Edge length of the square bounding box the result must fit in.
    pub max_dim: u32,
    pub quality: Quality,
}
