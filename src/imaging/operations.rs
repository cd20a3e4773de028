//! High-level image operations.
//!
//! These combine the backend steps into what the worker actually needs:
//! source bytes in, encoded thumbnail bytes out.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ThumbnailParams;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// An encoded thumbnail ready to be written to the cache.
#[derive(Debug, Clone)]
pub struct EncodedThumbnail {
    pub bytes: Vec<u8>,
    /// Dimensions of the decoded source.
    pub source: Dimensions,
    /// Dimensions of the thumbnail after fitting.
    pub output: Dimensions,
}

/// Decode `source`, fit it into the bounding box, and re-encode it.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &[u8],
    params: &ThumbnailParams,
) -> Result<EncodedThumbnail> {
    let img = backend.decode(source)?;
    let fitted = backend.fit_thumbnail(&img, params.max_dim);
    let bytes = backend.encode(&fitted, params.quality)?;

    Ok(EncodedThumbnail {
        bytes,
        source: Dimensions::from(&img),
        output: Dimensions::from(&fitted),
    })
}
