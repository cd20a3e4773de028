//! Request gateway: the only door into the worker.
//!
//! An HTTP handler (or the CLI) holds a [`Gateway`] and calls
//! [`Gateway::resolve`] with a gallery-relative path and a size. The call
//! enqueues an [`ImageRequest`] on the worker's intake channel and blocks
//! until the worker answers on that request's private reply channel.
//!
//! ```text
//! handler thread ──resolve()──▶ intake (FIFO) ──▶ worker thread
//!       ▲                                            │
//!       └──────────── reply channel ◀────────────────┘
//! ```
//!
//! There is no timeout and no cancellation. A caller that gives up still
//! holds its place in the queue until the worker gets to it.

use crate::imaging::BackendError;
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Image not found: {0}")]
    NotFound(PathBuf),
    #[error("Invalid gallery path: {0:?}")]
    InvalidPath(String),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Failed to encode thumbnail for {path}: {message}")]
    Encode { path: PathBuf, message: String },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Image worker is not running")]
    WorkerUnavailable,
}

impl GalleryError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        GalleryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classify a backend failure for the image at `path`.
    pub(crate) fn imaging(path: &Path, err: BackendError) -> Self {
        match err {
            BackendError::Decode(message) => GalleryError::Decode {
                path: path.to_path_buf(),
                message,
            },
            BackendError::Encode(message) => GalleryError::Encode {
                path: path.to_path_buf(),
                message,
            },
        }
    }
}

/// Where the bytes behind a [`ResolvedImage`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Size 0: the untouched source file.
    Original,
    /// The thumbnail was already in the cache.
    CacheHit,
    /// The thumbnail was generated for this request.
    Generated,
}

/// A readable image handed back to the caller.
///
/// The caller owns `file` and closes it by dropping it.
#[derive(Debug)]
pub struct ResolvedImage {
    pub file: File,
    pub modified: SystemTime,
    pub origin: Origin,
}

/// Outcome delivered to the caller.
pub type Resolution = Result<ResolvedImage, GalleryError>;

/// A unit of work for the worker: one source path at one size.
#[derive(Debug)]
pub struct ImageRequest {
    pub source_path: String,
    /// 0 means "serve the original".
    pub size: u32,
    reply: mpsc::SyncSender<Resolution>,
}

impl ImageRequest {
    fn new(source_path: String, size: u32) -> (Self, mpsc::Receiver<Resolution>) {
        // One slot: the worker publishes exactly once and never blocks on it
        let (reply, rx) = mpsc::sync_channel(1);
        (
            Self {
                source_path,
                size,
                reply,
            },
            rx,
        )
    }

    /// Publish the outcome. Returns `false` if the caller is gone.
    pub(crate) fn publish(self, resolution: Resolution) -> bool {
        self.reply.send(resolution).is_ok()
    }
}

/// Cloneable handle for submitting requests to the worker.
#[derive(Debug, Clone)]
pub struct Gateway {
    intake: mpsc::Sender<ImageRequest>,
}

impl Gateway {
    pub(crate) fn new(intake: mpsc::Sender<ImageRequest>) -> Self {
        Self { intake }
    }

    /// Resolve `source_path` at `size`, blocking until the worker answers.
    ///
    /// `size == 0` returns the original file; any other value returns a
    /// thumbnail that fits a `size × size` box.
    pub fn resolve(&self, source_path: impl Into<String>, size: u32) -> Resolution {
        let (request, reply) = ImageRequest::new(source_path.into(), size);
        self.intake
            .send(request)
            .map_err(|_| GalleryError::WorkerUnavailable)?;
        // A dropped sender means the worker died before answering
        reply.recv().map_err(|_| GalleryError::WorkerUnavailable)?
    }
}

/// Check that `source_path` stays inside the gallery root and return it as a
/// relative path.
///
/// Absolute paths, `..` components and NUL bytes are rejected. `.` components
/// and redundant separators are dropped so `./a//b.jpg` and `a/b.jpg` share a
/// cache entry.
pub fn validate_gallery_path(source_path: &str) -> Result<PathBuf, GalleryError> {
    let invalid = || GalleryError::InvalidPath(source_path.to_string());

    if source_path.contains('\0') {
        return Err(invalid());
    }

    let mut clean = PathBuf::new();
    for component in Path::new(source_path).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid());
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(invalid());
    }
    Ok(clean)
}
