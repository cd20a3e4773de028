//! The single image worker.
//!
//! Every image request, whether it turns out to be an original, a cache hit,
//! or a cache miss, is processed by one dedicated thread, one request at a
//! time, in the order requests reached the intake channel. That gives a
//! simple guarantee: **at most one image-generation operation runs at any
//! time**. Two connections asking for the same uncached thumbnail can never
//! write the same cache file concurrently, and a burst of gallery page loads
//! can't saturate every core with JPEG decoding.
//!
//! The cost is that unrelated requests also wait on each other, and a cache
//! hit queued behind a slow miss waits for it. That ceiling is accepted; a
//! worker pool would need per-key coordination to keep the same guarantee.
//!
//! ## Per-request algorithm
//!
//! 1. Validate the gallery path (no `..`, not absolute).
//! 2. `size == 0`: open the source, take its mtime. Cache untouched.
//! 3. Cache file exists: open it, take its mtime.
//! 4. Otherwise read + decode the source, fit it into `size × size`, encode
//!    to JPEG, write the cache file atomically, open it; mtime is now.
//! 5. Publish the outcome on the request's reply channel.
//!
//! Errors at any step are logged and published; the loop itself never stops
//! until every [`Gateway`] has been dropped.

use crate::cache::{CacheStats, CacheStore};
use crate::config::GalleryConfig;
use crate::gateway::{
    Gateway, GalleryError, ImageRequest, Origin, ResolvedImage, Resolution,
    validate_gallery_path,
};
use crate::imaging::{ImageBackend, Quality, RustBackend, ThumbnailParams, create_thumbnail};
use std::fs::{self, File};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Handle to the running worker thread.
#[derive(Debug)]
pub struct WorkerHandle {
    thread: JoinHandle<CacheStats>,
}

impl WorkerHandle {
    /// Wait for the worker to drain its queue and exit.
    ///
    /// The worker only exits once every [`Gateway`] clone is dropped, so
    /// drop them before calling this.
    pub fn join(self) -> Result<CacheStats, GalleryError> {
        self.thread
            .join()
            .map_err(|_| GalleryError::WorkerUnavailable)
    }
}

/// Start the worker with the production [`RustBackend`].
pub fn spawn(config: &GalleryConfig) -> io::Result<(Gateway, WorkerHandle)> {
    spawn_with_backend(config, RustBackend::new())
}

/// Start the worker with a specific backend (allows testing with a mock).
pub fn spawn_with_backend<B>(
    config: &GalleryConfig,
    backend: B,
) -> io::Result<(Gateway, WorkerHandle)>
where
    B: ImageBackend + 'static,
{
    let worker = Worker {
        gallery_root: config.gallery_root.clone(),
        cache: CacheStore::new(config.cache_root.clone()),
        quality: Quality::new(config.thumbnails.quality),
        backend,
        stats: CacheStats::default(),
    };

    let (intake, requests) = mpsc::channel();
    let thread = thread::Builder::new()
        .name("thumbwell-worker".into())
        .spawn(move || worker.run(requests))?;

    info!(
        gallery_root = %config.gallery_root.display(),
        cache_root = %config.cache_root.display(),
        "image worker started"
    );
    Ok((Gateway::new(intake), WorkerHandle { thread }))
}

struct Worker<B> {
    gallery_root: PathBuf,
    cache: CacheStore,
    quality: Quality,
    backend: B,
    stats: CacheStats,
}

impl<B: ImageBackend> Worker<B> {
    fn run(mut self, requests: mpsc::Receiver<ImageRequest>) -> CacheStats {
        for request in requests {
            let resolution = self.process(&request.source_path, request.size);
            self.record(&request, &resolution);

            let (path, size) = (request.source_path.clone(), request.size);
            if !request.publish(resolution) {
                debug!(%path, size, "requester went away before the result was ready");
            }
        }

        info!(stats = %self.stats, "image worker stopped");
        self.stats
    }

    fn record(&mut self, request: &ImageRequest, resolution: &Resolution) {
        let path = &request.source_path;
        let size = request.size;
        match resolution {
            Ok(resolved) => match resolved.origin {
                Origin::Original => {
                    self.stats.original();
                    debug!(%path, "serving original");
                }
                Origin::CacheHit => {
                    self.stats.hit();
                    debug!(%path, size, "thumbnail cache hit");
                }
                Origin::Generated => self.stats.generate(),
            },
            Err(error) => {
                self.stats.fail();
                warn!(%path, size, %error, "image request failed");
            }
        }
    }

    fn process(&self, source_path: &str, size: u32) -> Resolution {
        let relative = validate_gallery_path(source_path)?;
        let source = self.gallery_root.join(&relative);

        if size == 0 {
            let modified = source_mtime(&source)?;
            let file = open(&source)?;
            return Ok(ResolvedImage {
                file,
                modified,
                origin: Origin::Original,
            });
        }

        let cache_path = self.cache.cache_path(&relative, size);
        if self.cache.exists(&cache_path) {
            let file = open(&cache_path)?;
            let modified = file
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| GalleryError::io(&cache_path, e))?;
            return Ok(ResolvedImage {
                file,
                modified,
                origin: Origin::CacheHit,
            });
        }

        self.generate(&source, &cache_path, size)
    }

    /// Cache miss: build the thumbnail and store it under `cache_path`.
    fn generate(&self, source: &Path, cache_path: &Path, size: u32) -> Resolution {
        source_mtime(source)?;
        let bytes = fs::read(source).map_err(|e| GalleryError::io(source, e))?;

        let params = ThumbnailParams {
            max_dim: size,
            quality: self.quality,
        };
        // A decoder panic must not take the only worker down with it
        let thumbnail = panic::catch_unwind(AssertUnwindSafe(|| {
            create_thumbnail(&self.backend, &bytes, &params)
        }))
        .map_err(|_| GalleryError::Decode {
            path: source.to_path_buf(),
            message: "decoder panicked".into(),
        })?
        .map_err(|e| GalleryError::imaging(source, e))?;

        self.cache
            .write_atomic(cache_path, &thumbnail.bytes)
            .map_err(|e| GalleryError::io(cache_path, e))?;
        let file = open(cache_path)?;

        info!(
            source = %source.display(),
            cache_path = %cache_path.display(),
            from = %format!("{}x{}", thumbnail.source.width, thumbnail.source.height),
            to = %format!("{}x{}", thumbnail.output.width, thumbnail.output.height),
            bytes = thumbnail.bytes.len(),
            "generated thumbnail"
        );

        Ok(ResolvedImage {
            file,
            modified: SystemTime::now(),
            origin: Origin::Generated,
        })
    }
}

/// Modification time of a source image, or `NotFound` if it is missing or
/// not a regular file.
fn source_mtime(path: &Path) -> Result<SystemTime, GalleryError> {
    let meta = fs::metadata(path).map_err(|e| not_found_or_io(path, e))?;
    if !meta.is_file() {
        return Err(GalleryError::NotFound(path.to_path_buf()));
    }
    meta.modified().map_err(|e| GalleryError::io(path, e))
}

fn open(path: &Path) -> Result<File, GalleryError> {
    File::open(path).map_err(|e| not_found_or_io(path, e))
}

fn not_found_or_io(path: &Path, e: io::Error) -> GalleryError {
    if e.kind() == io::ErrorKind::NotFound {
        GalleryError::NotFound(path.to_path_buf())
    } else {
        GalleryError::io(path, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{RecordedOp, RecordingBackend};
    use crate::test_helpers::{setup_gallery, test_config};
    use std::io::Read;
    use std::time::Duration;

    fn read_all(mut file: File) -> Vec<u8> {
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn miss_then_hit_decodes_once() {
        let tmp = setup_gallery();
        let backend = RecordingBackend::new();
        let (gateway, handle) = spawn_with_backend(&test_config(tmp.path()), backend.clone()).unwrap();

        let first = gateway.resolve("gallery/foo.jpg", 300).unwrap();
        assert_eq!(first.origin, Origin::Generated);
        let first_bytes = read_all(first.file);

        let second = gateway.resolve("gallery/foo.jpg", 300).unwrap();
        assert_eq!(second.origin, Origin::CacheHit);
        assert_eq!(read_all(second.file), first_bytes);

        assert_eq!(backend.decode_count(), 1);

        drop(gateway);
        let stats = handle.join().unwrap();
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn original_never_touches_backend_or_cache() {
        let tmp = setup_gallery();
        let backend = RecordingBackend::new();
        let config = test_config(tmp.path());
        let (gateway, handle) = spawn_with_backend(&config, backend.clone()).unwrap();

        let resolved = gateway.resolve("gallery/foo.jpg", 0).unwrap();

        assert_eq!(resolved.origin, Origin::Original);
        assert_eq!(
            read_all(resolved.file),
            fs::read(tmp.path().join("gallery/foo.jpg")).unwrap()
        );
        assert!(backend.get_operations().is_empty());
        assert!(!config.cache_root.exists());

        drop(gateway);
        assert_eq!(handle.join().unwrap().originals, 1);
    }

    #[test]
    fn different_sizes_are_separate_entries() {
        let tmp = setup_gallery();
        let backend = RecordingBackend::new();
        let config = test_config(tmp.path());
        let (gateway, _handle) = spawn_with_backend(&config, backend.clone()).unwrap();

        gateway.resolve("gallery/foo.jpg", 100).unwrap();
        gateway.resolve("gallery/foo.jpg", 200).unwrap();

        assert!(config.cache_root.join("gallery/foo.jpg_100").is_file());
        assert!(config.cache_root.join("gallery/foo.jpg_200").is_file());
        assert_eq!(backend.decode_count(), 2);
    }

    #[test]
    fn missing_source_is_not_found_and_not_cached() {
        let tmp = setup_gallery();
        let backend = RecordingBackend::new();
        let config = test_config(tmp.path());
        let (gateway, _handle) = spawn_with_backend(&config, backend.clone()).unwrap();

        let result = gateway.resolve("gallery/missing.jpg", 100);

        assert!(matches!(result, Err(GalleryError::NotFound(_))));
        assert!(!config.cache_root.join("gallery/missing.jpg_100").exists());
        assert_eq!(backend.decode_count(), 0);
    }

    #[test]
    fn directory_is_not_found() {
        let tmp = setup_gallery();
        let (gateway, _handle) = spawn(&test_config(tmp.path())).unwrap();

        assert!(matches!(
            gateway.resolve("gallery", 0),
            Err(GalleryError::NotFound(_))
        ));
        assert!(matches!(
            gateway.resolve("gallery", 100),
            Err(GalleryError::NotFound(_))
        ));
    }

    #[test]
    fn corrupt_image_is_decode_error_and_worker_survives() {
        let tmp = setup_gallery();
        let config = test_config(tmp.path());
        let (gateway, handle) = spawn(&config).unwrap();

        let result = gateway.resolve("gallery/broken.jpg", 100);
        assert!(matches!(result, Err(GalleryError::Decode { .. })));
        assert!(!config.cache_root.join("gallery/broken.jpg_100").exists());

        // The next request is still served
        assert!(gateway.resolve("gallery/foo.jpg", 100).is_ok());

        drop(gateway);
        let stats = handle.join().unwrap();
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.generated, 1);
    }

    #[test]
    fn traversal_is_rejected_before_touching_disk() {
        let tmp = setup_gallery();
        let (gateway, _handle) = spawn(&test_config(tmp.path())).unwrap();

        assert!(matches!(
            gateway.resolve("../outside.jpg", 100),
            Err(GalleryError::InvalidPath(_))
        ));
    }

    #[test]
    fn unwritable_cache_is_io_error() {
        let tmp = setup_gallery();
        let mut config = test_config(tmp.path());
        // A regular file where the cache root directory should be
        config.cache_root = tmp.path().join("gallery/foo.jpg");
        let (gateway, _handle) = spawn(&config).unwrap();

        assert!(matches!(
            gateway.resolve("gallery/bar.png", 50),
            Err(GalleryError::Io { .. })
        ));
    }

    #[test]
    fn existing_cache_file_is_served_without_checking_source() {
        let tmp = setup_gallery();
        let backend = RecordingBackend::new();
        let config = test_config(tmp.path());
        let cache_file = config.cache_root.join("gallery/gone.jpg_64");
        fs::create_dir_all(cache_file.parent().unwrap()).unwrap();
        fs::write(&cache_file, b"stale but valid").unwrap();
        let (gateway, _handle) = spawn_with_backend(&config, backend.clone()).unwrap();

        let resolved = gateway.resolve("gallery/gone.jpg", 64).unwrap();

        assert_eq!(resolved.origin, Origin::CacheHit);
        assert_eq!(read_all(resolved.file), b"stale but valid");
        assert_eq!(backend.decode_count(), 0);
    }

    #[test]
    fn concurrent_requests_never_overlap_generation() {
        let tmp = setup_gallery();
        let backend = RecordingBackend::new();
        let config = test_config(tmp.path());
        let (gateway, handle) = spawn_with_backend(&config, backend.clone()).unwrap();

        let callers: Vec<_> = (0..16)
            .map(|i| {
                let gateway = gateway.clone();
                thread::spawn(move || {
                    let (path, size) = match i % 4 {
                        0 => ("gallery/foo.jpg", 120),
                        1 => ("gallery/bar.png", 120),
                        2 => ("gallery/foo.jpg", 60),
                        _ => ("gallery/sub/baz.jpg", 120),
                    };
                    gateway.resolve(path, size).map(|r| r.origin)
                })
            })
            .collect();

        for caller in callers {
            assert!(caller.join().unwrap().is_ok());
        }

        assert_eq!(backend.max_concurrent_decodes(), 1);
        // Four distinct keys, each generated exactly once
        assert_eq!(backend.decode_count(), 4);

        drop(gateway);
        let stats = handle.join().unwrap();
        assert_eq!(stats.generated, 4);
        assert_eq!(stats.hits, 12);
    }

    #[test]
    fn cache_hit_waits_behind_pending_miss() {
        let tmp = setup_gallery();
        let config = test_config(tmp.path());
        let hit_file = config.cache_root.join("gallery/foo.jpg_64");
        fs::create_dir_all(hit_file.parent().unwrap()).unwrap();
        fs::write(&hit_file, b"primed").unwrap();
        let backend = RecordingBackend::with_decode_delay(Duration::from_millis(200));
        let (gateway, _handle) = spawn_with_backend(&config, backend.clone()).unwrap();

        let miss = {
            let gateway = gateway.clone();
            thread::spawn(move || gateway.resolve("gallery/bar.png", 50).map(|r| r.origin))
        };
        // Submit the hit only once the miss is being decoded
        while backend.decode_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        let hit = gateway.resolve("gallery/foo.jpg", 64).unwrap();

        // Answered in arrival order: the miss finished before the hit was served
        assert_eq!(hit.origin, Origin::CacheHit);
        assert!(config.cache_root.join("gallery/bar.png_50").is_file());
        assert!(backend
            .get_operations()
            .iter()
            .any(|op| matches!(op, RecordedOp::Encode { .. })));
        assert_eq!(miss.join().unwrap().unwrap(), Origin::Generated);
    }

    #[test]
    fn generated_mtime_is_recent() {
        let tmp = setup_gallery();
        let (gateway, _handle) = spawn(&test_config(tmp.path())).unwrap();
        let before = SystemTime::now();

        let resolved = gateway.resolve("gallery/foo.jpg", 32).unwrap();

        assert!(resolved.modified >= before);
    }
}
