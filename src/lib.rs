//! # Thumbwell
//!
//! On-demand thumbnail service for a photo gallery. A web handler asks for
//! `gallery/2016/beach.jpg` at size 300 and gets back an open, readable file:
//! either the original, a cached thumbnail, or one generated just now and
//! written to the cache for next time.
//!
//! # Architecture: One Worker, Many Callers
//!
//! ```text
//! handler ─┐
//! handler ─┼─▶ Gateway ──▶ intake (FIFO) ──▶ worker thread ──▶ cache_root/
//! warmer  ─┘      ▲                               │
//!                 └──────── reply channel ◀───────┘
//! ```
//!
//! Every request, hit or miss, is handled by a single worker thread in
//! arrival order. At most one decode/resize/encode runs at a time, so
//! concurrent requests for the same uncached thumbnail generate it once and
//! the rest see a cache hit.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gateway`] | Request/reply types, the cloneable [`gateway::Gateway`] handle, path validation |
//! | [`worker`] | The single worker thread: cache lookup, generation, reply publishing |
//! | [`cache`] | Path-addressed cache layout, atomic writes, run statistics |
//! | [`imaging`] | Decode, fit-within-box resize, JPEG encode behind the [`imaging::ImageBackend`] trait |
//! | [`config`] | `thumbwell.toml` loading, merging over stock defaults, validation |
//! | [`listing`] | Directory listings and breadcrumbs for gallery pages |
//! | [`warm`] | Pre-generate thumbnails for a directory through the gateway |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Path-Addressed Cache, Never Invalidated
//!
//! The cache key is the request itself: `gallery/a.jpg` at 300 lives at
//! `<cache_root>/gallery/a.jpg_300`. There is no content hash and no mtime
//! comparison, so replacing a source image keeps serving the old thumbnail
//! until its cache file is deleted by hand. Lookups are a single `stat`.
//!
//! ## Message Passing Instead of Locks
//!
//! Mutual exclusion comes from ownership: only the worker thread holds the
//! intake receiver and the image backend. Callers never share mutable state,
//! they only send a request and wait on their own reply channel.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and JPEG encoding use the `image` crate, so the binary carries
//! no system library dependencies.

pub mod cache;
pub mod config;
pub mod gateway;
pub mod imaging;
pub mod listing;
pub mod output;
pub mod warm;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
