//! Freshness detection: blake3 content hashes validated by mtime fingerprints.
//!
//! [`ContentCache`] is the single source of cache-busting stamps. It is
//! shared (`Arc`) by builders and template renders within one build.

mod cache;
mod hash;
pub mod mtime;

pub use cache::{CacheEntry, CacheOptions, ContentCache};
pub use hash::{ContentHash, NOT_FOUND_TOKEN, stamp_for};
