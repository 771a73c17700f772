//! Content hash cache keyed by project-relative path.
//!
//! Two layers:
//!
//! - memory: `DashMap<String, CacheEntry>`, lives for one process
//! - disk (optional): one small text file per source file,
//!   `<cache_dir>/hashes/<rel>.collatecache` holding `hash fingerprint expires`
//!
//! An entry is stale when it is missing, its fingerprint no longer matches
//! the file's mtime, or its expiry has passed. Stale entries are recomputed
//! from content.
//!
//! Entries of deleted files are pruned at most once per TTL window. With the
//! disk layer the time of the last prune is kept in `<cache_dir>/last-pruned`,
//! so the window spans processes.

use dashmap::DashMap;
use jwalk::WalkDir;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::hash::{ContentHash, stamp_for};
use super::mtime::{fingerprint, now_millis};
use crate::debug;
use crate::utils::path::fs::{rel_posix, to_posix};
use crate::utils::path::posix;

/// Directory under the cache root that holds hash entries.
const HASHES_DIR: &str = "hashes";
/// Suffix of on-disk entry files.
const ENTRY_SUFFIX: &str = ".collatecache";
/// File under the cache root holding the epoch millis of the last prune.
const PRUNE_MARKER: &str = "last-pruned";
/// Pruning interval when no TTL is configured.
const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// URL-safe token of the content hash.
    pub hash: String,
    /// Mtime fingerprint the hash was computed for.
    pub fingerprint: u128,
    /// Epoch milliseconds after which the entry is stale.
    pub expires: u128,
}

impl CacheEntry {
    fn is_fresh(&self, fingerprint: u128, now: u128) -> bool {
        self.fingerprint == fingerprint && now <= self.expires
    }

    fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let hash = parts.next()?.to_string();
        let fingerprint = parts.next()?.parse().ok()?;
        let expires = parts.next()?.parse().ok()?;
        Some(Self {
            hash,
            fingerprint,
            expires,
        })
    }

    fn serialize(&self) -> String {
        format!("{} {} {}", self.hash, self.fingerprint, self.expires)
    }
}

/// Cache settings.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Absolute cache root; `None` keeps entries in memory only.
    pub dir: Option<PathBuf>,
    /// Entry lifetime; `None` means entries only go stale on change.
    pub ttl: Option<Duration>,
}

/// Content hash cache shared by every builder and template render.
#[derive(Debug)]
pub struct ContentCache {
    base: PathBuf,
    disk: Option<PathBuf>,
    prune_marker: Option<PathBuf>,
    ttl: Option<Duration>,
    memory: DashMap<String, CacheEntry>,
    last_pruned: Mutex<u128>,
}

impl ContentCache {
    pub fn new(base: impl Into<PathBuf>, options: CacheOptions) -> Self {
        let prune_marker = options.dir.as_ref().map(|dir| dir.join(PRUNE_MARKER));
        // Without a marker on disk the next recomputation prunes.
        let last_pruned = match &prune_marker {
            Some(marker) => fs::read_to_string(marker)
                .ok()
                .and_then(|text| text.trim().parse().ok())
                .unwrap_or(0),
            None => now_millis(),
        };
        Self {
            base: base.into(),
            disk: options.dir.map(|dir| dir.join(HASHES_DIR)),
            prune_marker,
            ttl: options.ttl,
            memory: DashMap::new(),
            last_pruned: Mutex::new(last_pruned),
        }
    }

    /// Memory-only cache with no TTL.
    pub fn in_memory(base: impl Into<PathBuf>) -> Self {
        Self::new(base, CacheOptions::default())
    }

    /// Cache-busting stamp for a base-relative file: `?h=<token>`.
    ///
    /// Missing files stamp as `?h=not-found`.
    pub fn stamp(&self, rel_file: &str) -> String {
        stamp_for(self.token(rel_file).as_deref())
    }

    /// Like [`stamp`](Self::stamp) for an absolute path.
    pub fn stamp_abs(&self, abs_file: &Path) -> String {
        let rel = rel_posix(&self.base, abs_file)
            .unwrap_or_else(|| posix::relative(&to_posix(&self.base), &to_posix(abs_file)));
        self.stamp(&rel)
    }

    /// Current token for a base-relative file, `None` if it is not a file.
    pub fn token(&self, rel_file: &str) -> Option<String> {
        let rel_file = posix::normalize(rel_file);
        let abs = self.base.join(&rel_file);

        let fingerprint = match fs::metadata(&abs) {
            Ok(meta) if meta.is_file() => fingerprint(&abs)?,
            _ => {
                self.forget(&rel_file);
                return None;
            }
        };
        let now = now_millis();

        if let Some(entry) = self.memory.get(&rel_file)
            && entry.is_fresh(fingerprint, now)
        {
            return Some(entry.hash.clone());
        }

        if let Some(entry) = self.read_disk(&rel_file)
            && entry.is_fresh(fingerprint, now)
        {
            let hash = entry.hash.clone();
            self.memory.insert(rel_file, entry);
            return Some(hash);
        }

        self.maybe_prune(now);

        let hash = ContentHash::of_file(&abs).ok()?.token();
        let entry = CacheEntry {
            hash: hash.clone(),
            fingerprint,
            expires: self.ttl.map_or(u128::MAX, |ttl| now + ttl.as_millis()),
        };
        self.write_disk(&rel_file, &entry);
        self.memory.insert(rel_file, entry);
        Some(hash)
    }

    /// Drop entries whose source file no longer exists, in memory and on disk.
    pub fn prune(&self) {
        let missing: Vec<String> = self
            .memory
            .iter()
            .filter(|e| !self.base.join(e.key()).is_file())
            .map(|e| e.key().clone())
            .collect();
        for rel in &missing {
            self.memory.remove(rel);
        }

        let Some(disk) = &self.disk else {
            return;
        };
        if !disk.is_dir() {
            return;
        }
        for entry in WalkDir::new(disk).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(rel) = rel_posix(disk, &path) else {
                continue;
            };
            let Some(rel) = rel.strip_suffix(ENTRY_SUFFIX) else {
                continue;
            };
            if !self.base.join(rel).is_file() {
                let _ = fs::remove_file(&path);
            }
        }
    }

    /// Number of entries held in memory.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Run [`prune`](Self::prune) at most once per TTL window.
    fn maybe_prune(&self, now: u128) {
        let interval = self.ttl.unwrap_or(DEFAULT_PRUNE_INTERVAL).as_millis();
        {
            let mut last = self.last_pruned.lock();
            if now.saturating_sub(*last) < interval {
                return;
            }
            *last = now;
        }
        debug!("cache"; "pruning entries of deleted files");
        self.prune();
        self.write_prune_marker(now);
    }

    fn write_prune_marker(&self, now: u128) {
        let Some(marker) = &self.prune_marker else {
            return;
        };
        let result = marker
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(marker, now.to_string()));
        if let Err(e) = result {
            debug!("cache"; "failed to write {}: {}", marker.display(), e);
        }
    }

    fn forget(&self, rel_file: &str) {
        self.memory.remove(rel_file);
        if let Some(path) = self.disk_path(rel_file) {
            let _ = fs::remove_file(path);
        }
    }

    /// Entry file for `rel_file`, if the disk layer is enabled and the
    /// file lies inside the base.
    fn disk_path(&self, rel_file: &str) -> Option<PathBuf> {
        let disk = self.disk.as_ref()?;
        if rel_file.starts_with("..") || rel_file.starts_with('/') {
            return None;
        }
        Some(disk.join(format!("{rel_file}{ENTRY_SUFFIX}")))
    }

    fn read_disk(&self, rel_file: &str) -> Option<CacheEntry> {
        let path = self.disk_path(rel_file)?;
        let text = fs::read_to_string(path).ok()?;
        CacheEntry::parse(&text)
    }

    fn write_disk(&self, rel_file: &str, entry: &CacheEntry) {
        let Some(path) = self.disk_path(rel_file) else {
            return;
        };
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&path, entry.serialize()));
        if let Err(e) = result {
            debug!("cache"; "failed to write {}: {}", path.display(), e);
        }
    }
}
