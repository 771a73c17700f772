//! `[cache]` section configuration.
//!
//! ```toml
//! [cache]
//! enable = true               # Persist content hashes between runs
//! dir = ".collate/cache"      # Relative to base; `~` expanded
//! ttl = 86400                 # Seconds an entry stays valid (0 = forever)
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::freshness::CacheOptions;
use crate::utils::path::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enable: bool,
    pub dir: PathBuf,
    pub ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable: true,
            dir: PathBuf::from(".collate/cache"),
            ttl: 86_400,
        }
    }
}

impl CacheConfig {
    /// Resolve into runtime options, relative to `root`.
    pub fn options(&self, root: &Path) -> CacheOptions {
        let dir = self.enable.then(|| {
            let expanded = shellexpand::tilde(&self.dir.to_string_lossy()).into_owned();
            let path = PathBuf::from(expanded);
            if path.is_relative() {
                normalize_path(&root.join(path))
            } else {
                normalize_path(&path)
            }
        });
        let ttl = (self.ttl > 0).then(|| Duration::from_secs(self.ttl));
        CacheOptions { dir, ttl }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_options() {
        let options = CacheConfig::default().options(Path::new("/proj"));
        assert_eq!(options.dir.as_deref(), Some(Path::new("/proj/.collate/cache")));
        assert_eq!(options.ttl, Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_disabled_and_no_ttl() {
        let config = CacheConfig {
            enable: false,
            ttl: 0,
            ..CacheConfig::default()
        };
        let options = config.options(Path::new("/proj"));
        assert!(options.dir.is_none());
        assert!(options.ttl.is_none());
    }
}
