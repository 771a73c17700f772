//! Resolved build settings.
//!
//! [`Settings`] is what every builder and template render reads. It is
//! produced once from `collate.toml` (see [`super::CollateConfig::settings`])
//! with all paths made absolute and adapters resolved, and never mutated
//! during a build. Variants (dev vs dist) are made with [`Settings::with_dev`].

use rustc_hash::FxHashMap;
use std::path::PathBuf;

use super::section::{CollationConfig, FileTypeRule};
use crate::adapter::Adapters;
use crate::freshness::CacheOptions;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute project root.
    pub base: PathBuf,
    /// Collations as configured; unnamed ones are named by the planner.
    pub collations: Vec<CollationConfig>,
    pub collation_prefix: String,
    pub collate_pages: bool,

    pub dev_dir: String,
    pub dist_dir: String,
    pub assets_dir: String,
    pub temp_dir: String,
    pub is_dev: bool,
    pub symlink_dev_assets: bool,
    pub symlink_dist_assets: bool,
    pub exclude_from_mirror: Vec<String>,
    pub file_types: FxHashMap<String, FileTypeRule>,

    /// Page root module, relative to base. Empty disables documents.
    pub template_home: String,
    pub template_output_dir: String,
    pub output_suffix: String,
    pub max_include_depth: usize,
    pub trim_includes: bool,
    pub page_relative_urls: bool,

    pub cache: CacheOptions,
    pub adapters: Adapters,
}

impl Settings {
    /// Active build directory, relative to base.
    pub fn build_dir_name(&self) -> &str {
        if self.is_dev {
            &self.dev_dir
        } else {
            &self.dist_dir
        }
    }

    /// Absolute active build directory.
    pub fn build_dir(&self) -> PathBuf {
        self.base.join(self.build_dir_name())
    }

    /// Absolute asset mirror directory of the active build.
    pub fn mirror_dir(&self) -> PathBuf {
        self.build_dir().join(&self.assets_dir)
    }

    /// Absolute transpiler scratch directory of the active build.
    pub fn temp_root(&self) -> PathBuf {
        self.build_dir().join(&self.temp_dir)
    }

    /// Absolute directory documents are written to.
    pub fn documents_dir(&self) -> PathBuf {
        let dir = self.build_dir();
        if self.template_output_dir.is_empty() {
            dir
        } else {
            dir.join(&self.template_output_dir)
        }
    }

    /// Whether the asset mirror is symlinked rather than copied.
    pub fn symlink_assets(&self) -> bool {
        if self.is_dev {
            self.symlink_dev_assets
        } else {
            self.symlink_dist_assets
        }
    }

    /// Rule for a file type, falling back to the built-in one.
    pub fn rule(&self, ext: &str) -> FileTypeRule {
        self.file_types
            .get(ext)
            .copied()
            .unwrap_or_else(|| FileTypeRule::builtin(ext))
    }

    /// Copy with a different build flavor.
    pub fn with_dev(&self, is_dev: bool) -> Self {
        Self {
            is_dev,
            ..self.clone()
        }
    }
}
