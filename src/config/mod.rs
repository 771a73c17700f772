//! Project configuration from `collate.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [[collations]], [build], [templates], [adapters], [cache]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── settings.rs    # Settings: the resolved, immutable view builders read
//! └── mod.rs         # CollateConfig (this file)
//! ```
//!
//! # Example
//!
//! ```toml
//! base = "."
//! modules = ["src/**"]            # used when no [[collations]] are given
//! collation_prefix = "site"
//! collate_pages = false
//!
//! [[collations]]
//! name = "vendor"
//! modules = ["lib/**"]
//! ```
//!
//! Loading never fails on a missing file: without `collate.toml` the
//! defaults apply, rooted at the working directory.

pub mod section;
mod settings;
pub mod types;
mod util;

pub use section::{
    AdaptersConfig, BuildConfig, CacheConfig, CollationConfig, CommentStyle, FileTypeRule,
    TemplatesConfig,
};
pub use settings::Settings;
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};
pub use util::find_config_file;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::module::pattern::is_valid_pattern;
use crate::utils::path::normalize_path;
use crate::{debug, log};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `collate.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollateConfig {
    /// Absolute path to the config file, empty when running on defaults.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory `base` is resolved against.
    #[serde(skip)]
    pub root: PathBuf,

    /// Project base, relative to the config file.
    pub base: PathBuf,

    /// Module patterns of the implicit collation.
    pub modules: Vec<String>,

    /// Name given to unnamed collations (`site`, `site-1`, ...).
    pub collation_prefix: String,

    /// Give every page module its own collation.
    pub collate_pages: bool,

    pub collations: Vec<CollationConfig>,

    pub build: BuildConfig,
    pub templates: TemplatesConfig,
    pub adapters: AdaptersConfig,
    pub cache: CacheConfig,
}

impl Default for CollateConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            base: PathBuf::from("."),
            modules: vec!["src/**".into()],
            collation_prefix: "site".into(),
            collate_pages: false,
            collations: Vec::new(),
            build: BuildConfig::default(),
            templates: TemplatesConfig::default(),
            adapters: AdaptersConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

pub struct RootFields {
    pub base: FieldPath,
    pub modules: FieldPath,
    pub collation_prefix: FieldPath,
    pub collations: FieldPath,
}

impl CollateConfig {
    pub const FIELDS: RootFields = RootFields {
        base: FieldPath::new("base"),
        modules: FieldPath::new("modules"),
        collation_prefix: FieldPath::new("collation_prefix"),
        collations: FieldPath::new("collations"),
    };

    /// Load `config_name`, searching upward from `start`.
    pub fn load(start: &Path, config_name: &Path) -> Result<Self, ConfigError> {
        let Some(path) = find_config_file(start, config_name) else {
            debug!("config"; "no {} found, using defaults", config_name.display());
            return Ok(Self {
                root: normalize_path(start),
                ..Self::default()
            });
        };

        let mut config = Self::from_path(&path)?;
        config.root = path
            .parent()
            .map(normalize_path)
            .unwrap_or_else(|| normalize_path(start));
        config.config_path = normalize_path(&path);
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Collations as built: `[[collations]]`, or one unnamed collation of
    /// `modules` when none are configured.
    pub fn effective_collations(&self) -> Vec<CollationConfig> {
        if self.collations.is_empty() {
            vec![CollationConfig {
                name: None,
                modules: self.modules.clone(),
            }]
        } else {
            self.collations.clone()
        }
    }

    /// Absolute project base.
    pub fn base_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.base.to_string_lossy()).into_owned();
        normalize_path(&self.root.join(expanded))
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the whole file, collecting every problem.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let base = self.base_dir();
        if !base.is_dir() {
            diag.error_with_hint(
                Self::FIELDS.base,
                format!("`{}` is not a directory", base.display()),
                "base is resolved relative to collate.toml",
            );
        }

        if self.collation_prefix.is_empty() || self.collation_prefix.contains('/') {
            diag.error(
                Self::FIELDS.collation_prefix,
                format!("invalid name `{}`", self.collation_prefix),
            );
        }

        let mut names = FxHashSet::default();
        for collation in &self.effective_collations() {
            if let Some(name) = &collation.name {
                if name.is_empty() || name.split('/').any(|s| s.is_empty() || s == "..") {
                    diag.error(Self::FIELDS.collations, format!("invalid name `{name}`"));
                } else if !names.insert(name.as_str()) {
                    diag.error_with_hint(
                        Self::FIELDS.collations,
                        format!("duplicate name `{name}`"),
                        "give each collation a unique name",
                    );
                }
            }
            for pattern in &collation.modules {
                if !is_valid_pattern(pattern) {
                    diag.warn(
                        Self::FIELDS.modules,
                        format!("pattern `{pattern}` is ignored"),
                    );
                }
            }
        }

        self.build.validate(diag);
        self.templates.validate(diag);
    }

    // ========================================================================
    // resolution
    // ========================================================================

    /// Validate and resolve into [`Settings`].
    ///
    /// `dev` overrides `[build].dev` when given.
    pub fn settings(&self, dev: Option<bool>) -> Result<Settings, ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.validate(&mut diag);
        let adapters = self.adapters.resolve(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)?;

        let base = self.base_dir();
        Ok(Settings {
            cache: self.cache.options(&base),
            base,
            collations: self.effective_collations(),
            collation_prefix: self.collation_prefix.clone(),
            collate_pages: self.collate_pages,
            dev_dir: self.build.dev_dir.clone(),
            dist_dir: self.build.dist_dir.clone(),
            assets_dir: self.build.assets_dir.clone(),
            temp_dir: self.build.temp_dir.clone(),
            is_dev: dev.unwrap_or(self.build.dev),
            symlink_dev_assets: self.build.symlink_dev_assets,
            symlink_dist_assets: self.build.symlink_dist_assets,
            exclude_from_mirror: self.build.exclude_from_mirror.clone(),
            file_types: self.build.file_type_rules(),
            template_home: self.templates.home.trim_matches('/').to_owned(),
            template_output_dir: self.templates.output_dir.trim_matches('/').to_owned(),
            output_suffix: self.templates.suffix.clone(),
            max_include_depth: self.templates.max_include_depth,
            trim_includes: self.templates.trim_includes,
            page_relative_urls: self.templates.page_relative_urls,
            adapters,
        })
    }

    /// Effective configuration as JSON, without machine-specific `base`.
    pub fn export(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(map) = value.as_object_mut() {
            map.remove("base");
            map.remove("modules");
            map.insert(
                "collations".into(),
                serde_json::to_value(self.effective_collations())?,
            );
            map.insert("version".into(), env!("CARGO_PKG_VERSION").into());
        }
        Ok(value)
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config text. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> CollateConfig {
    let (parsed, ignored) = CollateConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Settings rooted at `base` from config text.
#[cfg(test)]
pub fn test_settings(base: &Path, content: &str) -> Settings {
    let mut config = test_parse_config(content);
    config.root = base.to_path_buf();
    config.settings(None).unwrap()
}

// ============================================================================
// tests
// ============================================================================
