//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! dev_dir = "dev"                 # Dev build directory (relative to base)
//! dist_dir = "dist"               # Production build directory (relative to base)
//! assets_dir = "assets"           # Mirrored module assets (relative to build dir)
//! temp_dir = "temp"               # Transpiler scratch space (relative to build dir)
//! dev = false                     # Build dev instead of dist
//! symlink_dev_assets = true       # Symlink the asset mirror in dev builds
//! symlink_dist_assets = false     # Symlink the asset mirror in dist builds
//! exclude_from_mirror = ["md"]    # Module file types never copied to the mirror
//!
//! [build.types.css]
//! comment = "block"               # block | line | none
//! rewrite = true                  # relocate url(...) references
//! minify = true                   # run the css minifier in dist builds
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Comment syntax of a collated file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStyle {
    Block,
    Line,
    None,
}

impl CommentStyle {
    /// Wrap `text` in a comment, if this style has one.
    pub fn wrap(self, text: &str) -> Option<String> {
        match self {
            Self::Block => Some(format!("/* {text} */")),
            Self::Line => Some(format!("// {text}")),
            Self::None => None,
        }
    }
}

/// Effective rule for one file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileTypeRule {
    pub comment: CommentStyle,
    /// Stylesheet code: relocate `url(...)` references.
    pub rewrite: bool,
    pub minify: bool,
}

impl FileTypeRule {
    /// Built-in rule for an extension.
    pub fn builtin(ext: &str) -> Self {
        match ext {
            "css" => Self {
                comment: CommentStyle::Block,
                rewrite: true,
                minify: true,
            },
            "js" => Self {
                comment: CommentStyle::Block,
                rewrite: false,
                minify: true,
            },
            "scss" | "less" | "sass" => Self {
                comment: CommentStyle::Line,
                rewrite: true,
                minify: false,
            },
            _ => Self {
                comment: CommentStyle::None,
                rewrite: false,
                minify: false,
            },
        }
    }
}

/// `[build.types.<ext>]`: partial override of [`FileTypeRule::builtin`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTypeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
}

impl FileTypeConfig {
    fn apply(&self, mut rule: FileTypeRule) -> FileTypeRule {
        if let Some(comment) = self.comment {
            rule.comment = comment;
        }
        if let Some(rewrite) = self.rewrite {
            rule.rewrite = rewrite;
        }
        if let Some(minify) = self.minify {
            rule.minify = minify;
        }
        rule
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub dev_dir: String,
    pub dist_dir: String,
    pub assets_dir: String,
    pub temp_dir: String,
    pub dev: bool,
    pub symlink_dev_assets: bool,
    pub symlink_dist_assets: bool,
    pub exclude_from_mirror: Vec<String>,
    pub types: BTreeMap<String, FileTypeConfig>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dev_dir: "dev".into(),
            dist_dir: "dist".into(),
            assets_dir: "assets".into(),
            temp_dir: "temp".into(),
            dev: false,
            symlink_dev_assets: true,
            symlink_dist_assets: false,
            exclude_from_mirror: Vec::new(),
            types: BTreeMap::new(),
        }
    }
}

pub struct BuildFields {
    pub dev_dir: FieldPath,
    pub dist_dir: FieldPath,
    pub assets_dir: FieldPath,
    pub temp_dir: FieldPath,
    pub exclude_from_mirror: FieldPath,
    pub types: FieldPath,
}

impl BuildConfig {
    pub const FIELDS: BuildFields = BuildFields {
        dev_dir: FieldPath::new("build.dev_dir"),
        dist_dir: FieldPath::new("build.dist_dir"),
        assets_dir: FieldPath::new("build.assets_dir"),
        temp_dir: FieldPath::new("build.temp_dir"),
        exclude_from_mirror: FieldPath::new("build.exclude_from_mirror"),
        types: FieldPath::new("build.types"),
    };

    /// Effective rules for every configured or built-in type.
    pub fn file_type_rules(&self) -> FxHashMap<String, FileTypeRule> {
        let mut rules: FxHashMap<String, FileTypeRule> = ["css", "js", "scss", "less", "sass"]
            .into_iter()
            .map(|ext| (ext.to_owned(), FileTypeRule::builtin(ext)))
            .collect();
        for (ext, config) in &self.types {
            rules.insert(ext.clone(), config.apply(FileTypeRule::builtin(ext)));
        }
        rules
    }

    /// Validate `[build]`.
    ///
    /// # Checks
    /// - build directories are non-empty relative paths without `..`
    /// - `dev_dir` and `dist_dir` differ
    /// - assets and temp directories differ
    /// - type names carry no leading dot
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let dirs = [
            (Self::FIELDS.dev_dir, &self.dev_dir),
            (Self::FIELDS.dist_dir, &self.dist_dir),
            (Self::FIELDS.assets_dir, &self.assets_dir),
            (Self::FIELDS.temp_dir, &self.temp_dir),
        ];
        for (field, dir) in dirs {
            if let Some(problem) = relative_dir_problem(dir) {
                diag.error(field, format!("`{dir}` {problem}"));
            }
        }

        if self.dev_dir == self.dist_dir {
            diag.error_with_hint(
                Self::FIELDS.dist_dir,
                format!("same directory as {}", Self::FIELDS.dev_dir),
                "dev and dist builds delete each other otherwise",
            );
        }
        if self.assets_dir == self.temp_dir {
            diag.error(
                Self::FIELDS.temp_dir,
                format!("same directory as {}", Self::FIELDS.assets_dir),
            );
        }

        for ext in &self.exclude_from_mirror {
            if ext.is_empty() || ext.starts_with('.') {
                diag.error_with_hint(
                    Self::FIELDS.exclude_from_mirror,
                    format!("invalid file type `{ext}`"),
                    "write types without the dot, e.g. \"md\"",
                );
            }
        }
        for ext in self.types.keys() {
            if ext.is_empty() || ext.starts_with('.') {
                diag.error(Self::FIELDS.types, format!("invalid file type `{ext}`"));
            }
        }
    }
}

fn relative_dir_problem(dir: &str) -> Option<&'static str> {
    let path = Path::new(dir);
    if dir.trim().is_empty() {
        Some("is empty")
    } else if path.is_absolute() {
        Some("must be relative")
    } else if path.components().any(|c| matches!(c, Component::ParentDir)) {
        Some("must not contain `..`")
    } else {
        None
    }
}
