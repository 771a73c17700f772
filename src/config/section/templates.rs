//! `[templates]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [templates]
//! home = "src/home"           # Page root module (empty disables documents)
//! output_dir = ""             # Documents directory (relative to build dir)
//! suffix = "/index.html"      # Appended to each page path
//! max_include_depth = 100
//! trim_includes = true
//! page_relative_urls = false  # Emit `../x.css` instead of `/x.css`
//! ```
//!
//! With `suffix = ".html"` the module `src/home/about` renders to
//! `about.html` and the home module's own template is skipped.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub home: String,
    pub output_dir: String,
    pub suffix: String,
    pub max_include_depth: usize,
    pub trim_includes: bool,
    pub page_relative_urls: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            home: "src/home".into(),
            output_dir: String::new(),
            suffix: "/index.html".into(),
            max_include_depth: 100,
            trim_includes: true,
            page_relative_urls: false,
        }
    }
}

pub struct TemplatesFields {
    pub home: FieldPath,
    pub output_dir: FieldPath,
    pub suffix: FieldPath,
    pub max_include_depth: FieldPath,
}

impl TemplatesConfig {
    pub const FIELDS: TemplatesFields = TemplatesFields {
        home: FieldPath::new("templates.home"),
        output_dir: FieldPath::new("templates.output_dir"),
        suffix: FieldPath::new("templates.suffix"),
        max_include_depth: FieldPath::new("templates.max_include_depth"),
    };

    /// Validate `[templates]`.
    ///
    /// # Checks
    /// - `max_include_depth` is at least 1
    /// - `suffix` is non-empty
    /// - `home` and `output_dir` are relative and free of wildcards
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_include_depth == 0 {
            diag.error(Self::FIELDS.max_include_depth, "must be at least 1");
        }
        if self.suffix.is_empty() {
            diag.error_with_hint(
                Self::FIELDS.suffix,
                "is empty",
                "use \"/index.html\" or \".html\"",
            );
        }
        if self.home.contains('*') || self.home.starts_with('!') {
            diag.error(Self::FIELDS.home, "must be a module path, not a pattern");
        }
        if self.output_dir.starts_with('/') || self.output_dir.split('/').any(|s| s == "..") {
            diag.error(Self::FIELDS.output_dir, "must stay inside the build directory");
        }
    }
}
