//! `[adapters]` section configuration.
//!
//! ```toml
//! [adapters]
//! css_minifier = "builtin:css"
//! js_minifier = "builtin:js"
//! css_rewriter = "builtin:urls"
//! css_transpiler = "command:sass --no-source-map {entry} {output}"
//! css_transpiler_types = ["scss", "css"]
//! css_transpiler_entry = "@import \"{path}\";"
//! ```
//!
//! Descriptors are resolved here, once; see [`crate::adapter`].

use serde::{Deserialize, Serialize};

use crate::adapter::{self, Adapters};
use crate::config::{ConfigDiagnostics, FieldPath};

/// Package runners fetch tools on demand, so a missing binary is only a hint.
const PACKAGE_RUNNERS: &[&str] = &["npx", "bunx", "pnpx", "yarn", "dlx"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptersConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_minifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js_minifier: Option<String>,
    pub css_rewriter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_transpiler: Option<String>,
    pub css_transpiler_types: Vec<String>,
    pub css_transpiler_entry: String,
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            css_minifier: None,
            js_minifier: None,
            css_rewriter: "builtin:urls".into(),
            css_transpiler: None,
            css_transpiler_types: vec!["scss".into(), "css".into()],
            css_transpiler_entry: "@import \"{path}\";".into(),
        }
    }
}

pub struct AdaptersFields {
    pub css_minifier: FieldPath,
    pub js_minifier: FieldPath,
    pub css_rewriter: FieldPath,
    pub css_transpiler: FieldPath,
}

impl AdaptersConfig {
    pub const FIELDS: AdaptersFields = AdaptersFields {
        css_minifier: FieldPath::new("adapters.css_minifier"),
        js_minifier: FieldPath::new("adapters.js_minifier"),
        css_rewriter: FieldPath::new("adapters.css_rewriter"),
        css_transpiler: FieldPath::new("adapters.css_transpiler"),
    };

    /// Resolve every descriptor, collecting failures into `diag`.
    pub fn resolve(&self, diag: &mut ConfigDiagnostics) -> Adapters {
        let mut adapters = Adapters::default();

        let minifiers = [
            ("css", Self::FIELDS.css_minifier, &self.css_minifier),
            ("js", Self::FIELDS.js_minifier, &self.js_minifier),
        ];
        for (ext, field, descriptor) in minifiers {
            let Some(descriptor) = descriptor else {
                continue;
            };
            match adapter::resolve_minifier(descriptor) {
                Ok(minifier) => {
                    check_command(descriptor, field, diag);
                    adapters.minifiers.insert(ext.to_owned(), minifier);
                }
                Err(e) => diag.error(field, e.to_string()),
            }
        }

        match adapter::resolve_css_rewriter(&self.css_rewriter) {
            Ok(rewriter) => adapters.css_rewriter = rewriter,
            Err(e) => diag.error(Self::FIELDS.css_rewriter, e.to_string()),
        }

        if let Some(descriptor) = &self.css_transpiler {
            match adapter::resolve_transpiler(
                descriptor,
                self.css_transpiler_types.clone(),
                self.css_transpiler_entry.clone(),
            ) {
                Ok(transpiler) => {
                    check_command(descriptor, Self::FIELDS.css_transpiler, diag);
                    adapters.css_transpiler = Some(transpiler);
                }
                Err(e) => diag.error(Self::FIELDS.css_transpiler, e.to_string()),
            }
        }

        adapters
    }
}

/// Check that a `command:` adapter's program is installed.
fn check_command(descriptor: &str, field: FieldPath, diag: &mut ConfigDiagnostics) {
    let Some(cmd) = descriptor.strip_prefix("command:") else {
        return;
    };
    let Some(program) = cmd.split_whitespace().next() else {
        return;
    };
    if which::which(program).is_ok() {
        return;
    }
    if PACKAGE_RUNNERS.contains(&program) {
        diag.warn(field, format!("`{program}` not found; the adapter will fail when run"));
    } else {
        diag.error_with_hint(
            field,
            format!("`{program}` not found"),
            format!("install the command or update {field}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_resolve_builtin() {
        let config = test_parse_config(
            "[adapters]\ncss_minifier = \"builtin:css\"\njs_minifier = \"builtin:js\"",
        );
        let mut diag = ConfigDiagnostics::new();
        let adapters = config.adapters.resolve(&mut diag);
        assert!(!diag.has_errors());
        assert_eq!(adapters.minifier_for("css").unwrap().name(), "builtin:css");
        assert_eq!(adapters.minifier_for("js").unwrap().name(), "builtin:js");
        assert!(adapters.css_transpiler.is_none());
    }

    #[test]
    fn test_unknown_descriptor_is_error() {
        let config = AdaptersConfig {
            css_minifier: Some("require:./minify.js".into()),
            css_rewriter: "builtin:nope".into(),
            ..AdaptersConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.resolve(&mut diag);
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["adapters.css_minifier", "adapters.css_rewriter"]);
    }

    #[test]
    fn test_missing_program_is_error() {
        let config = AdaptersConfig {
            css_transpiler: Some("command:definitely-not-a-real-sass-binary {entry} {output}".into()),
            ..AdaptersConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.resolve(&mut diag);
        assert!(diag.errors()[0].message.contains("not found"));
    }
}
