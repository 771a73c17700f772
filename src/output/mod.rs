//! Output builders.
//!
//! Every builder works on one [`BuildContext`] and produces one artifact per
//! collation and file type, written to `<build>/<collation>.<ext>`:
//!
//! - [`monolith`]: module files concatenated (dist)
//! - [`loader`]: a small file that loads the mirrored module files (dev)
//! - [`transpile`]: stylesheet sources handed to an external compiler
//! - [`mirror`]: module directories exposed under `<build>/<assets>`
//!
//! Builders collect their files into a [`BuildArtifact`] and persist it once
//! all collations of the phase are rendered.

pub mod artifact;
pub mod loader;
pub mod mirror;
pub mod monolith;
pub mod transpile;

pub use artifact::{ArtifactContent, BuildArtifact};
pub use loader::build_dev_loader;
pub use mirror::{MirrorMode, delete_build, mirror_assets};
pub use monolith::build_monolith;
pub use transpile::build_transpiled;

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::collation::{CollationPlan, plan};
use crate::config::Settings;
use crate::error::Result;
use crate::freshness::ContentCache;
use crate::{debug, log};

/// What went into one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Contributing module paths, in collation order.
    pub modules: Vec<String>,
    /// Asset files referenced from stylesheets, relative to base.
    pub assets: Vec<String>,
}

/// One written artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltCollation {
    pub name: String,
    pub ext: String,
    /// Absolute output path.
    pub output: PathBuf,
    pub manifest: Manifest,
}

/// Non-fatal problems collected during a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    warnings: Mutex<Vec<String>>,
}

impl BuildReport {
    pub fn warn(&self, message: impl Into<String>) {
        self.warnings.lock().push(message.into());
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().is_empty()
    }

    /// Log and clear collected warnings.
    pub fn flush(&self) {
        for warning in self.warnings.lock().drain(..) {
            log!("warning"; "{}", warning);
        }
    }
}

/// Everything a build phase needs, shared by all builders of one build.
#[derive(Debug)]
pub struct BuildContext {
    pub settings: Settings,
    pub cache: Arc<ContentCache>,
    pub plans: Vec<CollationPlan>,
    pub report: BuildReport,
}

impl BuildContext {
    /// Plan collations and open the content cache.
    pub fn new(settings: Settings) -> Result<Self> {
        let cache = Arc::new(ContentCache::new(
            settings.base.clone(),
            settings.cache.clone(),
        ));
        Self::with_cache(settings, cache)
    }

    /// Like [`new`](Self::new) with an existing cache.
    pub fn with_cache(settings: Settings, cache: Arc<ContentCache>) -> Result<Self> {
        let plans = plan(&settings)?;
        Ok(Self {
            settings,
            cache,
            plans,
            report: BuildReport::default(),
        })
    }

    /// `<build>/<name>.<ext>`
    pub fn output_path(&self, name: &str, ext: &str) -> PathBuf {
        self.settings.build_dir().join(format!("{name}.{ext}"))
    }

    /// Path relative to base for log lines.
    pub fn display_path(&self, path: &std::path::Path) -> String {
        crate::utils::path::fs::rel_posix(&self.settings.base, path)
            .unwrap_or_else(|| path.display().to_string())
    }

    /// Persist an artifact and log one line per built collation.
    ///
    /// Manifests are informational: templates link the collation file
    /// itself, so they only show up in verbose output.
    pub(crate) async fn finish(
        &self,
        phase: &str,
        artifact: BuildArtifact,
        built: Vec<BuiltCollation>,
    ) -> Result<Vec<BuiltCollation>> {
        artifact.write().await?;
        for collation in &built {
            log!(phase; "{}", self.display_path(&collation.output));
            debug!(
                phase;
                "{}: modules [{}], assets [{}]",
                collation.name,
                collation.manifest.modules.join(", "),
                collation.manifest.assets.join(", ")
            );
        }
        Ok(built)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::test_settings;
    use std::fs;
    use std::path::Path;

    /// Write `(path, content)` fixtures under `root`.
    pub fn fixture(root: &Path, files: &[(&str, &str)]) {
        for (rel, content) in files {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    pub fn context(root: &Path, config: &str) -> BuildContext {
        BuildContext::new(test_settings(root, config)).unwrap()
    }

    #[test]
    fn test_report_collects_warnings() {
        let report = BuildReport::default();
        assert!(report.is_empty());
        report.warn("first");
        report.warn(String::from("second"));
        assert_eq!(report.warnings(), ["first", "second"]);
        report.flush();
        assert!(report.is_empty());
    }

    #[test]
    fn test_output_path_nests_page_collations() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "");
        assert_eq!(
            ctx.output_path("about/index", "css"),
            ctx.settings.base.join("dist/about/index.css")
        );
        assert_eq!(ctx.display_path(&ctx.output_path("site", "js")), "dist/site.js");
    }
}
