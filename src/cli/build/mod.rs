//! Build orchestration.
//!
//! Build phases:
//! - **Delete** - Remove the active build directory
//! - **Assets** - Styles, scripts and the asset mirror, concurrently
//! - **Documents** - Page documents, once the collations they link exist
//! - **Finalize** - Warnings, logging
//!
//! Each phase may also run on its own. A phase refuses to start while the
//! same phase, or a delete, is still running.

mod guard;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Settings;
use crate::log;
use crate::output::{
    BuildContext, BuiltCollation, build_dev_loader, build_monolith, build_transpiled,
    delete_build, mirror_assets,
};
use crate::template::{TemplateEngine, build_document, build_documents};

use guard::BusyFlags;

/// Runs build phases over one planned [`BuildContext`].
pub struct Collate {
    ctx: BuildContext,
    busy: BusyFlags,
}

impl Collate {
    pub fn new(settings: Settings) -> Result<Self> {
        let ctx = BuildContext::new(settings).context("failed to plan collations")?;
        Ok(Self {
            ctx,
            busy: BusyFlags::default(),
        })
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Full build: delete, assets, documents.
    pub async fn build(&self) -> Result<()> {
        self.busy.no_other("build")?;
        let _build = self.busy.build.claim("build")?;

        {
            let _delete = self.busy.delete.claim("delete")?;
            delete_build(&self.ctx.settings).await?;
        }

        let (styles, scripts, mirrored) =
            tokio::try_join!(self.styles(), self.scripts(), self.mirror())?;
        let documents = self.documents().await?;

        self.ctx.report.flush();
        log!(
            "build";
            "{} in {}: {} styles, {} scripts, {} mirrored modules, {} documents",
            if self.ctx.settings.is_dev { "dev" } else { "dist" },
            self.ctx.display_path(&self.ctx.settings.build_dir()),
            styles.len(),
            scripts.len(),
            mirrored.len(),
            documents.len()
        );
        Ok(())
    }

    /// Stylesheet collations: transpiled when a transpiler is configured,
    /// otherwise loaders (dev) or monoliths (dist).
    pub async fn styles(&self) -> Result<Vec<BuiltCollation>> {
        let _busy = self.busy.claim_phase(&self.busy.styles, "styles")?;
        let built = if self.ctx.settings.adapters.css_transpiler.is_some() {
            build_transpiled(&self.ctx).await
        } else if self.ctx.settings.is_dev {
            build_dev_loader(&self.ctx, "css").await
        } else {
            build_monolith(&self.ctx, "css").await
        };
        built.context("failed to build styles")
    }

    /// Script collations: loaders (dev) or monoliths (dist).
    pub async fn scripts(&self) -> Result<Vec<BuiltCollation>> {
        let _busy = self.busy.claim_phase(&self.busy.scripts, "scripts")?;
        let built = if self.ctx.settings.is_dev {
            build_dev_loader(&self.ctx, "js").await
        } else {
            build_monolith(&self.ctx, "js").await
        };
        built.context("failed to build scripts")
    }

    pub async fn mirror(&self) -> Result<Vec<String>> {
        let _busy = self.busy.claim_phase(&self.busy.mirror, "mirror")?;
        mirror_assets(&self.ctx)
            .await
            .context("failed to mirror assets")
    }

    /// Every page document; nothing without a template home.
    pub async fn documents(&self) -> Result<Vec<PathBuf>> {
        let _busy = self.busy.claim_phase(&self.busy.documents, "documents")?;
        if self.ctx.settings.template_home.is_empty() {
            return Ok(Vec::new());
        }
        let engine = TemplateEngine::new(&self.ctx);
        build_documents(&engine)
            .await
            .context("failed to build documents")
    }

    /// One module rendered as a document.
    pub async fn document(&self, module: &str, document: Option<&str>) -> Result<Option<PathBuf>> {
        self.busy.no_delete("document")?;
        let engine = TemplateEngine::new(&self.ctx);
        build_document(&engine, module, document)
            .await
            .with_context(|| format!("failed to build document for `{module}`"))
    }

    pub async fn delete(&self) -> Result<()> {
        self.busy.no_other("delete")?;
        let _busy = self.busy.delete.claim("delete")?;
        delete_build(&self.ctx.settings).await?;
        log!("clean"; "removed {}", self.ctx.display_path(&self.ctx.settings.build_dir()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;
    use crate::output::tests::fixture;
    use std::fs;

    fn site(root: &std::path::Path) {
        fixture(
            root,
            &[
                ("src/home/home.tpl", "<head>{{ styles }}{{ scripts }}</head>"),
                ("src/nav/nav.css", "nav{background:url(bg.png)}"),
                ("src/nav/bg.png", "png"),
                ("src/nav/nav.js", "var nav;"),
                ("dist/stale.txt", "old"),
            ],
        );
    }

    #[tokio::test]
    async fn test_dist_build() {
        let dir = tempfile::tempdir().unwrap();
        site(dir.path());
        let collate = Collate::new(test_settings(dir.path(), "")).unwrap();
        collate.build().await.unwrap();

        let dist = dir.path().join("dist");
        assert!(!dist.join("stale.txt").exists());
        assert!(dist.join("site.css").is_file());
        assert!(dist.join("site.js").is_file());
        assert!(dist.join("assets/src/nav/bg.png").is_file());
        assert!(!dist.join("assets/src/nav/nav.css").exists());

        let html = fs::read_to_string(dist.join("index.html")).unwrap();
        let cache = &collate.context().cache;
        assert_eq!(
            html,
            format!(
                "<head><link rel=\"stylesheet\" href=\"/site.css{}\" /><script src=\"/site.js{}\"></script></head>",
                cache.stamp("dist/site.css"),
                cache.stamp("dist/site.js")
            )
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dev_build() {
        let dir = tempfile::tempdir().unwrap();
        site(dir.path());
        let settings = test_settings(dir.path(), "").with_dev(true);
        let collate = Collate::new(settings).unwrap();
        collate.build().await.unwrap();

        let dev = dir.path().join("dev");
        let css = fs::read_to_string(dev.join("site.css")).unwrap();
        assert!(css.contains("@import \"assets/src/nav/nav.css\";"));
        assert!(dev.join("assets/src/nav/nav.css").is_file());
        assert!(dev.join("index.html").is_file());
        assert!(dir.path().join("dist/stale.txt").exists());
    }

    #[tokio::test]
    async fn test_same_phase_refused_while_running() {
        let dir = tempfile::tempdir().unwrap();
        site(dir.path());
        let collate = Collate::new(test_settings(dir.path(), "")).unwrap();

        let _running = collate.busy.styles.claim("styles").unwrap();
        let err = collate.styles().await.unwrap_err();
        assert!(err.to_string().contains("already running"));
        assert!(collate.build().await.is_err());
        // other phases are unaffected
        collate.scripts().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        site(dir.path());
        let collate = Collate::new(test_settings(dir.path(), "")).unwrap();
        collate.delete().await.unwrap();
        assert!(!dir.path().join("dist").exists());
    }
}
