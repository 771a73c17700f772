//! Development loaders.
//!
//! In dev builds a collation artifact does not contain module code. It loads
//! the mirrored module files instead, so edits show up without a rebuild:
//!
//! ```text
//! dev/site.css:  @import "assets/src/a/a.css";
//! dev/site.js:   ["assets/src/a/a.js", ...] + script-injecting loader
//! ```

use futures::future::try_join_all;

use super::monolith::phase_name;
use super::{BuildArtifact, BuildContext, BuiltCollation, Manifest};
use crate::asset::css::{Relocation, relocate_css_urls};
use crate::collation::CollationPlan;
use crate::embed::dev::render_loader;
use crate::error::{IoContext, Result};
use crate::utils::path::fs::to_posix;
use crate::utils::path::posix;

/// Write a loader per collation for `ext`.
///
/// Types without a loader template are skipped.
pub async fn build_dev_loader(ctx: &BuildContext, ext: &str) -> Result<Vec<BuiltCollation>> {
    if render_loader(ext, &[]).is_none() {
        return Ok(Vec::new());
    }

    let rendered = try_join_all(ctx.plans.iter().map(|plan| render_dev_loader(ctx, plan, ext))).await?;

    let mut artifact = BuildArtifact::new();
    let mut built = Vec::new();
    for (collation, code) in rendered.into_iter().flatten() {
        artifact.text(&collation.output, code);
        built.push(collation);
    }
    ctx.finish(&phase_name(ext), artifact, built).await
}

/// Render one collation's loader without writing it.
pub async fn render_dev_loader(
    ctx: &BuildContext,
    plan: &CollationPlan,
    ext: &str,
) -> Result<Option<(BuiltCollation, String)>> {
    let settings = &ctx.settings;
    let rule = settings.rule(ext);
    let output = ctx.output_path(&plan.name, ext);
    let output_dir = output.parent().map(to_posix).unwrap_or_default();
    let mirror = settings.mirror_dir();
    let mirror_posix = to_posix(&mirror);

    let mut manifest = Manifest::default();
    let mut urls = Vec::new();

    for module in &plan.modules {
        let Some(file) = module.file(ext) else {
            continue;
        };

        // The mirrored stylesheet keeps its own URLs; scan them for the
        // manifest only.
        if rule.rewrite {
            let path = settings.base.join(file);
            let code = tokio::fs::read_to_string(&path).await.at(&path)?;
            let reloc = Relocation {
                source_file: file,
                dest_file: &output,
                mirror_dir: &mirror,
                cache: &ctx.cache,
                rewriter: settings.adapters.css_rewriter.as_ref(),
                report: Some(&ctx.report),
            };
            relocate_css_urls(&code, &reloc, &mut manifest.assets).await?;
        }

        let target = posix::join(&[&mirror_posix, file]);
        urls.push(posix::relative(&output_dir, &target));
        manifest.modules.push(module.rel_path.clone());
    }

    if urls.is_empty() {
        return Ok(None);
    }
    let Some(code) = render_loader(ext, &urls) else {
        return Ok(None);
    };

    Ok(Some((
        BuiltCollation {
            name: plan.name.clone(),
            ext: ext.to_string(),
            output,
            manifest,
        },
        code,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::{context, fixture};
    use std::fs;

    #[tokio::test]
    async fn test_style_loader_points_into_mirror() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            &[
                ("src/a/a.css", "a{b:url(bg.png)}"),
                ("src/a/bg.png", "png"),
                ("src/b/b.css", "b{}"),
            ],
        );
        let ctx = context(dir.path(), "[build]\ndev = true");
        let built = build_dev_loader(&ctx, "css").await.unwrap();

        let code = fs::read_to_string(dir.path().join("dev/site.css")).unwrap();
        assert!(code.contains("@import \"assets/src/a/a.css\";\n@import \"assets/src/b/b.css\";"));
        assert_eq!(built[0].manifest.modules, ["src/a", "src/b"]);
        assert_eq!(built[0].manifest.assets, ["src/a/bg.png"]);
    }

    #[tokio::test]
    async fn test_nested_collation_urls_are_relative() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            &[
                ("src/home/home.tpl", ""),
                ("src/home/about/about.tpl", ""),
                ("src/home/about/about.js", "x;"),
            ],
        );
        let ctx = context(dir.path(), "collate_pages = true\n[build]\ndev = true");
        build_dev_loader(&ctx, "js").await.unwrap();

        let code = fs::read_to_string(dir.path().join("dev/about/index.js")).unwrap();
        assert!(code.contains("\"../assets/src/home/about/about.js\""));
        assert!(!dir.path().join("dev/index.js").exists());
    }

    #[tokio::test]
    async fn test_type_without_loader_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[("src/a/a.txt", "x")]);
        let ctx = context(dir.path(), "[build]\ndev = true");
        assert!(build_dev_loader(&ctx, "txt").await.unwrap().is_empty());
        assert!(!dir.path().join("dev/site.txt").exists());
    }
}
