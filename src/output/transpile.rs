//! Stylesheet transpiler hand-off.
//!
//! For each collation the module sources are mirrored into a scratch
//! directory with their URLs already relocated, an entry file pulling them
//! in is written next to them, and the configured [`Transpiler`] compiles
//! the entry into `<build>/<collation>.css`:
//!
//! ```text
//! dist/temp/site.Xa3f/
//! ├── site.css.scss             @import "assets/src/a/a.scss"; ...
//! └── assets/src/a/a.scss
//! ```
//!
//! The scratch directory is removed afterwards unless building for dev.

use futures::future::try_join_all;
use std::sync::Arc;

use super::{BuildArtifact, BuildContext, BuiltCollation, Manifest};
use crate::adapter::{TranspileJob, Transpiler};
use crate::asset::css::{Relocation, relocate_css_urls};
use crate::collation::CollationPlan;
use crate::debug;
use crate::error::{Error, IoContext, Result};
use crate::utils::path::fs::to_posix;
use crate::utils::path::posix;

/// Transpile every collation's stylesheet sources.
pub async fn build_transpiled(ctx: &BuildContext) -> Result<Vec<BuiltCollation>> {
    let transpiler = ctx
        .settings
        .adapters
        .css_transpiler
        .clone()
        .ok_or_else(|| Error::Config("no css transpiler configured".into()))?;

    let temp_root = ctx.settings.temp_root();
    tokio::fs::create_dir_all(&temp_root).await.at(&temp_root)?;

    let built = try_join_all(
        ctx.plans
            .iter()
            .map(|plan| transpile_collation(ctx, plan, &transpiler)),
    )
    .await?;

    let built: Vec<_> = built.into_iter().flatten().collect();
    ctx.finish("styles", BuildArtifact::new(), built).await
}

async fn transpile_collation(
    ctx: &BuildContext,
    plan: &CollationPlan,
    transpiler: &Arc<dyn Transpiler>,
) -> Result<Option<BuiltCollation>> {
    let settings = &ctx.settings;
    let input_types = transpiler.input_types();
    let sources: Vec<(&str, &str)> = plan
        .modules
        .iter()
        .filter_map(|m| m.first_file_of(input_types).map(|f| (m.rel_path.as_str(), f)))
        .collect();
    if sources.is_empty() {
        return Ok(None);
    }

    let output = ctx.output_path(&plan.name, "css");
    let mirror = settings.mirror_dir();
    let temp_root = settings.temp_root();
    let scratch = tempfile::Builder::new()
        .prefix(&format!("{}.", posix::basename(&plan.name)))
        .tempdir_in(&temp_root)
        .at(&temp_root)?;

    let entry_name = format!("{}.css.{}", posix::basename(&plan.name), input_types[0]);
    let entry_path = scratch.path().join(&entry_name);
    let scratch_posix = to_posix(scratch.path());

    let mut manifest = Manifest::default();
    let mut artifact = BuildArtifact::new();
    let mut source_paths = Vec::with_capacity(sources.len());

    for (module, file) in sources {
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
        let code = relocate_css_urls(&code, &reloc, &mut manifest.assets).await?;

        let copy = posix::join(&[&scratch_posix, &settings.assets_dir, file]);
        source_paths.push(posix::relative(&scratch_posix, &copy));
        artifact.text(&copy, code);
        manifest.modules.push(module.to_string());
    }

    let entry: Vec<String> = source_paths
        .iter()
        .map(|p| transpiler.entry_line(p))
        .collect();
    artifact.text(&entry_path, entry.join("\n") + "\n");
    artifact.write().await?;

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await.at(parent)?;
    }
    let job = TranspileJob {
        source_paths,
        entry_path,
        output_path: output.clone(),
        is_dev: settings.is_dev,
    };
    let result = transpiler.run(job).await;

    if settings.is_dev {
        let kept = scratch.keep();
        debug!("transpile"; "kept {}", kept.display());
    } else {
        let path = scratch.path().to_path_buf();
        scratch.close().at(path)?;
    }
    result?;

    Ok(Some(BuiltCollation {
        name: plan.name.clone(),
        ext: "css".to_string(),
        output,
        manifest,
    }))
}
