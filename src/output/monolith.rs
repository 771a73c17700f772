//! Monolithic artifacts: every module file of a collation, concatenated.
//!
//! ```text
//! /* AUTO-GENERATED FILE. EDIT SOURCE FILES INSTEAD. */
//!
//! /* src/a */
//! a { color: red; }
//!
//! /* src/b */
//! b { background: url(assets/src/b/bg.png?h=...); }
//! ```

use futures::future::try_join_all;
use std::sync::Arc;

use super::{BuildArtifact, BuildContext, BuiltCollation, Manifest};
use crate::asset::css::{Relocation, relocate_css_urls};
use crate::collation::CollationPlan;
use crate::error::{Error, IoContext, Result};

/// Leading comment of every generated file.
pub const GENERATED_HEADER: &str = "AUTO-GENERATED FILE. EDIT SOURCE FILES INSTEAD.";

/// Concatenate `ext` module files of every collation.
///
/// Collations without a single `ext` file produce nothing.
pub async fn build_monolith(ctx: &BuildContext, ext: &str) -> Result<Vec<BuiltCollation>> {
    let rendered = try_join_all(ctx.plans.iter().map(|plan| render_monolith(ctx, plan, ext))).await?;

    let mut artifact = BuildArtifact::new();
    let mut built = Vec::new();
    for (collation, code) in rendered.into_iter().flatten() {
        artifact.text(&collation.output, code);
        built.push(collation);
    }
    ctx.finish(&phase_name(ext), artifact, built).await
}

/// Log prefix for a file type.
pub(crate) fn phase_name(ext: &str) -> String {
    match ext {
        "css" => "styles".to_string(),
        "js" => "scripts".to_string(),
        other => other.to_string(),
    }
}

/// Render one collation's monolith without writing it.
pub async fn render_monolith(
    ctx: &BuildContext,
    plan: &CollationPlan,
    ext: &str,
) -> Result<Option<(BuiltCollation, String)>> {
    let settings = &ctx.settings;
    let rule = settings.rule(ext);
    let output = ctx.output_path(&plan.name, ext);
    let mirror = settings.mirror_dir();

    let mut manifest = Manifest::default();
    let mut pieces = Vec::new();

    for module in &plan.modules {
        let Some(file) = module.file(ext) else {
            continue;
        };
        let path = settings.base.join(file);
        let mut code = tokio::fs::read_to_string(&path).await.at(&path)?;

        if rule.rewrite {
            let reloc = Relocation {
                source_file: file,
                dest_file: &output,
                mirror_dir: &mirror,
                cache: &ctx.cache,
                rewriter: settings.adapters.css_rewriter.as_ref(),
                report: Some(&ctx.report),
            };
            code = relocate_css_urls(&code, &reloc, &mut manifest.assets).await?;
        }

        let mut piece = rule
            .comment
            .wrap(&module.rel_path)
            .map(|banner| banner + "\n")
            .unwrap_or_default();
        piece.push_str(code.trim_end());
        pieces.push(piece);
        manifest.modules.push(module.rel_path.clone());
    }

    if pieces.is_empty() {
        return Ok(None);
    }
    if let Some(header) = rule.comment.wrap(GENERATED_HEADER) {
        pieces.insert(0, header);
    }

    let mut code = pieces.join("\n\n");
    code.push('\n');
    if rule.minify
        && let Some(minifier) = settings.adapters.minifier_for(ext)
    {
        let minifier = Arc::clone(minifier);
        let name = minifier.name().to_string();
        code = tokio::task::spawn_blocking(move || minifier.minify(code))
            .await
            .map_err(|e| Error::adapter(&name, e))??;
    }

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
