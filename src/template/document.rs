//! Page documents.
//!
//! Each page module under the template home renders to one document:
//! `src/home/about` → `<build>/<output_dir>/about/index.html`.

use serde_json::{Map, Value};
use std::path::PathBuf;

use super::TemplateEngine;
use crate::collation::{document_path, find_page_modules};
use crate::error::{Error, Result};
use crate::output::BuildArtifact;
use crate::{debug, log};

/// Render one page module. Returns the written path, or `None` when the
/// template produced no output.
///
/// `document` overrides the document path derived from the module.
pub async fn build_document(
    engine: &TemplateEngine<'_>,
    module: &str,
    document: Option<&str>,
) -> Result<Option<PathBuf>> {
    let mut artifact = BuildArtifact::new();
    let written = render_document(engine, module, document, &mut artifact).await?;
    artifact.write().await?;
    if let Some(path) = &written {
        log!("documents"; "{}", engine.context().display_path(path));
    }
    Ok(written)
}

/// Render every page module under the template home, in sorted order.
pub async fn build_documents(engine: &TemplateEngine<'_>) -> Result<Vec<PathBuf>> {
    let ctx = engine.context();
    let mut artifact = BuildArtifact::new();
    let mut written = Vec::new();

    for module in find_page_modules(&ctx.settings) {
        if document_path(&ctx.settings, &module).is_none() {
            debug!("documents"; "skipping {}: no document path", module);
            continue;
        }
        if let Some(path) = render_document(engine, &module, None, &mut artifact).await? {
            written.push(path);
        }
    }

    artifact.write().await?;
    for path in &written {
        log!("documents"; "{}", ctx.display_path(path));
    }
    Ok(written)
}

async fn render_document(
    engine: &TemplateEngine<'_>,
    module: &str,
    document: Option<&str>,
    artifact: &mut BuildArtifact,
) -> Result<Option<PathBuf>> {
    let settings = &engine.context().settings;
    let document = match document {
        Some(doc) => format!("/{}", doc.trim_start_matches('/')),
        None => document_path(settings, module).ok_or_else(|| {
            Error::Config(format!(
                "module `{module}` is not a page under `{}`",
                settings.template_home
            ))
        })?,
    };

    let mut render = engine.render(document.clone());
    let Some(content) = render.include(module, Value::Object(Map::new())).await? else {
        debug!("documents"; "{} produced no output", module);
        return Ok(None);
    };

    let path = settings
        .documents_dir()
        .join(document.trim_start_matches('/'));
    artifact.text(&path, content);
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::{context, fixture};
    use std::fs;

    fn site(root: &std::path::Path) {
        fixture(
            root,
            &[
                ("src/home/home.tpl", "{{ include \"src/shell\" title=\"Home\" }}"),
                ("src/home/about/about.tpl", "{{ include \"src/shell\" title=\"About\" }}"),
                ("src/home/draft/draft.tpl", "{{ skip }}"),
                (
                    "src/shell/shell.tpl",
                    "<title>{{ props.title }}</title>{{ styles }}",
                ),
                ("src/shell/shell.css", "a{}"),
                ("dist/site.css", "a{}"),
            ],
        );
    }

    #[tokio::test]
    async fn test_build_documents() {
        let dir = tempfile::tempdir().unwrap();
        site(dir.path());
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);

        let written = build_documents(&engine).await.unwrap();
        let dist = ctx.settings.build_dir();
        assert_eq!(
            written,
            [dist.join("index.html"), dist.join("about/index.html")]
        );

        let stamp = ctx.cache.stamp("dist/site.css");
        assert_eq!(
            fs::read_to_string(dist.join("about/index.html")).unwrap(),
            format!("<title>About</title><link rel=\"stylesheet\" href=\"/site.css{stamp}\" />")
        );
        assert!(!dist.join("draft/index.html").exists());
    }

    #[tokio::test]
    async fn test_build_document_with_override_and_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        site(dir.path());
        let ctx = context(dir.path(), "[templates]\noutput_dir = \"pages\"");
        let engine = TemplateEngine::new(&ctx);

        let path = build_document(&engine, "src/home/about", Some("team.html"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path, ctx.settings.build_dir().join("pages/team.html"));
        assert!(fs::read_to_string(path).unwrap().starts_with("<title>About</title>"));
    }

    #[tokio::test]
    async fn test_build_document_outside_home() {
        let dir = tempfile::tempdir().unwrap();
        site(dir.path());
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);
        let err = build_document(&engine, "src/shell", None).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_file_suffix_skips_home_template() {
        let dir = tempfile::tempdir().unwrap();
        site(dir.path());
        let ctx = context(dir.path(), "[templates]\nsuffix = \".html\"");
        let engine = TemplateEngine::new(&ctx);
        let written = build_documents(&engine).await.unwrap();
        assert_eq!(written, [ctx.settings.build_dir().join("about.html")]);
    }
}
