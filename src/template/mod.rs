//! Template rendering.
//!
//! Documents are rendered from page modules by including their template
//! (`src/home/about/about.tpl`). Templates include other modules, reference
//! files and emit tags for the built collations.
//!
//! # Module Structure
//!
//! - `parse` - `.tpl` source → node list
//! - `stack` - bounded inclusion stack of a render
//! - `url` - `file` / `link` URL rules
//! - `tags` - `<script>` / `<link>` tags for collations
//! - `document` - page module → output document
//!
//! # Output contract
//!
//! A template produces a [`Value`]: a string is output text, `null` or
//! `false` means "no output". Native templates registered with
//! [`TemplateEngine::register`] follow the same contract.

mod document;
mod parse;
mod stack;
mod tags;
mod url;

pub use document::{build_document, build_documents};
pub use parse::{Expr, Node, ParsedTemplate, parse};
pub use stack::{Frame, IncludeStack};

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

use crate::collation::TEMPLATE_EXT;
use crate::debug;
use crate::error::{Error, IoContext, Result};
use crate::freshness::mtime::fingerprint;
use crate::output::BuildContext;
use crate::utils::html::{escape, escape_attr};
use crate::utils::path::posix;
use crate::utils::path::route::is_dot_relative;

/// A template implemented in Rust.
pub trait Template: Send + Sync {
    fn render<'a>(&'a self, render: &'a mut Render<'_>, props: Value)
    -> BoxFuture<'a, Result<Value>>;
}

/// Parsed `.tpl` file and the fingerprint it was parsed at.
struct CachedTemplate {
    fingerprint: Option<u128>,
    parsed: Arc<ParsedTemplate>,
}

/// Template lookup, parsing and caching for one build.
pub struct TemplateEngine<'c> {
    ctx: &'c BuildContext,
    /// Native templates by base-relative template path.
    native: FxHashMap<String, Arc<dyn Template>>,
    parsed: DashMap<PathBuf, CachedTemplate>,
}

impl<'c> TemplateEngine<'c> {
    pub fn new(ctx: &'c BuildContext) -> Self {
        Self {
            ctx,
            native: FxHashMap::default(),
            parsed: DashMap::new(),
        }
    }

    /// Serve `template_path` (relative to base, e.g. `src/nav/nav.tpl`)
    /// from `template` instead of a file.
    pub fn register(&mut self, template_path: &str, template: Arc<dyn Template>) {
        self.native
            .insert(posix::normalize(template_path), template);
    }

    pub fn context(&self) -> &BuildContext {
        self.ctx
    }

    /// Start a render of `document` (`/about/index.html`).
    pub fn render(&self, document: impl Into<String>) -> Render<'_> {
        Render {
            engine: self,
            document: document.into(),
            stack: IncludeStack::new(self.ctx.settings.max_include_depth),
        }
    }

    /// Template path of a module: `<module>/<name>.tpl`, else `<module>.tpl`.
    fn find_template(&self, module: &str) -> Option<String> {
        let own = posix::join(&[module, &format!("{}.{TEMPLATE_EXT}", posix::basename(module))]);
        let sibling = format!("{module}.{TEMPLATE_EXT}");
        [own, sibling]
            .into_iter()
            .find(|path| self.native.contains_key(path) || self.ctx.settings.base.join(path).is_file())
    }

    /// Parsed template, reparsed when the file changed.
    async fn load(&self, template: &str) -> Result<Arc<ParsedTemplate>> {
        let path = self.ctx.settings.base.join(template);
        let current = fingerprint(&path);

        if let Some(cached) = self.parsed.get(&path)
            && cached.fingerprint == current
        {
            return Ok(cached.parsed.clone());
        }

        let source = tokio::fs::read_to_string(&path).await.at(&path)?;
        let parsed = Arc::new(parse(&source, template)?);
        debug!("template"; "parsed {}", template);
        self.parsed.insert(
            path,
            CachedTemplate {
                fingerprint: current,
                parsed: parsed.clone(),
            },
        );
        Ok(parsed)
    }
}

/// One document render: the include stack and the document path.
pub struct Render<'e> {
    engine: &'e TemplateEngine<'e>,
    document: String,
    stack: IncludeStack,
}

impl<'e> Render<'e> {
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Normalize a module reference; `./` and `../` resolve against the
    /// parent of the page module (the first frame).
    fn expand_module(&self, module: &str) -> Result<String> {
        let module = module.trim_matches('/');
        if !is_dot_relative(module) {
            return Ok(posix::normalize(module));
        }
        let first = self.stack.first().ok_or_else(|| {
            Error::Resolution(format!(
                "relative module `{module}` can only be included from inside a template"
            ))
        })?;
        let expanded = posix::join(&[&posix::dirname(&first.module), module]);
        if expanded.starts_with("..") {
            return Err(Error::Resolution(format!(
                "module `{module}` resolves outside the project"
            )));
        }
        Ok(expanded)
    }

    /// Whether a module has a template.
    pub fn exists(&self, module: &str) -> Result<bool> {
        let module = self.expand_module(module)?;
        Ok(self.engine.find_template(&module).is_some())
    }

    /// Render a module's template. `None` means the template chose to
    /// produce no output.
    pub fn include<'s>(
        &'s mut self,
        module: &'s str,
        props: Value,
    ) -> BoxFuture<'s, Result<Option<String>>> {
        async move {
            self.stack.check_depth()?;
            let module = self.expand_module(module)?;
            let template = self.engine.find_template(&module).ok_or_else(|| {
                Error::Resolution(format!("no template found for module `{module}`"))
            })?;

            self.stack.push(Frame {
                module,
                template: template.clone(),
            })?;
            let result = self.run(&template, props).await;
            self.stack.pop();

            match result? {
                Value::String(text) if self.engine.ctx.settings.trim_includes => {
                    Ok(Some(text.trim().to_string()))
                }
                Value::String(text) => Ok(Some(text)),
                Value::Null | Value::Bool(false) => Ok(None),
                other => Err(Error::template(
                    template,
                    format!(
                        "must produce a string or no output, got {}",
                        value_kind(&other)
                    ),
                )),
            }
        }
        .boxed()
    }

    /// URL of a file next to the current template.
    pub fn file(&self, path: &str, hash: bool) -> Result<String> {
        let frame = self.stack.current().ok_or_else(|| {
            Error::Resolution(format!("file `{path}` can only be referenced from inside a template"))
        })?;
        let ctx = self.engine.ctx;
        Ok(url::file_url(
            &ctx.settings,
            &ctx.cache,
            &self.document,
            &frame.template,
            path,
            hash,
        ))
    }

    pub fn link(&self, path: &str) -> String {
        url::link_url(&self.engine.ctx.settings, &self.document, path)
    }

    /// `<script>` tags for collations (all when `names` is `None`).
    pub fn scripts(&self, names: Option<Vec<String>>, hash: bool) -> String {
        tags::script_tags(&self.asset_urls("js", names, hash))
    }

    /// `<link rel="stylesheet">` tags for collations.
    pub fn styles(&self, names: Option<Vec<String>>, hash: bool) -> String {
        tags::style_tags(&self.asset_urls("css", names, hash))
    }

    fn asset_urls(&self, ext: &str, names: Option<Vec<String>>, hash: bool) -> Vec<String> {
        let ctx = self.engine.ctx;
        tags::asset_urls(
            &ctx.settings,
            &ctx.plans,
            &ctx.cache,
            &self.document,
            ext,
            names,
            hash,
        )
    }

    async fn run(&mut self, template: &str, props: Value) -> Result<Value> {
        if let Some(native) = self.engine.native.get(template).cloned() {
            return native.render(self, props).await;
        }
        let parsed = self.engine.load(template).await?;
        self.evaluate(&parsed, template, &props).await
    }

    async fn evaluate(
        &mut self,
        parsed: &ParsedTemplate,
        template: &str,
        props: &Value,
    ) -> Result<Value> {
        if parsed.skips() {
            return Ok(Value::Null);
        }

        let mut out = String::new();
        for node in &parsed.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Skip => return Ok(Value::Null),
                Node::Prop { path, raw } => {
                    let text = value_text(lookup(props, path));
                    if *raw {
                        out.push_str(&text);
                    } else {
                        out.push_str(&escape(&text));
                    }
                }
                Node::Include {
                    module,
                    props: args,
                    optional,
                } => {
                    let module = string_arg(module, props, template)?;
                    if *optional && !self.exists(&module)? {
                        continue;
                    }
                    let child: Map<String, Value> = args
                        .iter()
                        .map(|(key, expr)| (key.clone(), eval(expr, props)))
                        .collect();
                    if let Some(text) = self.include(&module, Value::Object(child)).await? {
                        out.push_str(&text);
                    }
                }
                Node::File { path, hash } => {
                    let path = string_arg(path, props, template)?;
                    out.push_str(&escape_attr(&self.file(&path, *hash)?));
                }
                Node::Link { path } => {
                    let path = string_arg(path, props, template)?;
                    out.push_str(&escape_attr(&self.link(&path)));
                }
                Node::Assets { ext, names, hash } => {
                    let names = names
                        .as_ref()
                        .map(|names| {
                            names
                                .iter()
                                .map(|n| string_arg(n, props, template))
                                .collect::<Result<Vec<_>>>()
                        })
                        .transpose()?;
                    let tags = match *ext {
                        "js" => self.scripts(names, *hash),
                        _ => self.styles(names, *hash),
                    };
                    out.push_str(&tags);
                }
            }
        }
        Ok(Value::String(out))
    }
}

fn eval(expr: &Expr, props: &Value) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Prop(path) => lookup(props, path).clone(),
    }
}

fn string_arg(expr: &Expr, props: &Value, template: &str) -> Result<String> {
    match eval(expr, props) {
        Value::String(s) => Ok(s),
        other => Err(Error::template(
            template,
            format!("expected a string argument, got {}", value_kind(&other)),
        )),
    }
}

fn lookup<'v>(props: &'v Value, path: &[String]) -> &'v Value {
    path.iter()
        .try_fold(props, |value, key| value.get(key))
        .unwrap_or(&Value::Null)
}

/// Text form of a prop: strings as-is, `null` empty, the rest as JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::{context, fixture};
    use serde_json::json;

    /// `src/l0` includes `src/l1`, ... up to `src/l{n-1}`.
    fn chain(root: &std::path::Path, n: usize) {
        for i in 0..n {
            let body = if i + 1 < n {
                format!("<{i}>{{{{ include \"src/l{}\" }}}}", i + 1)
            } else {
                format!("<{i}>")
            };
            let path = format!("src/l{i}/l{i}.tpl");
            fixture(root, &[(path.as_str(), body.as_str())]);
        }
    }

    #[tokio::test]
    async fn test_include_with_props() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            &[
                (
                    "src/page/page.tpl",
                    "<h1>{{ props.title }}</h1>\n{{ include \"src/nav\" current=\"home\" }}\n",
                ),
                ("src/nav/nav.tpl", "  <nav>{{ props.current }}</nav>  "),
            ],
        );
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);
        let mut render = engine.render("/index.html");
        let out = render
            .include("src/page", json!({"title": "<Pie>"}))
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("<h1>&lt;Pie&gt;</h1>\n<nav>home</nav>"));
        assert_eq!(render.depth(), 0);
    }

    #[tokio::test]
    async fn test_sibling_template_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[("src/parts/footer.tpl", "<footer>")]);
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);
        let mut render = engine.render("/index.html");
        assert!(render.exists("/src/parts/footer/").unwrap());
        assert!(!render.exists("src/parts/header").unwrap());
        assert_eq!(
            render.include("src/parts/footer", json!({})).await.unwrap().as_deref(),
            Some("<footer>")
        );
    }

    #[tokio::test]
    async fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);
        let err = engine.render("/index.html").include("src/x", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Resolution(ref m) if m.contains("src/x")));
    }

    #[tokio::test]
    async fn test_relative_include_resolves_from_page_module() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            &[
                ("src/home/about/about.tpl", "{{ include \"./about/body\" }}"),
                ("src/home/about/body/body.tpl", "{{ include \"../shared\" }}"),
                ("src/shared/shared.tpl", "shared"),
            ],
        );
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);
        let out = engine
            .render("/about/index.html")
            .include("src/home/about", json!({}))
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("shared"));
    }

    #[tokio::test]
    async fn test_relative_include_outside_template() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);
        let err = engine.render("/index.html").include("./x", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        chain(dir.path(), 3);
        let ctx = context(dir.path(), "[templates]\nmax_include_depth = 3");
        let engine = TemplateEngine::new(&ctx);
        let out = engine.render("/index.html").include("src/l0", json!({})).await.unwrap();
        assert_eq!(out.as_deref(), Some("<0><1><2>"));

        let dir = tempfile::tempdir().unwrap();
        chain(dir.path(), 4);
        let ctx = context(dir.path(), "[templates]\nmax_include_depth = 3");
        let engine = TemplateEngine::new(&ctx);
        let mut render = engine.render("/index.html");
        let err = render.include("src/l0", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "max include depth exceeded (3)");
        assert_eq!(render.depth(), 0);
    }

    #[tokio::test]
    async fn test_skip_and_include_if() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            &[
                ("src/a/a.tpl", "[{{ include \"src/b\" }}{{ include_if \"src/none\" }}]"),
                ("src/b/b.tpl", "hidden {{ skip }}"),
            ],
        );
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);
        let mut render = engine.render("/index.html");
        assert_eq!(
            render.include("src/a", json!({})).await.unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(render.include("src/b", json!({})).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_link_and_raw() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            &[
                (
                    "src/home/about/about.tpl",
                    "{{ file \"pie.jpg\" hash=false }}|{{ link \"team/\" }}|{{ raw props.html }}",
                ),
                ("src/home/about/pie.jpg", "jpg"),
            ],
        );
        let ctx = context(dir.path(), "[templates]\ntrim_includes = false");
        let engine = TemplateEngine::new(&ctx);
        let out = engine
            .render("/about/index.html")
            .include("src/home/about", json!({"html": "<b>"}))
            .await
            .unwrap();
        assert_eq!(
            out.as_deref(),
            Some("/assets/src/home/about/pie.jpg|/about/team/|<b>")
        );
    }

    struct Greeting;

    impl Template for Greeting {
        fn render<'a>(
            &'a self,
            render: &'a mut Render<'_>,
            props: Value,
        ) -> BoxFuture<'a, Result<Value>> {
            async move {
                let name = props["name"].as_str().unwrap_or("nobody").to_string();
                let footer = render.include("src/footer", json!({})).await?;
                Ok(Value::String(format!(
                    "hello {name} {}",
                    footer.unwrap_or_default()
                )))
            }
            .boxed()
        }
    }

    struct Answer;

    impl Template for Answer {
        fn render<'a>(&'a self, _: &'a mut Render<'_>, _: Value) -> BoxFuture<'a, Result<Value>> {
            async { Ok(json!(42)) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_native_templates() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[("src/footer/footer.tpl", "bye")]);
        let ctx = context(dir.path(), "");
        let mut engine = TemplateEngine::new(&ctx);
        engine.register("src/greet/greet.tpl", Arc::new(Greeting));
        engine.register("src/num.tpl", Arc::new(Answer));

        let mut render = engine.render("/index.html");
        assert_eq!(
            render.include("src/greet", json!({"name": "ada"})).await.unwrap().as_deref(),
            Some("hello ada bye")
        );
        let err = render.include("src/num", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Template { ref message, .. } if message.contains("a number")));
    }

    #[tokio::test]
    async fn test_reparse_on_change() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[("src/a/a.tpl", "one")]);
        let ctx = context(dir.path(), "");
        let engine = TemplateEngine::new(&ctx);
        assert_eq!(
            engine.render("/").include("src/a", json!({})).await.unwrap().as_deref(),
            Some("one")
        );

        let path = dir.path().join("src/a/a.tpl");
        std::fs::write(&path, "two").unwrap();
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();
        assert_eq!(
            engine.render("/").include("src/a", json!({})).await.unwrap().as_deref(),
            Some("two")
        );
    }
}
