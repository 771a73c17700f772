//! Pluggable build adapters.
//!
//! Adapters are resolved from string descriptors once, while settings are
//! loaded, and handed to builders as trait objects:
//!
//! | Descriptor                        | Resolves to                          |
//! |-----------------------------------|--------------------------------------|
//! | `builtin:css`                     | lightningcss minifier                |
//! | `builtin:js`                      | oxc minifier                         |
//! | `builtin:urls`                    | built-in stylesheet URL rewriter     |
//! | `command:<program> <args...>`     | external process (minifier/transpiler)|
//!
//! Anything else is a configuration error.

mod builtin;
mod command;

use futures::future::BoxFuture;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};

pub use builtin::{BuiltinCssMinifier, BuiltinCssRewriter, BuiltinJsMinifier};
pub use command::{CommandMinifier, CommandTranspiler};

/// Replacement callback handed to a [`CssRewriter`].
pub type UrlReplacer<'a> =
    Box<dyn FnMut(String) -> BoxFuture<'static, Result<String>> + Send + 'a>;

/// Whole-file minifier: `code -> code'`.
pub trait Minifier: Send + Sync {
    fn name(&self) -> &str;
    fn minify(&self, code: String) -> Result<String>;
}

/// Finds URL references in stylesheet code and substitutes them.
pub trait CssRewriter: Send + Sync {
    fn rewrite<'a>(&'a self, code: &'a str, replacer: UrlReplacer<'a>)
    -> BoxFuture<'a, Result<String>>;
}

/// One transpiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileJob {
    /// Module sources, relative to the entry file's directory, in order.
    pub source_paths: Vec<String>,
    pub entry_path: PathBuf,
    pub output_path: PathBuf,
    pub is_dev: bool,
}

/// External stylesheet compiler (sass, less, ...).
pub trait Transpiler: Send + Sync {
    fn name(&self) -> &str;
    /// Source extensions this transpiler reads, in preference order.
    fn input_types(&self) -> &[String];
    /// Entry file line that pulls in one source.
    fn entry_line(&self, source_path: &str) -> String;
    fn run(&self, job: TranspileJob) -> BoxFuture<'_, Result<()>>;
}

/// Resolved adapter set carried by `Settings`.
#[derive(Clone)]
pub struct Adapters {
    /// Minifier per output extension.
    pub minifiers: FxHashMap<String, Arc<dyn Minifier>>,
    pub css_rewriter: Arc<dyn CssRewriter>,
    pub css_transpiler: Option<Arc<dyn Transpiler>>,
}

impl Default for Adapters {
    fn default() -> Self {
        Self {
            minifiers: FxHashMap::default(),
            css_rewriter: Arc::new(BuiltinCssRewriter),
            css_transpiler: None,
        }
    }
}

impl std::fmt::Debug for Adapters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut minifiers: Vec<_> = self
            .minifiers
            .iter()
            .map(|(ext, m)| format!("{ext}={}", m.name()))
            .collect();
        minifiers.sort();
        f.debug_struct("Adapters")
            .field("minifiers", &minifiers)
            .field("css_transpiler", &self.css_transpiler.as_ref().map(|t| t.name()))
            .finish_non_exhaustive()
    }
}

impl Adapters {
    pub fn minifier_for(&self, ext: &str) -> Option<&Arc<dyn Minifier>> {
        self.minifiers.get(ext)
    }
}

/// Split `kind:rest` descriptors.
fn split_descriptor(descriptor: &str) -> Result<(&str, &str)> {
    descriptor
        .split_once(':')
        .map(|(kind, rest)| (kind.trim(), rest.trim()))
        .filter(|(_, rest)| !rest.is_empty())
        .ok_or_else(|| Error::Config(format!("malformed adapter `{descriptor}`")))
}

/// Resolve a minifier descriptor.
pub fn resolve_minifier(descriptor: &str) -> Result<Arc<dyn Minifier>> {
    match split_descriptor(descriptor)? {
        ("builtin", "css") => Ok(Arc::new(BuiltinCssMinifier)),
        ("builtin", "js") => Ok(Arc::new(BuiltinJsMinifier)),
        ("command", cmd) => Ok(Arc::new(CommandMinifier::parse(cmd)?)),
        _ => Err(Error::Config(format!("unknown minifier `{descriptor}`"))),
    }
}

/// Resolve a stylesheet URL rewriter descriptor.
pub fn resolve_css_rewriter(descriptor: &str) -> Result<Arc<dyn CssRewriter>> {
    match split_descriptor(descriptor)? {
        ("builtin", "urls") => Ok(Arc::new(BuiltinCssRewriter)),
        _ => Err(Error::Config(format!("unknown css rewriter `{descriptor}`"))),
    }
}

/// Resolve a transpiler descriptor.
///
/// `input_types` lists the source extensions it consumes; `entry_format`
/// is the entry-file line with `{path}` standing for each source.
pub fn resolve_transpiler(
    descriptor: &str,
    input_types: Vec<String>,
    entry_format: String,
) -> Result<Arc<dyn Transpiler>> {
    if input_types.is_empty() {
        return Err(Error::Config(format!(
            "transpiler `{descriptor}` declares no input types"
        )));
    }
    match split_descriptor(descriptor)? {
        ("command", cmd) => Ok(Arc::new(CommandTranspiler::parse(
            cmd,
            input_types,
            entry_format,
        )?)),
        _ => Err(Error::Config(format!("unknown transpiler `{descriptor}`"))),
    }
}
