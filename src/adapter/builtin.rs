//! In-process adapters.

use futures::future::BoxFuture;

use super::{CssRewriter, Minifier, UrlReplacer};
use crate::asset::minify::{minify_css, minify_js};
use crate::asset::rewrite_css_urls;
use crate::error::{Error, Result};

pub struct BuiltinCssMinifier;

impl Minifier for BuiltinCssMinifier {
    fn name(&self) -> &str {
        "builtin:css"
    }

    fn minify(&self, code: String) -> Result<String> {
        minify_css(&code).map_err(|e| Error::adapter(self.name(), e))
    }
}

pub struct BuiltinJsMinifier;

impl Minifier for BuiltinJsMinifier {
    fn name(&self) -> &str {
        "builtin:js"
    }

    fn minify(&self, code: String) -> Result<String> {
        minify_js(&code).map_err(|e| Error::adapter(self.name(), e))
    }
}

/// The tokenizer in [`crate::asset::css`].
pub struct BuiltinCssRewriter;

impl CssRewriter for BuiltinCssRewriter {
    fn rewrite<'a>(
        &'a self,
        code: &'a str,
        replacer: UrlReplacer<'a>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(rewrite_css_urls(code, replacer))
    }
}
