//! Stylesheet URL rewriting.
//!
//! [`rewrite_css_urls`] walks stylesheet text with a two-state tokenizer:
//!
//! - outside `url(`: `url(`, quoted strings, block comments and line
//!   comments are recognized so that a `url(` inside a string or comment is
//!   never treated as a reference
//! - inside `url(`: only `)` and quoted strings are recognized, so a `)` in a
//!   quoted URL and the `//` of `https://` do not end the reference
//!
//! Each relative URL is handed to an async replacer. Root-relative,
//! scheme-qualified and fragment-only URLs are left untouched.
//!
//! [`relocate_css_urls`] is the replacer used by builders: it maps URLs of a
//! module stylesheet into the mirrored asset tree and stamps them.

use futures::FutureExt;
use regex::Regex;
use std::future::{Future, ready};
use std::path::Path;
use std::sync::LazyLock;

use crate::adapter::{CssRewriter, UrlReplacer};
use crate::error::Result;
use crate::freshness::{ContentCache, stamp_for};
use crate::output::BuildReport;
use crate::utils::path::fs::to_posix;
use crate::utils::path::posix;
use crate::utils::path::route::is_absolute_url;

/// Tokens outside a `url(...)` span.
static OUTSIDE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"[uU][rR][lL]\(|"(?:[^"\\]|\\(?s:.))*"|'(?:[^'\\]|\\(?s:.))*'|(?s:/\*.*?\*/)|//[^\r\n]*"#,
    )
    .unwrap()
});

/// Tokens inside a `url(...)` span.
static INSIDE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\)|"(?:[^"\\]|\\(?s:.))*"|'(?:[^'\\]|\\(?s:.))*'"#).unwrap()
});

/// Rewrite every relative `url(...)` in `code` through `replacer`.
///
/// The replacer receives the URL with surrounding whitespace and one pair
/// of matching quotes removed; its result is re-wrapped in the original
/// quote. Without any `url(` the input is returned unchanged.
pub async fn rewrite_css_urls<F, Fut>(code: &str, mut replacer: F) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut out = String::with_capacity(code.len());
    let mut pos = 0;

    while let Some(token) = OUTSIDE_URL.find_at(code, pos) {
        out.push_str(&code[pos..token.end()]);
        pos = token.end();

        if !token.as_str().ends_with('(') {
            continue;
        }

        let Some(close) = find_url_close(code, pos) else {
            // Unterminated `url(`: emit the rest verbatim.
            break;
        };
        out.push_str(&rewrite_one(&code[pos..close], &mut replacer).await?);
        out.push(')');
        pos = close + 1;
    }

    out.push_str(&code[pos..]);
    Ok(out)
}

/// Byte offset of the `)` that closes a `url(` span starting at `start`.
fn find_url_close(code: &str, start: usize) -> Option<usize> {
    let mut cursor = start;
    loop {
        let token = INSIDE_URL.find_at(code, cursor)?;
        if token.as_str() == ")" {
            return Some(token.start());
        }
        cursor = token.end();
    }
}

async fn rewrite_one<F, Fut>(raw: &str, replacer: &mut F) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let trimmed = raw.trim();
    let (quote, url) = match trimmed.as_bytes() {
        [q @ (b'"' | b'\''), .., last] if trimmed.len() >= 2 && last == q => {
            (&trimmed[..1], &trimmed[1..trimmed.len() - 1])
        }
        _ => ("", trimmed),
    };

    if url.is_empty() || url.starts_with('#') || is_absolute_url(url) {
        return Ok(raw.to_string());
    }

    let replaced = replacer(url.to_string()).await?;
    Ok(format!("{quote}{replaced}{quote}"))
}

/// Where a stylesheet came from and where it is going.
pub struct Relocation<'a> {
    /// Stylesheet path relative to base (`src/c/c.css`).
    pub source_file: &'a str,
    /// Absolute path of the file the rewritten code is written to.
    pub dest_file: &'a Path,
    /// Absolute directory that mirrors module assets (`<build>/assets`).
    pub mirror_dir: &'a Path,
    pub cache: &'a ContentCache,
    pub rewriter: &'a dyn CssRewriter,
    /// Receives a warning for each referenced asset that is not a file.
    pub report: Option<&'a BuildReport>,
}

/// Rewrite a module stylesheet's URLs to point into the mirror directory.
///
/// `url(icon.gif)` in `src/c/c.css` written to `dist/site.css` with mirror
/// `dist/assets` becomes `url(assets/src/c/icon.gif?h=<token>)`. Every
/// referenced asset (relative to base) is appended to `assets` once; a
/// missing one is stamped `?h=not-found` and reported once.
pub async fn relocate_css_urls(
    code: &str,
    reloc: &Relocation<'_>,
    assets: &mut Vec<String>,
) -> Result<String> {
    let source_dir = posix::dirname(reloc.source_file);
    let dest_dir = reloc
        .dest_file
        .parent()
        .map(to_posix)
        .unwrap_or_default();
    let mirror_dir = to_posix(reloc.mirror_dir);

    let replacer: UrlReplacer<'_> = Box::new(|url: String| {
        let (path, query, fragment) = split_url(&url);
        let asset = posix::join(&[&source_dir, path]);
        let dest = posix::join(&[&mirror_dir, &asset]);

        let token = reloc.cache.token(&asset);
        let mut relocated = posix::relative(&dest_dir, &dest);
        relocated.push_str(&stamp_for(token.as_deref()));
        if !query.is_empty() {
            relocated.push('&');
            relocated.push_str(query);
        }
        relocated.push_str(fragment);

        if !assets.contains(&asset) {
            if token.is_none()
                && let Some(report) = reloc.report
            {
                report.warn(format!(
                    "{}: url({}) does not resolve to a file ({})",
                    reloc.source_file, url, asset
                ));
            }
            assets.push(asset);
        }
        ready(Ok(relocated)).boxed()
    });
    reloc.rewriter.rewrite(code, replacer).await
}

/// Split `a.woff?v=2#x` into (`a.woff`, `v=2`, `#x`).
fn split_url(url: &str) -> (&str, &str, &str) {
    let (rest, fragment) = match url.find('#') {
        Some(idx) => (&url[..idx], &url[idx..]),
        None => (url, ""),
    };
    match rest.split_once('?') {
        Some((path, query)) => (path, query, fragment),
        None => (rest, "", fragment),
    }
}
