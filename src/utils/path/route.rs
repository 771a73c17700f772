//! URL classification.
//!
//! - Scheme detection (`https:`, `data:`, `mailto:`)
//! - Absolute vs document-relative references

/// Check if a URL has a scheme (`http:`, `data:`, `mailto:`, ...).
///
/// A valid scheme must:
/// - Have at least 1 character before the colon
/// - Only contain ASCII alphanumeric or `+`, `-`, `.`
/// - Start with a letter
#[inline]
pub fn has_scheme(url: &str) -> bool {
    url.find(':').is_some_and(|pos| {
        pos > 0
            && url[..pos].starts_with(|c: char| c.is_ascii_alphabetic())
            && url[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Check if a URL points off-site: has a scheme or is protocol-relative (`//cdn/x`).
#[inline]
pub fn is_scheme_url(url: &str) -> bool {
    url.starts_with("//") || has_scheme(url)
}

/// Check if a stylesheet URL must be left untouched by relocation.
///
/// Root-relative (`/img/x.png`), scheme-qualified (`https://..`, `data:..`)
/// and protocol-relative URLs are already location independent.
#[inline]
pub fn is_absolute_url(url: &str) -> bool {
    url.starts_with('/') || has_scheme(url)
}

/// Check if a module path is explicitly relative (`.`, `..`, `./x`, `../x`).
#[inline]
pub fn is_dot_relative(path: &str) -> bool {
    matches!(path, "." | "..") || path.starts_with("./") || path.starts_with("../")
}
