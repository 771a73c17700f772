//! URLs emitted by templates.
//!
//! Documents live at site paths like `/about/index.html`. With
//! `page_relative_urls` every emitted URL is made relative to the
//! document's directory so the build output works from any mount point.

use std::path::Path;

use crate::config::Settings;
use crate::freshness::ContentCache;
use crate::utils::path::fs::rel_posix;
use crate::utils::path::posix;
use crate::utils::path::route::is_scheme_url;

/// Make a site-absolute URL relative to `document`'s directory.
pub fn page_relative(document: &str, url: &str) -> String {
    let rel = posix::relative(&posix::dirname(document), url);
    if rel.is_empty() { ".".to_string() } else { rel }
}

/// URL of a project file, mirrored under `/<assets>/`.
///
/// Relative paths resolve against `template` (base-relative). Absolute
/// filesystem paths inside the project base are taken as they are; any
/// other absolute path is project-relative. Off-site URLs pass through.
pub fn file_url(
    settings: &Settings,
    cache: &ContentCache,
    document: &str,
    template: &str,
    path: &str,
    hash: bool,
) -> String {
    if is_scheme_url(path) {
        return path.to_string();
    }

    let rel = if let Some(inside) = rel_posix(&settings.base, Path::new(path)) {
        posix::normalize(&inside)
    } else if let Some(abs) = path.strip_prefix('/') {
        posix::normalize(abs)
    } else {
        posix::join(&[&posix::dirname(template), path])
    };
    let mut url = format!("/{}", posix::join(&[&settings.assets_dir, &rel]));
    if settings.page_relative_urls {
        url = page_relative(document, &url);
    }
    if hash {
        url.push_str(&cache.stamp(&rel));
    }
    url
}

/// Rewrite a link for the current document.
///
/// Page-relative mode turns absolute links into relative ones; site mode
/// turns relative links into absolute ones. A trailing `/` survives.
pub fn link_url(settings: &Settings, document: &str, url: &str) -> String {
    if is_scheme_url(url) {
        return url.to_string();
    }

    let tail = if url.ends_with('/') { "/" } else { "" };
    let absolute = url.starts_with('/');
    let dir = posix::dirname(document);

    match (settings.page_relative_urls, absolute) {
        (true, true) => {
            let rel = page_relative(document, url);
            format!("{}{tail}", rel.trim_end_matches('/'))
        }
        (false, false) => {
            let abs = posix::join(&[&dir, url]);
            format!("{}{tail}", abs.trim_end_matches('/'))
        }
        _ => url.to_string(),
    }
}
