//! `<script>` and `<link>` tags for built collations.

use crate::collation::CollationPlan;
use crate::config::Settings;
use crate::freshness::ContentCache;
use crate::utils::html::escape_attr;

use super::url::page_relative;

/// Collations referenced when a tag names none: every pattern collation,
/// plus the current page's own (`""`) with `collate_pages`.
fn default_names(settings: &Settings, plans: &[CollationPlan]) -> Vec<String> {
    let mut names: Vec<String> = plans
        .iter()
        .filter(|p| p.page.is_none())
        .map(|p| p.name.clone())
        .collect();
    if settings.collate_pages {
        names.push(String::new());
    }
    names
}

/// Attribute-encoded URLs of the `ext` artifacts of `names`.
///
/// `""` stands for the collation of `document`. Collations without an
/// artifact in the active build directory are dropped.
pub fn asset_urls(
    settings: &Settings,
    plans: &[CollationPlan],
    cache: &ContentCache,
    document: &str,
    ext: &str,
    names: Option<Vec<String>>,
    hash: bool,
) -> Vec<String> {
    let names = names.unwrap_or_else(|| default_names(settings, plans));
    let build_dir = settings.build_dir();

    names
        .into_iter()
        .filter_map(|name| {
            if !name.is_empty() {
                return Some(name);
            }
            plans
                .iter()
                .find(|p| p.page.as_deref() == Some(document))
                .map(|p| p.name.clone())
        })
        .filter_map(|name| {
            let file = format!("{name}.{ext}");
            let path = build_dir.join(&file);
            if !path.is_file() {
                return None;
            }
            let mut url = format!("/{file}");
            if settings.page_relative_urls {
                url = page_relative(document, &url);
            }
            if hash {
                url.push_str(&cache.stamp_abs(&path));
            }
            Some(escape_attr(&url).into_owned())
        })
        .collect()
}

pub fn script_tags(urls: &[String]) -> String {
    urls.iter()
        .map(|src| format!("<script src=\"{src}\"></script>"))
        .collect()
}

pub fn style_tags(urls: &[String]) -> String {
    urls.iter()
        .map(|href| format!("<link rel=\"stylesheet\" href=\"{href}\" />"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::plan;
    use crate::config::test_settings;
    use crate::output::tests::fixture;

    #[test]
    fn test_asset_urls() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            &[
                ("src/a/a.css", ""),
                ("src/home/home.tpl", ""),
                ("src/home/about/about.tpl", ""),
                ("dist/site.css", "a{}"),
                ("dist/about/index.css", "b{}"),
            ],
        );
        let settings = test_settings(dir.path(), "collate_pages = true");
        let plans = plan(&settings).unwrap();
        let cache = ContentCache::in_memory(&settings.base);

        let doc = "/about/index.html";
        let urls = asset_urls(&settings, &plans, &cache, doc, "css", None, false);
        assert_eq!(urls, ["/site.css", "/about/index.css"]);

        let home = asset_urls(&settings, &plans, &cache, "/index.html", "css", None, false);
        assert_eq!(home, ["/site.css"]);

        let named = asset_urls(
            &settings,
            &plans,
            &cache,
            doc,
            "css",
            Some(vec!["missing".into(), "site".into()]),
            true,
        );
        assert_eq!(named, [format!("/site.css{}", cache.stamp("dist/site.css"))]);

        assert!(asset_urls(&settings, &plans, &cache, doc, "js", None, true).is_empty());
    }

    #[test]
    fn test_page_relative_asset_urls() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), &[("src/a/a.js", ""), ("dist/site.js", "")]);
        let settings = test_settings(dir.path(), "[templates]\npage_relative_urls = true");
        let plans = plan(&settings).unwrap();
        let cache = ContentCache::in_memory(&settings.base);

        let urls = asset_urls(&settings, &plans, &cache, "/a/b/index.html", "js", None, false);
        assert_eq!(urls, ["../../site.js"]);
        assert_eq!(
            script_tags(&urls),
            "<script src=\"../../site.js\"></script>"
        );
    }

    #[test]
    fn test_style_tags() {
        let urls = vec!["/site.css?h=a&amp;b".to_string()];
        assert_eq!(
            style_tags(&urls),
            "<link rel=\"stylesheet\" href=\"/site.css?h=a&amp;b\" />"
        );
    }
}
