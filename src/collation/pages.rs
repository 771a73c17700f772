//! Page modules: template-bearing modules under the template home module.
//!
//! ```text
//! src/home/home.tpl            → src/home          → /index.html
//! src/home/about/about.tpl     → src/home/about    → /about/index.html
//! src/home/legal.tpl           → src/home/legal    → /legal/index.html
//! ```

use jwalk::WalkDir;

use crate::config::Settings;
use crate::utils::path::fs::rel_posix;
use crate::utils::path::posix;

/// Template file extension.
pub const TEMPLATE_EXT: &str = "tpl";

/// All page modules under the home module, sorted.
///
/// A template `dir/name.tpl` belongs to module `dir/name`, or to `dir`
/// itself when `name` is the directory's own name.
pub fn find_page_modules(settings: &Settings) -> Vec<String> {
    if settings.template_home.is_empty() {
        return Vec::new();
    }
    let home = settings.base.join(&settings.template_home);
    if !home.is_dir() {
        return Vec::new();
    }

    let suffix = format!(".{TEMPLATE_EXT}");
    let mut modules: Vec<String> = WalkDir::new(&home)
        .sort(true)
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| rel_posix(&settings.base, &entry.path()))
        .filter_map(|rel| {
            let module = rel.strip_suffix(&suffix)?;
            let dir = posix::dirname(module);
            if posix::basename(module) == posix::basename(&dir) {
                Some(dir)
            } else {
                Some(module.to_owned())
            }
        })
        .collect();

    modules.sort_by(|a, b| a.split('/').cmp(b.split('/')));
    modules.dedup();
    modules
}

/// Site-absolute document path of a page module (`/about/index.html`).
///
/// `None` for modules outside the home module, and for the home module
/// itself when the suffix would place it outside the output root.
pub fn document_path(settings: &Settings, module: &str) -> Option<String> {
    let module = module.trim_matches('/');
    let home = settings.template_home.as_str();
    if !posix::is_inside(module, home) {
        return None;
    }
    let rel = posix::relative(home, module);
    if rel.is_empty() {
        return settings
            .output_suffix
            .starts_with('/')
            .then(|| settings.output_suffix.clone());
    }
    Some(format!("/{rel}{}", settings.output_suffix))
}

/// Collation name for a page: its document path without leading slash or
/// file extension (`/about/index.html` → `about/index`).
pub fn page_collation_name(document: &str) -> String {
    let trimmed = document.trim_start_matches('/');
    let file = posix::basename(trimmed);
    match file.rfind('.') {
        Some(dot) if dot > 0 => trimmed[..trimmed.len() - (file.len() - dot)].to_owned(),
        _ => trimmed.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;
    use std::fs;

    fn site(suffix: &str) -> (tempfile::TempDir, Settings) {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "src/home/home.tpl",
            "src/home/about/about.tpl",
            "src/home/about/team/team.tpl",
            "src/home/legal.tpl",
            "src/home/about/about.css",
            "src/other/other.tpl",
        ] {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        let settings = test_settings(dir.path(), &format!("[templates]\nsuffix = \"{suffix}\""));
        (dir, settings)
    }

    #[test]
    fn test_find_page_modules() {
        let (_dir, settings) = site("/index.html");
        assert_eq!(
            find_page_modules(&settings),
            [
                "src/home",
                "src/home/about",
                "src/home/about/team",
                "src/home/legal"
            ]
        );
    }

    #[test]
    fn test_document_path() {
        let (_dir, settings) = site("/index.html");
        assert_eq!(document_path(&settings, "src/home").as_deref(), Some("/index.html"));
        assert_eq!(
            document_path(&settings, "src/home/about/team").as_deref(),
            Some("/about/team/index.html")
        );
        assert_eq!(document_path(&settings, "src/other"), None);
    }

    #[test]
    fn test_document_path_file_suffix_skips_home() {
        let (_dir, settings) = site(".html");
        assert_eq!(document_path(&settings, "src/home"), None);
        assert_eq!(
            document_path(&settings, "src/home/about").as_deref(),
            Some("/about.html")
        );
    }

    #[test]
    fn test_page_collation_name() {
        assert_eq!(page_collation_name("/about/index.html"), "about/index");
        assert_eq!(page_collation_name("/index.html"), "index");
        assert_eq!(page_collation_name("/about.html"), "about");
        assert_eq!(page_collation_name("/v1.2/page"), "v1.2/page");
    }
}
