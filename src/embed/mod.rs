//! Embedded static resources.
//!
//! - `dev/loader.js` - Script loader, minified at build time
//! - `dev/loader.css` - Stylesheet loader
//!
//! ```ignore
//! use embed::dev::render_loader;
//!
//! let code = render_loader("css", &urls);
//! ```

pub mod dev {
    /// An embedded loader source with one placeholder for the module URLs.
    struct Loader {
        source: &'static str,
        placeholder: &'static str,
        format: fn(&[String]) -> String,
    }

    impl Loader {
        fn render(&self, urls: &[String]) -> String {
            self.source.replace(self.placeholder, &(self.format)(urls))
        }
    }

    /// Injects one script tag per module, in order.
    const SCRIPT_LOADER: Loader = Loader {
        source: include_str!(concat!(env!("OUT_DIR"), "/loader.min.js")),
        placeholder: "__COLLATE_FILES__",
        format: tab_indented_json,
    };

    /// One `@import` per module.
    const STYLE_LOADER: Loader = Loader {
        source: include_str!("dev/loader.css"),
        placeholder: "__COLLATE_IMPORTS__",
        format: import_lines,
    };

    /// Render the dev loader for a file type.
    ///
    /// Returns `None` for types without a loader template.
    pub fn render_loader(ext: &str, urls: &[String]) -> Option<String> {
        match ext {
            "js" => Some(SCRIPT_LOADER.render(urls)),
            "css" => Some(STYLE_LOADER.render(urls)),
            _ => None,
        }
    }

    /// JSON array with one tab-indented entry per line.
    fn tab_indented_json(items: &[String]) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }
        let body: Vec<String> = items
            .iter()
            .map(|item| format!("\t{}", json_string(item)))
            .collect();
        format!("[\n{}\n]", body.join(",\n"))
    }

    fn import_lines(urls: &[String]) -> String {
        urls.iter()
            .map(|url| format!("@import {};", json_string(url)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn json_string(s: &str) -> String {
        serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
    }

}
