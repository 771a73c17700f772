//! Module discovery.
//!
//! A module is a directory containing at least one file whose name starts
//! with the directory's own name followed by a dot:
//!
//! ```text
//! src/nav/
//! ├── nav.css      ← module file (ext "css")
//! ├── nav.js       ← module file (ext "js")
//! ├── nav.tpl      ← module template
//! └── arrow.svg    ← plain asset, mirrored but never concatenated
//! ```
//!
//! [`pattern::resolve`] turns selection patterns into ordered module paths,
//! [`ModuleDescriptor::scan`] lists a module's files by extension.

pub mod pattern;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{IoContext, Result};
use crate::utils::path::posix;

pub use pattern::resolve;

/// A discovered module and its per-extension files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Module directory, relative to the project base (`src/nav`).
    pub rel_path: String,
    /// Extension (`css`, `ie.js`, `tpl`) → file path relative to base.
    pub files: BTreeMap<String, String>,
}

impl ModuleDescriptor {
    /// Scan `base/rel_path` for files named `<basename>.<ext>`.
    ///
    /// A missing directory yields a descriptor with no files.
    pub fn scan(base: &Path, rel_path: &str) -> Result<Self> {
        let dir = base.join(rel_path);
        let name = posix::basename(rel_path);
        let prefix = format!("{name}.");
        let mut files = BTreeMap::new();

        if dir.is_dir() {
            for entry in std::fs::read_dir(&dir).at(&dir)? {
                let entry = entry.at(&dir)?;
                if !entry.file_type().at(entry.path())?.is_file() {
                    continue;
                }
                let file_name = entry.file_name();
                let Some(file_name) = file_name.to_str() else {
                    continue;
                };
                if let Some(ext) = file_name.strip_prefix(&prefix)
                    && !ext.is_empty()
                {
                    files.insert(ext.to_string(), posix::join(&[rel_path, file_name]));
                }
            }
        }

        Ok(Self {
            rel_path: rel_path.to_string(),
            files,
        })
    }

    /// Module file for an extension, relative to base.
    pub fn file(&self, ext: &str) -> Option<&str> {
        self.files.get(ext).map(String::as_str)
    }

    /// First existing module file among `exts`, in preference order.
    pub fn first_file_of(&self, exts: &[String]) -> Option<&str> {
        exts.iter().find_map(|ext| self.file(ext))
    }

    /// Module directory name (`nav` for `src/nav`).
    pub fn name(&self) -> &str {
        posix::basename(&self.rel_path)
    }

    /// Absolute path of the module directory.
    pub fn dir(&self, base: &Path) -> PathBuf {
        base.join(&self.rel_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_files_by_extension() {
        let dir = TempDir::new().unwrap();
        let module = dir.path().join("src/nav");
        fs::create_dir_all(&module).unwrap();
        fs::write(module.join("nav.css"), "a{}").unwrap();
        fs::write(module.join("nav.ie.js"), "").unwrap();
        fs::write(module.join("nav.tpl"), "").unwrap();
        fs::write(module.join("arrow.svg"), "").unwrap();
        fs::create_dir(module.join("nav.d")).unwrap();

        let desc = ModuleDescriptor::scan(dir.path(), "src/nav").unwrap();
        assert_eq!(desc.name(), "nav");
        assert_eq!(desc.file("css"), Some("src/nav/nav.css"));
        assert_eq!(desc.file("ie.js"), Some("src/nav/nav.ie.js"));
        assert_eq!(desc.file("tpl"), Some("src/nav/nav.tpl"));
        assert_eq!(desc.files.len(), 3);
    }

    #[test]
    fn test_first_file_of_prefers_order() {
        let dir = TempDir::new().unwrap();
        let module = dir.path().join("a");
        fs::create_dir_all(&module).unwrap();
        fs::write(module.join("a.css"), "").unwrap();
        fs::write(module.join("a.scss"), "").unwrap();

        let desc = ModuleDescriptor::scan(dir.path(), "a").unwrap();
        let exts = vec!["scss".to_string(), "css".to_string()];
        assert_eq!(desc.first_file_of(&exts), Some("a/a.scss"));
        assert_eq!(desc.first_file_of(&["less".to_string()]), None);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = TempDir::new().unwrap();
        let desc = ModuleDescriptor::scan(dir.path(), "nope").unwrap();
        assert!(desc.files.is_empty());
    }
}
