//! Module selection patterns.
//!
//! Patterns are `/`-separated paths relative to the project base:
//!
//! | Pattern        | Matches                                          |
//! |----------------|--------------------------------------------------|
//! | `src/nav`      | exactly that module                              |
//! | `src/*`        | direct child modules of `src`                    |
//! | `src/ab*`      | `src/ab`, `src/abc`, ... (partial segment)       |
//! | `src/**`       | `src` itself and every module below it           |
//! | `!src/legacy`  | removes earlier matches                          |
//!
//! Patterns are applied left to right. Explicit (wildcard-free) patterns pin
//! a module at their position even if an earlier wildcard already added it.

use std::path::Path;
use std::sync::LazyLock;

use jwalk::WalkDir;
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::debug;
use crate::error::Result;
use crate::utils::path::fs::rel_posix;

/// Accepted pattern characters: optional leading `!`, then `-`, ASCII word chars, `/`, `*`.
static VALID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!?[-0-9A-Za-z_/*]+$").unwrap());

/// Whether `raw` is a pattern [`resolve`] will use rather than skip.
pub fn is_valid_pattern(raw: &str) -> bool {
    VALID_PATTERN.is_match(raw)
}

/// One segment of a compiled pattern.
#[derive(Debug)]
enum Segment {
    Literal(String),
    /// Single-segment wildcard (`ab*`).
    Glob(Regex),
    /// `**`: zero or more whole segments.
    Globstar,
}

/// A parsed module pattern.
#[derive(Debug)]
struct Pattern {
    negated: bool,
    wild: bool,
    /// Segments before the first wildcard: the directory to scan.
    static_prefix: Vec<String>,
    segments: Vec<Segment>,
}

impl Pattern {
    fn parse(raw: &str) -> Option<Self> {
        if !VALID_PATTERN.is_match(raw) {
            return None;
        }
        let negated = raw.starts_with('!');
        let body = raw.trim_start_matches('!');
        let wild = body.contains('*');

        let mut segments = Vec::new();
        let mut static_prefix = Vec::new();
        let mut in_prefix = true;
        for seg in body.split('/').filter(|s| !s.is_empty()) {
            let compiled = match seg {
                "**" => Segment::Globstar,
                s if s.contains('*') => {
                    let parts: Vec<String> = s.split('*').map(regex::escape).collect();
                    let re = Regex::new(&format!("^{}$", parts.join("[^/]*"))).ok()?;
                    Segment::Glob(re)
                }
                s => Segment::Literal(s.to_string()),
            };
            if in_prefix {
                match &compiled {
                    Segment::Literal(s) => static_prefix.push(s.clone()),
                    _ => in_prefix = false,
                }
            }
            segments.push(compiled);
        }

        Some(Self {
            negated,
            wild,
            static_prefix,
            segments,
        })
    }

    fn matches(&self, rel_path: &str) -> bool {
        let parts: Vec<&str> = rel_path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Globstar, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Literal(lit), rest)) => {
            path.first().is_some_and(|p| p == lit) && match_segments(rest, &path[1..])
        }
        Some((Segment::Glob(re), rest)) => {
            path.first().is_some_and(|p| re.is_match(p)) && match_segments(rest, &path[1..])
        }
    }
}

/// Expand module patterns against `base` into ordered, unique module paths.
///
/// Returned paths are relative to `base` with `/` separators. Invalid
/// patterns are skipped. The base directory itself is never a module.
pub fn resolve(base: &Path, patterns: &[String]) -> Result<Vec<String>> {
    let mut results: Vec<String> = Vec::new();
    let mut wilds: FxHashSet<String> = FxHashSet::default();

    for raw in patterns {
        let Some(pattern) = Pattern::parse(raw) else {
            debug!("modules"; "ignoring invalid pattern `{}`", raw);
            continue;
        };

        let matched: Vec<String> = find_modules(base, &pattern.static_prefix)
            .into_iter()
            .filter(|module| pattern.matches(module))
            .collect();

        if pattern.negated {
            for module in &matched {
                results.retain(|m| m != module);
                wilds.remove(module);
            }
            continue;
        }

        for module in matched {
            // An explicit mention moves a wildcard-introduced module here.
            if !pattern.wild && wilds.remove(&module) {
                results.retain(|m| *m != module);
            }
            if !results.contains(&module) {
                if pattern.wild {
                    wilds.insert(module.clone());
                }
                results.push(module);
            }
        }
    }

    Ok(results)
}

/// All modules at or below `base/prefix`, depth-first with sorted siblings.
fn find_modules(base: &Path, prefix: &[String]) -> Vec<String> {
    let root = prefix.iter().fold(base.to_path_buf(), |acc, seg| acc.join(seg));
    if !root.is_dir() {
        return Vec::new();
    }

    let mut found: FxHashSet<String> = FxHashSet::default();
    for entry in WalkDir::new(&root).sort(true).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let dir = entry.parent_path();
        let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_module_file = entry
            .file_name()
            .to_str()
            .is_some_and(|f| f.starts_with(dir_name) && f[dir_name.len()..].starts_with('.'));
        if !is_module_file {
            continue;
        }
        if let Some(rel) = rel_posix(base, dir)
            && !rel.is_empty()
        {
            found.insert(rel);
        }
    }

    let mut modules: Vec<String> = found.into_iter().collect();
    // Component-wise order is preorder with sorted children.
    modules.sort_by(|a, b| a.split('/').cmp(b.split('/')));
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Build the fixture tree:
    ///
    /// ```text
    /// src/src.css
    /// src/{a,b,c}/<name>.js
    /// src/c/d/d.css
    /// src/c/d/e/e.tpl
    /// src/c/not-a-module/readme.txt
    /// src-2/{ab,abc,abe,xab}/<name>.css
    /// ```
    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let write = |rel: &str| {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        };
        write("src/src.css");
        write("src/a/a.js");
        write("src/b/b.js");
        write("src/c/c.js");
        write("src/c/d/d.css");
        write("src/c/d/e/e.tpl");
        write("src/c/not-a-module/readme.txt");
        for name in ["ab", "abc", "abe", "xab"] {
            write(&format!("src-2/{name}/{name}.css"));
        }
        dir
    }

    fn run(dir: &TempDir, patterns: &[&str]) -> Vec<String> {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        resolve(dir.path(), &patterns).unwrap()
    }

    #[test]
    fn test_single_star_is_not_recursive() {
        let dir = fixture();
        assert_eq!(run(&dir, &["src/*"]), ["src/a", "src/b", "src/c"]);
    }

    #[test]
    fn test_partial_segment_star() {
        let dir = fixture();
        assert_eq!(run(&dir, &["src-2/ab*"]), ["src-2/ab", "src-2/abc", "src-2/abe"]);
    }

    #[test]
    fn test_double_star_includes_self_in_preorder() {
        let dir = fixture();
        assert_eq!(
            run(&dir, &["src/**"]),
            ["src", "src/a", "src/b", "src/c", "src/c/d", "src/c/d/e"]
        );
    }

    #[test]
    fn test_explicit_path_only() {
        let dir = fixture();
        assert_eq!(run(&dir, &["src/c/d"]), ["src/c/d"]);
        assert_eq!(run(&dir, &["src/c/d/", "src/b"]), ["src/c/d", "src/b"]);
    }

    #[test]
    fn test_explicit_paths_keep_position() {
        let dir = fixture();
        assert_eq!(
            run(&dir, &["src/c", "src/**", "src/a"]),
            ["src/c", "src", "src/b", "src/c/d", "src/c/d/e", "src/a"]
        );
    }

    #[test]
    fn test_first_duplicate_wins() {
        let dir = fixture();
        assert_eq!(
            run(
                &dir,
                &["src/c", "src/a", "src/**", "src/a", "src/c/d", "src/**"]
            ),
            ["src/c", "src/a", "src", "src/b", "src/c/d/e", "src/c/d"]
        );
    }

    #[test]
    fn test_negation_removes() {
        let dir = fixture();
        assert_eq!(
            run(&dir, &["src/**", "!src/c/d"]),
            ["src", "src/a", "src/b", "src/c", "src/c/d/e"]
        );
    }

    #[test]
    fn test_negated_then_readded() {
        let dir = fixture();
        assert_eq!(
            run(&dir, &["src/**", "!src/c/**", "src/c/d"]),
            ["src", "src/a", "src/b", "src/c/d"]
        );
    }

    #[test]
    fn test_invalid_and_missing_patterns_ignored() {
        let dir = fixture();
        assert_eq!(run(&dir, &["src/a?", "../src/a", "nope/*", "src/b"]), ["src/b"]);
    }

    #[test]
    fn test_non_module_directories_never_match() {
        let dir = fixture();
        assert!(run(&dir, &["src/c/not-a-module"]).is_empty());
    }
}
