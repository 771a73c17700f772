//! `/`-separated string path helpers.
//!
//! Module paths, asset URLs and document paths are all plain strings with
//! `/` separators regardless of host platform. These helpers mirror the
//! usual posix semantics: `.` and `..` are collapsed, a leading `/` marks an
//! absolute path, and a trailing `/` survives normalization.

/// Collapse `.`, `..` and repeated separators.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if !absolute => segments.push(".."),
                _ => {}
            },
            _ => segments.push(seg),
        }
    }

    let mut out = segments.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if out.is_empty() {
        out.push('.');
    }
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// Join path pieces and normalize the result.
pub fn join(parts: &[&str]) -> String {
    let joined: Vec<&str> = parts.iter().copied().filter(|p| !p.is_empty()).collect();
    if joined.is_empty() {
        return ".".to_string();
    }
    normalize(&joined.join("/"))
}

/// Parent directory of `path`.
///
/// `"/a/b"` → `"/a"`, `"a"` → `"."`, `"/a"` → `"/"`.
pub fn dirname(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        None => ".".to_string(),
        Some(0) => "/".to_string(),
        Some(idx) => trimmed[..idx].trim_end_matches('/').to_string(),
    }
}

/// Last segment of `path`, ignoring trailing separators.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Relative path that leads from directory `from` to `to`.
///
/// Both paths must be of the same kind (both absolute or both relative).
/// Returns an empty string when they are the same location.
pub fn relative(from: &str, to: &str) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<&str> = components(&from);
    let to_parts: Vec<&str> = components(&to);

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<&str> = Vec::with_capacity(from_parts.len() + to_parts.len());
    out.extend(std::iter::repeat_n("..", from_parts.len() - common));
    out.extend(&to_parts[common..]);
    out.join("/")
}

/// Whether `path` equals `dir` or lies below it.
pub fn is_inside(path: &str, dir: &str) -> bool {
    let path = normalize(path);
    let dir = normalize(dir);
    let dir = dir.trim_end_matches('/');
    path.trim_end_matches('/') == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn components(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a/./b/../c"), "a/c");
        assert_eq!(normalize("/a//b/"), "/a/b/");
        assert_eq!(normalize("../a"), "../a");
        assert_eq!(normalize("/../a"), "/a");
        assert_eq!(normalize("a/.."), ".");
        assert_eq!(normalize(""), ".");
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&["src/c", "icon.gif"]), "src/c/icon.gif");
        assert_eq!(join(&["src/c", "../img/x.png"]), "src/img/x.png");
        assert_eq!(join(&["", "a"]), "a");
        assert_eq!(join(&["/abc/def", "ghi/"]), "/abc/def/ghi/");
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("/abc/def/index.html"), "/abc/def");
        assert_eq!(dirname("src/a"), "src");
        assert_eq!(dirname("a"), ".");
        assert_eq!(dirname("/a"), "/");
        assert_eq!(dirname("/"), "/");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("src/nav"), "nav");
        assert_eq!(basename("src/nav/"), "nav");
        assert_eq!(basename("nav"), "nav");
    }

    #[test]
    fn test_relative() {
        assert_eq!(relative("/abc/def", "/abc/ghi"), "../ghi");
        assert_eq!(relative("dist", "dist/assets/src/c/icon.gif"), "assets/src/c/icon.gif");
        assert_eq!(relative("/a/b", "/a/b"), "");
        assert_eq!(relative("/", "/x/y"), "x/y");
        assert_eq!(relative("src/home", "src/home/about/index.html"), "about/index.html");
    }

    #[test]
    fn test_is_inside() {
        assert!(is_inside("src/a/b", "src/a"));
        assert!(is_inside("src/a", "src/a"));
        assert!(!is_inside("src/ab", "src/a"));
        assert!(!is_inside("src", "src/a"));
    }
}
