//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`.
///
/// Walks up parent directories until finding `config_name`. Absolute names
/// are returned as-is when they exist.
///
/// # Example
/// ```text
/// /home/user/site/src/nav/    ← start
/// /home/user/site/collate.toml ← found!
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_config_upward() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src/nav");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("collate.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("collate.toml")).unwrap();
        assert_eq!(found, dir.path().join("collate.toml"));
    }

    #[test]
    fn test_find_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config_file(dir.path(), Path::new("no-such-collate-config.toml")).is_none());
    }

    #[test]
    fn test_absolute_config_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        assert!(find_config_file(Path::new("/"), &path).is_none());
        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(Path::new("/"), &path), Some(path));
    }
}
