//! Build error taxonomy.
//!
//! Every fallible build operation returns [`Result`]. The CLI converts these
//! into `anyhow::Error` at the boundary.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad base directory, name collision, malformed adapter, ...
    #[error("configuration error: {0}")]
    Config(String),

    /// A module or template could not be located.
    #[error("{0}")]
    Resolution(String),

    /// Template inclusion exceeded the configured depth.
    #[error("max include depth exceeded ({0})")]
    Recursion(usize),

    /// A template broke its output contract or failed to parse.
    #[error("template `{path}`: {message}")]
    Template { path: String, message: String },

    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An adapter (minifier, transpiler) reported a failure.
    #[error("{name} failed: {message}")]
    Adapter { name: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn template(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn adapter(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Adapter {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// Attach a path to IO failures, like `anyhow::Context` but typed.
pub trait IoContext<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::io(path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursion_message_names_limit() {
        assert_eq!(
            Error::Recursion(100).to_string(),
            "max include depth exceeded (100)"
        );
    }

    #[test]
    fn test_io_context() {
        let res: std::io::Result<()> = Err(std::io::Error::other("nope"));
        let err = res.at("/tmp/x").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/tmp/x"));
    }
}
