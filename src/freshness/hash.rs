//! Content hashing and cache-busting tokens.
//!
//! Tokens are the standard base64 encoding of the first 20 bytes of the
//! blake3 digest, with the three characters that need escaping in a query
//! string swapped for URL-safe ones (`+`→`*`, `/`→`!`, `=`→`~`).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Bytes of the digest that make it into the token.
const TOKEN_BYTES: usize = 20;

/// Token used when the referenced file does not exist.
pub const NOT_FOUND_TOKEN: &str = "not-found";

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash an in-memory buffer.
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Hash a file's full contents, streaming.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = [0u8; 64 * 1024];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// URL-safe cache-busting token.
    pub fn token(&self) -> String {
        STANDARD
            .encode(&self.0[..TOKEN_BYTES])
            .chars()
            .map(|c| match c {
                '+' => '*',
                '/' => '!',
                '=' => '~',
                c => c,
            })
            .collect()
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token())
    }
}

/// Query-string stamp for a token: `?h=<token>`.
#[inline]
pub fn stamp_for(token: Option<&str>) -> String {
    format!("?h={}", token.unwrap_or(NOT_FOUND_TOKEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_token_shape() {
        let token = ContentHash::of(b"hello world").token();
        assert_eq!(token.len(), 28);
        assert!(token.ends_with('~'));
        assert!(!token.contains(['+', '/', '=']));
    }

    #[test]
    fn test_token_substitutions() {
        // 0xfb 0xff → "+/" in standard base64
        let mut bytes = [0u8; 32];
        bytes[0] = 0xfb;
        bytes[1] = 0xff;
        bytes[2] = 0xbf;
        let token = ContentHash::new(bytes).token();
        assert!(token.starts_with("*!*!"), "{token}");
    }

    #[test]
    fn test_file_hash_matches_buffer_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello world").unwrap();
        assert_eq!(
            ContentHash::of_file(&path).unwrap(),
            ContentHash::of(b"hello world")
        );
    }

    #[test]
    fn test_stamp_for() {
        assert_eq!(stamp_for(Some("abc")), "?h=abc");
        assert_eq!(stamp_for(None), "?h=not-found");
    }
}
