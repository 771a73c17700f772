//! Build artifacts and their persistence.
//!
//! Builders assemble a [`BuildArtifact`] in memory and write it once at the
//! end of a phase. Every file is written to a sibling temporary and renamed
//! into place, so readers never observe a half-written output.

use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::debug;
use crate::error::{IoContext, Result};

/// Content of one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactContent {
    Text(String),
    /// Byte-for-byte copy of an existing file.
    Copy { source: PathBuf },
}

/// Output files of one build phase, keyed by absolute path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    files: BTreeMap<PathBuf, ArtifactContent>,
}

impl BuildArtifact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .insert(path.into(), ArtifactContent::Text(content.into()));
    }

    pub fn copy(&mut self, path: impl Into<PathBuf>, source: impl Into<PathBuf>) {
        self.files.insert(
            path.into(),
            ArtifactContent::Copy {
                source: source.into(),
            },
        );
    }

    pub fn get(&self, path: &Path) -> Option<&ArtifactContent> {
        self.files.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file, creating parent directories. Returns the file count.
    pub async fn write(self) -> Result<usize> {
        let count = self.files.len();
        try_join_all(
            self.files
                .into_iter()
                .map(|(path, content)| write_one(path, content)),
        )
        .await?;
        Ok(count)
    }
}

/// Sibling temporary for `path`: `dir/.name.collate-tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.collate-tmp"))
}

async fn write_one(path: PathBuf, content: ArtifactContent) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.at(parent)?;
    }

    let temp = temp_path(&path);
    match content {
        ArtifactContent::Text(text) => tokio::fs::write(&temp, text).await.at(&temp)?,
        ArtifactContent::Copy { source } => {
            tokio::fs::copy(&source, &temp).await.at(&source)?;
        }
    }
    tokio::fs::rename(&temp, &path).await.at(&path)?;

    debug!("write"; "{}", path.display());
    Ok(())
}
