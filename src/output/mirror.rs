//! Asset mirror: module directories exposed under `<build>/<assets>`.
//!
//! Stylesheet URLs and dev loaders point into the mirror, so every collated
//! module must be reachable there. Dev builds symlink by default; dist builds
//! copy, leaving out what the collated artifacts already contain.

use jwalk::WalkDir;
use rustc_hash::FxHashSet;
use std::io;
use std::path::Path;

use super::{BuildArtifact, BuildContext};
use crate::collation::{TEMPLATE_EXT, module_list};
use crate::config::Settings;
use crate::error::{IoContext, Result};
use crate::utils::path::fs::{rel_posix, to_posix};
use crate::utils::path::posix;
use crate::{debug, log};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMode {
    Symlink,
    Copy,
}

impl MirrorMode {
    pub fn for_settings(settings: &Settings) -> Self {
        if settings.symlink_assets() {
            Self::Symlink
        } else {
            Self::Copy
        }
    }
}

/// Topmost modules of a sorted list: `src/a/b` is covered by `src/a`.
fn topmost(mut modules: Vec<String>) -> Vec<String> {
    modules.sort_by(|a, b| a.split('/').cmp(b.split('/')));
    let mut kept: Vec<String> = Vec::new();
    for module in modules {
        if let Some(last) = kept.last()
            && posix::is_inside(&module, last)
        {
            continue;
        }
        kept.push(module);
    }
    kept
}

/// Module file types left out of a copied mirror.
fn excluded_types(settings: &Settings) -> FxHashSet<String> {
    let mut types: FxHashSet<String> = settings.exclude_from_mirror.iter().cloned().collect();
    if let Some(transpiler) = &settings.adapters.css_transpiler {
        types.extend(transpiler.input_types().iter().cloned());
    }
    if !settings.is_dev {
        types.insert("css".into());
        types.insert("js".into());
    }
    types
}

/// Whether a copied mirror skips `file` (relative to base).
fn is_excluded(file: &str, types: &FxHashSet<String>) -> bool {
    let name = posix::basename(file);
    if name.ends_with(&format!(".{TEMPLATE_EXT}")) {
        return true;
    }
    let dir = posix::dirname(file);
    let Some(ext) = name
        .strip_prefix(posix::basename(&dir))
        .and_then(|rest| rest.strip_prefix('.'))
    else {
        return false;
    };
    types.contains(ext)
}

/// Mirror every collated module. Returns the mirrored top-level modules.
pub async fn mirror_assets(ctx: &BuildContext) -> Result<Vec<String>> {
    let settings = &ctx.settings;
    let mode = MirrorMode::for_settings(settings);
    let mirror = settings.mirror_dir();
    let modules = topmost(module_list(&ctx.plans));

    match mode {
        MirrorMode::Symlink => {
            for module in &modules {
                symlink_module(settings, &mirror, module).await?;
            }
        }
        MirrorMode::Copy => {
            let types = excluded_types(settings);
            let mut artifact = BuildArtifact::new();
            for module in &modules {
                copy_module(settings, &mirror, module, &types, &mut artifact)?;
            }
            debug!("mirror"; "copying {} files", artifact.len());
            artifact.write().await?;
        }
    }

    let mode_name = match mode {
        MirrorMode::Symlink => "linked",
        MirrorMode::Copy => "copied",
    };
    log!("mirror"; "{} {} modules to {}", mode_name, modules.len(), ctx.display_path(&mirror));
    Ok(modules)
}

fn copy_module(
    settings: &Settings,
    mirror: &Path,
    module: &str,
    types: &FxHashSet<String>,
    artifact: &mut BuildArtifact,
) -> Result<()> {
    let dir = settings.base.join(module);
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(&dir).sort(true) {
        let entry = entry.map_err(|e| io::Error::other(e.to_string())).at(&dir)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(rel) = rel_posix(&settings.base, &path) else {
            continue;
        };
        if !is_excluded(&rel, types) {
            artifact.copy(mirror.join(&rel), path);
        }
    }
    Ok(())
}

async fn symlink_module(settings: &Settings, mirror: &Path, module: &str) -> Result<()> {
    let link = mirror.join(module);
    let Some(parent) = link.parent() else {
        return Ok(());
    };
    tokio::fs::create_dir_all(parent).await.at(parent)?;

    if let Ok(meta) = tokio::fs::symlink_metadata(&link).await {
        if meta.is_dir() {
            tokio::fs::remove_dir_all(&link).await.at(&link)?;
        } else {
            tokio::fs::remove_file(&link).await.at(&link)?;
        }
    }

    let target = posix::relative(&to_posix(parent), &to_posix(&settings.base.join(module)));
    create_symlink(&target, &link).await.at(&link)
}

#[cfg(unix)]
async fn create_symlink(target: &str, link: &Path) -> io::Result<()> {
    tokio::fs::symlink(target, link).await
}

#[cfg(windows)]
async fn create_symlink(target: &str, link: &Path) -> io::Result<()> {
    tokio::fs::symlink_dir(target, link).await
}

/// Remove the active build directory.
pub async fn delete_build(settings: &Settings) -> Result<()> {
    let dir = settings.build_dir();
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => {
            debug!("clean"; "removed {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(crate::error::Error::io(dir, e)),
    }
}
