//! # Binary staging.
//!
//! [`Stage`] installs an executable at a well-known location before a component
//! can run it. [`AssetStager`] copies it from an asset directory:
//!
//! ```text
//! asset_dir/kubelet ──(differs?)──► bin_dir/.kubelet.staging ──rename──► bin_dir/kubelet
//!                                                                        └─► chmod mode, chgrp group
//! ```
//!
//! The copy goes through a temporary file and a rename, so a binary that is
//! currently executing is replaced rather than overwritten in place. Staging an
//! identical file again only re-applies mode and group.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StageError;

/// Installs executables.
pub trait Stage: Send + Sync {
    /// Installs `binary` into `target_dir` with `mode`, optionally owned by `group`.
    ///
    /// Returns the installed path. Must be idempotent.
    fn stage(
        &self,
        target_dir: &Path,
        binary: &str,
        mode: u32,
        group: Option<&str>,
    ) -> Result<PathBuf, StageError>;
}

/// Stages binaries by copying them from a source directory.
#[derive(Clone, Debug)]
pub struct AssetStager {
    source_dir: PathBuf,
}

impl AssetStager {
    /// Creates a stager reading assets from `source_dir`.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }

    /// Directory assets are read from.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}

impl Stage for AssetStager {
    fn stage(
        &self,
        target_dir: &Path,
        binary: &str,
        mode: u32,
        group: Option<&str>,
    ) -> Result<PathBuf, StageError> {
        let src = self.source_dir.join(binary);
        if !src.is_file() {
            return Err(StageError::MissingAsset { path: src });
        }

        fs::create_dir_all(target_dir)?;
        super::set_mode(target_dir, mode)?;

        let dst = target_dir.join(binary);
        if !same_contents(&src, &dst)? {
            let tmp = target_dir.join(format!(".{binary}.staging"));
            fs::copy(&src, &tmp)?;
            fs::rename(&tmp, &dst)?;
        }
        super::set_mode(&dst, mode)?;

        if let Some(group) = group {
            chgrp(&dst, group)?;
        }
        Ok(dst)
    }
}

fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
    let b_meta = match fs::metadata(b) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if fs::metadata(a)?.len() != b_meta.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}

#[cfg(unix)]
fn chgrp(path: &Path, group: &str) -> Result<(), StageError> {
    use nix::unistd::{Group, chown};

    let gid = Group::from_name(group)
        .map_err(|e| StageError::Chown {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .ok_or_else(|| StageError::UnknownGroup {
            group: group.to_string(),
        })?
        .gid;

    chown(path, None, Some(gid)).map_err(|e| StageError::Chown {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(not(unix))]
fn chgrp(_path: &Path, _group: &str) -> Result<(), StageError> {
    Ok(())
}
