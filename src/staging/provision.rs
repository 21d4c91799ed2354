//! # Directory provisioning.
//!
//! [`Provision`] creates directories with a required mode. [`FsProvisioner`]
//! does `create_dir_all` and then enforces the mode, so an existing directory
//! with a drifted mode is corrected instead of rejected.

use std::fs;
use std::path::Path;

use crate::error::ProvisionError;

/// Idempotent directory creation.
pub trait Provision: Send + Sync {
    /// Ensures `path` exists as a directory with `mode`.
    fn init_directory(&self, path: &Path, mode: u32) -> Result<(), ProvisionError>;
}

/// Filesystem-backed [`Provision`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FsProvisioner;

impl Provision for FsProvisioner {
    fn init_directory(&self, path: &Path, mode: u32) -> Result<(), ProvisionError> {
        if path.exists() && !path.is_dir() {
            return Err(ProvisionError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        fs::create_dir_all(path)?;
        super::set_mode(path, mode)?;
        Ok(())
    }
}
