//! Filesystem collaborators of a component's `init` phase.
//!
//! - [`Stage`] / [`AssetStager`]: install a binary with mode and group
//! - [`Provision`] / [`FsProvisioner`]: create directories with mode

mod provision;
mod stager;

use std::io;
use std::path::Path;

pub use provision::{FsProvisioner, Provision};
pub use stager::{AssetStager, Stage};

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
