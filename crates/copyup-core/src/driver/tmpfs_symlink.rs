//! Move+symlink driver.
//!
//! Captures the whole target with one recursive bind mount, hides the target
//! behind a tmpfs and moves the captured mount into a hidden shadow inside
//! that tmpfs. Nothing is copied: the shadow is the original content, so
//! writes through the target are visible in the original and vice versa.

use std::path::{Path, PathBuf};

use copyup_common::constants::DEFAULT_STAGING_PARENT;
use copyup_common::error::{CopyUpResult, Result};
use copyup_common::types::{DriverKind, ExclusionSet};

use super::{CopyUpDriver, run_batch, symlink};
use crate::filesystem::mount;
use crate::staging::{StagingDir, create_shadow_dir};

/// Copy-up driver that relocates the original mount into the shadow.
///
/// Exclusions are matched against destination paths: `<dir>/<name>` for
/// each entry of the relocated shadow.
#[derive(Debug, Clone)]
pub struct TmpfsSymlinkDriver {
    staging_parent: PathBuf,
}

impl TmpfsSymlinkDriver {
    /// Creates a driver staging under `/tmp`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_staging_parent(DEFAULT_STAGING_PARENT)
    }

    /// Creates a driver staging under `parent`.
    #[must_use]
    pub fn with_staging_parent(parent: impl Into<PathBuf>) -> Self {
        Self {
            staging_parent: parent.into(),
        }
    }

    fn copy_up_dir(staging: &StagingDir, dir: &Path, exclusions: &ExclusionSet) -> Result<()> {
        mount::bind_mount_recursive(dir, staging.path())?;
        mount::mount_tmpfs(dir)?;
        let shadow = create_shadow_dir(dir)?;
        mount::move_mount(staging.path(), &shadow)?;
        let linked = symlink::link_shadow_entries(&shadow, dir, exclusions)?;
        tracing::debug!(dir = %dir.display(), shadow = %shadow.display(), linked, "shadow linked");
        Ok(())
    }
}

impl Default for TmpfsSymlinkDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyUpDriver for TmpfsSymlinkDriver {
    fn copy_up_with_exclusion(&self, dirs: &[PathBuf], exclusions: &ExclusionSet) -> CopyUpResult {
        run_batch(&self.staging_parent, dirs, |staging, dir| {
            Self::copy_up_dir(staging, dir, exclusions)
        })
    }

    fn kind(&self) -> DriverKind {
        DriverKind::TmpfsSymlink
    }

    fn staging_parent(&self) -> &Path {
        &self.staging_parent
    }
}
