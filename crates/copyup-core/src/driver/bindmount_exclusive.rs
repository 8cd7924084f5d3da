//! Exclusive bind-mount driver.
//!
//! Rebuilds each target inside a fresh tmpfs from its captured original:
//! subdirectories are bind-mounted back in, regular files are duplicated,
//! and every other entry type (symlinks included) is dropped.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use copyup_common::constants::{DEFAULT_STAGING_PARENT, SHADOW_DIR_MODE};
use copyup_common::error::{CopyUpError, CopyUpResult, Result};
use copyup_common::types::{DriverKind, EntryKind, ExclusionSet};

use super::{CopyUpDriver, run_batch, symlink};
use crate::filesystem::entries::read_entries;
use crate::filesystem::mount;
use crate::staging::{StagingDir, create_shadow_dir};

/// Copy-up driver that synthesizes the shadow from the captured original.
///
/// Exclusions are matched against original paths: `<dir>/<name>` for each
/// entry of the captured target. Exclusions given at construction apply to
/// every call on top of the per-call set.
#[derive(Debug, Clone)]
pub struct ExclusiveBindMountDriver {
    staging_parent: PathBuf,
    exclusions: ExclusionSet,
}

impl ExclusiveBindMountDriver {
    /// Creates a driver staging under `/tmp` with no standing exclusions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            staging_parent: PathBuf::from(DEFAULT_STAGING_PARENT),
            exclusions: ExclusionSet::new(),
        }
    }

    /// Sets the exclusions applied to every call.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Stages under `parent` instead of `/tmp`.
    #[must_use]
    pub fn with_staging_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.staging_parent = parent.into();
        self
    }

    /// Exclusions applied to every call.
    #[must_use]
    pub const fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    fn copy_up_dir(staging: &StagingDir, dir: &Path, exclusions: &ExclusionSet) -> Result<()> {
        let captured = staging.path();
        mount::bind_mount_recursive(dir, captured)?;
        mount::mount_tmpfs(dir)?;
        let shadow = create_shadow_dir(dir)?;

        for entry in read_entries(captured)? {
            let original = dir.join(&entry.name);
            if exclusions.contains(&original) {
                tracing::debug!(path = %original.display(), "excluded from copy-up");
                continue;
            }

            let from = captured.join(&entry.name);
            let to = shadow.join(&entry.name);
            match entry.kind {
                EntryKind::Directory => {
                    std::fs::DirBuilder::new()
                        .mode(SHADOW_DIR_MODE)
                        .create(&to)
                        .map_err(|e| CopyUpError::ShadowCreateFailed {
                            dir: to.clone(),
                            source: e,
                        })?;
                    mount::bind_mount_recursive(&from, &to)?;
                }
                EntryKind::Regular => {
                    if let Err(err) = copy_regular_file(&from, &to) {
                        tracing::warn!(error = %err, "file left out of copy-up");
                    }
                }
                EntryKind::Symlink | EntryKind::Other => {
                    tracing::debug!(
                        path = %original.display(),
                        kind = %entry.kind,
                        "entry type not materialized"
                    );
                }
            }
        }

        let linked = symlink::link_shadow_entries(&shadow, dir, exclusions)?;
        tracing::debug!(dir = %dir.display(), shadow = %shadow.display(), linked, "shadow linked");

        // Everything still needed now has its own mount under the shadow.
        if let Err(err) = mount::detach_mount(captured) {
            tracing::warn!(error = %err, "staging mount left attached");
        }
        Ok(())
    }
}

impl Default for ExclusiveBindMountDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyUpDriver for ExclusiveBindMountDriver {
    fn copy_up_with_exclusion(&self, dirs: &[PathBuf], exclusions: &ExclusionSet) -> CopyUpResult {
        tracing::debug!(
            standing = self.exclusions().len(),
            per_call = exclusions.len(),
            "applying exclusions"
        );
        let exclusions = self.exclusions().union(exclusions);
        run_batch(&self.staging_parent, dirs, |staging, dir| {
            Self::copy_up_dir(staging, dir, &exclusions)
        })
    }

    fn kind(&self) -> DriverKind {
        DriverKind::BindMountExclusive
    }

    fn staging_parent(&self) -> &Path {
        &self.staging_parent
    }
}

/// Duplicates the bytes and permission bits of `from` into a new file `to`.
///
/// On failure the partial copy is removed, so the file is simply absent.
///
/// # Errors
///
/// Returns [`CopyUpError::FileCopyFailed`] if the source cannot be read or
/// the copy cannot be written.
pub fn copy_regular_file(from: &Path, to: &Path) -> Result<u64> {
    let copy = || -> std::io::Result<u64> {
        let mut input = File::open(from)?;
        let permissions = input.metadata()?.permissions();
        let mut output = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(to)?;
        let copied = std::io::copy(&mut input, &mut output)?;
        output.set_permissions(permissions)?;
        Ok(copied)
    };

    copy().map_err(|e| {
        let _ = std::fs::remove_file(to);
        CopyUpError::FileCopyFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        }
    })
}
