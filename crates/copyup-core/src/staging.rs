//! Staging and shadow directory lifecycle.
//!
//! The staging directory is the attach point that captures a target's
//! original content before a tmpfs hides it. It lives for one call and is
//! removed when [`StagingDir`] is dropped. Shadow directories live inside
//! each target's tmpfs and are never removed here.

use std::os::unix::fs::DirBuilderExt;
use std::path::{Component, Path, PathBuf};

use copyup_common::constants::{SHADOW_DIR_MODE, SHADOW_PREFIX, STAGING_DIR_MODE, STAGING_PREFIX};
use copyup_common::error::{CopyUpError, Result};

/// Uniquely named staging directory, removed on drop.
///
/// Removal never recurses: a directory that is still a mount point, or
/// still holds content, is left behind rather than emptied.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Creates `<parent>/copyup-b<uuid>`.
    ///
    /// # Errors
    ///
    /// Returns [`CopyUpError::StagingCreateFailed`] if the directory cannot
    /// be created.
    pub fn create(parent: &Path) -> Result<Self> {
        let path = parent.join(format!("{STAGING_PREFIX}{}", uuid::Uuid::new_v4().simple()));
        std::fs::DirBuilder::new()
            .mode(STAGING_DIR_MODE)
            .create(&path)
            .map_err(|e| CopyUpError::StagingCreateFailed {
                parent: parent.to_path_buf(),
                source: e,
            })?;
        tracing::debug!(path = %path.display(), "staging directory created");
        Ok(Self { path })
    }

    /// Path of the staging directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        match std::fs::remove_dir(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "staging directory removed"),
            Err(e) => tracing::debug!(
                path = %self.path.display(),
                error = %e,
                "leaving staging directory behind"
            ),
        }
    }
}

/// Creates the hidden shadow directory `<dir>/.ro<uuid>` and returns its
/// path.
///
/// # Errors
///
/// Returns [`CopyUpError::ShadowCreateFailed`] if the directory cannot be
/// created.
pub fn create_shadow_dir(dir: &Path) -> Result<PathBuf> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let shadow = dir.join(format!("{SHADOW_PREFIX}{}", &id[..12]));
    std::fs::DirBuilder::new()
        .mode(SHADOW_DIR_MODE)
        .create(&shadow)
        .map_err(|e| CopyUpError::ShadowCreateFailed {
            dir: dir.to_path_buf(),
            source: e,
        })?;
    tracing::debug!(shadow = %shadow.display(), "shadow directory created");
    Ok(shadow)
}

/// Lexically normalizes `path`: repeated separators and `.` components are
/// dropped and `..` removes the preceding component. Symlinks are not
/// resolved.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_relative_start = !cleaned.has_root()
                    && cleaned
                        .components()
                        .next_back()
                        .is_none_or(|c| c == Component::ParentDir);
                if at_relative_start {
                    cleaned.push("..");
                } else {
                    let _ = cleaned.pop();
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }
    cleaned
}

/// Cleans `dir` and checks that it may be copied up while staging under
/// `staging_parent`.
///
/// # Errors
///
/// Returns [`CopyUpError::InvalidTarget`] if `dir` is relative, or if it is
/// the staging parent or one of its ancestors: hiding it would hide the
/// staging directory too.
pub fn validate_target(dir: &Path, staging_parent: &Path) -> Result<PathBuf> {
    let cleaned = clean_path(dir);
    if !cleaned.is_absolute() {
        return Err(CopyUpError::InvalidTarget {
            path: cleaned,
            reason: "target must be an absolute path",
        });
    }
    if staging_parent.starts_with(&cleaned) {
        return Err(CopyUpError::InvalidTarget {
            path: cleaned,
            reason: "it hosts the staging directory",
        });
    }
    Ok(cleaned)
}
