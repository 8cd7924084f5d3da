//! Copy-up driver abstraction.
//!
//! Both strategies share one contract: process the given directories in
//! order, stop at the first unrecoverable error, and always report which
//! directories were completed before it.

pub mod bindmount_exclusive;
pub mod symlink;
pub mod tmpfs_symlink;

use std::path::{Path, PathBuf};

use copyup_common::config::CopyUpConfig;
use copyup_common::error::{CopyUpResult, PartialCopyUp, Result};
use copyup_common::types::{DriverKind, ExclusionSet};

use crate::staging::{StagingDir, clean_path, validate_target};

pub use bindmount_exclusive::ExclusiveBindMountDriver;
pub use tmpfs_symlink::TmpfsSymlinkDriver;

/// Replaces the visible content of directories with a writable,
/// process-local view that still exposes the original entries.
///
/// Implementors mutate the caller's mount namespace and must not be run
/// concurrently over overlapping paths.
pub trait CopyUpDriver: Send + Sync {
    /// Copies up `dirs` with nothing excluded.
    ///
    /// # Errors
    ///
    /// See [`CopyUpDriver::copy_up_with_exclusion`].
    fn copy_up(&self, dirs: &[PathBuf]) -> CopyUpResult {
        self.copy_up_with_exclusion(dirs, &ExclusionSet::new())
    }

    /// Copies up `dirs` in order, leaving out the entries named by
    /// `exclusions`, and returns the cleaned paths of the processed
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns a [`PartialCopyUp`] holding the directories completed before
    /// the first unrecoverable error. Directories after the failing one are
    /// left untouched; the failing one may be half processed.
    fn copy_up_with_exclusion(&self, dirs: &[PathBuf], exclusions: &ExclusionSet) -> CopyUpResult;

    /// Strategy implemented by this driver.
    fn kind(&self) -> DriverKind;

    /// Directory under which each call creates its staging directory.
    fn staging_parent(&self) -> &Path;
}

/// Runs `copy_one` for each directory with a staging directory shared by
/// the whole batch.
///
/// The staging directory is released on every exit path. A failure to
/// create it is reported against the first directory, which is never
/// started.
pub(crate) fn run_batch<F>(staging_parent: &Path, dirs: &[PathBuf], mut copy_one: F) -> CopyUpResult
where
    F: FnMut(&StagingDir, &Path) -> Result<()>,
{
    let Some(first) = dirs.first() else {
        return Ok(Vec::new());
    };
    let staging_parent = clean_path(staging_parent);
    let staging = StagingDir::create(&staging_parent)
        .map_err(|e| PartialCopyUp::new(Vec::new(), first.clone(), e))?;

    let mut copied = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let step = validate_target(dir, &staging_parent)
            .and_then(|dir| copy_one(&staging, &dir).map(|()| dir));
        match step {
            Ok(dir) => {
                tracing::info!(dir = %dir.display(), "directory copied up");
                copied.push(dir);
            }
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "copy-up halted");
                return Err(PartialCopyUp::new(copied, dir.clone(), e));
            }
        }
    }
    Ok(copied)
}

/// Builds the driver selected by `config`, staging under its
/// `staging_parent`.
#[must_use]
pub fn new_driver(config: &CopyUpConfig) -> Box<dyn CopyUpDriver> {
    match config.driver {
        DriverKind::TmpfsSymlink => Box::new(TmpfsSymlinkDriver::with_staging_parent(
            config.staging_parent.clone(),
        )),
        DriverKind::BindMountExclusive => Box::new(
            ExclusiveBindMountDriver::new().with_staging_parent(config.staging_parent.clone()),
        ),
    }
}

/// Runs the configured driver over the configured directories.
///
/// # Errors
///
/// Returns a [`PartialCopyUp`] as described on
/// [`CopyUpDriver::copy_up_with_exclusion`].
pub fn copy_up_from_config(config: &CopyUpConfig) -> CopyUpResult {
    let driver = new_driver(config);
    tracing::info!(
        driver = %driver.kind(),
        dirs = config.dirs.len(),
        exclusions = config.exclusions.len(),
        "starting copy-up"
    );
    driver.copy_up_with_exclusion(&config.dirs, &config.exclusions)
}

#[cfg(test)]
mod tests {
    use copyup_common::error::CopyUpError;

    use super::*;

    #[test]
    fn factory_honours_driver_kind() {
        let mut config = CopyUpConfig::default();
        assert_eq!(new_driver(&config).kind(), DriverKind::TmpfsSymlink);
        config.driver = DriverKind::BindMountExclusive;
        config.staging_parent = PathBuf::from("/var/tmp");
        let driver = new_driver(&config);
        assert_eq!(driver.kind(), DriverKind::BindMountExclusive);
        assert_eq!(driver.staging_parent(), Path::new("/var/tmp"));
    }

    #[test]
    fn batch_stops_at_first_error_and_keeps_progress() {
        let parent = tempfile::tempdir().unwrap();
        let dirs = vec![
            PathBuf::from("/srv/a/"),
            PathBuf::from("/srv/b"),
            PathBuf::from("relative"),
            PathBuf::from("/srv/never"),
        ];
        let mut seen = Vec::new();
        let err = run_batch(parent.path(), &dirs, |staging, dir| {
            assert!(staging.path().starts_with(parent.path()));
            seen.push(dir.to_path_buf());
            Ok(())
        })
        .unwrap_err();

        assert_eq!(err.copied, vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]);
        assert_eq!(seen, err.copied);
        assert_eq!(err.dir, PathBuf::from("relative"));
        assert!(matches!(err.source, CopyUpError::InvalidTarget { .. }));
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn batch_reports_step_failure_for_the_failing_dir() {
        let parent = tempfile::tempdir().unwrap();
        let dirs = vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")];
        let err = run_batch(parent.path(), &dirs, |_, dir| {
            if dir == Path::new("/srv/b") {
                return Err(CopyUpError::ShadowCreateFailed {
                    dir: dir.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::ReadOnlyFilesystem),
                });
            }
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.copied, vec![PathBuf::from("/srv/a")]);
        assert_eq!(err.dir, PathBuf::from("/srv/b"));
        assert!(err.to_string().starts_with("copy-up of /srv/b stopped after 1"));
    }

    #[test]
    fn missing_staging_parent_fails_before_any_directory() {
        let parent = tempfile::tempdir().unwrap();
        let config = CopyUpConfig {
            dirs: vec![PathBuf::from("/etc")],
            staging_parent: parent.path().join("missing"),
            ..CopyUpConfig::default()
        };
        let err = copy_up_from_config(&config).unwrap_err();
        assert!(err.copied.is_empty());
        assert_eq!(err.dir, PathBuf::from("/etc"));
        assert!(matches!(err.source, CopyUpError::StagingCreateFailed { .. }));
    }

    #[test]
    fn empty_batch_needs_no_staging_directory() {
        let parent = tempfile::tempdir().unwrap();
        let copied = run_batch(&parent.path().join("missing"), &[], |_, _| {
            unreachable!("no directory to process")
        })
        .unwrap();
        assert!(copied.is_empty());
    }
}
