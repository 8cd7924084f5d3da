//! Rebuilds a target directory's top level as symlinks into its shadow.

use std::path::{Path, PathBuf};

use copyup_common::error::{CopyUpError, Result};
use copyup_common::types::{EntryKind, ExclusionSet};

use crate::filesystem::entries::read_entries;

/// Creates `dir/<name>` for every entry of `shadow` whose destination path
/// is not in `exclusions`, returning the number of links created.
///
/// A symlink in the shadow is reproduced with its target verbatim; any
/// other entry is linked as `<shadow name>/<name>`, relative to `dir`.
/// Whatever already sits at `dir/<name>` is removed first: mounting a fresh
/// tmpfs can make `mount(8)` create `/etc/mtab` behind our back.
///
/// # Errors
///
/// Returns the first listing, readlink, removal or symlink failure; nothing
/// is rolled back.
pub fn link_shadow_entries(shadow: &Path, dir: &Path, exclusions: &ExclusionSet) -> Result<usize> {
    let shadow_name = Path::new(shadow.file_name().unwrap_or(shadow.as_os_str()));
    let mut linked = 0;

    for entry in read_entries(shadow)? {
        let link = dir.join(&entry.name);
        if exclusions.contains(&link) {
            tracing::debug!(path = %link.display(), "excluded from copy-up");
            continue;
        }

        let target = if entry.kind == EntryKind::Symlink {
            let original = shadow.join(&entry.name);
            std::fs::read_link(&original).map_err(|e| CopyUpError::ReadlinkFailed {
                path: original,
                source: e,
            })?
        } else {
            shadow_name.join(&entry.name)
        };

        remove_existing(&link)?;
        std::os::unix::fs::symlink(&target, &link).map_err(|e| CopyUpError::SymlinkFailed {
            target: target.clone(),
            link: link.clone(),
            source: e,
        })?;
        tracing::trace!(link = %link.display(), target = %target.display(), "symlinked");
        linked += 1;
    }

    Ok(linked)
}

/// Removes `path` whatever it is; a missing entry is not an error.
fn remove_existing(path: &Path) -> Result<()> {
    let removed = match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    removed.map_err(|e| CopyUpError::RemoveFailed {
        path: PathBuf::from(path),
        source: e,
    })
}
