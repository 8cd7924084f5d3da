//! Directory enumeration with type classification.

use std::ffi::OsString;
use std::path::Path;

use copyup_common::error::{CopyUpError, Result};
use copyup_common::types::EntryKind;

/// Name and type of a single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// Entry name, relative to the listed directory.
    pub name: OsString,
    /// Entry type; symlinks are reported as such, never followed.
    pub kind: EntryKind,
}

/// Lists the entries of `dir` sorted by name.
///
/// # Errors
///
/// Returns [`CopyUpError::ReadDirFailed`] if the directory or any of its
/// entries cannot be read.
pub fn read_entries(dir: &Path) -> Result<Vec<EntryDescriptor>> {
    let read_dir_failed = |source| CopyUpError::ReadDirFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_failed)? {
        let entry = entry.map_err(read_dir_failed)?;
        let kind = EntryKind::from(entry.file_type().map_err(read_dir_failed)?);
        entries.push(EntryDescriptor {
            name: entry.file_name(),
            kind,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
