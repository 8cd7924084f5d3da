//! Unified error types for the copyup workspace.
//!
//! Every variant carries the path(s) involved and the underlying OS error so
//! a caller can log precisely what failed and decide whether a partial result
//! is acceptable.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Mount operation attempted when a [`CopyUpError::MountFailed`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountOp {
    /// Recursive bind mount (`MS_BIND | MS_REC`).
    Bind,
    /// Fresh tmpfs mounted over a directory.
    Tmpfs,
    /// Atomic relocation of an existing mount (`MS_MOVE`).
    Move,
    /// Lazy unmount (`MNT_DETACH`).
    Detach,
}

impl fmt::Display for MountOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => write!(f, "bind mount"),
            Self::Tmpfs => write!(f, "tmpfs mount"),
            Self::Move => write!(f, "mount move"),
            Self::Detach => write!(f, "detach"),
        }
    }
}

/// Error raised while copying up a single target directory.
#[derive(Debug, Error)]
pub enum CopyUpError {
    /// The target cannot be copied up (the staging parent itself, or a
    /// relative path).
    #[error("{path} cannot be copied up: {reason}")]
    InvalidTarget {
        /// Rejected target directory.
        path: PathBuf,
        /// Why the target was rejected.
        reason: &'static str,
    },

    /// The per-call staging directory could not be created.
    #[error("creating staging directory under {parent}: {source}")]
    StagingCreateFailed {
        /// Parent the staging directory was to be created in.
        parent: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A bind, tmpfs, move or detach mount operation failed.
    #[error("{op} of {source_path} on {target} failed: {source}")]
    MountFailed {
        /// Mount operation attempted.
        op: MountOp,
        /// Mount source (the filesystem type for tmpfs).
        source_path: PathBuf,
        /// Mount target.
        target: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The hidden shadow directory could not be created inside a target.
    #[error("creating shadow directory under {dir}: {source}")]
    ShadowCreateFailed {
        /// Target directory the shadow was to be created in.
        dir: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A directory listing failed.
    #[error("reading directory {path}: {source}")]
    ReadDirFailed {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A regular file could not be duplicated into a shadow copy.
    ///
    /// This is the only kind handled locally: the file is left out and the
    /// directory is still processed.
    #[error("copying file {from} to {to}: {source}")]
    FileCopyFailed {
        /// Original file.
        from: PathBuf,
        /// Destination inside the shadow copy.
        to: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A symlink could not be created.
    #[error("symlinking {link} to {target}: {source}")]
    SymlinkFailed {
        /// Content of the link.
        target: PathBuf,
        /// Path of the link being created.
        link: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An existing symlink could not be read.
    #[error("reading link {path}: {source}")]
    ReadlinkFailed {
        /// Symlink being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A stale entry in a target directory could not be removed.
    #[error("removing {path}: {source}")]
    RemoveFailed {
        /// Entry being removed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration document is malformed.
    #[error("invalid configuration: {source}")]
    Config {
        /// Underlying deserialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CopyUpError {
    /// Returns whether this kind is handled locally without aborting the
    /// directory being processed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::FileCopyFailed { .. })
    }
}

/// Failure of a multi-directory copy-up, paired with the progress made
/// before it.
#[derive(Debug, Error)]
#[error("copy-up of {} stopped after {} completed directories: {source}", .dir.display(), .copied.len())]
pub struct PartialCopyUp {
    /// Directories fully processed before the failure, in input order.
    pub copied: Vec<PathBuf>,
    /// Requested directory being processed when the error occurred.
    pub dir: PathBuf,
    /// Error that halted processing.
    pub source: CopyUpError,
}

impl PartialCopyUp {
    /// Pairs the directories completed so far with the directory that
    /// failed and the halting error.
    #[must_use]
    pub const fn new(copied: Vec<PathBuf>, dir: PathBuf, source: CopyUpError) -> Self {
        Self {
            copied,
            dir,
            source,
        }
    }
}

/// Convenience alias for single-step operations.
pub type Result<T> = std::result::Result<T, CopyUpError>;

/// Outcome of a copy-up call: every directory on success, or the completed
/// prefix together with the error.
pub type CopyUpResult = std::result::Result<Vec<PathBuf>, PartialCopyUp>;
