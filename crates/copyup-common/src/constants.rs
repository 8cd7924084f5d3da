//! System-wide constants and default paths.

/// Default parent directory for staging mounts.
///
/// Kept outside any state directory so that directories such as `/run` can
/// themselves be copied up.
pub const DEFAULT_STAGING_PARENT: &str = "/tmp";

/// Name prefix of the per-call staging directory.
pub const STAGING_PREFIX: &str = "copyup-b";

/// Name prefix of the hidden shadow directory created inside each target.
pub const SHADOW_PREFIX: &str = ".ro";

/// Filesystem type used to hide a target directory.
pub const TMPFS_FSTYPE: &str = "tmpfs";

/// Permission bits of the staging directory.
pub const STAGING_DIR_MODE: u32 = 0o700;

/// Permission bits of shadow directories and of the directories that
/// receive bind-mounted subtrees.
pub const SHADOW_DIR_MODE: u32 = 0o755;
