//! Mount primitives available to an unprivileged process inside its own
//! user and mount namespaces.
//!
//! Every wrapper reports failures as [`CopyUpError::MountFailed`] carrying
//! the operation, both paths and the OS error.

use std::path::Path;

use copyup_common::error::{CopyUpError, MountOp, Result};

#[cfg(target_os = "linux")]
fn mount_failed(op: MountOp, source: &Path, target: &Path, errno: nix::errno::Errno) -> CopyUpError {
    CopyUpError::MountFailed {
        op,
        source_path: source.to_path_buf(),
        target: target.to_path_buf(),
        source: std::io::Error::from(errno),
    }
}

/// Recursively bind-mounts `source` onto `target`, including any mounts
/// nested below `source`.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn bind_mount_recursive(source: &Path, target: &Path) -> Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        Some(source),
        target,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| mount_failed(MountOp::Bind, source, target, e))?;
    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        "created recursive bind mount"
    );
    Ok(())
}

/// Mounts a fresh, empty tmpfs over `target`, hiding its previous content.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_tmpfs(target: &Path) -> Result<()> {
    use copyup_common::constants::TMPFS_FSTYPE;
    use nix::mount::{MsFlags, mount};

    mount(
        Some(TMPFS_FSTYPE),
        target,
        Some(TMPFS_FSTYPE),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| mount_failed(MountOp::Tmpfs, Path::new(TMPFS_FSTYPE), target, e))?;
    tracing::debug!(target = %target.display(), "mounted tmpfs");
    Ok(())
}

/// Atomically relocates the mount at `source` to `target`, together with
/// every mount nested below it.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails, for example when
/// `source` is not a mount point or its parent mount is shared.
#[cfg(target_os = "linux")]
pub fn move_mount(source: &Path, target: &Path) -> Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        Some(source),
        target,
        None::<&str>,
        MsFlags::MS_MOVE,
        None::<&str>,
    )
    .map_err(|e| mount_failed(MountOp::Move, source, target, e))?;
    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        "moved mount"
    );
    Ok(())
}

/// Lazily detaches the mount at `target` and everything below it.
///
/// # Errors
///
/// Returns an error if the `umount2(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn detach_mount(target: &Path) -> Result<()> {
    use nix::mount::{MntFlags, umount2};

    umount2(target, MntFlags::MNT_DETACH)
        .map_err(|e| mount_failed(MountOp::Detach, target, target, e))?;
    tracing::debug!(target = %target.display(), "detached mount");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn unsupported(op: MountOp, source: &Path, target: &Path) -> CopyUpError {
    CopyUpError::MountFailed {
        op,
        source_path: source.to_path_buf(),
        target: target.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Linux required for mount operations",
        ),
    }
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: bind mounts require Linux.
#[cfg(not(target_os = "linux"))]
pub fn bind_mount_recursive(source: &Path, target: &Path) -> Result<()> {
    Err(unsupported(MountOp::Bind, source, target))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: tmpfs mounts require Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_tmpfs(target: &Path) -> Result<()> {
    Err(unsupported(MountOp::Tmpfs, Path::new("tmpfs"), target))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: mount moves require Linux.
#[cfg(not(target_os = "linux"))]
pub fn move_mount(source: &Path, target: &Path) -> Result<()> {
    Err(unsupported(MountOp::Move, source, target))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: unmounting requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn detach_mount(target: &Path) -> Result<()> {
    Err(unsupported(MountOp::Detach, target, target))
}
