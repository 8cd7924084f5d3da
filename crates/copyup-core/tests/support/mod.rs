//! Helpers for running a test body inside a private user and mount
//! namespace.
//!
//! The body runs in a forked child so that the new namespace, and every
//! mount made in it, disappears when the child exits.

#![allow(unsafe_code, dead_code)]

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use nix::mount::{MntFlags, MsFlags, mount, umount2};
use nix::sched::{CloneFlags, unshare};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, fork, getgid, getuid};

/// Exit status of a child that could not enter a namespace.
const SKIPPED: i32 = 77;

/// Installs a test-writer subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Maps the invoking user and group to root inside the new user namespace.
/// `setgroups` must be denied before an unprivileged process may write the
/// GID map.
fn write_id_maps(uid: u32, gid: u32) -> std::io::Result<()> {
    if Path::new("/proc/self/setgroups").exists() {
        fs::write("/proc/self/setgroups", "deny")?;
    }
    fs::write("/proc/self/uid_map", format!("0 {uid} 1"))?;
    fs::write("/proc/self/gid_map", format!("0 {gid} 1"))?;
    Ok(())
}

fn enter_namespaces(uid: u32, gid: u32) -> Result<(), String> {
    match unshare(CloneFlags::CLONE_NEWUSER | CloneFlags::CLONE_NEWNS) {
        Ok(()) => write_id_maps(uid, gid).map_err(|e| format!("writing id maps: {e}"))?,
        // Privileged hosts that forbid user namespaces may still allow this.
        Err(_) => unshare(CloneFlags::CLONE_NEWNS).map_err(|e| format!("unshare: {e}"))?,
    }
    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| format!("making / private: {e}"))?;

    // LSMs may let the unshare through and still deny mounting.
    let probe = tempfile::tempdir().map_err(|e| format!("probe dir: {e}"))?;
    mount(
        Some("tmpfs"),
        probe.path(),
        Some("tmpfs"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| format!("probe tmpfs: {e}"))?;
    umount2(probe.path(), MntFlags::MNT_DETACH).map_err(|e| format!("probe umount: {e}"))
}

/// Runs `body` in a forked child that owns fresh user and mount namespaces.
///
/// Panics in `body` fail the calling test. When the host does not allow
/// the namespaces to be created, the test is reported as skipped and passes.
pub fn in_mount_namespace<F>(body: F)
where
    F: FnOnce(),
{
    let uid = getuid().as_raw();
    let gid = getgid().as_raw();

    // SAFETY: the child only runs the test body and then `_exit`s without
    // returning into the test harness.
    match unsafe { fork() }.expect("fork") {
        ForkResult::Child => {
            let code = match enter_namespaces(uid, gid) {
                Err(reason) => {
                    eprintln!("cannot enter mount namespace: {reason}");
                    SKIPPED
                }
                Ok(()) => i32::from(panic::catch_unwind(AssertUnwindSafe(body)).is_err()),
            };
            // SAFETY: terminates the forked child immediately.
            unsafe { libc::_exit(code) }
        }
        ForkResult::Parent { child } => match waitpid(child, None).expect("waitpid") {
            WaitStatus::Exited(_, 0) => {}
            WaitStatus::Exited(_, SKIPPED) => {
                eprintln!("skipped: unprivileged mount namespaces are unavailable");
            }
            status => panic!("namespaced test body failed: {status:?}"),
        },
    }
}
