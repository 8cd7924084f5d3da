//! # copyup-core
//!
//! Copy-up of host directories for unprivileged sandboxes.
//!
//! Inside its own user and mount namespaces a process cannot mount an
//! overlay, but it can bind-mount, mount tmpfs, move mounts and create
//! symlinks. This crate combines those primitives to replace what a
//! directory such as `/etc` shows with a writable, process-local view whose
//! top-level entries still lead to the original content:
//!
//! - **Drivers**: [`driver::TmpfsSymlinkDriver`] relocates the original mount
//!   into a hidden shadow; [`driver::ExclusiveBindMountDriver`] rebuilds the
//!   shadow from bind-mounted subdirectories and copied files.
//! - **Staging**: the per-call staging directory and per-target shadow
//!   directories.
//! - **Filesystem**: `mount(2)` wrappers and typed directory listing.
//!
//! The caller is expected to have unshared its mount namespace already; the
//! drivers never create namespaces themselves.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod driver;
pub mod filesystem;
pub mod staging;

pub use driver::{
    CopyUpDriver, ExclusiveBindMountDriver, TmpfsSymlinkDriver, copy_up_from_config, new_driver,
};
