//! Filesystem primitives used by the copy-up drivers.
//!
//! Provides the mount operations an unprivileged process may perform inside
//! its own namespaces and directory enumeration with type classification.

pub mod entries;
pub mod mount;
