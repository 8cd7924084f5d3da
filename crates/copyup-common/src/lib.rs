//! # copyup-common
//!
//! Shared error definitions, domain types, configuration model and
//! constants used across the copyup workspace.
//!
//! This crate is the leaf of the dependency graph: it performs no mount
//! operations itself and only describes what the drivers in `copyup-core`
//! consume and report.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
