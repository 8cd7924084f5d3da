//! Declarative copy-up configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{DriverKind, ExclusionSet};

/// Which driver to run, over which directories, excluding which entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CopyUpConfig {
    /// Copy-up strategy.
    pub driver: DriverKind,
    /// Target directories, processed in order.
    pub dirs: Vec<PathBuf>,
    /// Entries omitted from the rebuilt directories.
    pub exclusions: ExclusionSet,
    /// Directory under which the per-call staging directory is created.
    pub staging_parent: PathBuf,
}

impl Default for CopyUpConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::default(),
            dirs: Vec::new(),
            exclusions: ExclusionSet::new(),
            staging_parent: PathBuf::from(crate::constants::DEFAULT_STAGING_PARENT),
        }
    }
}

impl CopyUpConfig {
    /// Parses a JSON configuration document. Missing fields take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CopyUpError::Config`] if the document is not
    /// valid JSON, names an unknown driver or carries an unknown field.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}
