//! Run manifest for mavl-stress output.
//!
//! A JSON record of everything needed to replay a run: the seed, the profile
//! name and the effective settings after command-line overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StressError};
use crate::profile::Profile;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub seed: u64,
    /// Profile name or path as given on the command line.
    pub profile: String,
    /// Effective settings, including `--maxdim`.
    pub settings: Profile,
    pub generator_version: String,
}

impl Manifest {
    pub fn new(seed: u64, profile: impl Into<String>, settings: &Profile) -> Self {
        Self {
            seed,
            profile: profile.into(),
            settings: settings.clone(),
            generator_version: VERSION.to_string(),
        }
    }

    /// Write the manifest as pretty-printed JSON to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| StressError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
