//! Errors raised at the configuration and I/O boundary.
//!
//! Generation itself cannot fail; everything here comes from loading a
//! profile or writing results.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StressError {
    #[error("unknown profile '{name}', available profiles: {}", available.join(", "))]
    UnknownProfile {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("failed to read profile file '{}'", path.display())]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile '{name}'")]
    ProfileParse {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid profile '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("failed to write '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize run manifest")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T, E = StressError> = std::result::Result<T, E>;
