// camchain_est/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures at the driver boundary: reading configuration and samples from
/// disk, or writing reports back out.
#[derive(Debug, Error)]
pub enum EstError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to parse calibration sample {path:?}: {source}")]
    Sample {
        path: PathBuf,
        #[source]
        source: figment::Error,
    },

    #[error("configuration file {0:?} does not exist")]
    MissingFile(PathBuf),

    #[error("configuration does not set `{0}`")]
    MissingSetting(&'static str),

    #[error("sample directory {0:?} does not exist")]
    MissingSampleDir(PathBuf),

    #[error("failed to walk sample directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EstError>;
