// camchain_est/src/config.rs

//! Loads sensor configuration, parameter snapshots and calibration samples
//! from TOML files on disk.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use camchain_core::prelude::{CalibrationSample, ParameterSnapshot, SensorConfigDescriptor};

use crate::error::{EstError, Result};

/// Environment variables with this prefix override file settings.
pub const ENV_PREFIX: &str = "CAMCHAIN_";

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # EstimationConfig
/// The root of an `estimation.toml` file: which cameras may appear in a
/// sample and where the run's inputs live.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EstimationConfig {
    /// The TOML has `[[sensors]]`, which becomes a Vec of descriptors.
    #[serde(default)]
    pub sensors: Vec<SensorConfigDescriptor>,
    /// Directory holding one `*.toml` file per calibration sample.
    #[serde(default)]
    pub samples_dir: Option<PathBuf>,
    /// Initial parameter snapshot.
    #[serde(default)]
    pub snapshot_file: Option<PathBuf>,
}

/// `Toml::file` quietly yields nothing for a missing file, so check first.
fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(EstError::MissingFile(path.to_path_buf()));
    }
    Ok(())
}

/// Reads `path`, then applies `CAMCHAIN_SAMPLES_DIR` / `CAMCHAIN_SNAPSHOT_FILE`
/// overrides from the environment.
pub fn load_config(path: &Path) -> Result<EstimationConfig> {
    require_file(path)?;
    info!("Loading estimation config from: {:?}", path);
    let config: EstimationConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).only(&["samples_dir", "snapshot_file"]))
        .extract()?;
    info!("Loaded {} sensor configurations", config.sensors.len());
    Ok(config)
}

pub fn load_snapshot(path: &Path) -> Result<ParameterSnapshot> {
    require_file(path)?;
    info!("Loading parameter snapshot from: {:?}", path);
    Ok(Figment::new().merge(Toml::file(path)).extract()?)
}

/// Parses every `*.toml` file under `dir` into a sample, in path order.
///
/// A file that fails to parse aborts the load; silently dropping a sample
/// would change the problem being solved.
pub fn load_samples_from_dir(dir: &Path) -> Result<Vec<CalibrationSample>> {
    if !dir.is_dir() {
        return Err(EstError::MissingSampleDir(dir.to_path_buf()));
    }
    info!("Loading calibration samples from: {:?}", dir);

    let mut samples = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_dir() || path.extension().map_or(true, |ext| ext != "toml") {
            continue;
        }

        let sample: CalibrationSample = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(|source| EstError::Sample {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            "Loaded sample {:?} ({} cameras, {} chains)",
            path,
            sample.cameras.len(),
            sample.chains.len()
        );
        samples.push(sample);
    }

    info!("Loaded {} calibration samples", samples.len());
    Ok(samples)
}
