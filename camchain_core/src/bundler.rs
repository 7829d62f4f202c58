// camchain_core/src/bundler.rs

use tracing::{debug, warn};

use crate::config::SensorConfigDescriptor;
use crate::error::{CalibError, Result};
use crate::messages::CalibrationSample;
use crate::models::measurement::camera_chain::CameraChainSensor;
use crate::models::Capabilities;

/// Turns one calibration sample into the camera-chain sensors it actually contains.
#[derive(Debug, Clone)]
pub struct CameraChainBundler {
    valid_configs: Vec<SensorConfigDescriptor>,
    capabilities: Capabilities,
}

impl CameraChainBundler {
    pub fn new(valid_configs: Vec<SensorConfigDescriptor>, capabilities: Capabilities) -> Self {
        Self {
            valid_configs,
            capabilities,
        }
    }

    /// Builds one sensor per configuration whose camera appears in `sample`.
    ///
    /// Cameras missing from the sample are skipped. A camera that is present
    /// but whose configured chain is not fails the whole sample with
    /// `UnknownChainReference`; a chain reading whose joint count differs from
    /// the descriptor's `dh_link_num` fails it with `InvalidJointCount`.
    pub fn build_blocks(&self, sample: &CalibrationSample) -> Result<Vec<CameraChainSensor>> {
        let mut sensors = Vec::new();

        for config in &self.valid_configs {
            let Some(camera_reading) = sample.camera(&config.camera_id) else {
                debug!(camera_id = %config.camera_id, "camera not present in sample, skipping");
                continue;
            };

            let chain_reading = match &config.chain.chain_id {
                Some(chain_id) => match sample.chain(chain_id) {
                    Some(reading) => Some(reading.clone()),
                    None => {
                        warn!(
                            camera_id = %config.camera_id,
                            chain_id = %chain_id,
                            "chain reading missing from sample"
                        );
                        return Err(CalibError::UnknownChainReference {
                            camera_id: config.camera_id.clone(),
                            chain_id: chain_id.clone(),
                        })
                    }
                },
                None => None,
            };

            sensors.push(CameraChainSensor::new(
                config.clone(),
                camera_reading.clone(),
                chain_reading,
                self.capabilities.clone(),
            )?);
        }

        Ok(sensors)
    }
}
