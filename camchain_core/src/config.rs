// camchain_core/src/config.rs

//! Static sensor descriptions. These are loaded once by the caller and never
//! mutated while models built from them are alive.

use serde::{Deserialize, Serialize};

/// The fixed and articulated path from the root frame to a camera:
///
/// ```text
///   root -- before_chain -- chain(joints) -- after_chain -- camera
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainDescriptor {
    /// Named fixed transforms applied before the articulated chain.
    #[serde(default)]
    pub before_chain: Vec<String>,
    /// The articulated chain, if the camera rides on one.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// Named fixed transforms applied after the articulated chain.
    #[serde(default)]
    pub after_chain: Vec<String>,
    /// Number of links in the chain's geometry table.
    #[serde(default)]
    pub dh_link_num: usize,
}

/// Describes one camera that may appear in a calibration sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfigDescriptor {
    pub camera_id: String,
    /// Identifier reported for the sensor; falls back to `camera_id`.
    #[serde(default)]
    pub sensor_id: Option<String>,
    #[serde(default)]
    pub chain: ChainDescriptor,
}

impl SensorConfigDescriptor {
    /// A camera with no fixed transforms and no chain.
    pub fn camera_only(camera_id: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            sensor_id: None,
            chain: ChainDescriptor::default(),
        }
    }

    pub fn sensor_id(&self) -> &str {
        self.sensor_id.as_deref().unwrap_or(&self.camera_id)
    }

    /// Every fixed transform name, before-chain first.
    pub fn transform_names(&self) -> impl Iterator<Item = &str> {
        self.chain
            .before_chain
            .iter()
            .chain(self.chain.after_chain.iter())
            .map(String::as_str)
    }
}
