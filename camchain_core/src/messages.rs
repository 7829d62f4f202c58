// camchain_core/src/messages.rs

use nalgebra::Matrix3x4;
use serde::{Deserialize, Serialize};

use crate::types::Pixel;
use crate::utils::serde_helpers;

// =========================================================================
// == Per-Sensor Readings ==
// =========================================================================

/// Target detections from one camera at the moment of capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraReading {
    pub camera_id: String,
    /// Detected target features, ordered to match the target point set.
    #[serde(with = "serde_helpers::points2_from_pairs")]
    pub image_points: Vec<Pixel>,
    /// The rectified 3x4 projection matrix `P` reported alongside the image.
    #[serde(with = "serde_helpers::matrix3x4_from_rows")]
    pub projection: Matrix3x4<f64>,
}

/// Joint positions of one kinematic chain at the moment of capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainReading {
    pub chain_id: String,
    pub joint_positions: Vec<f64>,
}

// =========================================================================
// == Calibration Sample ==
// =========================================================================

/// One synchronized capture event. Immutable once recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationSample {
    #[serde(default)]
    pub cameras: Vec<CameraReading>,
    #[serde(default)]
    pub chains: Vec<ChainReading>,
}

impl CalibrationSample {
    pub fn camera(&self, camera_id: &str) -> Option<&CameraReading> {
        self.cameras.iter().find(|c| c.camera_id == camera_id)
    }

    pub fn chain(&self, chain_id: &str) -> Option<&ChainReading> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }
}
