// camchain_core/src/params.rs

use nalgebra::{Isometry3, Vector6};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CalibError, ParamKind, Result};
use crate::utils::geometry::isometry_from_params;

/// Geometry and noise for one articulated chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainParams {
    /// One `[theta, alpha, a, d]` row per link.
    pub dh: Vec<[f64; 4]>,
    /// Joint-to-actuator scale per link.
    pub gearing: Vec<f64>,
    /// Standard deviation of each joint angle reading, in radians.
    pub joint_angle_std: Vec<f64>,
}

impl ChainParams {
    pub fn num_links(&self) -> usize {
        self.dh.len()
    }

    /// Per-joint variances (rad^2) used for uncertainty propagation.
    pub fn joint_variances(&self) -> Vec<f64> {
        self.joint_angle_std.iter().map(|s| s * s).collect()
    }
}

/// Intrinsic corrections and pixel noise for one rectified camera.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraParams {
    #[serde(default)]
    pub baseline_shift: f64,
    #[serde(default)]
    pub f_shift: f64,
    #[serde(default)]
    pub cx_shift: f64,
    #[serde(default)]
    pub cy_shift: f64,
    /// Pixel noise standard deviation along `(u, v)`.
    pub noise_std: [f64; 2],
}

impl CameraParams {
    pub const PARAM_NAMES: [&'static str; 4] = ["baseline_shift", "f_shift", "cx_shift", "cy_shift"];

    pub fn variance_u(&self) -> f64 {
        self.noise_std[0] * self.noise_std[0]
    }

    pub fn variance_v(&self) -> f64 {
        self.noise_std[1] * self.noise_std[1]
    }
}

/// The optimizer's current hypothesis of every calibrated quantity.
///
/// Models never keep a snapshot beyond one evaluation cycle: each rebind
/// copies out only the sub-parameters the model needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSnapshot {
    /// 6-DOF corrections `[x, y, z, rx, ry, rz]`, keyed by transform name.
    #[serde(default)]
    pub transforms: BTreeMap<String, [f64; 6]>,
    #[serde(default)]
    pub chains: BTreeMap<String, ChainParams>,
    #[serde(default)]
    pub cameras: BTreeMap<String, CameraParams>,
}

impl ParameterSnapshot {
    pub fn transform(&self, id: &str) -> Result<Isometry3<f64>> {
        self.transforms
            .get(id)
            .map(|p| isometry_from_params(&Vector6::from_column_slice(p)))
            .ok_or_else(|| unknown(ParamKind::Transform, id))
    }

    pub fn chain(&self, id: &str) -> Result<&ChainParams> {
        self.chains
            .get(id)
            .ok_or_else(|| unknown(ParamKind::Chain, id))
    }

    pub fn camera(&self, id: &str) -> Result<&CameraParams> {
        self.cameras
            .get(id)
            .ok_or_else(|| unknown(ParamKind::Camera, id))
    }
}

fn unknown(kind: ParamKind, id: &str) -> CalibError {
    CalibError::UnknownParameterId {
        kind,
        id: id.to_string(),
    }
}
