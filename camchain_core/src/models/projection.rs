// camchain_core/src/models/projection.rs

use nalgebra::Matrix3x4;
use std::fmt::Debug;

use crate::error::Result;
use crate::params::CameraParams;
use crate::types::{Pixel, TargetPoint};

// --- PROJECTION CAPABILITY ---
// Maps points in the camera frame to pixels. `z = project(P, intrinsics, X)`
pub trait Projection: Debug + Send + Sync {
    /// Projects camera-frame points to pixels, one pixel per input point, in order.
    fn project(
        &self,
        projection: &Matrix3x4<f64>,
        camera: &CameraParams,
        points: &[TargetPoint],
    ) -> Result<Vec<Pixel>>;

    /// Names of the intrinsic parameters this camera model is sensitive to.
    fn param_names(&self) -> Vec<String> {
        CameraParams::PARAM_NAMES
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}
