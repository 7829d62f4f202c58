// camchain_core/src/models/measurement/camera_chain.rs

//! A camera observing the calibration target from the end of a (possibly
//! absent) kinematic chain:
//!
//! ```text
//!       before_chain -- chain(joints) -- after_chain -- camera
//!      /
//!   root
//!      \
//!       target
//! ```

use nalgebra::{DMatrix, Isometry3};
use tracing::debug;

use crate::config::SensorConfigDescriptor;
use crate::error::{CalibError, Result};
use crate::estimation::sparsity::SparsityMap;
use crate::estimation::uncertainty::{
    block_information_sqrt, camera_covariance, chain_covariance, joint_sensitivity,
    FINITE_DIFFERENCE_STEP,
};
use crate::messages::{CameraReading, ChainReading};
use crate::models::measurement::SensorModel;
use crate::models::Capabilities;
use crate::params::{CameraParams, ChainParams, ParameterSnapshot};
use crate::types::{flatten_pixels, Covariance, Pixel, PixelVector, TargetPoint, TERMS_PER_POINT};
use crate::utils::geometry::compose;

/// Whether the camera rides on an articulated chain. Fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainBinding {
    ChainBearing(ChainReading),
    CameraOnly,
}

/// A chain reading paired with the chain parameters it was bound to.
#[derive(Debug, Clone)]
struct BoundChain {
    chain_id: String,
    params: ChainParams,
    joint_positions: Vec<f64>,
}

/// Sub-parameters copied out of one snapshot by `rebind`.
#[derive(Debug, Clone)]
struct BoundParams {
    camera: CameraParams,
    /// All `before_chain` transforms, composed.
    before: Isometry3<f64>,
    /// All `after_chain` transforms, composed.
    after: Isometry3<f64>,
    /// `Some` exactly when the sensor is `ChainBearing`.
    chain: Option<BoundChain>,
}

impl BoundParams {
    fn joint_positions(&self) -> &[f64] {
        match &self.chain {
            Some(chain) => chain.joint_positions.as_slice(),
            None => &[],
        }
    }
}

#[derive(Debug, Clone)]
enum BindState {
    Unbound,
    Bound(BoundParams),
}

/// The measurement model for one camera in one calibration sample.
#[derive(Debug, Clone)]
pub struct CameraChainSensor {
    config: SensorConfigDescriptor,
    camera_reading: CameraReading,
    chain: ChainBinding,
    capabilities: Capabilities,
    state: BindState,
}

impl CameraChainSensor {
    pub const SENSOR_TYPE: &'static str = "camera";

    /// Builds an unbound sensor.
    ///
    /// The chain reading must be present exactly when the descriptor names a
    /// chain, carry that chain's id, and hold `dh_link_num` joint positions.
    pub fn new(
        config: SensorConfigDescriptor,
        camera_reading: CameraReading,
        chain_reading: Option<ChainReading>,
        capabilities: Capabilities,
    ) -> Result<Self> {
        let chain = match (&config.chain.chain_id, chain_reading) {
            (Some(chain_id), Some(reading)) if *chain_id == reading.chain_id => {
                if reading.joint_positions.len() != config.chain.dh_link_num {
                    return Err(CalibError::InvalidJointCount {
                        chain_id: reading.chain_id,
                        expected: config.chain.dh_link_num,
                        found: reading.joint_positions.len(),
                    });
                }
                ChainBinding::ChainBearing(reading)
            }
            (None, None) => ChainBinding::CameraOnly,
            (Some(chain_id), _) => {
                return Err(CalibError::UnknownChainReference {
                    camera_id: config.camera_id.clone(),
                    chain_id: chain_id.clone(),
                })
            }
            (None, Some(reading)) => {
                return Err(CalibError::UnknownChainReference {
                    camera_id: config.camera_id.clone(),
                    chain_id: reading.chain_id,
                })
            }
        };
        Ok(Self {
            config,
            camera_reading,
            chain,
            capabilities,
            state: BindState::Unbound,
        })
    }

    pub fn config(&self) -> &SensorConfigDescriptor {
        &self.config
    }

    pub fn chain_binding(&self) -> &ChainBinding {
        &self.chain
    }

    pub fn num_points(&self) -> usize {
        self.camera_reading.image_points.len()
    }

    fn bound(&self) -> Result<&BoundParams> {
        match &self.state {
            BindState::Bound(params) => Ok(params),
            BindState::Unbound => Err(CalibError::NotBound {
                sensor_id: self.sensor_id().to_string(),
            }),
        }
    }

    fn check_point_count(&self, target_pts: &[TargetPoint]) -> Result<()> {
        if target_pts.len() != self.num_points() {
            return Err(CalibError::DimensionMismatch {
                expected: self.num_points(),
                found: target_pts.len(),
            });
        }
        Ok(())
    }

    /// The detected pixels, flattened to `[u1, v1, ..., uN, vN]`.
    pub fn observed(&self) -> PixelVector {
        flatten_pixels(&self.camera_reading.image_points)
    }

    /// Where the current parameters predict each target point lands in the image.
    pub fn expected(&self, target_pts: &[TargetPoint]) -> Result<Vec<Pixel>> {
        let params = self.bound()?;
        self.expected_at(params, params.joint_positions(), target_pts)
    }

    /// Predicts pixels with the chain at `joint_positions` (ignored when the
    /// sensor has no chain).
    fn expected_at(
        &self,
        params: &BoundParams,
        joint_positions: &[f64],
        target_pts: &[TargetPoint],
    ) -> Result<Vec<Pixel>> {
        let chain_pose = match &params.chain {
            Some(chain) => {
                self.capabilities
                    .kinematics
                    .pose(&chain.chain_id, &chain.params, joint_positions)?
            }
            None => Isometry3::identity(),
        };
        let camera_pose_root = compose([&params.before, &chain_pose, &params.after]);
        let root_to_camera = camera_pose_root.inverse();

        let cam_frame_pts: Vec<TargetPoint> =
            target_pts.iter().map(|p| root_to_camera * p).collect();
        let pixels = self.capabilities.projection.project(
            &self.camera_reading.projection,
            &params.camera,
            &cam_frame_pts,
        )?;

        if pixels.len() != target_pts.len() {
            return Err(CalibError::DimensionMismatch {
                expected: target_pts.len(),
                found: pixels.len(),
            });
        }
        Ok(pixels)
    }

    /// The block-diagonal whitening operator for the current parameters.
    pub fn gamma_sqrt(&self, target_pts: &[TargetPoint]) -> Result<DMatrix<f64>> {
        block_information_sqrt(&self.covariance(target_pts)?)
    }

    /// How moving each target point in Cartesian space moves its predicted pixel.
    ///
    /// Returns a `2N x 3N` block-diagonal matrix with one 2x3 block per point.
    pub fn expected_target_jacobian(&self, target_pts: &[TargetPoint]) -> Result<DMatrix<f64>> {
        let params = self.bound()?;
        let joints = params.joint_positions();

        let n = target_pts.len();
        let mut jac = DMatrix::zeros(n * TERMS_PER_POINT, n * 3);
        for (k, point) in target_pts.iter().enumerate() {
            let f0 = flatten_pixels(&self.expected_at(params, joints, &[*point])?);
            for axis in 0..3 {
                let mut perturbed = *point;
                perturbed[axis] += FINITE_DIFFERENCE_STEP;
                let f_test = flatten_pixels(&self.expected_at(params, joints, &[perturbed])?);
                let column = (f_test - &f0) / FINITE_DIFFERENCE_STEP;
                jac.fixed_view_mut::<2, 1>(k * TERMS_PER_POINT, k * 3 + axis)
                    .copy_from(&column.fixed_rows::<2>(0));
            }
        }
        Ok(jac)
    }
}

impl SensorModel for CameraChainSensor {
    fn sensor_type(&self) -> &'static str {
        Self::SENSOR_TYPE
    }

    fn sensor_id(&self) -> &str {
        self.config.sensor_id()
    }

    fn terms_per_sample(&self) -> usize {
        TERMS_PER_POINT
    }

    fn rebind(&mut self, snapshot: &ParameterSnapshot) -> Result<()> {
        self.state = BindState::Unbound;

        let camera = snapshot.camera(&self.config.camera_id)?.clone();
        let before = self
            .config
            .chain
            .before_chain
            .iter()
            .map(|name| snapshot.transform(name))
            .collect::<Result<Vec<_>>>()?;
        let after = self
            .config
            .chain
            .after_chain
            .iter()
            .map(|name| snapshot.transform(name))
            .collect::<Result<Vec<_>>>()?;
        let chain = match &self.chain {
            ChainBinding::ChainBearing(reading) => Some(BoundChain {
                chain_id: reading.chain_id.clone(),
                params: snapshot.chain(&reading.chain_id)?.clone(),
                joint_positions: reading.joint_positions.clone(),
            }),
            ChainBinding::CameraOnly => None,
        };

        debug!(sensor_id = self.sensor_id(), "rebound to parameter snapshot");
        self.state = BindState::Bound(BoundParams {
            camera,
            before: compose(&before),
            after: compose(&after),
            chain,
        });
        Ok(())
    }

    fn is_bound(&self) -> bool {
        matches!(self.state, BindState::Bound(_))
    }

    fn residual_length(&self) -> usize {
        self.num_points() * TERMS_PER_POINT
    }

    fn residual(&self, target_pts: &[TargetPoint]) -> Result<PixelVector> {
        self.bound()?;
        self.check_point_count(target_pts)?;
        let h = flatten_pixels(&self.expected(target_pts)?);
        Ok(h - self.observed())
    }

    fn residual_scaled(&self, target_pts: &[TargetPoint]) -> Result<PixelVector> {
        let r = self.residual(target_pts)?;
        let gamma_sqrt = self.gamma_sqrt(target_pts)?;
        Ok(gamma_sqrt * r)
    }

    fn covariance(&self, target_pts: &[TargetPoint]) -> Result<Covariance> {
        let params = self.bound()?;
        self.check_point_count(target_pts)?;

        let cam_cov = camera_covariance(
            self.num_points(),
            params.camera.variance_u(),
            params.camera.variance_v(),
        );

        match &params.chain {
            Some(chain) => {
                let joints = &chain.joint_positions;
                let variances = chain.params.joint_variances();
                if variances.len() != joints.len() {
                    return Err(CalibError::InvalidJointCount {
                        chain_id: chain.chain_id.clone(),
                        expected: joints.len(),
                        found: variances.len(),
                    });
                }

                // Jacobian from the chain's joint angles to pixel coordinates.
                let jt = joint_sensitivity(joints, |q| {
                    Ok(flatten_pixels(&self.expected_at(params, q, target_pts)?))
                })?;
                Ok(chain_covariance(&jt, &variances) + cam_cov)
            }
            None => Ok(cam_cov),
        }
    }

    fn sparsity(&self) -> SparsityMap {
        let chain_present = matches!(self.chain, ChainBinding::ChainBearing(_));
        SparsityMap::report(
            &self.config,
            chain_present,
            &self.capabilities.projection.param_names(),
        )
    }
}
