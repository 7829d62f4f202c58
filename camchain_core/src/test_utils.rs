// camchain_core/src/test_utils.rs

//! Stand-in kinematics and projection capabilities plus fixture builders.
//!
//! Public so the workspace's other test suites can share them; not meant for
//! production use.

use nalgebra::{Isometry3, Matrix3x4, Point2, Translation3, UnitQuaternion, Vector3};
use std::sync::Arc;

use crate::error::{CalibError, Result};
use crate::models::kinematics::ForwardKinematics;
use crate::models::projection::Projection;
use crate::models::Capabilities;
use crate::params::{CameraParams, ChainParams, ParameterSnapshot};
use crate::types::{Pixel, TargetPoint};

fn check_joint_count(chain_id: &str, chain: &ChainParams, joints: &[f64]) -> Result<()> {
    if joints.len() != chain.num_links() {
        return Err(CalibError::InvalidJointCount {
            chain_id: chain_id.to_string(),
            expected: chain.num_links(),
            found: joints.len(),
        });
    }
    Ok(())
}

fn gearing(chain: &ChainParams, link: usize) -> f64 {
    chain.gearing.get(link).copied().unwrap_or(1.0)
}

/// Prismatic chain: joint `i` slides the tip along axis `i % 3` by `gearing_i * q_i`.
///
/// The pose is linear in the joint state, which makes finite differences exact
/// up to rounding.
#[derive(Debug, Clone, Default)]
pub struct PrismaticKinematics;

impl ForwardKinematics for PrismaticKinematics {
    fn pose(&self, chain_id: &str, chain: &ChainParams, joints: &[f64]) -> Result<Isometry3<f64>> {
        check_joint_count(chain_id, chain, joints)?;
        let mut offset = Vector3::zeros();
        for (i, q) in joints.iter().enumerate() {
            offset[i % 3] += gearing(chain, i) * q;
        }
        Ok(Isometry3::from_parts(
            Translation3::from(offset),
            UnitQuaternion::identity(),
        ))
    }
}

/// Planar revolute arm: each link rotates about z by `gearing_i * q_i + theta_i`
/// and then extends along its local x by the link's `a` entry.
#[derive(Debug, Clone, Default)]
pub struct PlanarArmKinematics;

impl ForwardKinematics for PlanarArmKinematics {
    fn pose(&self, chain_id: &str, chain: &ChainParams, joints: &[f64]) -> Result<Isometry3<f64>> {
        check_joint_count(chain_id, chain, joints)?;
        let mut pose = Isometry3::identity();
        for (i, (q, row)) in joints.iter().zip(&chain.dh).enumerate() {
            let angle = gearing(chain, i) * q + row[0];
            let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle);
            pose = pose
                * Isometry3::from_parts(Translation3::identity(), rotation)
                * Isometry3::translation(row[2], 0.0, row[3]);
        }
        Ok(pose)
    }
}

/// Rectified pinhole: intrinsic shifts are added onto `P` before projecting.
#[derive(Debug, Clone, Default)]
pub struct PinholeProjection;

impl Projection for PinholeProjection {
    fn project(
        &self,
        projection: &Matrix3x4<f64>,
        camera: &CameraParams,
        points: &[TargetPoint],
    ) -> Result<Vec<Pixel>> {
        let mut p = *projection;
        p[(0, 0)] += camera.f_shift;
        p[(1, 1)] += camera.f_shift;
        p[(0, 2)] += camera.cx_shift;
        p[(1, 2)] += camera.cy_shift;
        p[(0, 3)] += camera.baseline_shift;

        Ok(points
            .iter()
            .map(|pt| {
                let h = p * pt.to_homogeneous();
                Point2::new(h.x / h.z, h.y / h.z)
            })
            .collect())
    }
}

pub fn stub_capabilities() -> Capabilities {
    Capabilities::new(Arc::new(PrismaticKinematics), Arc::new(PinholeProjection))
}

pub fn planar_arm_capabilities() -> Capabilities {
    Capabilities::new(Arc::new(PlanarArmKinematics), Arc::new(PinholeProjection))
}

/// `f = 500`, principal point `(320, 240)`, no baseline.
pub fn default_projection_matrix() -> Matrix3x4<f64> {
    Matrix3x4::new(
        500.0, 0.0, 320.0, 0.0, //
        0.0, 500.0, 240.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    )
}

/// An `nx * ny` grid in the plane `z = depth`, starting at the origin.
pub fn planar_target(nx: usize, ny: usize, spacing: f64, depth: f64) -> Vec<TargetPoint> {
    (0..ny)
        .flat_map(|j| {
            (0..nx).map(move |i| TargetPoint::new(i as f64 * spacing, j as f64 * spacing, depth))
        })
        .collect()
}

/// A snapshot with identity transforms `base_mount` / `cam_mount`, an `arm`
/// chain of `num_links` links, and cameras `head_cam` / `arm_cam` with
/// 0.5 px noise.
pub fn arm_snapshot(num_links: usize) -> ParameterSnapshot {
    let mut snapshot = ParameterSnapshot::default();
    snapshot.transforms.insert("base_mount".into(), [0.0; 6]);
    snapshot.transforms.insert("cam_mount".into(), [0.0; 6]);
    snapshot.chains.insert(
        "arm".into(),
        ChainParams {
            dh: vec![[0.0, 0.0, 0.1, 0.0]; num_links],
            gearing: vec![1.0; num_links],
            joint_angle_std: vec![0.1; num_links],
        },
    );
    for camera_id in ["head_cam", "arm_cam"] {
        snapshot.cameras.insert(
            camera_id.into(),
            CameraParams {
                noise_std: [0.5, 0.5],
                ..Default::default()
            },
        );
    }
    snapshot
}
