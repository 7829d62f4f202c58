// camchain_core/src/models/kinematics.rs

use nalgebra::Isometry3;
use std::fmt::Debug;

use crate::error::Result;
use crate::params::ChainParams;

// --- FORWARD KINEMATICS CAPABILITY ---
// Maps chain geometry and a joint state to the pose of the chain tip. `T = fk(params, q)`
pub trait ForwardKinematics: Debug + Send + Sync {
    /// Pose of the chain's last link expressed in the chain's base frame.
    ///
    /// Implementations must fail with `CalibError::InvalidJointCount` when
    /// `joint_positions` does not hold one entry per link.
    fn pose(
        &self,
        chain_id: &str,
        chain: &ChainParams,
        joint_positions: &[f64],
    ) -> Result<Isometry3<f64>>;
}
