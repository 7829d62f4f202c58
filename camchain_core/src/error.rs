// camchain_core/src/error.rs

use thiserror::Error;

/// Which section of the parameter snapshot a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Transform,
    Chain,
    Camera,
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKind::Transform => write!(f, "transform"),
            ParamKind::Chain => write!(f, "chain"),
            ParamKind::Camera => write!(f, "camera"),
        }
    }
}

/// Every way a single observation's evaluation can fail.
///
/// All of these abort the current sample only. Callers driving a batch are
/// expected to record the failure and move on to the next sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibError {
    /// Target and observation disagree on the number of points.
    #[error("dimension mismatch: expected {expected} points, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("unknown {kind} parameter id '{id}'")]
    UnknownParameterId { kind: ParamKind, id: String },

    /// A sensor configuration names a chain the sample carries no reading for.
    #[error("camera '{camera_id}' references chain '{chain_id}' which is absent from the sample")]
    UnknownChainReference { camera_id: String, chain_id: String },

    #[error("covariance block {block} is not positive definite: {reason}")]
    NonPositiveDefiniteCovariance { block: usize, reason: String },

    #[error("sensor '{sensor_id}' evaluated before being bound to a parameter snapshot")]
    NotBound { sensor_id: String },

    #[error("chain '{chain_id}' expects {expected} joints, got {found}")]
    InvalidJointCount {
        chain_id: String,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, CalibError>;
