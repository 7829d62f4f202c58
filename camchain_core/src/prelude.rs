// camchain_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::models::kinematics::ForwardKinematics;
pub use crate::models::measurement::SensorModel;
pub use crate::models::projection::Projection;
pub use crate::models::Capabilities;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::config::{ChainDescriptor, SensorConfigDescriptor};
pub use crate::error::{CalibError, ParamKind, Result};
pub use crate::messages::{CalibrationSample, CameraReading, ChainReading};
pub use crate::params::{CameraParams, ChainParams, ParameterSnapshot};
pub use crate::types::{Covariance, Pixel, PixelVector, TargetPoint};

// --- Sensor Construction & Evaluation ---
pub use crate::bundler::CameraChainBundler;
pub use crate::estimation::sparsity::{ChainSparsity, SparsityMap};
pub use crate::models::measurement::camera_chain::{CameraChainSensor, ChainBinding};
