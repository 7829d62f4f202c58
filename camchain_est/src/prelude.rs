// camchain_est/src/prelude.rs

// Re-export the entire camchain_core prelude so callers get the model types
// (`CameraChainSensor`, `ParameterSnapshot`, ...) from one place.
pub use camchain_core::prelude::*;

pub use crate::batch::{BatchEvaluator, IterationReport, SampleFailure, SampleResidual};
pub use crate::config::{load_config, load_samples_from_dir, load_snapshot, EstimationConfig};
pub use crate::error::EstError;
