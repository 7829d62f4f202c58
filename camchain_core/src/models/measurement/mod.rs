// camchain_core/src/models/measurement/mod.rs

use dyn_clone::DynClone;
use std::fmt::Debug;

use crate::error::Result;
use crate::estimation::sparsity::SparsityMap;
use crate::params::ParameterSnapshot;
use crate::types::{Covariance, PixelVector, TargetPoint};

pub mod camera_chain;

// --- SENSOR MODEL TRAIT ---
// Represents one observation of a calibration sample. `r = h(params, q, X) - z`
pub trait SensorModel: DynClone + Debug + Send + Sync {
    /// Short name of the sensor family, e.g. `"camera"`.
    fn sensor_type(&self) -> &'static str;

    fn sensor_id(&self) -> &str;

    /// Residual terms produced by each target point.
    fn terms_per_sample(&self) -> usize;

    /// Resolves this model's sub-parameters from `snapshot`.
    ///
    /// Must be called before every evaluation cycle. On failure the model is
    /// left unbound.
    fn rebind(&mut self, snapshot: &ParameterSnapshot) -> Result<()>;

    fn is_bound(&self) -> bool;

    /// Length of the residual vector.
    fn residual_length(&self) -> usize;

    /// `h(X) - z`, flattened.
    fn residual(&self, target_pts: &[TargetPoint]) -> Result<PixelVector>;

    /// The residual premultiplied by the square root of its information matrix.
    fn residual_scaled(&self, target_pts: &[TargetPoint]) -> Result<PixelVector>;

    /// Measurement covariance in residual space.
    fn covariance(&self, target_pts: &[TargetPoint]) -> Result<Covariance>;

    /// Which parameters this sensor's residual can depend on.
    fn sparsity(&self) -> SparsityMap;
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn SensorModel>`.
dyn_clone::clone_trait_object!(SensorModel);
