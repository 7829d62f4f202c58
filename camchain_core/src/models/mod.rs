// camchain_core/src/models/mod.rs

pub mod kinematics;
pub mod measurement;
pub mod projection;

use std::sync::Arc;

use kinematics::ForwardKinematics;
use projection::Projection;

/// The external primitives a measurement model evaluates through.
///
/// Both are shared read-only across every model built from one bundler, so
/// cloning a model is cheap.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub kinematics: Arc<dyn ForwardKinematics>,
    pub projection: Arc<dyn Projection>,
}

impl Capabilities {
    pub fn new(kinematics: Arc<dyn ForwardKinematics>, projection: Arc<dyn Projection>) -> Self {
        Self {
            kinematics,
            projection,
        }
    }
}
