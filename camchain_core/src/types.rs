// camchain_core/src/types.rs

use nalgebra::{DMatrix, DVector, Point2, Point3};

// --- Core Type Aliases ---
/// A target feature in target-local coordinates.
pub type TargetPoint = Point3<f64>;
/// A detected or predicted image location, in pixels.
pub type Pixel = Point2<f64>;
/// Flattened `[u1, v1, ..., uN, vN]` pixel vector.
pub type PixelVector = DVector<f64>;
pub type Covariance = DMatrix<f64>;

/// Number of residual terms each observed target point contributes.
pub const TERMS_PER_POINT: usize = 2;

/// Flattens a list of pixels into `[u1, v1, ..., uN, vN]`.
pub fn flatten_pixels(pixels: &[Pixel]) -> PixelVector {
    DVector::from_iterator(
        pixels.len() * TERMS_PER_POINT,
        pixels.iter().flat_map(|p| [p.x, p.y]),
    )
}
