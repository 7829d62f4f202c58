// camchain_core/src/utils/geometry.rs

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3, Vector6};

/// Builds a rigid transform from `[x, y, z, rx, ry, rz]`, where the last three
/// entries are a scaled-axis rotation (axis times angle, radians).
pub fn isometry_from_params(params: &Vector6<f64>) -> Isometry3<f64> {
    let translation = Translation3::new(params[0], params[1], params[2]);
    let rotation = UnitQuaternion::from_scaled_axis(Vector3::new(params[3], params[4], params[5]));
    Isometry3::from_parts(translation, rotation)
}

/// Chains transforms left to right: `T_0 * T_1 * ... * T_n`.
pub fn compose<'a, I>(transforms: I) -> Isometry3<f64>
where
    I: IntoIterator<Item = &'a Isometry3<f64>>,
{
    transforms
        .into_iter()
        .fold(Isometry3::identity(), |acc, t| acc * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_zero_params_is_identity() {
        let iso = isometry_from_params(&Vector6::zeros());
        assert_abs_diff_eq!(iso.to_homogeneous(), Isometry3::identity().to_homogeneous());
    }

    #[test]
    fn test_rotation_about_z_then_translation() {
        let iso = isometry_from_params(&Vector6::new(1.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2));
        let p = iso * Point3::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(p, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_applies_left_to_right() {
        let a = isometry_from_params(&Vector6::new(1.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2));
        let b = isometry_from_params(&Vector6::new(0.0, 2.0, 0.0, 0.0, 0.0, 0.0));
        let composed = compose([&a, &b]);
        let p = composed * Point3::origin();
        // b moves along its local y, which `a` has rotated onto -x.
        assert_abs_diff_eq!(p, Point3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
    }
}
