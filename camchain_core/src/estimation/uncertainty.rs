// camchain_core/src/estimation/uncertainty.rs

use nalgebra::{DMatrix, DVector, Matrix2, SymmetricEigen, Vector2};

use crate::error::{CalibError, Result};
use crate::types::{PixelVector, TERMS_PER_POINT};

/// Step applied to one joint at a time when differencing the prediction.
pub const FINITE_DIFFERENCE_STEP: f64 = 1e-8;

/// Largest imaginary magnitude tolerated in a block square root.
pub const REALNESS_TOLERANCE: f64 = 1e-6;

/// Forward-difference sensitivity of a pixel prediction to each joint.
///
/// Returns `Jt` with one row per joint and one column per pixel term, i.e.
/// `Jt[(i, k)] = (f(q + eps * e_i)[k] - f(q)[k]) / eps`. Every row is
/// computed from a fresh copy of `joints`, so the result is reproducible
/// bit-for-bit for the same inputs.
pub fn joint_sensitivity<F>(joints: &[f64], mut predict: F) -> Result<DMatrix<f64>>
where
    F: FnMut(&[f64]) -> Result<PixelVector>,
{
    let f0 = predict(joints)?;
    let mut jt = DMatrix::zeros(joints.len(), f0.len());

    let mut perturbed = joints.to_vec();
    for i in 0..joints.len() {
        perturbed.copy_from_slice(joints);
        perturbed[i] += FINITE_DIFFERENCE_STEP;

        let f_test = predict(&perturbed)?;
        if f_test.len() != f0.len() {
            return Err(CalibError::DimensionMismatch {
                expected: f0.len() / TERMS_PER_POINT,
                found: f_test.len() / TERMS_PER_POINT,
            });
        }
        let row = (f_test - &f0) / FINITE_DIFFERENCE_STEP;
        jt.row_mut(i).copy_from(&row.transpose());
    }

    Ok(jt)
}

/// Pushes independent per-joint variances into pixel space: `Jt^T * diag(var) * Jt`.
pub fn chain_covariance(jt: &DMatrix<f64>, joint_variances: &[f64]) -> DMatrix<f64> {
    debug_assert_eq!(jt.nrows(), joint_variances.len());
    let weights = DMatrix::from_diagonal(&DVector::from_column_slice(joint_variances));
    jt.transpose() * weights * jt
}

/// Diagonal pixel-noise covariance, `(var_u, var_v)` repeated once per point.
pub fn camera_covariance(num_points: usize, var_u: f64, var_v: f64) -> DMatrix<f64> {
    let diag = DVector::from_fn(num_points * TERMS_PER_POINT, |i, _| {
        if i % TERMS_PER_POINT == 0 {
            var_u
        } else {
            var_v
        }
    });
    DMatrix::from_diagonal(&diag)
}

/// Block-diagonal square root of the information matrix.
///
/// The covariance is treated as block diagonal with one 2x2 block per point;
/// cross-point terms are ignored. Each block is inverted and its principal
/// square root placed on the diagonal of the result.
pub fn block_information_sqrt(cov: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let dim = cov.nrows();
    if cov.ncols() != dim || dim % TERMS_PER_POINT != 0 {
        return Err(CalibError::DimensionMismatch {
            expected: dim / TERMS_PER_POINT,
            found: cov.ncols() / TERMS_PER_POINT,
        });
    }

    let mut gamma_sqrt = DMatrix::zeros(dim, dim);
    for block in 0..dim / TERMS_PER_POINT {
        let first = block * TERMS_PER_POINT;
        let sub_cov: Matrix2<f64> = cov.fixed_view::<2, 2>(first, first).into_owned();
        let sub_gamma = sub_cov
            .try_inverse()
            .ok_or_else(|| CalibError::NonPositiveDefiniteCovariance {
                block,
                reason: "block is singular".to_string(),
            })?;
        let sub_gamma_sqrt = principal_sqrt(&sub_gamma).map_err(|reason| {
            CalibError::NonPositiveDefiniteCovariance { block, reason }
        })?;
        gamma_sqrt
            .fixed_view_mut::<2, 2>(first, first)
            .copy_from(&sub_gamma_sqrt);
    }

    Ok(gamma_sqrt)
}

/// Principal square root of a symmetric 2x2 matrix.
///
/// Negative eigenvalues give the root an imaginary part. The real part is
/// returned only when that imaginary part's Frobenius norm is below
/// `REALNESS_TOLERANCE`.
pub fn principal_sqrt(m: &Matrix2<f64>) -> std::result::Result<Matrix2<f64>, String> {
    let symmetric = (m + m.transpose()) * 0.5;
    let eigen = SymmetricEigen::new(symmetric);

    if eigen.eigenvalues.iter().any(|l| !l.is_finite()) {
        return Err(format!("non-finite eigenvalues {:?}", eigen.eigenvalues.as_slice()));
    }

    let real_part = eigen.eigenvalues.map(|l| l.max(0.0).sqrt());
    let imag_part = eigen.eigenvalues.map(|l| (-l).max(0.0).sqrt());

    // The eigenvectors are orthonormal, so ||V diag(im) V^T||_F = ||im||.
    let imag_norm = imag_part.norm();
    if imag_norm >= REALNESS_TOLERANCE {
        return Err(format!(
            "square root has imaginary part of magnitude {:.3e}",
            imag_norm
        ));
    }

    let v = eigen.eigenvectors;
    Ok(v * Matrix2::from_diagonal(&Vector2::new(real_part[0], real_part[1])) * v.transpose())
}
