//! Linear algebra utilities
//!
//! Gaussian densities, symmetric inversion and quadratic forms needed by the
//! Kalman vertex update and the Gaussian-sum weight calculation.

use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

use crate::vertex::VertexError;

/// Invert a symmetric positive definite matrix.
///
/// Tries a Cholesky decomposition first and falls back to a general LU
/// inverse for matrices that are symmetric but only semi-definite up to
/// rounding.
///
/// # Arguments
/// * `matrix` - Square matrix to invert
/// * `context` - Name of the matrix, used in the error message
///
/// # Returns
/// The symmetrized inverse, or [`VertexError::SingularMatrix`]
pub fn invert_symmetric(matrix: &DMatrix<f64>, context: &str) -> Result<DMatrix<f64>, VertexError> {
    if !matrix.is_square() {
        return Err(VertexError::DimensionMismatch {
            expected: matrix.nrows(),
            actual: matrix.ncols(),
            context: format!("{} (must be square)", context),
        });
    }

    if let Some(chol) = matrix.clone().cholesky() {
        return Ok(symmetrize(&chol.inverse()));
    }

    match matrix.clone().try_inverse() {
        Some(inv) if inv.iter().all(|v| v.is_finite()) => Ok(symmetrize(&inv)),
        _ => Err(VertexError::SingularMatrix {
            context: context.to_string(),
        }),
    }
}

/// Make matrix symmetric
///
/// Averages a matrix with its transpose to remove rounding asymmetry.
pub fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (matrix + matrix.transpose())
}

/// Quadratic form `vᵀ M v`.
#[inline]
pub fn similarity(v: &DVector<f64>, m: &DMatrix<f64>) -> f64 {
    v.dot(&(m * v))
}

/// Log density of a zero-mean multivariate Gaussian at a residual.
///
/// Returns the log density together with the chi-square `rᵀ Σ⁻¹ r` of the
/// residual. Working in log space keeps far residuals distinguishable where the
/// density itself underflows. A covariance that is not positive definite is an
/// error, never a zero density.
///
/// # Arguments
/// * `residual` - Difference between measurement and prediction
/// * `covariance` - Covariance of the residual
/// * `context` - Name used in error messages
pub fn log_gaussian_density(
    residual: &DVector<f64>,
    covariance: &DMatrix<f64>,
    context: &str,
) -> Result<(f64, f64), VertexError> {
    let n = residual.len() as f64;

    let chol = covariance
        .clone()
        .cholesky()
        .ok_or_else(|| VertexError::NumericalInstability {
            description: format!("{}: covariance is not positive definite", context),
        })?;

    // ln det Σ = 2 Σ ln L_ii
    let log_det = 2.0 * chol.l().diagonal().iter().map(|d| d.ln()).sum::<f64>();
    if !log_det.is_finite() {
        return Err(VertexError::NumericalInstability {
            description: format!("{}: covariance log-determinant is {}", context, log_det),
        });
    }

    let chi2 = residual.dot(&chol.solve(residual));
    let log_density = -0.5 * (n * (2.0 * PI).ln() + log_det + chi2);

    Ok((log_density, chi2))
}

/// Normalise log weights into linear weights summing to one.
///
/// The largest log weight is subtracted before exponentiating, so weights
/// whose linear values would all underflow still normalise correctly.
/// `f64::NEG_INFINITY` stands for an exact zero weight.
///
/// # Errors
/// [`VertexError::ZeroTotalWeight`] if every weight is zero (or the slice is
/// empty), [`VertexError::NumericalInstability`] for NaN or `+∞`.
pub fn normalize_log_weights(log_weights: &[f64], context: &str) -> Result<Vec<f64>, VertexError> {
    if let Some(bad) = log_weights.iter().find(|w| w.is_nan() || **w == f64::INFINITY) {
        return Err(VertexError::NumericalInstability {
            description: format!("{}: log weight is {}", context, bad),
        });
    }

    let max = log_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return Err(VertexError::ZeroTotalWeight {
            context: context.to_string(),
        });
    }

    let weights: Vec<f64> = log_weights.iter().map(|w| (w - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// Mahalanobis distance between two points under a covariance.
///
/// Returns infinity for a singular covariance.
pub fn mahalanobis_distance(x: &DVector<f64>, mu: &DVector<f64>, sigma: &DMatrix<f64>) -> f64 {
    let diff = x - mu;

    match sigma.clone().cholesky() {
        Some(chol) => diff.dot(&chol.solve(&diff)).sqrt(),
        None => f64::INFINITY,
    }
}

/// Check if matrix is positive definite
pub fn is_positive_definite(matrix: &DMatrix<f64>) -> bool {
    matrix.clone().cholesky().is_some()
}
