//! Kalman filter formalism for single Gaussian components.
//!
//! A linearized track relates the vertex position `x` and the momentum at the
//! vertex `q` to the measured parameters `p` through
//! ```text
//! p ≈ c + A·x + B·q
//! ```
//! with parameter weight matrix `G`. Eliminating the momentum gives the
//! effective weight of the track on the vertex position
//! ```text
//! G_B = G - G·B·(BᵀGB)⁻¹·BᵀG
//! ```
//! and everything in this module is built from that reduction.

use nalgebra::{DMatrix, DVector};

use crate::common::linalg::{invert_symmetric, similarity, symmetrize};
use crate::vertex::{
    ChiSquareEstimator, LinearizedTrackComponent, PositionUpdator, RefittedTrackComponent,
    TrackRefitter, UpdateSign, VertexComponent, VertexError,
};

/// `S = (BᵀGB)⁻¹` and `BᵀG` of a track component.
fn momentum_reduction(
    track: &LinearizedTrackComponent,
) -> Result<(DMatrix<f64>, DMatrix<f64>), VertexError> {
    let b = track.momentum_jacobian();
    let bt_g = b.transpose() * track.parameters_weight();
    let s = invert_symmetric(&(&bt_g * b), "momentum weight BᵀGB")?;
    Ok((s, bt_g))
}

// ============================================================================
// Position update
// ============================================================================

/// Kalman update of the vertex position in information form
///
/// ```text
/// W'  = W  + s·w·AᵀG_B·A
/// Wx' = Wx + s·w·AᵀG_B·(p - c)
/// ```
/// where `s` is the update sign and `w` the external track weight. The updated
/// component keeps the mixture weight of the input vertex component.
#[derive(Debug, Clone, Copy, Default)]
pub struct KalmanVertexUpdator;

impl KalmanVertexUpdator {
    pub fn new() -> Self {
        Self
    }
}

impl PositionUpdator for KalmanVertexUpdator {
    fn position_update(
        &self,
        vertex: &VertexComponent,
        track: &LinearizedTrackComponent,
        weight: f64,
        sign: UpdateSign,
    ) -> Result<VertexComponent, VertexError> {
        let g = track.parameters_weight();
        let (s, bt_g) = momentum_reduction(track)?;
        let g_b = g - bt_g.transpose() * &s * &bt_g;

        let a = track.position_jacobian();
        let at_gb = a.transpose() * &g_b;
        let factor = sign.value() * weight;

        let weight_matrix = vertex.weight_matrix() + (&at_gb * a) * factor;
        let residual = track.parameters() - track.constant_term();
        let weight_times_position = vertex.weight_times_position() + (&at_gb * residual) * factor;

        VertexComponent::new(
            weight_times_position,
            symmetrize(&weight_matrix),
            vertex.weight_in_mixture(),
        )
    }
}

// ============================================================================
// Track refit
// ============================================================================

/// Refit of the track momentum with the vertex position fixed
///
/// ```text
/// q  = S·BᵀG·(p - c - A·x)
/// p' = c + A·x + B·q
/// ```
/// The momentum covariance is `S + D·C·Dᵀ` with `D = S·BᵀG·A` and `C` the vertex
/// covariance; the returned matrix is the position–momentum covariance `-C·Dᵀ`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KalmanVertexTrackUpdator;

impl KalmanVertexTrackUpdator {
    pub fn new() -> Self {
        Self
    }
}

impl TrackRefitter for KalmanVertexTrackUpdator {
    fn track_refit(
        &self,
        vertex: &VertexComponent,
        track: &LinearizedTrackComponent,
    ) -> Result<(RefittedTrackComponent, DMatrix<f64>), VertexError> {
        let covariance = vertex.covariance()?;
        let position = &covariance * vertex.weight_times_position();

        let a = track.position_jacobian();
        let b = track.momentum_jacobian();
        let (s, bt_g) = momentum_reduction(track)?;

        let predicted = track.constant_term() + a * &position;
        let momentum: DVector<f64> = &s * &bt_g * (track.parameters() - &predicted);
        let parameters = predicted + b * &momentum;

        let d = &s * &bt_g * a;
        let momentum_covariance = symmetrize(&(&s + &d * &covariance * d.transpose()));
        let position_momentum = -(&covariance * d.transpose());

        let refitted = RefittedTrackComponent::new(
            track.weight_in_mixture(),
            position,
            momentum,
            parameters,
            momentum_covariance,
            position_momentum.clone(),
        );
        Ok((refitted, position_momentum))
    }
}

// ============================================================================
// Chi-square
// ============================================================================

/// Chi-square contributions of a smoothed fit
#[derive(Debug, Clone, Copy, Default)]
pub struct KalmanSmoothedChi2Estimator;

impl KalmanSmoothedChi2Estimator {
    pub fn new() -> Self {
        Self
    }
}

impl ChiSquareEstimator for KalmanSmoothedChi2Estimator {
    /// `(p - p')ᵀ G (p - p')`
    fn track_parameter_chi2(
        &self,
        track: &LinearizedTrackComponent,
        refitted: &RefittedTrackComponent,
    ) -> Result<f64, VertexError> {
        if refitted.parameters().len() != track.dim() {
            return Err(VertexError::DimensionMismatch {
                expected: track.dim(),
                actual: refitted.parameters().len(),
                context: "refitted track parameters".to_string(),
            });
        }
        let residual = track.parameters() - refitted.parameters();
        Ok(similarity(&residual, track.parameters_weight()))
    }

    /// `(x_f - x_p)ᵀ W_p (x_f - x_p)`
    fn prior_vertex_chi2(
        &self,
        prior: &VertexComponent,
        fitted: &VertexComponent,
    ) -> Result<f64, VertexError> {
        let residual = fitted.position()? - prior.position()?;
        Ok(similarity(&residual, prior.weight_matrix()))
    }
}
