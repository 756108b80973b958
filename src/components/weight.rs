//! Gaussian-sum component weights.

use crate::common::linalg::log_gaussian_density;
use crate::vertex::{LinearizedTrackComponent, VertexComponent, VertexError, WeightCalculator};

/// Weight of a (vertex component, track component) pair
///
/// The prior weights of the two components times the likelihood of the track
/// measurement given the vertex component:
/// ```text
/// w = w_v · w_t · N(p - c - A·x - B·q₀; 0, V + A·C·Aᵀ)
/// ```
/// where `V = G⁻¹` is the parameter covariance and `C` the vertex covariance.
/// The weight is returned as its logarithm, capped at the ceiling passed by the
/// caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct GsfWeightCalculator;

impl GsfWeightCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl WeightCalculator for GsfWeightCalculator {
    fn log_weight(
        &self,
        vertex: &VertexComponent,
        track: &LinearizedTrackComponent,
        log_ceiling: f64,
    ) -> Result<f64, VertexError> {
        let covariance = vertex.covariance()?;
        let position = &covariance * vertex.weight_times_position();

        let a = track.position_jacobian();
        let predicted = track.constant_term()
            + a * &position
            + track.momentum_jacobian() * track.predicted_momentum();
        let residual = track.parameters() - predicted;
        let residual_covariance = track.parameters_error()? + a * &covariance * a.transpose();

        let (log_density, _) = log_gaussian_density(&residual, &residual_covariance, "component weight")?;

        // A zero mixture weight gives -inf, a negative one NaN
        let log_weight = vertex.weight_in_mixture().ln() + track.weight_in_mixture().ln() + log_density;
        if log_weight.is_nan() || log_weight == f64::INFINITY {
            return Err(VertexError::NumericalInstability {
                description: format!("component log weight is {}", log_weight),
            });
        }
        Ok(log_weight.min(log_ceiling))
    }
}
