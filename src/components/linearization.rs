//! Straight-line track linearization.
//!
//! A track without magnetic field is a line through a reference point along
//! its momentum. Around a linearization point `v` the track is parameterised by
//! its point of closest approach to `v` and its momentum:
//! ```text
//! d     = q / |q|
//! r_pca = r + ((v - r)·d)·d
//! p     = [r_pca; q]        A = [I; 0]   B = [0; I]   c = 0
//! V     = diag(σt²(I - ddᵀ) + σl²ddᵀ, σq²I)
//! ```
//! The longitudinal sigma `σl` is large: a line does not locate the vertex
//! along its own direction.

use nalgebra::{DMatrix, DVector};

use crate::common::constants::{DEFAULT_LONGITUDINAL_SIGMA, MOMENTUM_DIM, VERTEX_DIM};
use crate::common::linalg::invert_symmetric;
use crate::vertex::{
    LinearizedTrackComponent, LinearizedTrackState, RecoTrack, RecoTrackComponent, TrackLinearizer,
    VertexError,
};

/// Linearizes straight-line tracks into six parameters
#[derive(Debug, Clone)]
pub struct StraightLineLinearizer {
    longitudinal_sigma: f64,
}

impl Default for StraightLineLinearizer {
    fn default() -> Self {
        Self {
            longitudinal_sigma: DEFAULT_LONGITUDINAL_SIGMA,
        }
    }
}

impl StraightLineLinearizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resolution along the direction of flight.
    pub fn with_longitudinal_sigma(mut self, sigma: f64) -> Self {
        self.longitudinal_sigma = sigma;
        self
    }

    fn linearize_component(
        &self,
        point: &DVector<f64>,
        component: &RecoTrackComponent,
    ) -> Result<LinearizedTrackComponent, VertexError> {
        let sigmas = [
            component.transverse_sigma,
            component.momentum_sigma,
            self.longitudinal_sigma,
        ];
        if sigmas.iter().any(|s| *s <= 0.0 || !s.is_finite()) {
            return Err(VertexError::Configuration {
                description: format!("track resolutions must be positive, got {:?}", sigmas),
            });
        }
        for (v, context) in [
            (&component.reference_point, "track reference point"),
            (&component.momentum, "track momentum"),
        ] {
            if v.len() != VERTEX_DIM {
                return Err(VertexError::DimensionMismatch {
                    expected: VERTEX_DIM,
                    actual: v.len(),
                    context: context.to_string(),
                });
            }
        }

        let magnitude = component.momentum.norm();
        if magnitude <= 0.0 || !magnitude.is_finite() {
            return Err(VertexError::NumericalInstability {
                description: format!("cannot linearize a track with momentum {}", magnitude),
            });
        }
        let d = &component.momentum / magnitude;

        let r = &component.reference_point;
        let pca = r + &d * (point - r).dot(&d);

        let n = VERTEX_DIM + MOMENTUM_DIM;
        let mut parameters = DVector::zeros(n);
        parameters.rows_mut(0, VERTEX_DIM).copy_from(&pca);
        parameters.rows_mut(VERTEX_DIM, MOMENTUM_DIM).copy_from(&component.momentum);

        let mut position_jacobian = DMatrix::zeros(n, VERTEX_DIM);
        position_jacobian.view_mut((0, 0), (VERTEX_DIM, VERTEX_DIM)).fill_with_identity();
        let mut momentum_jacobian = DMatrix::zeros(n, MOMENTUM_DIM);
        momentum_jacobian
            .view_mut((VERTEX_DIM, 0), (MOMENTUM_DIM, MOMENTUM_DIM))
            .fill_with_identity();

        let ddt = &d * d.transpose();
        let transverse = DMatrix::identity(VERTEX_DIM, VERTEX_DIM) - &ddt;
        let sigma_t2 = component.transverse_sigma.powi(2);
        let sigma_l2 = self.longitudinal_sigma.powi(2);

        let mut covariance = DMatrix::zeros(n, n);
        covariance
            .view_mut((0, 0), (VERTEX_DIM, VERTEX_DIM))
            .copy_from(&(transverse * sigma_t2 + ddt * sigma_l2));
        covariance
            .view_mut((VERTEX_DIM, VERTEX_DIM), (MOMENTUM_DIM, MOMENTUM_DIM))
            .fill_diagonal(component.momentum_sigma.powi(2));

        let weight = invert_symmetric(&covariance, "straight-line track covariance")?;

        LinearizedTrackComponent::new(
            component.weight,
            DVector::zeros(n),
            position_jacobian,
            momentum_jacobian,
            parameters,
            weight,
            component.momentum.clone(),
        )
    }
}

impl TrackLinearizer for StraightLineLinearizer {
    fn linearize(
        &self,
        linearization_point: &DVector<f64>,
        track: &RecoTrack,
    ) -> Result<LinearizedTrackState, VertexError> {
        if linearization_point.len() != VERTEX_DIM {
            return Err(VertexError::DimensionMismatch {
                expected: VERTEX_DIM,
                actual: linearization_point.len(),
                context: "linearization point".to_string(),
            });
        }
        let components = track
            .components
            .iter()
            .map(|c| self.linearize_component(linearization_point, c))
            .collect::<Result<Vec<_>, VertexError>>()?;
        LinearizedTrackState::new(track.id, linearization_point.clone(), components)
    }
}
