//! Per-pair Gaussian-sum step shared by the updator and the smoother.

use crate::common::constants::WEIGHT_CEILING;
use crate::vertex::{
    ChiSquareEstimator, LinearizedTrackComponent, PositionUpdator, RefittedTrackComponent,
    TrackRefitter, UpdateSign, VertexComponent, VertexError, WeightCalculator,
};

use super::kalman::{KalmanSmoothedChi2Estimator, KalmanVertexTrackUpdator, KalmanVertexUpdator};
use super::weight::GsfWeightCalculator;

/// Result of combining one vertex component with one track component
#[derive(Debug, Clone)]
pub struct PairUpdate {
    /// Natural log of the non-normalised pair weight
    pub log_weight: f64,
    /// Vertex component after adding the track component. Its mixture weight
    /// is set once the pair weights of the cross product are normalised.
    pub vertex: VertexComponent,
    /// Track component refitted against the updated vertex
    pub refitted: RefittedTrackComponent,
    /// Chi-square of the track component against its refit
    pub track_chi_squared: f64,
}

/// The four single-component collaborators of a Gaussian-sum vertex step
///
/// Generic over each collaborator with the Kalman implementations as defaults,
/// so a custom weight calculator can be swapped in without touching the rest.
#[derive(Debug, Clone, Default)]
pub struct GsfKernel<
    W: WeightCalculator = GsfWeightCalculator,
    P: PositionUpdator = KalmanVertexUpdator,
    R: TrackRefitter = KalmanVertexTrackUpdator,
    C: ChiSquareEstimator = KalmanSmoothedChi2Estimator,
> {
    pub weight_calculator: W,
    pub position_updator: P,
    pub refitter: R,
    pub chi_square: C,
}

impl GsfKernel {
    /// Kernel with the Kalman collaborators.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<W, P, R, C> GsfKernel<W, P, R, C>
where
    W: WeightCalculator,
    P: PositionUpdator,
    R: TrackRefitter,
    C: ChiSquareEstimator,
{
    /// Kernel built from explicit collaborators.
    pub fn from_parts(weight_calculator: W, position_updator: P, refitter: R, chi_square: C) -> Self {
        Self {
            weight_calculator,
            position_updator,
            refitter,
            chi_square,
        }
    }

    /// Replace the weight calculator.
    pub fn with_weight_calculator<W2: WeightCalculator>(self, weight_calculator: W2) -> GsfKernel<W2, P, R, C> {
        GsfKernel {
            weight_calculator,
            position_updator: self.position_updator,
            refitter: self.refitter,
            chi_square: self.chi_square,
        }
    }

    /// Weight, update, refit and score one component pair.
    ///
    /// # Arguments
    /// * `vertex` - Vertex component
    /// * `track` - Track component
    /// * `track_weight` - External weight of the whole track
    pub fn combine_pair(
        &self,
        vertex: &VertexComponent,
        track: &LinearizedTrackComponent,
        track_weight: f64,
    ) -> Result<PairUpdate, VertexError> {
        let log_weight = self
            .weight_calculator
            .log_weight(vertex, track, WEIGHT_CEILING.ln())?;

        let updated = self
            .position_updator
            .position_update(vertex, track, track_weight, UpdateSign::Add)?;

        let (refitted, _) = self.refitter.track_refit(&updated, track)?;
        let track_chi_squared = self.chi_square.track_parameter_chi2(track, &refitted)?;

        Ok(PairUpdate {
            log_weight,
            vertex: updated,
            refitted,
            track_chi_squared,
        })
    }
}
