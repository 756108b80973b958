//! Gaussian-sum single-track addition.

use std::sync::Arc;

use crate::common::linalg::normalize_log_weights;
use crate::vertex::{
    CachingVertex, ChiSquareEstimator, PositionUpdator, TrackRefitter, VertexError, VertexState,
    VertexTrack, VertexTrackFactory, VertexUpdator, WeightCalculator,
};

use super::kalman::{KalmanSmoothedChi2Estimator, KalmanVertexTrackUpdator, KalmanVertexUpdator};
use super::kernel::GsfKernel;
use super::weight::GsfWeightCalculator;

/// Adds one track to a Gaussian-mixture vertex
///
/// Every vertex component is updated with every track component. The new
/// mixture weights are the normalised pair weights and the vertex chi-square
/// grows by the weighted mean of the pair contributions
/// ```text
/// χ²_pair = w_trk · χ²_track + χ²_vertex(old → new)
/// ```
/// Pair weights are normalised in log space; components whose normalised
/// weight is zero are dropped.
#[derive(Debug, Clone, Default)]
pub struct GsfVertexUpdator<
    W: WeightCalculator = GsfWeightCalculator,
    P: PositionUpdator = KalmanVertexUpdator,
    R: TrackRefitter = KalmanVertexTrackUpdator,
    C: ChiSquareEstimator = KalmanSmoothedChi2Estimator,
> {
    kernel: GsfKernel<W, P, R, C>,
    factory: VertexTrackFactory,
}

impl GsfVertexUpdator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<W, P, R, C> GsfVertexUpdator<W, P, R, C>
where
    W: WeightCalculator,
    P: PositionUpdator,
    R: TrackRefitter,
    C: ChiSquareEstimator,
{
    /// Updator running on a custom kernel.
    pub fn with_kernel(kernel: GsfKernel<W, P, R, C>) -> Self {
        Self {
            kernel,
            factory: VertexTrackFactory,
        }
    }

    pub fn kernel(&self) -> &GsfKernel<W, P, R, C> {
        &self.kernel
    }
}

impl<W, P, R, C> VertexUpdator for GsfVertexUpdator<W, P, R, C>
where
    W: WeightCalculator,
    P: PositionUpdator,
    R: TrackRefitter,
    C: ChiSquareEstimator,
{
    fn add(&self, vertex: &CachingVertex, track: &VertexTrack) -> Result<CachingVertex, VertexError> {
        let vertex_components = vertex.vertex_state().require_components("vertex update")?;
        let track_components = track
            .linearized_track()
            .require_components("vertex update")?;

        let mut pairs = Vec::with_capacity(vertex_components.len() * track_components.len());
        for old in &vertex_components {
            for component in track_components {
                let pair = self.kernel.combine_pair(old, component, track.weight())?;
                let vertex_chi2 = self.kernel.chi_square.prior_vertex_chi2(old, &pair.vertex)?;
                let chi2 = track.weight() * pair.track_chi_squared + vertex_chi2;
                pairs.push((pair.log_weight, pair.vertex, chi2));
            }
        }

        let log_weights: Vec<f64> = pairs.iter().map(|(w, _, _)| *w).collect();
        let weights = normalize_log_weights(&log_weights, &format!("adding track {}", track.id()))?;

        let chi2_increment: f64 = weights
            .iter()
            .zip(&pairs)
            .map(|(w, (_, _, chi2))| w * chi2)
            .sum();
        let components: Vec<_> = weights
            .into_iter()
            .zip(pairs)
            .filter(|(w, _)| *w != 0.0)
            .map(|(w, (_, c, _))| c.with_weight_in_mixture(w))
            .collect();
        let state = Arc::new(VertexState::from_components(components));

        log::trace!(
            "Added track {}: {} vertex components, chi2 += {:.4}",
            track.id(),
            state.num_components(),
            chi2_increment
        );

        let mut tracks = vertex.tracks().to_vec();
        tracks.push(self.factory.weighted_vertex_track(
            track.linearized_track().clone(),
            state.clone(),
            track.weight(),
        ));
        let chi2 = vertex.total_chi_squared() + chi2_increment;

        Ok(CachingVertex::from_shared(
            state,
            vertex.shared_prior_vertex_state().cloned(),
            tracks,
            chi2,
        ))
    }

    fn name(&self) -> &'static str {
        "GsfVertexUpdator"
    }
}
