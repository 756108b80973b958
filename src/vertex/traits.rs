//! Collaborator traits
//!
//! The smoother and the compatibility estimator are written against these
//! interfaces. Each has one concrete implementation in [`crate::components`],
//! injected through constructors; the combination code never inspects the
//! concrete type.
//!
//! Implementations must be deterministic and free of side effects, which is
//! what makes smoothing safe to run concurrently on independent vertices.

use nalgebra::{DMatrix, DVector};

use super::caching::CachingVertex;
use super::errors::VertexError;
use super::reco::RecoTrack;
use super::state::{VertexComponent, VertexState};
use super::track::{LinearizedTrackComponent, LinearizedTrackState, RefittedTrackComponent, VertexTrack};

/// Direction of a Kalman position update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSign {
    /// Add the track to the vertex
    Add,
    /// Remove the track from the vertex
    Remove,
}

impl UpdateSign {
    /// `+1` for adding, `-1` for removing.
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            UpdateSign::Add => 1.0,
            UpdateSign::Remove => -1.0,
        }
    }
}

/// Single-track addition: incorporate one track into a vertex estimate
///
/// Implementations:
/// - `GsfVertexUpdator` - Gaussian-sum Kalman update over all component pairs
pub trait VertexUpdator: Send + Sync {
    /// Return a new vertex that includes `track`.
    fn add(&self, vertex: &CachingVertex, track: &VertexTrack) -> Result<CachingVertex, VertexError>;

    /// Get updator name
    fn name(&self) -> &'static str;
}

/// Mixture-size reduction
///
/// Implementations:
/// - `GsfVertexMerger` - pairwise moment-preserving merging
pub trait VertexMerger: Send + Sync {
    /// Reduce a vertex state to at most [`max_components`](Self::max_components) leaves.
    fn merge_state(&self, state: &VertexState) -> Result<VertexState, VertexError>;

    /// Reduce the state of a fitted vertex, keeping its tracks, prior and chi-square.
    fn merge(&self, vertex: &CachingVertex) -> Result<CachingVertex, VertexError> {
        Ok(vertex.with_vertex_state(self.merge_state(vertex.vertex_state())?))
    }

    /// Upper bound on the number of components after merging.
    fn max_components(&self) -> usize;

    /// Get merger name
    fn name(&self) -> &'static str;
}

/// Non-normalised mixture weight of a (vertex component, track component) pair
///
/// Weights are exchanged as natural logarithms so that pairs far in the tail
/// keep their relative size. `f64::NEG_INFINITY` is an exact zero weight.
pub trait WeightCalculator: Send + Sync {
    /// # Arguments
    /// * `vertex` - Vertex component
    /// * `track` - Linearized track component
    /// * `log_ceiling` - Upper bound on the returned log weight
    fn log_weight(
        &self,
        vertex: &VertexComponent,
        track: &LinearizedTrackComponent,
        log_ceiling: f64,
    ) -> Result<f64, VertexError>;
}

/// Kalman update of a vertex position with one track component
pub trait PositionUpdator: Send + Sync {
    /// # Arguments
    /// * `vertex` - Vertex component before the update
    /// * `track` - Track component to add or remove
    /// * `weight` - External track weight
    /// * `sign` - Whether the track is added or removed
    fn position_update(
        &self,
        vertex: &VertexComponent,
        track: &LinearizedTrackComponent,
        weight: f64,
        sign: UpdateSign,
    ) -> Result<VertexComponent, VertexError>;
}

/// Refit of a track component's parameters with a vertex constraint
pub trait TrackRefitter: Send + Sync {
    /// Returns the refitted component and the position–momentum covariance.
    fn track_refit(
        &self,
        vertex: &VertexComponent,
        track: &LinearizedTrackComponent,
    ) -> Result<(RefittedTrackComponent, DMatrix<f64>), VertexError>;
}

/// Per-component chi-square contributions
pub trait ChiSquareEstimator: Send + Sync {
    /// Chi-square of a track component against its refit.
    fn track_parameter_chi2(
        &self,
        track: &LinearizedTrackComponent,
        refitted: &RefittedTrackComponent,
    ) -> Result<f64, VertexError>;

    /// Chi-square of a fitted vertex component with respect to a prior component.
    fn prior_vertex_chi2(
        &self,
        prior: &VertexComponent,
        fitted: &VertexComponent,
    ) -> Result<f64, VertexError>;
}

/// Linearization of a persisted track around a point
pub trait TrackLinearizer: Send + Sync {
    fn linearize(
        &self,
        linearization_point: &DVector<f64>,
        track: &RecoTrack,
    ) -> Result<LinearizedTrackState, VertexError>;
}
