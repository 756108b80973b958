//! Track-to-vertex compatibility
//!
//! The compatibility of a track with a fitted vertex is the chi-square the
//! track costs the vertex:
//!
//! - a track already in the vertex: its smoothed chi-square, which requires the
//!   vertex to have been smoothed
//! - any other track: the increase of the vertex chi-square when the track is added

use std::sync::Arc;

use crate::components::{GsfVertexUpdator, StraightLineLinearizer};
use crate::vertex::{
    CachingVertex, LinearizedTrackState, RecoTrack, RecoVertex, TrackLinearizer, VertexError,
    VertexTrack, VertexTrackFactory, VertexUpdator,
};

/// Chi-square compatibility of a track with a Gaussian-sum vertex
///
/// # Type Parameters
/// * `U` - Single-track updator used for tracks outside the vertex
/// * `L` - Linearizer used for persisted tracks
#[derive(Debug, Clone, Default)]
pub struct GsfVertexTrackCompatibilityEstimator<
    U: VertexUpdator = GsfVertexUpdator,
    L: TrackLinearizer = StraightLineLinearizer,
> {
    updator: U,
    linearizer: L,
    factory: VertexTrackFactory,
}

impl GsfVertexTrackCompatibilityEstimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<U: VertexUpdator, L: TrackLinearizer> GsfVertexTrackCompatibilityEstimator<U, L> {
    /// Estimator built from explicit collaborators.
    pub fn with_parts(updator: U, linearizer: L) -> Self {
        Self {
            updator,
            linearizer,
            factory: VertexTrackFactory::new(),
        }
    }

    /// Compatibility of a vertex track with a fitted vertex.
    ///
    /// Membership is decided by track identity.
    pub fn estimate(&self, vertex: &CachingVertex, track: &VertexTrack) -> Result<f64, VertexError> {
        match vertex.find_track(track.id()) {
            Some(stored) => self.estimate_fitted_track(stored),
            None => self.estimate_not_fitted_track(vertex, track),
        }
    }

    /// Compatibility of a linearized track, associated with unit weight.
    pub fn estimate_linearized(
        &self,
        vertex: &CachingVertex,
        track: Arc<LinearizedTrackState>,
    ) -> Result<f64, VertexError> {
        let vertex_track = self.factory.vertex_track(track, vertex.shared_vertex_state().clone());
        self.estimate(vertex, &vertex_track)
    }

    /// Compatibility of a persisted track with a persisted vertex.
    ///
    /// The track is linearized at the vertex position. A track whose persistent
    /// reference is listed in the vertex is treated as fitted; the freshly built
    /// association carries no smoothed state, so this branch reports
    /// [`VertexError::NotSmoothed`]. Tracks without a reference are treated as
    /// not fitted.
    pub fn estimate_reco(&self, vertex: &RecoVertex, track: &RecoTrack) -> Result<f64, VertexError> {
        let linearized = self.linearizer.linearize(&vertex.position, track)?;
        let caching = CachingVertex::from_position(
            &vertex.position,
            &vertex.covariance,
            vec![],
            vertex.chi_squared,
        )?;
        let vertex_track = self
            .factory
            .vertex_track(Arc::new(linearized), caching.shared_vertex_state().clone());

        match vertex.contains(track) {
            Some(true) => self.estimate_fitted_track(&vertex_track),
            Some(false) | None => self.estimate_not_fitted_track(&caching, &vertex_track),
        }
    }

    /// Stored smoothed chi-square of a track that is part of the vertex.
    pub fn estimate_fitted_track(&self, track: &VertexTrack) -> Result<f64, VertexError> {
        match (track.refitted_state_available(), track.smoothed_chi_squared()) {
            (true, Some(chi_squared)) => Ok(chi_squared),
            _ => Err(VertexError::NotSmoothed { track: track.id() }),
        }
    }

    /// Chi-square increase when the track is added to the vertex.
    pub fn estimate_not_fitted_track(
        &self,
        vertex: &CachingVertex,
        track: &VertexTrack,
    ) -> Result<f64, VertexError> {
        let trial = self.updator.add(vertex, track)?;
        Ok(trial.total_chi_squared() - vertex.total_chi_squared())
    }
}
