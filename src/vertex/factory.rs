//! Construction of [`VertexTrack`] associations.

use std::sync::Arc;

use super::state::VertexState;
use super::track::{LinearizedTrackState, RefittedTrackState, VertexTrack};

/// Builds vertex-track associations
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexTrackFactory;

impl VertexTrackFactory {
    pub fn new() -> Self {
        Self
    }

    /// Unsmoothed association with unit weight.
    pub fn vertex_track(&self, linearized: Arc<LinearizedTrackState>, vertex_state: Arc<VertexState>) -> VertexTrack {
        VertexTrack::new(linearized, vertex_state, 1.0)
    }

    /// Unsmoothed association with an explicit track weight.
    pub fn weighted_vertex_track(
        &self,
        linearized: Arc<LinearizedTrackState>,
        vertex_state: Arc<VertexState>,
        weight: f64,
    ) -> VertexTrack {
        VertexTrack::new(linearized, vertex_state, weight)
    }

    /// Smoothed association carrying a refitted state.
    pub fn refitted_vertex_track(
        &self,
        linearized: Arc<LinearizedTrackState>,
        vertex_state: Arc<VertexState>,
        refitted: RefittedTrackState,
        smoothed_chi_squared: f64,
        weight: f64,
    ) -> VertexTrack {
        VertexTrack::smoothed(linearized, vertex_state, refitted, smoothed_chi_squared, weight)
    }
}
