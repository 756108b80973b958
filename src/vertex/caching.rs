//! Fitted vertex with its tracks and chi-square
//!
//! [`CachingVertex`] is the value passed between the fitter, the smoother and the
//! compatibility estimator. It is never mutated: every update returns a new one.
//! States are held behind [`Arc`], so successive vertices and their tracks
//! share them instead of copying matrices.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use super::errors::VertexError;
use super::state::VertexState;
use super::track::{TrackId, VertexTrack};

/// Fitted vertex: state, associated tracks, total chi-square and optional prior
#[derive(Debug, Clone)]
pub struct CachingVertex {
    vertex_state: Arc<VertexState>,
    /// Pseudo-measurement constraint, if the fit used one
    prior: Option<Arc<VertexState>>,
    tracks: Vec<VertexTrack>,
    total_chi_squared: f64,
}

impl CachingVertex {
    /// Vertex without a prior constraint.
    pub fn new(vertex_state: VertexState, tracks: Vec<VertexTrack>, total_chi_squared: f64) -> Self {
        Self::from_shared(Arc::new(vertex_state), None, tracks, total_chi_squared)
    }

    /// Vertex built from already shared states.
    pub fn from_shared(
        vertex_state: Arc<VertexState>,
        prior: Option<Arc<VertexState>>,
        tracks: Vec<VertexTrack>,
        total_chi_squared: f64,
    ) -> Self {
        Self {
            vertex_state,
            prior,
            tracks,
            total_chi_squared,
        }
    }

    /// Vertex fitted with a prior constraint.
    pub fn with_prior(
        prior: VertexState,
        vertex_state: VertexState,
        tracks: Vec<VertexTrack>,
        total_chi_squared: f64,
    ) -> Self {
        Self::from_shared(Arc::new(vertex_state), Some(Arc::new(prior)), tracks, total_chi_squared)
    }

    /// Single-component vertex from a position and covariance.
    pub fn from_position(
        position: &DVector<f64>,
        covariance: &DMatrix<f64>,
        tracks: Vec<VertexTrack>,
        total_chi_squared: f64,
    ) -> Result<Self, VertexError> {
        Ok(Self::new(
            VertexState::from_position(position, covariance)?,
            tracks,
            total_chi_squared,
        ))
    }

    /// Same vertex with another state, keeping prior, tracks and chi-square.
    pub fn with_vertex_state(&self, vertex_state: VertexState) -> Self {
        Self {
            vertex_state: Arc::new(vertex_state),
            ..self.clone()
        }
    }

    #[inline]
    pub fn vertex_state(&self) -> &VertexState {
        &self.vertex_state
    }

    #[inline]
    pub fn shared_vertex_state(&self) -> &Arc<VertexState> {
        &self.vertex_state
    }

    #[inline]
    pub fn has_prior(&self) -> bool {
        self.prior.is_some()
    }

    #[inline]
    pub fn prior_vertex_state(&self) -> Option<&VertexState> {
        self.prior.as_deref()
    }

    #[inline]
    pub fn shared_prior_vertex_state(&self) -> Option<&Arc<VertexState>> {
        self.prior.as_ref()
    }

    #[inline]
    pub fn tracks(&self) -> &[VertexTrack] {
        &self.tracks
    }

    #[inline]
    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn total_chi_squared(&self) -> f64 {
        self.total_chi_squared
    }

    /// Collapsed vertex position.
    pub fn position(&self) -> Result<DVector<f64>, VertexError> {
        self.vertex_state.position()
    }

    /// Collapsed vertex covariance.
    pub fn covariance(&self) -> Result<DMatrix<f64>, VertexError> {
        self.vertex_state.covariance()
    }

    /// Stored association for a track, if the track belongs to this vertex.
    pub fn find_track(&self, id: TrackId) -> Option<&VertexTrack> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    /// Number of degrees of freedom: two per unit of track weight minus the
    /// three vertex coordinates, which a prior measures itself.
    pub fn degrees_of_freedom(&self) -> f64 {
        let track_weight: f64 = self.tracks.iter().map(|t| t.weight()).sum();
        let ndf = 2.0 * track_weight - 3.0;
        if self.has_prior() {
            ndf + 3.0
        } else {
            ndf
        }
    }
}
