//! Persisted (reconstructed) track and vertex records
//!
//! These are the not-yet-linearized inputs of the compatibility estimator's
//! convenience entry point: a stored vertex with the references of the tracks
//! it was fitted from, and a track that may or may not carry such a reference.

use nalgebra::{DMatrix, DVector};

use super::track::TrackId;

/// Reference of a track in persistent storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackRef(pub u64);

/// One hypothesis of a reconstructed track, described as a straight line
#[derive(Debug, Clone)]
pub struct RecoTrackComponent {
    /// Weight of the hypothesis
    pub weight: f64,
    /// A point on the trajectory
    pub reference_point: DVector<f64>,
    /// Momentum vector (direction of flight times magnitude)
    pub momentum: DVector<f64>,
    /// Position resolution transverse to the direction of flight
    pub transverse_sigma: f64,
    /// Resolution of each momentum coordinate
    pub momentum_sigma: f64,
}

impl RecoTrackComponent {
    pub fn new(
        weight: f64,
        reference_point: DVector<f64>,
        momentum: DVector<f64>,
        transverse_sigma: f64,
        momentum_sigma: f64,
    ) -> Self {
        Self {
            weight,
            reference_point,
            momentum,
            transverse_sigma,
            momentum_sigma,
        }
    }
}

/// Reconstructed track
#[derive(Debug, Clone)]
pub struct RecoTrack {
    /// Identity used when the track is linearized
    pub id: TrackId,
    /// Reference into persistent storage; `None` for tracks built on the fly
    pub persistent_ref: Option<TrackRef>,
    /// Track hypotheses
    pub components: Vec<RecoTrackComponent>,
}

impl RecoTrack {
    /// Single-hypothesis track.
    pub fn single(id: TrackId, persistent_ref: Option<TrackRef>, component: RecoTrackComponent) -> Self {
        Self {
            id,
            persistent_ref,
            components: vec![component],
        }
    }
}

/// Reconstructed vertex as stored after a fit
#[derive(Debug, Clone)]
pub struct RecoVertex {
    pub position: DVector<f64>,
    pub covariance: DMatrix<f64>,
    pub chi_squared: f64,
    /// References of the tracks the vertex was fitted from
    pub track_refs: Vec<TrackRef>,
}

impl RecoVertex {
    /// True if the track's persistent reference is in this vertex.
    ///
    /// Returns `None` when the track has no persistent reference, in which
    /// case membership cannot be decided.
    pub fn contains(&self, track: &RecoTrack) -> Option<bool> {
        track
            .persistent_ref
            .map(|r| self.track_refs.iter().any(|t| *t == r))
    }
}
