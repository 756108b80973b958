//! Track and vertex fixtures
//!
//! Tracks here measure the vertex position directly: the first three
//! parameters are a point, the last three the momentum, so the Kalman
//! algebra reduces to weighted means that are easy to reason about.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use gsf_vertex_rs::{
    CachingVertex, GsfVertexFitter, LinearizedTrackComponent, LinearizedTrackState, TrackId,
};

/// Momentum carried by every fixture track
pub const FIXTURE_MOMENTUM: [f64; 3] = [0.0, 0.0, 1.0];

/// One component measuring `point` with isotropic resolution `sigma`.
pub fn direct_component(weight: f64, point: [f64; 3], sigma: f64) -> LinearizedTrackComponent {
    let mut a = DMatrix::zeros(6, 3);
    a.view_mut((0, 0), (3, 3)).fill_with_identity();
    let mut b = DMatrix::zeros(6, 3);
    b.view_mut((3, 0), (3, 3)).fill_with_identity();

    let mut p = DVector::zeros(6);
    p.rows_mut(0, 3).copy_from_slice(&point);
    p.rows_mut(3, 3).copy_from_slice(&FIXTURE_MOMENTUM);

    LinearizedTrackComponent::new(
        weight,
        DVector::zeros(6),
        a,
        b,
        p,
        DMatrix::identity(6, 6) / (sigma * sigma),
        DVector::from_column_slice(&FIXTURE_MOMENTUM),
    )
    .unwrap()
}

/// Single-component track linearized at the origin.
pub fn direct_track(id: u64, point: [f64; 3], sigma: f64) -> Arc<LinearizedTrackState> {
    direct_track_at(id, point, sigma, [0.0; 3])
}

/// Single-component track with an explicit linearization point.
pub fn direct_track_at(
    id: u64,
    point: [f64; 3],
    sigma: f64,
    linearization_point: [f64; 3],
) -> Arc<LinearizedTrackState> {
    Arc::new(
        LinearizedTrackState::new(
            TrackId(id),
            DVector::from_column_slice(&linearization_point),
            vec![direct_component(1.0, point, sigma)],
        )
        .unwrap(),
    )
}

/// Gaussian-sum track linearized at the origin.
pub fn mixture_track(id: u64, components: &[(f64, [f64; 3])], sigma: f64) -> Arc<LinearizedTrackState> {
    Arc::new(
        LinearizedTrackState::new(
            TrackId(id),
            DVector::zeros(3),
            components
                .iter()
                .map(|&(w, point)| direct_component(w, point, sigma))
                .collect::<Vec<_>>(),
        )
        .unwrap(),
    )
}

/// Four single-component tracks around the origin.
pub fn four_tracks() -> Vec<Arc<LinearizedTrackState>> {
    vec![
        direct_track(1, [0.10, 0.02, -0.05], 0.1),
        direct_track(2, [-0.08, 0.05, 0.03], 0.1),
        direct_track(3, [0.01, -0.12, 0.07], 0.1),
        direct_track(4, [0.04, 0.06, -0.09], 0.1),
    ]
}

/// Three two-component tracks around the origin.
pub fn three_mixture_tracks() -> Vec<Arc<LinearizedTrackState>> {
    vec![
        mixture_track(1, &[(0.6, [0.05, 0.0, 0.0]), (0.4, [0.15, 0.0, 0.0])], 0.1),
        mixture_track(2, &[(0.5, [0.0, -0.05, 0.0]), (0.5, [0.0, 0.05, 0.02])], 0.1),
        mixture_track(3, &[(0.7, [-0.02, 0.0, 0.04]), (0.3, [-0.1, 0.03, 0.0])], 0.1),
    ]
}

/// Forward fit of the given tracks without a prior or merging.
pub fn fit(tracks: &[Arc<LinearizedTrackState>]) -> CachingVertex {
    GsfVertexFitter::default().fit(tracks).unwrap()
}
