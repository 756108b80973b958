//! Smoother behaviour on small hand-built vertices.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use gsf_vertex_rs::smoother::{mean_vertex, prior_vertex_chi2, vertex_and_track_update};
use gsf_vertex_rs::{
    CachingVertex, DebugReporter, GsfKernel, GsfVertexFitter, GsfVertexMerger, GsfVertexSmoother,
    GsfVertexUpdator, KalmanSmoothedChi2Estimator, LinearizedTrackComponent, LinearizedTrackState,
    SmootherConfig, TrackId, VertexComponent, VertexError, VertexState, VertexTrack, VertexUpdator,
    WeightCalculator,
};

use crate::helpers::assertions::{assert_dvector_close, assert_relative_close, assert_scalar_close};
use crate::helpers::fixtures::{
    direct_track, direct_track_at, fit, four_tracks, mixture_track, three_mixture_tracks,
};

/// Weight calculator that rejects every pair
#[derive(Debug, Clone, Copy)]
struct ZeroWeight;

impl WeightCalculator for ZeroWeight {
    fn log_weight(&self, _: &VertexComponent, _: &LinearizedTrackComponent, _: f64) -> Result<f64, VertexError> {
        Ok(f64::NEG_INFINITY)
    }
}

fn limited_smoother(max_components: usize) -> GsfVertexSmoother {
    GsfVertexSmoother::new(
        SmootherConfig::new(true),
        GsfVertexMerger::with_max_components(max_components),
    )
}

#[test]
fn test_single_track_matches_seeded_update() {
    let track = direct_track(1, [0.1, 0.05, -0.02], 0.01);
    let vertex = fit(&[track.clone()]);

    let smoothed = GsfVertexSmoother::default().smooth(&vertex).unwrap();
    let refitted = smoothed.tracks()[0].refitted_state().unwrap();
    assert_scalar_close(refitted.total_weight(), 1.0, 1e-12, "refitted weight sum");

    let seed = VertexComponent::flat(&DVector::zeros(3), 10_000.0).unwrap();
    let seeded = CachingVertex::new(seed.into(), vec![], 0.0);
    let expected = GsfVertexUpdator::new()
        .add(&seeded, &VertexTrack::new(track, seeded.vertex_state().clone(), 1.0))
        .unwrap()
        .position()
        .unwrap();

    // The smoother combines the seed with itself, which only moves the result by
    // the ratio of seed weight to track weight
    assert_dvector_close(&refitted.position(), &expected, 1e-6, "single-track position");
}

/// Exact for single-component tracks only. With Gaussian-sum tracks the pass
/// product multiplies mixture weights without the overlap between components,
/// so the smoothed chi2 moves slightly (relative 1e-3) with track order.
#[test]
fn test_order_invariance() {
    let tracks = four_tracks();
    let reference = GsfVertexSmoother::default()
        .smooth(&fit(&tracks))
        .unwrap()
        .total_chi_squared();

    let permutations: [[usize; 4]; 4] = [[3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1], [0, 2, 1, 3]];
    for order in permutations {
        let permuted: Vec<_> = order.iter().map(|&i| tracks[i].clone()).collect();
        let chi2 = GsfVertexSmoother::default()
            .smooth(&fit(&permuted))
            .unwrap()
            .total_chi_squared();
        assert_relative_close(chi2, reference, 1e-9, "smoothed chi2 under permutation");
    }
}

#[test]
fn test_refitted_weights_are_normalised() {
    let vertex = fit(&three_mixture_tracks());
    let smoothed = GsfVertexSmoother::default().smooth(&vertex).unwrap();

    for track in smoothed.tracks() {
        let refitted = track.refitted_state().unwrap();
        assert_scalar_close(refitted.total_weight(), 1.0, 1e-12, "refitted weight sum");
        assert!(refitted.components().iter().all(|c| c.weight_in_mixture() > 0.0));
    }
}

#[test]
fn test_component_growth_without_limiting() {
    let vertex = fit(&three_mixture_tracks());
    assert_eq!(vertex.vertex_state().num_components(), 8);

    // T vertex components times K track components
    let track = mixture_track(9, &[(0.2, [0.0; 3]), (0.3, [0.01, 0.0, 0.0]), (0.5, [0.0, 0.01, 0.0])], 0.1);
    let vertex_track = VertexTrack::new(track, vertex.vertex_state().clone(), 1.0);
    let (refitted, _) = vertex_and_track_update(
        &GsfKernel::new(),
        vertex.vertex_state(),
        &vertex_track,
        &vertex.position().unwrap(),
    )
    .unwrap();
    assert_eq!(refitted.num_components(), 24);

    let mut reporter = DebugReporter::new();
    GsfVertexSmoother::default()
        .smooth_with_reporter(&vertex, &mut reporter)
        .unwrap();
    let sizes: Vec<usize> = reporter
        .ascending_events()
        .iter()
        .map(|(_, v)| v.vertex_state().num_components())
        .collect();
    assert_eq!(sizes, vec![1, 2, 4]);
}

#[test]
fn test_component_limiting_bounds_mixture() {
    let vertex = fit(&three_mixture_tracks());
    let mut reporter = DebugReporter::new();

    let smoothed = limited_smoother(2)
        .smooth_with_reporter(&vertex, &mut reporter)
        .unwrap();

    let recorded = reporter
        .ascending_events()
        .iter()
        .chain(reporter.descending_events())
        .map(|(_, v)| v.vertex_state().num_components());
    for size in recorded {
        assert!(size <= 2, "mixture of {} components exceeds the bound", size);
    }
    // Merged vertex (≤ 2) times two track components
    for track in smoothed.tracks() {
        assert!(track.refitted_state().unwrap().num_components() <= 4);
    }
}

#[test]
fn test_three_track_scenario() {
    let tracks = vec![
        direct_track_at(1, [0.12, 0.0, 0.0], 0.05, [0.1, 0.0, 0.0]),
        direct_track_at(2, [0.0, 0.09, 0.01], 0.05, [0.0, 0.1, 0.0]),
        direct_track_at(3, [-0.02, 0.0, 0.11], 0.05, [0.0, 0.0, 0.1]),
    ];
    let vertex = fit(&tracks);
    let mut reporter = DebugReporter::new();

    let smoothed = GsfVertexSmoother::default()
        .smooth_with_reporter(&vertex, &mut reporter)
        .unwrap();

    assert_eq!(reporter.ascending_events().len(), 3);
    assert_eq!(reporter.descending_events().len(), 3);
    assert_eq!(reporter.smoothed_events().len(), 3);

    let per_track: f64 = reporter.smoothed_events().iter().map(|(_, _, chi2)| chi2).sum();
    assert_relative_close(per_track, smoothed.total_chi_squared(), 1e-6, "sum of track chi2");

    let stored: f64 = smoothed
        .tracks()
        .iter()
        .map(|t| t.smoothed_chi_squared().unwrap())
        .sum();
    assert_relative_close(stored, smoothed.total_chi_squared(), 1e-6, "sum of stored chi2");
}

#[test]
fn test_vertex_state_is_preserved() {
    let vertex = fit(&four_tracks());
    let smoothed = GsfVertexSmoother::default().smooth(&vertex).unwrap();

    assert_eq!(smoothed.vertex_state(), vertex.vertex_state());
    assert_eq!(smoothed.num_tracks(), vertex.num_tracks());
    for (before, after) in vertex.tracks().iter().zip(smoothed.tracks()) {
        assert_eq!(before.id(), after.id());
        assert_eq!(before.weight(), after.weight());
        assert_eq!(after.vertex_state(), vertex.vertex_state());
        assert!(Arc::ptr_eq(after.shared_vertex_state(), smoothed.shared_vertex_state()));
    }
    assert!(Arc::ptr_eq(smoothed.shared_vertex_state(), vertex.shared_vertex_state()));
}

#[test]
fn test_prior_seeds_and_contributes() {
    let prior_position = DVector::zeros(3);
    let prior_covariance = DMatrix::identity(3, 3) * 0.04;
    let vertex = GsfVertexFitter::default()
        .fit_with_prior(&four_tracks(), &prior_position, &prior_covariance)
        .unwrap();

    let mut reporter = DebugReporter::new();
    let smoothed = GsfVertexSmoother::default()
        .smooth_with_reporter(&vertex, &mut reporter)
        .unwrap();

    assert!(smoothed.has_prior());
    assert!(reporter.seed_events()[0].has_prior());

    let prior = vertex.prior_vertex_state().unwrap();
    let prior_chi2 = prior_vertex_chi2(&KalmanSmoothedChi2Estimator, prior, vertex.vertex_state()).unwrap();
    let tracks_chi2: f64 = smoothed
        .tracks()
        .iter()
        .map(|t| t.smoothed_chi_squared().unwrap())
        .sum();
    assert!(prior_chi2 > 0.0);
    assert_relative_close(smoothed.total_chi_squared(), tracks_chi2 + prior_chi2, 1e-9, "chi2 with prior");
}

#[test]
fn test_zero_total_weight_is_an_error() {
    let vertex = fit(&four_tracks());
    let err = GsfVertexSmoother::default()
        .with_weight_calculator(ZeroWeight)
        .smooth(&vertex)
        .unwrap_err();
    assert!(matches!(err, VertexError::ZeroTotalWeight { .. }));
}

#[test]
fn test_outlier_track_fits_and_smooths() {
    let mut tracks = four_tracks();
    tracks.push(direct_track(5, [5.0, 0.0, 0.0], 0.1));
    tracks.push(mixture_track(6, &[(0.5, [0.0, 8.0, 0.0]), (0.5, [0.0, 8.3, 0.0])], 0.1));

    let vertex = fit(&tracks);
    assert!(vertex.total_chi_squared().is_finite());
    assert_scalar_close(vertex.vertex_state().weight_in_mixture(), 1.0, 1e-12, "fitted weight sum");

    let smoothed = GsfVertexSmoother::default().smooth(&vertex).unwrap();
    let chi2: Vec<f64> = smoothed
        .tracks()
        .iter()
        .map(|t| t.smoothed_chi_squared().unwrap())
        .collect();
    for (track, value) in smoothed.tracks().iter().zip(&chi2) {
        assert!(value.is_finite() && *value >= 0.0);
        assert_scalar_close(
            track.refitted_state().unwrap().total_weight(),
            1.0,
            1e-12,
            "refitted weight sum",
        );
    }
    // The two outliers dominate the chi-square
    let inliers = chi2[..4].iter().cloned().fold(0.0, f64::max);
    assert!(chi2[4] > inliers && chi2[5] > inliers);
}

#[test]
fn test_empty_track_components_fail() {
    let state = VertexState::from_position(&DVector::zeros(3), &DMatrix::identity(3, 3)).unwrap();
    let empty = LinearizedTrackState::new(TrackId(1), DVector::zeros(3), vec![]).unwrap();
    let vertex = CachingVertex::new(
        state.clone(),
        vec![VertexTrack::new(Arc::new(empty), state, 1.0)],
        0.0,
    );

    let err = GsfVertexSmoother::default().smooth(&vertex).unwrap_err();
    assert!(matches!(err, VertexError::EmptyTrackComponents { .. }));
    assert!(err.is_precondition());
}

#[test]
fn test_empty_vertex_components_fail() {
    let state = VertexState::from_position(&DVector::zeros(3), &DMatrix::identity(3, 3)).unwrap();
    let track = VertexTrack::new(direct_track(1, [0.0; 3], 0.1), state.clone(), 1.0);
    let vertex = CachingVertex::with_prior(VertexState::Mixture(vec![]), state, vec![track], 0.0);

    let err = GsfVertexSmoother::default().smooth(&vertex).unwrap_err();
    assert!(matches!(err, VertexError::EmptyVertexComponents { .. }));
}

#[test]
fn test_mean_vertex_of_passes_excludes_own_track() {
    // For the middle track, ascending + descending records hold every other track once
    let tracks = four_tracks();
    let vertex = fit(&tracks);
    let mut reporter = DebugReporter::new();
    GsfVertexSmoother::default()
        .smooth_with_reporter(&vertex, &mut reporter)
        .unwrap();

    let ascending = &reporter.ascending_events()[1].1;
    let descending = reporter
        .descending_events()
        .iter()
        .find(|(i, _)| *i == 1)
        .map(|(_, v)| v)
        .unwrap();
    assert_eq!(ascending.num_tracks() + descending.num_tracks(), tracks.len() - 1);

    let meaned = mean_vertex(ascending.vertex_state(), descending.vertex_state()).unwrap();
    assert_eq!(meaned.num_components(), 1);
}
