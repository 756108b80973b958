//! Compatibility estimator against fitted and smoothed vertices.

use nalgebra::DVector;

use gsf_vertex_rs::bench_utils::{generate_scenario, ScenarioParams};
use gsf_vertex_rs::{
    GsfVertexFitter, GsfVertexSmoother, GsfVertexTrackCompatibilityEstimator, GsfVertexUpdator,
    RecoTrack, RecoTrackComponent, RecoVertex, TrackId, VertexError, VertexTrack, VertexUpdator,
};

use crate::helpers::assertions::assert_scalar_close;
use crate::helpers::fixtures::{direct_track, fit, four_tracks, mixture_track};

#[test]
fn test_member_returns_stored_chi2_exactly() {
    let smoothed = GsfVertexSmoother::default().smooth(&fit(&four_tracks())).unwrap();
    let estimator = GsfVertexTrackCompatibilityEstimator::new();

    for track in smoothed.tracks() {
        let stored = track.smoothed_chi_squared().unwrap();
        let estimated = estimator.estimate(&smoothed, track).unwrap();
        assert_eq!(estimated.to_bits(), stored.to_bits());
    }
}

#[test]
fn test_member_of_unsmoothed_vertex_fails() {
    let vertex = fit(&four_tracks());
    let estimator = GsfVertexTrackCompatibilityEstimator::new();

    let err = estimator.estimate(&vertex, &vertex.tracks()[2]).unwrap_err();
    assert_eq!(err, VertexError::NotSmoothed { track: TrackId(3) });
    assert!(err.is_precondition());
}

#[test]
fn test_outsider_costs_its_chi2_delta() {
    let vertex = GsfVertexSmoother::default().smooth(&fit(&four_tracks())).unwrap();
    let estimator = GsfVertexTrackCompatibilityEstimator::new();

    let outsider = direct_track(10, [0.05, -0.03, 0.02], 0.1);
    let chi2 = estimator.estimate_linearized(&vertex, outsider.clone()).unwrap();
    assert!(chi2 >= 0.0);

    let trial = GsfVertexUpdator::new()
        .add(&vertex, &VertexTrack::new(outsider, vertex.vertex_state().clone(), 1.0))
        .unwrap();
    assert_scalar_close(
        chi2,
        trial.total_chi_squared() - vertex.total_chi_squared(),
        1e-12,
        "chi2 delta",
    );

    let far = estimator
        .estimate_linearized(&vertex, direct_track(11, [1.5, -1.0, 0.5], 0.1))
        .unwrap();
    assert!(far > chi2);
}

#[test]
fn test_distant_outsiders_are_scored() {
    let vertex = GsfVertexSmoother::default().smooth(&fit(&four_tracks())).unwrap();
    let estimator = GsfVertexTrackCompatibilityEstimator::new();

    // Every pair density underflows at these distances; the chi2 must not
    let mut previous = 0.0;
    for (id, distance) in [(20, 5.0), (21, 10.0), (22, 50.0)] {
        let outsider = direct_track(id, [distance, 0.0, 0.0], 0.1);
        let chi2 = estimator.estimate_linearized(&vertex, outsider.clone()).unwrap();
        assert!(chi2.is_finite());
        assert!(chi2 > previous, "chi2 {} at distance {} should exceed {}", chi2, distance, previous);
        previous = chi2;

        let trial = GsfVertexUpdator::new()
            .add(&vertex, &VertexTrack::new(outsider, vertex.vertex_state().clone(), 1.0))
            .unwrap();
        assert_scalar_close(
            chi2,
            trial.total_chi_squared() - vertex.total_chi_squared(),
            1e-9 * chi2,
            "outsider chi2 delta",
        );
    }

    let mixture = mixture_track(23, &[(0.5, [10.0, 0.0, 0.0]), (0.5, [10.2, 0.0, 0.0])], 0.1);
    let chi2 = estimator.estimate_linearized(&vertex, mixture).unwrap();
    assert!(chi2.is_finite() && chi2 > 0.0);
}

#[test]
fn test_reco_tracks_against_reco_vertex() {
    let scenario = generate_scenario(&ScenarioParams::new(5, 1).with_seed(3)).unwrap();
    let vertex = GsfVertexFitter::default().fit(&scenario.linearized).unwrap();

    let reco_vertex = RecoVertex {
        position: vertex.position().unwrap(),
        covariance: vertex.covariance().unwrap(),
        chi_squared: vertex.total_chi_squared(),
        track_refs: scenario.tracks.iter().filter_map(|t| t.persistent_ref).collect(),
    };
    let estimator = GsfVertexTrackCompatibilityEstimator::new();

    // Member tracks need a smoothed vertex, which a persisted vertex never carries
    let err = estimator.estimate_reco(&reco_vertex, &scenario.tracks[0]).unwrap_err();
    assert!(matches!(err, VertexError::NotSmoothed { .. }));

    let outsider = RecoTrack::single(
        TrackId(99),
        None,
        RecoTrackComponent::new(
            1.0,
            &scenario.true_vertex + DVector::from_vec(vec![0.0, 0.5, 2.0]),
            DVector::from_vec(vec![0.0, 1.0, 4.0]),
            0.01,
            0.05,
        ),
    );
    let chi2 = estimator.estimate_reco(&reco_vertex, &outsider).unwrap();
    assert!(chi2 >= 0.0 && chi2.is_finite());
}
