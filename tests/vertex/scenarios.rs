//! End-to-end fit and smooth on synthetic straight-line scenarios.

use gsf_vertex_rs::bench_utils::{generate_scenario, ScenarioParams};
use gsf_vertex_rs::{
    GsfVertexFitter, GsfVertexMerger, GsfVertexSmoother, LoggingReporter, MergerConfig,
    SmootherConfig, VertexMerger,
};

use crate::helpers::assertions::assert_scalar_close;

fn pipeline(max_components: usize) -> (GsfVertexFitter, GsfVertexSmoother) {
    let config = SmootherConfig::new(true);
    let merger = GsfVertexMerger::with_max_components(max_components);
    (
        GsfVertexFitter::new(config.clone(), merger.clone()),
        GsfVertexSmoother::new(config, merger),
    )
}

#[test]
fn test_fit_and_smooth_recovers_vertex() {
    for seed in [1, 2, 3] {
        let scenario = generate_scenario(&ScenarioParams::new(6, 1).with_seed(seed)).unwrap();
        let (fitter, smoother) = pipeline(4);

        let smoothed = fitter.fit_and_smooth(&scenario.linearized, &smoother).unwrap();
        let position = smoothed.position().unwrap();
        assert!(
            (position - &scenario.true_vertex).norm() < 0.2,
            "seed {}: fitted vertex too far from the truth",
            seed
        );
        assert_eq!(smoothed.num_tracks(), 6);
        assert!(smoothed.total_chi_squared().is_finite());
        assert!(smoothed.total_chi_squared() >= 0.0);
    }
}

#[test]
fn test_gaussian_sum_tracks_stay_bounded() {
    let scenario = generate_scenario(&ScenarioParams::new(5, 2).with_seed(11)).unwrap();
    let (fitter, smoother) = pipeline(3);

    let vertex = fitter.fit(&scenario.linearized).unwrap();
    assert!(vertex.vertex_state().num_components() <= smoother.merger().max_components());

    let smoothed = smoother
        .smooth_with_reporter(&vertex, &mut LoggingReporter::new())
        .unwrap();
    for track in smoothed.tracks() {
        let refitted = track.refitted_state().unwrap();
        assert_scalar_close(refitted.total_weight(), 1.0, 1e-9, "refitted weight sum");
        // At most 3 vertex components times 2 track components
        assert!(refitted.num_components() <= 6);
        assert!(track.smoothed_chi_squared().unwrap() >= 0.0);
    }
}

#[test]
fn test_merge_threshold_reduces_further() {
    let scenario = generate_scenario(&ScenarioParams::new(4, 2).with_seed(5)).unwrap();
    let config = SmootherConfig::new(true);

    let bounded = GsfVertexFitter::new(config.clone(), GsfVertexMerger::with_max_components(8))
        .fit(&scenario.linearized)
        .unwrap();
    let thresholded = GsfVertexFitter::new(
        config,
        GsfVertexMerger::new(MergerConfig::new(8).with_merge_threshold(1e6)),
    )
    .fit(&scenario.linearized)
    .unwrap();

    // Every pair is within a huge threshold, so the mixture collapses
    assert_eq!(thresholded.vertex_state().num_components(), 1);
    assert!(bounded.vertex_state().num_components() > 1);
}
