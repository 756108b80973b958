//! Synthetic vertex scenarios shared between Criterion benchmarks and tests.
//!
//! This module provides:
//! - Seeded generation of straight-line Gaussian-sum tracks from a common vertex
//! - Linearization of a scenario around a common point
//! - Common benchmark sizes

use std::f64::consts::PI;
use std::sync::Arc;

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::components::StraightLineLinearizer;
use crate::vertex::{
    LinearizedTrackState, RecoTrack, RecoTrackComponent, TrackId, TrackLinearizer, TrackRef,
    VertexError,
};

// =============================================================================
// Benchmark Sizes
// =============================================================================

/// Track multiplicities used by the benchmarks
pub const BENCH_TRACK_COUNTS: [usize; 3] = [4, 8, 16];

/// Components per track used by the benchmarks
pub const BENCH_COMPONENTS_PER_TRACK: [usize; 2] = [1, 2];

// =============================================================================
// Scenario
// =============================================================================

/// Parameters of a synthetic scenario
#[derive(Debug, Clone)]
pub struct ScenarioParams {
    pub num_tracks: usize,
    pub components_per_track: usize,
    /// Transverse position resolution of every component
    pub transverse_sigma: f64,
    /// Momentum resolution of every component
    pub momentum_sigma: f64,
    /// Offset of the linearization point from the true vertex
    pub linearization_offset: f64,
    pub seed: u64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            num_tracks: 5,
            components_per_track: 1,
            transverse_sigma: 0.01,
            momentum_sigma: 0.05,
            linearization_offset: 0.02,
            seed: 42,
        }
    }
}

impl ScenarioParams {
    pub fn new(num_tracks: usize, components_per_track: usize) -> Self {
        Self {
            num_tracks,
            components_per_track,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Tracks emerging from one vertex, persisted and linearized
#[derive(Debug, Clone)]
pub struct VertexScenario {
    pub true_vertex: DVector<f64>,
    pub linearization_point: DVector<f64>,
    pub tracks: Vec<RecoTrack>,
    pub linearized: Vec<Arc<LinearizedTrackState>>,
}

fn random_direction(rng: &mut StdRng) -> DVector<f64> {
    let cos_theta: f64 = rng.gen_range(-0.9..0.9);
    let phi: f64 = rng.gen_range(0.0..2.0 * PI);
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    DVector::from_vec(vec![sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta])
}

/// Generate a seeded scenario.
///
/// Each track is a straight line from the true vertex. Its components are
/// displaced copies of the line, with weights drawn uniformly and normalised.
pub fn generate_scenario(params: &ScenarioParams) -> Result<VertexScenario, VertexError> {
    let mut rng = StdRng::seed_from_u64(params.seed);

    let true_vertex = DVector::from_vec(vec![
        rng.gen_range(-0.1..0.1),
        rng.gen_range(-0.1..0.1),
        rng.gen_range(-1.0..1.0),
    ]);
    let linearization_point = &true_vertex + DVector::from_element(3, params.linearization_offset);

    let mut tracks = Vec::with_capacity(params.num_tracks);
    for t in 0..params.num_tracks {
        let direction = random_direction(&mut rng);
        let momentum = &direction * rng.gen_range(0.5..5.0);
        let flight = rng.gen_range(1.0..10.0);

        let raw_weights: Vec<f64> = (0..params.components_per_track)
            .map(|_| rng.gen_range(0.2..1.0))
            .collect();
        let total: f64 = raw_weights.iter().sum();

        let components = raw_weights
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let spread = params.transverse_sigma * (1.0 + k as f64);
                let smear = DVector::from_fn(3, |_, _| {
                    let z: f64 = StandardNormal.sample(&mut rng);
                    spread * z
                });
                let reference_point = &true_vertex + &direction * flight + smear;
                RecoTrackComponent::new(
                    w / total,
                    reference_point,
                    momentum.clone(),
                    spread,
                    params.momentum_sigma,
                )
            })
            .collect();

        tracks.push(RecoTrack {
            id: TrackId(t as u64),
            persistent_ref: Some(TrackRef(1000 + t as u64)),
            components,
        });
    }

    let linearized = linearize_all(&tracks, &linearization_point)?;

    Ok(VertexScenario {
        true_vertex,
        linearization_point,
        tracks,
        linearized,
    })
}

/// Linearize every track around one point.
pub fn linearize_all(
    tracks: &[RecoTrack],
    point: &DVector<f64>,
) -> Result<Vec<Arc<LinearizedTrackState>>, VertexError> {
    let linearizer = StraightLineLinearizer::new();
    tracks
        .iter()
        .map(|t| linearizer.linearize(point, t).map(Arc::new))
        .collect()
}
