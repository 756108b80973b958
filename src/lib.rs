/*!
# gsf-vertex-rs - Gaussian-sum vertex smoothing

Rust implementation of the Gaussian-sum filter (GSF) vertex smoother and the
track-to-vertex compatibility estimator. Vertex and track uncertainties are
Gaussian mixtures; every combination step works on the full cross product of
components, with optional mixture reduction.

## Features

- Two-pass (ascending/descending) smoother refitting every track against the
  vertex estimated from all other tracks
- Chi-square compatibility of a track with a fitted vertex
- Sequential Gaussian-sum vertex fitter, with or without a prior constraint
- Moment-preserving component merging

## Modules

- [`vertex`] - Vertex and track types, collaborator traits, errors, configuration
- [`components`] - Kalman update, weights, merger, linearization
- [`smoother`] - The two-pass smoother and its mixture combinations
- [`compatibility`] - Track compatibility estimator
- [`fitter`] - Sequential vertex fit
- [`reporter`] - Observability hooks
- [`common`] - Linear algebra and constants

## Example

```rust,no_run
use gsf_vertex_rs::{GsfVertexFitter, GsfVertexMerger, GsfVertexSmoother, SmootherConfig};
use gsf_vertex_rs::bench_utils::{generate_scenario, ScenarioParams};

let scenario = generate_scenario(&ScenarioParams::new(5, 2)).unwrap();

let config = SmootherConfig::new(true);
let merger = GsfVertexMerger::with_max_components(4);
let fitter = GsfVertexFitter::new(config.clone(), merger.clone());
let smoother = GsfVertexSmoother::new(config, merger);

let smoothed = fitter.fit_and_smooth(&scenario.linearized, &smoother).unwrap();
for track in smoothed.tracks() {
    println!("{}: chi2={:?}", track.id(), track.smoothed_chi_squared());
}
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Vertex domain types, collaborator traits, configuration and errors
pub mod vertex;

/// Default collaborator implementations
pub mod components;

/// Two-pass Gaussian-sum smoother
pub mod smoother;

/// Track-to-vertex compatibility
pub mod compatibility;

/// Sequential Gaussian-sum vertex fit
pub mod fitter;

/// Smoothing observability
pub mod reporter;

/// Low-level utilities (linear algebra, constants)
pub mod common;

/// Synthetic scenarios for benchmarks and tests
pub mod bench_utils;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Core types
pub use vertex::{
    CachingVertex, LinearizedTrackComponent, LinearizedTrackState, RecoTrack, RecoTrackComponent,
    RecoVertex, RefittedTrackComponent, RefittedTrackState, TrackId, TrackRef, VertexComponent,
    VertexState, VertexTrack, VertexTrackFactory,
};

// Configuration and errors
pub use vertex::{MergerConfig, SmootherConfig, VertexError};

// Traits
pub use vertex::{
    ChiSquareEstimator, PositionUpdator, TrackLinearizer, TrackRefitter, UpdateSign, VertexMerger,
    VertexUpdator, WeightCalculator,
};

// Collaborator implementations
pub use components::{
    GsfKernel, GsfVertexMerger, GsfVertexUpdator, GsfWeightCalculator, KalmanSmoothedChi2Estimator,
    KalmanVertexTrackUpdator, KalmanVertexUpdator, StraightLineLinearizer,
};

// Entry points
pub use compatibility::GsfVertexTrackCompatibilityEstimator;
pub use fitter::GsfVertexFitter;
pub use smoother::GsfVertexSmoother;

// Reporters
pub use reporter::{CompositeReporter, DebugReporter, LoggingReporter, NoOpReporter, SmoothingReporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
