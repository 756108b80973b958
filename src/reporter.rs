//! Observability for vertex smoothing.
//!
//! This module provides the [`SmoothingReporter`] trait for debugging and
//! research instrumentation. Reporters receive callbacks at key points of the
//! two-pass smoother without polluting the core algorithm.
//!
//! # Zero-Cost Abstraction
//!
//! The default [`NoOpReporter`] has empty callbacks which the compiler removes.
//!
//! # Example
//!
//! ```ignore
//! use gsf_vertex_rs::{DebugReporter, GsfVertexSmoother};
//!
//! let mut reporter = DebugReporter::new();
//! let smoothed = smoother.smooth_with_reporter(&vertex, &mut reporter)?;
//!
//! println!("{} ascending records", reporter.ascending_events().len());
//! ```

use crate::vertex::{CachingVertex, TrackId};

// ============================================================================
// SmoothingReporter Trait
// ============================================================================

/// Observability trait for smoother execution.
///
/// All methods have empty default implementations, so implementors only
/// override the events they care about.
///
/// # Thread Safety
///
/// Callbacks take `&mut self`, so reporters are not required to be
/// `Send + Sync`. Use interior mutability if a reporter is shared.
///
/// # Example
///
/// ```
/// use gsf_vertex_rs::reporter::SmoothingReporter;
/// use gsf_vertex_rs::vertex::TrackId;
///
/// struct ChiSquareSum(f64);
///
/// impl SmoothingReporter for ChiSquareSum {
///     fn on_track_smoothed(&mut self, _index: usize, _track: TrackId, chi_squared: f64) {
///         self.0 += chi_squared;
///     }
/// }
/// ```
pub trait SmoothingReporter {
    /// Called once with the seed of both passes.
    fn on_seed(&mut self, _seed: &CachingVertex) {}

    /// Called with the ascending-pass estimate recorded for track `index`.
    ///
    /// The estimate contains tracks `0..index` only.
    fn on_ascending_record(&mut self, _index: usize, _vertex: &CachingVertex) {}

    /// Called with the descending-pass estimate recorded for track `index`.
    ///
    /// The estimate contains tracks `index + 1..N` only.
    fn on_descending_record(&mut self, _index: usize, _vertex: &CachingVertex) {}

    /// Called after track `index` has been refitted.
    fn on_track_smoothed(&mut self, _index: usize, _track: TrackId, _chi_squared: f64) {}

    /// Called with the smoothed vertex.
    fn on_complete(&mut self, _vertex: &CachingVertex) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Reporter that does nothing. Used by [`smooth`](crate::GsfVertexSmoother::smooth).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    pub fn new() -> Self {
        Self
    }
}

impl SmoothingReporter for NoOpReporter {}

// ============================================================================
// DebugReporter
// ============================================================================

/// Reporter that captures all events for post-hoc inspection.
///
/// Stores clones of every recorded vertex, so memory grows with the number of
/// tracks times the mixture size.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    seeds: Vec<CachingVertex>,
    ascending: Vec<(usize, CachingVertex)>,
    descending: Vec<(usize, CachingVertex)>,
    smoothed: Vec<(usize, TrackId, f64)>,
    completed: Vec<CachingVertex>,
}

impl DebugReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.seeds.clear();
        self.ascending.clear();
        self.descending.clear();
        self.smoothed.clear();
        self.completed.clear();
    }

    pub fn seed_events(&self) -> &[CachingVertex] {
        &self.seeds
    }

    /// Ascending-pass records as (track index, estimate), in pass order.
    pub fn ascending_events(&self) -> &[(usize, CachingVertex)] {
        &self.ascending
    }

    /// Descending-pass records as (track index, estimate), in pass order.
    pub fn descending_events(&self) -> &[(usize, CachingVertex)] {
        &self.descending
    }

    /// Per-track smoothing results as (track index, track id, chi-square).
    pub fn smoothed_events(&self) -> &[(usize, TrackId, f64)] {
        &self.smoothed
    }

    pub fn complete_events(&self) -> &[CachingVertex] {
        &self.completed
    }

    pub fn total_events(&self) -> usize {
        self.seeds.len()
            + self.ascending.len()
            + self.descending.len()
            + self.smoothed.len()
            + self.completed.len()
    }
}

impl SmoothingReporter for DebugReporter {
    fn on_seed(&mut self, seed: &CachingVertex) {
        self.seeds.push(seed.clone());
    }

    fn on_ascending_record(&mut self, index: usize, vertex: &CachingVertex) {
        self.ascending.push((index, vertex.clone()));
    }

    fn on_descending_record(&mut self, index: usize, vertex: &CachingVertex) {
        self.descending.push((index, vertex.clone()));
    }

    fn on_track_smoothed(&mut self, index: usize, track: TrackId, chi_squared: f64) {
        self.smoothed.push((index, track, chi_squared));
    }

    fn on_complete(&mut self, vertex: &CachingVertex) {
        self.completed.push(vertex.clone());
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that emits events through the `log` crate.
///
/// Summary lines go to `info`, pass records to `debug` and per-track results
/// to `debug` (or `trace` unless verbose).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter {
    verbose: bool,
}

impl LoggingReporter {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl SmoothingReporter for LoggingReporter {
    fn on_seed(&mut self, seed: &CachingVertex) {
        log::debug!(
            "Smoothing seed: {} components, prior={}",
            seed.vertex_state().num_components(),
            seed.has_prior()
        );
    }

    fn on_ascending_record(&mut self, index: usize, vertex: &CachingVertex) {
        log::trace!(
            "Ascending record {}: {} tracks, {} components",
            index,
            vertex.num_tracks(),
            vertex.vertex_state().num_components()
        );
    }

    fn on_descending_record(&mut self, index: usize, vertex: &CachingVertex) {
        log::trace!(
            "Descending record {}: {} tracks, {} components",
            index,
            vertex.num_tracks(),
            vertex.vertex_state().num_components()
        );
    }

    fn on_track_smoothed(&mut self, index: usize, track: TrackId, chi_squared: f64) {
        if self.verbose {
            log::debug!("Track {} ({}) smoothed: chi2={:.4}", index, track, chi_squared);
        } else {
            log::trace!("Track {} ({}) smoothed: chi2={:.4}", index, track, chi_squared);
        }
    }

    fn on_complete(&mut self, vertex: &CachingVertex) {
        log::info!(
            "Smoothing complete: {} tracks, chi2={:.4}",
            vertex.num_tracks(),
            vertex.total_chi_squared()
        );
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Forwards every event to two reporters, first then second.
#[derive(Debug, Clone)]
pub struct CompositeReporter<A: SmoothingReporter, B: SmoothingReporter> {
    first: A,
    second: B,
}

impl<A: SmoothingReporter, B: SmoothingReporter> CompositeReporter<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: SmoothingReporter, B: SmoothingReporter> SmoothingReporter for CompositeReporter<A, B> {
    fn on_seed(&mut self, seed: &CachingVertex) {
        self.first.on_seed(seed);
        self.second.on_seed(seed);
    }

    fn on_ascending_record(&mut self, index: usize, vertex: &CachingVertex) {
        self.first.on_ascending_record(index, vertex);
        self.second.on_ascending_record(index, vertex);
    }

    fn on_descending_record(&mut self, index: usize, vertex: &CachingVertex) {
        self.first.on_descending_record(index, vertex);
        self.second.on_descending_record(index, vertex);
    }

    fn on_track_smoothed(&mut self, index: usize, track: TrackId, chi_squared: f64) {
        self.first.on_track_smoothed(index, track, chi_squared);
        self.second.on_track_smoothed(index, track, chi_squared);
    }

    fn on_complete(&mut self, vertex: &CachingVertex) {
        self.first.on_complete(vertex);
        self.second.on_complete(vertex);
    }
}

// ============================================================================
// Tests
// ============================================================================
