//! Two-pass Gaussian-sum vertex smoother
//!
//! A forward fit only lets track `i` see the tracks added before it. The
//! smoother refits every track against the vertex estimated from all the other
//! tracks:
//!
//! 1. Seed a vague single-component vertex (or use the prior, if any)
//! 2. Ascending pass: record the estimate before each track, then add it
//! 3. Descending pass: the same in reverse order
//! 4. For each track, combine the two records that exclude it, then refit it
//!    against the combination
//!
//! Two O(N) passes replace N separate leave-one-out fits. The vertex state of
//! the input is returned unchanged; only the tracks are refitted.

pub mod combine;

use crate::components::{GsfKernel, GsfVertexMerger, GsfVertexUpdator, GsfWeightCalculator};
use crate::reporter::{NoOpReporter, SmoothingReporter};
use crate::vertex::{
    CachingVertex, SmootherConfig, VertexComponent, VertexError, VertexMerger, VertexTrack,
    VertexTrackFactory, VertexUpdator, WeightCalculator,
};

pub use combine::{
    assemble_track_components, create_new_component, mean_vertex, prior_vertex_chi2,
    vertex_and_track_update, TrackComponentResult,
};

/// Gaussian-sum vertex smoother
///
/// Owns its merger, single-track updator and the weight calculator used when
/// refitting tracks. All are used read-only, so one smoother can serve
/// concurrent [`smooth`](Self::smooth) calls.
///
/// # Type Parameters
/// * `M` - Mixture merger
/// * `U` - Single-track updator used by both passes
/// * `W` - Weight calculator used for the per-track refit
#[derive(Debug, Clone)]
pub struct GsfVertexSmoother<
    M: VertexMerger = GsfVertexMerger,
    U: VertexUpdator = GsfVertexUpdator,
    W: WeightCalculator = GsfWeightCalculator,
> {
    config: SmootherConfig,
    merger: M,
    updator: U,
    kernel: GsfKernel<W>,
    factory: VertexTrackFactory,
}

impl<M: VertexMerger> GsfVertexSmoother<M> {
    /// Smoother with the default updator and weight calculator.
    pub fn new(config: SmootherConfig, merger: M) -> Self {
        Self {
            config,
            merger,
            updator: GsfVertexUpdator::new(),
            kernel: GsfKernel::new(),
            factory: VertexTrackFactory::new(),
        }
    }
}

impl Default for GsfVertexSmoother {
    fn default() -> Self {
        Self::new(SmootherConfig::default(), GsfVertexMerger::default())
    }
}

impl<M, U, W> GsfVertexSmoother<M, U, W>
where
    M: VertexMerger,
    U: VertexUpdator,
    W: WeightCalculator,
{
    /// Replace the single-track updator.
    pub fn with_updator<U2: VertexUpdator>(self, updator: U2) -> GsfVertexSmoother<M, U2, W> {
        GsfVertexSmoother {
            config: self.config,
            merger: self.merger,
            updator,
            kernel: self.kernel,
            factory: self.factory,
        }
    }

    /// Replace the weight calculator used for the per-track refit.
    pub fn with_weight_calculator<W2: WeightCalculator>(
        self,
        weight_calculator: W2,
    ) -> GsfVertexSmoother<M, U, W2> {
        GsfVertexSmoother {
            config: self.config,
            merger: self.merger,
            updator: self.updator,
            kernel: self.kernel.with_weight_calculator(weight_calculator),
            factory: self.factory,
        }
    }

    pub fn config(&self) -> &SmootherConfig {
        &self.config
    }

    pub fn merger(&self) -> &M {
        &self.merger
    }

    pub fn updator(&self) -> &U {
        &self.updator
    }

    /// Smooth a fitted vertex.
    ///
    /// # Errors
    /// * [`VertexError::NoTracks`] if the vertex has no tracks
    /// * [`VertexError::EmptyVertexComponents`] / [`VertexError::EmptyTrackComponents`]
    ///   if a state used in a combination has no components
    /// * any error of the collaborators
    pub fn smooth(&self, vertex: &CachingVertex) -> Result<CachingVertex, VertexError> {
        self.smooth_with_reporter(vertex, &mut NoOpReporter)
    }

    /// Smooth a fitted vertex, reporting intermediate results.
    pub fn smooth_with_reporter<Rep: SmoothingReporter + ?Sized>(
        &self,
        vertex: &CachingVertex,
        reporter: &mut Rep,
    ) -> Result<CachingVertex, VertexError> {
        let tracks = vertex.tracks();
        let first = tracks.first().ok_or(VertexError::NoTracks)?;
        let n = tracks.len();

        let seed = match vertex.shared_prior_vertex_state() {
            Some(prior) => CachingVertex::from_shared(prior.clone(), Some(prior.clone()), vec![], 0.0),
            None => {
                let point = first.linearized_track().linearization_point();
                let flat = VertexComponent::flat(point, self.config.flat_prior_variance)?;
                CachingVertex::new(flat.into(), vec![], 0.0)
            }
        };
        reporter.on_seed(&seed);

        // ascending[i] holds tracks 0..i
        let mut ascending = Vec::with_capacity(n);
        let mut running = seed.clone();
        for (i, track) in tracks.iter().enumerate() {
            reporter.on_ascending_record(i, &running);
            ascending.push(running.clone());
            if i + 1 < n {
                running = self.add_track(&running, track)?;
            }
        }

        // descending[i] holds tracks i+1..n
        let mut descending = Vec::with_capacity(n);
        let mut running = seed;
        for (i, track) in tracks.iter().enumerate().rev() {
            reporter.on_descending_record(i, &running);
            descending.push(running.clone());
            if i > 0 {
                running = self.add_track(&running, track)?;
            }
        }
        descending.reverse();

        let reference_position = vertex.position()?;
        let mut total_chi_squared = 0.0;
        let mut smoothed_tracks = Vec::with_capacity(n);
        let vertex_state = vertex.shared_vertex_state();

        for (i, track) in tracks.iter().enumerate() {
            let meaned = mean_vertex(ascending[i].vertex_state(), descending[i].vertex_state())?;
            let meaned = if self.config.limit_components {
                self.merger.merge_state(&meaned)?
            } else {
                meaned
            };

            let (refitted, chi_squared) =
                vertex_and_track_update(&self.kernel, &meaned, track, &reference_position)?;
            reporter.on_track_smoothed(i, track.id(), chi_squared);
            total_chi_squared += chi_squared;

            smoothed_tracks.push(self.factory.refitted_vertex_track(
                track.linearized_track().clone(),
                vertex_state.clone(),
                refitted,
                chi_squared,
                track.weight(),
            ));
        }

        if let Some(prior) = vertex.prior_vertex_state() {
            total_chi_squared += prior_vertex_chi2(&self.kernel.chi_square, prior, vertex_state)?;
        }
        let smoothed = CachingVertex::from_shared(
            vertex_state.clone(),
            vertex.shared_prior_vertex_state().cloned(),
            smoothed_tracks,
            total_chi_squared,
        );

        reporter.on_complete(&smoothed);
        Ok(smoothed)
    }

    /// One incremental step of a pass, merging if enabled.
    fn add_track(&self, vertex: &CachingVertex, track: &VertexTrack) -> Result<CachingVertex, VertexError> {
        let updated = self.updator.add(vertex, track)?;
        if self.config.limit_components {
            self.merger.merge(&updated)
        } else {
            Ok(updated)
        }
    }
}
