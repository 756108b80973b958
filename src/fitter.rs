//! Sequential Gaussian-sum vertex fit.
//!
//! Starts from a vague seed (or a prior) and adds the tracks one at a time with
//! the Gaussian-sum updator, merging after each step when component limiting is
//! enabled. The result is the forward-only fit that the smoother refines.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::components::{GsfVertexMerger, GsfVertexUpdator};
use crate::smoother::GsfVertexSmoother;
use crate::vertex::{
    CachingVertex, LinearizedTrackState, SmootherConfig, VertexComponent, VertexError, VertexMerger,
    VertexState, VertexTrackFactory, VertexUpdator, WeightCalculator,
};

/// Forward Gaussian-sum vertex fitter
///
/// Shares [`SmootherConfig`] with the smoother: the same seed variance and the
/// same component limiting apply to both.
#[derive(Debug, Clone)]
pub struct GsfVertexFitter<U: VertexUpdator = GsfVertexUpdator, M: VertexMerger = GsfVertexMerger> {
    config: SmootherConfig,
    updator: U,
    merger: M,
    factory: VertexTrackFactory,
}

impl<M: VertexMerger> GsfVertexFitter<GsfVertexUpdator, M> {
    pub fn new(config: SmootherConfig, merger: M) -> Self {
        Self {
            config,
            updator: GsfVertexUpdator::new(),
            merger,
            factory: VertexTrackFactory::new(),
        }
    }
}

impl Default for GsfVertexFitter {
    fn default() -> Self {
        Self::new(SmootherConfig::default(), GsfVertexMerger::default())
    }
}

impl<U: VertexUpdator, M: VertexMerger> GsfVertexFitter<U, M> {
    /// Replace the single-track updator.
    pub fn with_updator<U2: VertexUpdator>(self, updator: U2) -> GsfVertexFitter<U2, M> {
        GsfVertexFitter {
            config: self.config,
            updator,
            merger: self.merger,
            factory: self.factory,
        }
    }

    pub fn config(&self) -> &SmootherConfig {
        &self.config
    }

    /// Fit without a prior, seeding at the first track's linearization point.
    pub fn fit(&self, tracks: &[Arc<LinearizedTrackState>]) -> Result<CachingVertex, VertexError> {
        let first = tracks.first().ok_or(VertexError::NoTracks)?;
        let seed = VertexComponent::flat(first.linearization_point(), self.config.flat_prior_variance)?;
        self.add_all(CachingVertex::new(seed.into(), vec![], 0.0), tracks)
    }

    /// Fit constrained by a prior position and covariance.
    pub fn fit_with_prior(
        &self,
        tracks: &[Arc<LinearizedTrackState>],
        prior_position: &DVector<f64>,
        prior_covariance: &DMatrix<f64>,
    ) -> Result<CachingVertex, VertexError> {
        if tracks.is_empty() {
            return Err(VertexError::NoTracks);
        }
        let prior = VertexState::from_position(prior_position, prior_covariance)?;
        self.add_all(CachingVertex::with_prior(prior.clone(), prior, vec![], 0.0), tracks)
    }

    /// Fit, then smooth the result.
    pub fn fit_and_smooth<SM, SU, SW>(
        &self,
        tracks: &[Arc<LinearizedTrackState>],
        smoother: &GsfVertexSmoother<SM, SU, SW>,
    ) -> Result<CachingVertex, VertexError>
    where
        SM: VertexMerger,
        SU: VertexUpdator,
        SW: WeightCalculator,
    {
        smoother.smooth(&self.fit(tracks)?)
    }

    fn add_all(
        &self,
        seed: CachingVertex,
        tracks: &[Arc<LinearizedTrackState>],
    ) -> Result<CachingVertex, VertexError> {
        let mut vertex = seed;
        for track in tracks {
            let vertex_track = self.factory.vertex_track(track.clone(), vertex.shared_vertex_state().clone());
            vertex = self.updator.add(&vertex, &vertex_track)?;
            if self.config.limit_components {
                vertex = self.merger.merge(&vertex)?;
            }
        }
        log::debug!(
            "{} fit: {} tracks, {} components, chi2={:.4}",
            self.updator.name(),
            vertex.num_tracks(),
            vertex.vertex_state().num_components(),
            vertex.total_chi_squared()
        );
        Ok(vertex)
    }
}
