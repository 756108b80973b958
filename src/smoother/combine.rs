//! Mixture combinations used by the smoother
//!
//! - [`create_new_component`] - one (vertex component, track component) pair
//! - [`assemble_track_components`] - normalise pair results into a refitted track
//! - [`vertex_and_track_update`] - full cross product for one track
//! - [`mean_vertex`] - product of two independent vertex estimates
//! - [`prior_vertex_chi2`] - chi-square of a fitted state against a prior
//!
//! All functions are pure; nothing here touches a [`CachingVertex`](crate::vertex::CachingVertex).

use nalgebra::DVector;

use crate::common::linalg::normalize_log_weights;
use crate::components::GsfKernel;
use crate::vertex::{
    ChiSquareEstimator, LinearizedTrackComponent, PositionUpdator, RefittedTrackComponent,
    RefittedTrackState, TrackRefitter, VertexComponent, VertexError, VertexState, VertexTrack,
    WeightCalculator,
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Refitted track component with its log pair weight and chi-square
#[derive(Debug, Clone)]
pub struct TrackComponentResult {
    pub refitted: RefittedTrackComponent,
    pub log_weight: f64,
    pub chi_squared: f64,
}

/// Combine one vertex component with one track component.
///
/// Weights the pair, adds the track component to the vertex component, refits
/// the track component against the result and scores it.
pub fn create_new_component<W, P, R, C>(
    kernel: &GsfKernel<W, P, R, C>,
    vertex: &VertexComponent,
    track: &LinearizedTrackComponent,
    track_weight: f64,
) -> Result<TrackComponentResult, VertexError>
where
    W: WeightCalculator,
    P: PositionUpdator,
    R: TrackRefitter,
    C: ChiSquareEstimator,
{
    let pair = kernel.combine_pair(vertex, track, track_weight)?;
    Ok(TrackComponentResult {
        log_weight: pair.log_weight,
        chi_squared: pair.track_chi_squared,
        refitted: pair.refitted.with_chi_squared(pair.track_chi_squared),
    })
}

/// Build one refitted track state from its pair results.
///
/// The returned chi-square is the weight-averaged pair chi-square. Log weights
/// are normalised so the component weights sum to one; components whose
/// normalised weight is exactly zero are dropped.
///
/// # Errors
/// [`VertexError::ZeroTotalWeight`] if every pair weight is zero,
/// [`VertexError::NumericalInstability`] for a NaN or infinite log weight.
pub fn assemble_track_components(
    results: Vec<TrackComponentResult>,
    reference_position: DVector<f64>,
) -> Result<(RefittedTrackState, f64), VertexError> {
    let log_weights: Vec<f64> = results.iter().map(|r| r.log_weight).collect();
    let weights = normalize_log_weights(&log_weights, "track assembly")?;

    let chi_squared: f64 = weights
        .iter()
        .zip(&results)
        .map(|(w, r)| w * r.chi_squared)
        .sum();

    let components = weights
        .into_iter()
        .zip(results)
        .filter(|(w, _)| *w != 0.0)
        .map(|(w, r)| r.refitted.with_weight(w));

    Ok((RefittedTrackState::new(reference_position, components), chi_squared))
}

/// Refit one track against a (possibly mixture) vertex state.
///
/// Every vertex component is combined with every track component; the
/// results are assembled into the track's refitted state.
pub fn vertex_and_track_update<W, P, R, C>(
    kernel: &GsfKernel<W, P, R, C>,
    vertex: &VertexState,
    track: &VertexTrack,
    reference_position: &DVector<f64>,
) -> Result<(RefittedTrackState, f64), VertexError>
where
    W: WeightCalculator,
    P: PositionUpdator,
    R: TrackRefitter,
    C: ChiSquareEstimator,
{
    let vertex_components = vertex.require_components("vertex and track update")?;
    let track_components = track
        .linearized_track()
        .require_components("vertex and track update")?;

    let pairs: Vec<(&VertexComponent, &LinearizedTrackComponent)> = vertex_components
        .iter()
        .flat_map(|v| track_components.iter().map(move |t| (*v, t)))
        .collect();

    #[cfg(feature = "rayon")]
    let results = pairs
        .par_iter()
        .map(|(v, t)| create_new_component(kernel, v, t, track.weight()))
        .collect::<Result<Vec<_>, VertexError>>()?;

    #[cfg(not(feature = "rayon"))]
    let results = pairs
        .iter()
        .map(|(v, t)| create_new_component(kernel, v, t, track.weight()))
        .collect::<Result<Vec<_>, VertexError>>()?;

    assemble_track_components(results, reference_position.clone())
}

/// Statistical product of two independent vertex estimates.
///
/// Each pair of components is combined by adding weight matrices and
/// weight-times-position vectors and multiplying mixture weights. The result
/// has `|a|·|b|` components and is not renormalised.
pub fn mean_vertex(a: &VertexState, b: &VertexState) -> Result<VertexState, VertexError> {
    let a_components = a.require_components("mean vertex")?;
    let b_components = b.require_components("mean vertex")?;

    let mut components = Vec::with_capacity(a_components.len() * b_components.len());
    for ca in &a_components {
        for cb in &b_components {
            components.push(VertexComponent::new(
                ca.weight_times_position() + cb.weight_times_position(),
                ca.weight_matrix() + cb.weight_matrix(),
                ca.weight_in_mixture() * cb.weight_in_mixture(),
            )?);
        }
    }
    Ok(VertexState::from_components(components))
}

/// Chi-square of a fitted state with respect to a prior.
///
/// Sum over (prior component, fitted component) pairs of the pair chi-square
/// times the product of the two mixture weights.
pub fn prior_vertex_chi2<C: ChiSquareEstimator>(
    estimator: &C,
    prior: &VertexState,
    fitted: &VertexState,
) -> Result<f64, VertexError> {
    let prior_components = prior.require_components("prior chi-square")?;
    let fitted_components = fitted.require_components("prior chi-square")?;

    let mut chi2 = 0.0;
    for p in &prior_components {
        for f in &fitted_components {
            let weight = p.weight_in_mixture() * f.weight_in_mixture();
            chi2 += weight * estimator.prior_vertex_chi2(p, f)?;
        }
    }
    Ok(chi2)
}
