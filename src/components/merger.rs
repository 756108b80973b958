//! Vertex mixture reduction.
//!
//! Components are merged pairwise, closest first, with moment preservation:
//! ```text
//! w  = w_i + w_j
//! μ  = (w_i·μ_i + w_j·μ_j) / w
//! Σ  = (w_i·Σ_i + w_j·Σ_j) / w + (w_i·w_j / w²)·(μ_i - μ_j)(μ_i - μ_j)ᵀ
//! ```
//! Distances are Mahalanobis distances under the covariance of the heavier
//! component of the pair. Mixture weights are summed, not renormalised, so the
//! total weight of the state is preserved.

use nalgebra::{DMatrix, DVector};

use crate::common::constants::NUMERICAL_ZERO;
use crate::common::linalg::{mahalanobis_distance, symmetrize};
use crate::vertex::{MergerConfig, VertexComponent, VertexError, VertexMerger, VertexState};

/// Merge moments in place until the mixture is small enough.
///
/// Merging continues while there are more than `max_components` entries, or
/// while the closest pair is within `merge_threshold`. An infinite threshold
/// disables distance-based merging.
///
/// # Arguments
/// * `components` - (weight, mean, covariance) tuples
/// * `merge_threshold` - Mahalanobis distance below which pairs are always merged
/// * `max_components` - Maximum number of entries left
pub fn merge_moments(
    components: &mut Vec<(f64, DVector<f64>, DMatrix<f64>)>,
    merge_threshold: f64,
    max_components: usize,
) {
    while components.len() > 1 {
        let mut min_dist = f64::INFINITY;
        let mut merge_pair = (0, 1);

        for i in 0..components.len() {
            for j in (i + 1)..components.len() {
                let (w_i, mu_i, sigma_i) = &components[i];
                let (w_j, mu_j, sigma_j) = &components[j];
                let sigma = if w_i >= w_j { sigma_i } else { sigma_j };
                let dist = mahalanobis_distance(mu_j, mu_i, sigma);
                if dist < min_dist {
                    min_dist = dist;
                    merge_pair = (i, j);
                }
            }
        }

        let close_enough = merge_threshold.is_finite() && min_dist <= merge_threshold;
        if !close_enough && components.len() <= max_components {
            break;
        }

        let (i, j) = merge_pair;
        let (w_j, mu_j, sigma_j) = components.remove(j);
        let (w_i, mu_i, sigma_i) = components.remove(i);

        let w_new = w_i + w_j;
        // Both weights underflowed: merge as equals
        let (f_i, f_j) = if w_new > NUMERICAL_ZERO {
            (w_i / w_new, w_j / w_new)
        } else {
            (0.5, 0.5)
        };

        let mu_new = &mu_i * f_i + &mu_j * f_j;
        let mu_diff = &mu_i - &mu_j;
        let spread = &mu_diff * mu_diff.transpose() * (f_i * f_j);
        let sigma_new = symmetrize(&(sigma_i * f_i + sigma_j * f_j + spread));

        components.push((w_new, mu_new, sigma_new));
    }
}

/// Bounds the number of vertex components by moment-preserving merging
#[derive(Debug, Clone, Default)]
pub struct GsfVertexMerger {
    config: MergerConfig,
}

impl GsfVertexMerger {
    /// Merger with the given configuration.
    ///
    /// A `max_components` of zero is treated as one.
    pub fn new(config: MergerConfig) -> Self {
        Self { config }
    }

    /// Merger keeping at most `max_components` components.
    pub fn with_max_components(max_components: usize) -> Self {
        Self::new(MergerConfig::new(max_components))
    }

    pub fn config(&self) -> &MergerConfig {
        &self.config
    }
}

impl VertexMerger for GsfVertexMerger {
    fn merge_state(&self, state: &VertexState) -> Result<VertexState, VertexError> {
        let leaves = state.require_components("vertex merge")?;
        let max_components = self.max_components();

        if leaves.len() <= max_components && !self.config.merge_threshold.is_finite() {
            return Ok(state.clone());
        }

        let mut moments = leaves
            .iter()
            .map(|c| Ok((c.weight_in_mixture(), c.position()?, c.covariance()?)))
            .collect::<Result<Vec<_>, VertexError>>()?;

        let before = moments.len();
        merge_moments(&mut moments, self.config.merge_threshold, max_components);
        log::trace!("Merged vertex mixture: {} -> {} components", before, moments.len());

        let components = moments
            .into_iter()
            .map(|(w, mean, cov)| VertexComponent::from_position(&mean, &cov, w))
            .collect::<Result<Vec<_>, VertexError>>()?;
        Ok(VertexState::from_components(components))
    }

    fn max_components(&self) -> usize {
        self.config.max_components.max(1)
    }

    fn name(&self) -> &'static str {
        "GsfVertexMerger"
    }
}
