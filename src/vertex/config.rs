//! Configuration types for the smoother and the merger
//!
//! Plain serialisable structs with builder-style setters. Everything numerical
//! that is not meant to be tuned lives in [`crate::common::constants`].

use serde::{Deserialize, Serialize};

use crate::common::constants::{
    DEFAULT_MAX_VERTEX_COMPONENTS, DEFAULT_MERGE_THRESHOLD, FLAT_PRIOR_VARIANCE,
};

use super::errors::VertexError;

/// Smoother configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmootherConfig {
    /// Run the merger after every incremental step
    pub limit_components: bool,
    /// Variance of the vague seed (covariance `flat_prior_variance * I`)
    pub flat_prior_variance: f64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            limit_components: false,
            flat_prior_variance: FLAT_PRIOR_VARIANCE,
        }
    }
}

impl SmootherConfig {
    /// Config with component limiting switched on or off.
    pub fn new(limit_components: bool) -> Self {
        Self {
            limit_components,
            ..Self::default()
        }
    }

    /// Set the seed variance.
    pub fn with_flat_prior_variance(mut self, variance: f64) -> Self {
        self.flat_prior_variance = variance;
        self
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), VertexError> {
        if self.flat_prior_variance <= 0.0 || !self.flat_prior_variance.is_finite() {
            return Err(VertexError::Configuration {
                description: format!(
                    "flat prior variance must be positive and finite, got {}",
                    self.flat_prior_variance
                ),
            });
        }
        Ok(())
    }
}

/// Vertex mixture merger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergerConfig {
    /// Maximum number of components kept after merging
    pub max_components: usize,
    /// Mahalanobis distance below which components are merged even when the
    /// mixture is within bounds. Infinite disables distance-based merging and
    /// is written as `null`.
    #[serde(with = "unbounded_threshold", default = "disabled_threshold")]
    pub merge_threshold: f64,
}

fn disabled_threshold() -> f64 {
    f64::INFINITY
}

/// Serialises a non-finite threshold as `null` and reads `null` back as infinity
mod unbounded_threshold {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(threshold: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if threshold.is_finite() {
            serializer.serialize_some(threshold)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            max_components: DEFAULT_MAX_VERTEX_COMPONENTS,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
        }
    }
}

impl MergerConfig {
    pub fn new(max_components: usize) -> Self {
        Self {
            max_components,
            ..Self::default()
        }
    }

    /// Set the Mahalanobis merge threshold.
    pub fn with_merge_threshold(mut self, threshold: f64) -> Self {
        self.merge_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), VertexError> {
        if self.max_components == 0 {
            return Err(VertexError::Configuration {
                description: "merger must keep at least one component".to_string(),
            });
        }
        if self.merge_threshold.is_nan() || self.merge_threshold < 0.0 {
            return Err(VertexError::Configuration {
                description: format!("invalid merge threshold {}", self.merge_threshold),
            });
        }
        Ok(())
    }
}
