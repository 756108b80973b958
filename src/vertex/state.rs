//! Vertex state types
//!
//! A vertex estimate is stored in information form: the weight (inverse
//! covariance) matrix and the weight-times-position vector. This makes the
//! statistical product of two independent estimates a plain sum, which is what
//! the smoother needs when it combines the ascending and descending passes.
//!
//! A [`VertexState`] is either a single Gaussian or a (possibly nested) mixture.
//! All algorithms consume the flattened list of leaf components.

use nalgebra::{DMatrix, DVector};

use crate::common::constants::VERTEX_DIM;
use crate::common::linalg::{invert_symmetric, symmetrize};

use super::errors::VertexError;

/// One Gaussian component of a vertex estimate, in information form
#[derive(Debug, Clone, PartialEq)]
pub struct VertexComponent {
    /// Inverse covariance (3×3, symmetric, positive semi-definite)
    weight_matrix: DMatrix<f64>,
    /// Weight matrix times position (3)
    weight_times_position: DVector<f64>,
    /// Relative contribution of this component, not necessarily normalised
    weight_in_mixture: f64,
}

impl VertexComponent {
    /// Create a component from its information-form parameters.
    pub fn new(
        weight_times_position: DVector<f64>,
        weight_matrix: DMatrix<f64>,
        weight_in_mixture: f64,
    ) -> Result<Self, VertexError> {
        if weight_matrix.nrows() != VERTEX_DIM || weight_matrix.ncols() != VERTEX_DIM {
            return Err(VertexError::DimensionMismatch {
                expected: VERTEX_DIM,
                actual: weight_matrix.nrows().max(weight_matrix.ncols()),
                context: "vertex weight matrix".to_string(),
            });
        }
        if weight_times_position.len() != VERTEX_DIM {
            return Err(VertexError::DimensionMismatch {
                expected: VERTEX_DIM,
                actual: weight_times_position.len(),
                context: "vertex weight-times-position".to_string(),
            });
        }
        Ok(Self {
            weight_matrix,
            weight_times_position,
            weight_in_mixture,
        })
    }

    /// Create a component from a position and its covariance.
    pub fn from_position(
        position: &DVector<f64>,
        covariance: &DMatrix<f64>,
        weight_in_mixture: f64,
    ) -> Result<Self, VertexError> {
        if position.len() != VERTEX_DIM {
            return Err(VertexError::DimensionMismatch {
                expected: VERTEX_DIM,
                actual: position.len(),
                context: "vertex position".to_string(),
            });
        }
        let weight = invert_symmetric(covariance, "vertex covariance")?;
        let wtp = &weight * position;
        Self::new(wtp, weight, weight_in_mixture)
    }

    /// Vague component centred on `position` with covariance `variance * I`.
    pub fn flat(position: &DVector<f64>, variance: f64) -> Result<Self, VertexError> {
        if variance <= 0.0 || !variance.is_finite() {
            return Err(VertexError::Configuration {
                description: format!("seed variance must be positive, got {}", variance),
            });
        }
        let covariance = DMatrix::identity(VERTEX_DIM, VERTEX_DIM) * variance;
        Self::from_position(position, &covariance, 1.0)
    }

    /// Inverse covariance matrix.
    #[inline]
    pub fn weight_matrix(&self) -> &DMatrix<f64> {
        &self.weight_matrix
    }

    /// Weight matrix times position.
    #[inline]
    pub fn weight_times_position(&self) -> &DVector<f64> {
        &self.weight_times_position
    }

    /// Weight of this component in its mixture.
    #[inline]
    pub fn weight_in_mixture(&self) -> f64 {
        self.weight_in_mixture
    }

    /// Same Gaussian with a different mixture weight.
    pub fn with_weight_in_mixture(&self, weight_in_mixture: f64) -> Self {
        Self {
            weight_in_mixture,
            ..self.clone()
        }
    }

    /// Covariance matrix (inverse of the weight matrix).
    pub fn covariance(&self) -> Result<DMatrix<f64>, VertexError> {
        invert_symmetric(&self.weight_matrix, "vertex weight matrix")
    }

    /// Position estimate `W⁻¹ · (W x)`.
    pub fn position(&self) -> Result<DVector<f64>, VertexError> {
        Ok(self.covariance()? * &self.weight_times_position)
    }
}

/// Vertex estimate: a single Gaussian or a mixture of vertex states
#[derive(Debug, Clone, PartialEq)]
pub enum VertexState {
    /// One Gaussian component
    Single(VertexComponent),
    /// Mixture whose entries may themselves be mixtures
    Mixture(Vec<VertexState>),
}

impl From<VertexComponent> for VertexState {
    fn from(component: VertexComponent) -> Self {
        VertexState::Single(component)
    }
}

impl VertexState {
    /// Build a flat mixture from leaf components.
    ///
    /// A single component is stored as [`VertexState::Single`].
    pub fn from_components(mut components: Vec<VertexComponent>) -> Self {
        if components.len() == 1 {
            if let Some(only) = components.pop() {
                return VertexState::Single(only);
            }
        }
        VertexState::Mixture(components.into_iter().map(VertexState::Single).collect())
    }

    /// Single-component state from a position and covariance (mixture weight 1).
    pub fn from_position(
        position: &DVector<f64>,
        covariance: &DMatrix<f64>,
    ) -> Result<Self, VertexError> {
        Ok(VertexState::Single(VertexComponent::from_position(
            position, covariance, 1.0,
        )?))
    }

    /// Flattened list of leaf components, in depth-first order.
    pub fn components(&self) -> Vec<&VertexComponent> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a VertexComponent>) {
        match self {
            VertexState::Single(c) => out.push(c),
            VertexState::Mixture(states) => {
                for s in states {
                    s.collect_leaves(out);
                }
            }
        }
    }

    /// Leaf components, failing when there are none.
    ///
    /// # Arguments
    /// * `context` - Name of the calling operation, used in the error
    pub fn require_components(&self, context: &str) -> Result<Vec<&VertexComponent>, VertexError> {
        let leaves = self.components();
        if leaves.is_empty() {
            return Err(VertexError::EmptyVertexComponents {
                context: context.to_string(),
            });
        }
        Ok(leaves)
    }

    /// Number of leaf components.
    pub fn num_components(&self) -> usize {
        match self {
            VertexState::Single(_) => 1,
            VertexState::Mixture(states) => states.iter().map(|s| s.num_components()).sum(),
        }
    }

    /// True when there are no leaf components.
    pub fn is_empty(&self) -> bool {
        self.num_components() == 0
    }

    /// Sum of the leaf mixture weights.
    pub fn weight_in_mixture(&self) -> f64 {
        self.components().iter().map(|c| c.weight_in_mixture()).sum()
    }

    /// Collapsed position: weight-averaged mean of the leaf positions.
    pub fn position(&self) -> Result<DVector<f64>, VertexError> {
        Ok(self.collapse()?.0)
    }

    /// Collapsed covariance, including the spread of the component means.
    pub fn covariance(&self) -> Result<DMatrix<f64>, VertexError> {
        Ok(self.collapse()?.1)
    }

    /// Moment-matched single Gaussian (mean, covariance) of the mixture.
    pub fn collapse(&self) -> Result<(DVector<f64>, DMatrix<f64>), VertexError> {
        let leaves = self.require_components("vertex state collapse")?;

        if let [only] = leaves.as_slice() {
            return Ok((only.position()?, only.covariance()?));
        }

        let total: f64 = leaves.iter().map(|c| c.weight_in_mixture()).sum();
        if total == 0.0 || !total.is_finite() {
            return Err(VertexError::ZeroTotalWeight {
                context: "vertex state collapse".to_string(),
            });
        }

        let moments = leaves
            .iter()
            .map(|c| Ok((c.weight_in_mixture() / total, c.position()?, c.covariance()?)))
            .collect::<Result<Vec<_>, VertexError>>()?;

        let mean = moments
            .iter()
            .fold(DVector::zeros(VERTEX_DIM), |acc, (w, x, _)| acc + x * *w);

        let covariance = moments.iter().fold(
            DMatrix::zeros(VERTEX_DIM, VERTEX_DIM),
            |acc, (w, x, c)| {
                let d = x - &mean;
                acc + (c + &d * d.transpose()) * *w
            },
        );

        Ok((mean, symmetrize(&covariance)))
    }
}
