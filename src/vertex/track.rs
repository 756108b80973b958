//! Track types
//!
//! A track enters the vertex fit only through its linear approximation around a
//! reference point. Gaussian-sum tracks carry several weighted hypotheses, so the
//! linearized state is itself a mixture. After smoothing, every track gets a
//! mixture of refitted components, one per (vertex component, track component) pair.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use smallvec::SmallVec;

use crate::common::constants::{MOMENTUM_DIM, VERTEX_DIM};
use crate::common::linalg::invert_symmetric;

use super::errors::VertexError;
use super::state::VertexState;

/// Identity of a track, used to decide whether a track belongs to a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Linearized track
// ============================================================================

/// One hypothesis of a linearized track.
///
/// The track parameters are approximated as `p ≈ c + A·x + B·q` around the
/// linearization point, with `x` the vertex position and `q` the momentum at
/// the vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearizedTrackComponent {
    /// Weight of this hypothesis in the track mixture
    weight_in_mixture: f64,
    /// Constant term `c`
    constant_term: DVector<f64>,
    /// Position Jacobian `A` (m×3)
    position_jacobian: DMatrix<f64>,
    /// Momentum Jacobian `B` (m×3)
    momentum_jacobian: DMatrix<f64>,
    /// Measured track parameters `p`
    parameters: DVector<f64>,
    /// Weight (inverse covariance) of the measured parameters `G`
    parameters_weight: DMatrix<f64>,
    /// Momentum predicted at the linearization point `q₀`
    predicted_momentum: DVector<f64>,
}

impl LinearizedTrackComponent {
    /// Create a component, checking that all dimensions agree.
    pub fn new(
        weight_in_mixture: f64,
        constant_term: DVector<f64>,
        position_jacobian: DMatrix<f64>,
        momentum_jacobian: DMatrix<f64>,
        parameters: DVector<f64>,
        parameters_weight: DMatrix<f64>,
        predicted_momentum: DVector<f64>,
    ) -> Result<Self, VertexError> {
        let m = parameters.len();
        let checks = [
            (constant_term.len(), m, "constant term"),
            (position_jacobian.nrows(), m, "position jacobian rows"),
            (position_jacobian.ncols(), VERTEX_DIM, "position jacobian columns"),
            (momentum_jacobian.nrows(), m, "momentum jacobian rows"),
            (momentum_jacobian.ncols(), MOMENTUM_DIM, "momentum jacobian columns"),
            (parameters_weight.nrows(), m, "parameter weight rows"),
            (parameters_weight.ncols(), m, "parameter weight columns"),
            (predicted_momentum.len(), MOMENTUM_DIM, "predicted momentum"),
        ];
        for (actual, expected, context) in checks {
            if actual != expected {
                return Err(VertexError::DimensionMismatch {
                    expected,
                    actual,
                    context: context.to_string(),
                });
            }
        }

        Ok(Self {
            weight_in_mixture,
            constant_term,
            position_jacobian,
            momentum_jacobian,
            parameters,
            parameters_weight,
            predicted_momentum,
        })
    }

    /// Number of track parameters.
    #[inline]
    pub fn dim(&self) -> usize {
        self.parameters.len()
    }

    #[inline]
    pub fn weight_in_mixture(&self) -> f64 {
        self.weight_in_mixture
    }

    #[inline]
    pub fn constant_term(&self) -> &DVector<f64> {
        &self.constant_term
    }

    #[inline]
    pub fn position_jacobian(&self) -> &DMatrix<f64> {
        &self.position_jacobian
    }

    #[inline]
    pub fn momentum_jacobian(&self) -> &DMatrix<f64> {
        &self.momentum_jacobian
    }

    #[inline]
    pub fn parameters(&self) -> &DVector<f64> {
        &self.parameters
    }

    #[inline]
    pub fn parameters_weight(&self) -> &DMatrix<f64> {
        &self.parameters_weight
    }

    #[inline]
    pub fn predicted_momentum(&self) -> &DVector<f64> {
        &self.predicted_momentum
    }

    /// Covariance of the measured parameters.
    pub fn parameters_error(&self) -> Result<DMatrix<f64>, VertexError> {
        invert_symmetric(&self.parameters_weight, "track parameter weight")
    }
}

/// Linearized track: a mixture of hypotheses sharing one linearization point
#[derive(Debug, Clone, PartialEq)]
pub struct LinearizedTrackState {
    /// Identity of the underlying track
    id: TrackId,
    /// Point around which the track was linearized
    linearization_point: DVector<f64>,
    /// Track hypotheses (SmallVec avoids heap for typical 1-4 components)
    components: SmallVec<[LinearizedTrackComponent; 4]>,
}

impl LinearizedTrackState {
    /// Create a linearized track from its hypotheses.
    ///
    /// An empty component list is accepted here and rejected when the track
    /// is used in a computation.
    pub fn new(
        id: TrackId,
        linearization_point: DVector<f64>,
        components: impl IntoIterator<Item = LinearizedTrackComponent>,
    ) -> Result<Self, VertexError> {
        if linearization_point.len() != VERTEX_DIM {
            return Err(VertexError::DimensionMismatch {
                expected: VERTEX_DIM,
                actual: linearization_point.len(),
                context: "linearization point".to_string(),
            });
        }
        Ok(Self {
            id,
            linearization_point,
            components: components.into_iter().collect(),
        })
    }

    #[inline]
    pub fn id(&self) -> TrackId {
        self.id
    }

    #[inline]
    pub fn linearization_point(&self) -> &DVector<f64> {
        &self.linearization_point
    }

    #[inline]
    pub fn components(&self) -> &[LinearizedTrackComponent] {
        &self.components
    }

    #[inline]
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Components, failing when there are none.
    pub fn require_components(&self, context: &str) -> Result<&[LinearizedTrackComponent], VertexError> {
        if self.components.is_empty() {
            return Err(VertexError::EmptyTrackComponents {
                context: context.to_string(),
            });
        }
        Ok(&self.components)
    }
}

// ============================================================================
// Refitted track
// ============================================================================

/// Track state refitted with the vertex constraint, for one component pair
#[derive(Debug, Clone, PartialEq)]
pub struct RefittedTrackComponent {
    /// Weight in the refitted mixture
    weight_in_mixture: f64,
    /// Vertex position the track was refitted against
    vertex_position: DVector<f64>,
    /// Refitted momentum at the vertex
    momentum: DVector<f64>,
    /// Refitted track parameters `c + A x + B q`
    parameters: DVector<f64>,
    /// Covariance of the refitted momentum
    momentum_covariance: DMatrix<f64>,
    /// Covariance between vertex position and refitted momentum
    position_momentum_covariance: DMatrix<f64>,
    /// Chi-square of the track component against this refit
    chi_squared: f64,
}

impl RefittedTrackComponent {
    /// Create a refitted component (chi-square set to zero).
    pub fn new(
        weight_in_mixture: f64,
        vertex_position: DVector<f64>,
        momentum: DVector<f64>,
        parameters: DVector<f64>,
        momentum_covariance: DMatrix<f64>,
        position_momentum_covariance: DMatrix<f64>,
    ) -> Self {
        Self {
            weight_in_mixture,
            vertex_position,
            momentum,
            parameters,
            momentum_covariance,
            position_momentum_covariance,
            chi_squared: 0.0,
        }
    }

    /// Same refit with a new mixture weight.
    pub fn with_weight(&self, weight_in_mixture: f64) -> Self {
        Self {
            weight_in_mixture,
            ..self.clone()
        }
    }

    /// Same refit tagged with its chi-square.
    pub fn with_chi_squared(self, chi_squared: f64) -> Self {
        Self {
            chi_squared,
            ..self
        }
    }

    #[inline]
    pub fn weight_in_mixture(&self) -> f64 {
        self.weight_in_mixture
    }

    #[inline]
    pub fn vertex_position(&self) -> &DVector<f64> {
        &self.vertex_position
    }

    #[inline]
    pub fn momentum(&self) -> &DVector<f64> {
        &self.momentum
    }

    #[inline]
    pub fn parameters(&self) -> &DVector<f64> {
        &self.parameters
    }

    #[inline]
    pub fn momentum_covariance(&self) -> &DMatrix<f64> {
        &self.momentum_covariance
    }

    #[inline]
    pub fn position_momentum_covariance(&self) -> &DMatrix<f64> {
        &self.position_momentum_covariance
    }

    #[inline]
    pub fn chi_squared(&self) -> f64 {
        self.chi_squared
    }
}

/// Smoothed trajectory of one track: a normalised mixture of refitted components
#[derive(Debug, Clone, PartialEq)]
pub struct RefittedTrackState {
    /// Position the refit is expressed around
    reference_position: DVector<f64>,
    components: SmallVec<[RefittedTrackComponent; 4]>,
}

impl RefittedTrackState {
    pub fn new(
        reference_position: DVector<f64>,
        components: impl IntoIterator<Item = RefittedTrackComponent>,
    ) -> Self {
        Self {
            reference_position,
            components: components.into_iter().collect(),
        }
    }

    #[inline]
    pub fn reference_position(&self) -> &DVector<f64> {
        &self.reference_position
    }

    #[inline]
    pub fn components(&self) -> &[RefittedTrackComponent] {
        &self.components
    }

    #[inline]
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Sum of component weights (1 after assembly).
    pub fn total_weight(&self) -> f64 {
        self.components.iter().map(|c| c.weight_in_mixture()).sum()
    }

    /// Weight-averaged vertex position of the refit.
    pub fn position(&self) -> DVector<f64> {
        self.weighted_average(|c| c.vertex_position(), VERTEX_DIM)
    }

    /// Weight-averaged refitted momentum.
    pub fn momentum(&self) -> DVector<f64> {
        self.weighted_average(|c| c.momentum(), MOMENTUM_DIM)
    }

    fn weighted_average<F>(&self, field: F, dim: usize) -> DVector<f64>
    where
        F: Fn(&RefittedTrackComponent) -> &DVector<f64>,
    {
        let total = self.total_weight();
        if total == 0.0 {
            return self
                .components
                .first()
                .map(|c| field(c).clone())
                .unwrap_or_else(|| DVector::zeros(dim));
        }
        self.components
            .iter()
            .fold(DVector::zeros(dim), |acc, c| {
                acc + field(c) * (c.weight_in_mixture() / total)
            })
    }
}

// ============================================================================
// Vertex track
// ============================================================================

/// Association of a linearized track with the vertex it is fitted to
#[derive(Debug, Clone)]
pub struct VertexTrack {
    linearized: Arc<LinearizedTrackState>,
    /// Vertex state the track is associated with, shared with the vertex
    vertex_state: Arc<VertexState>,
    /// External track weight (scale factor, not a mixture weight)
    weight: f64,
    /// Refitted state, present once the vertex has been smoothed
    refitted: Option<RefittedTrackState>,
    /// Smoothed chi-square, present together with the refitted state
    smoothed_chi_squared: Option<f64>,
}

impl VertexTrack {
    /// Unsmoothed association.
    pub fn new(
        linearized: Arc<LinearizedTrackState>,
        vertex_state: impl Into<Arc<VertexState>>,
        weight: f64,
    ) -> Self {
        Self {
            linearized,
            vertex_state: vertex_state.into(),
            weight,
            refitted: None,
            smoothed_chi_squared: None,
        }
    }

    /// Association carrying a refitted state and its smoothed chi-square.
    pub fn smoothed(
        linearized: Arc<LinearizedTrackState>,
        vertex_state: impl Into<Arc<VertexState>>,
        refitted: RefittedTrackState,
        smoothed_chi_squared: f64,
        weight: f64,
    ) -> Self {
        Self {
            linearized,
            vertex_state: vertex_state.into(),
            weight,
            refitted: Some(refitted),
            smoothed_chi_squared: Some(smoothed_chi_squared),
        }
    }

    #[inline]
    pub fn id(&self) -> TrackId {
        self.linearized.id()
    }

    #[inline]
    pub fn linearized_track(&self) -> &Arc<LinearizedTrackState> {
        &self.linearized
    }

    #[inline]
    pub fn vertex_state(&self) -> &VertexState {
        &self.vertex_state
    }

    /// Shared handle to the associated vertex state.
    #[inline]
    pub fn shared_vertex_state(&self) -> &Arc<VertexState> {
        &self.vertex_state
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn refitted_state_available(&self) -> bool {
        self.refitted.is_some()
    }

    #[inline]
    pub fn refitted_state(&self) -> Option<&RefittedTrackState> {
        self.refitted.as_ref()
    }

    #[inline]
    pub fn smoothed_chi_squared(&self) -> Option<f64> {
        self.smoothed_chi_squared
    }
}
