//! Error types for vertex fitting, smoothing and compatibility estimation
//!
//! Every failure is a deterministic function of the inputs, so none of these
//! errors is worth retrying. Precondition violations (empty mixtures, unsmoothed
//! tracks) point at a defect in how the caller built its inputs; numerical
//! variants point at degenerate inputs.

use std::fmt;

use super::track::TrackId;

/// Errors that can occur while fitting or smoothing a vertex
#[derive(Debug, Clone, PartialEq)]
pub enum VertexError {
    /// A vertex state used in a computation has no components
    EmptyVertexComponents {
        /// Operation that received the empty state
        context: String,
    },

    /// A linearized track used in a computation has no components
    EmptyTrackComponents {
        /// Operation that received the empty track
        context: String,
    },

    /// A vertex without any associated tracks was handed to an operation
    /// that needs at least one
    NoTracks,

    /// Compatibility of an included track was requested before the vertex
    /// was smoothed
    NotSmoothed {
        /// Track whose refitted state is missing
        track: TrackId,
    },

    /// Sum of mixture weights is zero, so the mixture cannot be renormalised
    ZeroTotalWeight {
        /// Where the renormalisation happened
        context: String,
    },

    /// Matrix inversion failed (singular matrix)
    SingularMatrix {
        /// Description of which matrix failed
        context: String,
    },

    /// Dimension mismatch between expected and actual
    DimensionMismatch {
        /// What was expected
        expected: usize,
        /// What was received
        actual: usize,
        /// Context (e.g., "position jacobian rows")
        context: String,
    },

    /// Numerical instability detected (non-finite or non-positive quantities)
    NumericalInstability {
        /// Description of the issue
        description: String,
    },

    /// Configuration error
    Configuration {
        /// Description of the configuration issue
        description: String,
    },
}

impl VertexError {
    /// True for errors caused by how the inputs were constructed rather than
    /// by their numerical content.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            VertexError::EmptyVertexComponents { .. }
                | VertexError::EmptyTrackComponents { .. }
                | VertexError::NoTracks
                | VertexError::NotSmoothed { .. }
                | VertexError::DimensionMismatch { .. }
                | VertexError::Configuration { .. }
        )
    }
}

impl fmt::Display for VertexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexError::EmptyVertexComponents { context } => {
                write!(f, "{}: vertex to update has no components", context)
            }
            VertexError::EmptyTrackComponents { context } => {
                write!(f, "{}: track to add to vertex has no components", context)
            }
            VertexError::NoTracks => write!(f, "Vertex has no tracks"),
            VertexError::NotSmoothed { track } => {
                write!(f, "Vertex has to be smoothed first (track {})", track)
            }
            VertexError::ZeroTotalWeight { context } => {
                write!(f, "Total mixture weight is zero in {}", context)
            }
            VertexError::SingularMatrix { context } => {
                write!(f, "Matrix inversion failed: {}", context)
            }
            VertexError::DimensionMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}, got {}",
                    context, expected, actual
                )
            }
            VertexError::NumericalInstability { description } => {
                write!(f, "Numerical instability: {}", description)
            }
            VertexError::Configuration { description } => {
                write!(f, "Configuration error: {}", description)
            }
        }
    }
}

impl std::error::Error for VertexError {}
