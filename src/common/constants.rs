//! Numerical constants used throughout the vertex fit and smoother
//!
//! These are fixed by the Gaussian-sum vertex formalism and are intentionally
//! separate from the user-configurable [`SmootherConfig`](crate::vertex::SmootherConfig).

/// Dimension of a vertex position (x, y, z).
pub const VERTEX_DIM: usize = 3;

/// Dimension of the momentum vector carried by a linearized track.
pub const MOMENTUM_DIM: usize = 3;

/// Variance of the vague seed used to start both smoothing passes.
///
/// The seed is a single Gaussian centred on the first track's linearization
/// point with covariance `FLAT_PRIOR_VARIANCE * I`, weak enough to be
/// dominated by any real track.
pub const FLAT_PRIOR_VARIANCE: f64 = 10_000.0;

/// Ceiling handed to the weight calculator for every component pair.
///
/// Acts as an upper bound on a single non-normalised pair weight.
pub const WEIGHT_CEILING: f64 = 1.0e9;

/// Threshold below which a sum of weights is treated as zero.
pub const NUMERICAL_ZERO: f64 = 1e-300;

/// Default upper bound on the number of vertex mixture components kept by the merger.
pub const DEFAULT_MAX_VERTEX_COMPONENTS: usize = 4;

/// Default Mahalanobis distance threshold for merging vertex components.
///
/// Infinite means components are only merged to satisfy the component bound.
pub const DEFAULT_MERGE_THRESHOLD: f64 = f64::INFINITY;

/// Default along-track standard deviation used by the straight-line linearizer.
///
/// A straight line does not constrain the vertex along its own direction, so the
/// longitudinal uncertainty is made large.
pub const DEFAULT_LONGITUDINAL_SIGMA: f64 = 1.0e3;
