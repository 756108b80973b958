//! Concrete collaborators
//!
//! Default implementations of the traits in [`crate::vertex::traits`]:
//!
//! - [`kalman`] - Position update, track refit and chi-square for one component pair
//! - [`weight`] - Gaussian-sum pair weights
//! - [`kernel`] - The per-pair step combining the four above
//! - [`updator`] - Gaussian-sum single-track addition
//! - [`merger`] - Moment-preserving mixture reduction
//! - [`linearization`] - Straight-line track linearization

pub mod kalman;
pub mod kernel;
pub mod linearization;
pub mod merger;
pub mod updator;
pub mod weight;

pub use kalman::{KalmanSmoothedChi2Estimator, KalmanVertexTrackUpdator, KalmanVertexUpdator};
pub use kernel::{GsfKernel, PairUpdate};
pub use linearization::StraightLineLinearizer;
pub use merger::{merge_moments, GsfVertexMerger};
pub use updator::GsfVertexUpdator;
pub use weight::GsfWeightCalculator;
