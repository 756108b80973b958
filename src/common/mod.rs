//! Low-level utilities shared by the vertex components.
//!
//! Linear algebra helpers and the numerical constants of the Gaussian-sum
//! vertex formalism.

pub mod constants;
pub mod linalg;
