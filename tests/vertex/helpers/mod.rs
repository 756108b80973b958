//! Shared test helpers
//!
//! Track and vertex fixtures plus tolerance-based assertions.

pub mod assertions;
pub mod fixtures;
