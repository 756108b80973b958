//! Vertex domain types
//!
//! - [`VertexState`] / [`VertexComponent`] - Gaussian-mixture vertex estimates
//! - [`LinearizedTrackState`], [`RefittedTrackState`], [`VertexTrack`] - tracks
//! - [`CachingVertex`] - fitted vertex passed between fitter, smoother and estimator
//! - [`RecoVertex`] / [`RecoTrack`] - persisted inputs of the compatibility estimator
//! - Collaborator traits, configuration and errors

pub mod caching;
pub mod config;
pub mod errors;
pub mod factory;
pub mod reco;
pub mod state;
pub mod track;
pub mod traits;

pub use caching::CachingVertex;
pub use config::{MergerConfig, SmootherConfig};
pub use errors::VertexError;
pub use factory::VertexTrackFactory;
pub use reco::{RecoTrack, RecoTrackComponent, RecoVertex, TrackRef};
pub use state::{VertexComponent, VertexState};
pub use track::{
    LinearizedTrackComponent, LinearizedTrackState, RefittedTrackComponent, RefittedTrackState,
    TrackId, VertexTrack,
};
pub use traits::{
    ChiSquareEstimator, PositionUpdator, TrackLinearizer, TrackRefitter, UpdateSign, VertexMerger,
    VertexUpdator, WeightCalculator,
};
