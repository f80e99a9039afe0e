//! Build a routable, elevation-aware trail and road graph.
//!
//! The pipeline reads line layers and an elevation raster, repairs the line
//! topology, recovers feature tags, samples heights, and writes a compact
//! binary graph with precomputed directional measures.

pub mod elevation;
pub mod error;
pub mod export;
pub mod loading;
pub mod model;
pub mod network;
pub mod prelude;
pub mod topology;

pub use error::Error;
pub use loading::{BuildOutcome, BuildReport, GraphBuildConfig, build_network_graph};
pub use model::NetworkGraph;

/// Dense node identifier, sequential from 0 in first-seen order
pub type NodeId = u32;
