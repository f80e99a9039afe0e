//! Turning tagged, elevation-attached segments into the routing graph

mod builder;
mod measures;
mod registry;
mod weights;

pub use builder::{GraphBuildReport, build_graph};
pub use measures::{cumulative_measures, directional_measures};
pub use registry::NodeRegistry;
pub use weights::weight_factor;
