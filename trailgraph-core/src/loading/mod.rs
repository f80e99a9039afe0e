//! This module is responsible for reading the line layers and the pipeline
//! configuration, and for running the full graph build.

mod builder;
mod config;
pub mod layers;

pub use builder::{BuildOutcome, BuildReport, build_graph_from_features, build_network_graph};
pub use config::{GraphBuildConfig, MatchPolicy, WeightConfig};
pub use layers::{LayerFormat, LoadReport, LoadedLayers, load_line_layers};
