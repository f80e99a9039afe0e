//! Data model for the trail network graph
//!
//! Contains the 3D geometry types, the tagged line features that feed the
//! pipeline and the routing graph it produces.

pub mod crs;
pub mod features;
pub mod geometry;
pub mod graph;

pub use crs::Crs;
pub use features::{FeatureId, LineFeature, LineTags, Segment, TaggedSegment};
pub use geometry::{Coord3, LineString3};
pub use graph::{CumulativeMeasure, Edge, NetworkGraph, Node};
