//! Topology repair: planar noding and recovery of the lost attributes

mod join;
mod noding;

pub use join::{AttributeJoiner, JoinReport, SourceIndex};
pub use noding::{NodingReport, node_lines};
