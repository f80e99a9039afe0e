use log::{info, warn};
use rayon::prelude::*;

use super::measures::directional_measures;
use super::registry::NodeRegistry;
use super::weights::weight_factor;
use crate::loading::WeightConfig;
use crate::model::{Edge, LineString3, LineTags, NetworkGraph, TaggedSegment};
use crate::{Error, NodeId};

/// Counters of the graph construction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphBuildReport {
    pub segments: usize,
    /// Segments whose endpoints snapped to the same node
    pub degenerate_dropped: usize,
}

/// Edge whose endpoints are resolved but whose cost is not computed yet
struct PendingEdge {
    start: NodeId,
    end: NodeId,
    geometry: LineString3,
    tags: LineTags,
}

/// Snap segments into a weighted graph with directional measures.
///
/// Node ids are allocated sequentially in segment order, so the same input
/// always yields the same ids. Weights and measures are computed in parallel
/// afterwards; edge order follows segment order.
///
/// # Errors
///
/// Fails if the node count does not fit the node id type.
pub fn build_graph(
    segments: Vec<TaggedSegment>,
    snap_decimals: i32,
    weights: &WeightConfig,
) -> Result<(NetworkGraph, GraphBuildReport), Error> {
    let mut registry = NodeRegistry::new(snap_decimals);
    let mut report = GraphBuildReport {
        segments: segments.len(),
        ..GraphBuildReport::default()
    };

    let mut pending = Vec::with_capacity(segments.len());
    for segment in segments {
        let snapped: Vec<_> = segment
            .geometry
            .coords()
            .iter()
            .map(|c| registry.snap_coord(c))
            .collect();
        let (Some(first), Some(last)) = (snapped.first(), snapped.last()) else {
            continue;
        };

        // Both endpoints are registered before the degenerate check
        let start = registry.get_or_insert(first)?;
        let end = registry.get_or_insert(last)?;
        if start == end {
            report.degenerate_dropped += 1;
            continue;
        }

        pending.push(PendingEdge {
            start,
            end,
            geometry: LineString3::new(snapped),
            tags: segment.tags,
        });
    }

    let edges: Vec<Edge> = pending
        .into_par_iter()
        .map(|edge| {
            let (forward, reverse) = directional_measures(edge.geometry.coords());
            let length = forward.last().map_or(0.0, |m| m.distance);
            Edge {
                start: edge.start,
                end: edge.end,
                weight: length * weight_factor(&edge.tags, weights),
                geometry: edge.geometry,
                forward,
                reverse,
                tags: edge.tags,
            }
        })
        .collect();

    if report.degenerate_dropped > 0 {
        warn!(
            "Dropped {} segments whose endpoints snapped to the same node",
            report.degenerate_dropped
        );
    }

    let graph = NetworkGraph {
        nodes: registry.into_nodes(),
        edges,
    };
    info!(
        "Built graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok((graph, report))
}
