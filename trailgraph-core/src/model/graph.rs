//! Routing graph: nodes, weighted edges and their directional measures

use petgraph::graph::{NodeIndex, UnGraph};

use super::features::LineTags;
use super::geometry::LineString3;
use crate::NodeId;

/// Graph vertex at a snapped planar position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    /// Elevation of the first vertex that mapped to this node
    pub z: f64,
}

/// Running totals at one vertex of a directional traversal
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CumulativeMeasure {
    pub distance: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl CumulativeMeasure {
    pub const ZERO: Self = Self {
        distance: 0.0,
        ascent: 0.0,
        descent: 0.0,
    };

    pub const fn new(distance: f64, ascent: f64, descent: f64) -> Self {
        Self {
            distance,
            ascent,
            descent,
        }
    }
}

/// Graph edge (trail or road segment between two nodes)
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub start: NodeId,
    pub end: NodeId,
    pub weight: f64,
    /// Snapped geometry, interior vertices included
    pub geometry: LineString3,
    /// Measures along the stored vertex order
    pub forward: Vec<CumulativeMeasure>,
    /// Measures along the reversed vertex order
    pub reverse: Vec<CumulativeMeasure>,
    /// Tags recovered for the segment; not serialized
    pub tags: LineTags,
}

impl Edge {
    /// Planar length, taken from the forward measures
    pub fn length(&self) -> f64 {
        self.forward.last().map_or(0.0, |m| m.distance)
    }
}

/// Weighted, elevation-aware routing graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkGraph {
    /// Nodes in id order, `nodes[i].id == i`
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl NetworkGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Adjacency structure for standard graph algorithms.
    ///
    /// Node index `i` is node id `i`, edge weights are the routing weights.
    pub fn connectivity(&self) -> UnGraph<NodeId, f64> {
        let mut graph = UnGraph::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            graph.add_node(node.id);
        }
        for edge in &self.edges {
            graph.add_edge(
                NodeIndex::new(edge.start as usize),
                NodeIndex::new(edge.end as usize),
                edge.weight,
            );
        }
        graph
    }

    /// Number of connected components of the connectivity structure
    pub fn component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.connectivity())
    }
}
