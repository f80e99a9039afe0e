use hashbrown::HashMap;

use crate::model::{Coord3, Node};
use crate::{Error, NodeId};

/// Table of graph nodes keyed by snapped planar position.
///
/// Ids are handed out sequentially in first-seen order. The first vertex seen
/// at a position fixes the node's elevation.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    scale: f64,
    ids: HashMap<(i64, i64), NodeId>,
    nodes: Vec<Node>,
}

impl NodeRegistry {
    pub fn new(snap_decimals: i32) -> Self {
        Self {
            scale: 10f64.powi(snap_decimals),
            ids: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Round a planar ordinate to the snap precision
    pub fn snap(&self, value: f64) -> f64 {
        (value * self.scale).round() / self.scale
    }

    /// Snap x and y of a vertex, elevation untouched
    pub fn snap_coord(&self, coord: &Coord3) -> Coord3 {
        Coord3::new(self.snap(coord.x), self.snap(coord.y), coord.z)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, x: f64, y: f64) -> (i64, i64) {
        ((x * self.scale).round() as i64, (y * self.scale).round() as i64)
    }

    /// Id of the node at `coord`, allocating one on first sight
    pub fn get_or_insert(&mut self, coord: &Coord3) -> Result<NodeId, Error> {
        let key = self.key(coord.x, coord.y);
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }

        let id = NodeId::try_from(self.nodes.len()).map_err(|_| {
            Error::InvalidData(format!(
                "Node count exceeds the {} supported by the graph format",
                NodeId::MAX
            ))
        })?;
        self.nodes.push(Node {
            id,
            x: self.snap(coord.x),
            y: self.snap(coord.y),
            z: coord.z,
        });
        self.ids.insert(key, id);
        Ok(id)
    }

    #[cfg(test)]
    pub fn get(&self, coord: &Coord3) -> Option<NodeId> {
        self.ids.get(&self.key(coord.x, coord.y)).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in id order
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}
