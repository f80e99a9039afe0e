//! `graph.bin`: the FlatBuffers encoding of a [`NetworkGraph`]

use std::path::Path;

use flatbuffers::FlatBufferBuilder;
use log::info;

use super::schema::{self, CumulativeMeasureArgs, EdgeArgs, GraphArgs, NodeArgs};
use super::wkb::{decode_linestring, encode_linestring};
use super::write_atomic;
use crate::Error;
use crate::model::{CumulativeMeasure, Edge, LineTags, NetworkGraph, Node};

pub use super::schema::root_as_graph;

/// Serialize the graph into a finished FlatBuffers buffer
pub fn encode_graph(graph: &NetworkGraph) -> Vec<u8> {
    let mut builder = FlatBufferBuilder::with_capacity(1024 + graph.edge_count() * 256);

    let nodes: Vec<_> = graph
        .nodes
        .iter()
        .map(|node| {
            schema::Node::create(
                &mut builder,
                &NodeArgs {
                    id: node.id,
                    x: node.x,
                    y: node.y,
                    z: node.z,
                },
            )
        })
        .collect();
    let nodes = builder.create_vector(&nodes);

    let mut edges = Vec::with_capacity(graph.edge_count());
    for edge in &graph.edges {
        let geometry_wkb = builder.create_vector(&encode_linestring(&edge.geometry));
        let forward = measure_tables(&mut builder, &edge.forward);
        let measures_forward = builder.create_vector(&forward);
        let reverse = measure_tables(&mut builder, &edge.reverse);
        let measures_reverse = builder.create_vector(&reverse);

        edges.push(schema::Edge::create(
            &mut builder,
            &EdgeArgs {
                start_node_id: edge.start,
                end_node_id: edge.end,
                weight: edge.weight,
                geometry_wkb: Some(geometry_wkb),
                measures_forward: Some(measures_forward),
                measures_reverse: Some(measures_reverse),
            },
        ));
    }
    let edges = builder.create_vector(&edges);

    let root = schema::Graph::create(
        &mut builder,
        &GraphArgs {
            nodes: Some(nodes),
            edges: Some(edges),
        },
    );
    builder.finish(root, None);
    builder.finished_data().to_vec()
}

fn measure_tables<'fbb>(
    builder: &mut FlatBufferBuilder<'fbb>,
    measures: &[CumulativeMeasure],
) -> Vec<flatbuffers::WIPOffset<schema::CumulativeMeasure<'fbb>>> {
    measures
        .iter()
        .map(|m| {
            schema::CumulativeMeasure::create(
                builder,
                &CumulativeMeasureArgs {
                    cumulative_distance: m.distance,
                    cumulative_gain: m.ascent,
                    cumulative_loss: m.descent,
                },
            )
        })
        .collect()
}

/// Verify a buffer and copy it back into an owned graph.
///
/// Tags are not part of the format and come back empty.
///
/// # Errors
///
/// Returns [`Error::InvalidGraph`] if the buffer fails verification, a node id
/// does not match its position or an edge references an unknown node.
pub fn decode_graph(buf: &[u8]) -> Result<NetworkGraph, Error> {
    let root = root_as_graph(buf)?;

    let mut nodes = Vec::new();
    for (idx, node) in root.nodes().into_iter().flatten().enumerate() {
        if node.id() as usize != idx {
            return Err(Error::InvalidGraph(format!(
                "Node at position {idx} has id {}",
                node.id()
            )));
        }
        nodes.push(Node {
            id: node.id(),
            x: node.x(),
            y: node.y(),
            z: node.z(),
        });
    }

    let mut edges = Vec::new();
    for edge in root.edges().into_iter().flatten() {
        let (start, end) = (edge.start_node_id(), edge.end_node_id());
        if start as usize >= nodes.len() || end as usize >= nodes.len() {
            return Err(Error::InvalidGraph(format!(
                "Edge {start}->{end} references a node outside 0..{}",
                nodes.len()
            )));
        }
        let geometry = match edge.geometry_wkb() {
            Some(wkb) => decode_linestring(wkb.bytes())?,
            None => return Err(Error::InvalidGraph(format!("Edge {start}->{end} has no geometry"))),
        };
        edges.push(Edge {
            start,
            end,
            weight: edge.weight(),
            geometry,
            forward: read_measures(edge.measures_forward()),
            reverse: read_measures(edge.measures_reverse()),
            tags: LineTags::default(),
        });
    }

    Ok(NetworkGraph { nodes, edges })
}

fn read_measures(table: Option<schema::MeasureVector<'_>>) -> Vec<CumulativeMeasure> {
    table
        .into_iter()
        .flatten()
        .map(|m| {
            CumulativeMeasure::new(
                m.cumulative_distance(),
                m.cumulative_gain(),
                m.cumulative_loss(),
            )
        })
        .collect()
}

/// Encode and write the graph, returning the number of bytes written
pub fn write_graph(graph: &NetworkGraph, path: impl AsRef<Path>) -> Result<usize, Error> {
    let path = path.as_ref();
    let buffer = encode_graph(graph);
    write_atomic(path, &buffer)?;
    info!(
        "Wrote graph with {} nodes and {} edges to {} ({} bytes)",
        graph.node_count(),
        graph.edge_count(),
        path.display(),
        buffer.len()
    );
    Ok(buffer.len())
}

pub fn read_graph(path: impl AsRef<Path>) -> Result<NetworkGraph, Error> {
    let path = path.as_ref();
    let buffer = std::fs::read(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to read graph '{}': {}", path.display(), e),
        )
    })?;
    decode_graph(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coord3, LineString3};

    fn sample_graph() -> NetworkGraph {
        let nodes = vec![
            Node {
                id: 0,
                x: 500_000.123_45,
                y: 4_400_000.5,
                z: 312.25,
            },
            Node {
                id: 1,
                x: 500_010.0,
                y: 4_400_000.5,
                z: 0.0,
            },
        ];
        let geometry = LineString3::new(vec![
            Coord3::new(500_000.123_45, 4_400_000.5, 312.25),
            Coord3::new(500_005.0, 4_400_003.0, 318.0),
            Coord3::new(500_010.0, 4_400_000.5, 0.0),
        ]);
        let (forward, reverse) = crate::network::directional_measures(geometry.coords());
        NetworkGraph {
            nodes,
            edges: vec![Edge {
                start: 0,
                end: 1,
                weight: 4.2,
                geometry,
                forward,
                reverse,
                tags: LineTags::default(),
            }],
        }
    }

    #[test]
    fn decoded_graph_matches_the_source() {
        let graph = sample_graph();
        let decoded = decode_graph(&encode_graph(&graph)).unwrap();
        assert_eq!(decoded, graph);
    }

    #[test]
    fn zero_copy_view_exposes_every_field() {
        let buffer = encode_graph(&sample_graph());
        let root = root_as_graph(&buffer).unwrap();

        let nodes = root.nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.get(1).id(), 1);
        assert_eq!(nodes.get(0).z(), 312.25);

        let edge = root.edges().unwrap().get(0);
        assert_eq!(edge.start_node_id(), 0);
        assert_eq!(edge.end_node_id(), 1);
        assert_eq!(edge.weight(), 4.2);
        assert_eq!(edge.geometry_wkb().unwrap().len(), 9 + 3 * 24);
        let forward = edge.measures_forward().unwrap();
        let reverse = edge.measures_reverse().unwrap();
        assert_eq!(forward.len(), 3);
        assert_eq!(forward.get(0).cumulative_distance(), 0.0);
        assert!(
            (forward.get(2).cumulative_gain() - reverse.get(2).cumulative_loss()).abs() < 1e-9
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode_graph(&[0xde, 0xad, 0xbe, 0xef]),
            Err(Error::InvalidGraph(_))
        ));
    }

    #[test]
    fn dangling_node_reference_is_rejected() {
        let mut graph = sample_graph();
        graph.edges[0].end = 7;
        assert!(matches!(
            decode_graph(&encode_graph(&graph)),
            Err(Error::InvalidGraph(_))
        ));
    }

    #[test]
    fn write_then_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let graph = sample_graph();

        let written = write_graph(&graph, &path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, written);
        assert_eq!(read_graph(&path).unwrap(), graph);
    }
}
