use std::path::Path;

use geo::Point;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoJsonValue};
use log::info;
use serde_json::json;

use super::write_atomic;
use crate::Error;
use crate::model::{Crs, Edge, NetworkGraph, Node};

/// Inspection document: a point per node, then a line per edge.
///
/// Coordinates stay in the graph projection; when `crs` is given it is
/// recorded in the legacy named `crs` member so GIS tools place the layer.
pub fn to_debug_geojson(graph: &NetworkGraph, crs: Option<&Crs>) -> Result<FeatureCollection, Error> {
    let mut features = Vec::with_capacity(graph.node_count() + graph.edge_count());
    for node in &graph.nodes {
        features.push(node_feature(node)?);
    }
    for edge in &graph.edges {
        features.push(edge_feature(edge)?);
    }

    let foreign_members = crs.map(|crs| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            json!({ "type": "name", "properties": { "name": crs.name } }),
        );
        members
    });

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members,
    })
}

fn node_feature(node: &Node) -> Result<Feature, Error> {
    let geometry = Geometry::new(GeoJsonValue::from(&Point::new(node.x, node.y)));
    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "id": node.id,
            "elevation": node.z,
        }
    });
    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

fn edge_feature(edge: &Edge) -> Result<Feature, Error> {
    let coordinates: Vec<[f64; 3]> = edge
        .geometry
        .coords()
        .iter()
        .map(|c| [c.x, c.y, c.z])
        .collect();
    let value = json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": coordinates,
        },
        "properties": {
            "start": edge.start,
            "end": edge.end,
            "weight": edge.weight,
            "highway": edge.tags.highway,
            "name": edge.tags.name,
            "main_trail": edge.tags.main_trail,
        }
    });
    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

/// Serialized debug document, ready to be written
pub fn debug_geojson_string(graph: &NetworkGraph, crs: Option<&Crs>) -> Result<String, Error> {
    let document = to_debug_geojson(graph, crs)?;
    serde_json::to_string(&document).map_err(|e| Error::GeoJsonError(e.to_string()))
}

pub fn write_debug_geojson(
    graph: &NetworkGraph,
    crs: Option<&Crs>,
    path: impl AsRef<Path>,
) -> Result<(), Error> {
    let path = path.as_ref();
    let text = debug_geojson_string(graph, crs)?;
    write_atomic(path, text.as_bytes())?;
    info!("Wrote debug GeoJSON to {}", path.display());
    Ok(())
}
