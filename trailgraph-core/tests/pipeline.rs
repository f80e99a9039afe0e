use std::fs::{self, File};
use std::path::Path;

use flatgeobuf::{FgbCrs, FgbWriter, FgbWriterOptions, GeometryType};
use geozero::GeozeroDatasource;
use geozero::geojson::GeoJsonReader;
use serde_json::json;
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;
use trailgraph_core::Error;
use trailgraph_core::export::{decode_graph, root_as_graph};
use trailgraph_core::loading::{GraphBuildConfig, build_network_graph};

const ORIGIN_X: f64 = 499_990.0;
const ORIGIN_Y: f64 = 4_400_010.0;
const SIZE: u32 = 30;

/// 1 m north-up DEM rising one metre per column eastwards from 100 m
fn write_dem(path: &Path, epsg: u16) {
    let mut data = Vec::with_capacity((SIZE * SIZE) as usize);
    for _row in 0..SIZE {
        for col in 0..SIZE {
            data.push(100.0 + col as f32);
        }
    }
    // Column 29 is nodata
    for row in 0..SIZE {
        data[(row * SIZE + SIZE - 1) as usize] = -9999.0;
    }

    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(SIZE, SIZE)
        .unwrap();
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &[1.0f64, 1.0, 0.0][..])
        .unwrap();
    image
        .encoder()
        .write_tag(
            Tag::ModelTiepointTag,
            &[0.0f64, 0.0, 0.0, ORIGIN_X, ORIGIN_Y, 0.0][..],
        )
        .unwrap();
    image
        .encoder()
        .write_tag(
            Tag::GeoKeyDirectoryTag,
            &[1u16, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, epsg][..],
        )
        .unwrap();
    image.encoder().write_tag(Tag::GdalNodata, "-9999").unwrap();
    image.write_data(&data).unwrap();
}

fn line(coords: &[(f64, f64)], properties: serde_json::Value) -> serde_json::Value {
    let coordinates: Vec<[f64; 2]> = coords.iter().map(|&(x, y)| [x, y]).collect();
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": { "type": "LineString", "coordinates": coordinates }
    })
}

fn write_layer(path: &Path, features: Vec<serde_json::Value>) {
    let document = json!({
        "type": "FeatureCollection",
        "name": path.file_stem().unwrap().to_string_lossy(),
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::32618" } },
        "features": features,
    });
    fs::write(path, document.to_string()).unwrap();
}

fn write_fgb_layer(path: &Path, features: Vec<serde_json::Value>) {
    let options = FgbWriterOptions {
        crs: FgbCrs {
            code: 32618,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut writer =
        FgbWriter::create_with_options("osm_layer", GeometryType::LineString, options).unwrap();
    let document = json!({ "type": "FeatureCollection", "features": features }).to_string();
    GeoJsonReader(document.as_bytes())
        .process(&mut writer)
        .unwrap();
    let mut file = File::create(path).unwrap();
    writer.write(&mut file).unwrap();
}

fn tags(highway: &str, name: &str, main_trail: &str) -> serde_json::Value {
    json!({ "highway": highway, "name": name, "main_trail": main_trail })
}

/// Run directory laid out the way the download steps leave it
fn prepare_fgb_run_dir(dir: &Path) -> GraphBuildConfig {
    let layers = dir.join("temp").join("osm_layers");
    fs::create_dir_all(&layers).unwrap();

    write_fgb_layer(
        &layers.join("road.fgb"),
        vec![line(
            &[(500_005.0, 4_399_995.0), (500_005.0, 4_400_005.0)],
            tags("residential", "Mill Road", "no"),
        )],
    );
    write_fgb_layer(
        &layers.join("trail.fgb"),
        vec![
            line(
                &[(500_000.0, 4_400_000.0), (500_010.0, 4_400_000.0)],
                tags("path", "Ridge Path", "yes"),
            ),
            line(
                &[(500_012.0, 4_399_990.0), (500_019.0, 4_399_990.0)],
                tags("footway", "Spur", "no"),
            ),
        ],
    );
    write_dem(&dir.join("temp").join("cropped_meters.tif"), 32618);

    GraphBuildConfig::from_run_dir(dir)
}

/// Run directory with GeoJSON layers, including geometries the loader drops
fn prepare_run_dir(dir: &Path, dem_epsg: u16) -> GraphBuildConfig {
    let layers = dir.join("temp").join("osm_layers");
    fs::create_dir_all(&layers).unwrap();

    write_layer(
        &layers.join("road.geojson"),
        vec![
            line(
                &[(500_005.0, 4_399_995.0), (500_005.0, 4_400_005.0)],
                json!({ "highway": "residential", "name": "Mill Road" }),
            ),
            json!({ "type": "Feature", "properties": {}, "geometry": null }),
        ],
    );
    write_layer(
        &layers.join("trail.geojson"),
        vec![
            line(
                &[(500_000.0, 4_400_000.0), (500_010.0, 4_400_000.0)],
                json!({ "highway": "path", "main_trail": "yes" }),
            ),
            // Off the raster extent entirely
            line(
                &[(600_000.0, 4_400_000.0), (600_000.0, 4_400_020.0)],
                json!({ "highway": "track" }),
            ),
            // Ends on the nodata column
            line(
                &[(500_012.0, 4_399_990.0), (500_019.0, 4_399_990.0)],
                json!({ "highway": "footway" }),
            ),
            json!({
                "type": "Feature",
                "properties": { "highway": "path" },
                "geometry": { "type": "Point", "coordinates": [500_000.0, 4_400_000.0] }
            }),
        ],
    );
    write_dem(&dir.join("temp").join("cropped_meters.tif"), dem_epsg);

    let mut config = GraphBuildConfig::from_run_dir(dir);
    config.layers = vec![layers.join("road.geojson"), layers.join("trail.geojson")];
    config
}

#[test]
fn flatgeobuf_run_directory_builds_the_graph() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepare_fgb_run_dir(dir.path());

    let outcome = build_network_graph(&config).unwrap();
    let graph = &outcome.graph;

    // Crossing road and trail give four edges, the spur one more
    assert_eq!(graph.edge_count(), 5);
    assert_eq!(graph.node_count(), 7);
    assert_eq!(outcome.report.connected_components, 2);
    assert_eq!(outcome.report.load.features_read, 3);

    let center = graph
        .nodes
        .iter()
        .find(|n| n.x == 500_005.0 && n.y == 4_400_000.0)
        .unwrap();
    assert_eq!(center.z, 115.0);

    let main_trail = graph
        .edges
        .iter()
        .filter(|e| e.tags.highway() == "path")
        .collect::<Vec<_>>();
    assert_eq!(main_trail.len(), 2);
    assert!(main_trail.iter().all(|e| e.tags.main_trail));
    assert!(main_trail.iter().all(|e| (e.weight - 0.25).abs() < 1e-9));

    assert!(config.graph_output.exists());
    assert!(config.debug_output.as_ref().unwrap().exists());
}

#[test]
fn failed_debug_write_leaves_no_graph() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = prepare_run_dir(dir.path(), 32618);
    config.debug_output = Some(dir.path().join("no_such_dir").join("graph_debug.geojson"));

    assert!(matches!(
        build_network_graph(&config),
        Err(Error::IoError(_))
    ));
    assert!(!config.graph_output.exists());
    assert!(!dir.path().join(".graph.bin.partial").exists());
}

#[test]
fn run_directory_produces_graph_and_debug_document() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepare_run_dir(dir.path(), 32618);

    let outcome = build_network_graph(&config).unwrap();
    let graph = &outcome.graph;
    let report = &outcome.report;

    // Crossing splits both lines, plus the two isolated lines
    assert_eq!(graph.edge_count(), 6);
    assert_eq!(graph.node_count(), 9);
    assert_eq!(report.connected_components, 3);
    assert_eq!(report.load.dropped_null, 1);
    assert_eq!(report.load.dropped_non_line, 1);
    assert_eq!(report.join.unmatched, 0);
    assert_eq!(report.sampling.out_of_bounds, 2);
    assert_eq!(report.sampling.nodata, 1);

    let center = graph
        .nodes
        .iter()
        .find(|n| n.x == 500_005.0 && n.y == 4_400_000.0)
        .unwrap();
    assert_eq!(center.z, 115.0);

    let trail_west = graph
        .edges
        .iter()
        .find(|e| {
            let first = e.geometry.first().unwrap();
            first.x == 500_000.0 && first.y == 4_400_000.0
        })
        .unwrap();
    assert!((trail_west.weight - 0.25).abs() < 1e-9);
    assert!((trail_west.forward.last().unwrap().ascent - 5.0).abs() < 1e-9);
    assert!((trail_west.reverse.last().unwrap().descent - 5.0).abs() < 1e-9);

    let off_raster = graph
        .edges
        .iter()
        .find(|e| e.geometry.first().unwrap().x == 600_000.0)
        .unwrap();
    assert!(off_raster.geometry.coords().iter().all(|c| c.z == 0.0));

    for edge in &graph.edges {
        assert_eq!(edge.forward.len(), edge.geometry.len());
        assert_eq!(edge.reverse.len(), edge.geometry.len());
        let f = edge.forward.last().unwrap();
        let r = edge.reverse.last().unwrap();
        assert!((f.distance - edge.geometry.planar_length()).abs() < 1e-6);
        assert!((f.distance - r.distance).abs() < 1e-6);
        assert!((f.ascent - r.descent).abs() < 1e-6);
        assert!((f.descent - r.ascent).abs() < 1e-6);
        assert_ne!(edge.start, edge.end);
    }

    let buffer = fs::read(&config.graph_output).unwrap();
    assert_eq!(buffer.len(), report.graph_bytes);
    assert_eq!(root_as_graph(&buffer).unwrap().edges().unwrap().len(), 6);

    let decoded = decode_graph(&buffer).unwrap();
    assert_eq!(decoded.nodes, graph.nodes);
    for (read, built) in decoded.edges.iter().zip(&graph.edges) {
        assert_eq!(read.start, built.start);
        assert_eq!(read.end, built.end);
        assert_eq!(read.weight, built.weight);
        assert_eq!(read.geometry, built.geometry);
        assert_eq!(read.forward, built.forward);
        assert_eq!(read.reverse, built.reverse);
    }

    let debug_path = config.debug_output.as_ref().unwrap();
    let debug: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(debug_path).unwrap()).unwrap();
    assert_eq!(debug["features"].as_array().unwrap().len(), 9 + 6);
    assert_eq!(debug["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::32618");
}

#[test]
fn raster_in_another_crs_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepare_run_dir(dir.path(), 32619);

    assert!(matches!(
        build_network_graph(&config),
        Err(Error::CrsMismatch { .. })
    ));
    assert!(!config.graph_output.exists());
    assert!(!config.debug_output.unwrap().exists());
}

#[test]
fn missing_raster_is_reported_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let config = prepare_run_dir(dir.path(), 32618);
    fs::remove_file(&config.dem_path).unwrap();

    assert!(matches!(
        build_network_graph(&config),
        Err(Error::IoError(_))
    ));
}
