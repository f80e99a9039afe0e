use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use trailgraph_core::elevation::{AffineTransform, ElevationRaster};
use trailgraph_core::export::encode_graph;
use trailgraph_core::loading::{GraphBuildConfig, build_graph_from_features};
use trailgraph_core::model::{Coord3, Crs, LineFeature, LineString3, LineTags};
use trailgraph_core::topology::node_lines;

const GRID: usize = 40;
const SPACING: f64 = 25.0;

/// Streets every `SPACING` metres in both directions, each running the full extent
fn grid_features() -> Vec<LineFeature> {
    let extent = SPACING * (GRID - 1) as f64;
    let tags = |highway: &str| LineTags {
        highway: Some(highway.to_string()),
        name: None,
        main_trail: false,
    };

    let mut features = Vec::with_capacity(GRID * 2);
    for i in 0..GRID {
        let offset = SPACING * i as f64;
        features.push(LineFeature::new(
            LineString3::new(vec![
                Coord3::new(0.0, offset, 0.0),
                Coord3::new(extent, offset, 0.0),
            ]),
            tags("residential"),
        ));
        features.push(LineFeature::new(
            LineString3::new(vec![
                Coord3::new(offset, 0.0, 0.0),
                Coord3::new(offset, extent, 0.0),
            ]),
            tags("path"),
        ));
    }
    features
}

fn sloped_raster() -> ElevationRaster {
    let size = 1000;
    let values = (0..size * size).map(|i| (i % size) as f64 * 0.5).collect();
    ElevationRaster::new(
        size,
        size,
        values,
        AffineTransform::north_up(-10.0, 990.0, 1.0, 1.0),
        None,
        Crs::from_epsg(32618),
    )
    .unwrap()
}

fn bench_noding(c: &mut Criterion) {
    let features = grid_features();
    c.bench_function("node_lines_grid", |b| {
        b.iter(|| node_lines(black_box(&features)).unwrap());
    });
}

fn bench_full_build(c: &mut Criterion) {
    let features = grid_features();
    let raster = sloped_raster();
    let config = GraphBuildConfig::from_run_dir("bench");

    c.bench_function("build_graph_grid", |b| {
        b.iter(|| build_graph_from_features(black_box(&features), &raster, &config).unwrap());
    });

    let (graph, _) = build_graph_from_features(&features, &raster, &config).unwrap();
    c.bench_function("encode_graph_grid", |b| {
        b.iter(|| encode_graph(black_box(&graph)));
    });
}

criterion_group!(benches, bench_noding, bench_full_build);
criterion_main!(benches);
