use std::time::Instant;

use log::{info, warn};

use super::config::{GraphBuildConfig, validate_config};
use super::layers::{LoadReport, load_line_layers};
use crate::Error;
use crate::elevation::{ElevationRaster, SamplingReport, sample_elevations};
use crate::export::{debug_geojson_string, encode_graph, write_atomic_all};
use crate::model::{Crs, LineFeature, NetworkGraph};
use crate::network::{GraphBuildReport, build_graph};
use crate::topology::{AttributeJoiner, JoinReport, NodingReport, node_lines};

/// Counters of every non-fatal condition met during a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub load: LoadReport,
    pub noding: NodingReport,
    pub join: JoinReport,
    pub sampling: SamplingReport,
    pub graph: GraphBuildReport,
    pub node_count: usize,
    pub edge_count: usize,
    pub connected_components: usize,
    /// Size of the written binary graph
    pub graph_bytes: usize,
}

impl BuildReport {
    fn log_summary(&self) {
        info!(
            "Graph summary: {} nodes, {} edges, {} connected components",
            self.node_count, self.edge_count, self.connected_components
        );
        info!(
            "Dropped: {} input geometries, {} unmatched segments, {} duplicate segments, {} degenerate edges",
            self.load.dropped(),
            self.join.unmatched,
            self.noding.duplicates_removed + self.join.duplicates_removed,
            self.graph.degenerate_dropped
        );
        if self.sampling.out_of_bounds > 0 || self.sampling.nodata > 0 {
            warn!(
                "Elevation fallback to 0 for {} of {} vertices",
                self.sampling.out_of_bounds + self.sampling.nodata,
                self.sampling.vertices
            );
        }
    }
}

/// Result of a full pipeline run
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: NetworkGraph,
    pub report: BuildReport,
}

/// Run the whole pipeline and write the configured artifacts.
///
/// Layers are loaded, noded and re-tagged, elevations are sampled from the
/// raster, and the resulting graph is written to `graph_output` (plus the
/// debug document when `debug_output` is set).
///
/// # Errors
///
/// Returns an error if an input is missing or unreadable, layers and raster
/// disagree on the CRS, no line geometry survives, or an output cannot be
/// written. Nothing is written when a stage fails.
pub fn build_network_graph(config: &GraphBuildConfig) -> Result<BuildOutcome, Error> {
    let started = Instant::now();
    validate_config(config)?;

    info!("Loading {} line layers", config.layers.len());
    let layers = load_line_layers(&config.layers)?;

    info!("Reading elevation raster: {}", config.dem_path.display());
    let raster = ElevationRaster::read_geotiff(&config.dem_path)?;
    info!(
        "Raster is {}x{} cells of {}x{} units, nodata {:?}",
        raster.width(),
        raster.height(),
        raster.transform().a.abs(),
        raster.transform().e.abs(),
        raster.nodata()
    );
    check_raster_crs(&layers.crs, raster.crs(), config)?;

    let (graph, mut report) = build_graph_from_features(&layers.features, &raster, config)?;
    report.load = layers.report;

    // Both artifacts are serialized before either is published
    let buffer = encode_graph(&graph);
    let debug = match &config.debug_output {
        Some(path) => Some((path, debug_geojson_string(&graph, Some(&layers.crs))?)),
        None => None,
    };
    let mut artifacts = vec![(config.graph_output.as_path(), buffer.as_slice())];
    if let Some((path, text)) = &debug {
        artifacts.push((path.as_path(), text.as_bytes()));
    }
    write_atomic_all(&artifacts)?;

    report.graph_bytes = buffer.len();
    info!(
        "Wrote graph to {} ({} bytes)",
        config.graph_output.display(),
        buffer.len()
    );
    if let Some((path, _)) = &debug {
        info!("Wrote debug GeoJSON to {}", path.display());
    }

    report.log_summary();
    info!("Network graph built in {:.2?}", started.elapsed());
    Ok(BuildOutcome { graph, report })
}

/// In-memory part of the pipeline: noding, tag recovery, elevation and graph
/// construction. Nothing is read from or written to disk.
///
/// # Errors
///
/// Fails if noding yields no line geometry or the node count overflows.
pub fn build_graph_from_features(
    features: &[LineFeature],
    raster: &ElevationRaster,
    config: &GraphBuildConfig,
) -> Result<(NetworkGraph, BuildReport), Error> {
    let mut report = BuildReport::default();

    let stage = Instant::now();
    let (segments, noding) = node_lines(features)?;
    report.noding = noding;
    info!("Noding finished in {:.2?}", stage.elapsed());

    let stage = Instant::now();
    let joiner = AttributeJoiner::new(
        features,
        config.containment_tolerance,
        config.match_policy,
        &config.weights,
    );
    let (tagged, join) = joiner.join(segments);
    report.join = join;
    info!("Tag recovery finished in {:.2?}", stage.elapsed());

    let stage = Instant::now();
    let mut last_decile = None;
    let (sampled, sampling) = sample_elevations(tagged, raster, &mut |percent| {
        let decile = percent / 10;
        if last_decile != Some(decile) {
            info!("Sampling elevation: {percent}%");
            last_decile = Some(decile);
        }
    });
    report.sampling = sampling;
    info!(
        "Sampled {} vertices in {:.2?}",
        sampling.vertices,
        stage.elapsed()
    );

    let (graph, graph_report) = build_graph(sampled, config.snap_decimals, &config.weights)?;
    report.graph = graph_report;
    report.node_count = graph.node_count();
    report.edge_count = graph.edge_count();
    report.connected_components = graph.component_count();

    Ok((graph, report))
}

fn check_raster_crs(layers: &Crs, raster: &Crs, config: &GraphBuildConfig) -> Result<(), Error> {
    match (layers.epsg, raster.epsg) {
        (Some(a), Some(b)) if a != b => Err(Error::CrsMismatch {
            left: layers.to_string(),
            left_source: "line layers".to_string(),
            right: raster.to_string(),
            right_source: config.dem_path.display().to_string(),
        }),
        (Some(_), Some(_)) => Ok(()),
        _ => {
            warn!(
                "Cannot confirm that the raster ({raster}) and the line layers ({layers}) share a CRS"
            );
            Ok(())
        }
    }
}
