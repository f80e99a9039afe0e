use std::path::PathBuf;

use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};

use crate::graph::PyNetworkGraph;
use trailgraph_core::prelude::*;

/// BuildReport
///
/// Counters of everything a build dropped or substituted: invalid input
/// geometry, segments with no source feature, duplicate linework, vertices
/// without elevation and edges collapsed by snapping.
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "BuildReport")]
#[derive(Clone)]
pub struct PyBuildReport {
    pub(crate) report: BuildReport,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyBuildReport {
    #[getter]
    fn features_read(&self) -> usize {
        self.report.load.features_read
    }

    #[getter]
    fn dropped_geometries(&self) -> usize {
        self.report.load.dropped()
    }

    #[getter]
    fn noded_segments(&self) -> usize {
        self.report.noding.segments
    }

    #[getter]
    fn unmatched_segments(&self) -> usize {
        self.report.join.unmatched
    }

    #[getter]
    fn duplicate_segments(&self) -> usize {
        self.report.noding.duplicates_removed + self.report.join.duplicates_removed
    }

    #[getter]
    fn vertices_sampled(&self) -> usize {
        self.report.sampling.vertices
    }

    #[getter]
    fn raster_misses(&self) -> usize {
        self.report.sampling.out_of_bounds
    }

    #[getter]
    fn nodata_hits(&self) -> usize {
        self.report.sampling.nodata
    }

    #[getter]
    fn degenerate_edges(&self) -> usize {
        self.report.graph.degenerate_dropped
    }

    #[getter]
    fn connected_components(&self) -> usize {
        self.report.connected_components
    }

    #[getter]
    fn graph_bytes(&self) -> usize {
        self.report.graph_bytes
    }

    fn __repr__(&self) -> String {
        format!(
            "BuildReport(nodes={}, edges={}, components={}, dropped={}, unmatched={}, degenerate={})",
            self.report.node_count,
            self.report.edge_count,
            self.report.connected_components,
            self.report.load.dropped(),
            self.report.join.unmatched,
            self.report.graph.degenerate_dropped
        )
    }
}

fn run(py: Python<'_>, config: GraphBuildConfig) -> PyResult<(PyNetworkGraph, PyBuildReport)> {
    // Allow Python threads during the whole build
    py.detach(|| {
        let outcome = trailgraph_core::build_network_graph(&config).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to build network graph: {e}"
            ))
        })?;
        Ok((
            PyNetworkGraph {
                graph: outcome.graph,
            },
            PyBuildReport {
                report: outcome.report,
            },
        ))
    })
}

fn parse_policy(policy: &str) -> PyResult<MatchPolicy> {
    match policy {
        "first_wins" => Ok(MatchPolicy::FirstWins),
        "lowest_cost" => Ok(MatchPolicy::LowestCost),
        other => Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
            "Unknown match policy '{other}', expected 'first_wins' or 'lowest_cost'"
        ))),
    }
}

/// Build the network graph from explicit inputs
///
/// Parameters
/// ----------
/// layers : list[str]
///     FlatGeobuf (``.fgb``) or GeoJSON line layers (roads, trails) sharing one CRS
/// dem_path : str
///     Single band elevation GeoTIFF in the same CRS
/// graph_output : str
///     Destination of the binary graph
/// debug_output : str, optional
///     Destination of the debug GeoJSON document
/// snap_decimals : int, default=5
///     Decimal places kept when snapping node coordinates
/// match_policy : str, default="first_wins"
///     ``first_wins`` or ``lowest_cost`` for segments shared by several features
///
/// Returns
/// -------
/// tuple[NetworkGraph, BuildReport]
///
/// Raises
/// ------
/// ValueError
///     If the match policy is unknown
/// RuntimeError
///     If an input is missing or invalid, or an output cannot be written
///
/// Notes
/// -----
/// The function releases the GIL during processing to allow other Python threads to continue execution.
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction(name = "build_network_graph")]
#[pyo3(signature = (layers, dem_path, graph_output, debug_output=None, snap_decimals=5, match_policy="first_wins"))]
pub fn py_build_network_graph(
    py: Python<'_>,
    layers: Vec<String>,
    dem_path: &str,
    graph_output: &str,
    debug_output: Option<&str>,
    snap_decimals: i32,
    match_policy: &str,
) -> PyResult<(PyNetworkGraph, PyBuildReport)> {
    let mut config = GraphBuildConfig::from_run_dir(".");
    config.layers = layers.into_iter().map(PathBuf::from).collect();
    config.dem_path = PathBuf::from(dem_path);
    config.graph_output = PathBuf::from(graph_output);
    config.debug_output = debug_output.map(PathBuf::from);
    config.snap_decimals = snap_decimals;
    config.match_policy = parse_policy(match_policy)?;
    run(py, config)
}

/// Build the network graph from a prepared run directory
///
/// Reads ``temp/osm_layers/road.fgb``, ``temp/osm_layers/trail.fgb``
/// and ``temp/cropped_meters.tif``; writes ``graph.bin`` and
/// ``graph_debug.geojson`` into the directory.
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction(name = "build_from_run_dir")]
pub fn py_build_from_run_dir(
    py: Python<'_>,
    run_dir: &str,
) -> PyResult<(PyNetworkGraph, PyBuildReport)> {
    run(py, GraphBuildConfig::from_run_dir(run_dir))
}

/// Build the network graph from a TOML configuration file
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction(name = "build_from_config")]
pub fn py_build_from_config(
    py: Python<'_>,
    config_path: &str,
) -> PyResult<(PyNetworkGraph, PyBuildReport)> {
    let config = GraphBuildConfig::from_toml_file(config_path).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
            "Failed to load configuration: {e}"
        ))
    })?;
    run(py, config)
}
