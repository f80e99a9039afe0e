use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};

use trailgraph_core::prelude::*;

/// NetworkGraph
///
/// Routable trail and road graph with snapped nodes, weighted edges and
/// cumulative distance/ascent/descent along every edge in both directions.
///
/// Example:
///
/// .. code-block:: python
///
///     graph, report = build_from_run_dir("out")
///     print(graph.node_count(), graph.edge_count())
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "NetworkGraph")]
pub struct PyNetworkGraph {
    pub(crate) graph: NetworkGraph,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyNetworkGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of connected components
    pub fn component_count(&self) -> usize {
        self.graph.component_count()
    }

    /// Nodes as ``(id, x, y, z)`` tuples in id order
    pub fn nodes(&self) -> Vec<(u32, f64, f64, f64)> {
        self.graph
            .nodes
            .iter()
            .map(|n| (n.id, n.x, n.y, n.z))
            .collect()
    }

    /// Edges as ``(start, end, weight)`` tuples
    pub fn edges(&self) -> Vec<(u32, u32, f64)> {
        self.graph
            .edges
            .iter()
            .map(|e| (e.start, e.end, e.weight))
            .collect()
    }

    /// Edge geometry as ``(x, y, z)`` vertices
    pub fn edge_geometry(&self, index: usize) -> PyResult<Vec<(f64, f64, f64)>> {
        let edge = self.graph.edges.get(index).ok_or_else(|| {
            PyErr::new::<pyo3::exceptions::PyIndexError, _>(format!(
                "Edge index {index} out of range for {} edges",
                self.graph.edge_count()
            ))
        })?;
        Ok(edge.geometry.coords().iter().map(|c| (c.x, c.y, c.z)).collect())
    }

    /// Debug document: node points then edge lines, as a GeoJSON string
    pub fn to_geojson(&self) -> PyResult<String> {
        debug_geojson_string(&self.graph, None)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
    }

    /// Binary encoding, identical to the ``graph.bin`` artifact
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_graph(&self.graph)
    }

    /// Write the binary graph to ``path``, returning the number of bytes
    pub fn write(&self, py: Python<'_>, path: &str) -> PyResult<usize> {
        py.detach(|| {
            write_graph(&self.graph, path).map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                    "Failed to write graph: {e}"
                ))
            })
        })
    }

    /// Write the debug GeoJSON document to ``path``
    #[pyo3(signature = (path, crs=None))]
    pub fn write_geojson(&self, py: Python<'_>, path: &str, crs: Option<&str>) -> PyResult<()> {
        let crs = crs.map(Crs::from_name);
        py.detach(|| {
            write_debug_geojson(&self.graph, crs.as_ref(), path).map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                    "Failed to write GeoJSON: {e}"
                ))
            })
        })
    }

    fn __repr__(&self) -> String {
        format!(
            "NetworkGraph with {} nodes and {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}

/// Load a graph previously written to ``graph.bin``
///
/// Tags are not part of the binary format and are empty on the loaded edges.
///
/// Raises
/// ------
/// RuntimeError
///     If the file cannot be read or fails verification
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction(name = "read_graph")]
pub fn py_read_graph(py: Python<'_>, path: &str) -> PyResult<PyNetworkGraph> {
    py.detach(|| {
        let graph = read_graph(path).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to read graph: {e}"
            ))
        })?;
        Ok(PyNetworkGraph { graph })
    })
}
