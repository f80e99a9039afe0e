use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::define_stub_info_gatherer;

use graph::{PyNetworkGraph, py_read_graph};
use pipeline::{PyBuildReport, py_build_from_config, py_build_from_run_dir, py_build_network_graph};

pub mod graph;
pub mod pipeline;

/// A Python module implemented in Rust.
#[pymodule]
fn trailgraph(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyNetworkGraph>()?;
    m.add_class::<PyBuildReport>()?;

    m.add_function(wrap_pyfunction!(py_build_network_graph, m)?)?;
    m.add_function(wrap_pyfunction!(py_build_from_run_dir, m)?)?;
    m.add_function(wrap_pyfunction!(py_build_from_config, m)?)?;
    m.add_function(wrap_pyfunction!(py_read_graph, m)?)?;
    Ok(())
}

#[cfg(feature = "stubgen")]
define_stub_info_gatherer!(stub_info);
