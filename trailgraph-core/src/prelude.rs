// Re-export key components
pub use crate::elevation::{ElevationRaster, sample_elevations};
pub use crate::export::{
    debug_geojson_string, decode_graph, encode_graph, read_graph, root_as_graph, to_debug_geojson,
    write_debug_geojson, write_graph,
};
pub use crate::loading::{
    BuildOutcome, BuildReport, GraphBuildConfig, MatchPolicy, WeightConfig,
    build_graph_from_features, build_network_graph, load_line_layers,
};
pub use crate::model::{
    Coord3, Crs, CumulativeMeasure, Edge, LineFeature, LineString3, LineTags, NetworkGraph, Node,
};
pub use crate::network::{build_graph, weight_factor};
pub use crate::topology::{AttributeJoiner, SourceIndex, node_lines};

pub use crate::Error;
pub use crate::NodeId;
