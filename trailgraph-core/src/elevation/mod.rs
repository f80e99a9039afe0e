//! Elevation raster access and per-vertex sampling

mod geotiff;
mod raster;
mod sampler;

pub use raster::{AffineTransform, ElevationRaster, RasterSample};
pub use sampler::{SamplingReport, sample_elevations};
