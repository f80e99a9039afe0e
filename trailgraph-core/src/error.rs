use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("No coordinate reference system declared by {0}")]
    MissingCrs(String),
    #[error("Coordinate reference system mismatch: {left} ({left_source}) vs {right} ({right_source})")]
    CrsMismatch {
        left: String,
        left_source: String,
        right: String,
        right_source: String,
    },
    #[error("No line geometry left after normalization")]
    NoLineGeometry,
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),
    #[error("Raster error: {0}")]
    RasterError(String),
    #[error("Invalid graph buffer: {0}")]
    InvalidGraph(String),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidData(e.to_string())
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::RasterError(e.to_string())
    }
}

impl From<flatbuffers::InvalidFlatbuffer> for Error {
    fn from(e: flatbuffers::InvalidFlatbuffer) -> Self {
        Error::InvalidGraph(e.to_string())
    }
}
