use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flatgeobuf::FgbReader;
use geojson::{Feature, FeatureCollection};
use geozero::geojson::GeoJsonWriter;

use crate::Error;

/// On-disk encodings accepted for line layers, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFormat {
    FlatGeobuf,
    GeoJson,
}

impl LayerFormat {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("fgb") => Ok(Self::FlatGeobuf),
            Some("geojson" | "json") => Ok(Self::GeoJson),
            _ => Err(Error::InvalidData(format!(
                "Unsupported layer format '{}': expected .fgb or .geojson",
                path.display()
            ))),
        }
    }
}

/// Features of one layer plus the CRS name it declares, if any
#[derive(Debug, Clone, Default)]
pub struct LayerSource {
    pub crs: Option<String>,
    pub features: Vec<Feature>,
}

pub fn read_layer(path: &Path) -> Result<LayerSource, Error> {
    match LayerFormat::from_path(path)? {
        LayerFormat::FlatGeobuf => read_flatgeobuf(path),
        LayerFormat::GeoJson => read_geojson(path),
    }
}

fn open_layer(path: &Path) -> Result<BufReader<File>, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open layer '{}': {}", path.display(), e),
        )
    })?;
    Ok(BufReader::new(file))
}

fn parse_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::InvalidData(format!("Failed to parse layer '{}': {}", path.display(), e))
}

/// GeoJSON layer; the CRS comes from the legacy named `crs` member
fn read_geojson(path: &Path) -> Result<LayerSource, Error> {
    let collection: FeatureCollection =
        serde_json::from_reader(open_layer(path)?).map_err(|e| parse_error(path, e))?;
    Ok(LayerSource {
        crs: collection_crs(&collection),
        features: collection.features,
    })
}

pub(crate) fn collection_crs(collection: &FeatureCollection) -> Option<String> {
    collection
        .foreign_members
        .as_ref()?
        .get("crs")?
        .pointer("/properties/name")?
        .as_str()
        .map(str::to_string)
}

/// FlatGeobuf layer; features are streamed through geozero's GeoJSON writer so
/// both formats share one normalization path
fn read_flatgeobuf(path: &Path) -> Result<LayerSource, Error> {
    let mut file = open_layer(path)?;
    let reader = FgbReader::open(&mut file).map_err(|e| parse_error(path, e))?;

    let crs = reader.header().crs().and_then(|crs| {
        if crs.code() > 0 {
            Some(format!("{}:{}", crs.org().unwrap_or("EPSG"), crs.code()))
        } else {
            crs.wkt().map(str::to_string)
        }
    });

    let mut features = reader.select_all().map_err(|e| parse_error(path, e))?;
    let mut json = Vec::new();
    features
        .process_features(&mut GeoJsonWriter::new(&mut json))
        .map_err(|e| parse_error(path, e))?;

    let collection: FeatureCollection =
        serde_json::from_slice(&json).map_err(|e| parse_error(path, e))?;
    Ok(LayerSource {
        crs,
        features: collection.features,
    })
}
