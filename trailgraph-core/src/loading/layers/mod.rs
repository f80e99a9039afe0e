//! Reading road and trail line layers into normalized 3D features

mod formats;
mod parser;

use std::path::{Path, PathBuf};

use geojson::{Feature, GeometryValue};
use log::{debug, info, warn};

pub use formats::{LayerFormat, LayerSource, read_layer};

use crate::Error;
use crate::model::{Crs, LineFeature};
use parser::{parse_line, parse_tags};

/// Counters of what the loader discarded or split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub features_read: usize,
    /// Extra features created by exploding multi-part lines
    pub parts_exploded: usize,
    pub dropped_null: usize,
    pub dropped_invalid: usize,
    pub dropped_non_line: usize,
}

impl LoadReport {
    pub fn dropped(&self) -> usize {
        self.dropped_null + self.dropped_invalid + self.dropped_non_line
    }
}

/// Normalized features of all layers, in layer order
#[derive(Debug, Clone)]
pub struct LoadedLayers {
    pub features: Vec<LineFeature>,
    pub crs: Crs,
    pub report: LoadReport,
}

/// Read every layer and normalize its features to simple 3D lines.
///
/// Layers are FlatGeobuf (`.fgb`) or GeoJSON (`.geojson`), picked by extension.
///
/// # Errors
///
/// Fails if a layer cannot be read or parsed, declares no CRS, declares a CRS
/// different from the first layer, or if no line geometry remains at all.
pub fn load_line_layers<P: AsRef<Path>>(paths: &[P]) -> Result<LoadedLayers, Error> {
    let mut features = Vec::new();
    let mut report = LoadReport::default();
    let mut layer_crs: Option<(Crs, PathBuf)> = None;

    for path in paths {
        let path = path.as_ref();
        let layer = read_layer(path)?;
        let crs = declared_crs(&layer, path)?;

        match &layer_crs {
            Some((first, first_path)) if !first.matches(&crs) => {
                return Err(Error::CrsMismatch {
                    left: first.to_string(),
                    left_source: first_path.display().to_string(),
                    right: crs.to_string(),
                    right_source: path.display().to_string(),
                });
            }
            Some(_) => {}
            None => layer_crs = Some((crs, path.to_path_buf())),
        }

        let before = features.len();
        normalize_features(layer.features, &mut features, &mut report);
        debug!(
            "Layer {} contributed {} line features",
            path.display(),
            features.len() - before
        );
    }

    let Some((crs, _)) = layer_crs else {
        return Err(Error::InvalidData("No line layers given".to_string()));
    };

    if features.is_empty() {
        return Err(Error::NoLineGeometry);
    }

    if report.dropped() > 0 {
        warn!(
            "Dropped {} geometries while loading ({} null, {} invalid, {} not lines)",
            report.dropped(),
            report.dropped_null,
            report.dropped_invalid,
            report.dropped_non_line
        );
    }
    info!(
        "Loaded {} line features in {} from {} layers",
        features.len(),
        crs,
        paths.len()
    );

    Ok(LoadedLayers {
        features,
        crs,
        report,
    })
}

fn declared_crs(layer: &LayerSource, path: &Path) -> Result<Crs, Error> {
    layer
        .crs
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(Crs::from_name)
        .ok_or_else(|| Error::MissingCrs(path.display().to_string()))
}

/// Explode, promote and filter raw features, appending the survivors to `out`
pub(crate) fn normalize_features(
    raw: Vec<Feature>,
    out: &mut Vec<LineFeature>,
    report: &mut LoadReport,
) {
    for feature in raw {
        report.features_read += 1;
        let tags = parse_tags(feature.properties.as_ref());

        match feature.geometry.map(|geometry| geometry.value) {
            None => report.dropped_null += 1,
            Some(GeometryValue::LineString { coordinates }) => match parse_line(&coordinates) {
                Some(line) => out.push(LineFeature::new(line, tags)),
                None => report.dropped_invalid += 1,
            },
            Some(GeometryValue::MultiLineString { coordinates }) => {
                let parts: Vec<_> = coordinates.iter().filter_map(|p| parse_line(p)).collect();
                report.dropped_invalid += coordinates.len() - parts.len();
                if parts.is_empty() {
                    continue;
                }
                report.parts_exploded += parts.len() - 1;
                out.extend(
                    parts
                        .into_iter()
                        .map(|line| LineFeature::new(line, tags.clone())),
                );
            }
            Some(_) => report.dropped_non_line += 1,
        }
    }
}
