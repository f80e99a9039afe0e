use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::Deserialize;

use crate::Error;

/// Routing bias applied to segment lengths
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// `highway` values treated as footpaths
    pub trail_types: Vec<String>,
    /// Multiplier for footpaths
    pub trail_type_factor: f64,
    /// Multiplier for segments flagged as part of the main trail
    pub main_trail_factor: f64,
    /// Multipliers keyed by feature name, used when the main trail flag is absent
    pub name_factors: HashMap<String, f64>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            trail_types: vec!["path".into(), "track".into(), "footway".into()],
            trail_type_factor: 0.5,
            main_trail_factor: 0.1,
            name_factors: HashMap::new(),
        }
    }
}

/// How a noded segment picks its tags when several original features contain it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Lowest feature id (load order) wins
    #[default]
    FirstWins,
    /// Candidate with the smallest weight multiplier wins, ties to the lowest id
    LowestCost,
}

/// Inputs, outputs and tuning of a graph build
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphBuildConfig {
    /// Line layers, read in order
    pub layers: Vec<PathBuf>,
    /// Single band elevation GeoTIFF
    pub dem_path: PathBuf,
    pub graph_output: PathBuf,
    #[serde(default)]
    pub debug_output: Option<PathBuf>,
    /// Decimal places kept when snapping vertices
    #[serde(default = "default_snap_decimals")]
    pub snap_decimals: i32,
    /// Distance under which a vertex counts as lying on a feature
    #[serde(default = "default_containment_tolerance")]
    pub containment_tolerance: f64,
    #[serde(default)]
    pub match_policy: MatchPolicy,
    #[serde(default)]
    pub weights: WeightConfig,
}

fn default_snap_decimals() -> i32 {
    5
}

fn default_containment_tolerance() -> f64 {
    1e-6
}

impl GraphBuildConfig {
    /// Layout of a run directory prepared by the upstream download steps
    pub fn from_run_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let layers_dir = dir.join("temp").join("osm_layers");
        Self {
            layers: vec![
                layers_dir.join("road.fgb"),
                layers_dir.join("trail.fgb"),
            ],
            dem_path: dir.join("temp").join("cropped_meters.tif"),
            graph_output: dir.join("graph.bin"),
            debug_output: Some(dir.join("graph_debug.geojson")),
            snap_decimals: default_snap_decimals(),
            containment_tolerance: default_containment_tolerance(),
            match_policy: MatchPolicy::default(),
            weights: WeightConfig::default(),
        }
    }

    /// Parse a TOML document; relative paths stay relative to the working directory
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        toml::from_str(source).map_err(|e| Error::InvalidData(format!("Invalid config: {e}")))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to read config '{}': {}", path.display(), e),
            )
        })?;
        Self::from_toml_str(&source)
    }
}

pub(crate) fn validate_config(config: &GraphBuildConfig) -> Result<(), Error> {
    if config.layers.is_empty() {
        return Err(Error::InvalidData(
            "No line layers provided in the configuration".to_string(),
        ));
    }

    for layer in &config.layers {
        if !layer.exists() {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Line layer not found: {}", layer.display()),
            )));
        }
    }

    if !config.dem_path.exists() {
        return Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Elevation raster not found: {}", config.dem_path.display()),
        )));
    }

    if !(0..=12).contains(&config.snap_decimals) {
        return Err(Error::InvalidData(format!(
            "snap_decimals must be between 0 and 12, got {}",
            config.snap_decimals
        )));
    }

    if !config.containment_tolerance.is_finite() || config.containment_tolerance < 0.0 {
        return Err(Error::InvalidData(format!(
            "containment_tolerance must be a finite non-negative number, got {}",
            config.containment_tolerance
        )));
    }

    validate_weights(&config.weights)
}

fn validate_weights(weights: &WeightConfig) -> Result<(), Error> {
    let factors = [
        ("trail_type_factor", weights.trail_type_factor),
        ("main_trail_factor", weights.main_trail_factor),
    ]
    .into_iter()
    .chain(
        weights
            .name_factors
            .iter()
            .map(|(_, &factor)| ("name_factors", factor)),
    );

    for (field, factor) in factors {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidData(format!(
                "{field} must be a finite positive number, got {factor}"
            )));
        }
    }
    Ok(())
}
