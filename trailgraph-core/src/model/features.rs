//! Line features as read from the road and trail layers

use super::geometry::LineString3;

/// Index of a feature in load order
pub type FeatureId = usize;

/// Feature attributes that drive graph weighting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTags {
    /// OSM `highway` value, e.g. `path` or `residential`
    pub highway: Option<String>,
    pub name: Option<String>,
    /// Part of a designated long-distance trail
    pub main_trail: bool,
}

impl LineTags {
    pub fn highway(&self) -> &str {
        self.highway.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Simple 3D line with its tags
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub geometry: LineString3,
    pub tags: LineTags,
}

impl LineFeature {
    pub fn new(geometry: LineString3, tags: LineTags) -> Self {
        Self { geometry, tags }
    }
}

/// Untagged line produced by noding, later matched back to a feature
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub geometry: LineString3,
}

/// Segment with its recovered tags
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSegment {
    pub geometry: LineString3,
    pub tags: LineTags,
    /// Feature the tags were taken from
    pub source: FeatureId,
}
