//! Recovering feature tags for noded segments.
//!
//! Noding loses the link between a segment and the feature it came from. The
//! noded segments and the original features stay two separate collections,
//! joined by a spatial "contained within" lookup.

use geo::{Distance, Euclidean, LineString, Point};
use hashbrown::HashSet;
use log::{info, warn};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

use crate::loading::{MatchPolicy, WeightConfig};
use crate::model::{FeatureId, LineFeature, LineString3, Segment, TaggedSegment};
use crate::network::weight_factor;

type FeatureEnvelope = GeomWithData<Rectangle<[f64; 2]>, FeatureId>;

/// Counters of the join pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub matched: usize,
    /// Segments contained in more than one feature
    pub ambiguous: usize,
    pub unmatched: usize,
    pub duplicates_removed: usize,
}

/// Spatial index over the original, pre-noding features
pub struct SourceIndex<'a> {
    features: &'a [LineFeature],
    planar: Vec<LineString<f64>>,
    tree: RTree<FeatureEnvelope>,
    tolerance: f64,
}

impl<'a> SourceIndex<'a> {
    pub fn new(features: &'a [LineFeature], tolerance: f64) -> Self {
        let envelopes = features
            .iter()
            .enumerate()
            .filter_map(|(id, feature)| {
                let (min, max) = bounds(&feature.geometry)?;
                Some(GeomWithData::new(
                    Rectangle::from_corners(
                        [min[0] - tolerance, min[1] - tolerance],
                        [max[0] + tolerance, max[1] + tolerance],
                    ),
                    id,
                ))
            })
            .collect();

        Self {
            features,
            planar: features.iter().map(|f| f.geometry.to_2d()).collect(),
            tree: RTree::bulk_load(envelopes),
            tolerance,
        }
    }

    pub fn feature(&self, id: FeatureId) -> &'a LineFeature {
        &self.features[id]
    }

    /// First feature (in load order) that contains the segment
    pub fn find_source(&self, segment: &Segment) -> Option<FeatureId> {
        self.candidates(segment).into_iter().next()
    }

    /// All features containing the segment, ascending by id
    pub fn candidates(&self, segment: &Segment) -> Vec<FeatureId> {
        let Some((min, max)) = bounds(&segment.geometry) else {
            return Vec::new();
        };
        let envelope = AABB::from_corners(min, max);

        let mut found: Vec<FeatureId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|candidate| candidate.data)
            .filter(|&id| self.contains(id, &segment.geometry))
            .collect();
        found.sort_unstable();
        found
    }

    /// Every vertex and every piece midpoint of `line` lies on the feature
    fn contains(&self, id: FeatureId, line: &LineString3) -> bool {
        let feature = &self.planar[id];
        let on_feature =
            |x: f64, y: f64| Euclidean.distance(&Point::new(x, y), feature) <= self.tolerance;

        let coords = line.coords();
        coords.iter().all(|c| on_feature(c.x, c.y))
            && coords
                .windows(2)
                .all(|pair| on_feature((pair[0].x + pair[1].x) / 2.0, (pair[0].y + pair[1].y) / 2.0))
    }
}

/// Attaches source tags to noded segments
pub struct AttributeJoiner<'a> {
    index: SourceIndex<'a>,
    policy: MatchPolicy,
    weights: &'a WeightConfig,
}

impl<'a> AttributeJoiner<'a> {
    pub fn new(
        features: &'a [LineFeature],
        tolerance: f64,
        policy: MatchPolicy,
        weights: &'a WeightConfig,
    ) -> Self {
        Self {
            index: SourceIndex::new(features, tolerance),
            policy,
            weights,
        }
    }

    /// Tag every segment, drop the ones with no source and deduplicate geometry
    pub fn join(&self, segments: Vec<Segment>) -> (Vec<TaggedSegment>, JoinReport) {
        let mut report = JoinReport::default();
        let mut tagged = Vec::with_capacity(segments.len());

        for segment in segments {
            let candidates = self.index.candidates(&segment);
            if candidates.len() > 1 {
                report.ambiguous += 1;
            }
            let Some(source) = self.choose(&candidates) else {
                report.unmatched += 1;
                continue;
            };
            report.matched += 1;
            tagged.push(TaggedSegment {
                geometry: segment.geometry,
                tags: self.index.feature(source).tags.clone(),
                source,
            });
        }

        let mut seen = HashSet::new();
        tagged.retain(|segment| {
            let unique = seen.insert(segment.geometry.planar_key());
            if !unique {
                report.duplicates_removed += 1;
            }
            unique
        });

        if report.unmatched > 0 {
            warn!(
                "{} noded segments matched no source feature and were dropped",
                report.unmatched
            );
        }
        info!(
            "Recovered tags for {} segments ({} with several candidate sources)",
            tagged.len(),
            report.ambiguous
        );
        (tagged, report)
    }

    fn choose(&self, candidates: &[FeatureId]) -> Option<FeatureId> {
        match self.policy {
            MatchPolicy::FirstWins => candidates.first().copied(),
            MatchPolicy::LowestCost => candidates.iter().copied().min_by(|&a, &b| {
                let cost_a = weight_factor(&self.index.feature(a).tags, self.weights);
                let cost_b = weight_factor(&self.index.feature(b).tags, self.weights);
                cost_a.total_cmp(&cost_b).then(a.cmp(&b))
            }),
        }
    }
}

fn bounds(line: &LineString3) -> Option<([f64; 2], [f64; 2])> {
    let first = line.first()?;
    let init = ([first.x, first.y], [first.x, first.y]);
    Some(line.coords().iter().fold(init, |(min, max), c| {
        (
            [min[0].min(c.x), min[1].min(c.y)],
            [max[0].max(c.x), max[1].max(c.y)],
        )
    }))
}
