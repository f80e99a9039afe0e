//! Planar noding of the line network.
//!
//! Every straight piece of every feature goes into an R-tree; pieces whose
//! envelopes overlap are intersected with `geo`'s robust segment intersection.
//! Each intersection point is stored once and inserted into both pieces, so
//! the split lines share bit-identical node coordinates.

use geo::{Coord, Line, LineIntersection, line_intersection::line_intersection};
use hashbrown::HashSet;
use log::{debug, info};
use rstar::{AABB, RTree, RTreeObject};

use crate::Error;
use crate::model::geometry::coord_bits;
use crate::model::{Coord3, LineFeature, LineString3, Segment};

/// Counters of the noding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodingReport {
    /// Intersection and overlap points found between pieces
    pub cut_points: usize,
    pub segments: usize,
    /// Output pieces that retraced linework already emitted
    pub duplicates_removed: usize,
    pub zero_length_removed: usize,
}

/// Non-degenerate straight piece of a feature
#[derive(Debug, Clone, Copy)]
struct Piece {
    id: usize,
    feature: usize,
    /// Position among the feature's non-degenerate pieces
    ordinal: usize,
    /// Index of the first vertex in the feature geometry
    vertex: usize,
    line: Line<f64>,
}

impl RTreeObject for Piece {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.line.start.x, self.line.start.y],
            [self.line.end.x, self.line.end.y],
        )
    }
}

/// Split all features at every crossing, touch and overlap.
///
/// The result is the planar union of the input linework: segments meet only
/// at shared endpoints and coincident linework appears once. Attributes are
/// not carried over.
///
/// # Errors
///
/// Returns [`Error::UnsupportedGeometry`] if the union contains no line.
pub fn node_lines(features: &[LineFeature]) -> Result<(Vec<Segment>, NodingReport), Error> {
    let mut report = NodingReport::default();

    let pieces = collect_pieces(features);
    let piece_counts = pieces_per_feature(features.len(), &pieces);
    let tree = RTree::bulk_load(pieces.clone());

    let mut cuts: Vec<Vec<Coord<f64>>> = vec![Vec::new(); pieces.len()];
    let mut nodes: HashSet<(u64, u64)> = HashSet::new();

    for feature in features {
        for c in [feature.geometry.first(), feature.geometry.last()]
            .into_iter()
            .flatten()
        {
            nodes.insert(coord_bits(c.x, c.y));
        }
    }

    for piece in &pieces {
        for other in tree.locate_in_envelope_intersecting(&piece.envelope()) {
            if other.id <= piece.id {
                continue;
            }
            let adjacent = piece.feature == other.feature
                && are_adjacent(piece, other, piece_counts[piece.feature], features);

            match line_intersection(piece.line, other.line) {
                Some(LineIntersection::SinglePoint { intersection, .. }) if !adjacent => {
                    record_cut(&mut cuts, &mut nodes, piece.id, other.id, intersection);
                    report.cut_points += 1;
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    record_cut(&mut cuts, &mut nodes, piece.id, other.id, intersection.start);
                    record_cut(&mut cuts, &mut nodes, piece.id, other.id, intersection.end);
                    report.cut_points += 2;
                }
                _ => {}
            }
        }
    }
    debug!("Found {} cut points between line pieces", report.cut_points);

    let mut segments = Vec::new();
    let mut emitted: HashSet<Vec<(u64, u64)>> = HashSet::new();
    let mut pieces_iter = pieces.iter().peekable();

    for (feature_idx, feature) in features.iter().enumerate() {
        let mut feature_pieces = Vec::new();
        while let Some(piece) = pieces_iter.next_if(|p| p.feature == feature_idx) {
            feature_pieces.push(*piece);
        }

        let vertices = densify(feature, &feature_pieces, &cuts);
        for geometry in split_at_nodes(&vertices, &nodes) {
            if geometry.planar_length() == 0.0 {
                report.zero_length_removed += 1;
            } else if !emitted.insert(geometry.planar_key()) {
                report.duplicates_removed += 1;
            } else {
                segments.push(Segment { geometry });
            }
        }
    }

    if segments.is_empty() {
        return Err(Error::UnsupportedGeometry(
            "topological union produced no line segments".to_string(),
        ));
    }

    report.segments = segments.len();
    info!(
        "Noded {} features into {} segments ({} duplicates removed)",
        features.len(),
        segments.len(),
        report.duplicates_removed
    );
    Ok((segments, report))
}

fn collect_pieces(features: &[LineFeature]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for (feature_idx, feature) in features.iter().enumerate() {
        let mut ordinal = 0;
        for (vertex, pair) in feature.geometry.coords().windows(2).enumerate() {
            if pair[0].same_xy(&pair[1]) {
                continue;
            }
            pieces.push(Piece {
                id: pieces.len(),
                feature: feature_idx,
                ordinal,
                vertex,
                line: Line::new(pair[0].xy(), pair[1].xy()),
            });
            ordinal += 1;
        }
    }
    pieces
}

fn pieces_per_feature(feature_count: usize, pieces: &[Piece]) -> Vec<usize> {
    let mut counts = vec![0; feature_count];
    for piece in pieces {
        counts[piece.feature] += 1;
    }
    counts
}

/// Consecutive pieces of one feature, including the seam of a closed ring
fn are_adjacent(a: &Piece, b: &Piece, count: usize, features: &[LineFeature]) -> bool {
    let (low, high) = if a.ordinal < b.ordinal {
        (a.ordinal, b.ordinal)
    } else {
        (b.ordinal, a.ordinal)
    };
    if high - low == 1 {
        return true;
    }
    let geometry = &features[a.feature].geometry;
    let closed = match (geometry.first(), geometry.last()) {
        (Some(first), Some(last)) => first.same_xy(last),
        _ => false,
    };
    closed && low == 0 && high + 1 == count
}

fn record_cut(
    cuts: &mut [Vec<Coord<f64>>],
    nodes: &mut HashSet<(u64, u64)>,
    a: usize,
    b: usize,
    at: Coord<f64>,
) {
    cuts[a].push(at);
    cuts[b].push(at);
    nodes.insert(coord_bits(at.x, at.y));
}

/// Feature vertices with the cut points inserted in order along each piece.
///
/// Inserted vertices take an elevation interpolated along their piece.
fn densify(feature: &LineFeature, pieces: &[Piece], cuts: &[Vec<Coord<f64>>]) -> Vec<Coord3> {
    let coords = feature.geometry.coords();
    let mut vertices = Vec::with_capacity(coords.len());
    let Some(first) = coords.first() else {
        return vertices;
    };
    vertices.push(*first);

    for piece in pieces {
        let start = coords[piece.vertex];
        let end = coords[piece.vertex + 1];
        let start_bits = coord_bits(start.x, start.y);
        let end_bits = coord_bits(end.x, end.y);

        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let length_sq = dx * dx + dy * dy;

        let mut interior: Vec<(f64, Coord<f64>)> = cuts[piece.id]
            .iter()
            .filter(|c| {
                let bits = coord_bits(c.x, c.y);
                bits != start_bits && bits != end_bits
            })
            .map(|c| {
                let t = ((c.x - start.x) * dx + (c.y - start.y) * dy) / length_sq;
                (t.clamp(0.0, 1.0), *c)
            })
            .collect();
        interior.sort_by(|a, b| a.0.total_cmp(&b.0));
        interior.dedup_by_key(|(_, c)| coord_bits(c.x, c.y));

        if vertices.last().is_some_and(|last| !last.same_xy(&start)) {
            vertices.push(start);
        }
        for (t, c) in interior {
            vertices.push(Coord3::new(c.x, c.y, start.z + t * (end.z - start.z)));
        }
        vertices.push(end);
    }
    vertices
}

/// Split a vertex sequence at every interior vertex that is a node
fn split_at_nodes(vertices: &[Coord3], nodes: &HashSet<(u64, u64)>) -> Vec<LineString3> {
    let mut lines = Vec::new();
    let mut current: Vec<Coord3> = Vec::new();

    for (idx, vertex) in vertices.iter().enumerate() {
        if current.last().is_some_and(|last| last.same_xy(vertex)) {
            continue;
        }
        current.push(*vertex);
        let is_last = idx + 1 == vertices.len();
        if current.len() > 1 && !is_last && nodes.contains(&coord_bits(vertex.x, vertex.y)) {
            lines.push(LineString3::new(std::mem::take(&mut current)));
            current.push(*vertex);
        }
    }
    if current.len() > 1 {
        lines.push(LineString3::new(current));
    }
    lines
}
