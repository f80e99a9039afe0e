use log::warn;

use super::raster::{ElevationRaster, RasterSample};
use crate::model::TaggedSegment;

/// Counters of the elevation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingReport {
    pub vertices: usize,
    /// Vertices outside the raster extent
    pub out_of_bounds: usize,
    /// Vertices on nodata or NaN cells
    pub nodata: usize,
}

/// Set the elevation of every vertex from the raster.
///
/// Nodata cells and positions off the grid yield 0.0 and are only counted.
/// `progress` receives a non-decreasing percentage after each segment and is
/// called with 100 last.
pub fn sample_elevations(
    mut segments: Vec<TaggedSegment>,
    raster: &ElevationRaster,
    progress: &mut dyn FnMut(u8),
) -> (Vec<TaggedSegment>, SamplingReport) {
    let mut report = SamplingReport::default();
    let total = segments.len();
    let mut last_reported = None;

    for (idx, segment) in segments.iter_mut().enumerate() {
        for vertex in segment.geometry.coords_mut() {
            report.vertices += 1;
            vertex.z = match raster.sample(vertex.x, vertex.y) {
                RasterSample::Value(z) => z,
                RasterSample::NoData => {
                    report.nodata += 1;
                    0.0
                }
                RasterSample::OutOfBounds => {
                    report.out_of_bounds += 1;
                    0.0
                }
            };
        }

        let percent = percentage(idx + 1, total);
        if last_reported != Some(percent) {
            progress(percent);
            last_reported = Some(percent);
        }
    }

    if report.out_of_bounds > 0 || report.nodata > 0 {
        warn!(
            "{} of {} vertices had no elevation ({} outside the raster, {} nodata), using 0",
            report.out_of_bounds + report.nodata,
            report.vertices,
            report.out_of_bounds,
            report.nodata
        );
    }
    (segments, report)
}

#[allow(clippy::cast_possible_truncation)]
fn percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done * 100 / total).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::AffineTransform;
    use crate::model::{Coord3, Crs, LineString3, LineTags};

    fn raster() -> ElevationRaster {
        ElevationRaster::new(
            2,
            2,
            vec![10.0, 20.0, 30.0, -1.0],
            AffineTransform::north_up(0.0, 2.0, 1.0, 1.0),
            Some(-1.0),
            Crs::from_epsg(32618),
        )
        .unwrap()
    }

    fn segment(coords: &[(f64, f64)]) -> TaggedSegment {
        TaggedSegment {
            geometry: LineString3::new(
                coords.iter().map(|&(x, y)| Coord3::new(x, y, -5.0)).collect(),
            ),
            tags: LineTags::default(),
            source: 0,
        }
    }

    #[test]
    fn every_vertex_gets_an_elevation() {
        let segments = vec![
            segment(&[(0.0, 2.0), (1.0, 2.0)]),
            segment(&[(0.0, 1.0), (1.0, 1.0), (50.0, 50.0)]),
        ];
        let (sampled, report) = sample_elevations(segments, &raster(), &mut |_| {});

        let z: Vec<Vec<f64>> = sampled
            .iter()
            .map(|s| s.geometry.coords().iter().map(|c| c.z).collect())
            .collect();
        assert_eq!(z, vec![vec![10.0, 20.0], vec![30.0, 0.0, 0.0]]);
        assert_eq!(
            report,
            SamplingReport {
                vertices: 5,
                out_of_bounds: 1,
                nodata: 1,
            }
        );
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let segments = (0..7).map(|_| segment(&[(0.0, 2.0), (1.0, 2.0)])).collect();
        let mut seen = Vec::new();
        sample_elevations(segments, &raster(), &mut |p| seen.push(p));

        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.last(), Some(&100));
        assert_eq!(seen.first(), Some(&14));
    }
}
