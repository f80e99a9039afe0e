use itertools::Itertools;

use crate::model::{Coord3, CumulativeMeasure};

/// Running distance, ascent and descent at every vertex of `coords`.
///
/// The first entry is always zero. Distance is planar; elevation changes feed
/// ascent when positive and descent when negative.
pub fn cumulative_measures<'a, I>(coords: I) -> Vec<CumulativeMeasure>
where
    I: IntoIterator<Item = &'a Coord3>,
    I::IntoIter: Clone,
{
    let coords = coords.into_iter();
    let mut measures = Vec::with_capacity(coords.size_hint().0);
    let mut current = CumulativeMeasure::ZERO;

    if coords.clone().next().is_some() {
        measures.push(current);
    }
    for (a, b) in coords.tuple_windows() {
        current.distance += a.planar_distance(b);
        let dz = b.z - a.z;
        if dz > 0.0 {
            current.ascent += dz;
        } else {
            current.descent -= dz;
        }
        measures.push(current);
    }
    measures
}

/// Measures along the stored vertex order and along the reversed order
pub fn directional_measures(coords: &[Coord3]) -> (Vec<CumulativeMeasure>, Vec<CumulativeMeasure>) {
    (
        cumulative_measures(coords.iter()),
        cumulative_measures(coords.iter().rev()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_reverse_totals_agree() {
        let coords = [
            Coord3::new(0.0, 0.0, 100.0),
            Coord3::new(3.0, 4.0, 110.0),
            Coord3::new(3.0, 10.0, 104.0),
            Coord3::new(6.0, 14.0, 120.0),
        ];
        let (forward, reverse) = directional_measures(&coords);

        assert_eq!(forward.len(), 4);
        assert_eq!(reverse.len(), 4);
        assert_eq!(forward[0], CumulativeMeasure::ZERO);
        assert_eq!(reverse[0], CumulativeMeasure::ZERO);

        let f = forward[3];
        let r = reverse[3];
        assert!((f.distance - 16.0).abs() < 1e-12);
        assert!((r.distance - 16.0).abs() < 1e-12);
        assert!((f.ascent - 26.0).abs() < 1e-12);
        assert!((f.descent - 6.0).abs() < 1e-12);
        assert!((f.ascent - r.descent).abs() < 1e-12);
        assert!((f.descent - r.ascent).abs() < 1e-12);
    }

    #[test]
    fn measures_are_monotonic() {
        let coords = [
            Coord3::new(0.0, 0.0, 5.0),
            Coord3::new(1.0, 0.0, 1.0),
            Coord3::new(2.0, 0.0, 8.0),
        ];
        let forward = cumulative_measures(coords.iter());
        for (a, b) in forward.iter().tuple_windows() {
            assert!(b.distance >= a.distance);
            assert!(b.ascent >= a.ascent);
            assert!(b.descent >= a.descent);
        }
        assert_eq!(forward[1], CumulativeMeasure::new(1.0, 0.0, 4.0));
    }

    #[test]
    fn empty_input_has_no_measures() {
        assert!(cumulative_measures(std::iter::empty::<&Coord3>()).is_empty());
    }
}
