//! Three-dimensional line geometry.
//!
//! `geo` types are planar, so lines that carry elevation keep their own
//! coordinate type and project into `geo` whenever a planar algorithm is needed.

use geo::{Coord, LineString};

/// Coordinate with elevation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coord3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar part of the coordinate
    pub fn xy(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    pub fn planar_distance(&self, other: &Coord3) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Same planar position, elevation ignored
    pub fn same_xy(&self, other: &Coord3) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl From<Coord<f64>> for Coord3 {
    fn from(c: Coord<f64>) -> Self {
        Self::new(c.x, c.y, 0.0)
    }
}

/// Ordered 3D vertex sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineString3(pub Vec<Coord3>);

impl LineString3 {
    pub fn new(coords: Vec<Coord3>) -> Self {
        Self(coords)
    }

    pub fn coords(&self) -> &[Coord3] {
        &self.0
    }

    pub fn coords_mut(&mut self) -> &mut [Coord3] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Coord3> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Coord3> {
        self.0.last()
    }

    /// Sum of 2D step distances
    pub fn planar_length(&self) -> f64 {
        self.0
            .windows(2)
            .map(|pair| pair[0].planar_distance(&pair[1]))
            .sum()
    }

    /// Projection into a planar `geo` line
    pub fn to_2d(&self) -> LineString<f64> {
        self.0.iter().map(Coord3::xy).collect()
    }

    #[cfg(test)]
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }

    /// Orientation-independent identity of the planar vertex sequence.
    ///
    /// Two lines with the same key trace the same vertices, in either direction.
    pub fn planar_key(&self) -> Vec<(u64, u64)> {
        let forward: Vec<(u64, u64)> = self.0.iter().map(|c| coord_bits(c.x, c.y)).collect();
        let backward: Vec<(u64, u64)> = forward.iter().rev().copied().collect();
        if backward < forward { backward } else { forward }
    }
}

impl From<Vec<Coord3>> for LineString3 {
    fn from(coords: Vec<Coord3>) -> Self {
        Self(coords)
    }
}

/// Bit pattern of a planar position, with negative zero folded into zero
pub(crate) fn coord_bits(x: f64, y: f64) -> (u64, u64) {
    ((x + 0.0).to_bits(), (y + 0.0).to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_length_ignores_elevation() {
        let line = LineString3::new(vec![
            Coord3::new(0.0, 0.0, 0.0),
            Coord3::new(3.0, 4.0, 100.0),
            Coord3::new(3.0, 10.0, -50.0),
        ]);
        assert!((line.planar_length() - 11.0).abs() < 1e-12);
    }

    #[test]
    fn planar_key_is_direction_independent() {
        let line = LineString3::new(vec![
            Coord3::new(0.0, 0.0, 1.0),
            Coord3::new(1.0, 0.0, 2.0),
            Coord3::new(1.0, 1.0, 3.0),
        ]);
        let mut other = line.reversed();
        other.coords_mut()[1].z = 99.0;
        assert_eq!(line.planar_key(), other.planar_key());
    }

    #[test]
    fn negative_zero_has_the_key_of_zero() {
        assert_eq!(coord_bits(-0.0, 1.0), coord_bits(0.0, 1.0));
    }
}
