use crate::Error;
use crate::model::Crs;

/// Pixel to world mapping in GDAL geotransform order.
///
/// `x = c + a * col + b * row`, `y = f + d * col + e * row`, with `(col, row)`
/// measured from the outer corner of the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    /// North-up raster from its top-left corner and pixel size
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            a: pixel_width,
            b: 0.0,
            c: origin_x,
            d: 0.0,
            e: -pixel_height,
            f: origin_y,
        }
    }

    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.c + self.a * col + self.b * row,
            self.f + self.d * col + self.e * row,
        )
    }

    fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Fractional `(col, row)` of a world position
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.determinant();
        let dx = x - self.c;
        let dy = y - self.f;
        ((self.e * dx - self.b * dy) / det, (self.a * dy - self.d * dx) / det)
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det != 0.0
    }
}

/// Outcome of a single raster lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterSample {
    Value(f64),
    /// Cell holds the nodata marker or NaN
    NoData,
    OutOfBounds,
}

/// Single band elevation grid held in memory
#[derive(Debug, Clone)]
pub struct ElevationRaster {
    width: usize,
    height: usize,
    /// Row-major, top row first
    values: Vec<f64>,
    transform: AffineTransform,
    nodata: Option<f64>,
    crs: Crs,
}

impl ElevationRaster {
    /// # Errors
    ///
    /// Fails if the value count does not match the dimensions or the
    /// transform cannot be inverted.
    pub fn new(
        width: usize,
        height: usize,
        values: Vec<f64>,
        transform: AffineTransform,
        nodata: Option<f64>,
        crs: Crs,
    ) -> Result<Self, Error> {
        if values.len() != width * height {
            return Err(Error::RasterError(format!(
                "Expected {} cells for a {width}x{height} raster, got {}",
                width * height,
                values.len()
            )));
        }
        if !transform.is_invertible() {
            return Err(Error::RasterError(format!(
                "Raster transform is not invertible: {transform:?}"
            )));
        }
        Ok(Self {
            width,
            height,
            values,
            transform,
            nodata,
            crs,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Cell `(row, col)` nearest to a world position, rounding the fractional
    /// pixel position to the closest integer
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.transform.invert(x, y);
        let (col, row) = (col.round(), row.round());
        if !(col.is_finite() && row.is_finite()) || col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        (col < self.width && row < self.height).then_some((row, col))
    }

    pub fn sample(&self, x: f64, y: f64) -> RasterSample {
        let Some((row, col)) = self.cell_index(x, y) else {
            return RasterSample::OutOfBounds;
        };
        let value = self.values[row * self.width + col];
        if value.is_nan() || self.nodata.is_some_and(|nodata| value == nodata) {
            RasterSample::NoData
        } else {
            RasterSample::Value(value)
        }
    }

    #[cfg(test)]
    /// Elevation at a world position, 0.0 for nodata or positions off the grid
    pub fn elevation_at(&self, x: f64, y: f64) -> f64 {
        match self.sample(x, y) {
            RasterSample::Value(z) => z,
            RasterSample::NoData | RasterSample::OutOfBounds => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster() -> ElevationRaster {
        // 3x2 grid with 10 m pixels, top-left corner at (1000, 2000)
        ElevationRaster::new(
            3,
            2,
            vec![1.0, 2.0, 3.0, 4.0, -9999.0, f64::NAN],
            AffineTransform::north_up(1000.0, 2000.0, 10.0, 10.0),
            Some(-9999.0),
            Crs::from_epsg(32618),
        )
        .unwrap()
    }

    #[test]
    fn transform_round_trips() {
        let t = AffineTransform {
            a: 2.0,
            b: 0.5,
            c: 100.0,
            d: -0.25,
            e: -3.0,
            f: 50.0,
        };
        let (x, y) = t.apply(7.0, 4.0);
        let (col, row) = t.invert(x, y);
        assert!((col - 7.0).abs() < 1e-9);
        assert!((row - 4.0).abs() < 1e-9);
    }

    #[test]
    fn lookups_round_to_the_nearest_index() {
        let raster = raster();
        assert_eq!(raster.sample(1000.0, 2000.0), RasterSample::Value(1.0));
        assert_eq!(raster.sample(1004.0, 1996.0), RasterSample::Value(1.0));
        assert_eq!(raster.sample(1006.0, 2000.0), RasterSample::Value(2.0));
        assert_eq!(raster.sample(1000.0, 1991.0), RasterSample::Value(4.0));
    }

    #[test]
    fn nodata_and_nan_read_as_zero() {
        let raster = raster();
        assert_eq!(raster.sample(1010.0, 1990.0), RasterSample::NoData);
        assert_eq!(raster.elevation_at(1010.0, 1990.0), 0.0);
        assert_eq!(raster.sample(1020.0, 1990.0), RasterSample::NoData);
        assert_eq!(raster.elevation_at(1020.0, 1990.0), 0.0);
    }

    #[test]
    fn positions_off_the_grid_read_as_zero() {
        let raster = raster();
        assert_eq!(raster.sample(990.0, 2000.0), RasterSample::OutOfBounds);
        assert_eq!(raster.sample(1030.0, 2000.0), RasterSample::OutOfBounds);
        assert_eq!(raster.sample(1000.0, 1970.0), RasterSample::OutOfBounds);
        assert_eq!(raster.elevation_at(5000.0, 5000.0), 0.0);
    }

    #[test]
    fn rejects_mismatched_cell_count() {
        let result = ElevationRaster::new(
            2,
            2,
            vec![0.0; 3],
            AffineTransform::north_up(0.0, 0.0, 1.0, 1.0),
            None,
            Crs::from_epsg(4326),
        );
        assert!(matches!(result, Err(Error::RasterError(_))));
    }
}
