//! GeoTIFF decoding through the `tiff` crate.
//!
//! Only the georeferencing subset needed for elevation lookups is read: the
//! model transformation (or tiepoint plus pixel scale), the GDAL nodata tag
//! and the EPSG code from the GeoKey directory.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use super::raster::{AffineTransform, ElevationRaster};
use crate::Error;
use crate::model::Crs;

const GT_RASTER_TYPE_KEY: u32 = 1025;
const GEOGRAPHIC_TYPE_KEY: u32 = 2048;
const PROJECTED_CS_TYPE_KEY: u32 = 3072;
const RASTER_PIXEL_IS_POINT: u32 = 2;
const USER_DEFINED: u32 = 32767;

/// Key id to value for keys stored directly in the directory
struct GeoKeys(Vec<(u32, u32)>);

impl GeoKeys {
    fn parse(directory: &[u32]) -> Result<Self, Error> {
        let [_, _, _, count, entries @ ..] = directory else {
            return Err(Error::RasterError(
                "GeoKey directory header is truncated".to_string(),
            ));
        };
        let keys = entries
            .chunks_exact(4)
            .take(*count as usize)
            // location 0 means the value is stored inline
            .filter(|entry| entry[1] == 0)
            .map(|entry| (entry[0], entry[3]))
            .collect();
        Ok(Self(keys))
    }

    fn get(&self, key: u32) -> Option<u32> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

impl ElevationRaster {
    /// Read a single band GeoTIFF into memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCrs`] when the file has no GeoKey directory,
    /// [`Error::InvalidData`] when it is not georeferenced or has more than one
    /// band, and [`Error::RasterError`] when decoding fails.
    pub fn read_geotiff(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open raster '{}': {}", path.display(), e),
            )
        })?;
        let mut decoder = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => {
                return Err(Error::InvalidData(format!(
                    "Elevation raster '{}' must have a single band, found {other:?}",
                    path.display()
                )));
            }
        }

        let geo_keys = match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
            Some(value) => GeoKeys::parse(&value.into_u32_vec()?)?,
            None => return Err(Error::MissingCrs(path.display().to_string())),
        };
        let crs = match geo_keys
            .get(PROJECTED_CS_TYPE_KEY)
            .filter(|&code| code != USER_DEFINED)
            .or_else(|| {
                geo_keys
                    .get(GEOGRAPHIC_TYPE_KEY)
                    .filter(|&code| code != USER_DEFINED)
            }) {
            Some(code) => Crs::from_epsg(code),
            None => Crs::from_name(format!("user-defined ({})", path.display())),
        };

        let mut transform = read_transform(&mut decoder, path)?;
        if geo_keys.get(GT_RASTER_TYPE_KEY) == Some(RASTER_PIXEL_IS_POINT) {
            // Tie points address pixel centres; shift to the outer corner
            transform.c -= 0.5 * (transform.a + transform.b);
            transform.f -= 0.5 * (transform.d + transform.e);
        }

        let nodata = match decoder.find_tag(Tag::GdalNodata)? {
            Some(value) => {
                let text = value.into_string()?;
                let text = text.trim_end_matches('\0').trim();
                Some(text.parse::<f64>().map_err(|_| {
                    Error::InvalidData(format!("Unreadable nodata value '{text}'"))
                })?)
            }
            None => None,
        };

        let values = into_f64(decoder.read_image()?)?;
        debug!(
            "Read {width}x{height} raster from {} ({crs}, nodata {nodata:?})",
            path.display()
        );

        ElevationRaster::new(
            width as usize,
            height as usize,
            values,
            transform,
            nodata,
            crs,
        )
    }
}

fn read_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> Result<AffineTransform, Error> {
    if let Some(value) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let m = value.into_f64_vec()?;
        if m.len() < 8 {
            return Err(Error::InvalidData(format!(
                "Model transformation of '{}' has {} values",
                path.display(),
                m.len()
            )));
        }
        return Ok(AffineTransform {
            a: m[0],
            b: m[1],
            c: m[3],
            d: m[4],
            e: m[5],
            f: m[7],
        });
    }

    let tiepoint = decoder.find_tag(Tag::ModelTiepointTag)?;
    let scale = decoder.find_tag(Tag::ModelPixelScaleTag)?;
    let (Some(tiepoint), Some(scale)) = (tiepoint, scale) else {
        return Err(Error::InvalidData(format!(
            "Elevation raster '{}' is not georeferenced",
            path.display()
        )));
    };
    let tiepoint = tiepoint.into_f64_vec()?;
    let scale = scale.into_f64_vec()?;
    let (&[i, j, _, x, y, ..], &[sx, sy, ..]) = (tiepoint.as_slice(), scale.as_slice()) else {
        return Err(Error::InvalidData(format!(
            "Tie point or pixel scale of '{}' is truncated",
            path.display()
        )));
    };

    Ok(AffineTransform {
        a: sx,
        b: 0.0,
        c: x - i * sx,
        d: 0.0,
        e: -sy,
        f: y + j * sy,
    })
}

#[allow(clippy::cast_precision_loss)]
fn into_f64(result: DecodingResult) -> Result<Vec<f64>, Error> {
    #[allow(unreachable_patterns)]
    let values = match result {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        _ => {
            return Err(Error::RasterError(
                "Unsupported raster sample format".to_string(),
            ));
        }
    };
    Ok(values)
}
