//! Well-known binary for 3D line strings.
//!
//! Writes little-endian extended WKB (`0x80000002`, LineString with the Z
//! flag bit), the flavour GEOS emits for 3D lines. Reading also accepts the
//! ISO `1002` code and plain 2D `2`.

use crate::Error;
use crate::model::{Coord3, LineString3};

const LITTLE_ENDIAN: u8 = 1;
const BIG_ENDIAN: u8 = 0;
const EWKB_LINESTRING_Z: u32 = 0x8000_0002;
const ISO_LINESTRING_Z: u32 = 1002;
const LINESTRING: u32 = 2;

pub fn encode_linestring(line: &LineString3) -> Vec<u8> {
    let mut out = Vec::with_capacity(9 + line.len() * 24);
    out.push(LITTLE_ENDIAN);
    out.extend_from_slice(&EWKB_LINESTRING_Z.to_le_bytes());
    #[allow(clippy::cast_possible_truncation)]
    let count = line.len() as u32;
    out.extend_from_slice(&count.to_le_bytes());
    for c in line.coords() {
        out.extend_from_slice(&c.x.to_le_bytes());
        out.extend_from_slice(&c.y.to_le_bytes());
        out.extend_from_slice(&c.z.to_le_bytes());
    }
    out
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + N)
            .and_then(|s| <[u8; N]>::try_from(s).ok())
            .ok_or_else(|| Error::InvalidGraph(format!("WKB truncated at byte {}", self.pos)))?;
        self.pos += N;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32, Error> {
        let bytes = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn f64(&mut self) -> Result<f64, Error> {
        let bytes = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }
}

/// Parse a WKB LineString, 2D input gets `z = 0.0`
pub fn decode_linestring(buf: &[u8]) -> Result<LineString3, Error> {
    let little_endian = match buf.first() {
        Some(&LITTLE_ENDIAN) => true,
        Some(&BIG_ENDIAN) => false,
        Some(other) => {
            return Err(Error::InvalidGraph(format!(
                "Unknown WKB byte order marker {other}"
            )));
        }
        None => return Err(Error::InvalidGraph("Empty WKB geometry".to_string())),
    };
    let mut reader = Reader {
        buf,
        pos: 1,
        little_endian,
    };

    let has_z = match reader.u32()? {
        EWKB_LINESTRING_Z | ISO_LINESTRING_Z => true,
        LINESTRING => false,
        other => {
            return Err(Error::InvalidGraph(format!(
                "Expected a WKB LineString, got type code {other:#x}"
            )));
        }
    };

    let count = reader.u32()? as usize;
    let stride = if has_z { 24 } else { 16 };
    if buf.len() - reader.pos < count.saturating_mul(stride) {
        return Err(Error::InvalidGraph(format!(
            "WKB declares {count} points but holds {} bytes of coordinates",
            buf.len() - reader.pos
        )));
    }

    let mut coords = Vec::with_capacity(count);
    for _ in 0..count {
        let x = reader.f64()?;
        let y = reader.f64()?;
        let z = if has_z { reader.f64()? } else { 0.0 };
        coords.push(Coord3::new(x, y, z));
    }
    Ok(LineString3::new(coords))
}
