//! Coordinate reference system identifiers

use std::fmt;

/// CRS as declared by a layer or raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs {
    /// Declared name, e.g. `EPSG:32618` or `urn:ogc:def:crs:EPSG::32618`
    pub name: String,
    /// EPSG code when the name resolves to one
    pub epsg: Option<u32>,
}

impl Crs {
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let epsg = parse_epsg(&name);
        Self { name, epsg }
    }

    pub fn from_epsg(code: u32) -> Self {
        Self {
            name: format!("EPSG:{code}"),
            epsg: Some(code),
        }
    }

    /// Same system: equal EPSG codes, or equal names when either code is unknown
    pub fn matches(&self, other: &Crs) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => self.name.eq_ignore_ascii_case(&other.name),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg {
            Some(code) => write!(f, "EPSG:{code}"),
            None => f.write_str(&self.name),
        }
    }
}

fn parse_epsg(name: &str) -> Option<u32> {
    let upper = name.trim().to_ascii_uppercase();
    // CRS84 is WGS84 with lon/lat axis order, which is what GeoJSON carries anyway
    if upper.ends_with("CRS84") {
        return Some(4326);
    }
    let (_, rest) = upper.rsplit_once("EPSG")?;
    rest.rsplit(|c: char| c == ':' || c == '/')
        .find(|part| !part.is_empty())
        .and_then(|code| code.trim().parse().ok())
}
