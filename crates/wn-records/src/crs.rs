//! Coordinate reference systems and the reprojection collaborator.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use wn_core::Coord;

use crate::error::{RecordsError, RecordsResult};
use crate::normalize::NormalizedInputs;

mod osgb;

/// Semi-major axis of the spherical web-mercator projection, metres.
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;
/// Latitude limit of web-mercator, degrees.
const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// A CRS identifier such as `EPSG:4326`, stored upper-cased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Crs(String);

impl Crs {
    pub const WGS84: &'static str = "EPSG:4326";
    pub const WEB_MERCATOR: &'static str = "EPSG:3857";
    pub const BRITISH_NATIONAL_GRID: &'static str = "EPSG:27700";

    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn wgs84() -> Self {
        Self::new(Self::WGS84)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Geographic (lon/lat degree) coordinates.
    pub fn is_geographic(&self) -> bool {
        self.0 == Self::WGS84
    }
}

impl From<String> for Crs {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Crs {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Crs> for String {
    fn from(c: Crs) -> Self {
        c.0
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pure point reprojection.
pub trait Reprojector: Send + Sync {
    fn project(&self, points: &[Coord], from: &Crs, to: &Crs) -> RecordsResult<Vec<Coord>>;
}

/// Identity, spherical web-mercator <-> WGS84 and British National Grid -> WGS84.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardReprojector;

fn mercator_to_lonlat(c: Coord) -> Coord {
    let lon = c.x / WEB_MERCATOR_RADIUS * 180.0 / PI;
    let lat = (2.0 * (c.y / WEB_MERCATOR_RADIUS).exp().atan() - PI / 2.0) * 180.0 / PI;
    Coord::new(lon, lat)
}

fn lonlat_to_mercator(c: Coord) -> Coord {
    let lat = c.y.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT).to_radians();
    let x = WEB_MERCATOR_RADIUS * c.x.to_radians();
    let y = WEB_MERCATOR_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln();
    Coord::new(x, y)
}

impl Reprojector for StandardReprojector {
    fn project(&self, points: &[Coord], from: &Crs, to: &Crs) -> RecordsResult<Vec<Coord>> {
        let f: fn(Coord) -> Coord = match (from.as_str(), to.as_str()) {
            (a, b) if a == b => return Ok(points.to_vec()),
            (Crs::WEB_MERCATOR, Crs::WGS84) => mercator_to_lonlat,
            (Crs::WGS84, Crs::WEB_MERCATOR) => lonlat_to_mercator,
            (Crs::BRITISH_NATIONAL_GRID, Crs::WGS84) => osgb::british_grid_to_lonlat,
            _ => {
                return Err(RecordsError::UnsupportedCrs {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        };
        Ok(points.iter().copied().map(f).collect())
    }
}

impl NormalizedInputs {
    /// Reproject every position and geometry in place.
    pub fn reproject(
        &mut self,
        reprojector: &dyn Reprojector,
        from: &Crs,
        to: &Crs,
    ) -> RecordsResult<()> {
        if from == to {
            return Ok(());
        }
        let mut one = |c: &mut Coord| -> RecordsResult<()> {
            if let Some(p) = reprojector.project(&[*c], from, to)?.first() {
                *c = *p;
            }
            Ok(())
        };
        for n in &mut self.nodes {
            one(&mut n.position)?;
        }
        for a in &mut self.assets {
            one(&mut a.position)?;
        }
        for l in &mut self.leaks.leaks {
            one(&mut l.position)?;
        }
        for p in &mut self.pipes {
            if let Some(geom) = p.geometry.as_mut() {
                *geom = reprojector.project(geom, from, to)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{NodeRecord, PipeRecord};

    #[test]
    fn crs_codes_are_normalized() {
        assert_eq!(Crs::new(" epsg:4326 "), Crs::wgs84());
        assert!(Crs::wgs84().is_geographic());
        assert!(!Crs::new("EPSG:27700").is_geographic());
    }

    #[test]
    fn identity_is_exact() {
        let pts = [Coord::new(1.5, -2.0)];
        let out = StandardReprojector
            .project(&pts, &Crs::new("EPSG:27700"), &Crs::new("epsg:27700"))
            .unwrap();
        assert_eq!(out, pts.to_vec());
    }

    #[test]
    fn mercator_round_trip() {
        let r = StandardReprojector;
        let ll = [Coord::new(-0.1276, 51.5072)];
        let merc = r.project(&ll, &Crs::wgs84(), &Crs::new(Crs::WEB_MERCATOR)).unwrap();
        assert!((merc[0].x - -14_204.28).abs() < 1.0);
        let back = r.project(&merc, &Crs::new(Crs::WEB_MERCATOR), &Crs::wgs84()).unwrap();
        assert!((back[0].x - ll[0].x).abs() < 1e-9);
        assert!((back[0].y - ll[0].y).abs() < 1e-9);
    }

    #[test]
    fn unsupported_pair_is_an_error() {
        let err = StandardReprojector
            .project(&[], &Crs::wgs84(), &Crs::new("EPSG:27700"))
            .unwrap_err();
        assert!(matches!(
            err,
            RecordsError::UnsupportedCrs { ref from, ref to }
                if from == "EPSG:4326" && to == "EPSG:27700"
        ));
    }

    #[test]
    fn british_grid_lands_in_london() {
        // Trafalgar Square, near Nelson's Column.
        let out = StandardReprojector
            .project(
                &[Coord::new(530_034.0, 180_381.0)],
                &Crs::new(Crs::BRITISH_NATIONAL_GRID),
                &Crs::wgs84(),
            )
            .unwrap();
        assert!((out[0].y - 51.5074).abs() < 1e-3, "{:?}", out[0]);
        assert!((out[0].x - -0.1277).abs() < 1e-3, "{:?}", out[0]);
    }

    #[test]
    fn reproject_updates_nodes_and_geometry() {
        let mut inputs = NormalizedInputs::default();
        inputs.nodes.push(NodeRecord::junction("N1", 0.0, 0.0));
        let mut p = PipeRecord::between("P1", "N1", "N1");
        p.geometry = Some(vec![Coord::new(0.0, 0.0), Coord::new(111_319.49, 0.0)]);
        inputs.pipes.push(p);

        inputs
            .reproject(&StandardReprojector, &Crs::new(Crs::WEB_MERCATOR), &Crs::wgs84())
            .unwrap();
        let geom = inputs.pipes[0].geometry.as_ref().unwrap();
        assert!((geom[1].x - 1.0).abs() < 1e-6);
        assert_eq!(inputs.nodes[0].position, Coord::new(0.0, 0.0));
    }
}
