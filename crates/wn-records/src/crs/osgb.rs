//! British National Grid (EPSG:27700) to WGS84.
//!
//! Transverse-mercator inverse on the Airy 1830 ellipsoid gives OSGB36
//! lon/lat; a seven-parameter Helmert shift then moves it onto WGS84.
//! The Helmert step is good to a few metres, enough for network drawing
//! and pipe lengths.

use wn_core::Coord;

struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    fn e2(&self) -> f64 {
        1.0 - (self.b * self.b) / (self.a * self.a)
    }
}

const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    b: 6_356_256.909,
};
const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    b: 6_356_752.314_245,
};

/// National Grid projection constants.
const SCALE: f64 = 0.999_601_271_7;
const ORIGIN_LAT_DEG: f64 = 49.0;
const ORIGIN_LON_DEG: f64 = -2.0;
const FALSE_EASTING: f64 = 400_000.0;
const FALSE_NORTHING: f64 = -100_000.0;

/// OSGB36 -> WGS84: translation (m), scale (ppm), rotation (arc seconds).
const SHIFT_M: [f64; 3] = [446.448, -125.157, 542.060];
const SCALE_PPM: f64 = -20.4894;
const ROTATION_SEC: [f64; 3] = [0.1502, 0.2470, 0.8421];

/// Meridional arc from the true origin to `lat`, metres.
fn meridional_arc(lat: f64) -> f64 {
    let Ellipsoid { a, b } = AIRY_1830;
    let n = (a - b) / (a + b);
    let (n2, n3) = (n * n, n * n * n);
    let lat0 = ORIGIN_LAT_DEG.to_radians();
    let (d, s) = (lat - lat0, lat + lat0);
    b * SCALE
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * d
            - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * d.sin() * s.cos()
            + (15.0 / 8.0) * (n2 + n3) * (2.0 * d).sin() * (2.0 * s).cos()
            - (35.0 / 24.0) * n3 * (3.0 * d).sin() * (3.0 * s).cos())
}

/// Easting/northing to OSGB36 (lat, lon) in radians.
fn grid_to_osgb36(easting: f64, northing: f64) -> (f64, f64) {
    let a = AIRY_1830.a;
    let e2 = AIRY_1830.e2();

    let mut lat = ORIGIN_LAT_DEG.to_radians();
    let mut m: f64 = 0.0;
    // Converges in a handful of steps; the cap guards against NaN input.
    for _ in 0..32 {
        lat += (northing - FALSE_NORTHING - m) / (a * SCALE);
        m = meridional_arc(lat);
        if (northing - FALSE_NORTHING - m).abs() < 1e-5 {
            break;
        }
    }

    let sin2 = lat.sin().powi(2);
    let nu = a * SCALE / (1.0 - e2 * sin2).sqrt();
    let rho = a * SCALE * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);
    let eta2 = nu / rho - 1.0;
    let t = lat.tan();
    let (t2, t4) = (t * t, t.powi(4));
    let sec = 1.0 / lat.cos();

    let vii = t / (2.0 * rho * nu);
    let viii = t / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * t2 + eta2 - 9.0 * t2 * eta2);
    let ix = t / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * t2 + 45.0 * t4);
    let x = sec / nu;
    let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * t2);
    let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * t2 + 24.0 * t4);
    let xiia = sec / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t.powi(6));

    let de = easting - FALSE_EASTING;
    let lat = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lon = ORIGIN_LON_DEG.to_radians() + x * de - xi * de.powi(3) + xii * de.powi(5)
        - xiia * de.powi(7);
    (lat, lon)
}

fn to_cartesian(lat: f64, lon: f64, ellipsoid: &Ellipsoid) -> [f64; 3] {
    let e2 = ellipsoid.e2();
    let nu = ellipsoid.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    [
        nu * lat.cos() * lon.cos(),
        nu * lat.cos() * lon.sin(),
        (1.0 - e2) * nu * lat.sin(),
    ]
}

fn from_cartesian([x, y, z]: [f64; 3], ellipsoid: &Ellipsoid) -> (f64, f64) {
    let e2 = ellipsoid.e2();
    let p = x.hypot(y);
    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = ellipsoid.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        lat = (z + e2 * nu * lat.sin()).atan2(p);
    }
    (lat, y.atan2(x))
}

fn helmert([x, y, z]: [f64; 3]) -> [f64; 3] {
    let s = 1.0 + SCALE_PPM * 1e-6;
    let [rx, ry, rz] = ROTATION_SEC.map(|r| (r / 3600.0).to_radians());
    let [tx, ty, tz] = SHIFT_M;
    [
        tx + s * x - rz * y + ry * z,
        ty + rz * x + s * y - rx * z,
        tz - ry * x + rx * y + s * z,
    ]
}

/// National Grid easting/northing (metres) to WGS84 lon/lat (degrees).
pub(super) fn british_grid_to_lonlat(c: Coord) -> Coord {
    let (lat, lon) = grid_to_osgb36(c.x, c.y);
    let (lat, lon) = from_cartesian(helmert(to_cartesian(lat, lon, &AIRY_1830)), &WGS84);
    Coord::new(lon.to_degrees(), lat.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from the Ordnance Survey coordinate systems guide.
    const CAISTER: Coord = Coord {
        x: 651_409.903,
        y: 313_177.270,
    };

    #[test]
    fn grid_inverse_matches_os_worked_example() {
        let (lat, lon) = grid_to_osgb36(CAISTER.x, CAISTER.y);
        let want_lat = 52.0 + 39.0 / 60.0 + 27.2531 / 3600.0;
        let want_lon = 1.0 + 43.0 / 60.0 + 4.5177 / 3600.0;
        assert!((lat.to_degrees() - want_lat).abs() < 1e-7);
        assert!((lon.to_degrees() - want_lon).abs() < 1e-7);
    }

    #[test]
    fn datum_shift_moves_a_hundred_metres_or_so() {
        let (lat, lon) = grid_to_osgb36(CAISTER.x, CAISTER.y);
        let wgs = british_grid_to_lonlat(CAISTER);
        assert!((wgs.y - 52.657_978_6).abs() < 1e-6, "{wgs:?}");
        assert!((wgs.x - 1.716_051_9).abs() < 1e-6, "{wgs:?}");
        let shift_deg = (wgs.y - lat.to_degrees()).hypot(wgs.x - lon.to_degrees());
        assert!(shift_deg > 5e-4 && shift_deg < 5e-3);
    }

    #[test]
    fn cartesian_round_trip() {
        let (lat, lon) = (51.5f64.to_radians(), (-0.12f64).to_radians());
        let (back_lat, back_lon) = from_cartesian(to_cartesian(lat, lon, &WGS84), &WGS84);
        assert!((back_lat - lat).abs() < 1e-12);
        assert!((back_lon - lon).abs() < 1e-12);
    }
}
