// src/projection.rs
//! WGS84 <-> UTM transverse Mercator (Snyder 1987, USGS Prof. Paper 1395).
//!
//! Sentinel-2 tiles are published in UTM zones (EPSG 326xx / 327xx), so this
//! is the only projected system the monitor needs.

use crate::error::{MonitorError, Result};

const A: f64 = 6_378_137.0;
const F: f64 = 1.0 / 298.257_223_563;
const E2: f64 = 2.0 * F - F * F;
const E_PRIME2: f64 = E2 / (1.0 - E2);
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

pub const WGS84_EPSG: u32 = 4326;

/// A coordinate reference system the monitor can transform between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Longitude / latitude in degrees (EPSG:4326, x = lon).
    Geographic,
    /// Universal Transverse Mercator, metres.
    Utm { zone: u8, north: bool },
}

impl Projection {
    /// Resolve an EPSG code. Returns `None` for systems other than WGS84 and UTM.
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            WGS84_EPSG => Some(Projection::Geographic),
            32601..=32660 => Some(Projection::Utm {
                zone: (epsg - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Some(Projection::Utm {
                zone: (epsg - 32700) as u8,
                north: false,
            }),
            _ => None,
        }
    }

    pub fn epsg(&self) -> u32 {
        match *self {
            Projection::Geographic => WGS84_EPSG,
            Projection::Utm { zone, north: true } => 32600 + zone as u32,
            Projection::Utm { zone, north: false } => 32700 + zone as u32,
        }
    }

    /// The UTM zone containing a WGS84 point.
    pub fn utm_for(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(MonitorError::Config(format!(
                "point ({lon}, {lat}) is not finite"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) || !(-80.0..=84.0).contains(&lat) {
            return Err(MonitorError::Config(format!(
                "point ({lon}, {lat}) is outside the UTM domain"
            )));
        }
        let zone = (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8;
        Ok(Projection::Utm {
            zone,
            north: lat >= 0.0,
        })
    }

    /// Transform a point from `self` into `target`.
    pub fn transform_to(&self, target: &Projection, x: f64, y: f64) -> (f64, f64) {
        if self == target {
            return (x, y);
        }
        let (lon, lat) = match *self {
            Projection::Geographic => (x, y),
            Projection::Utm { zone, north } => utm_to_wgs84(x, y, zone, north),
        };
        match *target {
            Projection::Geographic => (lon, lat),
            Projection::Utm { zone, north } => wgs84_to_utm(lon, lat, zone, north),
        }
    }
}

fn central_meridian(zone: u8) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// WGS84 (lon, lat) in degrees to UTM (easting, northing) in metres.
pub fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u8, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);
    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    let easting = K0
        * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    if north {
        (easting, northing)
    } else {
        (easting, northing + FALSE_NORTHING_SOUTH)
    }
}

/// UTM (easting, northing) in metres to WGS84 (lon, lat) in degrees.
pub fn utm_to_wgs84(easting: f64, northing: f64, zone: u8, north: bool) -> (f64, f64) {
    let x = easting - FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    let e4 = E2 * E2;
    let e6 = e4 * E2;
    let m = y / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    // Footpoint latitude (Snyder eq. 3-26)
    let sqrt_1_e2 = (1.0 - E2).sqrt();
    let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();
    let c1 = E_PRIME2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let denom = 1.0 - E2 * sin_phi1 * sin_phi1;
    let n1 = A / denom.sqrt();
    let r1 = A * (1.0 - E2) / denom.powf(1.5);
    let d = x / (n1 * K0);
    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    // Snyder eqs. 8-17, 8-18
    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);
    let lon = central_meridian(zone)
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos_phi1;

    (lon.to_degrees(), lat.to_degrees())
}

/// Meridional arc from the equator to `lat` (radians), Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
        let diff = (a - b).abs();
        assert!(diff < tol, "{msg}: expected {b}, got {a}, diff {diff}");
    }

    #[test]
    fn epsg_round_trip() {
        for epsg in [4326, 32601, 32649, 32660, 32701, 32721, 32760] {
            let proj = Projection::from_epsg(epsg).unwrap();
            assert_eq!(proj.epsg(), epsg);
        }
        assert_eq!(Projection::from_epsg(3857), None);
        assert_eq!(Projection::from_epsg(32600), None);
        assert_eq!(Projection::from_epsg(32661), None);
    }

    #[test]
    fn site_point_falls_in_zone_49_north() {
        let proj = Projection::utm_for(109.685119, 40.635497).unwrap();
        assert_eq!(proj, Projection::Utm { zone: 49, north: true });
        assert_eq!(proj.epsg(), 32649);
    }

    #[test]
    fn southern_point_uses_south_zone() {
        let proj = Projection::utm_for(-58.3816, -34.6037).unwrap();
        assert_eq!(proj.epsg(), 32721);
    }

    #[test]
    fn out_of_domain_points_are_config_errors() {
        assert!(matches!(
            Projection::utm_for(10.0, 85.0),
            Err(MonitorError::Config(_))
        ));
        assert!(matches!(
            Projection::utm_for(f64::NAN, 0.0),
            Err(MonitorError::Config(_))
        ));
        assert!(matches!(
            Projection::utm_for(181.0, 0.0),
            Err(MonitorError::Config(_))
        ));
    }

    // Reference from pyproj: Transformer.from_crs(4326, 32630, always_xy=True)
    #[test]
    fn madrid_forward() {
        let (e, n) = wgs84_to_utm(-3.7037, 40.4168, 30, true);
        assert_close(e, 440_298.94, 1.0, "easting");
        assert_close(n, 4_474_257.31, 1.0, "northing");
    }

    #[test]
    fn madrid_inverse() {
        let (lon, lat) = utm_to_wgs84(440_298.94, 4_474_257.31, 30, true);
        assert_close(lon, -3.7037, 2e-5, "lon");
        assert_close(lat, 40.4168, 2e-5, "lat");
    }

    #[test]
    fn forward_inverse_round_trip_south() {
        let (e, n) = wgs84_to_utm(-58.3816, -34.6037, 21, false);
        let (lon, lat) = utm_to_wgs84(e, n, 21, false);
        assert_close(lon, -58.3816, 1e-6, "lon");
        assert_close(lat, -34.6037, 1e-6, "lat");
    }

    #[test]
    fn transform_between_projections() {
        let utm = Projection::Utm { zone: 49, north: true };
        let (e, n) = Projection::Geographic.transform_to(&utm, 109.685119, 40.635497);
        let (lon, lat) = utm.transform_to(&Projection::Geographic, e, n);
        assert_close(lon, 109.685119, 1e-6, "lon");
        assert_close(lat, 40.635497, 1e-6, "lat");
        assert_eq!(utm.transform_to(&utm, e, n), (e, n));
    }
}
