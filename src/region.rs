// src/region.rs
use serde_json::json;

use crate::error::{MonitorError, Result};
use crate::projection::Projection;

/// Vertices per circle, matching a 16-segment quarter circle.
pub const CIRCLE_SEGMENTS: usize = 64;

/// Fixed-radius analysis polygon around the site, in WGS84 lon/lat.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    center: (f64, f64),
    radius_m: f64,
    ring: Vec<(f64, f64)>,
}

impl Region {
    /// Buffer `(lon, lat)` by `radius_m` metres in the point's UTM zone and
    /// bring the resulting circle back to geographic coordinates.
    pub fn around(lon: f64, lat: f64, radius_m: f64) -> Result<Self> {
        Self::with_segments(lon, lat, radius_m, CIRCLE_SEGMENTS)
    }

    pub fn with_segments(lon: f64, lat: f64, radius_m: f64, segments: usize) -> Result<Self> {
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(MonitorError::Config(format!(
                "buffer radius must be positive, got {radius_m}"
            )));
        }
        if segments < 3 {
            return Err(MonitorError::Config(format!(
                "a buffer needs at least 3 segments, got {segments}"
            )));
        }

        let utm = Projection::utm_for(lon, lat)?;
        let (cx, cy) = Projection::Geographic.transform_to(&utm, lon, lat);

        let mut ring: Vec<(f64, f64)> = (0..segments)
            .map(|i| {
                let theta = std::f64::consts::TAU * i as f64 / segments as f64;
                let x = cx + radius_m * theta.cos();
                let y = cy + radius_m * theta.sin();
                utm.transform_to(&Projection::Geographic, x, y)
            })
            .collect();
        ring.push(ring[0]);

        Ok(Self {
            center: (lon, lat),
            radius_m,
            ring,
        })
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Closed exterior ring, first vertex repeated at the end.
    pub fn ring(&self) -> &[(f64, f64)] {
        &self.ring
    }

    /// The ring expressed in another coordinate system.
    pub fn ring_in(&self, target: &Projection) -> Vec<(f64, f64)> {
        self.ring
            .iter()
            .map(|&(lon, lat)| Projection::Geographic.transform_to(target, lon, lat))
            .collect()
    }

    /// `[west, south, east, north]` in degrees.
    pub fn bbox(&self) -> [f64; 4] {
        bounds(&self.ring)
    }

    /// GeoJSON Polygon geometry for catalog queries.
    pub fn to_geojson(&self) -> serde_json::Value {
        let coords: Vec<[f64; 2]> = self.ring.iter().map(|&(x, y)| [x, y]).collect();
        json!({
            "type": "Polygon",
            "coordinates": [coords],
        })
    }
}

/// `[min_x, min_y, max_x, max_y]` of a set of points.
pub fn bounds(points: &[(f64, f64)]) -> [f64; 4] {
    points.iter().fold(
        [f64::MAX, f64::MAX, f64::MIN, f64::MIN],
        |[min_x, min_y, max_x, max_y], &(x, y)| {
            [min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)]
        },
    )
}

/// Even-odd point-in-polygon test against a closed ring.
pub fn ring_contains(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
