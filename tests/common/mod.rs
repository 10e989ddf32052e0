// tests/common/mod.rs
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use raster_monitor::catalog::{Catalog, Scene, SearchRequest};
use raster_monitor::config::BandKeys;
use raster_monitor::io::reader::BandSource;
use raster_monitor::raster::{Band, BandGrid, BandStack, GeoTransform, GridSpec};
use raster_monitor::region::Region;
use raster_monitor::{MonitorError, Result};

pub const UTM_49N: u32 = 32649;
pub const ORIGIN: (f64, f64) = (385_000.0, 4_502_000.0);

/// A north-up grid at `pixel` metres covering 40 m x 40 m from ORIGIN.
pub fn spec(pixel: f64) -> GridSpec {
    let n = (40.0 / pixel) as usize;
    GridSpec {
        width: n,
        height: n,
        transform: GeoTransform::north_up(ORIGIN.0, ORIGIN.1, pixel, pixel),
        epsg: UTM_49N,
    }
}

pub fn uniform(spec: GridSpec, value: f32) -> BandGrid {
    BandGrid::filled(spec, value)
}

pub fn native_pixel(band: Band) -> f64 {
    match band {
        Band::Blue | Band::Red | Band::Nir => 10.0,
        Band::NarrowNir | Band::Swir => 20.0,
    }
}

/// Uniform raw reflectance values per band.
#[derive(Clone, Copy)]
pub struct Reflectance {
    pub blue: f32,
    pub red: f32,
    pub nir: f32,
    pub narrow_nir: f32,
    pub swir: f32,
}

impl Reflectance {
    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::Blue => self.blue,
            Band::Red => self.red,
            Band::Nir => self.nir,
            Band::NarrowNir => self.narrow_nir,
            Band::Swir => self.swir,
        }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            blue: self.blue * factor,
            red: self.red * factor,
            nir: self.nir * factor,
            narrow_nir: self.narrow_nir * factor,
            swir: self.swir * factor,
        }
    }
}

pub const SAMPLE: Reflectance = Reflectance {
    blue: 0.05,
    red: 0.1,
    nir: 0.3,
    narrow_nir: 0.28,
    swir: 0.2,
};

/// Stack already on one 10 m grid.
pub fn uniform_stack(values: Reflectance) -> BandStack {
    let bands = Band::ALL
        .iter()
        .map(|band| (*band, uniform(spec(10.0), values.get(*band))))
        .collect();
    BandStack::new(bands).unwrap()
}

pub fn scene(id: &str, datetime: &str, cloud_cover: f64) -> Scene {
    let keys = BandKeys::default();
    Scene {
        id: id.to_string(),
        datetime: datetime.parse::<DateTime<Utc>>().unwrap(),
        cloud_cover,
        assets: Band::ALL
            .iter()
            .map(|band| {
                let key = keys.key(*band).to_string();
                let href = format!("mem://{id}/{key}");
                (key, href)
            })
            .collect(),
    }
}

/// Catalog answering every search with a fixed scene list; months listed in
/// `failing` return a catalog error instead.
#[derive(Default)]
pub struct FakeCatalog {
    pub scenes: Vec<Scene>,
    pub failing: Vec<String>,
    pub requests: RefCell<Vec<String>>,
}

impl Catalog for FakeCatalog {
    fn search(&self, request: &SearchRequest) -> Result<Vec<Scene>> {
        self.requests.borrow_mut().push(request.datetime.clone());
        if self.failing.iter().any(|m| request.datetime.starts_with(m.as_str())) {
            return Err(MonitorError::Catalog("HTTP 503: unavailable".to_string()));
        }
        Ok(self.scenes.clone())
    }
}

/// In-memory band rasters keyed by href.
#[derive(Default)]
pub struct FakeBands {
    pub grids: HashMap<String, BandGrid>,
}

impl FakeBands {
    /// Register native-resolution uniform bands for `scene_id`.
    pub fn add_scene(&mut self, scene_id: &str, values: Reflectance) {
        let keys = BandKeys::default();
        for band in Band::ALL {
            let href = format!("mem://{scene_id}/{}", keys.key(band));
            let grid = uniform(spec(native_pixel(band)), values.get(band));
            self.grids.insert(href, grid);
        }
    }
}

impl BandSource for FakeBands {
    fn read_clipped(&self, href: &str, _region: &Region) -> Result<BandGrid> {
        self.grids
            .get(href)
            .cloned()
            .ok_or_else(|| MonitorError::RegionOutside(href.to_string()))
    }
}

pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "expected {expected}, got {actual}"
    );
}
