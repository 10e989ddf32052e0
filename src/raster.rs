// src/raster.rs
use std::collections::HashMap;
use std::fmt;

use crate::error::{MonitorError, Result};

/// Affine pixel-to-map transform in GDAL coefficient order:
/// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform without rotation.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, -pixel_height.abs()])
    }

    /// Map coordinates of a fractional pixel position.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let t = &self.0;
        (
            t[0] + col * t[1] + row * t[2],
            t[3] + col * t[4] + row * t[5],
        )
    }

    /// Fractional pixel position of a map coordinate. `None` for a singular transform.
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let t = &self.0;
        let det = t[1] * t[5] - t[2] * t[4];
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let dx = x - t[0];
        let dy = y - t[3];
        Some(((dx * t[5] - dy * t[2]) / det, (dy * t[1] - dx * t[4]) / det))
    }

    /// Transform of a sub-window starting at pixel `(col, row)`.
    pub fn offset(&self, col: usize, row: usize) -> Self {
        let (x, y) = self.apply(col as f64, row as f64);
        let mut t = self.0;
        t[0] = x;
        t[3] = y;
        Self(t)
    }

    /// Ground area covered by one pixel.
    pub fn pixel_area(&self) -> f64 {
        let t = &self.0;
        (t[1] * t[5] - t[2] * t[4]).abs()
    }
}

/// Shape, placement and CRS of a pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub epsg: u32,
}

/// One band's samples on a georeferenced grid. NaN marks nodata.
#[derive(Clone, PartialEq)]
pub struct BandGrid {
    data: Vec<f32>,
    spec: GridSpec,
}

impl BandGrid {
    pub fn new(data: Vec<f32>, spec: GridSpec) -> Result<Self> {
        if data.len() != spec.width * spec.height {
            return Err(MonitorError::GridMismatch(format!(
                "{} samples for a {}x{} grid",
                data.len(),
                spec.width,
                spec.height
            )));
        }
        Ok(Self { data, spec })
    }

    pub fn filled(spec: GridSpec, value: f32) -> Self {
        Self {
            data: vec![value; spec.width * spec.height],
            spec,
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn width(&self) -> usize {
        self.spec.width
    }

    pub fn height(&self) -> usize {
        self.spec.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.spec.transform
    }

    pub fn epsg(&self) -> u32 {
        self.spec.epsg
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col < self.spec.width && row < self.spec.height {
            Some(self.data[row * self.spec.width + col])
        } else {
            None
        }
    }

    /// True when both grids share shape, transform and CRS.
    pub fn same_grid(&self, other: &GridSpec) -> bool {
        self.spec == *other
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

impl fmt::Debug for BandGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BandGrid")
            .field("spec", &self.spec)
            .field("valid", &self.valid_count())
            .finish()
    }
}

/// Spectral bands the indices are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    Blue,
    Red,
    Nir,
    NarrowNir,
    Swir,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Blue, Band::Red, Band::Nir, Band::NarrowNir, Band::Swir];

    /// Preference order when two candidate reference grids are equally coarse.
    pub const REFERENCE_PREFERENCE: [Band; 5] =
        [Band::Swir, Band::NarrowNir, Band::Nir, Band::Red, Band::Blue];

    pub fn name(&self) -> &'static str {
        match self {
            Band::Blue => "blue",
            Band::Red => "red",
            Band::Nir => "nir",
            Band::NarrowNir => "narrow_nir",
            Band::Swir => "swir",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Band grids of one scene, all on the same pixel grid.
#[derive(Debug, Clone)]
pub struct BandStack {
    spec: GridSpec,
    bands: HashMap<Band, BandGrid>,
}

impl BandStack {
    pub fn new(bands: HashMap<Band, BandGrid>) -> Result<Self> {
        let spec = match bands.values().next() {
            Some(grid) => *grid.spec(),
            None => return Err(MonitorError::GridMismatch("empty band stack".to_string())),
        };
        if let Some((band, grid)) = bands.iter().find(|(_, g)| !g.same_grid(&spec)) {
            return Err(MonitorError::GridMismatch(format!(
                "{band} is on {:?}, expected {:?}",
                grid.spec(),
                spec
            )));
        }
        Ok(Self { spec, bands })
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn get(&self, band: Band) -> Option<&BandGrid> {
        self.bands.get(&band)
    }

    pub fn bands(&self) -> impl Iterator<Item = (&Band, &BandGrid)> {
        self.bands.iter()
    }

    /// Divide every sample by `factor`, turning encoded integers into reflectance.
    pub fn scaled(&self, factor: f32) -> Self {
        let bands = self
            .bands
            .iter()
            .map(|(band, grid)| {
                let mut grid = grid.clone();
                for value in grid.data_mut() {
                    *value /= factor;
                }
                (*band, grid)
            })
            .collect();
        Self {
            spec: self.spec,
            bands,
        }
    }
}
