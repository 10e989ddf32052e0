// src/processing/mod.rs
pub mod align;
pub mod indices;
pub mod mask;
pub mod stats;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::raster::BandStack;
use indices::IndexCalculator;

pub use align::{align_bands, align_to};
pub use indices::{safe_ratio, BSI, NDI};
pub use stats::nan_mean;

/// Area-mean indices of one scene. A metric is `None` when no pixel was valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub ndvi: Option<f64>,
    pub ndmi: Option<f64>,
    pub bsi: Option<f64>,
    pub image_date: NaiveDate,
    pub scene_id: String,
}

/// Per-pixel values of one index, named after its calculator.
pub struct IndexRaster {
    pub name: String,
    pub values: Vec<f32>,
}

impl IndexRaster {
    fn compute(calculator: &dyn IndexCalculator, stack: &BandStack) -> Self {
        let missing: Vec<_> = calculator
            .required_bands()
            .iter()
            .filter(|band| stack.get(**band).is_none())
            .collect();
        if !missing.is_empty() {
            warn!(index = calculator.name(), ?missing, "stack lacks bands, index undefined");
        }
        Self {
            name: calculator.name().to_string(),
            values: calculator.calculate(stack),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        nan_mean(&self.values)
    }
}

/// Per-pixel index rasters of one scene, kept for export.
pub struct IndexRasters {
    pub ndvi: IndexRaster,
    pub ndmi: IndexRaster,
    pub bsi: IndexRaster,
}

impl IndexRasters {
    pub fn iter(&self) -> impl Iterator<Item = &IndexRaster> {
        [&self.ndvi, &self.ndmi, &self.bsi].into_iter()
    }
}

/// Scale the stack to reflectance, compute the three indices per pixel and
/// reduce each to its mean over valid pixels.
pub fn compute_metrics(
    stack: &BandStack,
    scale_factor: f32,
    image_date: NaiveDate,
    scene_id: &str,
) -> (MetricSet, IndexRasters) {
    let reflectance = stack.scaled(scale_factor);

    let rasters = IndexRasters {
        ndvi: IndexRaster::compute(&indices::ndvi(), &reflectance),
        ndmi: IndexRaster::compute(&indices::ndmi(), &reflectance),
        bsi: IndexRaster::compute(&indices::bsi(), &reflectance),
    };

    let metrics = MetricSet {
        ndvi: rasters.ndvi.mean(),
        ndmi: rasters.ndmi.mean(),
        bsi: rasters.bsi.mean(),
        image_date,
        scene_id: scene_id.to_string(),
    };

    (metrics, rasters)
}
