// src/processing/indices/bsi.rs
use rayon::prelude::*;

use super::{safe_ratio, IndexCalculator};
use crate::raster::{Band, BandStack};

/// Bare Soil Index (BSI) calculator
/// BSI = ((SWIR + RED) - (NIR + BLUE)) / ((SWIR + RED) + (NIR + BLUE))
pub struct BSI {
    bands: [Band; 4],
    name: String,
}

impl BSI {
    pub fn new(swir: Band, red: Band, nir: Band, blue: Band, name: Option<String>) -> Self {
        Self {
            bands: [swir, red, nir, blue],
            name: name.unwrap_or_else(|| "bsi".to_string()),
        }
    }
}

impl IndexCalculator for BSI {
    fn calculate(&self, bands: &BandStack) -> Vec<f32> {
        let spec = bands.spec();
        let inputs: Option<Vec<&[f32]>> = self
            .bands
            .iter()
            .map(|band| bands.get(*band).map(|grid| grid.data()))
            .collect();
        let Some(inputs) = inputs else {
            return vec![f32::NAN; spec.width * spec.height];
        };
        let (swir, red, nir, blue) = (inputs[0], inputs[1], inputs[2], inputs[3]);

        let mut result = vec![0.0f32; swir.len()];
        result.par_iter_mut().enumerate().for_each(|(i, out)| {
            let soil = swir[i] + red[i];
            let vegetation = nir[i] + blue[i];
            *out = safe_ratio(soil - vegetation, soil + vegetation);
        });
        result
    }

    fn required_bands(&self) -> &[Band] {
        &self.bands
    }

    fn name(&self) -> &str {
        &self.name
    }
}
