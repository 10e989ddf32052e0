// src/processing/indices/ndi.rs
use rayon::prelude::*;

use super::{safe_ratio, IndexCalculator};
use crate::raster::{Band, BandStack};

/// Normalized Difference Index (NDI) calculator: (A - B) / (A + B)
pub struct NDI {
    bands: [Band; 2],
    name: String,
}

impl NDI {
    pub fn new(band_a: Band, band_b: Band, name: Option<String>) -> Self {
        Self {
            bands: [band_a, band_b],
            name: name.unwrap_or_else(|| "ndi".to_string()),
        }
    }
}

impl IndexCalculator for NDI {
    fn calculate(&self, bands: &BandStack) -> Vec<f32> {
        let spec = bands.spec();
        let (a, b) = match (bands.get(self.bands[0]), bands.get(self.bands[1])) {
            (Some(a), Some(b)) => (a.data(), b.data()),
            // A stack without the inputs has no defined pixels
            _ => return vec![f32::NAN; spec.width * spec.height],
        };

        let mut result = vec![0.0f32; a.len()];
        result.par_iter_mut().enumerate().for_each(|(i, out)| {
            let (a_val, b_val) = (a[i], b[i]);
            *out = safe_ratio(a_val - b_val, a_val + b_val);
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
