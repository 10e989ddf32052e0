// src/processing/indices/mod.rs
pub mod bsi;
pub mod ndi;

pub use bsi::BSI;
pub use ndi::NDI;

use crate::raster::{Band, BandStack};

/// Trait for spectral index calculators
pub trait IndexCalculator: Send + Sync {
    /// Per-pixel index values over the stack's grid, NaN where undefined
    fn calculate(&self, bands: &BandStack) -> Vec<f32>;

    /// Bands the index reads
    fn required_bands(&self) -> &[Band];

    /// Return the name of the index
    fn name(&self) -> &str;
}

/// Division that never yields infinity: a zero or NaN operand in the
/// denominator, a NaN numerator, or a non-finite quotient all give NaN.
#[inline]
pub fn safe_ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 || numerator.is_nan() || denominator.is_nan() {
        return f32::NAN;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        f32::NAN
    }
}

/// NDVI: (NIR - RED) / (NIR + RED)
pub fn ndvi() -> NDI {
    NDI::new(Band::Nir, Band::Red, Some("ndvi".to_string()))
}

/// NDMI: (NARROW_NIR - SWIR) / (NARROW_NIR + SWIR)
pub fn ndmi() -> NDI {
    NDI::new(Band::NarrowNir, Band::Swir, Some("ndmi".to_string()))
}

/// BSI: ((SWIR + RED) - (NIR + BLUE)) / ((SWIR + RED) + (NIR + BLUE))
pub fn bsi() -> BSI {
    BSI::new(Band::Swir, Band::Red, Band::Nir, Band::Blue, None)
}
