// src/processing/mask.rs
use rayon::prelude::*;

use crate::raster::BandGrid;
use crate::region::ring_contains;

/// Set to NaN every pixel whose centre lies outside `ring`, every zero
/// reflectance pixel and every pixel equal to `nodata`.
///
/// `ring` must be expressed in the grid's own coordinate system.
pub fn clip_to_ring(grid: &mut BandGrid, ring: &[(f64, f64)], nodata: Option<f64>) {
    let width = grid.width();
    let transform = *grid.transform();
    let nodata = nodata.map(|v| v as f32);

    grid.data_mut()
        .par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(row, pixels)| {
            for (col, value) in pixels.iter_mut().enumerate() {
                let (x, y) = transform.apply(col as f64 + 0.5, row as f64 + 0.5);
                let is_nodata = nodata.map_or(false, |nd| *value == nd);
                if *value == 0.0 || is_nodata || !ring_contains(ring, x, y) {
                    *value = f32::NAN;
                }
            }
        });
}
