// src/processing/align.rs
use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::projection::Projection;
use crate::raster::{Band, BandGrid, BandStack, GridSpec};

/// Pick the coarsest grid as the common reference.
pub fn reference_band(grids: &HashMap<Band, BandGrid>) -> Option<Band> {
    Band::REFERENCE_PREFERENCE
        .iter()
        .filter_map(|band| grids.get(band).map(|grid| (*band, grid.transform().pixel_area())))
        .fold(None, |best: Option<(Band, f64)>, (band, area)| match best {
            Some((_, best_area)) if best_area >= area => best,
            _ => Some((band, area)),
        })
        .map(|(band, _)| band)
}

/// Resample every band onto the reference band's grid.
pub fn align_bands(mut grids: HashMap<Band, BandGrid>) -> Result<BandStack> {
    let reference = reference_band(&grids)
        .ok_or_else(|| MonitorError::GridMismatch("no bands to align".to_string()))?;
    let target = *grids[&reference].spec();
    debug!(%reference, width = target.width, height = target.height, "reference grid");

    let aligned = grids
        .drain()
        .map(|(band, grid)| Ok((band, align_to(grid, &target)?)))
        .collect::<Result<HashMap<_, _>>>()?;

    BandStack::new(aligned)
}

/// Resample `source` onto `target` with bilinear interpolation.
///
/// A grid already on `target` is returned untouched. Source samples that are
/// NaN or exactly 0 count as nodata; destination pixels without any valid
/// neighbour become NaN.
pub fn align_to(source: BandGrid, target: &GridSpec) -> Result<BandGrid> {
    if source.same_grid(target) {
        return Ok(source);
    }

    let src_proj = Projection::from_epsg(source.epsg())
        .ok_or(MonitorError::UnsupportedCrs(source.epsg()))?;
    let dst_proj =
        Projection::from_epsg(target.epsg).ok_or(MonitorError::UnsupportedCrs(target.epsg))?;

    debug!(
        from = ?(source.width(), source.height()),
        to = ?(target.width, target.height),
        "resampling band"
    );

    let mut out = BandGrid::filled(*target, f32::NAN);
    let width = target.width;
    let dst_transform = target.transform;

    out.data_mut()
        .par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(row, pixels)| {
            for (col, value) in pixels.iter_mut().enumerate() {
                let (x, y) = dst_transform.apply(col as f64 + 0.5, row as f64 + 0.5);
                let (sx, sy) = dst_proj.transform_to(&src_proj, x, y);
                if let Some((u, v)) = source.transform().invert(sx, sy) {
                    *value = sample_bilinear(&source, u, v);
                }
            }
        });

    Ok(out)
}

fn is_valid(value: f32) -> bool {
    !value.is_nan() && value != 0.0
}

/// Bilinear sample at fractional pixel position `(u, v)` (pixel edges at integers).
fn sample_bilinear(grid: &BandGrid, u: f64, v: f64) -> f32 {
    let (w, h) = (grid.width() as f64, grid.height() as f64);
    if !(0.0..=w).contains(&u) || !(0.0..=h).contains(&v) {
        return f32::NAN;
    }

    let x = u - 0.5;
    let y = v - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let neighbours = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1.0, y0, fx * (1.0 - fy)),
        (x0, y0 + 1.0, (1.0 - fx) * fy),
        (x0 + 1.0, y0 + 1.0, fx * fy),
    ];

    let mut sum = 0.0f64;
    let mut weight = 0.0f64;
    for (cx, cy, wgt) in neighbours {
        if cx < 0.0 || cy < 0.0 || wgt <= 0.0 {
            continue;
        }
        if let Some(value) = grid.get(cx as usize, cy as usize) {
            if is_valid(value) {
                sum += value as f64 * wgt;
                weight += wgt;
            }
        }
    }

    if weight > 0.0 {
        (sum / weight) as f32
    } else {
        f32::NAN
    }
}
