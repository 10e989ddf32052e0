// tests/unit_tests.rs
mod common;

use std::collections::HashMap;

use chrono::NaiveDate;
use raster_monitor::processing::indices::{self, IndexCalculator};
use raster_monitor::processing::{compute_metrics, nan_mean, safe_ratio, BSI, NDI};
use raster_monitor::raster::{Band, BandGrid, BandStack, GridSpec};

use common::{assert_close, spec, uniform_stack, Reflectance, SAMPLE};

/// Build a 2x2 stack with per-pixel values for the given bands; the other
/// bands are filled with 1.0.
fn stack_2x2(values: &[(Band, [f32; 4])]) -> BandStack {
    let grid = GridSpec {
        width: 2,
        height: 2,
        ..spec(20.0)
    };
    let mut bands: HashMap<Band, BandGrid> = Band::ALL
        .iter()
        .map(|band| (*band, BandGrid::filled(grid, 1.0)))
        .collect();
    for (band, data) in values {
        bands.insert(*band, BandGrid::new(data.to_vec(), grid).unwrap());
    }
    BandStack::new(bands).unwrap()
}

/// Test NDI calculation with known values
#[test]
fn test_ndi_calculation() {
    let test_cases = [
        // NIR, RED, expected NDVI
        (0.5f32, 0.25f32, 0.33333f32),
        (0.3, 0.3, 0.0),
        (0.1, 0.05, 0.33333),
        (0.0, 0.0, f32::NAN), // divide by zero
    ];

    let nir: [f32; 4] = test_cases.map(|(nir, _, _)| nir);
    let red: [f32; 4] = test_cases.map(|(_, red, _)| red);
    let stack = stack_2x2(&[(Band::Nir, nir), (Band::Red, red)]);

    let result = NDI::new(Band::Nir, Band::Red, None).calculate(&stack);

    for (i, (_, _, expected)) in test_cases.iter().enumerate() {
        if expected.is_nan() {
            assert!(result[i].is_nan(), "pixel {i}: expected NaN, got {}", result[i]);
        } else {
            assert!(
                (result[i] - expected).abs() < 0.0001,
                "pixel {i}: expected {expected}, got {}",
                result[i]
            );
        }
    }
}

#[test]
fn test_ndi_default_name_and_bands() {
    let ndi = NDI::new(Band::NarrowNir, Band::Swir, None);
    assert_eq!(ndi.name(), "ndi");
    assert_eq!(ndi.required_bands(), &[Band::NarrowNir, Band::Swir]);

    assert_eq!(indices::ndvi().name(), "ndvi");
    assert_eq!(indices::ndmi().name(), "ndmi");
    assert_eq!(indices::bsi().name(), "bsi");
}

#[test]
fn test_bsi_calculation() {
    // (SWIR + RED) - (NIR + BLUE) over the sum
    let stack = stack_2x2(&[
        (Band::Swir, [0.2, 0.4, 0.1, 0.0]),
        (Band::Red, [0.1, 0.2, 0.1, 0.0]),
        (Band::Nir, [0.3, 0.1, 0.1, 0.0]),
        (Band::Blue, [0.05, 0.1, 0.1, 0.0]),
    ]);

    let result = BSI::new(Band::Swir, Band::Red, Band::Nir, Band::Blue, None).calculate(&stack);

    assert!((result[0] - (-0.05 / 0.65)).abs() < 1e-5);
    assert!((result[1] - (0.4 / 0.8)).abs() < 1e-5);
    assert!(result[2].abs() < 1e-6);
    assert!(result[3].is_nan());
}

#[test]
fn test_index_nan_propagates() {
    let stack = stack_2x2(&[
        (Band::Nir, [0.3, f32::NAN, 0.3, 0.3]),
        (Band::Red, [0.1, 0.1, f32::NAN, 0.1]),
    ]);

    let result = indices::ndvi().calculate(&stack);

    assert!((result[0] - 0.5).abs() < 1e-6);
    assert!(result[1].is_nan());
    assert!(result[2].is_nan());
    assert!((result[3] - 0.5).abs() < 1e-6);
}

#[test]
fn test_safe_ratio() {
    assert_eq!(safe_ratio(1.0, 2.0), 0.5);
    assert_eq!(safe_ratio(-1.0, 4.0), -0.25);
    assert!(safe_ratio(1.0, 0.0).is_nan());
    assert!(safe_ratio(0.0, 0.0).is_nan());
    assert!(safe_ratio(f32::NAN, 1.0).is_nan());
    assert!(safe_ratio(1.0, f32::NAN).is_nan());
    assert!(safe_ratio(f32::MAX, f32::MIN_POSITIVE).is_nan());
}

#[test]
fn test_nan_mean() {
    assert_eq!(nan_mean(&[]), None);
    assert_eq!(nan_mean(&[f32::NAN, f32::NAN]), None);
    assert_eq!(nan_mean(&[1.0, f32::NAN, 3.0]), Some(2.0));
    assert_eq!(nan_mean(&[f32::INFINITY, 0.5]), Some(0.5));
}

#[test]
fn test_compute_metrics_uniform_reflectance() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let (metrics, rasters) = compute_metrics(&uniform_stack(SAMPLE), 1.0, date, "S2A_TEST");

    assert_close(metrics.ndvi.unwrap(), 0.5, 1e-5);
    assert_close(metrics.ndmi.unwrap(), 0.08 / 0.48, 1e-5);
    assert_close(metrics.bsi.unwrap(), -0.05 / 0.65, 1e-5);
    assert_eq!(metrics.image_date, date);
    assert_eq!(metrics.scene_id, "S2A_TEST");
    assert_eq!(rasters.ndvi.values.len(), 16);
    let names: Vec<&str> = rasters.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["ndvi", "ndmi", "bsi"]);
}

#[test]
fn test_compute_metrics_applies_scale_factor() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let raw = SAMPLE.scaled(10_000.0);

    let (scaled, _) = compute_metrics(&uniform_stack(raw), 10_000.0, date, "raw");
    let (direct, _) = compute_metrics(&uniform_stack(SAMPLE), 1.0, date, "raw");

    assert_close(scaled.ndvi.unwrap(), direct.ndvi.unwrap(), 1e-5);
    assert_close(scaled.ndmi.unwrap(), direct.ndmi.unwrap(), 1e-5);
    assert_close(scaled.bsi.unwrap(), direct.bsi.unwrap(), 1e-5);
}

#[test]
fn test_compute_metrics_ignores_nodata_padding() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let (full, _) = compute_metrics(&uniform_stack(SAMPLE), 1.0, date, "s");

    // Same scene with half the pixels masked out in every band
    let padded: HashMap<Band, BandGrid> = uniform_stack(SAMPLE)
        .bands()
        .map(|(band, grid)| {
            let mut grid = grid.clone();
            for value in grid.data_mut().iter_mut().step_by(2) {
                *value = f32::NAN;
            }
            (*band, grid)
        })
        .collect();
    let (masked, _) = compute_metrics(&BandStack::new(padded).unwrap(), 1.0, date, "s");

    assert_close(masked.ndvi.unwrap(), full.ndvi.unwrap(), 1e-9);
    assert_close(masked.ndmi.unwrap(), full.ndmi.unwrap(), 1e-9);
    assert_close(masked.bsi.unwrap(), full.bsi.unwrap(), 1e-9);
}

#[test]
fn test_compute_metrics_without_required_band() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let bands: HashMap<Band, BandGrid> = uniform_stack(SAMPLE)
        .bands()
        .filter(|(band, _)| **band != Band::Swir)
        .map(|(band, grid)| (*band, grid.clone()))
        .collect();

    let (metrics, rasters) = compute_metrics(&BandStack::new(bands).unwrap(), 1.0, date, "s");

    assert_close(metrics.ndvi.unwrap(), 0.5, 1e-5);
    assert_eq!(metrics.ndmi, None);
    assert_eq!(metrics.bsi, None);
    assert!(rasters.bsi.values.iter().all(|v| v.is_nan()));
}

#[test]
fn test_compute_metrics_all_invalid() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let zeros = Reflectance {
        blue: 0.0,
        red: 0.0,
        nir: 0.0,
        narrow_nir: 0.0,
        swir: 0.0,
    };
    let (metrics, _) = compute_metrics(&uniform_stack(zeros), 1.0, date, "empty");

    assert_eq!(metrics.ndvi, None);
    assert_eq!(metrics.ndmi, None);
    assert_eq!(metrics.bsi, None);
}

#[test]
fn test_fixed_point_conversion() {
    use raster_monitor::utils::fixed_point::{to_fixed_point, NODATA_INT};

    let values = [0.5, -0.0769, 1.0, -1.5, f32::NAN];
    let fixed = to_fixed_point(&values, 10_000);

    assert_eq!(fixed, vec![5000, -769, 9999, -9999, NODATA_INT]);
}
