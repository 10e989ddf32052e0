// src/io/writer.rs
use std::path::Path;

use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::spatial_ref::SpatialRef;
use gdal::{DriverManager, Metadata};

use crate::error::Result;
use crate::raster::GridSpec;
use crate::utils::fixed_point::{to_fixed_point, NODATA_FLOAT, NODATA_INT};

/// Write one index raster as a tiled, DEFLATE-compressed GeoTIFF.
///
/// With `use_fixed_point` the values are stored as int16 multiplied by
/// `scale_factor`, with SCALE/OFFSET metadata for readers.
pub fn write_index_raster(
    values: &[f32],
    spec: &GridSpec,
    name: &str,
    output_path: &Path,
    use_fixed_point: bool,
    scale_factor: i32,
) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (width, height) = (spec.width, spec.height);
    let srs = SpatialRef::from_epsg(spec.epsg)?;

    let creation_options = RasterCreationOptions::from_iter([
        "COMPRESS=DEFLATE",
        "TILED=YES",
        "NUM_THREADS=ALL_CPUS",
    ]);

    if use_fixed_point {
        let mut out_ds = driver.create_with_band_type_with_options::<i16, _>(
            output_path,
            width,
            height,
            1,
            &creation_options,
        )?;
        out_ds.set_spatial_ref(&srs)?;
        out_ds.set_geo_transform(&spec.transform.0)?;

        let mut band = out_ds.rasterband(1)?;
        band.set_no_data_value(Some(NODATA_INT as f64))?;
        band.set_metadata_item("SCALE", &format!("{}", 1.0 / scale_factor as f64), "")?;
        band.set_metadata_item("OFFSET", "0", "")?;
        band.set_description(&format!("{name} (scaled by {scale_factor})"))?;

        let fixed_data = to_fixed_point(values, scale_factor);
        let mut buffer = Buffer::new((width, height), fixed_data);
        band.write((0, 0), (width, height), &mut buffer)?;
        out_ds.flush_cache()?;
    } else {
        let mut out_ds = driver.create_with_band_type_with_options::<f32, _>(
            output_path,
            width,
            height,
            1,
            &creation_options,
        )?;
        out_ds.set_spatial_ref(&srs)?;
        out_ds.set_geo_transform(&spec.transform.0)?;

        let mut band = out_ds.rasterband(1)?;
        band.set_no_data_value(Some(NODATA_FLOAT as f64))?;
        band.set_description(name)?;

        let data = values
            .iter()
            .map(|&v| if v.is_nan() { NODATA_FLOAT } else { v })
            .collect();
        let mut buffer = Buffer::new((width, height), data);
        band.write((0, 0), (width, height), &mut buffer)?;
        out_ds.flush_cache()?;
    }

    Ok(())
}
