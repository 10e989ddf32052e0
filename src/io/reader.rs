// src/io/reader.rs
use std::time::Duration;

use gdal::Dataset;
use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::processing::mask::clip_to_ring;
use crate::projection::Projection;
use crate::raster::{BandGrid, GeoTransform, GridSpec};
use crate::region::{bounds, Region};

/// Something that can fetch one band raster clipped to the region.
pub trait BandSource: Send + Sync {
    fn read_clipped(&self, href: &str, region: &Region) -> Result<BandGrid>;
}

/// Reads bands through GDAL, streaming remote COGs over `/vsicurl/` and `/vsis3/`.
pub struct GdalBandSource;

impl GdalBandSource {
    /// `anonymous` enables unsigned S3 access for public buckets. Every
    /// remote read gives up after `timeout` and is retried `max_retries` times.
    pub fn new(anonymous: bool, timeout: Duration, max_retries: u32) -> Result<Self> {
        if anonymous {
            gdal::config::set_config_option("AWS_NO_SIGN_REQUEST", "YES")?;
        }
        gdal::config::set_config_option("GDAL_DISABLE_READDIR_ON_OPEN", "EMPTY_DIR")?;

        let secs = timeout.as_secs().max(1).to_string();
        gdal::config::set_config_option("GDAL_HTTP_TIMEOUT", &secs)?;
        gdal::config::set_config_option("GDAL_HTTP_CONNECTTIMEOUT", &secs)?;
        gdal::config::set_config_option("GDAL_HTTP_MAX_RETRY", &max_retries.to_string())?;
        gdal::config::set_config_option("GDAL_HTTP_RETRY_DELAY", "1")?;
        debug!(timeout_secs = %secs, max_retries, "GDAL HTTP limits set");
        Ok(Self)
    }
}

/// GDAL path for an asset href.
pub fn vsi_path(href: &str) -> String {
    if let Some(rest) = href.strip_prefix("s3://") {
        format!("/vsis3/{rest}")
    } else if href.starts_with("http://") || href.starts_with("https://") {
        format!("/vsicurl/{href}")
    } else {
        href.to_string()
    }
}

/// Pixel window `(col, row, width, height)` covering `bbox` on a raster of
/// `size`, or `None` when they do not overlap.
pub fn pixel_window(
    transform: &GeoTransform,
    size: (usize, usize),
    bbox: [f64; 4],
) -> Option<(usize, usize, usize, usize)> {
    let corners = [
        (bbox[0], bbox[1]),
        (bbox[0], bbox[3]),
        (bbox[2], bbox[1]),
        (bbox[2], bbox[3]),
    ];
    let pixels: Vec<(f64, f64)> = corners
        .iter()
        .map(|&(x, y)| transform.invert(x, y))
        .collect::<Option<_>>()?;
    let [min_c, min_r, max_c, max_r] = bounds(&pixels);

    let col0 = min_c.floor().max(0.0) as usize;
    let row0 = min_r.floor().max(0.0) as usize;
    let col1 = (max_c.ceil().max(0.0) as usize).min(size.0);
    let row1 = (max_r.ceil().max(0.0) as usize).min(size.1);

    if col1 <= col0 || row1 <= row0 {
        return None;
    }
    Some((col0, row0, col1 - col0, row1 - row0))
}

impl BandSource for GdalBandSource {
    fn read_clipped(&self, href: &str, region: &Region) -> Result<BandGrid> {
        let dataset = Dataset::open(vsi_path(href))?;
        let size = dataset.raster_size();
        let transform = GeoTransform(dataset.geo_transform()?);
        let epsg = dataset.spatial_ref()?.auth_code()? as u32;
        let projection = Projection::from_epsg(epsg).ok_or(MonitorError::UnsupportedCrs(epsg))?;

        let ring = region.ring_in(&projection);
        let (col, row, width, height) = pixel_window(&transform, size, bounds(&ring))
            .ok_or_else(|| MonitorError::RegionOutside(href.to_string()))?;
        debug!(href, col, row, width, height, epsg, "reading band window");

        let band = dataset.rasterband(1)?;
        let nodata = band.no_data_value();
        let buffer = band.read_as::<f32>(
            (col as isize, row as isize),
            (width, height),
            (width, height),
            None,
        )?;

        let spec = GridSpec {
            width,
            height,
            transform: transform.offset(col, row),
            epsg,
        };
        let mut grid = BandGrid::new(buffer.data().to_vec(), spec)?;
        clip_to_ring(&mut grid, &ring, nodata);
        Ok(grid)
    }
}
