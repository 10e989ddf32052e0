// src/config.rs
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};
use crate::raster::Band;

/// Longest trailing window the `latest` command may search, in days.
pub const MAX_LATEST_WINDOW_DAYS: i64 = 3660;
/// Retries beyond this would keep one search backing off for minutes.
pub const MAX_RETRIES: u32 = 10;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MonitorConfig {
    /// Key of the site inside the persisted series file
    #[serde(default = "default_site_id")]
    pub site_id: String,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_buffer_meters")]
    pub buffer_meters: f64,
    #[serde(default = "default_stac_url")]
    pub stac_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Scenes at or above this cloud cover percentage are ignored
    #[serde(default = "default_max_cloud_cover")]
    pub max_cloud_cover: f64,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    #[serde(default)]
    pub io_threads: Option<usize>,
    #[serde(default)]
    pub bands: BandKeys,
    #[serde(default)]
    pub baseline: Option<BaselinePeriod>,
    #[serde(default = "default_latest_window_days")]
    pub latest_window_days: i64,
}

/// Asset keys of each band in catalog items.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BandKeys {
    #[serde(default = "default_blue")]
    pub blue: String,
    #[serde(default = "default_red")]
    pub red: String,
    #[serde(default = "default_nir")]
    pub nir: String,
    #[serde(default = "default_narrow_nir")]
    pub narrow_nir: String,
    #[serde(default = "default_swir")]
    pub swir: String,
}

/// Period the latest snapshot is compared against.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BaselinePeriod {
    pub year: i32,
    pub month: u32,
}

fn default_site_id() -> String {
    "tailings_dam".to_string()
}

fn default_longitude() -> f64 {
    109.685119
}

fn default_latitude() -> f64 {
    40.635497
}

fn default_buffer_meters() -> f64 {
    5000.0
}

fn default_stac_url() -> String {
    "https://earth-search.aws.element84.com/v1/search".to_string()
}

fn default_collection() -> String {
    "sentinel-2-l2a".to_string()
}

fn default_max_cloud_cover() -> f64 {
    30.0
}

fn default_search_limit() -> u32 {
    50
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_scale_factor() -> f32 {
    10000.0
}

fn default_latest_window_days() -> i64 {
    60
}

fn default_blue() -> String {
    "B02".to_string()
}

fn default_red() -> String {
    "B04".to_string()
}

fn default_nir() -> String {
    "B08".to_string()
}

fn default_narrow_nir() -> String {
    "B8A".to_string()
}

fn default_swir() -> String {
    "B11".to_string()
}

impl Default for BandKeys {
    fn default() -> Self {
        Self {
            blue: default_blue(),
            red: default_red(),
            nir: default_nir(),
            narrow_nir: default_narrow_nir(),
            swir: default_swir(),
        }
    }
}

impl BandKeys {
    pub fn key(&self, band: Band) -> &str {
        match band {
            Band::Blue => &self.blue,
            Band::Red => &self.red,
            Band::Nir => &self.nir,
            Band::NarrowNir => &self.narrow_nir,
            Band::Swir => &self.swir,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            longitude: default_longitude(),
            latitude: default_latitude(),
            buffer_meters: default_buffer_meters(),
            stac_url: default_stac_url(),
            collection: default_collection(),
            max_cloud_cover: default_max_cloud_cover(),
            search_limit: default_search_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            scale_factor: default_scale_factor(),
            io_threads: None,
            bands: BandKeys::default(),
            baseline: None,
            latest_window_days: default_latest_window_days(),
        }
    }
}

impl MonitorConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: MonitorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.site_id.trim().is_empty() {
            return Err(MonitorError::Config("site_id must not be empty".to_string()));
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(MonitorError::Config(format!(
                "scale_factor must be positive, got {}",
                self.scale_factor
            )));
        }
        if !(0.0..=100.0).contains(&self.max_cloud_cover) {
            return Err(MonitorError::Config(format!(
                "max_cloud_cover must be a percentage, got {}",
                self.max_cloud_cover
            )));
        }
        if self.search_limit == 0 {
            return Err(MonitorError::Config("search_limit must be at least 1".to_string()));
        }
        if !(1..=MAX_LATEST_WINDOW_DAYS).contains(&self.latest_window_days) {
            return Err(MonitorError::Config(format!(
                "latest_window_days must be between 1 and {MAX_LATEST_WINDOW_DAYS}, got {}",
                self.latest_window_days
            )));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(MonitorError::Config(format!(
                "max_retries must be at most {MAX_RETRIES}, got {}",
                self.max_retries
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(MonitorError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if let Some(baseline) = self.baseline {
            if !(1..=12).contains(&baseline.month) {
                return Err(MonitorError::Config(format!(
                    "baseline month {} is not a calendar month",
                    baseline.month
                )));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
