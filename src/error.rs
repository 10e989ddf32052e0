// src/error.rs
use thiserror::Error;

/// Errors produced while computing site metrics.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Invalid site, projection or runtime setup. Aborts the run.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog request failed: {0}")]
    Catalog(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("incomplete scene {scene_id}: missing bands {missing}")]
    IncompleteScene { scene_id: String, missing: String },

    #[error("unsupported coordinate reference system: EPSG:{0}")]
    UnsupportedCrs(u32),

    #[error("region does not intersect raster {0}")]
    RegionOutside(String),

    #[error("band grids are not aligned: {0}")]
    GridMismatch(String),

    #[error("raster error: {0}")]
    Raster(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    /// Whether this error must stop the whole run rather than skip one period.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MonitorError::Config(_) | MonitorError::Io(_) | MonitorError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
