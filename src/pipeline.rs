// src/pipeline.rs
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, SceneSelector, TimeWindow};
use crate::config::MAX_LATEST_WINDOW_DAYS;
use crate::error::{MonitorError, Result};
use crate::io::reader::BandSource;
use crate::io::{write_index_raster, BandLoader};
use crate::processing::{compute_metrics, IndexRasters, MetricSet};
use crate::raster::GridSpec;
use crate::region::Region;
use crate::timeseries::{HistoricalSeries, Period};

/// Outcome of a multi-period run.
#[derive(Debug, Default)]
pub struct BackfillReport {
    pub updated: Vec<Period>,
    pub no_scene: Vec<Period>,
    pub failed: Vec<(Period, String)>,
}

/// Scene selection, band loading and index reduction for one site.
pub struct Pipeline<C, S> {
    selector: SceneSelector<C>,
    loader: BandLoader<S>,
    region: Region,
    scale_factor: f32,
    raster_dir: Option<PathBuf>,
    float_rasters: bool,
}

impl<C: Catalog, S: BandSource> Pipeline<C, S> {
    pub fn new(
        selector: SceneSelector<C>,
        loader: BandLoader<S>,
        region: Region,
        scale_factor: f32,
    ) -> Self {
        Self {
            selector,
            loader,
            region,
            scale_factor,
            raster_dir: None,
            float_rasters: false,
        }
    }

    /// Also write the per-pixel index rasters of every processed scene,
    /// as float32 when `float` is set and as scaled int16 otherwise.
    pub fn with_raster_dir(mut self, dir: impl Into<PathBuf>, float: bool) -> Self {
        self.raster_dir = Some(dir.into());
        self.float_rasters = float;
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Metrics of the least-cloudy scene in `window`, `None` if there is none.
    pub fn metrics_for_window(&self, window: &TimeWindow, label: &str) -> Result<Option<MetricSet>> {
        let Some(scene) = self.selector.select(window)? else {
            return Ok(None);
        };
        info!(label, scene = %scene.id, cloud_cover = scene.cloud_cover, "selected scene");

        let stack = self.loader.load(&scene, &self.region)?;
        let (metrics, rasters) =
            compute_metrics(&stack, self.scale_factor, scene.capture_date(), &scene.id);

        if let Some(dir) = &self.raster_dir {
            self.export_rasters(dir, label, stack.spec(), &rasters)?;
        }
        Ok(Some(metrics))
    }

    pub fn process_period(&self, period: Period) -> Result<Option<MetricSet>> {
        self.metrics_for_window(&period.window(), &period.to_string())
    }

    /// Metrics for the trailing `days` ending on `today` (inclusive).
    ///
    /// `days` is clamped to `1..=MAX_LATEST_WINDOW_DAYS`.
    pub fn latest(&self, today: NaiveDate, days: i64) -> Result<Option<MetricSet>> {
        let days = days.clamp(1, MAX_LATEST_WINDOW_DAYS);
        let window = today
            .checked_add_signed(Duration::days(1))
            .and_then(|end| Some(TimeWindow::new(end.checked_sub_signed(Duration::days(days))?, end)))
            .ok_or_else(|| {
                MonitorError::Config(format!("no {days}-day window ends on {today}"))
            })?;
        self.metrics_for_window(&window, "latest")
    }

    /// Process `periods` in order and merge the results into `series`.
    ///
    /// Per-period failures are logged and skipped; only fatal errors stop the run.
    pub fn backfill(&self, periods: &[Period], series: &mut HistoricalSeries) -> Result<BackfillReport> {
        let mut report = BackfillReport::default();

        for &period in periods {
            match self.process_period(period) {
                Ok(Some(metrics)) => {
                    info!(
                        %period,
                        ndvi = ?metrics.ndvi,
                        ndmi = ?metrics.ndmi,
                        bsi = ?metrics.bsi,
                        image_date = %metrics.image_date,
                        "period updated"
                    );
                    series.upsert_period(period, &metrics);
                    report.updated.push(period);
                }
                Ok(None) => {
                    info!(%period, "no scene available, skipping");
                    report.no_scene.push(period);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(%period, error = %e, "skipping period");
                    report.failed.push((period, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    fn export_rasters(
        &self,
        dir: &std::path::Path,
        label: &str,
        spec: &GridSpec,
        rasters: &IndexRasters,
    ) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let scale = self.scale_factor as i32;
        for raster in rasters.iter() {
            let path = dir.join(format!("{label}_{}.tif", raster.name));
            write_index_raster(&raster.values, spec, &raster.name, &path, !self.float_rasters, scale)?;
            debug!(path = %path.display(), "index raster written");
        }
        Ok(())
    }
}
