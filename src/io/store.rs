// src/io/store.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::processing::stats::round_to;
use crate::processing::MetricSet;
use crate::timeseries::{HistoricalSeries, STORED_DECIMALS};

/// Write `bytes` to a sibling temporary file and rename it over `path`, so
/// readers never observe a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// The historical series file: site id -> [`HistoricalSeries`].
pub struct SeriesStore {
    path: PathBuf,
}

impl SeriesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Series of `site_id`, empty if the file or the site is absent.
    pub fn load(&self, site_id: &str) -> Result<HistoricalSeries> {
        match self.read_all()?.remove(site_id) {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(HistoricalSeries::new()),
        }
    }

    /// Replace the series of `site_id`, keeping every other site untouched.
    pub fn save(&self, site_id: &str, series: &HistoricalSeries) -> Result<()> {
        let mut all = self.read_all()?;
        all.insert(site_id.to_string(), serde_json::to_value(series)?);
        write_atomic(&self.path, serde_json::to_string_pretty(&all)?.as_bytes())?;
        info!(path = %self.path.display(), site_id, "saved historical series");
        Ok(())
    }
}

/// Metric values as shown in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    pub ndvi: Option<f64>,
    pub ndmi: Option<f64>,
    pub bsi: Option<f64>,
}

impl SnapshotMetrics {
    /// Placeholder values published when no metrics could be computed.
    pub fn placeholder() -> Self {
        Self {
            ndvi: Some(0.129),
            ndmi: Some(-0.038),
            bsi: Some(0.084),
        }
    }
}

/// Content of `latest_metrics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSnapshot {
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    pub metrics: SnapshotMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes_vs_baseline: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LatestSnapshot {
    pub fn from_metrics(metrics: &MetricSet) -> Self {
        let round = |v: Option<f64>| v.map(|v| round_to(v, STORED_DECIMALS));
        Self {
            timestamp: Local::now(),
            image_date: Some(metrics.image_date),
            scene_id: Some(metrics.scene_id.clone()),
            metrics: SnapshotMetrics {
                ndvi: round(metrics.ndvi),
                ndmi: round(metrics.ndmi),
                bsi: round(metrics.bsi),
            },
            changes_vs_baseline: None,
            error: None,
        }
    }

    /// Snapshot written when the run failed, so consumers always find a file.
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            image_date: None,
            scene_id: None,
            metrics: SnapshotMetrics::placeholder(),
            changes_vs_baseline: None,
            error: Some(error.into()),
        }
    }

    /// Attach percentage changes against baseline values. Metrics missing on
    /// either side, or with a zero baseline, are left out; with none left the
    /// field stays absent.
    pub fn with_baseline(
        mut self,
        baseline: (Option<f64>, Option<f64>, Option<f64>),
    ) -> Self {
        let pairs = [
            ("ndvi", self.metrics.ndvi, baseline.0),
            ("ndmi", self.metrics.ndmi, baseline.1),
            ("bsi", self.metrics.bsi, baseline.2),
        ];
        let changes: BTreeMap<String, String> = pairs
            .into_iter()
            .filter_map(|(name, current, base)| {
                percent_change(current?, base?).map(|delta| (name.to_string(), delta))
            })
            .collect();
        self.changes_vs_baseline = (!changes.is_empty()).then_some(changes);
        self
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, serde_json::to_string_pretty(self)?.as_bytes())
    }
}

/// `(current - baseline) / |baseline|` as a signed percentage, e.g. "+76.2%".
pub fn percent_change(current: f64, baseline: f64) -> Option<String> {
    if baseline == 0.0 || !baseline.is_finite() || !current.is_finite() {
        return None;
    }
    let pct = (current - baseline) / baseline.abs() * 100.0;
    Some(format!("{pct:+.1}%"))
}
