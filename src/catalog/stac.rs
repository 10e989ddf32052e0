// src/catalog/stac.rs
//! Blocking STAC Item Search client.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Catalog, Scene, SearchRequest};
use crate::config::MAX_RETRIES;
use crate::error::{MonitorError, Result};

/// STAC Item Collection (GeoJSON FeatureCollection), reduced to what scene
/// selection needs.
#[derive(Debug, Deserialize)]
pub struct StacItemCollection {
    #[serde(default)]
    pub features: Vec<StacItem>,
}

#[derive(Debug, Deserialize)]
pub struct StacItem {
    pub id: String,
    pub properties: StacItemProperties,
    #[serde(default)]
    pub assets: HashMap<String, StacAsset>,
}

#[derive(Debug, Deserialize)]
pub struct StacItemProperties {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(rename = "eo:cloud_cover", default)]
    pub eo_cloud_cover: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct StacAsset {
    pub href: String,
}

impl StacItem {
    /// Convert to a [`Scene`]. Items without a parseable datetime are dropped.
    pub fn into_scene(self) -> Option<Scene> {
        let datetime = self
            .properties
            .datetime
            .as_deref()
            .and_then(|dt| DateTime::parse_from_rfc3339(dt).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let Some(datetime) = datetime else {
            debug!(id = %self.id, "dropping item without datetime");
            return None;
        };

        Some(Scene {
            id: self.id,
            datetime,
            // Items that do not report cloud cover never pass the threshold
            cloud_cover: self.properties.eo_cloud_cover.unwrap_or(100.0),
            assets: self
                .assets
                .into_iter()
                .map(|(key, asset)| (key, asset.href))
                .collect(),
        })
    }
}

/// Parse a search response body into scenes, keeping catalog order.
pub fn parse_search_response(body: &str) -> Result<Vec<Scene>> {
    let collection: StacItemCollection = serde_json::from_str(body)
        .map_err(|e| MonitorError::Catalog(format!("parsing STAC response: {e}")))?;
    Ok(collection
        .features
        .into_iter()
        .filter_map(StacItem::into_scene)
        .collect())
}

/// Upper bound of a single wait between search attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Wait before retry `attempt` (1-based): 500ms, 1s, 2s, ... capped at 30s.
pub fn backoff_delay(attempt: u32) -> Duration {
    let doublings = attempt.saturating_sub(1).min(16);
    Duration::from_millis(500u64.saturating_mul(2u64.saturating_pow(doublings))).min(MAX_BACKOFF)
}

/// HTTP STAC catalog. Holds one reusable client for the whole run.
pub struct StacCatalog {
    search_url: String,
    client: Client,
    max_retries: u32,
}

impl StacCatalog {
    pub fn new(search_url: impl Into<String>, timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            search_url: search_url.into(),
            client,
            max_retries: max_retries.min(MAX_RETRIES),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

impl Catalog for StacCatalog {
    fn search(&self, request: &SearchRequest) -> Result<Vec<Scene>> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                thread::sleep(backoff_delay(attempt));
            }

            match self.client.post(&self.search_url).json(request).send() {
                Ok(resp) if resp.status().is_success() => {
                    let body = resp.text()?;
                    return parse_search_response(&body);
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().unwrap_or_default();
                    let err = MonitorError::Catalog(format!(
                        "STAC search returned HTTP {}: {}",
                        status,
                        body.chars().take(500).collect::<String>()
                    ));
                    if status.is_client_error() {
                        return Err(err);
                    }
                    warn!(attempt, %status, "STAC search failed, retrying");
                    last_err = Some(err);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "STAC search request failed");
                    last_err = Some(MonitorError::Http(e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| MonitorError::Catalog("STAC search failed".into())))
    }
}
