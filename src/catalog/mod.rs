// src/catalog/mod.rs
//! Scene selection against a STAC imagery catalog.

pub mod stac;

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;
use crate::region::Region;

pub use stac::StacCatalog;

/// One catalog entry usable as an imagery source.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub datetime: DateTime<Utc>,
    pub cloud_cover: f64,
    /// Asset key -> href
    pub assets: HashMap<String, String>,
}

impl Scene {
    pub fn capture_date(&self) -> NaiveDate {
        self.datetime.date_naive()
    }

    pub fn asset_href(&self, key: &str) -> Option<&str> {
        self.assets.get(key).map(String::as_str)
    }

    /// Keys from `required` that have no asset in this scene.
    pub fn missing_assets<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        required
            .into_iter()
            .filter(|key| !self.assets.contains_key(*key))
            .map(str::to_string)
            .collect()
    }
}

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// STAC datetime interval. STAC intervals are closed, so the end is
    /// pulled back by one millisecond to keep it exclusive.
    pub fn to_stac_interval(&self) -> String {
        let start = self.start.and_time(NaiveTime::MIN).and_utc();
        let end = self.end.and_time(NaiveTime::MIN).and_utc() - Duration::milliseconds(1);
        format!(
            "{}/{}",
            start.format("%Y-%m-%dT%H:%M:%SZ"),
            end.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        )
    }

    pub fn contains(&self, datetime: &DateTime<Utc>) -> bool {
        let date = datetime.date_naive();
        date >= self.start && date < self.end
    }
}

/// Body of a STAC `POST /search` request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub collections: Vec<String>,
    pub datetime: String,
    pub limit: u32,
    pub sortby: Vec<Value>,
    pub intersects: Value,
    pub query: Value,
}

/// An imagery catalog that can answer item searches.
pub trait Catalog {
    fn search(&self, request: &SearchRequest) -> Result<Vec<Scene>>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn search(&self, request: &SearchRequest) -> Result<Vec<Scene>> {
        (**self).search(request)
    }
}

/// Picks the least-cloudy scene over the region for a time window.
pub struct SceneSelector<C> {
    catalog: C,
    collection: String,
    intersects: Value,
    max_cloud_cover: f64,
    limit: u32,
}

impl<C: Catalog> SceneSelector<C> {
    pub fn new(
        catalog: C,
        region: &Region,
        collection: impl Into<String>,
        max_cloud_cover: f64,
        limit: u32,
    ) -> Self {
        Self {
            catalog,
            collection: collection.into(),
            intersects: region.to_geojson(),
            max_cloud_cover,
            limit,
        }
    }

    pub fn request(&self, window: &TimeWindow) -> SearchRequest {
        SearchRequest {
            collections: vec![self.collection.clone()],
            datetime: window.to_stac_interval(),
            limit: self.limit,
            sortby: vec![json!({"field": "properties.eo:cloud_cover", "direction": "asc"})],
            intersects: self.intersects.clone(),
            query: json!({"eo:cloud_cover": {"lt": self.max_cloud_cover}}),
        }
    }

    /// `Ok(None)` when the catalog has no matching scene for the window.
    pub fn select(&self, window: &TimeWindow) -> Result<Option<Scene>> {
        let request = self.request(window);
        let scenes = self.catalog.search(&request)?;
        debug!(count = scenes.len(), datetime = %request.datetime, "catalog search");

        Ok(scenes
            .into_iter()
            .filter(|scene| scene.cloud_cover < self.max_cloud_cover && window.contains(&scene.datetime))
            .min_by(|a, b| a.cloud_cover.total_cmp(&b.cloud_cover)))
    }
}
