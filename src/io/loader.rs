// src/io/loader.rs
use std::collections::HashMap;

use itertools::Itertools;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use super::reader::BandSource;
use crate::catalog::Scene;
use crate::config::BandKeys;
use crate::error::{MonitorError, Result};
use crate::processing::align_bands;
use crate::raster::{Band, BandGrid, BandStack};
use crate::region::Region;

/// Loads all bands of a scene clipped to the region and aligned on one grid.
pub struct BandLoader<S> {
    source: S,
    keys: BandKeys,
    pool: ThreadPool,
}

impl<S: BandSource> BandLoader<S> {
    /// `io_threads` bounds concurrent band reads (default: CPU count).
    pub fn new(source: S, keys: BandKeys, io_threads: Option<usize>) -> Result<Self> {
        let threads = io_threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("band-io-{i}"))
            .build()
            .map_err(|e| MonitorError::Config(format!("band reader pool: {e}")))?;

        Ok(Self { source, keys, pool })
    }

    /// Fails with [`MonitorError::IncompleteScene`] when an asset is missing.
    pub fn load(&self, scene: &Scene, region: &Region) -> Result<BandStack> {
        let missing = scene.missing_assets(Band::ALL.iter().map(|band| self.keys.key(*band)));
        if !missing.is_empty() {
            return Err(MonitorError::IncompleteScene {
                scene_id: scene.id.clone(),
                missing: missing.iter().join(", "),
            });
        }

        let grids: HashMap<Band, BandGrid> = self.pool.install(|| {
            Band::ALL
                .par_iter()
                .map(|band| {
                    let key = self.keys.key(*band);
                    // Presence checked above
                    let href = scene.asset_href(key).unwrap_or_default();
                    let grid = self.source.read_clipped(href, region)?;
                    debug!(%band, key, width = grid.width(), height = grid.height(), "band loaded");
                    Ok((*band, grid))
                })
                .collect::<Result<HashMap<_, _>>>()
        })?;

        align_bands(grids)
    }
}
