// src/main.rs
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use raster_monitor::catalog::{SceneSelector, StacCatalog};
use raster_monitor::cli::{Cli, Commands};
use raster_monitor::config::MonitorConfig;
use raster_monitor::io::{BandLoader, GdalBandSource, LatestSnapshot, SeriesStore};
use raster_monitor::pipeline::Pipeline;
use raster_monitor::region::Region;
use raster_monitor::timeseries::Period;

const HISTORICAL_FILE: &str = "historical_monthly.json";
const LATEST_FILE: &str = "latest_metrics.json";

type SitePipeline = Pipeline<StacCatalog, GdalBandSource>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    match &cli.command {
        Commands::Backfill { start, end } => run_backfill(&cli, start, end.as_deref()),
        Commands::Latest => run_latest(&cli),
        Commands::Period { month } => run_period(&cli, month),
    }
}

fn load_config(cli: &Cli) -> Result<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(max_cloud_cover) = cli.max_cloud_cover {
        config.max_cloud_cover = max_cloud_cover;
    }
    if cli.io_threads.is_some() {
        config.io_threads = cli.io_threads;
    }
    config.validate()?;
    Ok(config)
}

fn build_pipeline(cli: &Cli, config: &MonitorConfig) -> Result<SitePipeline> {
    let region = Region::around(config.longitude, config.latitude, config.buffer_meters)?;
    info!(
        site = %config.site_id,
        center = ?region.center(),
        radius_m = region.radius_m(),
        "analysis region ready"
    );

    let catalog = StacCatalog::new(
        config.stac_url.clone(),
        config.request_timeout(),
        config.max_retries,
    )?;
    let selector = SceneSelector::new(
        catalog,
        &region,
        config.collection.clone(),
        config.max_cloud_cover,
        config.search_limit,
    );
    let source = GdalBandSource::new(true, config.request_timeout(), config.max_retries)?;
    let loader = BandLoader::new(source, config.bands.clone(), config.io_threads)?;

    let pipeline = Pipeline::new(selector, loader, region, config.scale_factor);
    Ok(match &cli.raster_dir {
        Some(dir) => pipeline.with_raster_dir(dir, cli.float),
        None => pipeline,
    })
}

fn run_backfill(cli: &Cli, start: &str, end: Option<&str>) -> Result<()> {
    let config = load_config(cli)?;
    let start: Period = start.parse()?;
    let end: Period = match end {
        Some(end) => end.parse()?,
        None => Period::containing(Local::now().date_naive()),
    };
    let periods = Period::range(start, end);
    if periods.is_empty() {
        return Err(anyhow!("start {start} is after end {end}"));
    }

    let pipeline = build_pipeline(cli, &config)?;
    let store = SeriesStore::new(cli.data_dir.join(HISTORICAL_FILE));
    let mut series = store
        .load(&config.site_id)
        .with_context(|| format!("loading {}", store.path().display()))?;

    info!(%start, %end, periods = periods.len(), "starting backfill");
    let report = pipeline.backfill(&periods, &mut series)?;
    store.save(&config.site_id, &series)?;

    info!(
        updated = report.updated.len(),
        no_scene = report.no_scene.len(),
        failed = report.failed.len(),
        "backfill complete"
    );
    for (period, reason) in &report.failed {
        warn!(%period, reason = %reason, "period not updated");
    }
    Ok(())
}

fn compute_latest(cli: &Cli) -> Result<LatestSnapshot> {
    let config = load_config(cli)?;
    let pipeline = build_pipeline(cli, &config)?;
    let today = Local::now().date_naive();

    let metrics = pipeline
        .latest(today, config.latest_window_days)?
        .ok_or_else(|| {
            anyhow!(
                "no scene below {}% cloud cover in the last {} days",
                config.max_cloud_cover,
                config.latest_window_days
            )
        })?;

    let snapshot = LatestSnapshot::from_metrics(&metrics);
    let Some(baseline) = config.baseline else {
        return Ok(snapshot);
    };
    let Some(period) = Period::new(baseline.year, baseline.month) else {
        return Ok(snapshot);
    };

    let store = SeriesStore::new(cli.data_dir.join(HISTORICAL_FILE));
    match store.load(&config.site_id)?.period(period) {
        Some(values) => Ok(snapshot.with_baseline(values)),
        None => {
            warn!(%period, "baseline period not in historical series");
            Ok(snapshot)
        }
    }
}

fn run_latest(cli: &Cli) -> Result<()> {
    let path = cli.data_dir.join(LATEST_FILE);

    match compute_latest(cli) {
        Ok(snapshot) => {
            snapshot
                .write(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(
                image_date = ?snapshot.image_date,
                ndvi = ?snapshot.metrics.ndvi,
                ndmi = ?snapshot.metrics.ndmi,
                bsi = ?snapshot.metrics.bsi,
                path = %path.display(),
                "latest metrics saved"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "latest metrics failed, writing fallback snapshot");
            LatestSnapshot::fallback(format!("{e:#}"))
                .write(&path)
                .with_context(|| format!("writing fallback {}", path.display()))?;
            Err(e)
        }
    }
}

fn run_period(cli: &Cli, month: &str) -> Result<()> {
    let config = load_config(cli)?;
    let period: Period = month.parse()?;
    let pipeline = build_pipeline(cli, &config)?;

    match pipeline.process_period(period)? {
        Some(metrics) => println!("{}", serde_json::to_string_pretty(&metrics)?),
        None => info!(%period, "no scene available"),
    }
    Ok(())
}
