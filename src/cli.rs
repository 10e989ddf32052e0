use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "raster-monitor")]
#[command(about = "Monthly NDVI / NDMI / BSI monitoring of a site from Sentinel-2")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file (defaults apply to missing fields)
    #[arg(short, long, global = true, env = "RASTER_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding historical_monthly.json and latest_metrics.json
    #[arg(long, default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Also export per-period index GeoTIFFs into this directory
    #[arg(long, global = true)]
    pub raster_dir: Option<PathBuf>,

    /// Export index rasters as float32 instead of scaled int16
    #[arg(long, global = true)]
    pub float: bool,

    /// Maximum cloud cover percentage (overrides config)
    #[arg(long, global = true)]
    pub max_cloud_cover: Option<f64>,

    /// Threads used to read bands (overrides config)
    #[arg(long, global = true)]
    pub io_threads: Option<usize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute every month in a range and merge it into the historical series
    Backfill {
        /// First month, YYYY-MM
        #[arg(short, long, default_value = "2024-01")]
        start: String,

        /// Last month, YYYY-MM (default: current month)
        #[arg(short, long)]
        end: Option<String>,
    },

    /// Compute the most recent metrics and write the latest snapshot
    Latest,

    /// Compute a single month and print the metrics without saving
    Period {
        /// Month, YYYY-MM
        #[arg(short, long)]
        month: String,
    },
}
