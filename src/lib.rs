// src/lib.rs
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod processing;
pub mod projection;
pub mod raster;
pub mod region;
pub mod timeseries;
pub mod utils;

pub use error::{MonitorError, Result};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
