// src/io/mod.rs
pub mod loader;
pub mod reader;
pub mod store;
pub mod writer;

pub use loader::BandLoader;
pub use reader::{BandSource, GdalBandSource};
pub use store::{LatestSnapshot, SeriesStore};
pub use writer::write_index_raster;
