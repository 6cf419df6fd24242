//! Basemap tiles.
//!
//! This module provides the Carto basemap tile source and the disk-cached
//! `HttpTiles` built from it.

pub mod carto;

pub use carto::{basemap_tiles, MapStyle};
