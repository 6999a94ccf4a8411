//! Tiled terrain generation from gridded elevation data.
//!
//! [`TileOrchestrator`] runs the pipeline one phase per host tick; the
//! finished [`TerrainContainer`] is handed to a [`TerrainSink`].

pub mod config;
pub mod container;
pub mod heightmap;
pub mod orchestrator;
pub mod sink;
pub mod stitch;
pub mod texture;

pub use config::*;
pub use container::*;
pub use heightmap::*;
pub use orchestrator::*;
pub use sink::*;
pub use stitch::*;
pub use texture::*;
