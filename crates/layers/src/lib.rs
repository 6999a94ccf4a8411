//! Vegetation placement from vector map features.
//!
//! Map elements are classified by their tags, converted to container world
//! space and rasterized by a [`VegetationLayer`]: trees and tree rows become
//! instances, wood-like areas are filled with instances and grass-like areas
//! with detail layer counts.

pub mod areas;
pub mod classify;
pub mod config;
pub mod layer;
pub mod placer;
pub mod points;
pub mod polygon;

pub use areas::*;
pub use classify::*;
pub use config::*;
pub use layer::*;
pub use placer::*;
pub use points::*;
pub use polygon::*;
