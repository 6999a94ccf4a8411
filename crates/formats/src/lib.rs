pub mod elevation;
pub mod export;
pub mod number;
pub mod texture_tiles;
pub mod vector_map;

pub use elevation::*;
pub use export::*;
pub use texture_tiles::*;
pub use vector_map::*;
