//! Command-line driver for terrain generation.

pub mod generate;
pub mod settings;

pub use generate::*;
pub use settings::*;
