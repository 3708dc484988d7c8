//! CLI command implementations.

pub mod params;
pub mod patches;
pub mod render;
pub mod scales;
