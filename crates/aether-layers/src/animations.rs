//! Animation layer variants.

pub mod grid;
pub mod matrix;
#[cfg(feature = "scene")]
pub mod orbital;
#[cfg(feature = "physics")]
pub mod particles;
#[cfg(feature = "scene")]
pub mod starfield;
