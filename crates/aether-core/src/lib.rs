//! Core types shared by the aether runtime, layers and host application.
//!
//! Everything here is a plain value: slots and layer kinds, the parameter
//! snapshot handed to running layers, saved camera views, and the RGBA
//! color type that the drawing surface contract speaks.

mod color;
mod layer;
mod params;
mod view;

pub use color::{Rgba, hsl_to_rgba};
pub use layer::{Engine, EngineSet, LayerKind, Slot};
pub use params::{Capability, ParameterSnapshot, clamp_level, map_level};
pub use view::{CameraState, SavedView};
