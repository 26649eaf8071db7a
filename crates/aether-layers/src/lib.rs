//! Generative animation layers for aether.
//!
//! Each variant implements [`aether_runtime::AnimationLayer`] and opts into
//! the parameters it understands. Variants that need an engine are gated
//! behind the matching cargo feature: `physics` pulls in rapier for the
//! particle field, `scene` enables the 3D scene graph behind the starfield
//! and the orbital system.

pub mod animations;
mod chars;
mod color;
mod factory;
#[cfg(feature = "scene")]
pub mod scene;
#[cfg(test)]
mod testing;

pub use animations::grid::InteractiveNodeGrid;
pub use animations::matrix::DigitalRainField;
#[cfg(feature = "scene")]
pub use animations::orbital::OrbitalSystemRenderer;
#[cfg(feature = "physics")]
pub use animations::particles::PhysicsParticleField;
#[cfg(feature = "scene")]
pub use animations::starfield::StarfieldRenderer;
pub use factory::{DefaultLayerFactory, compiled_engines};
