//! User-adjustable parameters and the capabilities that consume them.

use serde::{Deserialize, Serialize};

/// Upper bound of every parameter level.
pub const MAX_LEVEL: u8 = 100;

/// A tunable parameter a layer may opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Density,
    Speed,
    Intensity,
}

/// Immutable read of the user-configurable parameters, each `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSnapshot {
    pub particle_density: u8,
    pub animation_speed: u8,
    pub physics_intensity: u8,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            particle_density: 50,
            animation_speed: 50,
            physics_intensity: 50,
        }
    }
}

impl ParameterSnapshot {
    /// Create a snapshot, clamping each level into range.
    pub fn new(particle_density: i32, animation_speed: i32, physics_intensity: i32) -> Self {
        Self {
            particle_density: clamp_level(particle_density),
            animation_speed: clamp_level(animation_speed),
            physics_intensity: clamp_level(physics_intensity),
        }
    }

    /// Same snapshot with every level clamped into range.
    pub fn sanitized(self) -> Self {
        Self {
            particle_density: self.particle_density.min(MAX_LEVEL),
            animation_speed: self.animation_speed.min(MAX_LEVEL),
            physics_intensity: self.physics_intensity.min(MAX_LEVEL),
        }
    }

    /// Level for one capability.
    pub fn level(&self, capability: Capability) -> u8 {
        match capability {
            Capability::Density => self.particle_density,
            Capability::Speed => self.animation_speed,
            Capability::Intensity => self.physics_intensity,
        }
    }

    /// Same snapshot with one level moved by `delta`, clamped.
    pub fn adjusted(self, capability: Capability, delta: i32) -> Self {
        let mut next = self;
        let value = clamp_level(self.level(capability) as i32 + delta);
        match capability {
            Capability::Density => next.particle_density = value,
            Capability::Speed => next.animation_speed = value,
            Capability::Intensity => next.physics_intensity = value,
        }
        next
    }
}

/// Clamp an arbitrary integer into `0..=100`.
pub fn clamp_level(value: i32) -> u8 {
    value.clamp(0, MAX_LEVEL as i32) as u8
}

/// Map a level linearly onto `min..=max`. Levels above 100 are clamped.
pub fn map_level(level: u8, min: f32, max: f32) -> f32 {
    let t = level.min(MAX_LEVEL) as f32 / MAX_LEVEL as f32;
    min + (max - min) * t
}
