//! Slots, layer kinds and the external engines they depend on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two mutually exclusive layer positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Foreground,
    Background,
}

impl Slot {
    /// Both slots, background first (drawing order).
    pub const ALL: [Slot; 2] = [Slot::Background, Slot::Foreground];

    /// Stable index for slot-keyed arrays.
    pub const fn index(self) -> usize {
        match self {
            Slot::Foreground => 0,
            Slot::Background => 1,
        }
    }

    /// Display name for the slot.
    pub const fn name(self) -> &'static str {
        match self {
            Slot::Foreground => "foreground",
            Slot::Background => "background",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An external engine a layer variant needs in order to be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Rigid-body physics.
    Physics,
    /// 3D scene graph with perspective projection.
    Scene,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Physics => f.write_str("physics"),
            Engine::Scene => f.write_str("scene"),
        }
    }
}

/// The set of engines available to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSet {
    pub physics: bool,
    pub scene: bool,
}

impl EngineSet {
    /// Every engine available.
    pub const ALL: Self = Self {
        physics: true,
        scene: true,
    };

    /// No engine available.
    pub const NONE: Self = Self {
        physics: false,
        scene: false,
    };

    /// Whether the given engine is available.
    pub const fn has(&self, engine: Engine) -> bool {
        match engine {
            Engine::Physics => self.physics,
            Engine::Scene => self.scene,
        }
    }

    /// Engines available in both sets.
    pub const fn intersect(self, other: Self) -> Self {
        Self {
            physics: self.physics && other.physics,
            scene: self.scene && other.scene,
        }
    }
}

impl Default for EngineSet {
    fn default() -> Self {
        Self::ALL
    }
}

/// Selectable layer variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Empty slot.
    #[default]
    None,
    /// Rigid-body particle field with attraction/repulsion forces.
    #[serde(alias = "physics")]
    Particles,
    /// Falling glyph columns.
    #[serde(alias = "matrix")]
    MatrixRain,
    /// Rotating 3D starfield with nebulae.
    Starfield,
    /// Sun and planets on orbital pivots.
    #[serde(alias = "universe")]
    Orbital,
    /// Pointer-reactive node grid with sparks.
    #[serde(alias = "codebreaker")]
    NodeGrid,
}

impl LayerKind {
    /// Every kind in cycling order.
    pub const ALL: [LayerKind; 6] = [
        LayerKind::None,
        LayerKind::Particles,
        LayerKind::MatrixRain,
        LayerKind::Starfield,
        LayerKind::Orbital,
        LayerKind::NodeGrid,
    ];

    /// Cycle to the next kind.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// The engine this kind cannot be constructed without.
    pub const fn required_engine(self) -> Option<Engine> {
        match self {
            LayerKind::Particles => Some(Engine::Physics),
            LayerKind::Starfield | LayerKind::Orbital => Some(Engine::Scene),
            LayerKind::None | LayerKind::MatrixRain | LayerKind::NodeGrid => None,
        }
    }

    /// Display name for this kind.
    pub const fn name(self) -> &'static str {
        match self {
            LayerKind::None => "none",
            LayerKind::Particles => "particles",
            LayerKind::MatrixRain => "matrix rain",
            LayerKind::Starfield => "starfield",
            LayerKind::Orbital => "orbital",
            LayerKind::NodeGrid => "node grid",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
