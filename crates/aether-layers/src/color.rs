//! Shared palette.

use aether_core::{Rgba, hsl_to_rgba};

/// Accent cyan used for particle glows and connections.
pub const CYAN: Rgba = Rgba::rgb(0, 229, 255);

/// Classic rain green.
pub const RAIN_GREEN: Rgba = Rgba::rgb(0, 255, 0);

/// Idle grid node.
pub const NODE_BASE: Rgba = Rgba::new(0, 255, 255, 0.3);

/// Grid node under the pointer.
pub const NODE_ACTIVE: Rgba = Rgba::new(51, 255, 255, 0.8);

/// Grid line color; alpha is chosen per line.
pub const GRID_LINE: Rgba = Rgba::rgb(51, 255, 255);

/// Sparks thrown off by active nodes.
pub const SPARK: Rgba = Rgba::new(173, 255, 47, 0.9);

/// Star palette.
pub const STAR_COLORS: [Rgba; 4] = [
    Rgba::rgb(0xff, 0xff, 0xff),
    Rgba::rgb(0x6b, 0xf6, 0xff),
    Rgba::rgb(0x00, 0xe5, 0xff),
    Rgba::rgb(0x00, 0xff, 0xff),
];

/// Random cool particle color: hue 180..220, full saturation, light.
pub fn particle_color(rng: &mut fastrand::Rng) -> Rgba {
    hsl_to_rgba(180.0 + rng.f32() * 40.0, 1.0, 0.75)
}
