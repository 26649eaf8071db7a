//! Color utilities for drawing surfaces.

use serde::{Deserialize, Serialize};

/// An 8-bit RGB color with a floating point opacity in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0.0);

    /// Create a color, clamping the opacity.
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        let a = if a < 0.0 {
            0.0
        } else if a > 1.0 {
            1.0
        } else {
            a
        };
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same color with a different opacity.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Whether nothing would be visible when drawing with this color.
    pub fn is_transparent(&self) -> bool {
        self.a <= f32::EPSILON
    }

    /// Color premultiplied against a black backdrop.
    pub fn premultiplied(&self) -> (u8, u8, u8) {
        let scale = |c: u8| (c as f32 * self.a).round() as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Convert HSL (hue in degrees, saturation and lightness in `0.0..=1.0`)
/// to an opaque color.
pub fn hsl_to_rgba(h: f32, s: f32, l: f32) -> Rgba {
    if s == 0.0 {
        let v = (l * 255.0) as u8;
        return Rgba::rgb(v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    let h = h.rem_euclid(360.0) / 360.0;

    let r = hue_to_channel(p, q, h + 1.0 / 3.0);
    let g = hue_to_channel(p, q, h);
    let b = hue_to_channel(p, q, h - 1.0 / 3.0);

    Rgba::rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primary_hues() {
        assert_eq!(hsl_to_rgba(0.0, 1.0, 0.5), Rgba::rgb(255, 0, 0));
        assert_eq!(hsl_to_rgba(120.0, 1.0, 0.5), Rgba::rgb(0, 255, 0));
        assert_eq!(hsl_to_rgba(240.0, 1.0, 0.5), Rgba::rgb(0, 0, 255));
    }

    #[test]
    fn test_hsl_grayscale() {
        assert_eq!(hsl_to_rgba(200.0, 0.0, 0.5), Rgba::rgb(127, 127, 127));
    }

    #[test]
    fn test_alpha_is_clamped() {
        assert_eq!(Rgba::new(1, 2, 3, 4.0).a, 1.0);
        assert_eq!(Rgba::rgb(1, 2, 3).with_alpha(-1.0).a, 0.0);
        assert!(Rgba::TRANSPARENT.is_transparent());
    }

    #[test]
    fn test_premultiplied() {
        assert_eq!(Rgba::new(200, 100, 0, 0.5).premultiplied(), (100, 50, 0));
    }
}
