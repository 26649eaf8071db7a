//! The drawing surface contract a rendering backend satisfies.
//!
//! Coordinates are surface pixels with the origin at the top left and `y`
//! growing downward. How a backend maps pixels to output is its own
//! business; layers only speak these primitives.

use aether_core::Rgba;
use glam::Vec2;

/// Surface dimensions in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Center point of the surface.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Width over height, `1.0` for degenerate sizes.
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A drawing surface owned by one slot.
pub trait Surface {
    fn size(&self) -> SurfaceSize;

    fn resize(&mut self, size: SurfaceSize);

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Erase everything.
    fn clear(&mut self);

    /// Darken existing content by `amount` (`0.0..=1.0`), leaving trails.
    fn fade(&mut self, amount: f32);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Radial gradient from `color` at the center to transparent at `radius`.
    fn fill_glow(&mut self, center: Vec2, radius: f32, color: Rgba);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba);

    fn draw_glyph(&mut self, at: Vec2, glyph: char, color: Rgba);
}

/// Surface that records primitives instead of drawing them. Used for
/// headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: SurfaceSize,
    visible: bool,
    /// Number of `clear` calls.
    pub clears: usize,
    /// Number of `fade` calls.
    pub fades: usize,
    /// Circles drawn since the last clear.
    pub circles: Vec<(Vec2, f32, Rgba)>,
    /// Glows drawn since the last clear.
    pub glows: Vec<(Vec2, f32, Rgba)>,
    /// Lines drawn since the last clear.
    pub lines: Vec<(Vec2, Vec2, Rgba)>,
    /// Glyphs drawn since the last clear.
    pub glyphs: Vec<(Vec2, char, Rgba)>,
}

impl RecordingSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Total primitives drawn since the last clear.
    pub fn drawn(&self) -> usize {
        self.circles.len() + self.glows.len() + self.lines.len() + self.glyphs.len()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.circles.clear();
        self.glows.clear();
        self.lines.clear();
        self.glyphs.clear();
    }

    fn fade(&mut self, _amount: f32) {
        self.fades += 1;
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.circles.push((center, radius, color));
    }

    fn fill_glow(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.glows.push((center, radius, color));
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba) {
        self.lines.push((from, to, color));
    }

    fn draw_glyph(&mut self, at: Vec2, glyph: char, color: Rgba) {
        self.glyphs.push((at, glyph, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_helpers() {
        let size = SurfaceSize::new(800.0, 400.0);
        assert_eq!(size.center(), Vec2::new(400.0, 200.0));
        assert_eq!(size.aspect(), 2.0);
        assert_eq!(SurfaceSize::default().aspect(), 1.0);
        assert!(SurfaceSize::default().is_empty());
    }

    #[test]
    fn test_recording_surface_clear() {
        let mut surface = RecordingSurface::new(SurfaceSize::new(10.0, 10.0));
        surface.fill_circle(Vec2::ZERO, 1.0, Rgba::rgb(1, 1, 1));
        surface.stroke_line(Vec2::ZERO, Vec2::ONE, Rgba::rgb(1, 1, 1));
        assert_eq!(surface.drawn(), 2);

        surface.clear();
        assert_eq!(surface.drawn(), 0);
        assert_eq!(surface.clears, 1);
        assert!(!surface.is_visible());
    }
}
