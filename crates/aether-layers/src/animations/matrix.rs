//! Digital rain (stateful).

use aether_core::{LayerKind, map_level};
use aether_runtime::{
    AnimationLayer, DensityControl, EventKind, FrameHandle, FrameLoop, HostEvent, LayerContext,
    LayerState, Result, SpeedControl, SubscriptionId, Subscriptions, SurfaceSize,
};
use glam::Vec2;
use tracing::{debug, info};

use crate::chars::random_rain_char;
use crate::color::RAIN_GREEN;

const DEFAULT_FONT_SIZE: f32 = 16.0;
const DEFAULT_FADE: f32 = 0.05;
const MIN_FONT_SIZE: f32 = 8.0;
const MAX_FONT_SIZE: f32 = 20.0;
/// Chance per frame that a column below the bottom edge restarts.
const RESET_CHANCE: f32 = 0.01;

/// Font size for a density level; denser rain uses smaller glyphs.
pub fn font_size_for(level: u8) -> f32 {
    map_level(level, MAX_FONT_SIZE, MIN_FONT_SIZE).round()
}

/// Trail fade for a speed level.
pub fn fade_for(level: u8) -> f32 {
    map_level(level, 0.01, 0.2).clamp(0.01, 0.2)
}

/// State for a single rain column.
#[derive(Debug, Clone, PartialEq)]
pub struct RainColumn {
    /// Current y position of the drop head, in pixels.
    pub y: f32,
}

/// One column per `font_size` pixels of width, all starting at the top.
pub fn init_columns(width: f32, font_size: f32) -> Vec<RainColumn> {
    let count = (width / font_size).floor().max(0.0) as usize;
    vec![RainColumn { y: 0.0 }; count]
}

/// Advance every column by one glyph; columns past the bottom restart at
/// random so streams stay staggered.
pub fn update(columns: &mut [RainColumn], height: f32, font_size: f32, rng: &mut fastrand::Rng) {
    for col in columns {
        if col.y > height && rng.f32() < RESET_CHANCE {
            col.y = 0.0;
        } else {
            col.y += font_size;
        }
    }
}

/// Falling glyph columns with fading trails.
pub struct DigitalRainField {
    state: LayerState,
    frames: FrameLoop,
    subscriptions: Subscriptions,
    columns: Vec<RainColumn>,
    font_size: f32,
    fade: f32,
    size: SurfaceSize,
    rng: fastrand::Rng,
}

impl Default for DigitalRainField {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalRainField {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            state: LayerState::Uninitialized,
            frames: FrameLoop::new(),
            subscriptions: Subscriptions::new(),
            columns: Vec::new(),
            font_size: DEFAULT_FONT_SIZE,
            fade: DEFAULT_FADE,
            size: SurfaceSize::default(),
            rng,
        }
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn fade(&self) -> f32 {
        self.fade
    }

    pub fn columns(&self) -> &[RainColumn] {
        &self.columns
    }

    fn layout(&mut self) {
        self.columns = init_columns(self.size.width, self.font_size);
    }
}

impl AnimationLayer for DigitalRainField {
    fn kind(&self) -> LayerKind {
        LayerKind::MatrixRain
    }

    fn state(&self) -> LayerState {
        self.state
    }

    fn init(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        self.size = ctx.surface.size();
        self.layout();
        ctx.surface.clear();

        self.subscriptions
            .subscribe(ctx.events, ctx.slot, EventKind::Resize);
        self.frames.start(ctx.scheduler, ctx.slot);
        self.state = LayerState::Running;
        info!(columns = self.columns.len(), "digital rain initialized");
        Ok(())
    }

    fn on_frame(&mut self, handle: FrameHandle, ctx: &mut LayerContext<'_>) {
        if !self.frames.begin(handle) {
            return;
        }

        ctx.surface.fade(self.fade);
        for (index, col) in self.columns.iter().enumerate() {
            let glyph = random_rain_char(&mut self.rng);
            let at = Vec2::new(index as f32 * self.font_size, col.y);
            ctx.surface.draw_glyph(at, glyph, RAIN_GREEN);
        }
        update(&mut self.columns, self.size.height, self.font_size, &mut self.rng);

        self.frames.reschedule(ctx.scheduler, ctx.slot);
    }

    fn on_event(&mut self, subscription: SubscriptionId, event: &HostEvent, ctx: &mut LayerContext<'_>) {
        if !self.subscriptions.owns(subscription) {
            return;
        }
        if let HostEvent::Resized(size) = *event {
            self.size = size;
            self.layout();
            ctx.surface.clear();
        }
    }

    fn destroy(&mut self, ctx: &mut LayerContext<'_>) {
        self.frames.cancel(ctx.scheduler);
        self.subscriptions.release(ctx.events);
        self.columns.clear();
        if self.state != LayerState::Destroyed {
            ctx.surface.clear();
            info!("digital rain destroyed");
        }
        self.state = LayerState::Destroyed;
    }

    fn density_control(&mut self) -> Option<&mut dyn DensityControl> {
        Some(self)
    }

    fn speed_control(&mut self) -> Option<&mut dyn SpeedControl> {
        Some(self)
    }
}

impl DensityControl for DigitalRainField {
    fn set_particle_density(&mut self, level: u8) {
        self.font_size = font_size_for(level);
        debug!(level, font_size = self.font_size, "rain density set");
        if self.state == LayerState::Running {
            self.layout();
        }
    }
}

impl SpeedControl for DigitalRainField {
    fn set_animation_speed(&mut self, level: u8) {
        self.fade = fade_for(level);
        debug!(level, fade = self.fade, "rain speed set");
    }
}

#[cfg(test)]
mod tests {
    use aether_runtime::Surface;

    use super::*;
    use crate::testing::Harness;

    #[test]
    fn test_font_size_mapping() {
        assert_eq!(font_size_for(0), 20.0);
        assert_eq!(font_size_for(50), 14.0);
        assert_eq!(font_size_for(100), 8.0);
    }

    #[test]
    fn test_fade_mapping() {
        assert!((fade_for(0) - 0.01).abs() < 1e-6);
        assert!((fade_for(100) - 0.2).abs() < 1e-6);
        assert!((fade_for(50) - 0.105).abs() < 1e-6);
    }

    #[test]
    fn test_init_columns() {
        assert_eq!(init_columns(100.0, 16.0).len(), 6);
        assert!(init_columns(10.0, 16.0).is_empty());
    }

    #[test]
    fn test_update_advances_and_resets() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut columns = vec![RainColumn { y: 0.0 }, RainColumn { y: 200.0 }];
        update(&mut columns, 100.0, 10.0, &mut rng);
        assert_eq!(columns[0].y, 10.0);

        // A column below the edge keeps falling until a reset is rolled.
        let mut reset = false;
        for _ in 0..2000 {
            update(&mut columns[1..], 100.0, 10.0, &mut rng);
            if columns[1].y == 0.0 {
                reset = true;
                break;
            }
        }
        assert!(reset);
    }

    #[test]
    fn test_frame_draws_one_glyph_per_column() {
        let mut harness = Harness::new(160.0, 320.0);
        let mut rain = DigitalRainField::with_rng(fastrand::Rng::with_seed(5));
        rain.init(&mut harness.ctx()).unwrap();

        harness.frame(&mut rain);
        assert_eq!(harness.surface.glyphs.len(), 10);
        assert_eq!(harness.surface.fades, 1);
        assert!(rain.columns().iter().all(|c| c.y == 16.0));
    }

    #[test]
    fn test_density_relayouts_columns() {
        let mut harness = Harness::new(160.0, 320.0);
        let mut rain = DigitalRainField::new();
        rain.init(&mut harness.ctx()).unwrap();
        rain.set_particle_density(100);
        assert_eq!(rain.font_size(), 8.0);
        assert_eq!(rain.columns().len(), 20);
    }

    #[test]
    fn test_resize_relayouts_columns() {
        let mut harness = Harness::new(160.0, 320.0);
        let mut rain = DigitalRainField::new();
        rain.init(&mut harness.ctx()).unwrap();
        harness.send(&mut rain, HostEvent::Resized(SurfaceSize::new(320.0, 100.0)));
        assert_eq!(rain.columns().len(), 20);
        assert_eq!(harness.surface.size(), SurfaceSize::new(320.0, 100.0));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut harness = Harness::new(160.0, 320.0);
        let mut rain = DigitalRainField::new();
        rain.init(&mut harness.ctx()).unwrap();
        harness.frame(&mut rain);
        rain.destroy(&mut harness.ctx());
        rain.destroy(&mut harness.ctx());
        assert!(harness.is_released());
        assert_eq!(rain.state(), LayerState::Destroyed);
    }
}
