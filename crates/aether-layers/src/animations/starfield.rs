//! Rotating starfield with pulsing wireframe nebulae.

use std::time::Duration;

use aether_core::{Engine, LayerKind, Rgba, map_level};
use aether_runtime::{
    AnimationLayer, DensityControl, EventKind, FrameHandle, FrameLoop, HostEvent, LayerContext,
    LayerError, LayerState, Result, SpeedControl, SubscriptionId, Subscriptions, Surface,
    SurfaceSize,
};
use glam::{Vec2, Vec3};
use tracing::{debug, info};

use crate::color::{CYAN, STAR_COLORS};
use crate::scene::{Camera, NodeId, Projector, Scene, Transform, wireframe_sphere};

const DEFAULT_STAR_COUNT: usize = 1000;
const FIELD_EXTENT: f32 = 1000.0;
const STAR_SIZE: f32 = 2.0;
const STAR_OPACITY: f32 = 0.8;
const NEBULA_COUNT: usize = 5;
const NEBULA_OPACITY: f32 = 0.03;
const STAR_SPIN: Vec2 = Vec2::new(0.0005, 0.0003);
const NEBULA_SPIN: Vec2 = Vec2::new(0.0002, 0.0003);

/// Star count for a density level.
pub fn star_count_for(level: u8) -> usize {
    map_level(level, 200.0, 2000.0).round() as usize
}

/// Rotation multiplier for a speed level.
pub fn spin_for(level: u8) -> f32 {
    map_level(level, 0.1, 2.0)
}

#[derive(Debug, Clone)]
struct Star {
    position: Vec3,
    color: Rgba,
}

#[derive(Debug, Clone)]
struct Nebula {
    node: NodeId,
    radius: f32,
}

/// Slowly turning cloud of stars seen from just in front of the origin.
pub struct StarfieldRenderer {
    state: LayerState,
    frames: FrameLoop,
    subscriptions: Subscriptions,
    scene: Option<Scene>,
    stars_node: Option<NodeId>,
    stars: Vec<Star>,
    nebulae: Vec<Nebula>,
    outline: Vec<(Vec3, Vec3)>,
    star_count: usize,
    spin: f32,
    size: SurfaceSize,
    started: Option<Duration>,
    rng: fastrand::Rng,
}

impl Default for StarfieldRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StarfieldRenderer {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            state: LayerState::Uninitialized,
            frames: FrameLoop::new(),
            subscriptions: Subscriptions::new(),
            scene: None,
            stars_node: None,
            stars: Vec::new(),
            nebulae: Vec::new(),
            outline: wireframe_sphere(6, 4, 24),
            star_count: DEFAULT_STAR_COUNT,
            spin: 1.0,
            size: SurfaceSize::default(),
            started: None,
            rng,
        }
    }

    pub fn star_count(&self) -> usize {
        self.stars.len()
    }

    pub fn spin(&self) -> f32 {
        self.spin
    }

    fn random_in_cube(&mut self, extent: f32) -> Vec3 {
        Vec3::new(
            (self.rng.f32() - 0.5) * extent,
            (self.rng.f32() - 0.5) * extent,
            (self.rng.f32() - 0.5) * extent,
        )
    }

    fn generate_stars(&mut self) {
        self.stars = (0..self.star_count)
            .map(|_| Star {
                position: self.random_in_cube(2.0 * FIELD_EXTENT),
                color: STAR_COLORS[self.rng.usize(..STAR_COLORS.len())],
            })
            .collect();
    }

    fn build_scene(&mut self) {
        let mut scene = Scene::new(Camera::new(Vec3::new(0.0, 0.0, 5.0), 75.0, 0.1, 1000.0));
        self.stars_node = Some(scene.add(None, Transform::default()));

        self.nebulae = (0..NEBULA_COUNT)
            .map(|_| {
                let radius = 100.0 + self.rng.f32() * 300.0;
                let mut transform = Transform::at(self.random_in_cube(FIELD_EXTENT));
                transform.scale = radius;
                Nebula {
                    node: scene.add(None, transform),
                    radius,
                }
            })
            .collect();

        self.scene = Some(scene);
        self.generate_stars();
    }

    fn update(&mut self, elapsed: f32) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        if let Some(transform) = self.stars_node.and_then(|id| scene.transform_mut(id)) {
            transform.rotation.x += STAR_SPIN.x * self.spin;
            transform.rotation.y += STAR_SPIN.y * self.spin;
        }

        let pulse = (elapsed * 0.2).sin() * 0.05 + 1.0;
        for nebula in &self.nebulae {
            if let Some(transform) = scene.transform_mut(nebula.node) {
                transform.rotation.x += NEBULA_SPIN.x * self.spin;
                transform.rotation.y += NEBULA_SPIN.y * self.spin;
                transform.scale = nebula.radius * pulse;
            }
        }

        scene.camera.position.x = (elapsed * 0.1).sin() * 0.2;
        scene.camera.position.y = (elapsed * 0.1).cos() * 0.1;
    }

    fn render(&self, surface: &mut dyn Surface) {
        let (Some(scene), Some(stars_node)) = (self.scene.as_ref(), self.stars_node) else {
            return;
        };
        surface.clear();
        let projector: Projector = scene.projector(self.size);

        let nebula_color = CYAN.with_alpha(NEBULA_OPACITY);
        for nebula in &self.nebulae {
            let matrix = scene.world_matrix(nebula.node);
            for (a, b) in &self.outline {
                let from = projector.project(matrix.transform_point3(*a));
                let to = projector.project(matrix.transform_point3(*b));
                if let (Some(from), Some(to)) = (from, to) {
                    surface.stroke_line(from.screen, to.screen, nebula_color);
                }
            }
        }

        let matrix = scene.world_matrix(stars_node);
        for star in &self.stars {
            if let Some(point) = projector.project(matrix.transform_point3(star.position)) {
                let radius = (STAR_SIZE / 2.0 * point.scale).max(0.5);
                surface.fill_circle(point.screen, radius, star.color.with_alpha(STAR_OPACITY));
            }
        }
    }
}

impl AnimationLayer for StarfieldRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::Starfield
    }

    fn state(&self) -> LayerState {
        self.state
    }

    fn init(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        if !ctx.engines.has(Engine::Scene) {
            return Err(LayerError::MissingDependency {
                kind: LayerKind::Starfield,
                engine: Engine::Scene,
            });
        }

        self.size = ctx.surface.size();
        self.build_scene();
        self.subscriptions
            .subscribe(ctx.events, ctx.slot, EventKind::Resize);
        self.frames.start(ctx.scheduler, ctx.slot);
        self.state = LayerState::Running;
        info!(stars = self.stars.len(), "starfield initialized");
        Ok(())
    }

    fn on_frame(&mut self, handle: FrameHandle, ctx: &mut LayerContext<'_>) {
        if !self.frames.begin(handle) {
            return;
        }
        let started = *self.started.get_or_insert(ctx.now);
        self.update(ctx.now.saturating_sub(started).as_secs_f32());
        self.render(ctx.surface);
        self.frames.reschedule(ctx.scheduler, ctx.slot);
    }

    fn on_event(&mut self, subscription: SubscriptionId, event: &HostEvent, _ctx: &mut LayerContext<'_>) {
        if self.subscriptions.owns(subscription)
            && let HostEvent::Resized(size) = *event
        {
            self.size = size;
        }
    }

    fn destroy(&mut self, ctx: &mut LayerContext<'_>) {
        self.frames.cancel(ctx.scheduler);
        self.subscriptions.release(ctx.events);
        if let Some(scene) = self.scene.as_mut() {
            scene.clear();
        }
        self.scene = None;
        self.stars_node = None;
        self.stars.clear();
        self.nebulae.clear();
        self.started = None;
        if self.state != LayerState::Destroyed {
            ctx.surface.clear();
            info!("starfield destroyed");
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

impl DensityControl for StarfieldRenderer {
    fn set_particle_density(&mut self, level: u8) {
        self.star_count = star_count_for(level);
        debug!(level, stars = self.star_count, "starfield density set");
        if self.scene.is_some() {
            self.generate_stars();
        }
    }
}

impl SpeedControl for StarfieldRenderer {
    fn set_animation_speed(&mut self, level: u8) {
        self.spin = spin_for(level);
        debug!(level, spin = self.spin, "starfield speed set");
    }
}

#[cfg(test)]
mod tests {
    use aether_core::{Capability, EngineSet};

    use super::*;
    use crate::testing::Harness;

    fn running(harness: &mut Harness) -> StarfieldRenderer {
        let mut field = StarfieldRenderer::with_rng(fastrand::Rng::with_seed(21));
        field.init(&mut harness.ctx()).unwrap();
        field
    }

    #[test]
    fn test_level_mappings() {
        assert_eq!(star_count_for(0), 200);
        assert_eq!(star_count_for(50), 1100);
        assert_eq!(star_count_for(100), 2000);
        assert!((spin_for(0) - 0.1).abs() < 1e-6);
        assert!((spin_for(100) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_init_builds_field() {
        let mut harness = Harness::new(800.0, 600.0);
        let field = running(&mut harness);
        assert_eq!(field.star_count(), 1000);
        assert_eq!(field.nebulae.len(), 5);
        for nebula in &field.nebulae {
            assert!((100.0..=400.0).contains(&nebula.radius));
        }
    }

    #[test]
    fn test_frame_draws_and_spins() {
        let mut harness = Harness::new(800.0, 600.0);
        let mut field = running(&mut harness);
        field.set_animation_speed(100);

        harness.frame(&mut field);
        assert!(!harness.surface.circles.is_empty());

        let scene = field.scene.as_ref().unwrap();
        let rotation = scene.transform(field.stars_node.unwrap()).unwrap().rotation;
        assert!((rotation.x - 0.001).abs() < 1e-7);
        assert!((rotation.y - 0.0006).abs() < 1e-7);
    }

    #[test]
    fn test_density_regenerates_stars() {
        let mut harness = Harness::new(800.0, 600.0);
        let mut field = running(&mut harness);
        field.set_particle_density(0);
        assert_eq!(field.star_count(), 200);
        assert!(!field.supports(Capability::Intensity));
    }

    #[test]
    fn test_requires_scene_engine() {
        let engines = EngineSet {
            physics: true,
            scene: false,
        };
        let mut harness = Harness::with_engines(engines, 800.0, 600.0);
        let mut field = StarfieldRenderer::new();
        assert!(field.init(&mut harness.ctx()).is_err());
        assert!(harness.is_released());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut harness = Harness::new(800.0, 600.0);
        let mut field = running(&mut harness);
        harness.frame(&mut field);
        field.destroy(&mut harness.ctx());
        field.destroy(&mut harness.ctx());
        assert!(harness.is_released());
        assert_eq!(field.star_count(), 0);
    }
}
