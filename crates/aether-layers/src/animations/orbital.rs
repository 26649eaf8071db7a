//! Orbital system: a sun, six planets on tilted pivots and a sparse sky.
//!
//! The pointer acts as a joystick. Its offset from the surface center,
//! outside a small dead zone, flies the camera around the sun.

use std::time::Duration;

use aether_core::{CameraState, Engine, LayerKind, Rgba, map_level};
use aether_runtime::{
    AnimationLayer, CameraControl, EventKind, FrameHandle, FrameLoop, HostEvent, IntensityControl, LayerContext,
    LayerError, LayerState, Result, SpeedControl, SubscriptionId, Subscriptions, Surface,
    SurfaceSize,
};
use glam::{Vec2, Vec3};
use tracing::{debug, info};

use crate::scene::{Camera, NodeId, Scene, Transform};

const SUN_RADIUS: f32 = 5.0;
const SUN_COLOR: Rgba = Rgba::rgb(255, 200, 64);
const RING_COLOR: Rgba = Rgba::new(210, 190, 150, 0.6);
const SKY_RADIUS: f32 = 1000.0;
const SKY_STARS: usize = 150;
const DEAD_ZONE: f32 = 0.1;
/// Closest the camera may fly to the sun.
const MIN_CAMERA_DISTANCE: f32 = 12.0;
/// Longest frame gap fed into the orbit integration.
const MAX_DELTA: f32 = 0.1;
const RING_SEGMENTS: usize = 48;

/// Static description of one planet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetSpec {
    pub name: &'static str,
    pub size: f32,
    pub distance: f32,
    pub speed: f32,
    pub color: Rgba,
    pub rings: bool,
}

pub const PLANETS: [PlanetSpec; 6] = [
    PlanetSpec {
        name: "mercury",
        size: 0.8,
        distance: 10.0,
        speed: 0.1,
        color: Rgba::rgb(169, 169, 169),
        rings: false,
    },
    PlanetSpec {
        name: "venus",
        size: 1.2,
        distance: 16.0,
        speed: 0.07,
        color: Rgba::rgb(230, 190, 120),
        rings: false,
    },
    PlanetSpec {
        name: "earth",
        size: 1.3,
        distance: 24.0,
        speed: 0.05,
        color: Rgba::rgb(70, 130, 220),
        rings: false,
    },
    PlanetSpec {
        name: "mars",
        size: 1.0,
        distance: 35.0,
        speed: 0.04,
        color: Rgba::rgb(200, 80, 50),
        rings: false,
    },
    PlanetSpec {
        name: "jupiter",
        size: 3.5,
        distance: 60.0,
        speed: 0.02,
        color: Rgba::rgb(210, 170, 120),
        rings: false,
    },
    PlanetSpec {
        name: "saturn",
        size: 3.0,
        distance: 90.0,
        speed: 0.015,
        color: Rgba::rgb(220, 200, 150),
        rings: true,
    },
];

/// Orbit speed multiplier for a speed level.
pub fn speed_factor_for(level: u8) -> f32 {
    map_level(level, 0.5, 3.0)
}

/// Camera fly speed for an intensity level.
pub fn move_speed_for(level: u8) -> f32 {
    map_level(level, 0.2, 1.5)
}

/// Normalized joystick deflection for a pointer, or `None` inside the
/// dead zone.
pub fn joystick(pointer: Vec2, size: SurfaceSize) -> Option<Vec2> {
    let center = size.center();
    if center.x <= 0.0 || center.y <= 0.0 {
        return None;
    }
    let offset = ((pointer - center) / center).clamp(Vec2::NEG_ONE, Vec2::ONE);
    (offset.x.abs() > DEAD_ZONE || offset.y.abs() > DEAD_ZONE).then_some(offset)
}

#[derive(Debug, Clone)]
struct Planet {
    spec: PlanetSpec,
    pivot: NodeId,
    body: NodeId,
}

/// Sun-centered planetary system viewed through a steerable camera.
pub struct OrbitalSystemRenderer {
    state: LayerState,
    frames: FrameLoop,
    subscriptions: Subscriptions,
    scene: Option<Scene>,
    sun: Option<NodeId>,
    sky: Option<NodeId>,
    sky_stars: Vec<Vec3>,
    planets: Vec<Planet>,
    speed_factor: f32,
    move_speed: f32,
    pointer: Option<Vec2>,
    size: SurfaceSize,
    last_frame: Option<Duration>,
    rng: fastrand::Rng,
}

impl Default for OrbitalSystemRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitalSystemRenderer {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            state: LayerState::Uninitialized,
            frames: FrameLoop::new(),
            subscriptions: Subscriptions::new(),
            scene: None,
            sun: None,
            sky: None,
            sky_stars: Vec::new(),
            planets: Vec::new(),
            speed_factor: 1.0,
            move_speed: 0.5,
            pointer: None,
            size: SurfaceSize::default(),
            last_frame: None,
            rng,
        }
    }

    pub fn camera_position(&self) -> Option<Vec3> {
        self.scene.as_ref().map(|scene| scene.camera.position)
    }

    fn build_scene(&mut self) {
        let mut scene = Scene::new(Camera::new(Vec3::new(0.0, 20.0, 70.0), 60.0, 0.1, 5000.0));
        self.sky = Some(scene.add(None, Transform::default()));
        self.sun = Some(scene.add(None, Transform::default()));

        self.sky_stars = (0..SKY_STARS)
            .map(|_| {
                let direction = Vec3::new(
                    self.rng.f32() * 2.0 - 1.0,
                    self.rng.f32() * 2.0 - 1.0,
                    self.rng.f32() * 2.0 - 1.0,
                );
                direction.normalize_or(Vec3::Y) * SKY_RADIUS
            })
            .collect();

        self.planets = PLANETS
            .iter()
            .map(|spec| {
                let mut pivot_transform = Transform::default();
                pivot_transform.rotation.y = self.rng.f32() * std::f32::consts::TAU;
                pivot_transform.rotation.x = (self.rng.f32() - 0.5) * 0.05;
                let pivot = scene.add(None, pivot_transform);
                let body = scene.add(
                    Some(pivot),
                    Transform::at(Vec3::new(spec.distance, 0.0, 0.0)),
                );
                Planet {
                    spec: *spec,
                    pivot,
                    body,
                }
            })
            .collect();

        self.scene = Some(scene);
    }

    fn update(&mut self, delta: f32) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        for planet in &self.planets {
            if let Some(pivot) = scene.transform_mut(planet.pivot) {
                pivot.rotation.y += planet.spec.speed * delta * 2.0 * self.speed_factor;
            }
            if let Some(body) = scene.transform_mut(planet.body) {
                body.rotation.y += delta * 0.1;
            }
        }
        if let Some(sun) = self.sun.and_then(|id| scene.transform_mut(id)) {
            sun.rotation.y += delta * 0.01;
        }
        if let Some(sky) = self.sky.and_then(|id| scene.transform_mut(id)) {
            sky.rotation.y += delta * 0.002;
        }

        if let Some(stick) = self.pointer.and_then(|p| joystick(p, self.size)) {
            let camera = &mut scene.camera;
            let movement = camera.forward() * (-stick.y * self.move_speed)
                + camera.right() * (stick.x * self.move_speed);
            let next = camera.position + movement;
            if next.distance(camera.target) >= MIN_CAMERA_DISTANCE {
                camera.position = next;
            }
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        surface.clear();
        let projector = scene.projector(self.size);

        if let Some(sky) = self.sky {
            let matrix = scene.world_matrix(sky);
            for star in &self.sky_stars {
                if let Some(point) = projector.project(matrix.transform_point3(*star)) {
                    surface.fill_circle(point.screen, 0.5, Rgba::new(255, 255, 255, 0.7));
                }
            }
        }

        // Farthest first so nearer bodies cover them.
        let mut bodies: Vec<(f32, Vec2, f32, &Planet)> = self
            .planets
            .iter()
            .filter_map(|planet| {
                let center = scene.world_position(planet.body);
                let point = projector.project(center)?;
                Some((point.depth, point.screen, planet.spec.size * point.scale, planet))
            })
            .collect();
        bodies.sort_by(|a, b| b.0.total_cmp(&a.0));

        if let Some(point) = self.sun.and_then(|id| projector.project(scene.world_position(id))) {
            let radius = SUN_RADIUS * point.scale;
            surface.fill_glow(point.screen, radius * 2.0, SUN_COLOR.with_alpha(0.5));
            surface.fill_circle(point.screen, radius, SUN_COLOR);
        }

        for (_, screen, radius, planet) in bodies {
            surface.fill_circle(screen, radius.max(0.5), planet.spec.color);
            if planet.spec.rings {
                let matrix = scene.world_matrix(planet.body);
                for factor in [1.2, 2.2] {
                    let ring = planet.spec.size * factor;
                    let step = std::f32::consts::TAU / RING_SEGMENTS as f32;
                    for s in 0..RING_SEGMENTS {
                        let (a, b) = (s as f32 * step, (s + 1) as f32 * step);
                        let from = Vec3::new(a.cos() * ring, 0.0, a.sin() * ring);
                        let to = Vec3::new(b.cos() * ring, 0.0, b.sin() * ring);
                        let from = projector.project(matrix.transform_point3(from));
                        let to = projector.project(matrix.transform_point3(to));
                        if let (Some(from), Some(to)) = (from, to) {
                            surface.stroke_line(from.screen, to.screen, RING_COLOR);
                        }
                    }
                }
            }
        }
    }
}

impl AnimationLayer for OrbitalSystemRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::Orbital
    }

    fn state(&self) -> LayerState {
        self.state
    }

    fn init(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        if !ctx.engines.has(Engine::Scene) {
            return Err(LayerError::MissingDependency {
                kind: LayerKind::Orbital,
                engine: Engine::Scene,
            });
        }

        self.size = ctx.surface.size();
        self.pointer = ctx.input.pointer;
        self.build_scene();
        for kind in [EventKind::PointerMove, EventKind::PointerLeave, EventKind::Resize] {
            self.subscriptions.subscribe(ctx.events, ctx.slot, kind);
        }
        self.frames.start(ctx.scheduler, ctx.slot);
        self.state = LayerState::Running;
        info!(planets = self.planets.len(), "orbital system initialized");
        Ok(())
    }

    fn on_frame(&mut self, handle: FrameHandle, ctx: &mut LayerContext<'_>) {
        if !self.frames.begin(handle) {
            return;
        }
        let delta = self
            .last_frame
            .replace(ctx.now)
            .map_or(0.0, |last| ctx.now.saturating_sub(last).as_secs_f32())
            .min(MAX_DELTA);
        self.update(delta);
        self.render(ctx.surface);
        self.frames.reschedule(ctx.scheduler, ctx.slot);
    }

    fn on_event(&mut self, subscription: SubscriptionId, event: &HostEvent, _ctx: &mut LayerContext<'_>) {
        if !self.subscriptions.owns(subscription) {
            return;
        }
        match *event {
            HostEvent::PointerMoved(position) => self.pointer = Some(position),
            HostEvent::PointerLeft => self.pointer = None,
            HostEvent::PointerPressed(_) | HostEvent::PointerReleased => {}
            HostEvent::Resized(size) => self.size = size,
        }
    }

    fn destroy(&mut self, ctx: &mut LayerContext<'_>) {
        self.frames.cancel(ctx.scheduler);
        self.subscriptions.release(ctx.events);
        self.scene = None;
        self.sun = None;
        self.sky = None;
        self.sky_stars.clear();
        self.planets.clear();
        self.pointer = None;
        self.last_frame = None;
        if self.state != LayerState::Destroyed {
            ctx.surface.clear();
            info!("orbital system destroyed");
        }
        self.state = LayerState::Destroyed;
    }

    fn speed_control(&mut self) -> Option<&mut dyn SpeedControl> {
        Some(self)
    }

    fn intensity_control(&mut self) -> Option<&mut dyn IntensityControl> {
        Some(self)
    }

    fn camera_control(&mut self) -> Option<&mut dyn CameraControl> {
        if self.scene.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl SpeedControl for OrbitalSystemRenderer {
    fn set_animation_speed(&mut self, level: u8) {
        self.speed_factor = speed_factor_for(level);
        debug!(level, speed_factor = self.speed_factor, "orbit speed set");
    }
}

impl IntensityControl for OrbitalSystemRenderer {
    fn set_physics_intensity(&mut self, level: u8) {
        self.move_speed = move_speed_for(level);
        debug!(level, move_speed = self.move_speed, "camera move speed set");
    }
}

impl CameraControl for OrbitalSystemRenderer {
    fn camera_state(&self) -> CameraState {
        self.scene
            .as_ref()
            .map(|scene| CameraState::new(scene.camera.position, scene.camera.target))
            .unwrap_or_default()
    }

    fn set_camera_state(&mut self, state: CameraState) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        scene.camera.position = state.position();
        scene.camera.target = state.target();
        debug!(position = ?scene.camera.position, "camera moved to saved view");
    }
}
