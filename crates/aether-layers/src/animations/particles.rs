//! Physics-driven particle field backed by a rapier world.
//!
//! Particles are unit-mass balls, so every force constant below reads as an
//! acceleration in surface pixels per second squared. At the baseline a
//! particle 150 px from a neighbour is pulled at 350 px/s², neighbours
//! inside 100 px push apart at up to 7000 px/s², and air drag of
//! 1.2 /s caps free fall from gravity near 400 px/s.
//!
//! Pressing the pointer on a particle grabs it; the grabbed particle is
//! pulled toward the pointer each step until the button is released.

use std::time::Duration;

use aether_core::{Engine, LayerKind, Rgba, map_level};
use aether_runtime::{
    AnimationLayer, DensityControl, EventKind, FrameHandle, FrameLoop, HostEvent,
    IntensityControl, LayerContext, LayerError, LayerState, Result, SpeedControl, SubscriptionId,
    Subscriptions, Surface, SurfaceSize,
};
use glam::Vec2;
use rapier2d::prelude::*;
use tracing::{debug, info, trace};

use crate::color::{CYAN, particle_color};

/// Nominal integration step; wall-clock time only feeds diagnostics.
pub const FIXED_STEP: f32 = 1.0 / 60.0;

const MIN_PARTICLES: f32 = 5.0;
const MAX_PARTICLES: f32 = 150.0;
const PARTICLE_SIZE: f32 = 15.0;
const SIZE_JITTER: f32 = 5.0;
const INTERACTION_RADIUS: f32 = 150.0;
const ATTRACTION_RADIUS: f32 = 200.0;
const REPULSION_RADIUS: f32 = 100.0;
const CONNECTION_DISTANCE: f32 = 120.0;
const WALL_THICKNESS: f32 = 60.0;
const WALL_RESTITUTION: f32 = 0.7;
const SURFACE_FRICTION: f32 = 0.1;
const GRAVITY: f32 = 500.0;
/// Fraction of the gap to the pointer a grabbed particle closes per step.
const DRAG_STIFFNESS: f32 = 0.2;
/// Grab tolerance beyond a particle's radius, about one terminal cell.
const GRAB_SLOP: f32 = 8.0;
const PIXELS_PER_METER: f32 = 100.0;
const LATE_FRAME: Duration = Duration::from_millis(50);

/// Number of particles for a density level: `round(5 + 145 * v / 100)`.
pub fn target_count(level: u8) -> usize {
    map_level(level, MIN_PARTICLES, MAX_PARTICLES).round() as usize
}

/// Tunable physics constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub time_scale: f32,
    pub attraction_force: f32,
    pub repulsion_force: f32,
    /// Pointer pull per pixel of distance inside the interaction radius.
    pub pointer_force: f32,
    /// Fraction of velocity lost per nominal frame.
    pub friction_air: f32,
    pub restitution: f32,
}

impl PhysicsParams {
    pub const BASELINE: Self = Self {
        time_scale: 1.0,
        attraction_force: 1400.0,
        repulsion_force: 7000.0,
        pointer_force: 30.0,
        friction_air: 0.02,
        restitution: 0.9,
    };

    /// Baseline scaled by an intensity level. Level 50 is the baseline;
    /// the time scale is left untouched.
    pub fn with_intensity(self, level: u8) -> Self {
        let base = Self::BASELINE;
        let factor = level.min(100) as f32 / 50.0;
        Self {
            time_scale: self.time_scale,
            attraction_force: base.attraction_force * factor,
            repulsion_force: base.repulsion_force * factor,
            pointer_force: base.pointer_force,
            friction_air: (base.friction_air / (1.0 + 0.5 * (factor - 1.0))).max(0.001),
            restitution: (base.restitution * (1.0 + 0.1 * (factor - 1.0))).min(1.0),
        }
    }

    /// Same params with the time scale for a speed level.
    pub fn with_speed(self, level: u8) -> Self {
        Self {
            time_scale: map_level(level, 0.1, 2.0),
            ..self
        }
    }

    /// Per-second damping equivalent of the per-frame air friction.
    pub fn linear_damping(&self) -> f32 {
        self.friction_air / FIXED_STEP
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Force the particle at `a` receives from the particle at `b`. The force
/// on `b` is the exact negation.
pub fn pair_force(a: Vec2, b: Vec2, params: &PhysicsParams) -> Vec2 {
    let delta = b - a;
    let distance = delta.length();
    if distance >= ATTRACTION_RADIUS || distance <= f32::EPSILON {
        return Vec2::ZERO;
    }

    let magnitude = if distance < REPULSION_RADIUS {
        -params.repulsion_force * (1.0 - distance / REPULSION_RADIUS)
    } else {
        params.attraction_force * (1.0 - distance / ATTRACTION_RADIUS)
    };
    delta / distance * magnitude
}

/// Pull toward the pointer for a particle at `position`.
pub fn pointer_force(position: Vec2, pointer: Vec2, params: &PhysicsParams) -> Vec2 {
    let delta = pointer - position;
    let distance = delta.length();
    if distance >= INTERACTION_RADIUS || distance <= f32::EPSILON {
        return Vec2::ZERO;
    }
    delta / distance * params.pointer_force * (INTERACTION_RADIUS - distance)
}

/// Rapier pipeline plus the sets it steps.
struct ParticleWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl ParticleWorld {
    fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            gravity: vector![0.0, GRAVITY],
            integration_parameters: IntegrationParameters {
                length_unit: PIXELS_PER_METER,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn insert(&mut self, body: RigidBody, collider: Collider) -> (RigidBodyHandle, ColliderHandle) {
        let body = self.bodies.insert(body);
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        (body, collider)
    }

    /// Remove a body and its attached colliders.
    fn remove(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn position(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.bodies
            .get(handle)
            .map(|body| Vec2::new(body.translation().x, body.translation().y))
    }
}

#[derive(Debug, Clone)]
struct Particle {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    radius: f32,
    color: Rgba,
    pulse_phase: f32,
    pulse_speed: f32,
}

/// Particle field with pairwise attraction and repulsion, pointer pull and
/// boundary walls.
pub struct PhysicsParticleField {
    state: LayerState,
    frames: FrameLoop,
    subscriptions: Subscriptions,
    world: Option<ParticleWorld>,
    walls: Vec<RigidBodyHandle>,
    particles: Vec<Particle>,
    params: PhysicsParams,
    target: usize,
    pointer: Option<Vec2>,
    grabbed: Option<RigidBodyHandle>,
    size: SurfaceSize,
    last_frame: Option<Duration>,
    rng: fastrand::Rng,
}

impl Default for PhysicsParticleField {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsParticleField {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            state: LayerState::Uninitialized,
            frames: FrameLoop::new(),
            subscriptions: Subscriptions::new(),
            world: None,
            walls: Vec::new(),
            particles: Vec::new(),
            params: PhysicsParams::BASELINE,
            target: target_count(50),
            pointer: None,
            grabbed: None,
            size: SurfaceSize::default(),
            last_frame: None,
            rng,
        }
    }

    /// Live particle count.
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn params(&self) -> PhysicsParams {
        self.params
    }

    /// Particle currently held by the pointer.
    pub fn is_dragging(&self) -> bool {
        self.grabbed.is_some()
    }

    /// Bodies in the world, walls included.
    pub fn body_count(&self) -> usize {
        self.world.as_ref().map_or(0, |world| world.bodies.len())
    }

    fn rebuild_walls(&mut self) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        for wall in self.walls.drain(..) {
            world.remove(wall);
        }

        let SurfaceSize { width, height } = self.size;
        let half = WALL_THICKNESS / 2.0;
        let walls = [
            (vector![width / 2.0, -half], width / 2.0, half),
            (vector![width / 2.0, height + half], width / 2.0, half),
            (vector![-half, height / 2.0], half, height / 2.0),
            (vector![width + half, height / 2.0], half, height / 2.0),
        ];
        for (center, hx, hy) in walls {
            let body = RigidBodyBuilder::fixed().translation(center).build();
            let collider = ColliderBuilder::cuboid(hx, hy)
                .restitution(WALL_RESTITUTION)
                .friction(SURFACE_FRICTION)
                .build();
            let (handle, _) = world.insert(body, collider);
            self.walls.push(handle);
        }
    }

    /// Add or remove particles in one batch until the target is met.
    /// Removal takes the oldest particles first.
    fn adjust_particles(&mut self) {
        let Some(world) = self.world.as_mut() else {
            return;
        };

        let current = self.particles.len();
        if current > self.target {
            for particle in self.particles.drain(..current - self.target) {
                world.remove(particle.body);
            }
        } else {
            for _ in current..self.target {
                let position = vector![
                    self.rng.f32() * self.size.width,
                    self.rng.f32() * self.size.height
                ];
                let radius = PARTICLE_SIZE + (self.rng.f32() * 2.0 - 1.0) * SIZE_JITTER;
                let body = RigidBodyBuilder::dynamic()
                    .translation(position)
                    .linear_damping(self.params.linear_damping())
                    .build();
                let collider = ColliderBuilder::ball(radius)
                    .mass(1.0)
                    .restitution(self.params.restitution)
                    .friction(SURFACE_FRICTION)
                    .build();
                let (body, collider) = world.insert(body, collider);
                self.particles.push(Particle {
                    body,
                    collider,
                    radius,
                    color: particle_color(&mut self.rng),
                    pulse_phase: self.rng.f32() * std::f32::consts::TAU,
                    pulse_speed: 0.05 + self.rng.f32() * 0.05,
                });
            }
        }
        debug!(count = self.particles.len(), "particle count adjusted");
    }

    /// Grab the particle nearest to `at`, if one lies under it.
    fn grab(&mut self, at: Vec2) {
        let Some(world) = self.world.as_ref() else {
            return;
        };
        self.grabbed = self
            .particles
            .iter()
            .filter_map(|particle| {
                let distance = world.position(particle.body)?.distance(at);
                (distance <= particle.radius + GRAB_SLOP).then_some((distance, particle.body))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, body)| body);
        if self.grabbed.is_some() {
            debug!(x = at.x, y = at.y, "particle grabbed");
        }
    }

    /// Steer the grabbed particle toward the pointer.
    fn drag(&mut self) {
        let (Some(world), Some(handle), Some(pointer)) =
            (self.world.as_mut(), self.grabbed, self.pointer)
        else {
            return;
        };
        let Some(body) = world.bodies.get_mut(handle) else {
            self.grabbed = None;
            return;
        };
        let position = Vec2::new(body.translation().x, body.translation().y);
        let velocity = (pointer - position) * DRAG_STIFFNESS / FIXED_STEP;
        body.set_linvel(vector![velocity.x, velocity.y], true);
    }

    fn apply_forces(&mut self) {
        let Some(world) = self.world.as_mut() else {
            return;
        };

        let positions: Vec<Vec2> = self
            .particles
            .iter()
            .map(|p| world.position(p.body).unwrap_or(Vec2::ZERO))
            .collect();
        let mut forces = vec![Vec2::ZERO; positions.len()];

        for i in 0..positions.len() {
            if let Some(pointer) = self.pointer {
                forces[i] += pointer_force(positions[i], pointer, &self.params);
            }
            for j in i + 1..positions.len() {
                let force = pair_force(positions[i], positions[j], &self.params);
                forces[i] += force;
                forces[j] -= force;
            }
        }

        for (particle, force) in self.particles.iter().zip(forces) {
            if let Some(body) = world.bodies.get_mut(particle.body) {
                body.reset_forces(false);
                body.add_force(vector![force.x, force.y], true);
            }
        }
    }

    fn render(&mut self, surface: &mut dyn Surface) {
        let Some(world) = self.world.as_ref() else {
            return;
        };
        surface.clear();

        let positions: Vec<Vec2> = self
            .particles
            .iter()
            .map(|p| world.position(p.body).unwrap_or(Vec2::ZERO))
            .collect();

        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                let distance = a.distance(*b);
                if distance < CONNECTION_DISTANCE {
                    surface.stroke_line(*a, *b, CYAN.with_alpha(1.0 - distance / CONNECTION_DISTANCE));
                }
            }
        }

        for (particle, position) in self.particles.iter_mut().zip(positions) {
            particle.pulse_phase += particle.pulse_speed;
            let radius = particle.radius * (1.0 + 0.2 * particle.pulse_phase.sin());
            surface.fill_glow(position, radius * 1.8, particle.color);
            surface.fill_circle(position, radius, particle.color);
        }
    }
}

impl AnimationLayer for PhysicsParticleField {
    fn kind(&self) -> LayerKind {
        LayerKind::Particles
    }

    fn state(&self) -> LayerState {
        self.state
    }

    fn init(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        if !ctx.engines.has(Engine::Physics) {
            return Err(LayerError::MissingDependency {
                kind: LayerKind::Particles,
                engine: Engine::Physics,
            });
        }

        self.size = ctx.surface.size();
        self.pointer = ctx.input.pointer;
        self.world = Some(ParticleWorld::new());
        self.rebuild_walls();
        self.adjust_particles();

        for kind in [
            EventKind::PointerMove,
            EventKind::PointerLeave,
            EventKind::PointerButton,
            EventKind::Resize,
        ] {
            self.subscriptions.subscribe(ctx.events, ctx.slot, kind);
        }
        self.frames.start(ctx.scheduler, ctx.slot);
        self.state = LayerState::Running;

        info!(count = self.particles.len(), "particle field initialized");
        Ok(())
    }

    fn on_frame(&mut self, handle: FrameHandle, ctx: &mut LayerContext<'_>) {
        if !self.frames.begin(handle) {
            return;
        }

        if let Some(last) = self.last_frame.replace(ctx.now) {
            let elapsed = ctx.now.saturating_sub(last);
            if elapsed > LATE_FRAME {
                trace!(elapsed_ms = elapsed.as_millis() as u64, "late particle frame");
            }
        }

        self.apply_forces();
        self.drag();
        let dt = FIXED_STEP * self.params.time_scale;
        if let Some(world) = self.world.as_mut() {
            world.step(dt);
        }
        self.render(ctx.surface);

        self.frames.reschedule(ctx.scheduler, ctx.slot);
    }

    fn on_event(&mut self, subscription: SubscriptionId, event: &HostEvent, _ctx: &mut LayerContext<'_>) {
        if !self.subscriptions.owns(subscription) {
            return;
        }
        match *event {
            HostEvent::PointerMoved(position) => self.pointer = Some(position),
            HostEvent::Resized(size) => {
                self.size = size;
                self.rebuild_walls();
                debug!(width = size.width, height = size.height, "particle bounds rebuilt");
            }
            HostEvent::PointerLeft => {
                self.pointer = None;
                self.grabbed = None;
            }
            HostEvent::PointerPressed(position) => {
                self.pointer = Some(position);
                self.grab(position);
            }
            HostEvent::PointerReleased => self.grabbed = None,
        }
    }

    fn destroy(&mut self, ctx: &mut LayerContext<'_>) {
        self.frames.cancel(ctx.scheduler);
        self.subscriptions.release(ctx.events);
        self.world = None;
        self.walls.clear();
        self.particles.clear();
        self.grabbed = None;
        self.pointer = None;
        self.last_frame = None;
        if self.state != LayerState::Destroyed {
            ctx.surface.clear();
            info!("particle field destroyed");
        }
        self.state = LayerState::Destroyed;
    }

    fn density_control(&mut self) -> Option<&mut dyn DensityControl> {
        Some(self)
    }

    fn speed_control(&mut self) -> Option<&mut dyn SpeedControl> {
        Some(self)
    }

    fn intensity_control(&mut self) -> Option<&mut dyn IntensityControl> {
        Some(self)
    }
}

impl DensityControl for PhysicsParticleField {
    fn set_particle_density(&mut self, level: u8) {
        self.target = target_count(level);
        debug!(level, target = self.target, "particle density set");
        self.adjust_particles();
    }
}

impl SpeedControl for PhysicsParticleField {
    fn set_animation_speed(&mut self, level: u8) {
        self.params = self.params.with_speed(level);
        debug!(level, time_scale = self.params.time_scale, "particle speed set");
    }
}

impl IntensityControl for PhysicsParticleField {
    fn set_physics_intensity(&mut self, level: u8) {
        self.params = self.params.with_intensity(level);
        debug!(
            level,
            friction_air = self.params.friction_air,
            restitution = self.params.restitution,
            "physics intensity set"
        );

        let Some(world) = self.world.as_mut() else {
            return;
        };
        let damping = self.params.linear_damping();
        for particle in &self.particles {
            if let Some(body) = world.bodies.get_mut(particle.body) {
                body.set_linear_damping(damping);
            }
            if let Some(collider) = world.colliders.get_mut(particle.collider) {
                collider.set_restitution(self.params.restitution);
            }
        }
    }
}
