//! Interactive node grid with pointer displacement and sparks.
//!
//! Pure kinematics: nodes ease toward a target with `x += (target - x) * lerp`
//! and sparks integrate with a fixed per-frame velocity. No engine needed.

use aether_core::{LayerKind, Rgba};
use aether_runtime::{
    AnimationLayer, EventKind, FrameHandle, FrameLoop, HostEvent, LayerContext, LayerState,
    Result, SubscriptionId, Subscriptions, Surface, SurfaceSize,
};
use glam::Vec2;
use tracing::{debug, info};

use crate::color::{GRID_LINE, NODE_ACTIVE, NODE_BASE, SPARK};

/// Eased values closer than this to their target snap onto it.
const SNAP: f32 = 0.01;

/// Grid tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub spacing: f32,
    pub mouse_radius: f32,
    pub base_radius: f32,
    /// Lines connect nodes closer than `spacing * max_line_factor`.
    pub max_line_factor: f32,
    pub line_alpha_base: f32,
    pub line_alpha_interactive: f32,
    pub line_alpha_both: f32,
    pub max_displacement: f32,
    pub lerp: f32,
    pub spark_chance: f32,
    /// Sparks only spawn within `mouse_radius * spark_factor`.
    pub spark_factor: f32,
    pub spark_speed: (f32, f32),
    pub spark_size: (f32, f32),
    pub spark_lifespan: (f32, f32),
    pub spark_shrink: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spacing: 40.0,
            mouse_radius: 150.0,
            base_radius: 2.0,
            max_line_factor: 1.7,
            line_alpha_base: 0.05,
            line_alpha_interactive: 0.4,
            line_alpha_both: 0.7,
            max_displacement: 15.0,
            lerp: 0.1,
            spark_chance: 0.05,
            spark_factor: 0.5,
            spark_speed: (0.5, 2.0),
            spark_size: (1.0, 3.0),
            spark_lifespan: (20.0, 60.0),
            spark_shrink: 0.97,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridNode {
    pub base: Vec2,
    pub position: Vec2,
    pub radius: f32,
    pub target_radius: f32,
    pub interactive: bool,
}

impl GridNode {
    fn at(base: Vec2, radius: f32) -> Self {
        Self {
            base,
            position: base,
            radius,
            target_radius: radius,
            interactive: false,
        }
    }

    fn color(&self) -> Rgba {
        if self.interactive { NODE_ACTIVE } else { NODE_BASE }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spark {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    /// Remaining frames.
    pub lifespan: f32,
}

/// Nodes spaced `spacing` apart, centered in `size`.
pub fn layout_nodes(size: SurfaceSize, config: &GridConfig) -> Vec<GridNode> {
    let spacing = config.spacing;
    let cols = (size.width / spacing).floor().max(0.0) as usize;
    let rows = (size.height / spacing).floor().max(0.0) as usize;
    let offset = Vec2::new(
        (size.width - cols as f32 * spacing) / 2.0 + spacing / 2.0,
        (size.height - rows as f32 * spacing) / 2.0 + spacing / 2.0,
    );

    let mut nodes = Vec::with_capacity(cols * rows);
    for i in 0..cols {
        for j in 0..rows {
            let base = offset + Vec2::new(i as f32, j as f32) * spacing;
            nodes.push(GridNode::at(base, config.base_radius));
        }
    }
    nodes
}

fn ease(current: f32, target: f32, lerp: f32) -> f32 {
    let next = current + (target - current) * lerp;
    if (target - next).abs() < SNAP {
        target
    } else {
        next
    }
}

/// Advance one node toward its pointer-driven target. Returns true when the
/// pointer is close enough for the node to throw sparks.
pub fn update_node(node: &mut GridNode, pointer: Option<Vec2>, config: &GridConfig) -> bool {
    let mut spark_eligible = false;
    let influence = pointer.and_then(|pointer| {
        let away = node.base - pointer;
        let distance = away.length();
        (distance < config.mouse_radius).then_some((away, distance))
    });

    match influence {
        Some((away, distance)) => {
            let strength = 1.0 - distance / config.mouse_radius;
            node.interactive = true;
            node.target_radius = config.base_radius + 2.0 * config.base_radius * strength;
            node.position = if distance > 0.0 {
                node.base + away / distance * config.max_displacement * strength
            } else {
                node.base
            };
            spark_eligible = distance < config.mouse_radius * config.spark_factor;
        }
        None => {
            node.interactive = false;
            node.target_radius = config.base_radius;
            node.position = Vec2::new(
                ease(node.position.x, node.base.x, config.lerp),
                ease(node.position.y, node.base.y, config.lerp),
            );
        }
    }

    node.radius = ease(node.radius, node.target_radius, config.lerp);
    spark_eligible
}

/// Opacity of the line between two nodes, if they are close enough to be
/// connected.
pub fn line_alpha(a: &GridNode, b: &GridNode, config: &GridConfig) -> Option<f32> {
    let distance = a.position.distance(b.position);
    if distance >= config.spacing * config.max_line_factor {
        return None;
    }

    let alpha = if a.interactive && b.interactive && distance < config.spacing * 1.2 {
        config.line_alpha_both
    } else if a.interactive || b.interactive {
        config.line_alpha_interactive
    } else {
        config.line_alpha_base
    };
    Some(alpha)
}

fn spawn_spark(position: Vec2, config: &GridConfig, rng: &mut fastrand::Rng) -> Spark {
    let range = |(min, max): (f32, f32), rng: &mut fastrand::Rng| min + rng.f32() * (max - min);
    let angle = rng.f32() * std::f32::consts::TAU;
    let speed = range(config.spark_speed, rng);
    Spark {
        position,
        velocity: Vec2::from_angle(angle) * speed,
        size: range(config.spark_size, rng),
        lifespan: range(config.spark_lifespan, rng),
    }
}

/// Move, age and shrink sparks, dropping the expired ones.
pub fn update_sparks(sparks: &mut Vec<Spark>, config: &GridConfig) {
    sparks.retain_mut(|spark| {
        spark.position += spark.velocity;
        spark.lifespan -= 1.0;
        spark.size *= config.spark_shrink;
        spark.lifespan > 0.0 && spark.size >= 0.1
    });
}

/// Grid of nodes that bulge away from the pointer.
pub struct InteractiveNodeGrid {
    state: LayerState,
    frames: FrameLoop,
    subscriptions: Subscriptions,
    config: GridConfig,
    nodes: Vec<GridNode>,
    sparks: Vec<Spark>,
    pointer: Option<Vec2>,
    rng: fastrand::Rng,
}

impl Default for InteractiveNodeGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveNodeGrid {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            state: LayerState::Uninitialized,
            frames: FrameLoop::new(),
            subscriptions: Subscriptions::new(),
            config: GridConfig::default(),
            nodes: Vec::new(),
            sparks: Vec::new(),
            pointer: None,
            rng,
        }
    }

    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    fn update(&mut self) {
        for node in &mut self.nodes {
            if update_node(node, self.pointer, &self.config)
                && self.rng.f32() < self.config.spark_chance
            {
                self.sparks
                    .push(spawn_spark(node.position, &self.config, &mut self.rng));
            }
        }
        update_sparks(&mut self.sparks, &self.config);
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear();
        for node in &self.nodes {
            surface.fill_circle(node.position, node.radius, node.color());
        }
        for (i, a) in self.nodes.iter().enumerate() {
            for b in &self.nodes[i + 1..] {
                if let Some(alpha) = line_alpha(a, b, &self.config) {
                    surface.stroke_line(a.position, b.position, GRID_LINE.with_alpha(alpha));
                }
            }
        }
        for spark in &self.sparks {
            surface.fill_circle(spark.position, spark.size, SPARK);
        }
    }
}

impl AnimationLayer for InteractiveNodeGrid {
    fn kind(&self) -> LayerKind {
        LayerKind::NodeGrid
    }

    fn state(&self) -> LayerState {
        self.state
    }

    fn init(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
        self.nodes = layout_nodes(ctx.surface.size(), &self.config);
        self.pointer = ctx.input.pointer;

        for kind in [EventKind::PointerMove, EventKind::PointerLeave, EventKind::Resize] {
            self.subscriptions.subscribe(ctx.events, ctx.slot, kind);
        }
        self.frames.start(ctx.scheduler, ctx.slot);
        self.state = LayerState::Running;
        info!(nodes = self.nodes.len(), "node grid initialized");
        Ok(())
    }

    fn on_frame(&mut self, handle: FrameHandle, ctx: &mut LayerContext<'_>) {
        if !self.frames.begin(handle) {
            return;
        }
        self.update();
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
            HostEvent::Resized(size) => {
                self.nodes = layout_nodes(size, &self.config);
                self.sparks.clear();
                debug!(nodes = self.nodes.len(), "node grid regenerated");
            }
        }
    }

    fn destroy(&mut self, ctx: &mut LayerContext<'_>) {
        self.frames.cancel(ctx.scheduler);
        self.subscriptions.release(ctx.events);
        self.nodes.clear();
        self.sparks.clear();
        self.pointer = None;
        if self.state != LayerState::Destroyed {
            ctx.surface.clear();
            info!("node grid destroyed");
        }
        self.state = LayerState::Destroyed;
    }
}
