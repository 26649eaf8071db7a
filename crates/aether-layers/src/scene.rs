//! Minimal 3D scene graph used by the scene-engine layers.
//!
//! Nodes live in an arena and carry a local transform relative to their
//! parent. A [`Projector`] maps world points onto surface pixels through a
//! perspective [`Camera`].

use aether_runtime::SurfaceSize;
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

/// Handle to a node in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Local transform. Rotation is Euler XYZ in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.translation)
    }
}

#[derive(Debug, Clone)]
struct SceneNode {
    parent: Option<NodeId>,
    transform: Transform,
}

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, fov_y: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::ZERO,
            fov_y,
            near,
            far,
        }
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    /// Unit vector to the camera's right.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or(Vec3::X)
    }

    fn view(&self) -> Mat4 {
        let target = if self.target == self.position {
            self.position + Vec3::NEG_Z
        } else {
            self.target
        };
        Mat4::look_at_rh(self.position, target, Vec3::Y)
    }
}

/// A world point mapped to the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub screen: Vec2,
    /// Distance along the view direction.
    pub depth: f32,
    /// Surface pixels per world unit at this depth.
    pub scale: f32,
}

/// Camera and surface size frozen for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    view: Mat4,
    size: SurfaceSize,
    focal: f32,
    near: f32,
    far: f32,
}

impl Projector {
    pub fn new(camera: &Camera, size: SurfaceSize) -> Self {
        let half_fov = camera.fov_y.to_radians() / 2.0;
        Self {
            view: camera.view(),
            size,
            focal: size.height / (2.0 * half_fov.tan()),
            near: camera.near,
            far: camera.far,
        }
    }

    /// Project a world point. Points behind the camera, outside the clip
    /// range, or far off-screen yield `None`.
    pub fn project(&self, world: Vec3) -> Option<Projected> {
        let eye = self.view.transform_point3(world);
        let depth = -eye.z;
        if depth < self.near || depth > self.far {
            return None;
        }

        let scale = self.focal / depth;
        let screen = Vec2::new(
            self.size.width / 2.0 + eye.x * scale,
            self.size.height / 2.0 - eye.y * scale,
        );
        let margin = self.size.width.max(self.size.height) * 0.25;
        let visible = (-margin..=self.size.width + margin).contains(&screen.x)
            && (-margin..=self.size.height + margin).contains(&screen.y);
        visible.then_some(Projected {
            screen,
            depth,
            scale,
        })
    }
}

/// Arena of transform nodes plus the camera viewing them.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    pub camera: Camera,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            nodes: Vec::new(),
            camera,
        }
    }

    /// Add a node under `parent` (or at the root).
    pub fn add(&mut self, parent: Option<NodeId>, transform: Transform) -> NodeId {
        self.nodes.push(SceneNode { parent, transform });
        NodeId(self.nodes.len() - 1)
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.nodes.get(id.0).map(|node| &node.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes.get_mut(id.0).map(|node| &mut node.transform)
    }

    /// Local-to-world matrix of a node.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(NodeId(index)) = current {
            let Some(node) = self.nodes.get(index) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    pub fn projector(&self, size: SurfaceSize) -> Projector {
        Projector::new(&self.camera, size)
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Great-circle outline of a unit sphere as line segments in local space.
pub fn wireframe_sphere(meridians: usize, parallels: usize, segments: usize) -> Vec<(Vec3, Vec3)> {
    let mut lines = Vec::new();
    let step = std::f32::consts::TAU / segments as f32;

    for m in 0..meridians {
        let yaw = std::f32::consts::PI * m as f32 / meridians as f32;
        let rotation = Quat::from_rotation_y(yaw);
        for s in 0..segments {
            let a = s as f32 * step;
            let b = a + step;
            lines.push((
                rotation * Vec3::new(a.cos(), a.sin(), 0.0),
                rotation * Vec3::new(b.cos(), b.sin(), 0.0),
            ));
        }
    }

    for p in 1..=parallels {
        let latitude = std::f32::consts::PI * (p as f32 / (parallels + 1) as f32 - 0.5);
        let (y, ring) = (latitude.sin(), latitude.cos());
        for s in 0..segments {
            let a = s as f32 * step;
            let b = a + step;
            lines.push((
                Vec3::new(ring * a.cos(), y, ring * a.sin()),
                Vec3::new(ring * b.cos(), y, ring * b.sin()),
            ));
        }
    }
    lines
}
