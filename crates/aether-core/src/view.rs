//! Saved camera placements for layers with a steerable 3D camera.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Where a camera sits and what it looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl CameraState {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position: position.to_array(),
            target: target.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn target(&self) -> Vec3 {
        Vec3::from_array(self.target)
    }
}

/// A named camera placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedView {
    pub name: String,
    pub camera: CameraState,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub saved_at: u64,
}
