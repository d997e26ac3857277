//! Side-scrolling camera
//!
//! Orthographic view that only ever scrolls forward with the player, or
//! tracks the player vertically within a band for climbing stages.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use crate::Tuning;

/// How the camera follows the player
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CameraMode {
    /// Scroll right with the player, never back
    #[default]
    Horizontal,
    /// Follow the player's height within a band
    Vertical { min_height: f32, max_height: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec2,
    pub mode: CameraMode,
    half_height: f32,
    aspect: f32,
    height: f32,
    underground_height: f32,
    underground_threshold: f32,
    underground: bool,
}

impl Camera {
    pub fn new(tuning: &Tuning, start_x: f32) -> Self {
        Self {
            position: Vec2::new(start_x, tuning.camera_height),
            mode: CameraMode::Horizontal,
            half_height: tuning.camera_half_height,
            aspect: tuning.camera_aspect,
            height: tuning.camera_height,
            underground_height: tuning.camera_underground_height,
            underground_threshold: tuning.underground_threshold,
            underground: false,
        }
    }

    pub fn with_mode(mut self, mode: CameraMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn half_width(&self) -> f32 {
        self.half_height * self.aspect
    }

    /// World x of the left and right viewport edges
    pub fn horizontal_extent(&self) -> (f32, f32) {
        let hw = self.half_width();
        (self.position.x - hw, self.position.x + hw)
    }

    /// World-space rectangle currently on screen
    pub fn view_rect(&self) -> Aabb {
        Aabb::from_center(self.position, Vec2::new(self.half_width(), self.half_height))
    }

    /// Project a viewport coordinate (0..1 on both axes) into the world
    pub fn viewport_to_world(&self, viewport: Vec2) -> Vec2 {
        let rect = self.view_rect();
        rect.min + (rect.max - rect.min) * viewport
    }

    pub fn is_underground(&self) -> bool {
        self.underground
    }

    pub fn is_below_threshold(&self, y: f32) -> bool {
        y < self.underground_threshold
    }

    /// Swap between the surface and underground camera heights
    pub fn set_underground(&mut self, underground: bool) {
        self.underground = underground;
        self.position.y = if underground {
            self.underground_height
        } else {
            self.height
        };
    }

    /// Per-frame follow
    pub fn follow(&mut self, target: Vec2) {
        match self.mode {
            CameraMode::Horizontal => {
                self.position.x = self.position.x.max(target.x);
            }
            CameraMode::Vertical {
                min_height,
                max_height,
            } => {
                self.position.y = target.y.clamp(min_height, max_height.max(min_height));
            }
        }
    }
}
