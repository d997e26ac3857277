//! Kinematic bodies
//!
//! A body is a position/velocity pair integrated by its owner each fixed
//! tick. Sleeping bodies keep zero velocity and are invisible to probes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::geometry::Aabb;

/// Collider size and offset relative to the body position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub size: Vec2,
    pub offset: Vec2,
}

impl Footprint {
    /// One-unit square centered on the body
    pub const UNIT: Footprint = Footprint {
        size: Vec2::ONE,
        offset: Vec2::ZERO,
    };

    pub const fn new(size: Vec2, offset: Vec2) -> Self {
        Self { size, offset }
    }

    pub fn aabb(&self, position: Vec2) -> Aabb {
        Aabb::from_center(position + self.offset, self.size * 0.5)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicBody {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub footprint: Footprint,
    asleep: bool,
}

impl KinematicBody {
    pub fn new(id: EntityId, position: Vec2, footprint: Footprint) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            footprint,
            asleep: false,
        }
    }

    #[inline]
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Freeze the body: velocity pinned to zero, no integration
    pub fn sleep(&mut self) {
        self.velocity = Vec2::ZERO;
        self.asleep = true;
    }

    pub fn wake(&mut self) {
        self.asleep = false;
    }

    pub fn aabb(&self) -> Aabb {
        self.footprint.aabb(self.position)
    }

    /// Lowest point of the collider
    pub fn bottom(&self) -> f32 {
        self.position.y + self.footprint.offset.y - self.footprint.size.y * 0.5
    }

    /// Highest point of the collider
    pub fn top(&self) -> f32 {
        self.position.y + self.footprint.offset.y + self.footprint.size.y * 0.5
    }

    /// Add gravity and clamp to the terminal fall speed
    pub fn apply_gravity(&mut self, gravity: f32, terminal_fall_speed: f32, dt: f32) {
        if self.asleep {
            return;
        }
        self.velocity.y += gravity * dt;
        self.velocity.y = self.velocity.y.max(-terminal_fall_speed);
    }
}
