//! Non-player locomotion
//!
//! Patrol entities walk at a fixed speed and turn around when the way ahead
//! is blocked. Direction only ever changes on the tick an obstruction is
//! found, and that tick's horizontal step is thrown away, so a body can
//! never jitter against a wall.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::KinematicBody;
use super::geometry::LevelGeometry;
use super::probe::{probe, probe_from, resolve_horizontal, resolve_vertical, settle};
use crate::consts::PROBE_DISTANCE;

/// Horizontal distance under which a chaser stops closing in
const CHASE_DEADZONE: f32 = 0.05;

/// How an entity picks its direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocomotionMode {
    /// Turn at walls and at the edge of the floor
    #[default]
    Walk,
    /// Turn at walls only; happily slides off ledges
    Slide,
    /// Head for a target x every tick, stopping at walls
    Chase,
}

/// What happened during one locomotion step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Direction flipped this tick
    pub reversed: bool,
    /// Floor directly below at the start of the tick
    pub grounded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locomotion {
    pub direction: Vec2,
    pub speed: f32,
    pub mode: LocomotionMode,
    enabled: bool,
}

impl Locomotion {
    /// Starts disabled; entities wake up the first time they are seen
    pub fn new(direction: Vec2, speed: f32, mode: LocomotionMode) -> Self {
        Self {
            direction,
            speed: speed.max(0.0),
            mode,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self, body: &mut KinematicBody) {
        self.enabled = true;
        body.wake();
    }

    pub fn disable(&mut self, body: &mut KinematicBody) {
        self.enabled = false;
        body.sleep();
    }

    /// Advance one fixed tick
    ///
    /// `chase_target_x` steers `Chase` mode and is ignored otherwise.
    pub fn step(
        &mut self,
        body: &mut KinematicBody,
        geometry: &LevelGeometry,
        gravity: f32,
        terminal_fall_speed: f32,
        chase_target_x: Option<f32>,
        dt: f32,
    ) -> StepReport {
        if !self.enabled || body.is_asleep() {
            return StepReport::default();
        }

        if let (LocomotionMode::Chase, Some(target_x)) = (self.mode, chase_target_x) {
            let dx = target_x - body.position.x;
            self.direction.x = if dx.abs() > CHASE_DEADZONE {
                dx.signum()
            } else {
                0.0
            };
        }

        body.velocity.x = self.direction.x * self.speed;
        body.apply_gravity(gravity, terminal_fall_speed, dt);

        let grounded = probe(body, Vec2::NEG_Y, geometry);
        let ahead = Vec2::new(self.direction.x, 0.0);
        let mut report = StepReport {
            reversed: false,
            grounded,
        };

        let mut dx = body.velocity.x * dt;
        if self.direction.x != 0.0 {
            let blocked = probe(body, ahead, geometry);
            let ledge = self.mode == LocomotionMode::Walk
                && grounded
                && !probe_from(
                    body.position + Vec2::new(self.direction.x.signum() * PROBE_DISTANCE, 0.0),
                    body.id,
                    Vec2::NEG_Y,
                    geometry,
                );

            if blocked || ledge {
                dx = 0.0;
                if self.mode != LocomotionMode::Chase {
                    self.direction.x = -self.direction.x;
                    report.reversed = true;
                }
            } else {
                dx = resolve_horizontal(body, geometry, dx);
            }
        }

        let dy = if grounded && body.velocity.y <= 0.0 {
            body.velocity.y = 0.0;
            settle(body, geometry)
        } else {
            let (dy, ceiling) = resolve_vertical(body, geometry, body.velocity.y * dt);
            if ceiling.is_some() {
                body.velocity.y = body.velocity.y.min(0.0);
            }
            dy
        };

        body.position += Vec2::new(dx, dy);
        report
    }
}
