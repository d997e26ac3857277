//! Player locomotion
//!
//! Input-driven horizontal acceleration, a jump arc derived from the tuned
//! apex height and airtime, fast fall, and the camera-edge clamp.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::KinematicBody;
use super::geometry::LevelGeometry;
use super::probe::{probe, resolve_horizontal, resolve_vertical, settle};
use super::tick::TickInput;
use crate::Tuning;
use crate::consts::{RUN_DEADZONE, SCREEN_EDGE_MARGIN};
use crate::move_towards;

/// Side effects of one movement step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// Left the ground this tick
    pub jumped: bool,
    /// Rising motion stopped by geometry overhead
    pub bumped_head: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMovement {
    /// Horizontal input last applied, in [-1, 1]
    pub input_axis: f32,
    pub grounded: bool,
    pub jumping: bool,
    enabled: bool,
}

impl Default for PlayerMovement {
    fn default() -> Self {
        Self {
            input_axis: 0.0,
            grounded: false,
            jumping: false,
            enabled: true,
        }
    }
}

impl PlayerMovement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning movement off also stops the body dead
    pub fn set_enabled(&mut self, enabled: bool, body: &mut KinematicBody) {
        self.enabled = enabled;
        if !enabled {
            body.velocity = Vec2::ZERO;
            self.input_axis = 0.0;
            self.grounded = false;
            self.jumping = false;
        }
    }

    /// Input pushes against the current horizontal velocity
    pub fn sliding(&self, body: &KinematicBody) -> bool {
        (self.input_axis > 0.0 && body.velocity.x < 0.0)
            || (self.input_axis < 0.0 && body.velocity.x > 0.0)
    }

    pub fn running(&self, body: &KinematicBody) -> bool {
        body.velocity.x.abs() > RUN_DEADZONE || self.input_axis.abs() > RUN_DEADZONE
    }

    pub fn falling(&self, body: &KinematicBody) -> bool {
        body.velocity.y < 0.0 && !self.grounded
    }

    /// Rebound off a stomped enemy
    pub fn bounce(&mut self, body: &mut KinematicBody, tuning: &Tuning) {
        body.velocity.y = tuning.jump_force() / 2.0;
        self.jumping = true;
    }

    /// One fixed tick of player motion
    ///
    /// `screen` is the camera's horizontal extent; the player is kept a
    /// margin inside it.
    pub fn step(
        &mut self,
        body: &mut KinematicBody,
        input: &TickInput,
        geometry: &LevelGeometry,
        tuning: &Tuning,
        screen: (f32, f32),
        dt: f32,
    ) -> MoveReport {
        let mut report = MoveReport::default();
        if !self.enabled {
            return report;
        }

        // Horizontal
        self.input_axis = input.horizontal.clamp(-1.0, 1.0);
        body.velocity.x = move_towards(
            body.velocity.x,
            self.input_axis * tuning.move_speed,
            tuning.move_speed * dt,
        );
        if body.velocity.x != 0.0 && probe(body, Vec2::X * body.velocity.x, geometry) {
            body.velocity.x = 0.0;
        }

        // Gravity, doubled while falling or once the button is let go
        let gravity = tuning.gravity();
        let held = input.jump_held || input.jump_pressed;
        let multiplier = if body.velocity.y < 0.0 || !held { 2.0 } else { 1.0 };
        body.velocity.y += gravity * multiplier * dt;
        body.velocity.y = body.velocity.y.max(gravity / 2.0);

        self.grounded = probe(body, Vec2::NEG_Y, geometry);
        if self.grounded {
            body.velocity.y = body.velocity.y.max(0.0);
            self.jumping = body.velocity.y > 0.0;
            if input.jump_pressed {
                body.velocity.y = tuning.jump_force();
                self.jumping = true;
                report.jumped = true;
            }
        }

        let dx = resolve_horizontal(body, geometry, body.velocity.x * dt);
        let (dy, ceiling) = if self.grounded && body.velocity.y <= 0.0 {
            (settle(body, geometry), None)
        } else {
            resolve_vertical(body, geometry, body.velocity.y * dt)
        };
        if ceiling.is_some() {
            body.velocity.y = 0.0;
            report.bumped_head = true;
        }
        body.position += Vec2::new(dx, dy);

        let (left, right) = screen;
        let min_x = left + SCREEN_EDGE_MARGIN;
        let max_x = (right - SCREEN_EDGE_MARGIN).max(min_x);
        body.position.x = body.position.x.clamp(min_x, max_x);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::EntityId;
    use crate::sim::body::Footprint;
    use crate::sim::geometry::{Aabb, Solid};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 50.0;
    const WIDE: (f32, f32) = (-1000.0, 1000.0);

    fn ground() -> LevelGeometry {
        let mut geo = LevelGeometry::new();
        geo.add(Solid::terrain(Aabb::new(
            Vec2::new(-100.0, -1.0),
            Vec2::new(100.0, 0.0),
        )));
        geo
    }

    fn standing() -> KinematicBody {
        KinematicBody::new(
            EntityId::PLAYER,
            Vec2::new(0.0, 0.5),
            Footprint::new(Vec2::new(0.85, 1.0), Vec2::ZERO),
        )
    }

    fn press() -> TickInput {
        TickInput {
            jump_pressed: true,
            jump_held: true,
            ..Default::default()
        }
    }

    fn hold() -> TickInput {
        TickInput {
            jump_held: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_jump_sets_velocity_instantly() {
        let tuning = Tuning::default();
        let geo = ground();
        let mut body = standing();
        let mut movement = PlayerMovement::new();

        movement.step(&mut body, &TickInput::default(), &geo, &tuning, WIDE, DT);
        let report = movement.step(&mut body, &press(), &geo, &tuning, WIDE, DT);

        assert!(report.jumped);
        assert!(movement.jumping);
        assert_eq!(body.velocity.y, 20.0);
    }

    #[test]
    fn test_held_jump_reaches_tuned_apex() {
        let tuning = Tuning::default();
        let geo = ground();
        let mut body = standing();
        let mut movement = PlayerMovement::new();

        movement.step(&mut body, &TickInput::default(), &geo, &tuning, WIDE, DT);
        movement.step(&mut body, &press(), &geo, &tuning, WIDE, DT);
        let mut apex = body.bottom();
        for _ in 0..100 {
            movement.step(&mut body, &hold(), &geo, &tuning, WIDE, DT);
            apex = apex.max(body.bottom());
        }
        assert!((apex - 5.0).abs() < 0.5, "apex was {apex}");
        assert!(movement.grounded);
        assert!(body.bottom().abs() < 1e-3);
    }

    #[test]
    fn test_released_jump_is_shorter() {
        let tuning = Tuning::default();
        let geo = ground();
        let mut body = standing();
        let mut movement = PlayerMovement::new();

        movement.step(&mut body, &TickInput::default(), &geo, &tuning, WIDE, DT);
        movement.step(&mut body, &press(), &geo, &tuning, WIDE, DT);
        let mut apex = body.bottom();
        for _ in 0..100 {
            movement.step(&mut body, &TickInput::default(), &geo, &tuning, WIDE, DT);
            apex = apex.max(body.bottom());
        }
        assert!(apex < 3.0, "apex was {apex}");
    }

    #[test]
    fn test_horizontal_acceleration_and_flags() {
        let tuning = Tuning::default();
        let geo = ground();
        let mut body = standing();
        let mut movement = PlayerMovement::new();
        let right = TickInput {
            horizontal: 1.0,
            ..Default::default()
        };

        movement.step(&mut body, &right, &geo, &tuning, WIDE, DT);
        assert!((body.velocity.x - 0.16).abs() < 1e-5);
        assert!(movement.running(&body));

        for _ in 0..100 {
            movement.step(&mut body, &right, &geo, &tuning, WIDE, DT);
        }
        assert_eq!(body.velocity.x, 8.0);

        let left = TickInput {
            horizontal: -1.0,
            ..Default::default()
        };
        movement.step(&mut body, &left, &geo, &tuning, WIDE, DT);
        assert!(movement.sliding(&body));
        assert!(!movement.falling(&body));
    }

    #[test]
    fn test_wall_stops_horizontal_velocity() {
        let tuning = Tuning::default();
        let mut geo = ground();
        geo.add(Solid::terrain(Aabb::new(
            Vec2::new(3.0, 0.0),
            Vec2::new(4.0, 4.0),
        )));
        let mut body = standing();
        let mut movement = PlayerMovement::new();
        let right = TickInput {
            horizontal: 1.0,
            ..Default::default()
        };
        for _ in 0..200 {
            movement.step(&mut body, &right, &geo, &tuning, WIDE, DT);
            assert!(body.aabb().max.x <= 3.0 + 1e-3);
        }
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn test_head_bump_zeroes_rise() {
        let tuning = Tuning::default();
        let mut geo = ground();
        geo.add(Solid::terrain(Aabb::new(
            Vec2::new(-1.0, 3.0),
            Vec2::new(1.0, 4.0),
        )));
        let mut body = standing();
        let mut movement = PlayerMovement::new();

        movement.step(&mut body, &TickInput::default(), &geo, &tuning, WIDE, DT);
        movement.step(&mut body, &press(), &geo, &tuning, WIDE, DT);
        let mut bumped = false;
        for _ in 0..30 {
            let report = movement.step(&mut body, &hold(), &geo, &tuning, WIDE, DT);
            if report.bumped_head {
                bumped = true;
                assert_eq!(body.velocity.y, 0.0);
                break;
            }
        }
        assert!(bumped);
        assert!(body.top() <= 3.0 + 1e-3);
    }

    #[test]
    fn test_screen_clamp() {
        let tuning = Tuning::default();
        let geo = ground();
        let mut body = standing();
        let mut movement = PlayerMovement::new();
        let right = TickInput {
            horizontal: 1.0,
            ..Default::default()
        };
        for _ in 0..300 {
            movement.step(&mut body, &right, &geo, &tuning, (-10.0, 10.0), DT);
        }
        assert_eq!(body.position.x, 9.5);
    }

    #[test]
    fn test_disabled_movement_is_inert() {
        let tuning = Tuning::default();
        let geo = ground();
        let mut body = standing();
        body.velocity = Vec2::new(3.0, 5.0);
        let mut movement = PlayerMovement::new();
        movement.set_enabled(false, &mut body);
        assert_eq!(body.velocity, Vec2::ZERO);

        movement.step(&mut body, &press(), &geo, &tuning, WIDE, DT);
        assert_eq!(body.position, Vec2::new(0.0, 0.5));
    }

    #[test]
    fn test_bounce_is_half_jump() {
        let tuning = Tuning::default();
        let mut body = standing();
        let mut movement = PlayerMovement::new();
        movement.bounce(&mut body, &tuning);
        assert_eq!(body.velocity.y, 10.0);
        assert!(movement.jumping);
    }

    proptest! {
        #[test]
        fn prop_fall_speed_clamped_to_half_gravity(
            inputs in prop::collection::vec((-1.0f32..1.0, any::<bool>(), any::<bool>()), 1..300)
        ) {
            let tuning = Tuning::default();
            let geo = ground();
            let mut body = standing();
            let mut movement = PlayerMovement::new();
            for (horizontal, jump_pressed, jump_held) in inputs {
                let input = TickInput { horizontal, jump_pressed, jump_held, ..Default::default() };
                movement.step(&mut body, &input, &geo, &tuning, WIDE, DT);
                prop_assert!(body.velocity.y >= tuning.gravity() / 2.0);
                prop_assert!(body.bottom() >= -1e-3);
            }
        }
    }
}
