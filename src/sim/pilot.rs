//! Demo pilot
//!
//! Plays the level on its own for attract mode and headless runs: runs
//! right, hops over walls and enemies, and now and then takes a random jump
//! or a breather. Seeded, so a given seed always plays the same run.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::entity::EntityKind;
use super::probe::probe;
use super::state::World;
use super::tick::TickInput;

/// How far ahead an enemy makes the pilot jump
const THREAT_RANGE: f32 = 3.0;
/// Chance per frame of an unprovoked hop
const RANDOM_JUMP_CHANCE: f64 = 0.02;
/// Chance per frame of stopping for a moment
const PAUSE_CHANCE: f64 = 0.005;
/// Chance per frame of taking a pipe the player stands on
const PIPE_CHANCE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct DemoPilot {
    rng: Pcg32,
    hold_frames: u32,
    pause_frames: u32,
}

impl DemoPilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            hold_frames: 0,
            pause_frames: 0,
        }
    }

    /// Pick this frame's input from what the player can see
    pub fn next_input(&mut self, world: &World) -> TickInput {
        let player = &world.player;
        if player.in_sequence() || player.is_dead() {
            self.hold_frames = 0;
            return TickInput::default();
        }

        if self.pause_frames > 0 {
            self.pause_frames -= 1;
            return TickInput::default();
        }
        if self.rng.random_bool(PAUSE_CHANCE) {
            self.pause_frames = self.rng.random_range(10..40);
        }

        let mut input = TickInput {
            horizontal: 1.0,
            ..Default::default()
        };

        let position = player.body.position;
        let blocked = probe(&player.body, Vec2::X, &world.geometry);
        let threat = world.entities.iter().any(|e| {
            let offset = e.position() - position;
            e.kind.is_hostile()
                && e.collider_enabled
                && offset.x > 0.0
                && offset.x < THREAT_RANGE
                && offset.y.abs() < 1.5
        });

        if player.movement.grounded {
            if blocked || threat || self.rng.random_bool(RANDOM_JUMP_CHANCE) {
                input.jump_pressed = true;
                self.hold_frames = self.rng.random_range(6..30);
            }
            if self.over_entry_pipe(world) && self.rng.random_bool(PIPE_CHANCE) {
                input.vertical = -1.0;
            }
        }

        input.jump_held = input.jump_pressed || self.hold_frames > 0;
        self.hold_frames = self.hold_frames.saturating_sub(1);
        input
    }

    /// Standing on a pipe that is entered from above
    fn over_entry_pipe(&self, world: &World) -> bool {
        let feet = world.player.body.aabb();
        world.entities.iter().any(|e| match &e.kind {
            EntityKind::Pipe {
                destination: Some(_),
                enter_direction,
                ..
            } => enter_direction.y < 0.0 && feet.overlaps(&e.aabb(), 0.05),
            _ => false,
        })
    }
}
