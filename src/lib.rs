//! Scroll Quest - side-scrolling platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, probes, collisions, player state)
//! - `progress`: Lives/coins/level ledger with change notifications
//! - `tuning`: Data-driven movement and enemy balance
//! - `level`: Level layouts (JSON) and the built-in demo stage
//! - `session`: Frame loop driving fixed simulation ticks

pub mod error;
pub mod level;
pub mod progress;
pub mod session;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use level::LevelLayout;
pub use progress::{GameProgress, ProgressEvent};
pub use session::Session;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Probe circle radius
    pub const PROBE_RADIUS: f32 = 0.25;
    /// Probe cast distance from the body position
    pub const PROBE_DISTANCE: f32 = 0.375;

    /// Dot product a contact direction must exceed to count as "from that side"
    pub const DIRECTION_THRESHOLD: f32 = 0.25;

    /// Deadzone for the running flag
    pub const RUN_DEADZONE: f32 = 0.25;
    /// Player keeps this far inside the camera's horizontal edges
    pub const SCREEN_EDGE_MARGIN: f32 = 0.5;

    /// Tier-change flicker duration (seconds)
    pub const FLICKER_DURATION: f32 = 0.5;
    /// Flicker toggles every N frames
    pub const FLICKER_FRAME_INTERVAL: u64 = 4;

    /// Death fall: initial upward speed, gravity, duration
    pub const DEATH_JUMP_VELOCITY: f32 = 10.0;
    pub const DEATH_GRAVITY: f32 = -36.0;
    pub const DEATH_DURATION: f32 = 4.0;
    /// Delay before the ledger resets the level after the player dies
    pub const DEATH_RESET_DELAY: f32 = 3.0;

    /// Sprite animation framerate (seconds per frame)
    pub const SPRITE_FRAME_TIME: f32 = 1.0 / 6.0;
}

use glam::Vec2;

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Move a point toward `target` by at most `max_delta` units
#[inline]
pub fn move_towards_vec(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let dist = delta.length();
    if dist <= max_delta || dist == 0.0 {
        target
    } else {
        current + delta / dist * max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_snaps_when_close() {
        assert_eq!(move_towards(0.9, 1.0, 0.5), 1.0);
        assert_eq!(move_towards(-0.9, -1.0, 0.5), -1.0);
    }

    #[test]
    fn test_move_towards_limited_step() {
        assert!((move_towards(0.0, 8.0, 0.16) - 0.16).abs() < 1e-6);
        assert!((move_towards(0.0, -8.0, 0.16) + 0.16).abs() < 1e-6);
    }

    #[test]
    fn test_move_towards_vec() {
        let p = move_towards_vec(Vec2::ZERO, Vec2::new(3.0, 4.0), 1.0);
        assert!((p - Vec2::new(0.6, 0.8)).length() < 1e-5);
        assert_eq!(move_towards_vec(Vec2::ZERO, Vec2::X, 2.0), Vec2::X);
    }
}
