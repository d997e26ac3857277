//! Movement and enemy tuning
//!
//! Loaded from a JSON file; any missing field falls back to the default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SimError;

/// Game balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    /// Horizontal top speed and acceleration (units/s, units/s²)
    pub move_speed: f32,
    /// Apex height of a full jump
    pub max_jump_height: f32,
    /// Time for a full jump to go up and come back down
    pub max_jump_time: f32,

    // === Entities ===
    /// Gravity for patrol entities (units/s²)
    pub entity_gravity: f32,
    /// Fall speed cap for patrol entities
    pub entity_terminal_fall_speed: f32,
    /// Default walking speed for demons and shamans
    pub enemy_speed: f32,
    /// Speed of a pushed spirit
    pub spirit_speed: f32,
    /// Speed of moving power-ups
    pub power_up_speed: f32,
    /// Chase speed of the terminator
    pub terminator_speed: f32,

    // === Timers ===
    /// Pushed spirits are removed this long after leaving the screen
    pub spirit_despawn_delay: f32,
    /// Terminators are removed this long after leaving the screen
    pub terminator_despawn_delay: f32,
    /// Flag pole walk speed
    pub flag_speed: f32,

    // === Camera ===
    /// Orthographic half-height of the view
    pub camera_half_height: f32,
    /// Viewport width / height
    pub camera_aspect: f32,
    /// Camera height above ground
    pub camera_height: f32,
    /// Camera height while underground
    pub camera_underground_height: f32,
    /// Pipe destinations below this y switch the camera underground
    pub underground_threshold: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Player
            move_speed: 8.0,
            max_jump_height: 5.0,
            max_jump_time: 1.0,

            // Entities
            entity_gravity: -9.81,
            entity_terminal_fall_speed: 20.0,
            enemy_speed: 1.0,
            spirit_speed: 12.0,
            power_up_speed: 3.0,
            terminator_speed: 1.5,

            // Timers
            spirit_despawn_delay: 10.0,
            terminator_despawn_delay: 4.0,
            flag_speed: 6.0,

            // Camera
            camera_half_height: 7.0,
            camera_aspect: 16.0 / 9.0,
            camera_height: 7.0,
            camera_underground_height: -9.0,
            underground_threshold: 0.0,
        }
    }
}

impl Tuning {
    /// Initial upward speed of a full jump
    pub fn jump_force(&self) -> f32 {
        (2.0 * self.max_jump_height) / (self.max_jump_time / 2.0)
    }

    /// Player gravity derived from the jump arc (negative)
    pub fn gravity(&self) -> f32 {
        (-2.0 * self.max_jump_height) / (self.max_jump_time / 2.0).powi(2)
    }

    /// Reject values that would break the derived jump arc or integration
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.max_jump_time > 0.0) {
            return Err(SimError::InvalidTuning(format!(
                "max_jump_time must be positive, got {}",
                self.max_jump_time
            )));
        }
        if !(self.max_jump_height > 0.0) {
            return Err(SimError::InvalidTuning(format!(
                "max_jump_height must be positive, got {}",
                self.max_jump_height
            )));
        }
        if self.move_speed < 0.0 || self.entity_terminal_fall_speed < 0.0 {
            return Err(SimError::InvalidTuning(
                "speeds must be non-negative".to_string(),
            ));
        }
        if !(self.camera_half_height > 0.0 && self.camera_aspect > 0.0) {
            return Err(SimError::InvalidTuning(
                "camera extents must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate tuning from JSON text
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Write tuning as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Tuning saved");
        Ok(())
    }
}
