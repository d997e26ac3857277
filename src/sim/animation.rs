//! Flip-book sprite animation on the frame clock

use serde::{Deserialize, Serialize};

use crate::consts::SPRITE_FRAME_TIME;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteAnimator {
    frames: usize,
    frame: usize,
    timer: f32,
    enabled: bool,
}

impl SpriteAnimator {
    pub fn new(frames: usize) -> Self {
        Self {
            frames: frames.max(1),
            frame: 0,
            timer: 0.0,
            enabled: false,
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning on restarts the frame timer; turning off freezes the frame
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.timer = 0.0;
        }
        self.enabled = enabled;
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.enabled {
            return;
        }
        self.timer += dt;
        while self.timer >= SPRITE_FRAME_TIME {
            self.timer -= SPRITE_FRAME_TIME;
            self.frame = (self.frame + 1) % self.frames;
        }
    }
}
