//! Game progress ledger
//!
//! Lives, coins and the current world/stage. The simulation only ever calls
//! the mutating methods; UI and the session observe changes through
//! subscription channels.

use std::sync::mpsc::{Receiver, Sender, channel};

/// Lives cap
pub const MAX_LIVES: u8 = 5;
/// Lives at the start of a new game
pub const STARTING_LIVES: u8 = 3;
/// Coins that roll over into an extra life
pub const COINS_PER_LIFE: u8 = 30;

/// Change notifications published by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    LivesChanged(u8),
    CoinsChanged(u8),
    LevelLoaded { world: u32, stage: u32 },
    GameOver,
}

/// The lives/coins/level ledger
#[derive(Debug)]
pub struct GameProgress {
    world: u32,
    stage: u32,
    lives: u8,
    coins: u8,
    /// Seconds until a scheduled level reset fires
    pending_reset: Option<f32>,
    subscribers: Vec<Sender<ProgressEvent>>,
}

impl Default for GameProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl GameProgress {
    /// Ledger for a fresh game at 1-1 (no level-loaded notification)
    pub fn new() -> Self {
        Self {
            world: 1,
            stage: 1,
            lives: STARTING_LIVES,
            coins: 0,
            pending_reset: None,
            subscribers: Vec::new(),
        }
    }

    pub fn world(&self) -> u32 {
        self.world
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn coins(&self) -> u8 {
        self.coins
    }

    /// Whether a delayed level reset is scheduled
    pub fn reset_pending(&self) -> bool {
        self.pending_reset.is_some()
    }

    /// Register an observer; dropped receivers are pruned on the next publish
    pub fn subscribe(&mut self) -> Receiver<ProgressEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: ProgressEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// Start over: 3 lives, no coins, world 1-1
    pub fn new_game(&mut self) {
        self.lives = STARTING_LIVES;
        self.coins = 0;
        self.pending_reset = None;
        self.publish(ProgressEvent::LivesChanged(self.lives));
        self.publish(ProgressEvent::CoinsChanged(self.coins));
        self.load_level(1, 1);
    }

    /// Switch to a level and announce it
    pub fn load_level(&mut self, world: u32, stage: u32) {
        self.world = world;
        self.stage = stage;
        log::info!("Loading level {}-{}", world, stage);
        self.publish(ProgressEvent::LevelLoaded { world, stage });
    }

    /// Collect a coin; the 30th coin becomes a life
    pub fn add_coin(&mut self) {
        self.coins += 1;
        if self.coins >= COINS_PER_LIFE {
            self.coins = 0;
            self.publish(ProgressEvent::CoinsChanged(self.coins));
            self.add_life();
        } else {
            self.publish(ProgressEvent::CoinsChanged(self.coins));
        }
    }

    /// Gain a life (ignored at the cap)
    pub fn add_life(&mut self) {
        if self.lives < MAX_LIVES {
            self.lives += 1;
            log::info!("Extra life ({} lives)", self.lives);
            self.publish(ProgressEvent::LivesChanged(self.lives));
        }
    }

    /// Schedule a level reset after `delay` seconds
    pub fn reset_level(&mut self, delay: f32) {
        if self.pending_reset.is_some() {
            log::debug!("Level reset already scheduled");
            return;
        }
        self.pending_reset = Some(delay.max(0.0));
    }

    /// Advance the reset timer
    pub fn advance(&mut self, dt: f32) {
        if let Some(remaining) = self.pending_reset.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.pending_reset = None;
                self.reset_level_now();
            }
        }
    }

    /// Lose a life and reload, or end the game when none are left
    fn reset_level_now(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.publish(ProgressEvent::LivesChanged(self.lives));

        if self.lives > 0 {
            self.load_level(self.world, self.stage);
        } else {
            log::info!("Game over");
            self.publish(ProgressEvent::GameOver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_rollover() {
        let mut progress = GameProgress::new();
        for _ in 0..29 {
            progress.add_coin();
        }
        assert_eq!(progress.coins(), 29);
        assert_eq!(progress.lives(), STARTING_LIVES);

        progress.add_coin();
        assert_eq!(progress.coins(), 0);
        assert_eq!(progress.lives(), STARTING_LIVES + 1);
    }

    #[test]
    fn test_coin_rollover_at_life_cap() {
        let mut progress = GameProgress::new();
        while progress.lives() < MAX_LIVES {
            progress.add_life();
        }
        for _ in 0..30 {
            progress.add_coin();
        }
        assert_eq!(progress.coins(), 0);
        assert_eq!(progress.lives(), MAX_LIVES);
    }

    #[test]
    fn test_add_life_capped() {
        let mut progress = GameProgress::new();
        for _ in 0..10 {
            progress.add_life();
        }
        assert_eq!(progress.lives(), MAX_LIVES);
    }

    #[test]
    fn test_reset_level_after_delay() {
        let mut progress = GameProgress::new();
        let rx = progress.subscribe();
        progress.reset_level(3.0);
        progress.advance(2.9);
        assert_eq!(progress.lives(), STARTING_LIVES);
        assert!(progress.reset_pending());

        progress.advance(0.2);
        assert_eq!(progress.lives(), STARTING_LIVES - 1);
        assert!(!progress.reset_pending());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ProgressEvent::LivesChanged(STARTING_LIVES - 1),
                ProgressEvent::LevelLoaded { world: 1, stage: 1 },
            ]
        );
    }

    #[test]
    fn test_double_reset_only_costs_one_life() {
        let mut progress = GameProgress::new();
        progress.reset_level(1.0);
        progress.reset_level(1.0);
        progress.advance(1.5);
        assert_eq!(progress.lives(), STARTING_LIVES - 1);
    }

    #[test]
    fn test_game_over_when_out_of_lives() {
        let mut progress = GameProgress::new();
        let rx = progress.subscribe();
        for _ in 0..STARTING_LIVES {
            progress.reset_level(0.0);
            progress.advance(0.01);
        }
        assert_eq!(progress.lives(), 0);
        assert!(rx.try_iter().any(|e| e == ProgressEvent::GameOver));
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let mut progress = GameProgress::new();
        let rx = progress.subscribe();
        drop(rx);
        progress.add_coin();
        assert!(progress.subscribers.is_empty());
    }
}
