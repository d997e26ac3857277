//! Player power state machine
//!
//! Small → Big → Huge on growth, one tier back down per hit, and Dead when
//! hit while Small. A tier change swaps the collider footprint at once; the
//! flicker that follows is cosmetic and never blocks gameplay.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::animation::SpriteAnimator;
use super::body::{Footprint, KinematicBody};
use super::camera::Camera;
use super::movement::PlayerMovement;
use super::sequence::{DeathFall, FlagSignal, Flicker, LevelComplete, PipeTransit, Status};
use crate::GameProgress;
use crate::consts::DEATH_RESET_DELAY;

/// Frames in the run cycle
const RUN_FRAMES: usize = 3;

/// Player size tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeTier {
    #[default]
    Small,
    Big,
    Huge,
}

impl SizeTier {
    /// Collider for this tier; every tier shares the same bottom edge
    pub fn footprint(self) -> Footprint {
        match self {
            SizeTier::Small => Footprint::new(Vec2::new(0.85, 1.0), Vec2::ZERO),
            SizeTier::Big | SizeTier::Huge => {
                Footprint::new(Vec2::new(0.85, 2.0), Vec2::new(0.0, 0.5))
            }
        }
    }

    pub fn grown(self) -> Option<SizeTier> {
        match self {
            SizeTier::Small => Some(SizeTier::Big),
            SizeTier::Big => Some(SizeTier::Huge),
            SizeTier::Huge => None,
        }
    }

    pub fn shrunk(self) -> Option<SizeTier> {
        match self {
            SizeTier::Small => None,
            SizeTier::Big => Some(SizeTier::Small),
            SizeTier::Huge => Some(SizeTier::Big),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    Alive(SizeTier),
    Dead,
}

/// Result of a hit or grow request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Grew(SizeTier),
    Shrank(SizeTier),
    Died,
}

/// Sprite pose picked from the movement flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerPose {
    #[default]
    Idle,
    Run,
    Jump,
    Slide,
    Dead,
}

/// Everything a renderer needs to draw the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerVisual {
    pub visible: bool,
    /// Tier whose sprite set is showing (toggles during the flicker)
    pub shown_tier: SizeTier,
    pub pose: PlayerPose,
    pub facing_right: bool,
    /// Uniform scale, shrunk while inside a pipe
    pub scale: f32,
    pub run: SpriteAnimator,
}

impl Default for PlayerVisual {
    fn default() -> Self {
        Self {
            visible: true,
            shown_tier: SizeTier::Small,
            pose: PlayerPose::Idle,
            facing_right: true,
            scale: 1.0,
            run: SpriteAnimator::new(RUN_FRAMES),
        }
    }
}

/// Scripted motion that takes the player out of normal control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerSequence {
    Pipe(PipeTransit),
    LevelComplete(LevelComplete),
    Dying(DeathFall),
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: KinematicBody,
    pub movement: PlayerMovement,
    pub visual: PlayerVisual,
    pub sequence: Option<PlayerSequence>,
    power: PowerState,
    flicker: Option<Flicker>,
    collider_enabled: bool,
}

impl Player {
    /// A fresh Small player
    pub fn new(spawn: Vec2) -> Self {
        Self {
            body: KinematicBody::new(EntityId::PLAYER, spawn, SizeTier::Small.footprint()),
            movement: PlayerMovement::new(),
            visual: PlayerVisual::default(),
            sequence: None,
            power: PowerState::Alive(SizeTier::Small),
            flicker: None,
            collider_enabled: true,
        }
    }

    pub fn power(&self) -> PowerState {
        self.power
    }

    pub fn tier(&self) -> Option<SizeTier> {
        match self.power {
            PowerState::Alive(tier) => Some(tier),
            PowerState::Dead => None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.power == PowerState::Dead
    }

    pub fn is_flickering(&self) -> bool {
        self.flicker.is_some()
    }

    pub fn collider_enabled(&self) -> bool {
        self.collider_enabled
    }

    /// Whether a pipe or flag sequence is steering the player
    pub fn in_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    /// Take damage: drop a tier, or die when already Small
    pub fn hit(&mut self, progress: &mut GameProgress) -> Transition {
        match self.power {
            PowerState::Dead => Transition::Unchanged,
            PowerState::Alive(tier) => match tier.shrunk() {
                Some(smaller) => {
                    self.change_tier(smaller);
                    log::debug!("player shrank to {:?}", smaller);
                    Transition::Shrank(smaller)
                }
                None => {
                    self.death(progress);
                    Transition::Died
                }
            },
        }
    }

    /// One step up the growth path; capped at Huge
    pub fn grow(&mut self) -> Transition {
        match self.power {
            PowerState::Alive(tier) => match tier.grown() {
                Some(bigger) => {
                    self.change_tier(bigger);
                    log::debug!("player grew to {:?}", bigger);
                    Transition::Grew(bigger)
                }
                None => Transition::Unchanged,
            },
            PowerState::Dead => Transition::Unchanged,
        }
    }

    /// Kill the player outright and schedule the level reset
    pub fn death(&mut self, progress: &mut GameProgress) {
        if self.is_dead() {
            return;
        }
        log::info!("player died at ({:.2}, {:.2})", self.body.position.x, self.body.position.y);
        self.power = PowerState::Dead;
        self.flicker = None;
        self.collider_enabled = false;
        self.movement.set_enabled(false, &mut self.body);
        self.visual.pose = PlayerPose::Dead;
        self.visual.run.set_enabled(false);
        self.sequence = Some(PlayerSequence::Dying(DeathFall::default()));
        progress.reset_level(DEATH_RESET_DELAY);
    }

    fn change_tier(&mut self, tier: SizeTier) {
        self.power = PowerState::Alive(tier);
        self.body.footprint = tier.footprint();
        self.flicker = Some(Flicker::new(tier == SizeTier::Small));
    }

    /// Hide the player; any flicker in flight is dropped, not paused
    pub fn disable(&mut self) {
        self.flicker = None;
        self.visual.visible = false;
        self.visual.run.set_enabled(false);
        if let Some(tier) = self.tier() {
            self.visual.shown_tier = tier;
        }
    }

    pub fn enable(&mut self) {
        self.visual.visible = true;
    }

    /// Start a pipe transit toward `destination`
    pub fn enter_pipe(&mut self, entered_position: Vec2, destination: Vec2, exit_direction: Vec2) {
        if self.in_sequence() || self.is_dead() {
            return;
        }
        self.movement.set_enabled(false, &mut self.body);
        self.collider_enabled = false;
        self.sequence = Some(PlayerSequence::Pipe(PipeTransit::new(
            self.body.position,
            self.visual.scale,
            entered_position,
            destination,
            exit_direction,
        )));
    }

    /// Start the flag pole walk
    pub fn complete_level(&mut self, pole_bottom: Vec2, castle: Vec2, speed: f32) {
        if self.in_sequence() || self.is_dead() {
            return;
        }
        self.movement.set_enabled(false, &mut self.body);
        self.sequence = Some(PlayerSequence::LevelComplete(LevelComplete::new(
            pole_bottom,
            castle,
            speed,
        )));
    }

    /// Advance the running sequence one fixed tick
    pub fn advance_sequence(&mut self, camera: &mut Camera, dt: f32) -> FlagSignal {
        let Some(sequence) = &mut self.sequence else {
            return FlagSignal::None;
        };
        match sequence {
            PlayerSequence::Pipe(transit) => {
                let status = transit.advance(
                    &mut self.body.position,
                    &mut self.visual.scale,
                    camera,
                    dt,
                );
                if status == Status::Done {
                    log::debug!("pipe transit finished at {:?}", self.body.position);
                    self.sequence = None;
                    self.collider_enabled = true;
                    self.movement.set_enabled(true, &mut self.body);
                }
                FlagSignal::None
            }
            PlayerSequence::LevelComplete(walk) => {
                let signal = walk.advance(&mut self.body.position, dt);
                if signal == FlagSignal::HidePlayer {
                    self.disable();
                }
                signal
            }
            PlayerSequence::Dying(fall) => {
                if fall.advance(&mut self.body.position, dt) == Status::Done {
                    self.sequence = None;
                }
                FlagSignal::None
            }
        }
    }

    /// Frame-clock visuals: flicker, pose, facing and the run cycle
    pub fn update_visual(&mut self, dt: f32, frame_count: u64) {
        let Some(tier) = self.tier() else {
            self.visual.pose = PlayerPose::Dead;
            return;
        };

        self.visual.shown_tier = match &mut self.flicker {
            Some(flicker) => {
                if flicker.advance(dt, frame_count) == Status::Done {
                    self.flicker = None;
                    tier
                } else if flicker.show_small {
                    SizeTier::Small
                } else {
                    SizeTier::Big
                }
            }
            None => tier,
        };

        if !self.visual.visible {
            return;
        }

        let running = self.movement.running(&self.body);
        self.visual.run.set_enabled(running);
        self.visual.pose = if self.movement.jumping {
            PlayerPose::Jump
        } else if self.movement.sliding(&self.body) {
            PlayerPose::Slide
        } else if !running {
            PlayerPose::Idle
        } else {
            PlayerPose::Run
        };
        if self.body.velocity.x > 0.0 {
            self.visual.facing_right = true;
        } else if self.body.velocity.x < 0.0 {
            self.visual.facing_right = false;
        }
        self.visual.run.advance(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::progress::ProgressEvent;

    fn player() -> Player {
        Player::new(Vec2::new(0.0, 0.5))
    }

    #[test]
    fn test_small_hit_dies() {
        let mut progress = GameProgress::new();
        let mut p = player();
        assert_eq!(p.hit(&mut progress), Transition::Died);
        assert!(p.is_dead());
        assert!(!p.collider_enabled());
        assert!(!p.movement.is_enabled());
        assert!(progress.reset_pending());
        assert!(matches!(p.sequence, Some(PlayerSequence::Dying(_))));
    }

    #[test]
    fn test_shrink_path() {
        let mut progress = GameProgress::new();
        let mut p = player();
        p.grow();
        p.grow();
        assert_eq!(p.tier(), Some(SizeTier::Huge));

        assert_eq!(p.hit(&mut progress), Transition::Shrank(SizeTier::Big));
        assert_eq!(p.body.footprint, SizeTier::Big.footprint());
        assert_eq!(p.hit(&mut progress), Transition::Shrank(SizeTier::Small));
        assert_eq!(p.body.footprint, SizeTier::Small.footprint());
        assert!(!progress.reset_pending());
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut progress = GameProgress::new();
        let events = progress.subscribe();
        let mut p = player();
        p.hit(&mut progress);
        assert_eq!(p.hit(&mut progress), Transition::Unchanged);
        assert_eq!(p.grow(), Transition::Unchanged);
        assert!(p.is_dead());

        // Only one reset is scheduled
        progress.advance(DEATH_RESET_DELAY + 0.1);
        let lives: Vec<_> = events
            .try_iter()
            .filter(|e| matches!(e, ProgressEvent::LivesChanged(_)))
            .collect();
        assert_eq!(lives, vec![ProgressEvent::LivesChanged(2)]);
    }

    #[test]
    fn test_growth_caps_at_huge() {
        let mut p = player();
        assert_eq!(p.grow(), Transition::Grew(SizeTier::Big));
        assert_eq!(p.grow(), Transition::Grew(SizeTier::Huge));
        for _ in 0..5 {
            assert_eq!(p.grow(), Transition::Unchanged);
        }
        assert_eq!(p.tier(), Some(SizeTier::Huge));
    }

    #[test]
    fn test_footprints_share_bottom_edge() {
        for tier in [SizeTier::Small, SizeTier::Big, SizeTier::Huge] {
            let aabb = tier.footprint().aabb(Vec2::new(0.0, 0.5));
            assert!(aabb.min.y.abs() < 1e-6);
        }
    }

    #[test]
    fn test_tier_change_takes_effect_before_flicker_ends() {
        let mut p = player();
        p.grow();
        assert!(p.is_flickering());
        assert_eq!(p.tier(), Some(SizeTier::Big));
        assert_eq!(p.body.top(), 2.0);
    }

    #[test]
    fn test_flicker_settles_on_active_tier() {
        let mut p = player();
        p.grow();
        let mut saw_small = false;
        for frame in 0..60 {
            p.update_visual(1.0 / 60.0, frame);
            saw_small |= p.visual.shown_tier == SizeTier::Small;
        }
        assert!(saw_small);
        assert!(!p.is_flickering());
        assert_eq!(p.visual.shown_tier, SizeTier::Big);
    }

    #[test]
    fn test_disable_mid_flicker_leaves_no_residue() {
        let mut p = player();
        p.grow();
        for frame in 0..9 {
            p.update_visual(1.0 / 60.0, frame);
        }
        p.disable();
        p.enable();
        assert!(!p.is_flickering());
        assert_eq!(p.visual.shown_tier, SizeTier::Big);

        // Nothing resumes toggling after re-enable
        for frame in 9..40 {
            p.update_visual(1.0 / 60.0, frame);
            assert_eq!(p.visual.shown_tier, SizeTier::Big);
        }
    }

    #[test]
    fn test_pose_selection() {
        let mut p = player();
        p.update_visual(1.0 / 60.0, 1);
        assert_eq!(p.visual.pose, PlayerPose::Idle);

        p.body.velocity.x = 4.0;
        p.movement.input_axis = 1.0;
        p.update_visual(1.0 / 60.0, 2);
        assert_eq!(p.visual.pose, PlayerPose::Run);
        assert!(p.visual.run.is_enabled());

        p.movement.input_axis = -1.0;
        p.update_visual(1.0 / 60.0, 3);
        assert_eq!(p.visual.pose, PlayerPose::Slide);
        assert!(p.visual.facing_right);

        p.movement.jumping = true;
        p.update_visual(1.0 / 60.0, 4);
        assert_eq!(p.visual.pose, PlayerPose::Jump);

        p.movement.jumping = false;
        p.body.velocity.x = -4.0;
        p.update_visual(1.0 / 60.0, 5);
        assert!(!p.visual.facing_right);
    }

    #[test]
    fn test_pipe_sequence_restores_control() {
        let tuning = Tuning::default();
        let mut camera = Camera::new(&tuning, 0.0);
        let mut p = player();
        p.enter_pipe(Vec2::new(0.0, -0.5), Vec2::new(30.0, 4.0), Vec2::ZERO);
        assert!(!p.movement.is_enabled());

        // A second entry while in transit is ignored
        p.enter_pipe(Vec2::ZERO, Vec2::new(-50.0, 0.0), Vec2::ZERO);

        let mut ticks = 0;
        while p.in_sequence() {
            p.advance_sequence(&mut camera, 1.0 / 50.0);
            ticks += 1;
            assert!(ticks < 500);
        }
        assert_eq!(p.body.position, Vec2::new(30.0, 4.0));
        assert!(p.movement.is_enabled());
        assert!(p.collider_enabled());
    }

    #[test]
    fn test_flag_sequence_hides_player() {
        let tuning = Tuning::default();
        let mut camera = Camera::new(&tuning, 0.0);
        let mut p = player();
        p.complete_level(Vec2::new(2.0, 0.5), Vec2::new(6.0, 0.5), 6.0);
        let mut load = false;
        for _ in 0..1000 {
            if p.advance_sequence(&mut camera, 1.0 / 50.0) == FlagSignal::LoadNext {
                load = true;
                break;
            }
        }
        assert!(load);
        assert!(!p.visual.visible);
    }
}
