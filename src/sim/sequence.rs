//! Staged operations
//!
//! Multi-tick sequences (block bounce, coin pop, pipe transit, flag pole
//! walk, death fall) are plain state objects. The owner calls `advance`
//! once per tick until it reports `Done`; cancelling a sequence is just
//! dropping it.

use glam::Vec2;

use super::camera::Camera;
use crate::consts::{
    DEATH_DURATION, DEATH_GRAVITY, DEATH_JUMP_VELOCITY, FLICKER_DURATION, FLICKER_FRAME_INTERVAL,
};
use crate::move_towards_vec;

/// Progress of a sequence after one advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Done,
}

/// Cancellable one-shot timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// Returns true on the tick the timer expires (and every tick after)
    pub fn advance(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

/// Linear interpolation between two points over a fixed duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: Vec2,
    pub to: Vec2,
    duration: f32,
    elapsed: f32,
}

impl Tween {
    pub fn new(from: Vec2, to: Vec2, duration: f32) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
        }
    }

    /// Sample at the current time, then step forward.
    /// The final advance lands exactly on `to`.
    pub fn advance(&mut self, dt: f32) -> (Vec2, Status) {
        if self.elapsed >= self.duration {
            return (self.to, Status::Done);
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.elapsed += dt;
        (self.from.lerp(self.to, t), Status::Running)
    }
}

/// Rise by `height` and come back to rest, each leg taking `leg_duration`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpAndBack {
    tween: Tween,
    returning: bool,
}

impl UpAndBack {
    pub fn new(height: f32, leg_duration: f32) -> Self {
        Self {
            tween: Tween::new(Vec2::ZERO, Vec2::Y * height, leg_duration),
            returning: false,
        }
    }

    /// Current offset from the rest position
    pub fn advance(&mut self, dt: f32) -> (Vec2, Status) {
        let (offset, status) = self.tween.advance(dt);
        match (status, self.returning) {
            (Status::Running, _) => (offset, Status::Running),
            (Status::Done, false) => {
                self.returning = true;
                self.tween = Tween::new(self.tween.to, Vec2::ZERO, self.tween.duration);
                (offset, Status::Running)
            }
            (Status::Done, true) => (Vec2::ZERO, Status::Done),
        }
    }
}

/// Walk toward a destination at fixed speed, snapping within 0.125 units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveTo {
    pub destination: Vec2,
    pub speed: f32,
}

impl MoveTo {
    const SNAP_DISTANCE: f32 = 0.125;

    pub fn new(destination: Vec2, speed: f32) -> Self {
        Self { destination, speed }
    }

    pub fn advance(&self, position: &mut Vec2, dt: f32) -> Status {
        if position.distance(self.destination) > Self::SNAP_DISTANCE {
            *position = move_towards_vec(*position, self.destination, self.speed * dt);
            Status::Running
        } else {
            *position = self.destination;
            Status::Done
        }
    }
}

/// Tier-change flicker: alternate small/big sprites every few frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flicker {
    elapsed: f32,
    /// Which of the two toggled sprites is showing
    pub show_small: bool,
}

impl Flicker {
    pub fn new(starting_small: bool) -> Self {
        Self {
            elapsed: 0.0,
            show_small: starting_small,
        }
    }

    /// Advance on the frame clock
    pub fn advance(&mut self, dt: f32, frame_count: u64) -> Status {
        if self.elapsed >= FLICKER_DURATION {
            return Status::Done;
        }
        self.elapsed += dt;
        if frame_count % FLICKER_FRAME_INTERVAL == 0 {
            self.show_small = !self.show_small;
        }
        Status::Running
    }
}

/// Ballistic hop and fall played on death
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathFall {
    velocity: Vec2,
    elapsed: f32,
}

impl Default for DeathFall {
    fn default() -> Self {
        Self {
            velocity: Vec2::Y * DEATH_JUMP_VELOCITY,
            elapsed: 0.0,
        }
    }
}

impl DeathFall {
    pub fn advance(&mut self, position: &mut Vec2, dt: f32) -> Status {
        if self.elapsed >= DEATH_DURATION {
            return Status::Done;
        }
        *position += self.velocity * dt;
        self.velocity.y += DEATH_GRAVITY * dt;
        self.elapsed += dt;
        Status::Running
    }
}

/// Block item emerging: hidden briefly, then rising one unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemRise {
    Hidden(Countdown),
    Rising(Tween),
}

impl ItemRise {
    pub const HIDDEN_TIME: f32 = 0.25;
    pub const RISE_TIME: f32 = 0.5;

    pub fn new() -> Self {
        ItemRise::Hidden(Countdown::new(Self::HIDDEN_TIME))
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, ItemRise::Hidden(_))
    }

    /// Place the item where a complete rise would leave it
    pub fn finish(&self, position: &mut Vec2) {
        match self {
            ItemRise::Hidden(_) => *position += Vec2::Y,
            ItemRise::Rising(tween) => *position = tween.to,
        }
    }

    pub fn advance(&mut self, position: &mut Vec2, dt: f32) -> Status {
        match self {
            ItemRise::Hidden(timer) => {
                if timer.advance(dt) {
                    *self = ItemRise::Rising(Tween::new(
                        *position,
                        *position + Vec2::Y,
                        Self::RISE_TIME,
                    ));
                }
                Status::Running
            }
            ItemRise::Rising(tween) => {
                let (p, status) = tween.advance(dt);
                *position = p;
                status
            }
        }
    }
}

impl Default for ItemRise {
    fn default() -> Self {
        Self::new()
    }
}

/// Stages of a pipe transit
#[derive(Debug, Clone, Copy, PartialEq)]
enum PipeStage {
    Entering { position: Tween, scale: f32 },
    Waiting(Countdown),
    Exiting { position: Tween },
}

/// Player travelling between two connected pipes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeTransit {
    stage: PipeStage,
    destination: Vec2,
    exit_direction: Vec2,
}

impl PipeTransit {
    pub const MOVE_TIME: f32 = 1.0;
    pub const WAIT_TIME: f32 = 0.75;
    pub const ENTERED_SCALE: f32 = 0.25;

    pub fn new(
        player_position: Vec2,
        player_scale: f32,
        entered_position: Vec2,
        destination: Vec2,
        exit_direction: Vec2,
    ) -> Self {
        Self {
            stage: PipeStage::Entering {
                position: Tween::new(player_position, entered_position, Self::MOVE_TIME),
                scale: player_scale,
            },
            destination,
            exit_direction,
        }
    }

    pub fn advance(
        &mut self,
        position: &mut Vec2,
        scale: &mut f32,
        camera: &mut Camera,
        dt: f32,
    ) -> Status {
        match &mut self.stage {
            PipeStage::Entering { position: tween, scale: from } => {
                let progress = tween.elapsed / tween.duration;
                let (p, status) = tween.advance(dt);
                *position = p;
                *scale = *from + (Self::ENTERED_SCALE - *from) * progress.clamp(0.0, 1.0);
                if status == Status::Done {
                    *scale = Self::ENTERED_SCALE;
                    self.stage = PipeStage::Waiting(Countdown::new(Self::WAIT_TIME));
                }
                Status::Running
            }
            PipeStage::Waiting(timer) => {
                if !timer.advance(dt) {
                    return Status::Running;
                }
                camera.set_underground(camera.is_below_threshold(self.destination.y));
                if self.exit_direction != Vec2::ZERO {
                    *position = self.destination - self.exit_direction;
                    self.stage = PipeStage::Exiting {
                        position: Tween::new(
                            *position,
                            self.destination + self.exit_direction,
                            Self::MOVE_TIME,
                        ),
                    };
                    Status::Running
                } else {
                    *position = self.destination;
                    *scale = 1.0;
                    Status::Done
                }
            }
            PipeStage::Exiting { position: tween } => {
                let progress = (tween.elapsed / tween.duration).clamp(0.0, 1.0);
                let (p, status) = tween.advance(dt);
                *position = p;
                *scale = Self::ENTERED_SCALE + (1.0 - Self::ENTERED_SCALE) * progress;
                if status == Status::Done {
                    *scale = 1.0;
                }
                status
            }
        }
    }
}

/// What the level-complete walk asks its owner to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSignal {
    None,
    /// Player reached the castle and should vanish
    HidePlayer,
    /// Load the next level now
    LoadNext,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FlagStage {
    Walking { leg: usize },
    Waiting(Countdown),
    Finished,
}

/// Flag pole sequence: slide down, step off, walk into the castle, wait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelComplete {
    legs: [Vec2; 4],
    speed: f32,
    stage: FlagStage,
}

impl LevelComplete {
    pub const CASTLE_WAIT: f32 = 2.0;

    pub fn new(pole_bottom: Vec2, castle: Vec2, speed: f32) -> Self {
        Self {
            legs: [
                pole_bottom,
                pole_bottom + Vec2::X,
                pole_bottom + Vec2::X * 2.0 + Vec2::NEG_Y,
                castle,
            ],
            speed,
            stage: FlagStage::Walking { leg: 0 },
        }
    }

    pub fn advance(&mut self, position: &mut Vec2, dt: f32) -> FlagSignal {
        match &mut self.stage {
            FlagStage::Walking { leg } => {
                let walk = MoveTo::new(self.legs[*leg], self.speed);
                if walk.advance(position, dt) == Status::Done {
                    if *leg + 1 < self.legs.len() {
                        *leg += 1;
                    } else {
                        self.stage = FlagStage::Waiting(Countdown::new(Self::CASTLE_WAIT));
                        return FlagSignal::HidePlayer;
                    }
                }
                FlagSignal::None
            }
            FlagStage::Waiting(timer) => {
                if timer.advance(dt) {
                    self.stage = FlagStage::Finished;
                    FlagSignal::LoadNext
                } else {
                    FlagSignal::None
                }
            }
            FlagStage::Finished => FlagSignal::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;

    const DT: f32 = 1.0 / 50.0;

    #[test]
    fn test_countdown_fires_once_elapsed() {
        let mut timer = Countdown::new(0.1);
        assert!(!timer.advance(0.05));
        assert!(timer.advance(0.06));
    }

    #[test]
    fn test_up_and_back_returns_to_rest() {
        let mut bounce = UpAndBack::new(0.5, 0.125);
        let mut peak: f32 = 0.0;
        let mut ticks = 0;
        loop {
            let (offset, status) = bounce.advance(DT);
            peak = peak.max(offset.y);
            ticks += 1;
            if status == Status::Done {
                assert_eq!(offset, Vec2::ZERO);
                break;
            }
            assert!(ticks < 100);
        }
        assert!((peak - 0.5).abs() < 1e-5);
        // Two legs of ~7 ticks each plus the final rest sample
        assert!((14..=18).contains(&ticks));
    }

    #[test]
    fn test_move_to_snaps() {
        let walk = MoveTo::new(Vec2::new(1.0, 0.0), 6.0);
        let mut p = Vec2::ZERO;
        let mut ticks = 0;
        while walk.advance(&mut p, DT) == Status::Running {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(p, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_flicker_ends_after_half_second() {
        let mut flicker = Flicker::new(false);
        let mut frame = 0;
        while flicker.advance(1.0 / 60.0, frame) == Status::Running {
            frame += 1;
            assert!(frame < 100);
        }
        assert!((30..=31).contains(&frame));
    }

    #[test]
    fn test_death_fall_rises_then_falls() {
        let mut fall = DeathFall::default();
        let mut p = Vec2::ZERO;
        let mut peak: f32 = 0.0;
        while fall.advance(&mut p, DT) == Status::Running {
            peak = peak.max(p.y);
        }
        assert!(peak > 1.0);
        assert!(p.y < -100.0);
    }

    #[test]
    fn test_item_rise() {
        let mut rise = ItemRise::new();
        let mut p = Vec2::new(3.0, 4.0);
        let mut ticks = 0;
        while rise.advance(&mut p, DT) == Status::Running {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(p, Vec2::new(3.0, 5.0));
    }

    #[test]
    fn test_item_rise_finish_lands_on_top() {
        let mut p = Vec2::new(3.0, 4.0);
        ItemRise::new().finish(&mut p);
        assert_eq!(p, Vec2::new(3.0, 5.0));

        let mut rise = ItemRise::new();
        let mut p = Vec2::new(3.0, 4.0);
        for _ in 0..15 {
            rise.advance(&mut p, DT);
        }
        assert!(!rise.is_hidden());
        rise.finish(&mut p);
        assert_eq!(p, Vec2::new(3.0, 5.0));
    }

    #[test]
    fn test_pipe_transit_with_exit() {
        let tuning = Tuning::default();
        let mut camera = Camera::new(&tuning, 0.0);
        let mut transit = PipeTransit::new(
            Vec2::new(0.0, 2.0),
            1.0,
            Vec2::new(0.0, 1.0),
            Vec2::new(50.0, -10.0),
            Vec2::Y,
        );
        let mut p = Vec2::new(0.0, 2.0);
        let mut scale = 1.0;
        let mut min_scale: f32 = 1.0;
        let mut ticks = 0;
        while transit.advance(&mut p, &mut scale, &mut camera, DT) == Status::Running {
            min_scale = min_scale.min(scale);
            ticks += 1;
            assert!(ticks < 500);
        }
        assert_eq!(p, Vec2::new(50.0, -9.0));
        assert_eq!(scale, 1.0);
        assert!((min_scale - PipeTransit::ENTERED_SCALE).abs() < 1e-5);
        assert!(camera.is_underground());
    }

    #[test]
    fn test_pipe_transit_teleport() {
        let tuning = Tuning::default();
        let mut camera = Camera::new(&tuning, 0.0);
        let mut transit = PipeTransit::new(
            Vec2::ZERO,
            1.0,
            Vec2::NEG_Y,
            Vec2::new(20.0, 3.0),
            Vec2::ZERO,
        );
        let mut p = Vec2::ZERO;
        let mut scale = 1.0;
        while transit.advance(&mut p, &mut scale, &mut camera, DT) == Status::Running {}
        assert_eq!(p, Vec2::new(20.0, 3.0));
        assert_eq!(scale, 1.0);
        assert!(!camera.is_underground());
    }

    #[test]
    fn test_level_complete_signals() {
        let mut walk = LevelComplete::new(Vec2::new(10.0, 1.0), Vec2::new(15.0, 0.0), 6.0);
        let mut p = Vec2::new(10.0, 6.0);
        let mut hidden_at = None;
        let mut load_at = None;
        for tick in 0..1000 {
            match walk.advance(&mut p, DT) {
                FlagSignal::HidePlayer => hidden_at = Some(tick),
                FlagSignal::LoadNext => {
                    load_at = Some(tick);
                    break;
                }
                FlagSignal::None => {}
            }
        }
        let hidden_at = hidden_at.expect("player hidden");
        let load_at = load_at.expect("next level requested");
        assert_eq!(p, Vec2::new(15.0, 0.0));
        // Two-second wait at 50 Hz
        assert!((100..=101).contains(&(load_at - hidden_at)));
    }
}
