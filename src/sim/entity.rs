//! Level entities
//!
//! Every non-player object in a level is an `Entity` tagged with an
//! `EntityKind`. Kinds decide how contacts with the player and with pushed
//! spirits are resolved; the shared parts (body, locomotion, visibility
//! sleep, despawn timers, staged sequences) live on the entity itself.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::animation::SpriteAnimator;
use super::body::{Footprint, KinematicBody};
use super::collision::{Outcome, arbitrate_bump, arbitrate_hazard, arbitrate_stomp};
use super::geometry::{Aabb, LevelGeometry, Solid};
use super::locomotion::{Locomotion, LocomotionMode};
use super::player::{Player, Transition};
use super::sequence::{Countdown, DeathFall, ItemRise, MoveTo, Status, UpAndBack};
use super::state::{GameEvent, SoundCue};
use super::tick::TickInput;
use crate::{GameProgress, Tuning};

/// Frames in an enemy walk cycle
const WALK_FRAMES: usize = 2;
/// Removal delay for a demon killed by a spirit
const DEMON_DEATH_DESPAWN: f32 = 10.0;
/// Removal delay for a flattened shaman
const SHAMAN_FLATTEN_DESPAWN: f32 = 0.5;
/// Removal delay for a shaman killed by a spirit
const SHAMAN_DEATH_DESPAWN: f32 = 3.0;
/// Block bump height and per-leg time
const BLOCK_BOUNCE_HEIGHT: f32 = 0.5;
const BLOCK_BOUNCE_TIME: f32 = 0.125;
/// Coin pop height and per-leg time
const COIN_POP_HEIGHT: f32 = 2.0;
const COIN_POP_TIME: f32 = 0.25;
/// Input along a pipe's enter direction needed to go in
const PIPE_INPUT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Coin,
    ExtraLife,
    ArmorUp,
}

impl PowerUpKind {
    /// Whether the pickup walks once it is out in the open
    pub fn moves(self) -> bool {
        !matches!(self, PowerUpKind::Coin)
    }
}

/// What a block releases when bumped from below
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item")]
pub enum BlockItem {
    Coin,
    PowerUp { power_up: PowerUpKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemonState {
    Walking,
    /// Stomped; sits still until kicked
    Spirit,
    /// Kicked spirit sliding across the level
    Pushed,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShamanState {
    Walking,
    Flattened,
    Dead,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Demon {
        state: DemonState,
    },
    Shaman {
        state: ShamanState,
    },
    Spike,
    Terminator {
        /// Solid on the Default layer while a pushed spirit is close
        blocking: bool,
    },
    Block {
        item: Option<BlockItem>,
        /// `None` means unlimited
        hits_left: Option<u32>,
        revealed: bool,
    },
    /// Coin popping out of a block
    BlockCoin,
    PowerUp {
        kind: PowerUpKind,
        collectable: bool,
    },
    Pipe {
        name: String,
        /// Position of the connected pipe
        destination: Option<Vec2>,
        enter_direction: Vec2,
        exit_direction: Vec2,
    },
    FlagPole {
        flag: Vec2,
        pole_bottom: Vec2,
        castle: Vec2,
        next_world: u32,
        next_stage: u32,
        triggered: bool,
    },
    DeathBarrier,
}

impl EntityKind {
    /// Enemies that can hurt the player
    pub fn is_hostile(&self) -> bool {
        matches!(
            self,
            EntityKind::Demon { .. }
                | EntityKind::Shaman { .. }
                | EntityKind::Spike
                | EntityKind::Terminator { .. }
        )
    }

    pub fn is_pushed_spirit(&self) -> bool {
        matches!(
            self,
            EntityKind::Demon {
                state: DemonState::Pushed
            }
        )
    }
}

/// Which sprite an entity shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntitySprite {
    #[default]
    Normal,
    Spirit,
    Flat,
    Empty,
    Hidden,
}

/// Multi-tick scripted motion owned by an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntitySequence {
    Bounce { rest: Vec2, motion: UpAndBack },
    Rise(ItemRise),
    Dying(DeathFall),
    FlagSlide(MoveTo),
}

/// Entities a handler asks the world to create
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spawn {
    BlockCoin(Vec2),
    Item { kind: PowerUpKind, position: Vec2 },
}

/// Collaborators a contact handler may touch
pub struct Context<'a> {
    pub tuning: &'a Tuning,
    pub progress: &'a mut GameProgress,
    pub events: &'a mut Vec<GameEvent>,
    pub spawns: &'a mut Vec<Spawn>,
    /// Level the flag pole asked for, loaded when the walk finishes
    pub next_level: &'a mut Option<(u32, u32)>,
}

impl Context<'_> {
    fn cue(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    /// Apply a player hit and report the outcome
    fn hurt(&mut self, player: &mut Player) {
        let transition = player.hit(self.progress);
        self.announce(transition);
    }

    fn announce(&mut self, transition: Transition) {
        match transition {
            Transition::Unchanged => return,
            Transition::Grew(_) => self.cue(SoundCue::ArmorUp),
            Transition::Shrank(_) => self.cue(SoundCue::LosingArmor),
            Transition::Died => self.cue(SoundCue::Death),
        }
        self.events.push(GameEvent::Player(transition));
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: KinematicBody,
    pub locomotion: Option<Locomotion>,
    pub collider_enabled: bool,
    /// Inside the camera view as of the last frame
    pub on_screen: bool,
    pub sprite: EntitySprite,
    pub animator: SpriteAnimator,
    pub facing_right: bool,
    pub sequence: Option<EntitySequence>,
    /// Unconditional removal timer
    pub despawn: Option<Countdown>,
    /// Removal timer that runs only while off screen
    offscreen_despawn: Option<Countdown>,
    pub removed: bool,
}

impl Entity {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        position: Vec2,
        size: Option<Vec2>,
        tuning: &Tuning,
    ) -> Self {
        let footprint = Footprint::new(size.unwrap_or(Vec2::ONE), Vec2::ZERO);
        let locomotion = match &kind {
            EntityKind::Demon { .. } | EntityKind::Shaman { .. } => Some(Locomotion::new(
                Vec2::NEG_X,
                tuning.enemy_speed,
                LocomotionMode::Walk,
            )),
            EntityKind::Terminator { .. } => Some(Locomotion::new(
                Vec2::NEG_X,
                tuning.terminator_speed,
                LocomotionMode::Chase,
            )),
            EntityKind::PowerUp { kind, .. } if kind.moves() => Some(Locomotion::new(
                Vec2::X,
                tuning.power_up_speed,
                LocomotionMode::Slide,
            )),
            _ => None,
        };
        let sprite = match &kind {
            EntityKind::Block {
                revealed: false, ..
            } => EntitySprite::Hidden,
            EntityKind::Block {
                hits_left: Some(0),
                ..
            } => EntitySprite::Empty,
            _ => EntitySprite::Normal,
        };
        let mut animator = SpriteAnimator::new(WALK_FRAMES);
        animator.set_enabled(kind.is_hostile() || matches!(kind, EntityKind::BlockCoin));

        // Moving entities stay frozen until the camera first sees them
        let mut body = KinematicBody::new(id, position, footprint);
        if locomotion.is_some() {
            body.sleep();
        }

        Self {
            id,
            kind,
            body,
            locomotion,
            collider_enabled: true,
            on_screen: false,
            sprite,
            animator,
            facing_right: false,
            sequence: None,
            despawn: None,
            offscreen_despawn: None,
            removed: false,
        }
    }

    /// Coin popping out of a block; adds its coin the moment it appears
    pub fn block_coin(id: EntityId, position: Vec2, tuning: &Tuning) -> Self {
        let mut coin = Self::new(id, EntityKind::BlockCoin, position, None, tuning);
        coin.collider_enabled = false;
        coin.sequence = Some(EntitySequence::Bounce {
            rest: position,
            motion: UpAndBack::new(COIN_POP_HEIGHT, COIN_POP_TIME),
        });
        coin
    }

    /// Power-up emerging from a block
    pub fn block_item(id: EntityId, kind: PowerUpKind, position: Vec2, tuning: &Tuning) -> Self {
        let mut item = Self::new(
            id,
            EntityKind::PowerUp {
                kind,
                collectable: false,
            },
            position,
            None,
            tuning,
        );
        item.collider_enabled = false;
        item.sprite = EntitySprite::Hidden;
        item.body.sleep();
        item.sequence = Some(EntitySequence::Rise(ItemRise::new()));
        item
    }

    pub fn aabb(&self) -> Aabb {
        self.body.aabb()
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Collision-layer solid this entity contributes this tick
    pub fn solid(&self) -> Option<Solid> {
        if self.removed || !self.collider_enabled {
            return None;
        }
        match self.kind {
            EntityKind::Block { .. } | EntityKind::Terminator { blocking: true } => {
                Some(Solid::owned(self.aabb(), self.id))
            }
            _ => None,
        }
    }

    /// Should locomotion run when the entity is on screen?
    fn wants_locomotion(&self) -> bool {
        if self.sequence.is_some() || self.removed {
            return false;
        }
        match &self.kind {
            EntityKind::Demon { state } => {
                matches!(state, DemonState::Walking | DemonState::Pushed)
            }
            EntityKind::Shaman { state } => *state == ShamanState::Walking,
            EntityKind::Terminator { .. } => true,
            EntityKind::PowerUp { collectable, .. } => *collectable,
            _ => false,
        }
    }

    /// Pushed spirits keep sliding after they leave the screen
    fn keeps_moving_off_screen(&self) -> bool {
        self.kind.is_pushed_spirit()
    }

    fn enable_locomotion(&mut self) {
        if let Some(locomotion) = self.locomotion.as_mut() {
            locomotion.enable(&mut self.body);
        }
    }

    fn disable_locomotion(&mut self) {
        if let Some(locomotion) = self.locomotion.as_mut() {
            locomotion.disable(&mut self.body);
        }
    }

    /// Frame-clock visibility change; only acts on transitions
    pub fn set_on_screen(&mut self, on_screen: bool, tuning: &Tuning) {
        if on_screen == self.on_screen || self.removed {
            return;
        }
        self.on_screen = on_screen;

        if on_screen {
            self.offscreen_despawn = None;
            if self.wants_locomotion() {
                self.enable_locomotion();
            }
            return;
        }

        self.cancel_sequence();
        if self.keeps_moving_off_screen() {
            self.offscreen_despawn = Some(Countdown::new(tuning.spirit_despawn_delay));
            return;
        }
        if matches!(self.kind, EntityKind::Terminator { .. }) {
            self.offscreen_despawn = Some(Countdown::new(tuning.terminator_despawn_delay));
        }
        self.disable_locomotion();
    }

    /// One fixed tick: sequences, locomotion and timers
    pub fn step(
        &mut self,
        geometry: &LevelGeometry,
        tuning: &Tuning,
        player_x: f32,
        events: &mut Vec<GameEvent>,
        dt: f32,
    ) {
        if self.removed {
            return;
        }

        // A sequence owns the body until the tick after it finishes
        let sequenced = self.sequence.is_some();
        self.advance_sequence(dt);

        if let Some(locomotion) = self.locomotion.as_mut().filter(|_| !sequenced) {
            let chase = match self.kind {
                EntityKind::Terminator { .. } => Some(player_x),
                _ => None,
            };
            let report = locomotion.step(
                &mut self.body,
                geometry,
                tuning.entity_gravity,
                tuning.entity_terminal_fall_speed,
                chase,
                dt,
            );
            if report.reversed && self.kind.is_pushed_spirit() {
                events.push(GameEvent::Sound(SoundCue::SpiritHit));
            }
            if locomotion.direction.x > 0.0 {
                self.facing_right = true;
            } else if locomotion.direction.x < 0.0 {
                self.facing_right = false;
            }
        }

        if let Some(timer) = self.despawn.as_mut() {
            if timer.advance(dt) {
                self.removed = true;
            }
        }
        if let Some(timer) = self.offscreen_despawn.as_mut() {
            if timer.advance(dt) {
                self.removed = true;
                if matches!(self.kind, EntityKind::Terminator { .. }) {
                    events.push(GameEvent::Sound(SoundCue::TerminatorGone));
                }
            }
        }
    }

    fn advance_sequence(&mut self, dt: f32) {
        let Some(sequence) = self.sequence.as_mut() else {
            return;
        };
        let done = match sequence {
            EntitySequence::Bounce { rest, motion } => {
                let (offset, status) = motion.advance(dt);
                self.body.position = *rest + offset;
                status == Status::Done
            }
            EntitySequence::Rise(rise) => {
                let status = rise.advance(&mut self.body.position, dt);
                self.sprite = if rise.is_hidden() {
                    EntitySprite::Hidden
                } else {
                    EntitySprite::Normal
                };
                status == Status::Done
            }
            EntitySequence::Dying(fall) => {
                fall.advance(&mut self.body.position, dt);
                false
            }
            EntitySequence::FlagSlide(slide) => match &mut self.kind {
                EntityKind::FlagPole { flag, .. } => slide.advance(flag, dt) == Status::Done,
                _ => true,
            },
        };
        if !done {
            return;
        }

        self.sequence = None;
        self.finish_sequence();
    }

    /// Jump a running sequence to its end state and drop it
    fn cancel_sequence(&mut self) {
        let Some(sequence) = self.sequence.take() else {
            return;
        };
        log::debug!("{} left the view mid-sequence", self.id);
        match sequence {
            EntitySequence::Bounce { rest, .. } => self.body.position = rest,
            EntitySequence::Rise(rise) => rise.finish(&mut self.body.position),
            EntitySequence::Dying(_) => {}
            EntitySequence::FlagSlide(slide) => {
                if let EntityKind::FlagPole { flag, .. } = &mut self.kind {
                    *flag = slide.destination;
                }
            }
        }
        self.finish_sequence();
    }

    /// Effects of a sequence reaching its end
    fn finish_sequence(&mut self) {
        match &mut self.kind {
            EntityKind::BlockCoin => self.removed = true,
            EntityKind::PowerUp { collectable, .. } => {
                *collectable = true;
                self.collider_enabled = true;
                self.sprite = EntitySprite::Normal;
                if self.on_screen {
                    self.body.wake();
                    self.enable_locomotion();
                }
            }
            _ => {}
        }
    }

    /// Death animation shared by enemies killed by a spirit
    fn die(&mut self, despawn_after: f32) {
        self.disable_locomotion();
        self.collider_enabled = false;
        self.animator.set_enabled(false);
        self.sequence = Some(EntitySequence::Dying(DeathFall::default()));
        self.despawn = Some(Countdown::new(despawn_after));
    }

    /// The player started touching this entity
    pub fn on_player_enter(&mut self, player: &mut Player, ctx: &mut Context<'_>) {
        if self.removed || !self.collider_enabled {
            return;
        }
        let attacker = (EntityId::PLAYER, player.body.position);
        let defender = (self.id, self.body.position);

        match &mut self.kind {
            EntityKind::Demon { state } => match *state {
                DemonState::Walking => {
                    if arbitrate_stomp(attacker, defender).outcome == Outcome::AttackerWins {
                        log::debug!("demon {} stomped into a spirit", self.id);
                        *state = DemonState::Spirit;
                        self.disable_locomotion();
                        self.animator.set_enabled(false);
                        self.sprite = EntitySprite::Spirit;
                        ctx.cue(SoundCue::Stomp);
                        player.movement.bounce(&mut player.body, ctx.tuning);
                    } else {
                        ctx.hurt(player);
                    }
                }
                DemonState::Spirit => {
                    *state = DemonState::Pushed;
                    let away = self.body.position.x - player.body.position.x;
                    let direction = if away < 0.0 { -1.0 } else { 1.0 };
                    log::debug!("spirit {} pushed toward {:+}", self.id, direction);
                    let mut locomotion = Locomotion::new(
                        Vec2::new(direction, 0.0),
                        ctx.tuning.spirit_speed,
                        LocomotionMode::Slide,
                    );
                    locomotion.enable(&mut self.body);
                    self.locomotion = Some(locomotion);
                    ctx.cue(SoundCue::SpiritHit);
                }
                DemonState::Pushed => ctx.hurt(player),
                DemonState::Dead => {}
            },
            EntityKind::Shaman { state } => {
                if *state != ShamanState::Walking {
                    return;
                }
                if arbitrate_stomp(attacker, defender).outcome == Outcome::AttackerWins {
                    log::debug!("shaman {} flattened", self.id);
                    *state = ShamanState::Flattened;
                    self.collider_enabled = false;
                    self.disable_locomotion();
                    self.animator.set_enabled(false);
                    self.sprite = EntitySprite::Flat;
                    self.despawn = Some(Countdown::new(SHAMAN_FLATTEN_DESPAWN));
                    ctx.cue(SoundCue::Stomp);
                    player.movement.bounce(&mut player.body, ctx.tuning);
                } else {
                    ctx.hurt(player);
                }
            }
            EntityKind::Spike | EntityKind::Terminator { .. } => {
                if arbitrate_hazard(attacker, defender).outcome == Outcome::DefenderWins {
                    ctx.hurt(player);
                }
            }
            EntityKind::Block {
                item,
                hits_left,
                revealed,
            } => {
                let bumped = arbitrate_bump(attacker, defender).outcome == Outcome::AttackerWins;
                if self.sequence.is_some() || *hits_left == Some(0) || !bumped {
                    return;
                }
                ctx.cue(SoundCue::BlockHit);
                *revealed = true;
                self.sprite = EntitySprite::Normal;
                if let Some(left) = hits_left.as_mut() {
                    *left = left.saturating_sub(1);
                    if *left == 0 {
                        self.sprite = EntitySprite::Empty;
                    }
                }
                match *item {
                    Some(BlockItem::Coin) => {
                        ctx.progress.add_coin();
                        ctx.cue(SoundCue::Coin);
                        ctx.spawns.push(Spawn::BlockCoin(self.body.position));
                    }
                    Some(BlockItem::PowerUp { power_up }) => {
                        ctx.spawns.push(Spawn::Item {
                            kind: power_up,
                            position: self.body.position,
                        });
                    }
                    None => {}
                }
                self.sequence = Some(EntitySequence::Bounce {
                    rest: self.body.position,
                    motion: UpAndBack::new(BLOCK_BOUNCE_HEIGHT, BLOCK_BOUNCE_TIME),
                });
            }
            EntityKind::PowerUp { kind, collectable } => {
                if !*collectable {
                    return;
                }
                match *kind {
                    PowerUpKind::Coin => {
                        ctx.progress.add_coin();
                        ctx.cue(SoundCue::Coin);
                    }
                    PowerUpKind::ExtraLife => {
                        ctx.progress.add_life();
                        ctx.cue(SoundCue::ExtraLife);
                    }
                    PowerUpKind::ArmorUp => {
                        let transition = player.grow();
                        ctx.announce(transition);
                    }
                }
                self.removed = true;
            }
            EntityKind::FlagPole {
                pole_bottom,
                castle,
                next_world,
                next_stage,
                triggered,
                ..
            } => {
                if *triggered || player.is_dead() {
                    return;
                }
                *triggered = true;
                log::info!("flag reached, next level {}-{}", next_world, next_stage);
                ctx.cue(SoundCue::Victory);
                *ctx.next_level = Some((*next_world, *next_stage));
                self.sequence = Some(EntitySequence::FlagSlide(MoveTo::new(
                    *pole_bottom,
                    ctx.tuning.flag_speed,
                )));
                player.complete_level(*pole_bottom, *castle, ctx.tuning.flag_speed);
            }
            EntityKind::DeathBarrier => {
                if !player.is_dead() {
                    player.death(ctx.progress);
                    ctx.announce(Transition::Died);
                }
            }
            EntityKind::BlockCoin | EntityKind::Pipe { .. } => {}
        }
    }

    /// The player is overlapping this entity this tick
    pub fn on_player_stay(
        &mut self,
        player: &mut Player,
        input: &TickInput,
        ctx: &mut Context<'_>,
    ) {
        let EntityKind::Pipe {
            name,
            destination: Some(destination),
            enter_direction,
            exit_direction,
        } = &self.kind
        else {
            return;
        };
        if player.in_sequence() || player.is_dead() {
            return;
        }
        let pushed = Vec2::new(input.horizontal, input.vertical).dot(*enter_direction);
        if pushed <= PIPE_INPUT_THRESHOLD {
            return;
        }
        log::info!("player entering pipe {}", name);
        ctx.cue(SoundCue::PipeEnter);
        player.enter_pipe(
            self.body.position + *enter_direction,
            *destination,
            *exit_direction,
        );
    }

    /// A pushed spirit ran into this entity
    pub fn on_spirit_contact(&mut self) {
        if self.removed {
            return;
        }
        match &mut self.kind {
            EntityKind::Demon { state } if *state == DemonState::Walking => {
                log::debug!("demon {} knocked out by a spirit", self.id);
                *state = DemonState::Dead;
                self.die(DEMON_DEATH_DESPAWN);
            }
            EntityKind::Shaman { state } if *state == ShamanState::Walking => {
                log::debug!("shaman {} knocked out by a spirit", self.id);
                *state = ShamanState::Dead;
                self.die(SHAMAN_DEATH_DESPAWN);
            }
            _ => {}
        }
    }
}
