//! World state and core simulation types
//!
//! A `World` is one loaded level: terrain, camera, player and entities.
//! It is rebuilt from its `LevelLayout` whenever a level (re)loads.

use std::collections::BTreeSet;

use glam::Vec2;

use super::EntityId;
use super::camera::Camera;
use super::entity::{Entity, EntityKind, Spawn};
use super::geometry::{LevelGeometry, Solid};
use super::player::{Player, Transition};
use crate::level::{LevelLayout, SpawnKind};
use crate::{SimError, Tuning};

/// One-shot audio requests for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Jump,
    Stomp,
    SpiritHit,
    BlockHit,
    Coin,
    ExtraLife,
    ArmorUp,
    LosingArmor,
    Death,
    PipeEnter,
    Victory,
    TerminatorGone,
}

/// Things that happened during a tick, drained by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundCue),
    Player(Transition),
    Spawned(EntityId),
    Despawned(EntityId),
}

#[derive(Debug, Clone)]
pub struct World {
    pub tuning: Tuning,
    pub world: u32,
    pub stage: u32,
    /// Fixed ticks simulated so far
    pub time_ticks: u64,
    /// Frames rendered so far (drives the flicker cadence)
    pub frame_count: u64,
    pub geometry: LevelGeometry,
    pub camera: Camera,
    pub player: Player,
    /// Sorted by id; iteration order is part of determinism
    pub entities: Vec<Entity>,
    pub events: Vec<GameEvent>,
    /// Level requested by the flag pole
    pub next_level: Option<(u32, u32)>,
    /// Entities the player touched last tick
    pub(crate) contacts: BTreeSet<EntityId>,
    next_id: u32,
}

impl World {
    /// Build a level, failing on a missing player spawn, a dangling pipe
    /// connection, or bad tuning
    pub fn new(layout: &LevelLayout, tuning: Tuning) -> Result<Self, SimError> {
        tuning.validate()?;
        let spawn = layout.player_spawn.ok_or(SimError::MissingPlayerSpawn {
            world: layout.world,
            stage: layout.stage,
        })?;

        let mut geometry = LevelGeometry::new();
        for aabb in &layout.solids {
            geometry.add(Solid::terrain(*aabb));
        }

        let camera = Camera::new(&tuning, layout.camera_start_x).with_mode(layout.camera_mode);
        let mut world = Self {
            tuning,
            world: layout.world,
            stage: layout.stage,
            time_ticks: 0,
            frame_count: 0,
            geometry,
            camera,
            player: Player::new(spawn),
            entities: Vec::with_capacity(layout.spawns.len()),
            events: Vec::new(),
            next_level: None,
            contacts: BTreeSet::new(),
            next_id: EntityId::PLAYER.0 + 1,
        };

        for point in &layout.spawns {
            let kind = match &point.entity {
                SpawnKind::Pipe {
                    name,
                    connection,
                    enter_direction,
                    exit_direction,
                } => {
                    let destination = match connection {
                        Some(target) => Some(layout.pipe_position(target).ok_or_else(|| {
                            SimError::UnknownPipeConnection {
                                pipe: name.clone(),
                                connection: target.clone(),
                            }
                        })?),
                        None => None,
                    };
                    EntityKind::Pipe {
                        name: name.clone(),
                        destination,
                        enter_direction: *enter_direction,
                        exit_direction: *exit_direction,
                    }
                }
                other => other.to_kind(),
            };
            world.spawn(kind, point.position, point.size);
        }

        log::info!(
            "Built level {}-{}: {} solids, {} entities",
            world.world,
            world.stage,
            layout.solids.len(),
            world.entities.len()
        );
        Ok(world)
    }

    /// Add an entity; ids are handed out in spawn order
    pub fn spawn(&mut self, kind: EntityKind, position: Vec2, size: Option<Vec2>) -> EntityId {
        let id = self.allocate_id();
        self.entities
            .push(Entity::new(id, kind, position, size, &self.tuning));
        id
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create what a contact handler asked for
    pub(crate) fn apply_spawn(&mut self, spawn: Spawn) {
        let id = self.allocate_id();
        let entity = match spawn {
            Spawn::BlockCoin(position) => Entity::block_coin(id, position, &self.tuning),
            Spawn::Item { kind, position } => Entity::block_item(id, kind, position, &self.tuning),
        };
        log::debug!("spawned {:?} as {}", entity.kind, id);
        self.entities.push(entity);
        self.events.push(GameEvent::Spawned(id));
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entities[i])
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.entities.binary_search_by_key(&id, |e| e.id) {
            Ok(i) => Some(&mut self.entities[i]),
            Err(_) => None,
        }
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Recompute the solids that move or toggle with their entities
    pub(crate) fn refresh_dynamic_solids(&mut self) {
        let solids: Vec<Solid> = self.entities.iter().filter_map(Entity::solid).collect();
        self.geometry.set_dynamic(solids);
    }

    /// Drop removed entities, reporting each one
    pub(crate) fn sweep_removed(&mut self) {
        let events = &mut self.events;
        let contacts = &mut self.contacts;
        self.entities.retain(|e| {
            if e.removed {
                log::debug!("despawned {} ({:?})", e.id, e.kind);
                events.push(GameEvent::Despawned(e.id));
                contacts.remove(&e.id);
            }
            !e.removed
        });
    }
}
