//! Fixed timestep simulation tick
//!
//! `tick` moves every body and resolves contacts; `frame` runs once per
//! rendered frame for the camera, visibility and visuals.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entity::{Context, EntityKind};
use super::sequence::FlagSignal;
use super::state::{GameEvent, SoundCue, World};
use crate::GameProgress;

/// Overlap margin for player contacts
const CONTACT_SKIN: f32 = 0.05;
/// How close a pushed spirit gets before a terminator turns solid
const TERMINATOR_BLOCK_RANGE: f32 = 1.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Horizontal axis in [-1, 1]
    pub horizontal: f32,
    /// Vertical axis in [-1, 1] (pipes)
    pub vertical: f32,
    /// Jump went down this frame; consumed by the first tick
    pub jump_pressed: bool,
    /// Jump is being held
    pub jump_held: bool,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, progress: &mut GameProgress, input: &TickInput, dt: f32) {
    world.time_ticks += 1;
    world.refresh_dynamic_solids();

    // Player
    if world.player.in_sequence() {
        let signal = world.player.advance_sequence(&mut world.camera, dt);
        if signal == FlagSignal::LoadNext {
            if let Some((next_world, next_stage)) = world.next_level.take() {
                progress.load_level(next_world, next_stage);
            }
        }
    } else {
        let screen = world.camera.horizontal_extent();
        let player = &mut world.player;
        let report = player.movement.step(
            &mut player.body,
            input,
            &world.geometry,
            &world.tuning,
            screen,
            dt,
        );
        if report.jumped {
            world.events.push(GameEvent::Sound(SoundCue::Jump));
        }
    }

    // Entities, in id order
    let player_x = world.player.body.position.x;
    for entity in &mut world.entities {
        entity.step(
            &world.geometry,
            &world.tuning,
            player_x,
            &mut world.events,
            dt,
        );
    }

    update_terminators(world);
    let spawns = player_contacts(world, progress, input);
    spirit_contacts(world);
    death_barriers(world);

    for spawn in spawns {
        world.apply_spawn(spawn);
    }
    world.sweep_removed();
}

/// Terminators turn solid while a pushed spirit is nearby
fn update_terminators(world: &mut World) {
    let spirits: Vec<_> = world
        .entities
        .iter()
        .filter(|e| e.kind.is_pushed_spirit() && !e.removed)
        .map(|e| e.aabb())
        .collect();

    for entity in &mut world.entities {
        let aabb = entity.aabb();
        if let EntityKind::Terminator { blocking } = &mut entity.kind {
            let near = spirits
                .iter()
                .any(|s| s.overlaps(&aabb, TERMINATOR_BLOCK_RANGE));
            if near != *blocking {
                log::debug!("terminator {} blocking: {}", entity.id, near);
                *blocking = near;
            }
        }
    }
}

/// Fire enter/stay handlers for everything the player touches
fn player_contacts(
    world: &mut World,
    progress: &mut GameProgress,
    input: &TickInput,
) -> Vec<super::entity::Spawn> {
    let mut spawns = Vec::new();
    if !world.player.collider_enabled() {
        world.contacts.clear();
        return spawns;
    }

    let World {
        tuning,
        player,
        entities,
        events,
        next_level,
        contacts,
        ..
    } = world;
    let mut ctx = Context {
        tuning,
        progress,
        events,
        spawns: &mut spawns,
        next_level,
    };

    let mut touching = BTreeSet::new();
    for entity in entities.iter_mut() {
        if entity.removed || !entity.collider_enabled {
            continue;
        }
        if !player.body.aabb().overlaps(&entity.aabb(), CONTACT_SKIN) {
            continue;
        }
        touching.insert(entity.id);
        if !contacts.contains(&entity.id) {
            entity.on_player_enter(player, &mut ctx);
        }
        entity.on_player_stay(player, input, &mut ctx);

        if player.is_dead() || !player.collider_enabled() {
            break;
        }
    }
    *contacts = touching;
    spawns
}

/// Pushed spirits knock out whatever walks into them
fn spirit_contacts(world: &mut World) {
    let spirits: Vec<_> = world
        .entities
        .iter()
        .filter(|e| e.kind.is_pushed_spirit() && !e.removed)
        .map(|e| (e.id, e.aabb()))
        .collect();
    if spirits.is_empty() {
        return;
    }

    for entity in &mut world.entities {
        if entity.removed || !entity.collider_enabled {
            continue;
        }
        let aabb = entity.aabb();
        let hit = spirits
            .iter()
            .any(|(id, spirit)| *id != entity.id && spirit.overlaps(&aabb, 0.0));
        if hit {
            entity.on_spirit_contact();
        }
    }
}

/// Anything that walks into a death barrier is gone
fn death_barriers(world: &mut World) {
    let barriers: Vec<_> = world
        .entities
        .iter()
        .filter(|e| matches!(e.kind, EntityKind::DeathBarrier))
        .map(|e| e.aabb())
        .collect();

    for entity in &mut world.entities {
        if entity.removed || entity.locomotion.is_none() {
            continue;
        }
        let aabb = entity.aabb();
        if barriers.iter().any(|b| b.overlaps(&aabb, 0.0)) {
            log::debug!("{} fell out of the level", entity.id);
            entity.removed = true;
        }
    }
}

/// Per-frame update: camera, visibility and visuals
pub fn frame(world: &mut World, dt: f32) {
    world.frame_count += 1;

    if !world.player.is_dead() {
        world.camera.follow(world.player.body.position);
    }

    let view = world.camera.view_rect();
    for entity in &mut world.entities {
        let visible = view.overlaps(&entity.aabb(), 0.0);
        entity.set_on_screen(visible, &world.tuning);
    }

    world.player.update_visual(dt, world.frame_count);
    for entity in &mut world.entities {
        entity.animator.advance(dt);
    }
}
