//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only for anything that moves a body
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or audio dependencies; cues are emitted as events

pub mod animation;
pub mod body;
pub mod camera;
pub mod collision;
pub mod entity;
pub mod geometry;
pub mod locomotion;
pub mod movement;
pub mod pilot;
pub mod player;
pub mod probe;
pub mod sequence;
pub mod state;
pub mod tick;

use serde::{Deserialize, Serialize};

/// Stable identity of a simulated entity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The player always has id 0
    pub const PLAYER: EntityId = EntityId(0);
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub use animation::SpriteAnimator;
pub use body::{Footprint, KinematicBody};
pub use camera::{Camera, CameraMode};
pub use collision::{
    CollisionEvent, Outcome, arbitrate_bump, arbitrate_hazard, arbitrate_stomp, directional_test,
};
pub use entity::{BlockItem, Entity, EntityKind, EntitySprite, PowerUpKind};
pub use geometry::{Aabb, CollisionLayer, LevelGeometry, Solid};
pub use locomotion::{Locomotion, LocomotionMode};
pub use movement::PlayerMovement;
pub use pilot::DemoPilot;
pub use player::{Player, PlayerPose, PlayerVisual, PowerState, SizeTier, Transition};
pub use probe::probe;
pub use state::{GameEvent, SoundCue, World};
pub use tick::{TickInput, frame, tick};
