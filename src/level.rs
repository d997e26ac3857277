//! Level layouts
//!
//! A layout is static terrain plus a list of spawn points. Layouts are plain
//! JSON documents; `LevelLayout::demo` builds a playable stage in code.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::SimError;
use crate::sim::camera::CameraMode;
use crate::sim::entity::{BlockItem, DemonState, EntityKind, PowerUpKind, ShamanState};
use crate::sim::geometry::Aabb;

/// What to place at a spawn point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SpawnKind {
    Demon,
    Shaman,
    Spike,
    Terminator,
    Block {
        #[serde(default)]
        item: Option<BlockItem>,
        /// Bumps before the block goes empty; unlimited when absent
        #[serde(default)]
        max_hits: Option<u32>,
        /// Hidden blocks only show up once bumped
        #[serde(default = "default_revealed")]
        revealed: bool,
    },
    PowerUp {
        power_up: PowerUpKind,
    },
    Pipe {
        name: String,
        /// Name of the pipe this one leads to; exit-only pipes have none
        #[serde(default)]
        connection: Option<String>,
        enter_direction: Vec2,
        #[serde(default)]
        exit_direction: Vec2,
    },
    FlagPole {
        flag: Vec2,
        pole_bottom: Vec2,
        castle: Vec2,
        next_world: u32,
        next_stage: u32,
    },
    DeathBarrier,
}

fn default_revealed() -> bool {
    true
}

impl SpawnKind {
    /// Entity kind in its starting state; pipe destinations are left for
    /// the world to resolve
    pub fn to_kind(&self) -> EntityKind {
        match self {
            SpawnKind::Demon => EntityKind::Demon {
                state: DemonState::Walking,
            },
            SpawnKind::Shaman => EntityKind::Shaman {
                state: ShamanState::Walking,
            },
            SpawnKind::Spike => EntityKind::Spike,
            SpawnKind::Terminator => EntityKind::Terminator { blocking: false },
            SpawnKind::Block {
                item,
                max_hits,
                revealed,
            } => EntityKind::Block {
                item: *item,
                hits_left: *max_hits,
                revealed: *revealed,
            },
            SpawnKind::PowerUp { power_up } => EntityKind::PowerUp {
                kind: *power_up,
                collectable: true,
            },
            SpawnKind::Pipe {
                name,
                enter_direction,
                exit_direction,
                ..
            } => EntityKind::Pipe {
                name: name.clone(),
                destination: None,
                enter_direction: *enter_direction,
                exit_direction: *exit_direction,
            },
            SpawnKind::FlagPole {
                flag,
                pole_bottom,
                castle,
                next_world,
                next_stage,
            } => EntityKind::FlagPole {
                flag: *flag,
                pole_bottom: *pole_bottom,
                castle: *castle,
                next_world: *next_world,
                next_stage: *next_stage,
                triggered: false,
            },
            SpawnKind::DeathBarrier => EntityKind::DeathBarrier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub position: Vec2,
    /// Collider size; one unit square when absent
    #[serde(default)]
    pub size: Option<Vec2>,
    #[serde(flatten)]
    pub entity: SpawnKind,
}

impl SpawnPoint {
    pub fn new(position: Vec2, entity: SpawnKind) -> Self {
        Self {
            position,
            size: None,
            entity,
        }
    }

    pub fn sized(position: Vec2, size: Vec2, entity: SpawnKind) -> Self {
        Self {
            position,
            size: Some(size),
            entity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub world: u32,
    pub stage: u32,
    pub player_spawn: Option<Vec2>,
    #[serde(default)]
    pub camera_start_x: f32,
    #[serde(default)]
    pub camera_mode: CameraMode,
    /// Static terrain on the Default layer
    #[serde(default)]
    pub solids: Vec<Aabb>,
    #[serde(default)]
    pub spawns: Vec<SpawnPoint>,
}

impl LevelLayout {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a layout from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let layout = Self::from_json(&json)?;
        log::info!(
            "Loaded level {}-{} from {}",
            layout.world,
            layout.stage,
            path.display()
        );
        Ok(layout)
    }

    /// Position of the named pipe, if the layout has one
    pub fn pipe_position(&self, name: &str) -> Option<Vec2> {
        self.spawns.iter().find_map(|s| match &s.entity {
            SpawnKind::Pipe { name: n, .. } if n == name => Some(s.position),
            _ => None,
        })
    }

    /// Built-in stage: blocks, enemies, a pit, a pipe detour through an
    /// underground room, a staircase and the flag pole
    pub fn demo(world: u32, stage: u32) -> Self {
        let (next_world, next_stage) = if stage >= 4 {
            (world + 1, 1)
        } else {
            (world, stage + 1)
        };
        let boxed =
            |x0: f32, y0: f32, x1: f32, y1: f32| Aabb::new(Vec2::new(x0, y0), Vec2::new(x1, y1));

        let mut solids = vec![
            // Ground with a pit at 60..63
            boxed(-10.0, -1.0, 60.0, 0.0),
            boxed(63.0, -1.0, 150.0, 0.0),
            // Entry pipe body
            boxed(19.0, 0.0, 21.0, 2.0),
            // Exit pipe body
            boxed(44.0, 0.0, 46.0, 2.0),
            // Underground room: floor, ceiling, walls, sideways exit pipe
            boxed(14.0, -17.0, 40.0, -16.0),
            boxed(14.0, -12.0, 40.0, -11.0),
            boxed(14.0, -16.0, 15.0, -12.0),
            boxed(39.0, -16.0, 40.0, -12.0),
            boxed(37.0, -16.0, 39.0, -14.0),
            // Flag pole base
            boxed(134.5, 0.0, 135.5, 1.0),
        ];
        // Staircase ahead of the flag pole
        for step in 0..4 {
            let x = 110.0 + step as f32;
            solids.push(boxed(x, 0.0, x + 1.0, step as f32 + 1.0));
        }

        let block = |x: f32, item: Option<BlockItem>, max_hits: Option<u32>| {
            SpawnPoint::new(
                Vec2::new(x, 3.5),
                SpawnKind::Block {
                    item,
                    max_hits,
                    revealed: true,
                },
            )
        };
        let spawns = vec![
            block(10.0, Some(BlockItem::Coin), Some(1)),
            block(11.0, None, None),
            block(
                12.0,
                Some(BlockItem::PowerUp {
                    power_up: PowerUpKind::ArmorUp,
                }),
                Some(1),
            ),
            block(13.0, Some(BlockItem::Coin), Some(5)),
            SpawnPoint::new(Vec2::new(16.0, 0.5), SpawnKind::Demon),
            SpawnPoint::sized(
                Vec2::new(20.0, 2.25),
                Vec2::new(1.5, 0.5),
                SpawnKind::Pipe {
                    name: "entry".into(),
                    connection: Some("room".into()),
                    enter_direction: Vec2::NEG_Y,
                    exit_direction: Vec2::ZERO,
                },
            ),
            SpawnPoint::new(Vec2::new(28.0, 0.5), SpawnKind::Shaman),
            SpawnPoint::new(
                Vec2::new(30.0, 4.5),
                SpawnKind::Block {
                    item: Some(BlockItem::PowerUp {
                        power_up: PowerUpKind::ExtraLife,
                    }),
                    max_hits: Some(1),
                    revealed: false,
                },
            ),
            // Underground: arrival point, coins, sideways exit
            SpawnPoint::new(
                Vec2::new(18.0, -15.5),
                SpawnKind::Pipe {
                    name: "room".into(),
                    connection: None,
                    enter_direction: Vec2::ZERO,
                    exit_direction: Vec2::ZERO,
                },
            ),
            SpawnPoint::new(
                Vec2::new(24.0, -13.5),
                SpawnKind::PowerUp {
                    power_up: PowerUpKind::Coin,
                },
            ),
            SpawnPoint::new(
                Vec2::new(26.0, -13.5),
                SpawnKind::PowerUp {
                    power_up: PowerUpKind::Coin,
                },
            ),
            SpawnPoint::sized(
                Vec2::new(36.6, -15.5),
                Vec2::new(0.5, 1.0),
                SpawnKind::Pipe {
                    name: "room_exit".into(),
                    connection: Some("surface".into()),
                    enter_direction: Vec2::X,
                    exit_direction: Vec2::ZERO,
                },
            ),
            SpawnPoint::new(
                Vec2::new(45.0, 2.5),
                SpawnKind::Pipe {
                    name: "surface".into(),
                    connection: None,
                    enter_direction: Vec2::ZERO,
                    exit_direction: Vec2::Y,
                },
            ),
            SpawnPoint::new(Vec2::new(52.0, 0.5), SpawnKind::Demon),
            SpawnPoint::new(Vec2::new(55.0, 0.5), SpawnKind::Demon),
            SpawnPoint::new(Vec2::new(58.5, 0.5), SpawnKind::Spike),
            SpawnPoint::sized(
                Vec2::new(70.0, -8.0),
                Vec2::new(200.0, 2.0),
                SpawnKind::DeathBarrier,
            ),
            SpawnPoint::new(Vec2::new(80.0, 0.5), SpawnKind::Shaman),
            SpawnPoint::new(Vec2::new(95.0, 0.5), SpawnKind::Terminator),
            SpawnPoint::sized(
                Vec2::new(135.0, 5.5),
                Vec2::new(0.5, 9.0),
                SpawnKind::FlagPole {
                    flag: Vec2::new(135.0, 9.5),
                    pole_bottom: Vec2::new(135.0, 1.5),
                    castle: Vec2::new(142.0, 0.5),
                    next_world,
                    next_stage,
                },
            ),
        ];

        Self {
            world,
            stage,
            player_spawn: Some(Vec2::new(0.0, 0.5)),
            camera_start_x: 0.0,
            camera_mode: CameraMode::Horizontal,
            solids,
            spawns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::sim::World;

    #[test]
    fn test_demo_builds() {
        let layout = LevelLayout::demo(1, 1);
        let world = World::new(&layout, Tuning::default()).expect("demo level");
        assert_eq!(world.entities.len(), layout.spawns.len());

        let entry = world
            .entities
            .iter()
            .find(|e| matches!(&e.kind, EntityKind::Pipe { name, .. } if name == "entry"))
            .expect("entry pipe");
        assert!(matches!(
            entry.kind,
            EntityKind::Pipe {
                destination: Some(d),
                ..
            } if d == Vec2::new(18.0, -15.5)
        ));
    }

    #[test]
    fn test_demo_flag_leads_to_next_stage() {
        let next = |layout: &LevelLayout| {
            layout.spawns.iter().find_map(|s| match s.entity {
                SpawnKind::FlagPole {
                    next_world,
                    next_stage,
                    ..
                } => Some((next_world, next_stage)),
                _ => None,
            })
        };
        assert_eq!(next(&LevelLayout::demo(1, 1)), Some((1, 2)));
        assert_eq!(next(&LevelLayout::demo(1, 4)), Some((2, 1)));
    }

    #[test]
    fn test_parse_json_layout() {
        let json = r#"{
            "world": 2,
            "stage": 3,
            "player_spawn": [1.0, 0.5],
            "solids": [{ "min": [-5.0, -1.0], "max": [30.0, 0.0] }],
            "spawns": [
                { "position": [4.0, 0.5], "kind": "Demon" },
                { "position": [6.0, 3.5], "kind": "Block", "item": { "item": "Coin" }, "max_hits": 3 },
                { "position": [8.0, 2.25], "size": [1.5, 0.5], "kind": "Pipe",
                  "name": "a", "connection": "b", "enter_direction": [0.0, -1.0] },
                { "position": [20.0, 0.5], "kind": "Pipe", "name": "b", "enter_direction": [0.0, 0.0] }
            ]
        }"#;
        let layout = LevelLayout::from_json(json).expect("valid json");
        assert_eq!((layout.world, layout.stage), (2, 3));
        assert_eq!(layout.camera_mode, CameraMode::Horizontal);
        assert_eq!(
            layout.spawns[1].entity,
            SpawnKind::Block {
                item: Some(BlockItem::Coin),
                max_hits: Some(3),
                revealed: true,
            }
        );
        assert_eq!(layout.spawns[2].size, Some(Vec2::new(1.5, 0.5)));
        assert_eq!(layout.pipe_position("b"), Some(Vec2::new(20.0, 0.5)));

        let world = World::new(&layout, Tuning::default()).expect("valid level");
        assert_eq!(world.entities.len(), 4);
    }

    #[test]
    fn test_unknown_kind_is_json_error() {
        let json = r#"{ "world": 1, "stage": 1, "player_spawn": [0.0, 0.5],
            "spawns": [{ "position": [0.0, 0.0], "kind": "Dragon" }] }"#;
        assert!(matches!(LevelLayout::from_json(json), Err(SimError::Json(_))));
    }
}
