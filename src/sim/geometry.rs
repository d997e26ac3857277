//! Level collision geometry
//!
//! Solids are axis-aligned boxes tagged with a collision layer and an
//! optional owning entity. Shape casts sphere-trace the signed distance
//! field of every solid on the queried layer.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;

/// Sphere-tracing step budget for one cast
const MAX_CAST_STEPS: usize = 48;
/// Distances below this count as touching
const CAST_EPSILON: f32 = 1e-4;

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Overlap test; boxes closer than `skin` also count
    pub fn overlaps(&self, other: &Aabb, skin: f32) -> bool {
        self.min.x - skin < other.max.x
            && self.max.x + skin > other.min.x
            && self.min.y - skin < other.max.y
            && self.max.y + skin > other.min.y
    }
}

/// Signed distance from a point to a box (negative inside)
#[inline]
pub fn sd_box(p: Vec2, aabb: &Aabb) -> f32 {
    let q = (p - aabb.center()).abs() - aabb.half_extents();
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0)
}

/// Collision layers a solid can live on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionLayer {
    /// Ground, walls and blocks; the only layer probes see
    #[default]
    Default,
    /// Present for overlap tests only (decoration, triggers)
    Passive,
}

/// A box in the collision layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solid {
    pub aabb: Aabb,
    pub layer: CollisionLayer,
    /// Entity this solid belongs to (blocks, blocking terminators)
    pub owner: Option<EntityId>,
}

impl Solid {
    /// Plain level terrain
    pub fn terrain(aabb: Aabb) -> Self {
        Self {
            aabb,
            layer: CollisionLayer::Default,
            owner: None,
        }
    }

    pub fn owned(aabb: Aabb, owner: EntityId) -> Self {
        Self {
            aabb,
            layer: CollisionLayer::Default,
            owner: Some(owner),
        }
    }
}

/// Result of a shape cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// Distance travelled along the cast before touching
    pub distance: f32,
    pub owner: Option<EntityId>,
}

/// Static terrain plus per-tick dynamic solids
#[derive(Debug, Clone, Default)]
pub struct LevelGeometry {
    static_solids: Vec<Solid>,
    dynamic_solids: Vec<Solid>,
}

impl LevelGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, solid: Solid) {
        self.static_solids.push(solid);
    }

    /// Replace the solids that move or toggle with their entities
    pub fn set_dynamic(&mut self, solids: impl IntoIterator<Item = Solid>) {
        self.dynamic_solids.clear();
        self.dynamic_solids.extend(solids);
    }

    pub fn solids(&self) -> impl Iterator<Item = &Solid> {
        self.static_solids.iter().chain(self.dynamic_solids.iter())
    }

    /// Nearest Default-layer solid to `p`, skipping those owned by `ignore`
    fn nearest(&self, p: Vec2, ignore: Option<EntityId>) -> Option<(f32, &Solid)> {
        self.solids()
            .filter(|s| s.layer == CollisionLayer::Default)
            .filter(|s| ignore.is_none() || s.owner != ignore)
            .map(|s| (sd_box(p, &s.aabb), s))
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Sweep a circle from `origin` along `direction` for up to `distance`
    ///
    /// Returns the first Default-layer solid touched. A circle already
    /// overlapping a solid hits at distance 0.
    pub fn circle_cast(
        &self,
        origin: Vec2,
        radius: f32,
        direction: Vec2,
        distance: f32,
        ignore: Option<EntityId>,
    ) -> Option<CastHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO {
            return None;
        }

        let mut t = 0.0;
        for _ in 0..MAX_CAST_STEPS {
            let p = origin + dir * t;
            let (d, solid) = self.nearest(p, ignore)?;
            let gap = d - radius;

            if gap <= CAST_EPSILON {
                return Some(CastHit {
                    distance: t,
                    owner: solid.owner,
                });
            }

            // Sphere tracing: the gap is always safe to advance
            t += gap;
            if t > distance {
                return None;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> Solid {
        Solid::terrain(Aabb::new(Vec2::new(-10.0, -1.0), Vec2::new(10.0, 0.0)))
    }

    #[test]
    fn test_sd_box_inside_and_outside() {
        let b = Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
        assert!((sd_box(Vec2::new(3.0, 0.0), &b) - 2.0).abs() < 1e-5);
        assert!((sd_box(Vec2::ZERO, &b) + 1.0).abs() < 1e-5);
        assert!((sd_box(Vec2::new(4.0, 5.0), &b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_cast_hits_floor_below() {
        let mut geo = LevelGeometry::new();
        geo.add(floor());
        let hit = geo
            .circle_cast(Vec2::new(0.0, 0.5), 0.25, Vec2::NEG_Y, 0.375, None)
            .expect("floor should be hit");
        assert!((hit.distance - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_cast_misses_out_of_range() {
        let mut geo = LevelGeometry::new();
        geo.add(floor());
        assert!(geo
            .circle_cast(Vec2::new(0.0, 2.0), 0.25, Vec2::NEG_Y, 0.375, None)
            .is_none());
    }

    #[test]
    fn test_cast_ignores_owned_solid() {
        let mut geo = LevelGeometry::new();
        let owner = EntityId(7);
        geo.add(Solid::owned(
            Aabb::from_center(Vec2::ZERO, Vec2::splat(0.5)),
            owner,
        ));
        assert!(geo
            .circle_cast(Vec2::ZERO, 0.25, Vec2::X, 0.375, Some(owner))
            .is_none());
        assert!(geo
            .circle_cast(Vec2::ZERO, 0.25, Vec2::X, 0.375, None)
            .is_some());
    }

    #[test]
    fn test_cast_skips_passive_layer() {
        let mut geo = LevelGeometry::new();
        geo.add(Solid {
            aabb: Aabb::from_center(Vec2::new(0.5, 0.0), Vec2::splat(0.5)),
            layer: CollisionLayer::Passive,
            owner: None,
        });
        assert!(geo
            .circle_cast(Vec2::ZERO, 0.25, Vec2::X, 0.375, None)
            .is_none());
    }

    #[test]
    fn test_dynamic_solids_replaced() {
        let mut geo = LevelGeometry::new();
        geo.set_dynamic([floor()]);
        assert_eq!(geo.solids().count(), 1);
        geo.set_dynamic([]);
        assert_eq!(geo.solids().count(), 0);
    }
}
