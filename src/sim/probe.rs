//! Short-range obstruction probes
//!
//! A probe sweeps a small circle from the body position and reports whether
//! level geometry on the Default layer is in the way. Solids owned by the
//! querying body never count.

use glam::Vec2;

use super::EntityId;
use super::body::KinematicBody;
use super::geometry::{CastHit, LevelGeometry};
use crate::consts::{PROBE_DISTANCE, PROBE_RADIUS};

/// Is the body obstructed in `direction`? Sleeping bodies never are.
pub fn probe(body: &KinematicBody, direction: Vec2, geometry: &LevelGeometry) -> bool {
    if body.is_asleep() {
        return false;
    }
    probe_from(body.position, body.id, direction, geometry)
}

/// Probe from an arbitrary origin on behalf of `owner`
pub fn probe_from(
    origin: Vec2,
    owner: EntityId,
    direction: Vec2,
    geometry: &LevelGeometry,
) -> bool {
    geometry
        .circle_cast(origin, PROBE_RADIUS, direction, PROBE_DISTANCE, Some(owner))
        .is_some()
}

/// Free distance below the collider's bottom, if a floor lies within `max_drop`
pub fn ground_clearance(
    body: &KinematicBody,
    geometry: &LevelGeometry,
    max_drop: f32,
) -> Option<f32> {
    let origin = Vec2::new(body.position.x, body.bottom() + PROBE_RADIUS);
    geometry
        .circle_cast(origin, PROBE_RADIUS, Vec2::NEG_Y, max_drop, Some(body.id))
        .map(|hit| hit.distance)
}

/// First ceiling above the collider's top within `max_rise`
pub fn ceiling_hit(
    body: &KinematicBody,
    geometry: &LevelGeometry,
    max_rise: f32,
) -> Option<CastHit> {
    let origin = Vec2::new(body.position.x, body.top() - PROBE_RADIUS);
    geometry.circle_cast(origin, PROBE_RADIUS, Vec2::Y, max_rise, Some(body.id))
}

/// Downward snap that brings a grounded body to rest on its floor
pub fn settle(body: &KinematicBody, geometry: &LevelGeometry) -> f32 {
    -ground_clearance(body, geometry, PROBE_DISTANCE).unwrap_or(0.0)
}

/// Clamp a vertical displacement so the collider neither sinks into a floor
/// nor passes through a ceiling. Returns the clamped delta and the ceiling
/// hit, if one stopped the motion.
pub fn resolve_vertical(
    body: &KinematicBody,
    geometry: &LevelGeometry,
    delta_y: f32,
) -> (f32, Option<CastHit>) {
    if delta_y < 0.0 {
        let drop = -delta_y;
        match ground_clearance(body, geometry, drop) {
            Some(clearance) => (-clearance.min(drop), None),
            None => (delta_y, None),
        }
    } else if delta_y > 0.0 {
        match ceiling_hit(body, geometry, delta_y) {
            Some(hit) => (hit.distance.min(delta_y), Some(hit)),
            None => (delta_y, None),
        }
    } else {
        (0.0, None)
    }
}

/// Clamp a horizontal displacement so the collider's leading side stops
/// at the first wall instead of passing into it
pub fn resolve_horizontal(body: &KinematicBody, geometry: &LevelGeometry, delta_x: f32) -> f32 {
    if delta_x == 0.0 {
        return 0.0;
    }
    let dir = delta_x.signum();
    let half_width = body.footprint.size.x * 0.5;
    let side = body.position.x + body.footprint.offset.x + dir * (half_width - PROBE_RADIUS);
    let origin = Vec2::new(side, body.position.y);
    match geometry.circle_cast(origin, PROBE_RADIUS, Vec2::X * dir, delta_x.abs(), Some(body.id)) {
        Some(hit) => dir * hit.distance.min(delta_x.abs()),
        None => delta_x,
    }
}
