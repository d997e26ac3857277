//! Collision arbitration
//!
//! Decides who won a contact between two entities using only their
//! positions: the normalized vector from one to the other is compared
//! against a reference direction. Every stomp-vs-side decision in the game
//! goes through `directional_test`.

use glam::Vec2;

use super::EntityId;
use crate::consts::DIRECTION_THRESHOLD;

/// True iff the direction from `from` to `to` points along `reference`
/// (dot product of the normalized direction strictly above 0.25, roughly
/// a 75° cone either side)
#[inline]
pub fn directional_test(from: Vec2, to: Vec2, reference: Vec2) -> bool {
    (to - from).normalize_or_zero().dot(reference) > DIRECTION_THRESHOLD
}

/// Result of arbitrating a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    AttackerWins,
    DefenderWins,
    Neutral,
}

/// A classified contact; lives only for the tick that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub attacker: EntityId,
    pub defender: EntityId,
    /// Normalized direction from attacker to defender
    pub direction: Vec2,
    pub outcome: Outcome,
}

impl CollisionEvent {
    fn new(
        attacker: (EntityId, Vec2),
        defender: (EntityId, Vec2),
        outcome: Outcome,
    ) -> Self {
        Self {
            attacker: attacker.0,
            defender: defender.0,
            direction: (defender.1 - attacker.1).normalize_or_zero(),
            outcome,
        }
    }
}

/// Attacker landing on a stompable defender wins; any other angle loses
pub fn arbitrate_stomp(attacker: (EntityId, Vec2), defender: (EntityId, Vec2)) -> CollisionEvent {
    let outcome = if directional_test(attacker.1, defender.1, Vec2::NEG_Y) {
        Outcome::AttackerWins
    } else {
        Outcome::DefenderWins
    };
    CollisionEvent::new(attacker, defender, outcome)
}

/// Striking a block from below bumps it; touching it from any other angle
/// is a plain contact with no winner
pub fn arbitrate_bump(attacker: (EntityId, Vec2), defender: (EntityId, Vec2)) -> CollisionEvent {
    let outcome = if directional_test(attacker.1, defender.1, Vec2::Y) {
        Outcome::AttackerWins
    } else {
        Outcome::Neutral
    };
    CollisionEvent::new(attacker, defender, outcome)
}

/// Hazards win regardless of approach angle
pub fn arbitrate_hazard(attacker: (EntityId, Vec2), defender: (EntityId, Vec2)) -> CollisionEvent {
    CollisionEvent::new(attacker, defender, Outcome::DefenderWins)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_angle_from_up(degrees: f32) -> Vec2 {
        let r = degrees.to_radians();
        Vec2::new(r.sin(), r.cos()) * 3.0
    }

    #[test]
    fn test_directly_above_passes() {
        assert!(directional_test(Vec2::ZERO, Vec2::new(0.0, 2.0), Vec2::Y));
        assert!(!directional_test(Vec2::ZERO, Vec2::new(0.0, -2.0), Vec2::Y));
    }

    #[test]
    fn test_cone_is_about_75_degrees() {
        assert!(directional_test(Vec2::ZERO, at_angle_from_up(70.0), Vec2::Y));
        assert!(directional_test(Vec2::ZERO, at_angle_from_up(-74.0), Vec2::Y));
        assert!(!directional_test(Vec2::ZERO, at_angle_from_up(77.0), Vec2::Y));
        assert!(!directional_test(Vec2::ZERO, at_angle_from_up(90.0), Vec2::Y));
    }

    #[test]
    fn test_threshold_is_strict() {
        // Normalized direction is exactly X, so the dot product is exactly 0.25
        let reference = Vec2::new(DIRECTION_THRESHOLD, 0.0);
        assert!(!directional_test(Vec2::ZERO, Vec2::new(5.0, 0.0), reference));
        assert!(directional_test(
            Vec2::ZERO,
            Vec2::new(5.0, 0.0),
            Vec2::new(0.26, 0.0)
        ));
    }

    #[test]
    fn test_coincident_positions_fail() {
        assert!(!directional_test(Vec2::ONE, Vec2::ONE, Vec2::Y));
    }

    #[test]
    fn test_stomp_from_above() {
        let event = arbitrate_stomp(
            (EntityId::PLAYER, Vec2::new(0.2, 1.0)),
            (EntityId(4), Vec2::ZERO),
        );
        assert_eq!(event.outcome, Outcome::AttackerWins);
        assert!(event.direction.y < 0.0);
    }

    #[test]
    fn test_side_contact_loses() {
        let event = arbitrate_stomp(
            (EntityId::PLAYER, Vec2::new(-0.9, 0.1)),
            (EntityId(4), Vec2::ZERO),
        );
        assert_eq!(event.outcome, Outcome::DefenderWins);
    }

    #[test]
    fn test_bump_from_below_wins() {
        let event = arbitrate_bump(
            (EntityId::PLAYER, Vec2::new(0.1, 3.5)),
            (EntityId(4), Vec2::new(0.0, 4.5)),
        );
        assert_eq!(event.outcome, Outcome::AttackerWins);
        assert!(event.direction.y > 0.9);
    }

    #[test]
    fn test_bump_from_side_or_above_is_neutral() {
        for player in [Vec2::new(-1.0, 4.5), Vec2::new(0.0, 5.5)] {
            let event = arbitrate_bump(
                (EntityId::PLAYER, player),
                (EntityId(4), Vec2::new(0.0, 4.5)),
            );
            assert_eq!(event.outcome, Outcome::Neutral);
        }
    }

    #[test]
    fn test_hazard_wins_even_from_above() {
        let event = arbitrate_hazard(
            (EntityId::PLAYER, Vec2::new(0.0, 1.0)),
            (EntityId(2), Vec2::ZERO),
        );
        assert_eq!(event.outcome, Outcome::DefenderWins);
    }
}
