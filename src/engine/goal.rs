//! Level completion check
//!
//! A level declares which car must end up coupled to which locomotive;
//! this module evaluates whether every required coupling currently holds.

use std::collections::HashMap;

use super::entity::{Entity, EntityKind};
use super::types::EntityId;

/// The set of (car, locomotive) couplings a level requires.
#[derive(Debug, Clone, Default)]
pub struct CompletionGoal {
    pub required: Vec<(EntityId, EntityId)>,
}

impl CompletionGoal {
    pub fn new(required: Vec<(EntityId, EntityId)>) -> Self {
        Self { required }
    }

    /// True only if every required pair exists, the two are mutually
    /// linked, and the car's declared target is the required locomotive.
    /// A coupling to the wrong locomotive never satisfies a pair.
    pub fn is_satisfied(&self, entities: &HashMap<EntityId, Entity>) -> bool {
        self.required.iter().all(|&(car_id, loco_id)| {
            let (Some(car), Some(loco)) = (entities.get(&car_id), entities.get(&loco_id)) else {
                return false;
            };

            let target_matches = match &car.kind {
                EntityKind::Car {
                    target_locomotive, ..
                } => *target_locomotive == Some(loco_id),
                EntityKind::Locomotive { .. } => false,
            };

            target_matches && car.is_linked_to(loco_id) && loco.is_linked_to(car_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{CarKind, Color, TrackId, Vec2};

    fn make_pair(linked: bool, target: Option<EntityId>) -> HashMap<EntityId, Entity> {
        let mut car = Entity::new(
            EntityId(0),
            "car",
            EntityKind::Car {
                cargo: CarKind::Freight,
                target_locomotive: target,
            },
            TrackId(0),
            0.3,
            Vec2::ZERO,
            50.0,
            Color::new(200, 40, 40),
            None,
        );
        let mut loco = Entity::new(
            EntityId(1),
            "loco",
            EntityKind::Locomotive {
                accepted: vec![CarKind::Freight],
                capacity: 1,
                active: true,
            },
            TrackId(0),
            0.5,
            Vec2::ZERO,
            60.0,
            Color::new(30, 30, 200),
            None,
        );
        if linked {
            car.add_link(loco.id);
            loco.add_link(car.id);
        }
        HashMap::from([(car.id, car), (loco.id, loco)])
    }

    #[test]
    fn satisfied_when_linked_to_declared_target() {
        let entities = make_pair(true, Some(EntityId(1)));
        let goal = CompletionGoal::new(vec![(EntityId(0), EntityId(1))]);
        assert!(goal.is_satisfied(&entities));
    }

    #[test]
    fn unsatisfied_without_link() {
        let entities = make_pair(false, Some(EntityId(1)));
        let goal = CompletionGoal::new(vec![(EntityId(0), EntityId(1))]);
        assert!(!goal.is_satisfied(&entities));
    }

    #[test]
    fn unsatisfied_when_target_differs() {
        let entities = make_pair(true, Some(EntityId(9)));
        let goal = CompletionGoal::new(vec![(EntityId(0), EntityId(1))]);
        assert!(!goal.is_satisfied(&entities));
    }

    #[test]
    fn missing_entity_fails_the_pair() {
        let entities = make_pair(true, Some(EntityId(1)));
        let goal = CompletionGoal::new(vec![(EntityId(0), EntityId(42))]);
        assert!(!goal.is_satisfied(&entities));
    }
}
