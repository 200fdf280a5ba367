//! The level arena that ties everything together
//!
//! A `Level` owns the track network, the entity arena, the completion
//! goal, and the single drag session. It is advanced once per host tick
//! via `update(delta)`; all state changes happen synchronously inside a
//! call from the host loop.

use anyhow::{bail, Context, Result};
use log::info;
use std::collections::HashMap;

use super::config::{CarConfig, LevelConfig, LocomotiveConfig};
use super::drag::DragState;
use super::entity::{Entity, EntityKind};
use super::goal::CompletionGoal;
use super::spline;
use super::track::{Track, TrackNetwork};
use super::types::{CarKind, Color, EntityId, TrackId, Vec2, EASE_RATE};

/// One playable level: tracks, entities, goal, and drag session.
pub struct Level {
    pub(crate) network: TrackNetwork,
    pub(crate) entities: HashMap<EntityId, Entity>,
    pub(crate) goal: CompletionGoal,
    pub(crate) drag: DragState,
    pub(crate) complete: bool,
    track_names: HashMap<String, TrackId>,
    entity_names: HashMap<String, EntityId>,
    /// Original descriptor, retained so `reset` can rebuild the level.
    config: LevelConfig,
    /// Simulation time in seconds.
    pub time: f32,
}

impl Level {
    /// Builds a level from its descriptor. A descriptor referencing an
    /// unknown track, locomotive, or car is a corrupt initial state and
    /// fails here rather than being silently ignored.
    pub fn from_config(config: &LevelConfig) -> Result<Self> {
        let mut network = TrackNetwork::new();
        let mut track_names = HashMap::new();

        for (index, track_config) in config.tracks.iter().enumerate() {
            let id = TrackId(index);
            if track_names
                .insert(track_config.name.clone(), id)
                .is_some()
            {
                bail!("duplicate track name '{}'", track_config.name);
            }
            let points = track_config
                .points
                .iter()
                .map(|cp| cp.position)
                .collect();
            network.add_track(Track::new(id, track_config.name.clone(), points));
        }

        for track_config in &config.tracks {
            let from = track_names[&track_config.name];
            for neighbor in &track_config.neighbors {
                let to = *track_names.get(neighbor).with_context(|| {
                    format!(
                        "track '{}' lists unknown neighbor '{}'",
                        track_config.name, neighbor
                    )
                })?;
                network.connect(from, to);
            }
        }

        let mut entities = HashMap::new();
        let mut entity_names: HashMap<String, EntityId> = HashMap::new();
        let mut next_id = 0usize;
        let mut alloc = |name: &str, entity_names: &mut HashMap<String, EntityId>| -> Result<EntityId> {
            let id = EntityId(next_id);
            next_id += 1;
            if entity_names.insert(name.to_string(), id).is_some() {
                bail!("duplicate entity name '{}'", name);
            }
            Ok(id)
        };

        // Locomotives first so car targets can resolve against them.
        for loco in &config.locomotives {
            let id = alloc(&loco.name, &mut entity_names)?;
            let entity = build_locomotive(id, loco, &track_names, &network)?;
            entities.insert(id, entity);
        }

        for car in &config.cars {
            let id = alloc(&car.name, &mut entity_names)?;
            let entity = build_car(id, car, &track_names, &entity_names, &entities, &network)?;
            entities.insert(id, entity);
        }

        let mut required = Vec::with_capacity(config.required_pairs.len());
        for (car_name, loco_name) in &config.required_pairs {
            let car_id = *entity_names
                .get(car_name)
                .with_context(|| format!("required pair references unknown car '{car_name}'"))?;
            let loco_id = *entity_names.get(loco_name).with_context(|| {
                format!("required pair references unknown locomotive '{loco_name}'")
            })?;
            if !entities[&car_id].is_car() || !entities[&loco_id].is_locomotive() {
                bail!("required pair ('{car_name}', '{loco_name}') has mismatched kinds");
            }
            required.push((car_id, loco_id));
        }

        let mut level = Self {
            network,
            entities,
            goal: CompletionGoal::new(required),
            drag: DragState::Idle,
            complete: false,
            track_names,
            entity_names,
            config: config.clone(),
            time: 0.0,
        };
        level.refresh_occupancy();
        Ok(level)
    }

    /// Rebuilds the level from its original descriptor.
    #[allow(dead_code)]
    pub fn reset(&mut self) -> Result<()> {
        let config = self.config.clone();
        *self = Self::from_config(&config)?;
        Ok(())
    }

    /// Advances the level by one host tick: eases every non-dragging
    /// entity toward its canonical spline position (cosmetic decay, not
    /// physics) and polls the completion goal.
    pub fn update(&mut self, delta_secs: f32) {
        self.time += delta_secs;
        let factor = 1.0 - (-EASE_RATE * delta_secs).exp();

        for entity in self.entities.values_mut() {
            if entity.dragging {
                continue;
            }
            if let Some(track_id) = entity.track {
                if let Some(track) = self.network.get_track(track_id) {
                    let target = spline::position_at(&track.points, entity.progress);
                    entity.position = entity.position.lerp(&target, factor);
                }
            }
        }

        let satisfied = self.goal.is_satisfied(&self.entities);
        if satisfied && !self.complete {
            info!("level complete: all required couplings hold");
        }
        self.complete = satisfied;
    }

    /// Whether every required coupling currently holds.
    pub fn is_complete(&self) -> bool {
        self.goal.is_satisfied(&self.entities)
    }

    /// Recomputes every occupancy flag from entity track references, so a
    /// track is occupied iff at least one entity references it.
    pub(crate) fn refresh_occupancy(&mut self) {
        self.network.clear_occupancy();
        for entity in self.entities.values() {
            if let Some(track) = entity.track {
                self.network.set_occupied(track, true);
            }
        }
    }

    pub fn network(&self) -> &TrackNetwork {
        &self.network
    }

    /// All entities, for render-layer sprite drawing.
    #[allow(dead_code)]
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    #[allow(dead_code)]
    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entity_names.get(name).and_then(|id| self.entities.get(id))
    }

    pub fn entity_id(&self, name: &str) -> Option<EntityId> {
        self.entity_names.get(name).copied()
    }

    #[allow(dead_code)]
    pub fn track_id(&self, name: &str) -> Option<TrackId> {
        self.track_names.get(name).copied()
    }

    /// The current drag-session owner, if a drag is open.
    #[allow(dead_code)]
    pub fn drag_in_progress(&self) -> Option<EntityId> {
        match self.drag {
            DragState::Idle => None,
            DragState::Dragging { entity, .. } => Some(entity),
        }
    }

    /// Print a terminal summary of the level state.
    pub fn print_summary(&self) {
        println!("=== Level Summary ===");
        println!("Time: {:.2}s", self.time);
        println!("Tracks: {}", self.network.track_count());
        println!("Entities: {}", self.entities.len());

        let mut entities: Vec<&Entity> = self.entities.values().collect();
        entities.sort_by_key(|e| e.id.0);
        for entity in entities {
            let kind = match &entity.kind {
                EntityKind::Locomotive { capacity, .. } => {
                    format!("loco (capacity {capacity})")
                }
                EntityKind::Car { cargo, .. } => format!("car ({cargo:?})"),
            };
            let links: Vec<&str> = entity
                .linked
                .iter()
                .filter_map(|id| self.entities.get(id).map(|e| e.name.as_str()))
                .collect();
            println!(
                "  {} [{}]: progress={:.3}, position=({:.1}, {:.1}), linked=[{}]{}",
                entity.name,
                kind,
                entity.progress,
                entity.position.x,
                entity.position.y,
                links.join(", "),
                if entity.completed { ", completed" } else { "" },
            );
        }
        println!(
            "Complete: {}",
            if self.is_complete() { "yes" } else { "no" }
        );
    }
}

fn resolve_track(
    names: &HashMap<String, TrackId>,
    network: &TrackNetwork,
    track_name: &str,
    owner: &str,
) -> Result<(TrackId, Vec<Vec2>)> {
    let id = *names
        .get(track_name)
        .with_context(|| format!("'{owner}' references unknown track '{track_name}'"))?;
    let track = network
        .get_track(id)
        .with_context(|| format!("track '{track_name}' missing from network"))?;
    Ok((id, track.points.clone()))
}

fn build_locomotive(
    id: EntityId,
    config: &LocomotiveConfig,
    track_names: &HashMap<String, TrackId>,
    network: &TrackNetwork,
) -> Result<Entity> {
    let (track_id, points) = resolve_track(track_names, network, &config.track, &config.name)?;
    let progress = config.progress.clamp(0.0, 1.0);
    Ok(Entity::new(
        id,
        config.name.clone(),
        EntityKind::Locomotive {
            accepted: config.accepted.clone(),
            capacity: config.capacity,
            active: config.active,
        },
        track_id,
        progress,
        spline::position_at(&points, progress),
        config.size,
        config.color,
        config.draggable,
    ))
}

fn build_car(
    id: EntityId,
    config: &CarConfig,
    track_names: &HashMap<String, TrackId>,
    entity_names: &HashMap<String, EntityId>,
    entities: &HashMap<EntityId, Entity>,
    network: &TrackNetwork,
) -> Result<Entity> {
    let (track_id, points) = resolve_track(track_names, network, &config.track, &config.name)?;

    let target_locomotive = match &config.target {
        Some(target_name) => {
            let target_id = *entity_names.get(target_name).with_context(|| {
                format!(
                    "car '{}' targets unknown locomotive '{}'",
                    config.name, target_name
                )
            })?;
            if !entities[&target_id].is_locomotive() {
                bail!("car '{}' targets non-locomotive '{}'", config.name, target_name);
            }
            Some(target_id)
        }
        None => None,
    };

    let progress = config.progress.clamp(0.0, 1.0);
    Ok(Entity::new(
        id,
        config.name.clone(),
        EntityKind::Car {
            cargo: config.kind,
            target_locomotive,
        },
        track_id,
        progress,
        spline::position_at(&points, progress),
        config.size,
        config.color,
        config.draggable,
    ))
}

/// A small built-in level used by the CLI runner and the tests: a long
/// yard track holding one freight car and its target locomotive, plus a
/// curved siding with a passenger car.
pub fn demo_config() -> LevelConfig {
    use super::config::{ControlPoint, TrackConfig};

    LevelConfig {
        tracks: vec![
            TrackConfig {
                name: "yard".into(),
                points: vec![ControlPoint::at(0.0, 0.0), ControlPoint::at(1000.0, 0.0)],
                neighbors: vec!["siding".into()],
            },
            TrackConfig {
                name: "siding".into(),
                points: vec![
                    ControlPoint::at(1000.0, 0.0),
                    ControlPoint::at(1200.0, 80.0),
                    ControlPoint::at(1400.0, 0.0),
                ],
                neighbors: vec![],
            },
        ],
        locomotives: vec![LocomotiveConfig {
            name: "loco_blue".into(),
            track: "yard".into(),
            progress: 0.8,
            color: Color::new(40, 60, 220),
            size: 60.0,
            accepted: vec![CarKind::Freight, CarKind::Tank],
            capacity: 2,
            active: true,
            draggable: None,
        }],
        cars: vec![
            CarConfig {
                name: "car_freight".into(),
                track: "yard".into(),
                progress: 0.3,
                color: Color::new(200, 60, 40),
                size: 50.0,
                kind: CarKind::Freight,
                target: Some("loco_blue".into()),
                draggable: None,
            },
            CarConfig {
                name: "car_passenger".into(),
                track: "siding".into(),
                progress: 0.5,
                color: Color::new(60, 180, 60),
                size: 50.0,
                kind: CarKind::Passenger,
                target: None,
                draggable: None,
            },
        ],
        required_pairs: vec![("car_freight".into(), "loco_blue".into())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::Vec2;

    #[test]
    fn demo_level_loads() {
        let level = Level::from_config(&demo_config()).unwrap();
        assert_eq!(level.network().track_count(), 2);
        assert_eq!(level.entities().count(), 3);
        assert!(level.entity_by_name("loco_blue").is_some());
        assert!(!level.is_complete());
    }

    #[test]
    fn occupancy_tracks_entity_references() {
        let level = Level::from_config(&demo_config()).unwrap();
        let yard = level.track_id("yard").unwrap();
        let siding = level.track_id("siding").unwrap();
        assert!(level.network().is_occupied(yard));
        assert!(level.network().is_occupied(siding));
    }

    #[test]
    fn unknown_track_reference_is_fatal() {
        let mut config = demo_config();
        config.cars[0].track = "nowhere".into();
        assert!(Level::from_config(&config).is_err());
    }

    #[test]
    fn unknown_target_locomotive_is_fatal() {
        let mut config = demo_config();
        config.cars[0].target = Some("ghost_loco".into());
        assert!(Level::from_config(&config).is_err());
    }

    #[test]
    fn reset_restores_initial_positions() {
        let mut level = Level::from_config(&demo_config()).unwrap();
        let car = level.entity_id("car_freight").unwrap();
        level.entities.get_mut(&car).unwrap().progress = 0.9;
        level.reset().unwrap();
        let restored = level.entity_by_name("car_freight").unwrap();
        assert!((restored.progress - 0.3).abs() < 1e-6);
    }

    #[test]
    fn update_eases_toward_spline_position() {
        let mut level = Level::from_config(&demo_config()).unwrap();
        let car = level.entity_id("car_freight").unwrap();
        // Knock the cached position away from the spline.
        level.entities.get_mut(&car).unwrap().position = Vec2::new(300.0, 40.0);

        for _ in 0..200 {
            level.update(0.05);
        }
        let settled = level.entity(car).unwrap();
        assert!(settled.position.distance(&Vec2::new(300.0, 0.0)) < 0.5);
    }
}
