//! Drag sessions, collision handling, and coupling
//!
//! One entity at a time can own a drag session. Each pointer update
//! resolves a reachable candidate position, checks it against the other
//! entities on the candidate track (propose a coupling inside the linking
//! threshold, push back below the separation floor), commits the move,
//! and drags the rest of the chain along at fixed pixel spacing.

use log::debug;
use ordered_float::OrderedFloat;
use std::collections::HashSet;

use super::entity::EntityKind;
use super::level::Level;
use super::spline;
use super::track::TrackPosition;
use super::types::{
    EntityId, Vec2, COUPLING_GAP, LINKING_THRESHOLD, MIN_SEPARATION, PROGRESS_EPSILON,
};

/// The drag state machine. At most one session is open at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        /// The session owner. Other chain members only carry the cosmetic
        /// dragging flag.
        entity: EntityId,
        /// Pointer-to-entity offset captured at grab time.
        offset: Vec2,
    },
}

impl Level {
    /// Opens a drag session on `id`. Returns false without mutating when
    /// the entity is unknown, not draggable, or a session is already open.
    pub fn start_drag(&mut self, id: EntityId, pointer: Vec2) -> bool {
        if self.drag != DragState::Idle {
            debug!("start_drag rejected: a session is already open");
            return false;
        }
        let Some(entity) = self.entities.get(&id) else {
            debug!("start_drag rejected: unknown entity {:?}", id);
            return false;
        };
        if !entity.is_draggable() {
            debug!("start_drag rejected: '{}' is not draggable", entity.name);
            return false;
        }

        let offset = entity.position - pointer;
        for member in self.chain_of(id) {
            if let Some(member_entity) = self.entities.get_mut(&member) {
                member_entity.dragging = true;
            }
        }
        self.drag = DragState::Dragging { entity: id, offset };
        true
    }

    /// Moves the dragged entity toward `pointer`. No-op when idle or when
    /// no reachable position exists for the pointer. Returns whether the
    /// entity moved or coupled.
    pub fn update_drag(&mut self, pointer: Vec2) -> bool {
        let DragState::Dragging { entity: dragged_id, offset } = self.drag else {
            return false;
        };
        let Some(current_track) = self.entities.get(&dragged_id).and_then(|e| e.track) else {
            return false;
        };

        let target = pointer + offset;
        let Some(mut candidate) = self.network.closest_reachable_position(target, current_track)
        else {
            return false;
        };

        // Nearest entity on the candidate track that is not part of the
        // dragged chain, by edge-to-edge distance.
        let chain: HashSet<EntityId> = self.chain_of(dragged_id).into_iter().collect();
        let dragged_half = self.entities[&dragged_id].half_width();
        let blocker = self
            .entities
            .values()
            .filter(|e| e.track == Some(candidate.track) && !chain.contains(&e.id))
            .map(|e| {
                let edge = candidate.position.distance(&e.position) - dragged_half - e.half_width();
                (OrderedFloat(edge), e.id)
            })
            .min_by_key(|(edge, _)| *edge);

        let mut coupled_as_back = false;
        if let Some((OrderedFloat(edge), other_id)) = blocker {
            let already_linked = self.entities[&dragged_id].is_linked_to(other_id);
            let mut linked_now = false;
            if edge <= LINKING_THRESHOLD && !already_linked {
                if let Some((_front, back)) = self.link_entities(dragged_id, other_id) {
                    linked_now = true;
                    // The link operation repositioned the back entity; if
                    // that was the dragged one, its committed spot is the
                    // coupling spot, not the raw candidate.
                    if back == dragged_id {
                        coupled_as_back = true;
                    }
                }
            }
            if !linked_now && edge < MIN_SEPARATION {
                candidate = self.separated_candidate(candidate, edge, other_id);
            }
        }

        if coupled_as_back {
            let entity = &self.entities[&dragged_id];
            candidate = TrackPosition {
                track: entity.track.unwrap_or(candidate.track),
                t: entity.progress,
                position: entity.position,
            };
        }

        // Commit.
        let (old_track, old_progress) = {
            let Some(entity) = self.entities.get_mut(&dragged_id) else {
                return false;
            };
            let old = (entity.track, entity.progress);
            entity.track = Some(candidate.track);
            entity.progress = candidate.t.clamp(0.0, 1.0);
            entity.position = candidate.position;
            old
        };
        if old_track != Some(candidate.track) {
            self.refresh_occupancy();
        }

        let moved = old_track != Some(candidate.track)
            || (candidate.t - old_progress).abs() > PROGRESS_EPSILON;
        if moved {
            self.propagate_chain(dragged_id);
        }
        moved
    }

    /// Closes the drag session: clears the chain's dragging flags and
    /// snaps the owner exactly onto its spline position. No-op when idle.
    pub fn end_drag(&mut self) -> bool {
        let DragState::Dragging { entity: dragged_id, .. } = self.drag else {
            return false;
        };

        for member in self.chain_of(dragged_id) {
            if let Some(entity) = self.entities.get_mut(&member) {
                entity.dragging = false;
            }
        }

        let snap = self
            .entities
            .get(&dragged_id)
            .and_then(|e| e.track)
            .and_then(|track_id| self.network.get_track(track_id))
            .map(|track| track.points.clone());
        if let (Some(points), Some(entity)) = (snap, self.entities.get_mut(&dragged_id)) {
            entity.position = spline::position_at(&points, entity.progress);
        }

        self.drag = DragState::Idle;
        true
    }

    /// All entities in the same chain as `id`, ordered front-most to
    /// back-most. Guards against cycles so the walk always terminates.
    pub fn chain_of(&self, id: EntityId) -> Vec<EntityId> {
        let mut visited = HashSet::from([id]);
        let mut front = id;
        while let Some(next) = self.entities.get(&front).and_then(|e| e.linked_front) {
            if !visited.insert(next) {
                break;
            }
            front = next;
        }

        let mut chain = vec![front];
        let mut seen = HashSet::from([front]);
        let mut cursor = front;
        while let Some(next) = self.entities.get(&cursor).and_then(|e| e.linked_back) {
            if !seen.insert(next) {
                break;
            }
            chain.push(next);
            cursor = next;
        }
        chain
    }

    /// Couples two entities on the same track. Returns the (front, back)
    /// ids on success, or None with no mutation when the coupling is
    /// rejected.
    pub fn link_entities(
        &mut self,
        a: EntityId,
        b: EntityId,
    ) -> Option<(EntityId, EntityId)> {
        let (Some(ea), Some(eb)) = (self.entities.get(&a), self.entities.get(&b)) else {
            return None;
        };

        let (front_id, back_id, car_completed) = match (&ea.kind, &eb.kind) {
            (EntityKind::Locomotive { .. }, EntityKind::Car { .. }) => {
                self.check_locomotive_car(a, b)?
            }
            (EntityKind::Car { .. }, EntityKind::Locomotive { .. }) => {
                self.check_locomotive_car(b, a)?
            }
            (EntityKind::Car { .. }, EntityKind::Car { .. }) => {
                // Higher progress couples as the front.
                let (front, back) = if ea.progress >= eb.progress { (a, b) } else { (b, a) };
                if self.entities[&front].linked_back.is_some()
                    || self.entities[&back].linked_front.is_some()
                {
                    debug!("car-car coupling rejected: slot already taken");
                    return None;
                }
                (front, back, None)
            }
            (EntityKind::Locomotive { .. }, EntityKind::Locomotive { .. }) => return None,
        };

        {
            let front = self.entities.get_mut(&front_id)?;
            front.linked_back = Some(back_id);
            front.add_link(back_id);
        }
        {
            let back = self.entities.get_mut(&back_id)?;
            back.linked_front = Some(front_id);
            back.add_link(front_id);
            if let Some(completed) = car_completed {
                back.completed = completed;
            }
        }
        debug!(
            "coupled '{}' behind '{}'",
            self.entities[&back_id].name, self.entities[&front_id].name
        );

        self.reposition_behind(front_id, back_id);
        Some((front_id, back_id))
    }

    /// Validates a locomotive-car coupling. Returns (front, back,
    /// completion) or None when the kind, capacity, activity, or slot
    /// rules reject it.
    fn check_locomotive_car(
        &self,
        loco_id: EntityId,
        car_id: EntityId,
    ) -> Option<(EntityId, EntityId, Option<bool>)> {
        let loco = self.entities.get(&loco_id)?;
        let car = self.entities.get(&car_id)?;

        let EntityKind::Locomotive {
            accepted,
            capacity,
            active,
        } = &loco.kind
        else {
            return None;
        };
        let EntityKind::Car {
            cargo,
            target_locomotive,
        } = &car.kind
        else {
            return None;
        };

        if !*active {
            debug!("coupling rejected: locomotive '{}' is inactive", loco.name);
            return None;
        }
        if !accepted.contains(cargo) {
            debug!(
                "coupling rejected: '{}' does not accept {:?} cars",
                loco.name, cargo
            );
            return None;
        }
        if loco.linked.len() >= *capacity {
            debug!("coupling rejected: '{}' is at capacity", loco.name);
            return None;
        }
        if loco.linked_back.is_some() || car.linked_front.is_some() {
            debug!("coupling rejected: slot already taken");
            return None;
        }

        // Coupling to the wrong locomotive is allowed; it just never
        // completes the car.
        let completed = *target_locomotive == Some(loco_id);
        Some((loco_id, car_id, Some(completed)))
    }

    /// Repositions every chain member behind its predecessor at the fixed
    /// coupling distance, walking front-most to back-most and skipping the
    /// dragged entity. Spacing is resolved in pixels, never as a uniform
    /// parametric delta, because equal parameter steps are unequal pixel
    /// steps on a curve.
    pub(crate) fn propagate_chain(&mut self, dragged: EntityId) {
        let chain = self.chain_of(dragged);
        for i in 1..chain.len() {
            if chain[i] == dragged {
                continue;
            }
            self.reposition_behind(chain[i - 1], chain[i]);
        }
    }

    /// Places `back` at the fixed coupling distance behind `front`:
    /// a binary search on the back entity's track for the progress whose
    /// pixel distance to the front's position matches the target.
    pub(crate) fn reposition_behind(&mut self, front_id: EntityId, back_id: EntityId) {
        let Some(front) = self.entities.get(&front_id) else {
            return;
        };
        let Some(back) = self.entities.get(&back_id) else {
            return;
        };
        let target = front.half_width() + back.half_width() + COUPLING_GAP;
        let anchor = front.position;
        let front_track = front.track;
        let front_progress = front.progress;
        let back_progress = back.progress;

        let Some(track_id) = back.track else {
            return;
        };
        let Some(points) = self.network.get_track(track_id).map(|t| t.points.clone()) else {
            return;
        };

        // Pick the side of the anchor to search: same track keeps the back
        // entity on its current side; across a junction, approach from the
        // end nearest the anchor.
        let (near, far) = if front_track == Some(track_id) {
            if back_progress <= front_progress {
                (front_progress, 0.0)
            } else {
                (front_progress, 1.0)
            }
        } else {
            let d0 = anchor.distance(&spline::position_at(&points, 0.0));
            let d1 = anchor.distance(&spline::position_at(&points, 1.0));
            if d0 <= d1 {
                (0.0, 1.0)
            } else {
                (1.0, 0.0)
            }
        };

        let t = spline::find_progress_at_distance(&points, anchor, target, near, far);
        if let Some(back) = self.entities.get_mut(&back_id) {
            back.progress = t;
            back.position = spline::position_at(&points, t);
        }
    }

    /// Pushes a candidate back along its track until the edge-to-edge
    /// distance to `other` is restored to the separation floor, converting
    /// the missing pixels into a parametric delta via the spline's arc
    /// length.
    fn separated_candidate(
        &self,
        candidate: TrackPosition,
        edge: f32,
        other_id: EntityId,
    ) -> TrackPosition {
        let Some(other) = self.entities.get(&other_id) else {
            return candidate;
        };
        let Some(points) = self
            .network
            .get_track(candidate.track)
            .map(|t| t.points.clone())
        else {
            return candidate;
        };

        let push = MIN_SEPARATION - edge;
        let delta = spline::delta_for_pixels(&points, push);
        let away = if other.track == Some(candidate.track) {
            if candidate.t >= other.progress {
                1.0
            } else {
                -1.0
            }
        } else {
            // Blocker off-track: retreat toward whichever end of the
            // candidate track is farther from it.
            let d0 = other.position.distance(&spline::position_at(&points, 0.0));
            let d1 = other.position.distance(&spline::position_at(&points, 1.0));
            if d1 > d0 {
                1.0
            } else {
                -1.0
            }
        };

        let t = (candidate.t + away * delta).clamp(0.0, 1.0);
        TrackPosition {
            track: candidate.track,
            t,
            position: spline::position_at(&points, t),
        }
    }
}
