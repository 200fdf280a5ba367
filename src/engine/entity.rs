//! Entity model: cars and locomotives
//!
//! The two variants share one struct; everything kind-specific hangs off
//! the `EntityKind` sum type so behavior differences are matched
//! exhaustively instead of type-guarded.

use super::types::{CarKind, Color, EntityId, TrackId, Vec2};

/// Kind-specific data for an entity.
#[derive(Debug, Clone)]
pub enum EntityKind {
    /// A car to be coupled onto a locomotive.
    Car {
        cargo: CarKind,
        /// The locomotive this car must reach for the level's win
        /// condition, if the level declares one.
        target_locomotive: Option<EntityId>,
    },
    /// A locomotive pulling cars.
    Locomotive {
        /// Car kinds this locomotive will couple with.
        accepted: Vec<CarKind>,
        /// Maximum number of directly linked cars.
        capacity: usize,
        /// Inactive locomotives refuse all links.
        active: bool,
    },
}

/// A car or locomotive placed on a track.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub track: Option<TrackId>,
    /// Parametric position along the current track's spline, in [0,1].
    pub progress: f32,
    /// Derived 2D position. A cache eased toward the spline position each
    /// tick; never the source of truth.
    pub position: Vec2,
    /// Full sprite width in pixels.
    pub size: f32,
    pub color: Color,
    pub dragging: bool,
    /// Cars only: set once linked to their intended locomotive.
    pub completed: bool,
    /// Entity coupled to this one's front side, if any.
    pub linked_front: Option<EntityId>,
    /// Entity coupled to this one's back side, if any.
    pub linked_back: Option<EntityId>,
    /// All directly linked neighbors, unordered.
    pub linked: Vec<EntityId>,
    /// Per-level override of the default draggability rule.
    pub draggable_override: Option<bool>,
}

impl Entity {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        kind: EntityKind,
        track: TrackId,
        progress: f32,
        position: Vec2,
        size: f32,
        color: Color,
        draggable_override: Option<bool>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            track: Some(track),
            progress: progress.clamp(0.0, 1.0),
            position,
            size,
            color,
            dragging: false,
            completed: false,
            linked_front: None,
            linked_back: None,
            linked: Vec::new(),
            draggable_override,
        }
    }

    pub fn is_car(&self) -> bool {
        matches!(self.kind, EntityKind::Car { .. })
    }

    pub fn is_locomotive(&self) -> bool {
        matches!(self.kind, EntityKind::Locomotive { .. })
    }

    pub fn half_width(&self) -> f32 {
        self.size * 0.5
    }

    /// Whether this entity may own a drag session. Cars default to
    /// draggable until completed; locomotives default to draggable; a
    /// level override wins in both cases.
    pub fn is_draggable(&self) -> bool {
        match self.draggable_override {
            Some(value) => value,
            None => match self.kind {
                EntityKind::Car { .. } => !self.completed,
                EntityKind::Locomotive { .. } => true,
            },
        }
    }

    pub fn is_linked_to(&self, other: EntityId) -> bool {
        self.linked.contains(&other)
    }

    /// Records `other` as a direct neighbor, keeping the list duplicate-free.
    pub fn add_link(&mut self, other: EntityId) {
        if !self.linked.contains(&other) {
            self.linked.push(other);
        }
    }
}
