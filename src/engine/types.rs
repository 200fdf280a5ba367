//! Core types for the coupling engine
//!
//! Standalone types shared by every engine module.

/// A unique identifier for a track, an index into the level's track arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(pub usize);

/// A unique identifier for an entity (car or locomotive), an index into the
/// level's entity arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub usize);

/// The cargo/passenger classification of a car, used by locomotive
/// acceptance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarKind {
    Passenger,
    Freight,
    Tank,
}

/// A display color carried through to the render layer untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A 2D position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(&self, other: &Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Maximum edge-to-edge distance at which two unlinked entities couple.
pub const LINKING_THRESHOLD: f32 = 50.0;

/// Edge gap left between two entities right after they couple.
pub const COUPLING_GAP: f32 = 8.0;

/// Edge-to-edge floor restored by push-back when a link is not made.
pub const MIN_SEPARATION: f32 = 4.0;

/// Sample count for the closest-point search. Fixed-step sampling is an
/// approximation, not a guaranteed global minimum; levels are tuned against
/// this density.
pub const CLOSEST_POINT_SAMPLES: usize = 100;

/// Sample count for chord-sum arc length estimation.
pub const ARC_LENGTH_SAMPLES: usize = 100;

/// Progress deltas below this are treated as no movement.
pub const PROGRESS_EPSILON: f32 = 1e-4;

/// Exponential-decay rate easing idle entities onto their spline position.
pub const EASE_RATE: f32 = 10.0;
