//! Headless train-coupling engine
//!
//! Positions cars and locomotives along spline tracks, resolves one drag
//! session at a time with collision and automatic coupling, propagates
//! coupled chains at fixed pixel spacing, and evaluates the level's
//! required couplings. No rendering or input capture lives here; the host
//! drives the engine once per tick and reads state back through `Level`.

mod config;
mod drag;
mod entity;
mod goal;
mod level;
mod spline;
mod track;
mod types;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use config::{CarConfig, ControlPoint, LevelConfig, LocomotiveConfig, TrackConfig};
#[allow(unused_imports)]
pub use drag::DragState;
#[allow(unused_imports)]
pub use entity::{Entity, EntityKind};
#[allow(unused_imports)]
pub use goal::CompletionGoal;
pub use level::{demo_config, Level};
#[allow(unused_imports)]
pub use spline::{arc_length, closest_point, delta_for_pixels, position_at, ClosestPoint};
#[allow(unused_imports)]
pub use track::{Track, TrackNetwork, TrackPosition};
#[allow(unused_imports)]
pub use types::{
    CarKind, Color, EntityId, TrackId, Vec2, COUPLING_GAP, LINKING_THRESHOLD, MIN_SEPARATION,
};
