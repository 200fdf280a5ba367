//! Level descriptor types
//!
//! The declarative input handed to the engine by the level loader. All
//! cross-references are by name; `Level::from_config` resolves them to
//! arena ids and rejects dangling references at load time.

use super::types::{CarKind, Color, Vec2};

/// One spline control point. The tangent is accepted from level authors
/// but currently unused by evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ControlPoint {
    pub position: Vec2,
    #[allow(dead_code)]
    pub tangent: Option<Vec2>,
}

impl ControlPoint {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            tangent: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub name: String,
    pub points: Vec<ControlPoint>,
    /// Names of adjacent tracks. Adjacency is symmetric; declaring an edge
    /// on either side is enough.
    pub neighbors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LocomotiveConfig {
    pub name: String,
    pub track: String,
    pub progress: f32,
    pub color: Color,
    pub size: f32,
    pub accepted: Vec<CarKind>,
    pub capacity: usize,
    pub active: bool,
    pub draggable: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CarConfig {
    pub name: String,
    pub track: String,
    pub progress: f32,
    pub color: Color,
    pub size: f32,
    pub kind: CarKind,
    /// Name of the locomotive this car must reach, if the level declares
    /// a win condition for it.
    pub target: Option<String>,
    pub draggable: Option<bool>,
}

/// Full declarative description of a level.
#[derive(Debug, Clone, Default)]
pub struct LevelConfig {
    pub tracks: Vec<TrackConfig>,
    pub locomotives: Vec<LocomotiveConfig>,
    pub cars: Vec<CarConfig>,
    /// (car name, locomotive name) couplings required for completion.
    pub required_pairs: Vec<(String, String)>,
}
