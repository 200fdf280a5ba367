//! Track storage and connectivity
//!
//! Owns the per-level tracks and their adjacency graph. Topology is fixed
//! at load; only the occupancy flags mutate during play.

use ordered_float::OrderedFloat;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet, VecDeque};

use super::spline;
use super::types::{TrackId, Vec2};

/// Samples taken per track when building drag-target candidates.
const SAMPLES_PER_TRACK: usize = 20;

/// A named curved path defined by ordered control points.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub points: Vec<Vec2>,
    /// True while at least one entity references this track.
    pub occupied: bool,
}

impl Track {
    pub fn new(id: TrackId, name: impl Into<String>, points: Vec<Vec2>) -> Self {
        Self {
            id,
            name: name.into(),
            points,
            occupied: false,
        }
    }
}

/// A concrete point on a track, as (track, parameter, position).
#[derive(Debug, Clone, Copy)]
pub struct TrackPosition {
    pub track: TrackId,
    pub t: f32,
    pub position: Vec2,
}

/// Graph of tracks with symmetric adjacency and occupancy flags.
#[derive(Default)]
pub struct TrackNetwork {
    graph: UnGraph<TrackId, ()>,
    track_to_node: HashMap<TrackId, NodeIndex>,
    node_to_track: HashMap<NodeIndex, TrackId>,
    tracks: HashMap<TrackId, Track>,
}

impl TrackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a track to the network graph. Re-adding an id is a no-op.
    pub fn add_track(&mut self, track: Track) {
        if self.track_to_node.contains_key(&track.id) {
            return;
        }

        let node = self.graph.add_node(track.id);
        self.track_to_node.insert(track.id, node);
        self.node_to_track.insert(node, track.id);
        self.tracks.insert(track.id, track);
    }

    /// Connects two tracks. The edge is undirected, so adjacency is
    /// symmetric by construction; duplicate edges are ignored.
    pub fn connect(&mut self, a: TrackId, b: TrackId) {
        let (Some(&na), Some(&nb)) = (self.track_to_node.get(&a), self.track_to_node.get(&b))
        else {
            return;
        };
        if a != b && self.graph.find_edge(na, nb).is_none() {
            self.graph.add_edge(na, nb, ());
        }
    }

    pub fn neighbors_of(&self, track: TrackId) -> Vec<TrackId> {
        match self.track_to_node.get(&track) {
            Some(&node) => self
                .graph
                .neighbors(node)
                .filter_map(|n| self.node_to_track.get(&n).copied())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn get_track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn set_occupied(&mut self, id: TrackId, occupied: bool) {
        if let Some(track) = self.tracks.get_mut(&id) {
            track.occupied = occupied;
        }
    }

    pub fn is_occupied(&self, id: TrackId) -> bool {
        self.tracks.get(&id).map(|t| t.occupied).unwrap_or(false)
    }

    /// Clears every occupancy flag; the level recomputes them from entity
    /// track references after each commit.
    pub fn clear_occupancy(&mut self) {
        for track in self.tracks.values_mut() {
            track.occupied = false;
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// All tracks, for render-layer path drawing.
    #[allow(dead_code)]
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Breadth-first search outward from `from`, up to `max_hops` edges,
    /// collecting sampled positions for drag-target candidates (used by
    /// host layers that preview drop targets).
    ///
    /// The starting track always contributes samples even while occupied (a
    /// dragged entity must keep sliding on its own track); every other
    /// reachable track contributes only when unoccupied.
    #[allow(dead_code)]
    pub fn reachable_positions(&self, from: TrackId, max_hops: usize) -> Vec<TrackPosition> {
        let mut positions = Vec::new();
        let Some(&start) = self.track_to_node.get(&from) else {
            return positions;
        };

        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::from([(start, 0)]);

        while let Some((node, hops)) = queue.pop_front() {
            let id = self.node_to_track[&node];
            let track = &self.tracks[&id];

            if hops == 0 || !track.occupied {
                for i in 0..=SAMPLES_PER_TRACK {
                    let t = i as f32 / SAMPLES_PER_TRACK as f32;
                    positions.push(TrackPosition {
                        track: id,
                        t,
                        position: spline::position_at(&track.points, t),
                    });
                }
            }

            if hops < max_hops {
                for next in self.graph.neighbors(node) {
                    if visited.insert(next) {
                        queue.push_back((next, hops + 1));
                    }
                }
            }
        }

        positions
    }

    /// Best closest-point match for `target` across the current track and
    /// its unoccupied direct neighbors. The current track always qualifies
    /// regardless of occupancy (it is occupied by the dragged entity).
    pub fn closest_reachable_position(
        &self,
        target: Vec2,
        current: TrackId,
    ) -> Option<TrackPosition> {
        let mut candidates = vec![current];
        candidates.extend(
            self.neighbors_of(current)
                .into_iter()
                .filter(|id| !self.is_occupied(*id)),
        );

        candidates
            .into_iter()
            .filter_map(|id| {
                let track = self.tracks.get(&id)?;
                let hit = spline::closest_point(&track.points, target);
                Some((
                    OrderedFloat(hit.distance),
                    TrackPosition {
                        track: id,
                        t: hit.t,
                        position: hit.position,
                    },
                ))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, position)| position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(id: usize, name: &str, x0: f32, x1: f32) -> Track {
        Track::new(
            TrackId(id),
            name,
            vec![Vec2::new(x0, 0.0), Vec2::new(x1, 0.0)],
        )
    }

    fn three_track_network() -> TrackNetwork {
        let mut network = TrackNetwork::new();
        network.add_track(straight(0, "a", 0.0, 100.0));
        network.add_track(straight(1, "b", 100.0, 200.0));
        network.add_track(straight(2, "c", 200.0, 300.0));
        network.connect(TrackId(0), TrackId(1));
        network.connect(TrackId(1), TrackId(2));
        network
    }

    #[test]
    fn adjacency_is_symmetric() {
        let network = three_track_network();
        assert!(network.neighbors_of(TrackId(0)).contains(&TrackId(1)));
        assert!(network.neighbors_of(TrackId(1)).contains(&TrackId(0)));
    }

    #[test]
    fn bfs_honors_hop_bound() {
        let network = three_track_network();

        let one_hop = network.reachable_positions(TrackId(0), 1);
        assert!(one_hop.iter().any(|p| p.track == TrackId(1)));
        assert!(!one_hop.iter().any(|p| p.track == TrackId(2)));

        let two_hops = network.reachable_positions(TrackId(0), 2);
        assert!(two_hops.iter().any(|p| p.track == TrackId(2)));
    }

    #[test]
    fn bfs_skips_occupied_tracks_but_not_the_start() {
        let mut network = three_track_network();
        network.set_occupied(TrackId(0), true);
        network.set_occupied(TrackId(1), true);

        let positions = network.reachable_positions(TrackId(0), 2);
        // Starting track still contributes even though occupied.
        assert!(positions.iter().any(|p| p.track == TrackId(0)));
        assert!(!positions.iter().any(|p| p.track == TrackId(1)));
        // Track c is unoccupied and within two hops.
        assert!(positions.iter().any(|p| p.track == TrackId(2)));
    }

    #[test]
    fn closest_reachable_excludes_occupied_neighbors() {
        let mut network = three_track_network();
        network.set_occupied(TrackId(1), true);

        // Target sits squarely on track b, but b is occupied.
        let hit = network
            .closest_reachable_position(Vec2::new(150.0, 0.0), TrackId(0))
            .unwrap();
        assert_eq!(hit.track, TrackId(0));
        assert!((hit.t - 1.0).abs() < 1e-3);
    }

    #[test]
    fn closest_reachable_crosses_to_free_neighbor() {
        let network = three_track_network();
        let hit = network
            .closest_reachable_position(Vec2::new(150.0, 5.0), TrackId(0))
            .unwrap();
        assert_eq!(hit.track, TrackId(1));
        assert!((hit.t - 0.5).abs() < 0.05);
    }
}
