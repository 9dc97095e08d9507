//! Location graph with breadth-first routing

use std::collections::VecDeque;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{LocationId, RoomLayer};
use crate::definitions::cover::RangedCover;
use crate::world::Terrain;

/// A room or cell where fighting can happen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub exits: Vec<LocationId>,
    #[serde(default)]
    pub cover: Vec<RangedCover>,
    #[serde(default = "default_layers")]
    pub layers: Vec<RoomLayer>,
}

fn default_layers() -> Vec<RoomLayer> {
    vec![RoomLayer::GroundLevel]
}

impl Location {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: LocationId(id),
            name: name.into(),
            exits: Vec::new(),
            cover: Vec::new(),
            layers: default_layers(),
        }
    }

    pub fn with_cover(mut self, cover: RangedCover) -> Self {
        self.cover.push(cover);
        self
    }

    pub fn with_layers(mut self, layers: &[RoomLayer]) -> Self {
        self.layers = layers.to_vec();
        self
    }
}

/// Undirected graph of locations
#[derive(Debug, Clone, Default)]
pub struct LocationGraph {
    locations: AHashMap<LocationId, Location>,
}

impl LocationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: Location) {
        self.locations.insert(location.id, location);
    }

    /// Add an exit in both directions
    pub fn connect(&mut self, a: LocationId, b: LocationId) {
        if let Some(loc) = self.locations.get_mut(&a) {
            if !loc.exits.contains(&b) {
                loc.exits.push(b);
            }
        }
        if let Some(loc) = self.locations.get_mut(&b) {
            if !loc.exits.contains(&a) {
                loc.exits.push(a);
            }
        }
    }

    /// Build from locations, mirroring every exit
    pub fn from_locations(locations: impl IntoIterator<Item = Location>) -> Self {
        let mut graph = Self::new();
        let mut links = Vec::new();
        for location in locations {
            links.extend(location.exits.iter().map(|e| (location.id, *e)));
            graph.insert(location);
        }
        for (a, b) in links {
            graph.connect(a, b);
        }
        graph
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

fn reconstruct_path(
    came_from: &AHashMap<LocationId, LocationId>,
    mut current: LocationId,
) -> Vec<LocationId> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

impl Terrain for LocationGraph {
    fn contains(&self, location: LocationId) -> bool {
        self.locations.contains_key(&location)
    }

    fn neighbours(&self, location: LocationId) -> Vec<LocationId> {
        self.locations
            .get(&location)
            .map(|l| l.exits.clone())
            .unwrap_or_default()
    }

    fn path(&self, from: LocationId, to: LocationId) -> Option<Vec<LocationId>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        let mut queue = VecDeque::from([from]);
        let mut came_from: AHashMap<LocationId, LocationId> = AHashMap::new();

        while let Some(current) = queue.pop_front() {
            for next in self.neighbours(current) {
                if next == from || came_from.contains_key(&next) || !self.contains(next) {
                    continue;
                }
                came_from.insert(next, current);
                if next == to {
                    return Some(reconstruct_path(&came_from, next));
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn cover_at(&self, location: LocationId) -> Vec<RangedCover> {
        self.locations
            .get(&location)
            .map(|l| l.cover.clone())
            .unwrap_or_default()
    }

    fn layers_at(&self, location: LocationId) -> Vec<RoomLayer> {
        self.locations
            .get(&location)
            .map(|l| l.layers.clone())
            .unwrap_or_else(default_layers)
    }
}
