//! Terrain seam: adjacency, distance, line of sight and cover per location

pub mod graph;

pub use graph::{Location, LocationGraph};

use crate::core::types::{LocationId, RoomLayer};
use crate::definitions::cover::RangedCover;

/// What the engine needs to know about the world around a fight
pub trait Terrain {
    fn contains(&self, location: LocationId) -> bool;

    fn neighbours(&self, location: LocationId) -> Vec<LocationId>;

    /// Shortest route, both ends included
    fn path(&self, from: LocationId, to: LocationId) -> Option<Vec<LocationId>>;

    /// Cover available at a location
    fn cover_at(&self, location: LocationId) -> Vec<RangedCover>;

    /// Layers that exist at a location
    fn layers_at(&self, location: LocationId) -> Vec<RoomLayer>;

    /// Steps between two locations
    fn distance(&self, from: LocationId, to: LocationId) -> Option<u32> {
        self.path(from, to).map(|p| p.len().saturating_sub(1) as u32)
    }

    /// First location to move to when heading for `to`
    fn next_step(&self, from: LocationId, to: LocationId) -> Option<LocationId> {
        self.path(from, to).and_then(|p| p.get(1).copied())
    }

    /// A neighbour that increases distance from `threat`
    fn step_away(&self, from: LocationId, threat: LocationId) -> Option<LocationId> {
        let here = self.distance(from, threat).unwrap_or(0);
        self.neighbours(from)
            .into_iter()
            .filter_map(|n| self.distance(n, threat).map(|d| (n, d)))
            .filter(|(_, d)| *d > here)
            .max_by_key(|(_, d)| *d)
            .map(|(n, _)| n)
    }

    /// Within `range` steps along an open route
    fn in_line_of_sight(&self, from: LocationId, to: LocationId, range: u32) -> bool {
        self.distance(from, to).is_some_and(|d| d <= range)
    }
}
