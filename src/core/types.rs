//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an actor able to take part in combat
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "combatant#{}", _0)]
pub struct CombatantId(pub u64);

/// Unique identifier for a combat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display(fmt = "combat-{}", _0)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a location (room/cell) in the world graph
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "location#{}", _0)]
pub struct LocationId(pub u32);

/// Identifier of a physical item (weapon, shield, armour piece, ammunition)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "item#{}", _0)]
pub struct ItemId(pub u64);

/// Identifier of a limb/bodypart on a single body
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "limb#{}", _0)]
pub struct LimbId(pub u32);

/// Identifier of a static definition (weapon type, armour type, attack...)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
)]
#[display(fmt = "#{}", _0)]
pub struct DefinitionId(pub u32);

/// Game time in seconds since the engine started
pub type Seconds = f64;

/// Vertical layer of a location a combatant occupies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum RoomLayer {
    DeepUnderwater,
    Underwater,
    #[default]
    GroundLevel,
    InTrees,
    HighInTrees,
    InAir,
    HighInAir,
}

impl RoomLayer {
    /// Ordinal height used to decide direction of layer changes
    pub fn height(&self) -> i32 {
        match self {
            RoomLayer::DeepUnderwater => -2,
            RoomLayer::Underwater => -1,
            RoomLayer::GroundLevel => 0,
            RoomLayer::InTrees => 1,
            RoomLayer::HighInTrees => 2,
            RoomLayer::InAir => 3,
            RoomLayer::HighInAir => 4,
        }
    }

    /// Layers that require flight to occupy
    pub fn is_airborne(&self) -> bool {
        matches!(self, RoomLayer::InAir | RoomLayer::HighInAir)
    }

    /// Next layer one step toward `other`, or None if already there
    pub fn step_towards(&self, other: RoomLayer) -> Option<RoomLayer> {
        use RoomLayer::*;
        let order = [
            DeepUnderwater,
            Underwater,
            GroundLevel,
            InTrees,
            HighInTrees,
            InAir,
            HighInAir,
        ];
        let here = order.iter().position(|l| l == self)?;
        let there = order.iter().position(|l| *l == other)?;
        match here.cmp(&there) {
            std::cmp::Ordering::Less => Some(order[here + 1]),
            std::cmp::Ordering::Greater => Some(order[here - 1]),
            std::cmp::Ordering::Equal => None,
        }
    }
}
