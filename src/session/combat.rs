//! A single ongoing fight

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{CombatantId, LocationId, Seconds, SessionId};
use crate::session::variant::SessionRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    /// Flushing its members out; accepts no joins
    Ending,
    Destroyed,
}

/// Membership and bookkeeping of one combat
///
/// Combatants themselves live in the engine; a session only records who
/// takes part and where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSession {
    pub id: SessionId,
    pub state: SessionState,
    pub rules: SessionRules,
    pub started: Seconds,
    /// Moves resolved so far
    pub moves: u64,
    members: BTreeSet<CombatantId>,
    locations: BTreeSet<LocationId>,
}

impl CombatSession {
    pub fn new(id: SessionId, rules: SessionRules, started: Seconds) -> Self {
        Self {
            id,
            state: SessionState::Active,
            rules,
            started,
            moves: 0,
            members: BTreeSet::new(),
            locations: BTreeSet::new(),
        }
    }

    pub fn friendly(&self) -> bool {
        self.rules.friendly
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn members(&self) -> &BTreeSet<CombatantId> {
        &self.members
    }

    pub fn locations(&self) -> &BTreeSet<LocationId> {
        &self.locations
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn add(&mut self, id: CombatantId, location: LocationId) -> bool {
        self.locations.insert(location);
        self.members.insert(id)
    }

    pub fn remove(&mut self, id: CombatantId) -> bool {
        self.members.remove(&id)
    }

    pub fn involve(&mut self, location: LocationId) {
        self.locations.insert(location);
    }

    /// Take over another session's members and locations
    pub fn absorb(&mut self, other: CombatSession) {
        self.members.extend(other.members);
        self.locations.extend(other.locations);
        self.moves += other.moves;
        self.started = self.started.min(other.started);
    }
}
