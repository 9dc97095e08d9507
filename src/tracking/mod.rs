//! Aim and cover trackers
//!
//! Trackers live in an arena owned by the engine. Each entry holds a
//! single-use release token; the first invalidating event takes the token and
//! removes the entry, so an entry is released at most once no matter how many
//! events name it.

pub mod aim;

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{CombatantId, DefinitionId, LocationId};
use crate::definitions::cover::RangedCover;
pub use aim::{Aim, AimPercentage};

/// Handle to a tracker in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[display(fmt = "tracker#{}", _0)]
pub struct TrackerId(pub u64);

/// Consumed on release; never cloned
#[derive(Debug, PartialEq, Eq)]
pub struct ReleaseToken(TrackerId);

impl ReleaseToken {
    pub fn id(&self) -> TrackerId {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackerKind {
    Aim,
    Cover,
}

/// A combatant sheltering behind cover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverOccupation {
    pub occupant: CombatantId,
    pub cover: RangedCover,
    pub location: LocationId,
}

/// Events that can invalidate trackers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerEvent {
    /// Moved or changed position
    Moved(CombatantId),
    Died(CombatantId),
    LeftCombat(CombatantId),
    LocationChanged(CombatantId),
    /// The combatant switched to a different target
    TargetChanged(CombatantId),
}

impl TrackerEvent {
    pub fn subject(&self) -> CombatantId {
        match *self {
            TrackerEvent::Moved(id)
            | TrackerEvent::Died(id)
            | TrackerEvent::LeftCombat(id)
            | TrackerEvent::LocationChanged(id)
            | TrackerEvent::TargetChanged(id) => id,
        }
    }

    fn invalidates_aim(&self, aim: &Aim) -> bool {
        let who = self.subject();
        match self {
            TrackerEvent::TargetChanged(_) => aim.aimer == who,
            _ => aim.aimer == who || aim.target == who,
        }
    }

    fn invalidates_cover(&self, cover: &CoverOccupation) -> bool {
        !matches!(self, TrackerEvent::TargetChanged(_)) && cover.occupant == self.subject()
    }
}

/// A tracker that was released; its owner must drop its handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Released {
    pub id: TrackerId,
    pub owner: CombatantId,
    pub kind: TrackerKind,
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    token: Option<ReleaseToken>,
}

/// Arena of live aim and cover trackers
#[derive(Debug, Default)]
pub struct TrackerArena {
    aims: BTreeMap<TrackerId, Entry<Aim>>,
    covers: BTreeMap<TrackerId, Entry<CoverOccupation>>,
    next: u64,
    released: u64,
}

impl TrackerArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> TrackerId {
        self.next += 1;
        TrackerId(self.next)
    }

    pub fn begin_aim(&mut self, aim: Aim) -> TrackerId {
        let id = self.allocate();
        debug!(tracker = %id, aimer = %aim.aimer, target = %aim.target, "aim started");
        self.aims.insert(
            id,
            Entry {
                value: aim,
                token: Some(ReleaseToken(id)),
            },
        );
        id
    }

    pub fn take_cover(&mut self, occupation: CoverOccupation) -> TrackerId {
        let id = self.allocate();
        debug!(tracker = %id, occupant = %occupation.occupant, cover = %occupation.cover.name, "took cover");
        self.covers.insert(
            id,
            Entry {
                value: occupation,
                token: Some(ReleaseToken(id)),
            },
        );
        id
    }

    pub fn aim(&self, id: TrackerId) -> Option<&Aim> {
        self.aims.get(&id).map(|e| &e.value)
    }

    pub fn aim_mut(&mut self, id: TrackerId) -> Option<&mut Aim> {
        self.aims.get_mut(&id).map(|e| &mut e.value)
    }

    pub fn cover(&self, id: TrackerId) -> Option<&CoverOccupation> {
        self.covers.get(&id).map(|e| &e.value)
    }

    /// How many combatants shelter behind a cover at a location
    pub fn occupants(&self, location: LocationId, cover: DefinitionId) -> u32 {
        self.covers
            .values()
            .filter(|e| e.value.location == location && e.value.cover.id == cover)
            .count() as u32
    }

    pub fn live(&self) -> usize {
        self.aims.len() + self.covers.len()
    }

    /// Total releases performed over the arena's life
    pub fn released_count(&self) -> u64 {
        self.released
    }

    fn release_aim(&mut self, id: TrackerId) -> Option<Released> {
        let token = self.aims.get_mut(&id)?.token.take()?;
        let entry = self.aims.remove(&token.id())?;
        self.released += 1;
        Some(Released {
            id,
            owner: entry.value.aimer,
            kind: TrackerKind::Aim,
        })
    }

    fn release_cover(&mut self, id: TrackerId) -> Option<Released> {
        let token = self.covers.get_mut(&id)?.token.take()?;
        let entry = self.covers.remove(&token.id())?;
        self.released += 1;
        Some(Released {
            id,
            owner: entry.value.occupant,
            kind: TrackerKind::Cover,
        })
    }

    /// Release a tracker directly; `None` if it was already released
    pub fn release(&mut self, id: TrackerId) -> Option<Released> {
        self.release_aim(id).or_else(|| self.release_cover(id))
    }

    /// Release every tracker the event invalidates
    pub fn notify(&mut self, event: TrackerEvent) -> Vec<Released> {
        let aims: Vec<TrackerId> = self
            .aims
            .iter()
            .filter(|(_, e)| event.invalidates_aim(&e.value))
            .map(|(id, _)| *id)
            .collect();
        let covers: Vec<TrackerId> = self
            .covers
            .iter()
            .filter(|(_, e)| event.invalidates_cover(&e.value))
            .map(|(id, _)| *id)
            .collect();
        let mut released: Vec<Released> = Vec::with_capacity(aims.len() + covers.len());
        for id in aims {
            released.extend(self.release_aim(id));
        }
        for id in covers {
            released.extend(self.release_cover(id));
        }
        for r in &released {
            debug!(tracker = %r.id, owner = %r.owner, kind = ?r.kind, ?event, "tracker released");
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::state::PositionState;
    use crate::core::types::ItemId;
    use crate::definitions::cover::{CoverExtent, CoverType};

    fn wall() -> RangedCover {
        RangedCover {
            id: DefinitionId(1),
            name: "wall".into(),
            extent: CoverExtent::Partial,
            cover_type: CoverType::Hard,
            position: PositionState::Kneeling,
            max_occupants: 0,
            blocks_own_fire: false,
        }
    }

    #[test]
    fn test_target_death_releases_aim_once() {
        let mut arena = TrackerArena::new();
        let id = arena.begin_aim(Aim::new(CombatantId(1), CombatantId(2), ItemId(9)));

        let first = arena.notify(TrackerEvent::Died(CombatantId(2)));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].owner, CombatantId(1));
        assert!(arena.notify(TrackerEvent::Moved(CombatantId(1))).is_empty());
        assert!(arena.release(id).is_none());
        assert_eq!(arena.released_count(), 1);
        assert!(arena.aim(id).is_none());
    }

    #[test]
    fn test_target_change_only_releases_own_aim() {
        let mut arena = TrackerArena::new();
        let mine = arena.begin_aim(Aim::new(CombatantId(1), CombatantId(2), ItemId(9)));
        let theirs = arena.begin_aim(Aim::new(CombatantId(2), CombatantId(1), ItemId(8)));
        let released = arena.notify(TrackerEvent::TargetChanged(CombatantId(1)));
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].id, mine);
        assert!(arena.aim(theirs).is_some());
    }

    #[test]
    fn test_cover_released_on_move_not_on_target_change() {
        let mut arena = TrackerArena::new();
        let id = arena.take_cover(CoverOccupation {
            occupant: CombatantId(4),
            cover: wall(),
            location: LocationId(1),
        });
        assert_eq!(arena.occupants(LocationId(1), DefinitionId(1)), 1);
        assert!(arena.notify(TrackerEvent::TargetChanged(CombatantId(4))).is_empty());
        let released = arena.notify(TrackerEvent::Moved(CombatantId(4)));
        assert_eq!(released[0].kind, TrackerKind::Cover);
        assert_eq!(arena.occupants(LocationId(1), DefinitionId(1)), 0);
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn test_aim_can_be_improved_in_place() {
        let mut arena = TrackerArena::new();
        let id = arena.begin_aim(Aim::new(CombatantId(1), CombatantId(2), ItemId(9)));
        arena.aim_mut(id).unwrap().improve(0.4);
        assert_eq!(arena.aim(id).unwrap().percentage.value(), 0.4);
    }
}
