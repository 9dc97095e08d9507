//! Notifications raised by combat sessions

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::check::Outcome;
use crate::core::types::{CombatantId, LocationId, Seconds, SessionId};
use crate::moves::MoveNote;

/// Why a combatant left a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveReason {
    /// Asked to leave
    Quit,
    Fled,
    Died,
    Incapacitated,
    /// Gave up after first blood in a friendly bout
    Yielded,
    Truce,
    /// Nobody left to fight
    NoTarget,
    CombatEnded,
    /// Taken out of the world entirely
    Removed,
}

impl LeaveReason {
    /// Leaving on the combatant's own initiative
    pub fn is_voluntary(&self) -> bool {
        matches!(self, LeaveReason::Quit | LeaveReason::Fled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    CombatStarted {
        session: SessionId,
    },
    Joined {
        session: SessionId,
        combatant: CombatantId,
    },
    Left {
        session: SessionId,
        combatant: CombatantId,
        reason: LeaveReason,
    },
    MoveResolved {
        session: SessionId,
        assailant: CombatantId,
        target: Option<CombatantId>,
        action: String,
        outcome: Outcome,
        landed: bool,
        notes: Vec<MoveNote>,
    },
    Died {
        session: SessionId,
        combatant: CombatantId,
    },
    LocationChanged {
        combatant: CombatantId,
        to: LocationId,
    },
    TruceOffered {
        session: SessionId,
        combatant: CombatantId,
    },
    TruceAgreed {
        session: SessionId,
    },
    CombatMerged {
        from: SessionId,
        into: SessionId,
    },
    CombatEnds {
        session: SessionId,
    },
}

impl CombatEvent {
    pub fn session(&self) -> Option<SessionId> {
        match self {
            CombatEvent::CombatStarted { session }
            | CombatEvent::Joined { session, .. }
            | CombatEvent::Left { session, .. }
            | CombatEvent::MoveResolved { session, .. }
            | CombatEvent::Died { session, .. }
            | CombatEvent::TruceOffered { session, .. }
            | CombatEvent::TruceAgreed { session }
            | CombatEvent::CombatEnds { session } => Some(*session),
            CombatEvent::CombatMerged { into, .. } => Some(*into),
            CombatEvent::LocationChanged { .. } => None,
        }
    }
}

/// Receives every event the engine raises
pub trait CombatObserver {
    fn notify(&mut self, time: Seconds, event: &CombatEvent);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub time: Seconds,
    pub event: CombatEvent,
}

/// Collects events in order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: Seconds, event: CombatEvent) {
        self.events.push(LoggedEvent { time, event });
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatEvent> {
        self.events.iter().map(|e| &e.event)
    }

    pub fn count(&self, predicate: impl Fn(&CombatEvent) -> bool) -> usize {
        self.iter().filter(|e| predicate(e)).count()
    }

    /// How many times `CombatEnds` fired for a session
    pub fn ends_of(&self, session: SessionId) -> usize {
        self.count(|e| matches!(e, CombatEvent::CombatEnds { session: s } if *s == session))
    }

    pub fn moves(&self) -> usize {
        self.count(|e| matches!(e, CombatEvent::MoveResolved { .. }))
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl CombatObserver for EventLog {
    fn notify(&mut self, time: Seconds, event: &CombatEvent) {
        self.push(time, event.clone());
    }
}

/// Writes lifecycle events to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CombatObserver for TracingObserver {
    fn notify(&mut self, time: Seconds, event: &CombatEvent) {
        match event {
            CombatEvent::MoveResolved {
                assailant,
                action,
                landed,
                ..
            } => info!(time, combatant = %assailant, action = %action, landed, "move"),
            CombatEvent::Joined { session, combatant } => {
                info!(time, session = %session, combatant = %combatant, "joined combat")
            }
            CombatEvent::Left {
                session,
                combatant,
                reason,
            } => info!(time, session = %session, combatant = %combatant, ?reason, "left combat"),
            CombatEvent::Died { combatant, .. } => info!(time, combatant = %combatant, "died"),
            CombatEvent::CombatMerged { from, into } => {
                info!(time, from = %from, into = %into, "combat merged")
            }
            CombatEvent::CombatEnds { session } => info!(time, session = %session, "combat ends"),
            other => info!(time, event = ?other, "combat event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_log_counts_ends_per_session() {
        let a = SessionId(Uuid::from_u128(1));
        let b = SessionId(Uuid::from_u128(2));
        let mut log = EventLog::new();
        log.notify(1.0, &CombatEvent::CombatEnds { session: a });
        log.notify(2.0, &CombatEvent::CombatStarted { session: b });
        assert_eq!(log.ends_of(a), 1);
        assert_eq!(log.ends_of(b), 0);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_voluntary_reasons() {
        assert!(LeaveReason::Fled.is_voluntary());
        assert!(LeaveReason::Quit.is_voluntary());
        assert!(!LeaveReason::Truce.is_voluntary());
        assert!(!LeaveReason::CombatEnded.is_voluntary());
    }

    #[test]
    fn test_merge_event_belongs_to_survivor() {
        let from = SessionId(Uuid::from_u128(1));
        let into = SessionId(Uuid::from_u128(2));
        assert_eq!(
            CombatEvent::CombatMerged { from, into }.session(),
            Some(into)
        );
    }
}
