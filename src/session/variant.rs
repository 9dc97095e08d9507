//! Session rule sets and script hooks

use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::core::types::SessionId;
use crate::moves::{CombatMove, MoveResult};
use crate::session::events::LeaveReason;

/// How a session treats incapacitation, leaving and scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRules {
    /// Friendly bout; nobody intends to kill
    pub friendly: bool,
    /// Unconscious or paralysed combatants drop out instead of lying there
    pub incapacitation_ends_participation: bool,
    /// The first wound drawn sends the wounded combatant out
    pub first_blood_ends: bool,
    /// Fleeing or quitting needs every opponent's agreement through a truce
    pub leave_requires_consent: bool,
    /// Fire [`CombatHooks`] on join, leave, move and end
    pub scripted: bool,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl SessionRules {
    /// Lethal fight
    pub fn standard() -> Self {
        Self {
            friendly: false,
            incapacitation_ends_participation: false,
            first_blood_ends: false,
            leave_requires_consent: false,
            scripted: false,
        }
    }

    pub fn sparring() -> Self {
        Self {
            friendly: true,
            incapacitation_ends_participation: true,
            first_blood_ends: true,
            ..Self::standard()
        }
    }

    pub fn consensual_leave() -> Self {
        Self {
            leave_requires_consent: true,
            ..Self::standard()
        }
    }

    pub fn scripted() -> Self {
        Self {
            scripted: true,
            ..Self::standard()
        }
    }

    /// Whether a combatant in this state must leave the session
    pub fn must_leave(&self, combatant: &Combatant) -> Option<LeaveReason> {
        if combatant.is_dead() {
            Some(LeaveReason::Died)
        } else if self.incapacitation_ends_participation && combatant.is_incapacitated() {
            Some(LeaveReason::Incapacitated)
        } else {
            None
        }
    }
}

/// Script callbacks for scripted sessions
pub trait CombatHooks {
    fn on_join(&mut self, _session: SessionId, _combatant: &Combatant) {}

    fn on_leave(&mut self, _session: SessionId, _combatant: &Combatant, _reason: LeaveReason) {}

    fn on_move(&mut self, _session: SessionId, _mv: &CombatMove, _result: &MoveResult) {}

    fn on_end(&mut self, _session: SessionId) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl CombatHooks for NoHooks {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::CharacterState;
    use crate::core::types::{CombatantId, LocationId};

    #[test]
    fn test_presets() {
        let sparring = SessionRules::sparring();
        assert!(sparring.friendly && sparring.first_blood_ends);
        assert!(!SessionRules::standard().friendly);
        assert!(SessionRules::consensual_leave().leave_requires_consent);
        assert!(SessionRules::scripted().scripted);
    }

    #[test]
    fn test_must_leave_by_variant() {
        let mut fighter = Combatant::new(CombatantId(1), "fighter", LocationId(1));
        assert_eq!(SessionRules::standard().must_leave(&fighter), None);
        fighter.state = CharacterState::Unconscious;
        assert_eq!(SessionRules::standard().must_leave(&fighter), None);
        assert_eq!(
            SessionRules::sparring().must_leave(&fighter),
            Some(LeaveReason::Incapacitated)
        );
        fighter.state = CharacterState::Dead;
        assert_eq!(
            SessionRules::standard().must_leave(&fighter),
            Some(LeaveReason::Died)
        );
    }

    #[test]
    fn test_rules_from_toml_fill_defaults() {
        let rules: SessionRules = toml::from_str("first_blood_ends = true").unwrap();
        assert!(rules.first_blood_ends);
        assert!(!rules.friendly);
    }
}
