//! Effects and markers attached to combatants
//!
//! The engine only needs a narrow view of the effect system: add an effect,
//! remove all of a kind, and enumerate effects of a kind.

use serde::{Deserialize, Serialize};

use crate::combat::layers::ShieldingEffect;
use crate::core::types::{CombatantId, Seconds};

/// An action chosen by a player or script ahead of the combatant's next turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManualAction {
    Stand,
    Flee,
    /// Attack with the named attack against the current target
    Attack { attack: String },
    SeekCover,
    Aim,
}

/// A temporary effect on a combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Proposed an end to hostilities
    Truce,
    /// Mid-way through a firing sequence at this target
    FiringInProgress { target: CombatantId },
    /// Next action is delayed by this many seconds
    Staggered { delay: Seconds },
    /// Defenses are one stage harder until the combatant next acts
    Unbalanced,
    Clinching { with: CombatantId },
    Guarding { ally: CombatantId },
    /// Prevents any combat action while present
    BlocksCombat { reason: String },
    PendingAction(ManualAction),
    Shielding(ShieldingEffect),
}

/// Discriminant used to query effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Truce,
    FiringInProgress,
    Staggered,
    Unbalanced,
    Clinching,
    Guarding,
    BlocksCombat,
    PendingAction,
    Shielding,
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Truce => EffectKind::Truce,
            Effect::FiringInProgress { .. } => EffectKind::FiringInProgress,
            Effect::Staggered { .. } => EffectKind::Staggered,
            Effect::Unbalanced => EffectKind::Unbalanced,
            Effect::Clinching { .. } => EffectKind::Clinching,
            Effect::Guarding { .. } => EffectKind::Guarding,
            Effect::BlocksCombat { .. } => EffectKind::BlocksCombat,
            Effect::PendingAction(_) => EffectKind::PendingAction,
            Effect::Shielding(_) => EffectKind::Shielding,
        }
    }
}

impl EffectKind {
    /// Kinds that only make sense inside a fight and are cleared on leaving
    pub fn is_combat_transient(&self) -> bool {
        matches!(
            self,
            EffectKind::Truce
                | EffectKind::FiringInProgress
                | EffectKind::Staggered
                | EffectKind::Unbalanced
                | EffectKind::Clinching
                | EffectKind::PendingAction
        )
    }
}

/// A combatant's effect list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    effects: Vec<Effect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Remove every effect of `kind`, returning how many went
    pub fn remove_all(&mut self, kind: EffectKind) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| e.kind() != kind);
        before - self.effects.len()
    }

    /// Remove and return the effects of `kind`
    pub fn take_all(&mut self, kind: EffectKind) -> Vec<Effect> {
        let (taken, kept): (Vec<Effect>, Vec<Effect>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|e| e.kind() == kind);
        self.effects = kept;
        taken
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind() == kind)
    }

    pub fn of_kind(&self, kind: EffectKind) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(move |e| e.kind() == kind)
    }

    pub fn shields_mut(&mut self) -> impl Iterator<Item = &mut ShieldingEffect> {
        self.effects.iter_mut().filter_map(|e| match e {
            Effect::Shielding(shield) => Some(shield),
            _ => None,
        })
    }

    pub fn firing_target(&self) -> Option<CombatantId> {
        self.effects.iter().find_map(|e| match e {
            Effect::FiringInProgress { target } => Some(*target),
            _ => None,
        })
    }

    pub fn clinching(&self) -> Option<CombatantId> {
        self.effects.iter().find_map(|e| match e {
            Effect::Clinching { with } => Some(*with),
            _ => None,
        })
    }

    pub fn guarding(&self) -> Option<CombatantId> {
        self.effects.iter().find_map(|e| match e {
            Effect::Guarding { ally } => Some(*ally),
            _ => None,
        })
    }

    pub fn pending_action(&self) -> Option<&ManualAction> {
        self.effects.iter().find_map(|e| match e {
            Effect::PendingAction(action) => Some(action),
            _ => None,
        })
    }

    pub fn clear_combat_transient(&mut self) {
        self.effects.retain(|e| !e.kind().is_combat_transient());
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
