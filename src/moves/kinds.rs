//! Proposed moves
//!
//! A move lives for one decision cycle: the strategy builds it, the target's
//! strategy answers it, resolution consumes it.

use serde::{Deserialize, Serialize};

use crate::attacks::WeaponAttack;
use crate::check::Difficulty;
use crate::core::types::{CombatantId, ItemId, LimbId, LocationId, RoomLayer};
use crate::definitions::cover::RangedCover;

/// An attack together with what delivers it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackMove {
    pub attack: WeaponAttack,
    /// Weapon item, absent for natural attacks and powers
    pub weapon: Option<ItemId>,
    /// Weapon or body part quality
    pub quality: f64,
    /// Trait rolled for the attack
    pub skill: String,
}

/// Steps of a grapple, from taking hold to finishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrappleStage {
    ExtendControl { limb: LimbId },
    Takedown,
    Wrench { limb: LimbId },
    Strangle,
}

impl GrappleStage {
    pub fn is_escalation(&self) -> bool {
        !matches!(self, GrappleStage::ExtendControl { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoveKind {
    Attack(AttackMove),
    BreakClinch,
    Grapple(GrappleStage),
    /// Step in front of an ally's attacker
    Rescue { ally: CombatantId },
    /// Shoot the wielded ranged weapon; defense difficulties come from the weapon
    Fire {
        weapon: ItemId,
        dodge: Difficulty,
        block: Difficulty,
    },
    Aim { weapon: ItemId },
    Ready { weapon: ItemId },
    Load { weapon: ItemId },
    Wield { item: ItemId },
    Retrieve { item: ItemId },
    Stand,
    Wake,
    Flee { to: Option<LocationId> },
    /// Close to striking distance within the same location
    Engage,
    Move { to: LocationId },
    ChangeLayer { to: RoomLayer },
    SeekCover { cover: RangedCover },
}

impl MoveKind {
    /// Moves the target gets to defend against
    pub fn is_hostile(&self) -> bool {
        matches!(
            self,
            MoveKind::Attack(_)
                | MoveKind::BreakClinch
                | MoveKind::Grapple(_)
                | MoveKind::Rescue { .. }
                | MoveKind::Fire { .. }
        )
    }

    /// Moves that act on another combatant
    pub fn needs_target(&self) -> bool {
        self.is_hostile() || matches!(self, MoveKind::Aim { .. } | MoveKind::Engage)
    }

    pub fn label(&self) -> String {
        match self {
            MoveKind::Attack(a) => a.attack.name.clone(),
            MoveKind::BreakClinch => "break clinch".into(),
            MoveKind::Grapple(GrappleStage::ExtendControl { .. }) => "grapple limb".into(),
            MoveKind::Grapple(GrappleStage::Takedown) => "takedown".into(),
            MoveKind::Grapple(GrappleStage::Wrench { .. }) => "wrench".into(),
            MoveKind::Grapple(GrappleStage::Strangle) => "strangle".into(),
            MoveKind::Rescue { .. } => "rescue".into(),
            MoveKind::Fire { .. } => "fire".into(),
            MoveKind::Aim { .. } => "aim".into(),
            MoveKind::Ready { .. } => "ready".into(),
            MoveKind::Load { .. } => "load".into(),
            MoveKind::Wield { .. } => "wield".into(),
            MoveKind::Retrieve { .. } => "retrieve".into(),
            MoveKind::Stand => "stand".into(),
            MoveKind::Wake => "wake".into(),
            MoveKind::Flee { .. } => "flee".into(),
            MoveKind::Engage => "engage".into(),
            MoveKind::Move { .. } => "move".into(),
            MoveKind::ChangeLayer { .. } => "change layer".into(),
            MoveKind::SeekCover { .. } => "seek cover".into(),
        }
    }
}

/// A single proposed action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatMove {
    pub assailant: CombatantId,
    pub targets: Vec<CombatantId>,
    pub kind: MoveKind,
    pub stamina_cost: f64,
    /// Seconds before the assailant acts again, before recovery scaling
    pub base_delay: f64,
    pub recovery_difficulty: Difficulty,
    /// Chosen ahead of time by a player or script
    pub manual: bool,
}

impl CombatMove {
    pub fn new(assailant: CombatantId, kind: MoveKind, stamina_cost: f64, base_delay: f64) -> Self {
        Self {
            assailant,
            targets: Vec::new(),
            kind,
            stamina_cost,
            base_delay,
            recovery_difficulty: Difficulty::Normal,
            manual: false,
        }
    }

    pub fn against(mut self, target: CombatantId) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_recovery(mut self, difficulty: Difficulty) -> Self {
        self.recovery_difficulty = difficulty;
        self
    }

    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    pub fn target(&self) -> Option<CombatantId> {
        self.targets.first().copied()
    }

    pub fn attack(&self) -> Option<&AttackMove> {
        match &self.kind {
            MoveKind::Attack(a) => Some(a),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self.target() {
            Some(target) => format!("{} -> {}", self.kind.label(), target),
            None => self.kind.label(),
        }
    }
}
