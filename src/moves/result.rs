//! What a resolved move did

use serde::{Deserialize, Serialize};

use crate::check::{Difficulty, OpposedOutcome, Outcome};
use crate::combat::WoundSeverity;
use crate::core::types::{CombatantId, ItemId, LimbId, LocationId};
use crate::tracking::Released;

/// One observable consequence of a move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoveNote {
    Missed,
    /// Stopped entirely by armour or shields
    Absorbed { target: CombatantId },
    Wounded {
        target: CombatantId,
        limb: LimbId,
        amount: f64,
        severity: WoundSeverity,
    },
    Killed { target: CombatantId },
    KnockedOut { target: CombatantId },
    Staggered { target: CombatantId },
    Unbalanced { target: CombatantId },
    PushedBack { target: CombatantId },
    Disarmed { target: CombatantId, item: ItemId },
    ClinchStarted { with: CombatantId },
    ClinchBroken { with: CombatantId },
    LimbGrappled { target: CombatantId, limb: LimbId },
    TakenDown { target: CombatantId },
    Rescued { ally: CombatantId },
    Engaged { target: CombatantId },
    AimImproved { target: CombatantId, percentage: f64 },
    Readied,
    Loaded,
    OutOfAmmunition,
    Wielded { item: ItemId },
    Retrieved { item: ItemId },
    StoodUp,
    WokeUp,
    Fled { to: LocationId },
    Moved { to: LocationId },
    LayerChanged,
    TookCover { cover: String },
    /// The move could not be carried out
    Failed { reason: String },
}

impl MoveNote {
    pub fn failed(reason: impl Into<String>) -> Self {
        MoveNote::Failed {
            reason: reason.into(),
        }
    }
}

/// Outcome of resolving one move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveResult {
    /// The assailant's own check
    pub outcome: Outcome,
    pub opposed: Option<OpposedOutcome>,
    pub recovery_difficulty: Difficulty,
    /// Recovery check; scales the assailant's next delay
    pub recovery: Outcome,
    /// The defender spent effort answering the move
    pub defender_acted: bool,
    pub left_combat: bool,
    /// Trackers released while resolving; owners must drop their handles
    pub released: Vec<Released>,
    pub notes: Vec<MoveNote>,
}

impl MoveResult {
    pub fn new(outcome: Outcome, recovery_difficulty: Difficulty) -> Self {
        Self {
            outcome,
            opposed: None,
            recovery_difficulty,
            recovery: Outcome::MinorPass,
            defender_acted: false,
            left_combat: false,
            released: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn landed(&self) -> bool {
        self.opposed.is_some_and(|o| o.proponent_wins())
    }

    pub fn killed(&self) -> Option<CombatantId> {
        self.notes.iter().find_map(|n| match n {
            MoveNote::Killed { target } => Some(*target),
            _ => None,
        })
    }

    /// A wound of any severity was dealt
    pub fn drew_blood(&self) -> bool {
        self.notes
            .iter()
            .any(|n| matches!(n, MoveNote::Wounded { amount, .. } if *amount > 0.0))
    }

    pub fn failed(&self) -> bool {
        self.notes.iter().any(|n| matches!(n, MoveNote::Failed { .. }))
    }
}
