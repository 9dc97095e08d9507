//! Ranged cover definitions

use serde::{Deserialize, Serialize};

use crate::check::Difficulty;
use crate::combatant::state::PositionState;
use crate::core::error::{CombatError, Result};
use crate::core::types::DefinitionId;
use crate::definitions::repository::Definition;

/// How much of the body the cover hides
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CoverExtent {
    Marginal,
    Partial,
    NearTotal,
    Total,
}

impl CoverExtent {
    /// Difficulty stages added to incoming ranged attacks
    pub fn difficulty_stages(&self) -> u32 {
        match self {
            CoverExtent::Marginal => 1,
            CoverExtent::Partial => 2,
            CoverExtent::NearTotal => 3,
            CoverExtent::Total => 5,
        }
    }
}

/// Whether cover stops projectiles or only hides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverType {
    /// Hides the body; projectiles pass through
    Soft,
    /// Stops projectiles
    Hard,
}

/// A kind of cover a location can offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangedCover {
    pub id: DefinitionId,
    pub name: String,
    pub extent: CoverExtent,
    pub cover_type: CoverType,
    /// Position a combatant must take to use it
    pub position: PositionState,
    /// Zero means unlimited
    #[serde(default)]
    pub max_occupants: u32,
    /// Total cover also stops the occupant firing out
    #[serde(default)]
    pub blocks_own_fire: bool,
}

impl RangedCover {
    /// Difficulty of hitting someone in this cover, from a base difficulty
    pub fn shift_difficulty(&self, base: Difficulty) -> Difficulty {
        let stages = match self.cover_type {
            CoverType::Hard => self.extent.difficulty_stages(),
            CoverType::Soft => self.extent.difficulty_stages().saturating_sub(1),
        };
        base.stage_up(stages)
    }

    pub fn has_room(&self, occupants: u32) -> bool {
        self.max_occupants == 0 || occupants < self.max_occupants
    }

    pub fn validate(&self) -> Result<()> {
        if self.extent == CoverExtent::Total && !self.blocks_own_fire && self.cover_type == CoverType::Soft {
            return Err(CombatError::InvalidDefinition {
                kind: Self::KIND,
                name: self.name.clone(),
                reason: "total soft cover must block its occupant's fire".into(),
            });
        }
        Ok(())
    }
}

impl Definition for RangedCover {
    const KIND: &'static str = "ranged cover";

    fn id(&self) -> DefinitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
