//! Position and consciousness states

use serde::{Deserialize, Serialize};

/// Physical posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PositionState {
    #[default]
    Standing,
    Kneeling,
    Sitting,
    Prone,
    Flying,
    Swimming,
    Climbing,
}

impl PositionState {
    /// Positions most attacks can be made from
    pub fn is_upright(&self) -> bool {
        matches!(
            self,
            PositionState::Standing | PositionState::Flying | PositionState::Swimming
        )
    }

    /// Able to move between locations without first standing
    pub fn can_move(&self) -> bool {
        matches!(
            self,
            PositionState::Standing
                | PositionState::Flying
                | PositionState::Swimming
                | PositionState::Climbing
        )
    }

    /// Dodging is possible
    pub fn can_dodge(&self) -> bool {
        self.can_move() || matches!(self, PositionState::Kneeling)
    }
}

/// Consciousness and life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CharacterState {
    #[default]
    Awake,
    Sleeping,
    Unconscious,
    Paralysed,
    Dead,
}

impl CharacterState {
    pub fn can_act(&self) -> bool {
        matches!(self, CharacterState::Awake)
    }

    /// Alive but unable to defend
    pub fn is_helpless(&self) -> bool {
        matches!(
            self,
            CharacterState::Sleeping | CharacterState::Unconscious | CharacterState::Paralysed
        )
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, CharacterState::Dead)
    }
}
