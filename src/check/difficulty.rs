//! Difficulty ladder for checks
//!
//! Eleven named steps from Automatic to Impossible. Modifiers shift a check
//! along the ladder in whole steps rather than by arbitrary amounts.

use serde::{Deserialize, Serialize};

/// How hard a check is
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Difficulty {
    /// Always passes
    Automatic,
    Trivial,
    ExtremelyEasy,
    VeryEasy,
    Easy,
    #[default]
    Normal,
    Hard,
    VeryHard,
    ExtremelyHard,
    Insane,
    /// Always fails
    Impossible,
}

const LADDER: [Difficulty; 11] = [
    Difficulty::Automatic,
    Difficulty::Trivial,
    Difficulty::ExtremelyEasy,
    Difficulty::VeryEasy,
    Difficulty::Easy,
    Difficulty::Normal,
    Difficulty::Hard,
    Difficulty::VeryHard,
    Difficulty::ExtremelyHard,
    Difficulty::Insane,
    Difficulty::Impossible,
];

impl Difficulty {
    /// All difficulties, easiest first
    pub fn all() -> [Difficulty; 11] {
        LADDER
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Self {
        LADDER[index.min(LADDER.len() - 1)]
    }

    /// Steps away from Normal; negative is easier
    pub fn offset_from_normal(&self) -> i32 {
        self.index() as i32 - Difficulty::Normal.index() as i32
    }

    /// Make the check `steps` harder, saturating at Impossible
    pub fn stage_up(&self, steps: u32) -> Self {
        Self::from_index(self.index().saturating_add(steps as usize))
    }

    /// Make the check `steps` easier, saturating at Automatic
    pub fn stage_down(&self, steps: u32) -> Self {
        Self::from_index(self.index().saturating_sub(steps as usize))
    }

    /// Shift by a signed number of steps (positive is harder)
    pub fn staged(&self, steps: i32) -> Self {
        if steps >= 0 {
            self.stage_up(steps as u32)
        } else {
            self.stage_down(steps.unsigned_abs())
        }
    }

    /// Additive adjustment to the target number of a d100 check
    pub fn target_modifier(&self) -> f64 {
        match self {
            Difficulty::Automatic => 1000.0,
            Difficulty::Trivial => 50.0,
            Difficulty::ExtremelyEasy => 35.0,
            Difficulty::VeryEasy => 20.0,
            Difficulty::Easy => 10.0,
            Difficulty::Normal => 0.0,
            Difficulty::Hard => -10.0,
            Difficulty::VeryHard => -20.0,
            Difficulty::ExtremelyHard => -35.0,
            Difficulty::Insane => -50.0,
            Difficulty::Impossible => -1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_ordering() {
        assert!(Difficulty::Impossible > Difficulty::Insane);
        assert!(Difficulty::Hard > Difficulty::Normal);
        assert!(Difficulty::Automatic < Difficulty::Trivial);
    }

    #[test]
    fn test_stage_saturates() {
        assert_eq!(Difficulty::Insane.stage_up(5), Difficulty::Impossible);
        assert_eq!(Difficulty::Trivial.stage_down(5), Difficulty::Automatic);
        assert_eq!(Difficulty::Normal.stage_up(2), Difficulty::VeryHard);
        assert_eq!(Difficulty::Normal.staged(-1), Difficulty::Easy);
    }

    #[test]
    fn test_offset_from_normal() {
        assert_eq!(Difficulty::Normal.offset_from_normal(), 0);
        assert_eq!(Difficulty::Hard.offset_from_normal(), 1);
        assert_eq!(Difficulty::Easy.offset_from_normal(), -1);
    }
}
