//! Check outcomes and opposed outcomes
//!
//! A single check produces one of six outcomes. Two checks compared against
//! each other produce an opposed outcome: who won, and by how many degrees.

use serde::{Deserialize, Serialize};

/// Result grade of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    MajorFail,
    Fail,
    MinorFail,
    MinorPass,
    Pass,
    MajorPass,
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::MinorPass | Outcome::Pass | Outcome::MajorPass)
    }

    pub fn is_fail(&self) -> bool {
        !self.is_pass()
    }

    /// Rank on the six-step scale, MajorFail = 0
    pub fn rank(&self) -> i32 {
        *self as i32
    }

    /// Signed success count: MajorFail = -3 .. MajorPass = 3, never 0
    pub fn successes(&self) -> i32 {
        match self {
            Outcome::MajorFail => -3,
            Outcome::Fail => -2,
            Outcome::MinorFail => -1,
            Outcome::MinorPass => 1,
            Outcome::Pass => 2,
            Outcome::MajorPass => 3,
        }
    }
}

/// Which side of an opposed check came out ahead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpposedDirection {
    Proponent,
    Opponent,
    Stalemate,
}

/// Margin of victory in an opposed check
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum OpposedOutcomeDegree {
    #[default]
    None,
    Marginal,
    Minor,
    Moderate,
    Major,
    Total,
}

impl OpposedOutcomeDegree {
    pub fn from_margin(margin: u32) -> Self {
        match margin {
            0 => OpposedOutcomeDegree::None,
            1 => OpposedOutcomeDegree::Marginal,
            2 => OpposedOutcomeDegree::Minor,
            3 => OpposedOutcomeDegree::Moderate,
            4 => OpposedOutcomeDegree::Major,
            _ => OpposedOutcomeDegree::Total,
        }
    }

    /// Numeric value used by damage formulas (`degree` variable)
    pub fn value(&self) -> f64 {
        *self as u8 as f64
    }
}

/// Comparison of a proponent's check against an opponent's check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpposedOutcome {
    pub proponent: Outcome,
    pub opponent: Outcome,
    pub direction: OpposedDirection,
    pub degree: OpposedOutcomeDegree,
}

impl OpposedOutcome {
    pub fn new(proponent: Outcome, opponent: Outcome) -> Self {
        let margin = proponent.rank() - opponent.rank();
        let direction = match margin.cmp(&0) {
            std::cmp::Ordering::Greater => OpposedDirection::Proponent,
            std::cmp::Ordering::Less => OpposedDirection::Opponent,
            std::cmp::Ordering::Equal => OpposedDirection::Stalemate,
        };
        Self {
            proponent,
            opponent,
            direction,
            degree: OpposedOutcomeDegree::from_margin(margin.unsigned_abs()),
        }
    }

    /// An opposed outcome the proponent wins outright by `degree`
    pub fn proponent_victory(degree: OpposedOutcomeDegree) -> Self {
        Self {
            proponent: Outcome::MajorPass,
            opponent: Outcome::MajorFail,
            direction: OpposedDirection::Proponent,
            degree,
        }
    }

    pub fn proponent_wins(&self) -> bool {
        self.direction == OpposedDirection::Proponent
    }

    pub fn opponent_wins(&self) -> bool {
        self.direction == OpposedDirection::Opponent
    }

    /// Did the proponent win by at least `degree`?
    pub fn proponent_wins_by(&self, degree: OpposedOutcomeDegree) -> bool {
        self.proponent_wins() && self.degree >= degree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_pass_fail() {
        assert!(Outcome::MinorPass.is_pass());
        assert!(Outcome::MinorFail.is_fail());
        assert_eq!(Outcome::MajorFail.successes(), -3);
    }

    #[test]
    fn test_opposed_margin() {
        let opposed = OpposedOutcome::new(Outcome::MajorPass, Outcome::MajorFail);
        assert!(opposed.proponent_wins());
        assert_eq!(opposed.degree, OpposedOutcomeDegree::Total);

        let close = OpposedOutcome::new(Outcome::MinorPass, Outcome::MinorFail);
        assert_eq!(close.degree, OpposedOutcomeDegree::Marginal);

        let lost = OpposedOutcome::new(Outcome::Fail, Outcome::Pass);
        assert!(lost.opponent_wins());
        assert_eq!(lost.degree, OpposedOutcomeDegree::Moderate);
    }

    #[test]
    fn test_stalemate() {
        let even = OpposedOutcome::new(Outcome::Pass, Outcome::Pass);
        assert_eq!(even.direction, OpposedDirection::Stalemate);
        assert_eq!(even.degree, OpposedOutcomeDegree::None);
        assert!(!even.proponent_wins_by(OpposedOutcomeDegree::None));
    }

    #[test]
    fn test_wins_by_threshold() {
        let opposed = OpposedOutcome::new(Outcome::Pass, Outcome::MinorFail);
        assert!(opposed.proponent_wins_by(OpposedOutcomeDegree::Minor));
        assert!(!opposed.proponent_wins_by(OpposedOutcomeDegree::Moderate));
    }
}
