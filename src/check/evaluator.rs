//! Check evaluation
//!
//! The engine never rolls dice itself; it asks a [`CheckEvaluator`] to grade a
//! trait value against a difficulty. [`StandardCheck`] is a d100 roll-under
//! with margin bands. Scripted evaluators exist for deterministic scenarios.

use std::cell::RefCell;
use std::collections::VecDeque;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::check::{Difficulty, OpposedOutcome, Outcome};

/// A graded check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub outcome: Outcome,
    pub target: f64,
    pub roll: f64,
}

/// Opposed-check evaluator seam
pub trait CheckEvaluator {
    /// Grade a trait value against a difficulty
    fn evaluate(&self, value: f64, difficulty: Difficulty, rng: &mut dyn RngCore) -> CheckResult;

    /// Probability in [0, 1] that `evaluate` passes
    fn success_chance(&self, value: f64, difficulty: Difficulty) -> f64;

    /// Roll both sides and compare them
    fn opposed(
        &self,
        proponent: (f64, Difficulty),
        opponent: (f64, Difficulty),
        rng: &mut dyn RngCore,
    ) -> OpposedOutcome {
        let a = self.evaluate(proponent.0, proponent.1, rng);
        let b = self.evaluate(opponent.0, opponent.1, rng);
        OpposedOutcome::new(a.outcome, b.outcome)
    }
}

/// d100 roll-under check with margin bands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardCheck {
    /// Margin (target - roll) needed for a Pass rather than a MinorPass
    pub pass_margin: f64,
    /// Margin needed for a MajorPass; mirrored for failures
    pub major_margin: f64,
}

impl Default for StandardCheck {
    fn default() -> Self {
        Self {
            pass_margin: 15.0,
            major_margin: 40.0,
        }
    }
}

impl StandardCheck {
    pub fn new() -> Self {
        Self::default()
    }

    fn grade(&self, margin: f64) -> Outcome {
        if margin >= self.major_margin {
            Outcome::MajorPass
        } else if margin >= self.pass_margin {
            Outcome::Pass
        } else if margin > 0.0 {
            Outcome::MinorPass
        } else if margin > -self.pass_margin {
            Outcome::MinorFail
        } else if margin > -self.major_margin {
            Outcome::Fail
        } else {
            Outcome::MajorFail
        }
    }
}

impl CheckEvaluator for StandardCheck {
    fn evaluate(&self, value: f64, difficulty: Difficulty, rng: &mut dyn RngCore) -> CheckResult {
        let target = value + difficulty.target_modifier();
        match difficulty {
            Difficulty::Automatic => CheckResult {
                outcome: Outcome::MajorPass,
                target,
                roll: 0.0,
            },
            Difficulty::Impossible => CheckResult {
                outcome: Outcome::MajorFail,
                target,
                roll: 100.0,
            },
            _ => {
                let roll: f64 = rng.gen_range(0.0..100.0);
                CheckResult {
                    outcome: self.grade(target - roll),
                    target,
                    roll,
                }
            }
        }
    }

    fn success_chance(&self, value: f64, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Automatic => 1.0,
            Difficulty::Impossible => 0.0,
            _ => ((value + difficulty.target_modifier()) / 100.0).clamp(0.0, 1.0),
        }
    }
}

/// Always returns the same outcome; chance is 1 for passes and 0 for fails
#[derive(Debug, Clone, Copy)]
pub struct FixedCheck {
    pub outcome: Outcome,
}

impl FixedCheck {
    pub fn new(outcome: Outcome) -> Self {
        Self { outcome }
    }
}

impl CheckEvaluator for FixedCheck {
    fn evaluate(&self, value: f64, difficulty: Difficulty, _rng: &mut dyn RngCore) -> CheckResult {
        CheckResult {
            outcome: self.outcome,
            target: value + difficulty.target_modifier(),
            roll: 50.0,
        }
    }

    fn success_chance(&self, _value: f64, _difficulty: Difficulty) -> f64 {
        if self.outcome.is_pass() {
            1.0
        } else {
            0.0
        }
    }
}

/// Replays queued outcomes in order, then falls back to a standard check
#[derive(Debug, Default)]
pub struct ScriptedCheck {
    queue: RefCell<VecDeque<Outcome>>,
    fallback: StandardCheck,
}

impl ScriptedCheck {
    pub fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            queue: RefCell::new(outcomes.into_iter().collect()),
            fallback: StandardCheck::default(),
        }
    }

    pub fn push(&self, outcome: Outcome) {
        self.queue.borrow_mut().push_back(outcome);
    }

    pub fn remaining(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl CheckEvaluator for ScriptedCheck {
    fn evaluate(&self, value: f64, difficulty: Difficulty, rng: &mut dyn RngCore) -> CheckResult {
        match self.queue.borrow_mut().pop_front() {
            Some(outcome) => CheckResult {
                outcome,
                target: value + difficulty.target_modifier(),
                roll: 50.0,
            },
            None => self.fallback.evaluate(value, difficulty, rng),
        }
    }

    fn success_chance(&self, value: f64, difficulty: Difficulty) -> f64 {
        self.fallback.success_chance(value, difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::OpposedOutcomeDegree;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_automatic_and_impossible() {
        let check = StandardCheck::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(
                check.evaluate(0.0, Difficulty::Automatic, &mut rng).outcome,
                Outcome::MajorPass
            );
            assert_eq!(
                check.evaluate(500.0, Difficulty::Impossible, &mut rng).outcome,
                Outcome::MajorFail
            );
        }
    }

    #[test]
    fn test_success_chance_tracks_difficulty() {
        let check = StandardCheck::new();
        let easy = check.success_chance(50.0, Difficulty::Easy);
        let hard = check.success_chance(50.0, Difficulty::Hard);
        assert!((easy - 0.6).abs() < 1e-9);
        assert!((hard - 0.4).abs() < 1e-9);
        assert_eq!(check.success_chance(200.0, Difficulty::Normal), 1.0);
        assert_eq!(check.success_chance(-20.0, Difficulty::Normal), 0.0);
    }

    #[test]
    fn test_margin_grading() {
        let check = StandardCheck::new();
        assert_eq!(check.grade(45.0), Outcome::MajorPass);
        assert_eq!(check.grade(20.0), Outcome::Pass);
        assert_eq!(check.grade(1.0), Outcome::MinorPass);
        assert_eq!(check.grade(0.0), Outcome::MinorFail);
        assert_eq!(check.grade(-20.0), Outcome::Fail);
        assert_eq!(check.grade(-40.0), Outcome::MajorFail);
    }

    #[test]
    fn test_scripted_then_fallback() {
        let check = ScriptedCheck::new([Outcome::MajorPass, Outcome::MajorFail]);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let opposed = check.opposed((10.0, Difficulty::Normal), (10.0, Difficulty::Normal), &mut rng);
        assert_eq!(opposed.degree, OpposedOutcomeDegree::Total);
        assert_eq!(check.remaining(), 0);
        let result = check.evaluate(0.0, Difficulty::Automatic, &mut rng);
        assert_eq!(result.outcome, Outcome::MajorPass);
    }
}
