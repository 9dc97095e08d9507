//! Penetration: can an attack bypass an armour layer outright?
//!
//! The attacker's penetration roll is made once per attack and carried on the
//! damage packet. Each layer answers with its own defense check; the two are
//! compared as an opposed outcome. Bypass is all-or-nothing.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::check::{CheckEvaluator, Difficulty, OpposedOutcome, OpposedOutcomeDegree, Outcome};

/// Result of one layer's penetration contest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenetrationResult {
    /// The attack carried no penetration roll
    NoPenetrationAttempt,
    /// The layer cannot be penetrated at any degree
    Impenetrable,
    /// Attacker won by at least the layer's minimum degree
    Bypassed(OpposedOutcome),
    /// Layer held; normal dissipate/absorb processing follows
    Resisted(OpposedOutcome),
}

impl PenetrationResult {
    pub fn bypassed(&self) -> bool {
        matches!(self, PenetrationResult::Bypassed(_))
    }
}

/// The attacker's penetration roll for one attack
pub fn roll_penetration(
    evaluator: &dyn CheckEvaluator,
    value: f64,
    difficulty: Difficulty,
    rng: &mut dyn RngCore,
) -> Outcome {
    evaluator.evaluate(value, difficulty, rng).outcome
}

/// Contest a penetration roll against a layer
///
/// `minimum_degree` of `None` marks a layer that nothing penetrates.
pub fn resolve_penetration(
    attack_roll: Option<Outcome>,
    layer_defense: f64,
    minimum_degree: Option<OpposedOutcomeDegree>,
    evaluator: &dyn CheckEvaluator,
    rng: &mut dyn RngCore,
) -> PenetrationResult {
    let Some(attack_roll) = attack_roll else {
        return PenetrationResult::NoPenetrationAttempt;
    };
    let Some(minimum_degree) = minimum_degree else {
        return PenetrationResult::Impenetrable;
    };
    let defense = evaluator.evaluate(layer_defense, Difficulty::Normal, rng);
    let opposed = OpposedOutcome::new(attack_roll, defense.outcome);
    if opposed.proponent_wins_by(minimum_degree) {
        PenetrationResult::Bypassed(opposed)
    } else {
        PenetrationResult::Resisted(opposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::FixedCheck;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_no_roll_means_no_attempt() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = resolve_penetration(
            None,
            50.0,
            Some(OpposedOutcomeDegree::Marginal),
            &FixedCheck::new(Outcome::MajorFail),
            &mut rng,
        );
        assert_eq!(result, PenetrationResult::NoPenetrationAttempt);
    }

    #[test]
    fn test_major_pass_beats_major_fail_defense() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = resolve_penetration(
            Some(Outcome::MajorPass),
            50.0,
            Some(OpposedOutcomeDegree::Major),
            &FixedCheck::new(Outcome::MajorFail),
            &mut rng,
        );
        assert!(result.bypassed());
    }

    #[test]
    fn test_insufficient_degree_resists() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // Pass vs MinorPass is a Marginal win
        let result = resolve_penetration(
            Some(Outcome::Pass),
            50.0,
            Some(OpposedOutcomeDegree::Minor),
            &FixedCheck::new(Outcome::MinorPass),
            &mut rng,
        );
        assert!(matches!(result, PenetrationResult::Resisted(_)));
    }

    #[test]
    fn test_impenetrable_layer() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = resolve_penetration(
            Some(Outcome::MajorPass),
            0.0,
            None,
            &FixedCheck::new(Outcome::MajorFail),
            &mut rng,
        );
        assert_eq!(result, PenetrationResult::Impenetrable);
    }
}
