//! Aim state

use serde::{Deserialize, Serialize};

use crate::core::types::{CombatantId, ItemId};

/// Fraction of a perfect aim, always within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct AimPercentage(f64);

impl AimPercentage {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn add(self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }

    pub fn is_full(&self) -> bool {
        self.0 >= 1.0
    }
}

impl From<f64> for AimPercentage {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<AimPercentage> for f64 {
    fn from(aim: AimPercentage) -> Self {
        aim.0
    }
}

/// A combatant lining up a shot on a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aim {
    pub aimer: CombatantId,
    pub target: CombatantId,
    pub weapon: ItemId,
    pub percentage: AimPercentage,
}

impl Aim {
    pub fn new(aimer: CombatantId, target: CombatantId, weapon: ItemId) -> Self {
        Self {
            aimer,
            target,
            weapon,
            percentage: AimPercentage::default(),
        }
    }

    pub fn improve(&mut self, gain: f64) {
        self.percentage = self.percentage.add(gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_on_construction() {
        assert_eq!(AimPercentage::new(1.7).value(), 1.0);
        assert_eq!(AimPercentage::new(-0.2).value(), 0.0);
        assert_eq!(AimPercentage::new(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_improve_saturates() {
        let mut aim = Aim::new(CombatantId(1), CombatantId(2), ItemId(3));
        for _ in 0..10 {
            aim.improve(0.3);
        }
        assert!(aim.percentage.is_full());
        aim.percentage = aim.percentage.add(-5.0);
        assert_eq!(aim.percentage.value(), 0.0);
    }

    #[test]
    fn test_deserialize_clamps() {
        let aim: AimPercentage = serde_json::from_str("3.5").unwrap();
        assert_eq!(aim.value(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_aim_stays_in_unit_interval(
            start in -10.0f64..10.0,
            deltas in proptest::collection::vec(-5.0f64..5.0, 0..40),
        ) {
            let mut aim = Aim::new(CombatantId(1), CombatantId(2), ItemId(1));
            aim.percentage = AimPercentage::new(start);
            prop_assert!((0.0..=1.0).contains(&aim.percentage.value()));
            for delta in deltas {
                aim.improve(delta);
                prop_assert!((0.0..=1.0).contains(&aim.percentage.value()));
            }
        }
    }
}
