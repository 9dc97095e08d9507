//! Wound severity classification
//!
//! Severity is a category derived from a damage amount and the configured
//! thresholds. Armour transformations and disabling-strike gates compare
//! against these categories, never against raw numbers.

use serde::{Deserialize, Serialize};

use crate::combat::damage::Damage;
use crate::core::types::LimbId;

/// Wound severity categories (not f64)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum WoundSeverity {
    #[default]
    None,
    Superficial,
    Minor,
    Small,
    Moderate,
    Severe,
    VerySevere,
    Grievous,
    Horrifying,
}

impl WoundSeverity {
    const ORDER: [WoundSeverity; 9] = [
        WoundSeverity::None,
        WoundSeverity::Superficial,
        WoundSeverity::Minor,
        WoundSeverity::Small,
        WoundSeverity::Moderate,
        WoundSeverity::Severe,
        WoundSeverity::VerySevere,
        WoundSeverity::Grievous,
        WoundSeverity::Horrifying,
    ];

    /// Classify a damage amount: the number of thresholds it meets
    pub fn classify(amount: f64, thresholds: &[f64; 8]) -> Self {
        let met = thresholds.iter().filter(|t| amount >= **t).count();
        Self::ORDER[met]
    }
}

/// A wound recorded against a bodypart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wound {
    pub limb: LimbId,
    pub damage: Damage,
    pub severity: WoundSeverity,
}

impl Wound {
    pub fn new(limb: LimbId, damage: Damage, thresholds: &[f64; 8]) -> Self {
        let severity = WoundSeverity::classify(damage.amount, thresholds);
        Self {
            limb,
            damage,
            severity,
        }
    }
}
