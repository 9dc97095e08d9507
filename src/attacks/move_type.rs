//! Attack and defense classifications

use serde::{Deserialize, Serialize};

/// Attack categories weighed by combat settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttackCategory {
    Weapon,
    Natural,
    Magic,
    Psychic,
    Auxiliary,
}

impl AttackCategory {
    /// Order in which settings percentages are laid out as probability bands
    pub const BANDS: [AttackCategory; 5] = [
        AttackCategory::Weapon,
        AttackCategory::Natural,
        AttackCategory::Magic,
        AttackCategory::Psychic,
        AttackCategory::Auxiliary,
    ];
}

/// Mechanical shape of an attack, which decides its secondary effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttackKind {
    #[default]
    Standard,
    /// Usable while clinched; most attacks are not
    Clinch,
    StaggeringBlow,
    UnbalancingBlow,
    Pushback,
    Disarm,
    /// Breaks a clinch and injures the limb hit
    DisablingStrike,
    /// Only against helpless targets
    CoupDeGrace,
}

impl AttackKind {
    pub fn has_secondary_effect(&self) -> bool {
        matches!(
            self,
            AttackKind::StaggeringBlow
                | AttackKind::UnbalancingBlow
                | AttackKind::Pushback
                | AttackKind::Disarm
                | AttackKind::DisablingStrike
        )
    }

    /// May be used from inside a clinch
    pub fn usable_in_clinch(&self) -> bool {
        matches!(self, AttackKind::Clinch | AttackKind::DisablingStrike)
    }
}

/// Ways to defend against an incoming move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseType {
    Block,
    Parry,
    Dodge,
    /// Wrestling counter against grapple moves
    Counter,
    /// No defense at all; always fails
    Helpless,
}

/// Hands an attack needs its weapon held in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Handedness {
    #[default]
    Any,
    OneHanded,
    TwoHanded,
}

impl Handedness {
    pub fn permits(&self, hands_used: usize) -> bool {
        match self {
            Handedness::Any => hands_used >= 1,
            Handedness::OneHanded => hands_used == 1,
            Handedness::TwoHanded => hands_used >= 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handedness() {
        assert!(Handedness::Any.permits(1));
        assert!(Handedness::Any.permits(2));
        assert!(!Handedness::Any.permits(0));
        assert!(Handedness::OneHanded.permits(1));
        assert!(!Handedness::OneHanded.permits(2));
        assert!(!Handedness::TwoHanded.permits(1));
    }

    #[test]
    fn test_clinch_usability() {
        assert!(AttackKind::Clinch.usable_in_clinch());
        assert!(AttackKind::DisablingStrike.usable_in_clinch());
        assert!(!AttackKind::Standard.usable_in_clinch());
        assert!(!AttackKind::CoupDeGrace.has_secondary_effect());
    }
}
