//! Damage packets handed from attacks to armour layers and bodyparts

use serde::{Deserialize, Serialize};

use crate::check::Outcome;
use crate::core::types::{CombatantId, LimbId};

/// Physical or supernatural kind of damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Slashing,
    Chopping,
    Crushing,
    Piercing,
    Ballistic,
    ArmourPiercing,
    Shrapnel,
    Bite,
    Claw,
    Shearing,
    Wrenching,
    Burning,
    Freezing,
    Chemical,
    Electrical,
    Shockwave,
    Sonic,
    Hypoxia,
    Cellular,
    Necrotic,
    Falling,
    Eldritch,
    Arcane,
}

impl DamageType {
    /// Cutting/penetrating kinds measured against a material's shear yield
    pub fn uses_shear_strength(&self) -> bool {
        matches!(
            self,
            DamageType::Slashing
                | DamageType::Chopping
                | DamageType::Piercing
                | DamageType::Ballistic
                | DamageType::ArmourPiercing
                | DamageType::Shrapnel
                | DamageType::Bite
                | DamageType::Claw
                | DamageType::Shearing
        )
    }

    /// Kinds that grapple finishing moves produce and that armour barely affects
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DamageType::Wrenching | DamageType::Hypoxia | DamageType::Cellular
        )
    }

    pub fn parse(text: &str) -> Option<Self> {
        use DamageType::*;
        let all = [
            Slashing,
            Chopping,
            Crushing,
            Piercing,
            Ballistic,
            ArmourPiercing,
            Shrapnel,
            Bite,
            Claw,
            Shearing,
            Wrenching,
            Burning,
            Freezing,
            Chemical,
            Electrical,
            Shockwave,
            Sonic,
            Hypoxia,
            Cellular,
            Necrotic,
            Falling,
            Eldritch,
            Arcane,
        ];
        all.into_iter()
            .find(|t| format!("{:?}", t).eq_ignore_ascii_case(text.trim()))
    }
}

/// One packet of damage travelling toward a bodypart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub damage_type: DamageType,
    pub amount: f64,
    pub pain: f64,
    pub stun: f64,
    /// Radians from the surface; PI/2 is a square hit
    pub angle_of_incidence: f64,
    /// Attacker's penetration roll, if the attack tries to bypass armour
    pub penetration: Option<Outcome>,
    pub bodypart: Option<LimbId>,
    pub source: Option<CombatantId>,
}

impl Damage {
    pub fn new(damage_type: DamageType, amount: f64, pain: f64, stun: f64) -> Self {
        Self {
            damage_type,
            amount,
            pain,
            stun,
            angle_of_incidence: std::f64::consts::FRAC_PI_2,
            penetration: None,
            bodypart: None,
            source: None,
        }
    }

    pub fn with_penetration(mut self, outcome: Outcome) -> Self {
        self.penetration = Some(outcome);
        self
    }

    pub fn with_angle(mut self, radians: f64) -> Self {
        self.angle_of_incidence = radians;
        self
    }

    pub fn on_bodypart(mut self, limb: LimbId) -> Self {
        self.bodypart = Some(limb);
        self
    }

    pub fn from_source(mut self, source: CombatantId) -> Self {
        self.source = Some(source);
        self
    }

    /// Are all three channels spent?
    pub fn is_spent(&self) -> bool {
        self.amount <= 0.0 && self.pain <= 0.0 && self.stun <= 0.0
    }

    /// Copy with new channel amounts, negatives floored at zero
    pub fn with_channels(&self, amount: f64, pain: f64, stun: f64) -> Self {
        Self {
            amount: amount.max(0.0),
            pain: pain.max(0.0),
            stun: stun.max(0.0),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spent_requires_all_channels() {
        assert!(Damage::new(DamageType::Crushing, 0.0, 0.0, 0.0).is_spent());
        assert!(!Damage::new(DamageType::Crushing, 0.0, 0.1, 0.0).is_spent());
        assert!(Damage::new(DamageType::Crushing, -1.0, -2.0, 0.0).is_spent());
    }

    #[test]
    fn test_with_channels_floors_negatives() {
        let damage = Damage::new(DamageType::Slashing, 5.0, 5.0, 5.0).with_channels(-1.0, 2.0, -0.5);
        assert_eq!(damage.amount, 0.0);
        assert_eq!(damage.pain, 2.0);
        assert_eq!(damage.stun, 0.0);
        assert_eq!(damage.damage_type, DamageType::Slashing);
    }

    #[test]
    fn test_parse_damage_type() {
        assert_eq!(DamageType::parse("piercing"), Some(DamageType::Piercing));
        assert_eq!(DamageType::parse("ArmourPiercing"), Some(DamageType::ArmourPiercing));
        assert_eq!(DamageType::parse("tickling"), None);
    }

    #[test]
    fn test_shear_classification() {
        assert!(DamageType::Slashing.uses_shear_strength());
        assert!(!DamageType::Crushing.uses_shear_strength());
        assert!(DamageType::Hypoxia.is_internal());
    }
}
