//! Weapon, ranged weapon, ammunition and shield types

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::attacks::{AttackInputs, WeaponAttack};
use crate::check::Difficulty;
use crate::combat::constants::{AMMO_QUALITY, AMMUNITION_VARIABLES, DEGREE, POWER, TRAIT, WEAPON_QUALITY};
use crate::combat::damage::{Damage, DamageType};
use crate::core::error::{CombatError, Result};
use crate::core::types::DefinitionId;
use crate::definitions::repository::Definition;
use crate::formula::{Formula, FormulaParameters};

fn one() -> usize {
    1
}

fn zero_formula() -> Formula {
    Formula::constant(0.0)
}

/// A melee weapon pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponType {
    pub id: DefinitionId,
    pub name: String,
    /// Trait used for attacking and parrying
    pub skill: String,
    pub attacks: Vec<WeaponAttack>,
    #[serde(default)]
    pub parry_bonus: f64,
    #[serde(default)]
    pub reach: u32,
    /// Hands needed to wield
    #[serde(default = "one")]
    pub hands: usize,
    #[serde(default)]
    pub classifications: Vec<String>,
}

impl WeaponType {
    pub fn clone_as(&self, id: DefinitionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn has_classification(&self, classification: &str) -> bool {
        self.classifications
            .iter()
            .any(|c| c.eq_ignore_ascii_case(classification))
    }

    pub fn validate(&self) -> Result<()> {
        if self.attacks.is_empty() {
            return Err(CombatError::InvalidDefinition {
                kind: Self::KIND,
                name: self.name.clone(),
                reason: "weapon has no attacks".into(),
            });
        }
        self.attacks.iter().try_for_each(WeaponAttack::validate)
    }
}

impl Definition for WeaponType {
    const KIND: &'static str = "weapon type";

    fn id(&self) -> DefinitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A bow, crossbow, sling or firearm pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangedWeaponType {
    pub id: DefinitionId,
    pub name: String,
    pub skill: String,
    /// Ammunition with this tag can be loaded
    pub ammunition_tag: String,
    #[serde(default = "one_u32")]
    pub capacity: u32,
    #[serde(default)]
    pub fire_difficulty: Difficulty,
    #[serde(default)]
    pub aim_difficulty: Difficulty,
    /// Multiplies the configured aim gain per aim move
    #[serde(default = "unit")]
    pub aim_gain_multiplier: f64,
    /// Must be readied (drawn, cocked) before loading
    #[serde(default)]
    pub requires_readying: bool,
    #[serde(default = "default_delay")]
    pub ready_delay: f64,
    #[serde(default = "default_delay")]
    pub load_delay: f64,
    #[serde(default = "default_delay")]
    pub fire_delay: f64,
    #[serde(default = "default_stamina")]
    pub stamina_to_fire: f64,
    #[serde(default = "default_stamina")]
    pub stamina_to_load: f64,
    /// Locations away the weapon can reach
    #[serde(default = "default_range")]
    pub range: u32,
    #[serde(default = "one")]
    pub hands: usize,
    /// Difficulty of dodging a shot from this weapon
    #[serde(default)]
    pub dodge_difficulty: Difficulty,
    #[serde(default)]
    pub block_difficulty: Difficulty,
    #[serde(default)]
    pub classifications: Vec<String>,
}

fn one_u32() -> u32 {
    1
}

fn unit() -> f64 {
    1.0
}

fn default_delay() -> f64 {
    3.0
}

fn default_stamina() -> f64 {
    2.0
}

fn default_range() -> u32 {
    2
}

impl RangedWeaponType {
    pub fn clone_as(&self, id: DefinitionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn accepts(&self, ammunition: &AmmunitionType) -> bool {
        self.ammunition_tag.eq_ignore_ascii_case(&ammunition.tag)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| CombatError::InvalidDefinition {
            kind: Self::KIND,
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.capacity == 0 {
            return Err(invalid("capacity must be at least one"));
        }
        if self.aim_gain_multiplier <= 0.0 {
            return Err(invalid("aim gain multiplier must be positive"));
        }
        if self.fire_delay <= 0.0 || self.load_delay <= 0.0 || self.ready_delay <= 0.0 {
            return Err(invalid("delays must be positive"));
        }
        Ok(())
    }
}

impl Definition for RangedWeaponType {
    const KIND: &'static str = "ranged weapon type";

    fn id(&self) -> DefinitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Arrows, bolts, bullets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmunitionType {
    pub id: DefinitionId,
    pub name: String,
    pub tag: String,
    pub damage_type: DamageType,
    pub damage: Formula,
    #[serde(default = "zero_formula")]
    pub pain: Formula,
    #[serde(default = "zero_formula")]
    pub stun: Formula,
    /// Difficulty of the penetration roll; absent means none
    #[serde(default)]
    pub penetration: Option<Difficulty>,
    /// Chance in [0, 1] the projectile is destroyed on impact
    #[serde(default)]
    pub breakage_chance: f64,
    #[serde(default)]
    pub classifications: Vec<String>,
}

impl AmmunitionType {
    pub fn clone_as(&self, id: DefinitionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..self.clone()
        }
    }

    /// Damage for a landed shot
    pub fn roll_damage(
        &self,
        inputs: &AttackInputs,
        ammo_quality: f64,
        rng: &mut dyn RngCore,
    ) -> Damage {
        let params = FormulaParameters::new()
            .with(DEGREE, inputs.degree.value())
            .with(TRAIT, inputs.trait_value)
            .with(WEAPON_QUALITY, inputs.weapon_quality)
            .with(AMMO_QUALITY, ammo_quality)
            .with(POWER, inputs.power);
        Damage::new(
            self.damage_type,
            self.damage.evaluate(&params, rng).max(0.0),
            self.pain.evaluate(&params, rng).max(0.0),
            self.stun.evaluate(&params, rng).max(0.0),
        )
    }

    pub fn validate(&self) -> Result<()> {
        for formula in [&self.damage, &self.pain, &self.stun] {
            formula.ensure_variables(AMMUNITION_VARIABLES)?;
        }
        if !(0.0..=1.0).contains(&self.breakage_chance) {
            return Err(CombatError::InvalidDefinition {
                kind: Self::KIND,
                name: self.name.clone(),
                reason: "breakage chance must be within [0, 1]".into(),
            });
        }
        Ok(())
    }
}

impl Definition for AmmunitionType {
    const KIND: &'static str = "ammunition type";

    fn id(&self) -> DefinitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A shield pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldType {
    pub id: DefinitionId,
    pub name: String,
    pub skill: String,
    /// Added to the blocker's trait value
    #[serde(default)]
    pub block_bonus: f64,
    #[serde(default = "default_stamina")]
    pub stamina_per_block: f64,
}

impl ShieldType {
    pub fn validate(&self) -> Result<()> {
        if self.stamina_per_block < 0.0 {
            return Err(CombatError::InvalidDefinition {
                kind: Self::KIND,
                name: self.name.clone(),
                reason: "stamina per block must not be negative".into(),
            });
        }
        Ok(())
    }
}

impl Definition for ShieldType {
    const KIND: &'static str = "shield type";

    fn id(&self) -> DefinitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
