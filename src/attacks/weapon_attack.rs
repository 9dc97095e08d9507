//! Attack definitions shared by weapons, natural body parts and powers

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::attacks::intentions::Intentions;
use crate::attacks::move_type::{AttackCategory, AttackKind, DefenseType, Handedness};
use crate::check::{Difficulty, OpposedOutcomeDegree};
use crate::combat::constants::{ATTACK_VARIABLES, DEGREE, POWER, QUALITY, TRAIT, WEAPON_QUALITY};
use crate::combat::damage::{Damage, DamageType};
use crate::combatant::body::LimbKind;
use crate::combatant::state::PositionState;
use crate::core::error::{CombatError, Result};
use crate::core::types::DefinitionId;
use crate::definitions::repository::Definition;
use crate::formula::{Formula, FormulaParameters};

/// Difficulty the defender faces for each kind of defense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseDifficulties {
    pub block: Difficulty,
    pub parry: Difficulty,
    pub dodge: Difficulty,
}

impl Default for DefenseDifficulties {
    fn default() -> Self {
        Self {
            block: Difficulty::Normal,
            parry: Difficulty::Normal,
            dodge: Difficulty::Normal,
        }
    }
}

impl DefenseDifficulties {
    pub fn for_defense(&self, defense: DefenseType) -> Difficulty {
        match defense {
            DefenseType::Block => self.block,
            DefenseType::Parry => self.parry,
            DefenseType::Dodge => self.dodge,
            DefenseType::Counter => Difficulty::Normal,
            DefenseType::Helpless => Difficulty::Impossible,
        }
    }
}

/// Inputs to an attack's damage formulas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackInputs {
    pub degree: OpposedOutcomeDegree,
    /// Attacker's relevant trait value
    pub trait_value: f64,
    pub weapon_quality: f64,
    /// Raw strength behind the blow
    pub power: f64,
}

impl AttackInputs {
    pub fn parameters(&self) -> FormulaParameters {
        FormulaParameters::new()
            .with(DEGREE, self.degree.value())
            .with(TRAIT, self.trait_value)
            .with(WEAPON_QUALITY, self.weapon_quality)
            .with(QUALITY, self.weapon_quality)
            .with(POWER, self.power)
    }
}

fn default_category() -> AttackCategory {
    AttackCategory::Weapon
}

fn default_weighting() -> f64 {
    100.0
}

fn default_stamina_cost() -> f64 {
    5.0
}

fn default_base_delay() -> f64 {
    3.0
}

fn zero_formula() -> Formula {
    Formula::constant(0.0)
}

fn default_secondary_degree() -> OpposedOutcomeDegree {
    OpposedOutcomeDegree::Minor
}

/// A single attack a weapon, limb or power can make
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponAttack {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: AttackCategory,
    #[serde(default)]
    pub kind: AttackKind,
    #[serde(default)]
    pub intentions: Intentions,
    #[serde(default = "default_weighting")]
    pub weighting: f64,
    /// Attacker's check difficulty
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub defense: DefenseDifficulties,
    pub damage_type: DamageType,
    pub damage: Formula,
    #[serde(default = "zero_formula")]
    pub pain: Formula,
    #[serde(default = "zero_formula")]
    pub stun: Formula,
    #[serde(default = "default_stamina_cost")]
    pub stamina_cost: f64,
    #[serde(default = "default_base_delay")]
    pub base_delay: f64,
    #[serde(default)]
    pub recovery_difficulty: Difficulty,
    /// Empty means any upright position
    #[serde(default)]
    pub required_positions: Vec<PositionState>,
    #[serde(default)]
    pub handedness: Handedness,
    /// Opposed degree needed before a secondary effect lands
    #[serde(default = "default_secondary_degree")]
    pub secondary_degree: OpposedOutcomeDegree,
    /// Difficulty of the penetration roll; absent means the attack never penetrates
    #[serde(default)]
    pub penetration: Option<Difficulty>,
}

impl WeaponAttack {
    pub fn new(
        id: DefinitionId,
        name: impl Into<String>,
        damage_type: DamageType,
        damage: Formula,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: AttackCategory::Weapon,
            kind: AttackKind::Standard,
            intentions: Intentions::empty(),
            weighting: default_weighting(),
            difficulty: Difficulty::Normal,
            defense: DefenseDifficulties::default(),
            damage_type,
            damage,
            pain: zero_formula(),
            stun: zero_formula(),
            stamina_cost: default_stamina_cost(),
            base_delay: default_base_delay(),
            recovery_difficulty: Difficulty::Normal,
            required_positions: Vec::new(),
            handedness: Handedness::Any,
            secondary_degree: default_secondary_degree(),
            penetration: None,
        }
    }

    pub fn with_kind(mut self, kind: AttackKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_category(mut self, category: AttackCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_intentions(mut self, intentions: Intentions) -> Self {
        self.intentions = intentions;
        self
    }

    pub fn with_weighting(mut self, weighting: f64) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_stamina_cost(mut self, cost: f64) -> Self {
        self.stamina_cost = cost;
        self
    }

    pub fn with_pain(mut self, pain: Formula) -> Self {
        self.pain = pain;
        self
    }

    pub fn with_penetration(mut self, difficulty: Difficulty) -> Self {
        self.penetration = Some(difficulty);
        self
    }

    /// Can the attack be made from this position?
    pub fn usable_from(&self, position: PositionState) -> bool {
        if self.required_positions.is_empty() {
            position.is_upright()
        } else {
            self.required_positions.contains(&position)
        }
    }

    /// Evaluate damage, pain and stun for a landed blow
    pub fn roll_damage(&self, inputs: &AttackInputs, rng: &mut dyn RngCore) -> Damage {
        let params = inputs.parameters();
        Damage::new(
            self.damage_type,
            self.damage.evaluate(&params, rng).max(0.0),
            self.pain.evaluate(&params, rng).max(0.0),
            self.stun.evaluate(&params, rng).max(0.0),
        )
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| CombatError::InvalidDefinition {
            kind: "weapon attack",
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        for formula in [&self.damage, &self.pain, &self.stun] {
            formula.ensure_variables(ATTACK_VARIABLES)?;
        }
        if self.weighting < 0.0 {
            return Err(invalid("weighting must not be negative"));
        }
        if self.stamina_cost < 0.0 {
            return Err(invalid("stamina cost must not be negative"));
        }
        if self.base_delay <= 0.0 {
            return Err(invalid("base delay must be positive"));
        }
        Ok(())
    }
}

impl Definition for WeaponAttack {
    const KIND: &'static str = "attack";

    fn id(&self) -> DefinitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An attack delivered by a body part rather than a held weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalAttack {
    pub attack: WeaponAttack,
    pub limb: LimbKind,
    #[serde(default)]
    pub quality: f64,
}

impl NaturalAttack {
    pub fn new(attack: WeaponAttack, limb: LimbKind) -> Self {
        Self {
            attack: attack.with_category(AttackCategory::Natural),
            limb,
            quality: 0.0,
        }
    }
}
