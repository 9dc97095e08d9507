//! Armour type definitions
//!
//! An armour type holds, per damage type, a pair of formula triples:
//! Dissipate (what the layer writes off, leaving the amount it suffers itself)
//! and Absorb (what passes on to the next layer). Formulas see the layer's
//! quality and material plus the incoming amount; see [`crate::combat::constants`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::check::OpposedOutcomeDegree;
use crate::combat::constants::{ARMOR_VARIABLES, DAMAGE};
use crate::combat::damage::DamageType;
use crate::combat::wounds::WoundSeverity;
use crate::core::error::{CombatError, Result};
use crate::core::types::DefinitionId;
use crate::definitions::repository::Definition;
use crate::formula::Formula;

/// One formula per damage channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFormulas {
    pub damage: Formula,
    pub pain: Formula,
    pub stun: Formula,
}

impl ChannelFormulas {
    /// The same formula text for all three channels
    pub fn uniform(text: &str) -> Result<Self> {
        let formula = Formula::parse(text)?;
        Ok(Self {
            damage: formula.clone(),
            pain: formula.clone(),
            stun: formula,
        })
    }

    /// Passes each channel through untouched
    pub fn passthrough() -> Self {
        let formula = Formula::parse(DAMAGE).unwrap_or_else(|_| Formula::constant(0.0));
        Self {
            damage: formula.clone(),
            pain: formula.clone(),
            stun: formula,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formula> {
        [&self.damage, &self.pain, &self.stun].into_iter()
    }

    pub fn ensure_variables(&self, allowed: &[&str]) -> Result<()> {
        self.iter().try_for_each(|f| f.ensure_variables(allowed))
    }
}

/// Dissipate and absorb stages for one damage type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorFormulas {
    pub dissipate: ChannelFormulas,
    pub absorb: ChannelFormulas,
}

/// Remap a weak residual to another damage type (an arrow stopped by mail bruises)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTransformation {
    pub from: DamageType,
    pub to: DamageType,
    /// Residuals at or below this severity are transformed
    pub max_severity: WoundSeverity,
}

/// A kind of armour, shared by every item made to its pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorType {
    pub id: DefinitionId,
    pub name: String,
    /// Degree an attacker must win by to bypass the layer; absent means never
    #[serde(default)]
    pub minimum_penetration_degree: Option<OpposedOutcomeDegree>,
    /// Trait value of the layer's penetration defense check
    #[serde(default = "default_penetration_defense")]
    pub penetration_defense: f64,
    #[serde(default)]
    pub formulas: BTreeMap<DamageType, ArmorFormulas>,
    /// Used for damage types without their own entry; absent means no protection
    #[serde(default)]
    pub fallback: Option<ArmorFormulas>,
    #[serde(default)]
    pub transformations: Vec<DamageTransformation>,
}

fn default_penetration_defense() -> f64 {
    50.0
}

impl ArmorType {
    pub fn new(id: DefinitionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            minimum_penetration_degree: None,
            penetration_defense: default_penetration_defense(),
            formulas: BTreeMap::new(),
            fallback: None,
            transformations: Vec::new(),
        }
    }

    pub fn with_formulas(mut self, damage_type: DamageType, formulas: ArmorFormulas) -> Self {
        self.formulas.insert(damage_type, formulas);
        self
    }

    pub fn with_fallback(mut self, formulas: ArmorFormulas) -> Self {
        self.fallback = Some(formulas);
        self
    }

    pub fn with_minimum_penetration(mut self, degree: OpposedOutcomeDegree) -> Self {
        self.minimum_penetration_degree = Some(degree);
        self
    }

    pub fn with_transformation(mut self, transformation: DamageTransformation) -> Self {
        self.transformations.push(transformation);
        self
    }

    pub fn formulas_for(&self, damage_type: DamageType) -> Option<&ArmorFormulas> {
        self.formulas.get(&damage_type).or(self.fallback.as_ref())
    }

    /// Target type for a residual of `severity`, if a transformation applies
    pub fn transform(&self, damage_type: DamageType, severity: WoundSeverity) -> Option<DamageType> {
        self.transformations
            .iter()
            .find(|t| t.from == damage_type && severity <= t.max_severity)
            .map(|t| t.to)
    }

    /// Copy under a new identity; formulas and thresholds are carried over unchanged
    pub fn clone_as(&self, id: DefinitionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| CombatError::InvalidDefinition {
            kind: "armor type",
            name: self.name.clone(),
            reason,
        };
        for formulas in self.formulas.values().chain(self.fallback.iter()) {
            formulas.dissipate.ensure_variables(ARMOR_VARIABLES)?;
            formulas.absorb.ensure_variables(ARMOR_VARIABLES)?;
        }
        if let Some(t) = self.transformations.iter().find(|t| t.from == t.to) {
            return Err(invalid(format!("transformation maps {:?} to itself", t.from)));
        }
        Ok(())
    }
}

impl Definition for ArmorType {
    const KIND: &'static str = "armor type";

    fn id(&self) -> DefinitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
