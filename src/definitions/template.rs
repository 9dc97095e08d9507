//! Combatant templates: a combatant described by definition names
//!
//! Templates are checked against the loaded definitions when the document is
//! read and instantiated as often as needed afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attacks::{AttackCategory, NaturalAttack};
use crate::combat::layers::{NaturalArmor, WornArmor};
use crate::combat::material::Material;
use crate::combatant::body::{Body, LimbKind};
use crate::combatant::equipment::{AmmoStack, Equipment, GearItem};
use crate::combatant::stamina::Stamina;
use crate::combatant::Combatant;
use crate::core::error::{CombatError, Result};
use crate::core::types::{CombatantId, ItemId, LimbId, LocationId};
use crate::definitions::loader::Definitions;
use crate::definitions::repository::Repository;
use crate::strategy::mode::CombatStrategyMode;

fn default_quality() -> f64 {
    5.0
}

fn default_stamina() -> f64 {
    100.0
}

fn yes() -> bool {
    true
}

fn default_material() -> String {
    "leather".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BodyPlan {
    #[default]
    Humanoid,
    Quadruped,
}

impl BodyPlan {
    pub fn body(&self) -> Body {
        match self {
            BodyPlan::Humanoid => Body::humanoid(),
            BodyPlan::Quadruped => Body::quadruped(),
        }
    }
}

/// A carried weapon or shield, by definition name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearSpec {
    pub name: String,
    #[serde(default = "default_quality")]
    pub quality: f64,
    #[serde(default = "yes")]
    pub wielded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoSpec {
    pub name: String,
    #[serde(default = "default_quality")]
    pub quality: f64,
    pub count: u32,
}

/// A worn armour piece; no limb kinds means full coverage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorSpec {
    pub armor: String,
    #[serde(default = "default_quality")]
    pub quality: f64,
    #[serde(default = "default_material")]
    pub material: String,
    #[serde(default)]
    pub covers: Vec<LimbKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalAttackSpec {
    pub attack: String,
    pub limb: LimbKind,
    #[serde(default)]
    pub quality: f64,
}

/// A combatant described by names of loaded definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantTemplate {
    pub name: String,
    #[serde(default)]
    pub side: u32,
    pub location: u32,
    #[serde(default)]
    pub body: BodyPlan,
    #[serde(default)]
    pub settings: Option<String>,
    /// Overrides the settings' mode
    #[serde(default)]
    pub mode: Option<CombatStrategyMode>,
    #[serde(default)]
    pub traits: BTreeMap<String, f64>,
    #[serde(default = "default_stamina")]
    pub stamina: f64,
    #[serde(default)]
    pub weapons: Vec<GearSpec>,
    #[serde(default)]
    pub ranged: Vec<GearSpec>,
    #[serde(default)]
    pub shields: Vec<GearSpec>,
    #[serde(default)]
    pub ammunition: Vec<AmmoSpec>,
    #[serde(default)]
    pub armor: Vec<ArmorSpec>,
    #[serde(default)]
    pub natural_armor: Option<ArmorSpec>,
    #[serde(default)]
    pub natural_attacks: Vec<NaturalAttackSpec>,
    #[serde(default)]
    pub powers: Vec<String>,
    #[serde(default)]
    pub auxiliary: Vec<String>,
    /// Weapon name to return to after being disarmed
    #[serde(default)]
    pub favourite: Option<String>,
    #[serde(default)]
    pub can_fly: bool,
}

fn material(name: &str, owner: &str) -> Result<Material> {
    Material::named(name).ok_or_else(|| CombatError::InvalidDefinition {
        kind: "combatant",
        name: owner.to_string(),
        reason: format!("unknown material '{}'", name),
    })
}

fn covered_limbs(body: &Body, kinds: &[LimbKind]) -> Vec<LimbId> {
    body.limbs
        .iter()
        .filter(|l| kinds.is_empty() || kinds.contains(&l.kind))
        .map(|l| l.id)
        .collect()
}

impl CombatantTemplate {
    /// Instantiate against loaded definitions
    ///
    /// Item ids are derived from the combatant id so repeated builds agree.
    pub fn build(&self, id: CombatantId, defs: &Definitions) -> Result<Combatant> {
        let mut next_item = id.0 << 16;
        let mut item_id = || {
            next_item += 1;
            ItemId(next_item)
        };

        let mut body = self.body.body();
        for piece in &self.armor {
            let armor = defs.armor.require_by_name(&piece.armor)?.clone();
            let worn = WornArmor::new(
                item_id(),
                armor,
                piece.quality,
                material(&piece.material, &self.name)?,
            )
            .covering(covered_limbs(&body, &piece.covers));
            body.worn.push(worn);
        }
        if let Some(natural) = &self.natural_armor {
            body.natural_armor = Some(NaturalArmor {
                armor: defs.armor.require_by_name(&natural.armor)?.clone(),
                quality: natural.quality,
                material: material(&natural.material, &self.name)?,
            });
        }

        let hands = body.working_hands();
        let mut equipment = Equipment::new();
        let mut to_wield = Vec::new();
        for spec in &self.weapons {
            let weapon = defs.weapons.require_by_name(&spec.name)?.clone();
            let gear = GearItem::melee(item_id(), weapon, spec.quality);
            if self
                .favourite
                .as_deref()
                .is_some_and(|f| f.eq_ignore_ascii_case(&spec.name))
            {
                equipment.favourite = Some(gear.item);
            }
            if spec.wielded {
                to_wield.push(gear.item);
            }
            equipment.carry(gear);
        }
        for spec in &self.ranged {
            let weapon = defs.ranged.require_by_name(&spec.name)?.clone();
            let gear = GearItem::ranged(item_id(), weapon, spec.quality);
            if spec.wielded {
                to_wield.push(gear.item);
            }
            equipment.carry(gear);
        }
        for spec in &self.shields {
            let shield = defs.shields.require_by_name(&spec.name)?.clone();
            let gear = GearItem::shield(item_id(), shield, spec.quality);
            if spec.wielded {
                to_wield.push(gear.item);
            }
            equipment.carry(gear);
        }
        for item in to_wield {
            equipment.wield(item, hands);
        }
        for spec in &self.ammunition {
            equipment.ammunition.push(AmmoStack {
                ammunition: defs.ammunition.require_by_name(&spec.name)?.clone(),
                quality: spec.quality,
                count: spec.count,
            });
        }

        let mut combatant = Combatant::new(id, self.name.clone(), LocationId(self.location))
            .with_side(self.side)
            .with_body(body)
            .with_equipment(equipment);
        if let Some(name) = &self.settings {
            combatant = combatant.with_settings(defs.settings.require_by_name(name)?.clone());
        }
        if let Some(mode) = self.mode {
            combatant.mode = mode;
            if let Some(settings) = combatant.settings.as_mut() {
                settings.mode = mode;
            }
        }
        for (name, value) in &self.traits {
            combatant = combatant.with_trait(name, *value);
        }
        combatant.stamina = Stamina::new(self.stamina);
        combatant.can_fly = self.can_fly;

        for spec in &self.natural_attacks {
            let attack = defs.attacks.require_by_name(&spec.attack)?.clone();
            let mut natural = NaturalAttack::new(attack, spec.limb);
            natural.quality = spec.quality;
            combatant.natural_attacks.push(natural);
        }
        for name in &self.powers {
            let attack = defs.attacks.require_by_name(name)?.clone();
            if !matches!(attack.category, AttackCategory::Magic | AttackCategory::Psychic) {
                return Err(CombatError::InvalidDefinition {
                    kind: "combatant",
                    name: self.name.clone(),
                    reason: format!("power '{}' is not a magic or psychic attack", name),
                });
            }
            combatant.powers.push(attack);
        }
        for name in &self.auxiliary {
            let attack = defs.attacks.require_by_name(name)?.clone();
            combatant
                .auxiliary
                .push(attack.with_category(AttackCategory::Auxiliary));
        }

        Ok(combatant)
    }
}
