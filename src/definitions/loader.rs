//! Load combat definitions from TOML documents
//!
//! A document holds arrays of tables, one array per kind:
//! `[[armor]]`, `[[attack]]`, `[[weapon]]`, `[[ranged_weapon]]`,
//! `[[ammunition]]`, `[[shield]]`, `[[cover]]`, `[[settings]]`,
//! `[[location]]` and `[[combatant]]`. A bad entry is rejected on its own;
//! everything else in the document still loads.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::attacks::WeaponAttack;
use crate::check::OpposedOutcomeDegree;
use crate::combat::armor::{ArmorFormulas, ArmorType, ChannelFormulas, DamageTransformation};
use crate::combat::damage::DamageType;
use crate::combatant::settings::CombatSettings;
use crate::core::error::{CombatError, Result};
use crate::core::types::{CombatantId, DefinitionId, LocationId, RoomLayer};
use crate::definitions::cover::RangedCover;
use crate::definitions::repository::{Definition, Registry, Repository};
use crate::definitions::template::CombatantTemplate;
use crate::definitions::weapons::{AmmunitionType, RangedWeaponType, ShieldType, WeaponType};
use crate::formula::Formula;
use crate::world::{Location, LocationGraph};

/// Everything a definitions document provides
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    pub armor: Registry<ArmorType>,
    pub attacks: Registry<WeaponAttack>,
    pub weapons: Registry<WeaponType>,
    pub ranged: Registry<RangedWeaponType>,
    pub ammunition: Registry<AmmunitionType>,
    pub shields: Registry<ShieldType>,
    pub covers: Registry<RangedCover>,
    pub settings: Registry<CombatSettings>,
    pub locations: Vec<Location>,
    pub combatants: Vec<CombatantTemplate>,
}

impl Definitions {
    pub fn world(&self) -> LocationGraph {
        LocationGraph::from_locations(self.locations.iter().cloned())
    }
}

/// Loaded definitions plus every entry that was rejected
#[derive(Debug, Default)]
pub struct LoadReport {
    pub definitions: Definitions,
    pub rejected: Vec<CombatError>,
}

/// Channel formulas written either as one text for all channels or per channel
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChannelSpec {
    Uniform(String),
    Split {
        damage: String,
        pain: String,
        stun: String,
    },
}

impl ChannelSpec {
    fn build(&self) -> Result<ChannelFormulas> {
        match self {
            ChannelSpec::Uniform(text) => ChannelFormulas::uniform(text),
            ChannelSpec::Split { damage, pain, stun } => Ok(ChannelFormulas {
                damage: Formula::parse(damage)?,
                pain: Formula::parse(pain)?,
                stun: Formula::parse(stun)?,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StageSpec {
    dissipate: ChannelSpec,
    absorb: ChannelSpec,
}

impl StageSpec {
    fn build(&self) -> Result<ArmorFormulas> {
        Ok(ArmorFormulas {
            dissipate: self.dissipate.build()?,
            absorb: self.absorb.build()?,
        })
    }
}

fn default_penetration_defense() -> f64 {
    50.0
}

#[derive(Debug, Deserialize)]
struct ArmorTypeSpec {
    id: DefinitionId,
    name: String,
    #[serde(default)]
    minimum_penetration_degree: Option<OpposedOutcomeDegree>,
    #[serde(default = "default_penetration_defense")]
    penetration_defense: f64,
    /// Keyed by damage type name
    #[serde(default)]
    formulas: BTreeMap<String, StageSpec>,
    #[serde(default)]
    fallback: Option<StageSpec>,
    #[serde(default)]
    transformations: Vec<DamageTransformation>,
}

impl ArmorTypeSpec {
    fn build(self) -> Result<ArmorType> {
        let mut armor = ArmorType::new(self.id, self.name);
        armor.minimum_penetration_degree = self.minimum_penetration_degree;
        armor.penetration_defense = self.penetration_defense;
        for (damage_type, stages) in &self.formulas {
            let parsed = DamageType::parse(damage_type)
                .ok_or_else(|| CombatError::UnknownTag(damage_type.clone()))?;
            armor.formulas.insert(parsed, stages.build()?);
        }
        armor.fallback = self.fallback.as_ref().map(StageSpec::build).transpose()?;
        armor.transformations = self.transformations;
        armor.validate()?;
        Ok(armor)
    }
}

#[derive(Debug, Deserialize)]
struct LocationSpec {
    id: u32,
    name: String,
    #[serde(default)]
    exits: Vec<u32>,
    /// Cover names
    #[serde(default)]
    cover: Vec<String>,
    #[serde(default)]
    layers: Vec<RoomLayer>,
}

fn entry_name(entry: &toml::Value) -> String {
    entry
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("<unnamed>")
        .to_string()
}

fn reject(rejected: &mut Vec<CombatError>, kind: &str, name: &str, err: CombatError) {
    warn!(kind, name, error = %err, "definition rejected");
    rejected.push(err);
}

/// Load every entry of one section into a registry
fn load_section<T, F>(
    doc: &toml::Value,
    section: &str,
    registry: &mut Registry<T>,
    rejected: &mut Vec<CombatError>,
    build: F,
) where
    T: Definition,
    F: Fn(toml::Value) -> Result<T>,
{
    let Some(entries) = doc.get(section).and_then(|v| v.as_array()) else {
        return;
    };
    for entry in entries {
        let mut entry = entry.clone();
        let name = entry_name(&entry);
        if let Some(table) = entry.as_table_mut() {
            if !table.contains_key("id") {
                table.insert(
                    "id".into(),
                    toml::Value::Integer(i64::from(registry.next_id().0)),
                );
            }
        }
        match build(entry).and_then(|item| registry.insert(item)) {
            Ok(()) => debug!(kind = T::KIND, name = %name, "definition loaded"),
            Err(err) => reject(rejected, T::KIND, &name, err),
        }
    }
}

fn entries<'a>(doc: &'a toml::Value, section: &str) -> impl Iterator<Item = &'a toml::Value> {
    doc.get(section)
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
}

/// Parse a definitions document
///
/// Only a syntax error in the document as a whole is an `Err`.
pub fn parse_definitions(text: &str) -> Result<LoadReport> {
    let doc: toml::Value = toml::from_str(text)?;
    let mut defs = Definitions::default();
    let mut rejected = Vec::new();

    load_section(&doc, "armor", &mut defs.armor, &mut rejected, |v| {
        let spec: ArmorTypeSpec = v.try_into()?;
        spec.build()
    });
    load_section(&doc, "attack", &mut defs.attacks, &mut rejected, |v| {
        let attack: WeaponAttack = v.try_into()?;
        attack.validate()?;
        Ok(attack)
    });
    load_section(&doc, "weapon", &mut defs.weapons, &mut rejected, |v| {
        let weapon: WeaponType = v.try_into()?;
        weapon.validate()?;
        Ok(weapon)
    });
    load_section(&doc, "ranged_weapon", &mut defs.ranged, &mut rejected, |v| {
        let weapon: RangedWeaponType = v.try_into()?;
        weapon.validate()?;
        Ok(weapon)
    });
    load_section(&doc, "ammunition", &mut defs.ammunition, &mut rejected, |v| {
        let ammo: AmmunitionType = v.try_into()?;
        ammo.validate()?;
        Ok(ammo)
    });
    load_section(&doc, "shield", &mut defs.shields, &mut rejected, |v| {
        let shield: ShieldType = v.try_into()?;
        shield.validate()?;
        Ok(shield)
    });
    load_section(&doc, "cover", &mut defs.covers, &mut rejected, |v| {
        let cover: RangedCover = v.try_into()?;
        cover.validate()?;
        Ok(cover)
    });
    load_section(&doc, "settings", &mut defs.settings, &mut rejected, |v| {
        let settings: CombatSettings = v.try_into()?;
        settings.validate()?;
        Ok(settings)
    });

    for entry in entries(&doc, "location") {
        let name = entry_name(entry);
        let built = entry
            .clone()
            .try_into::<LocationSpec>()
            .map_err(CombatError::from)
            .and_then(|spec| {
                let cover = spec
                    .cover
                    .iter()
                    .map(|c| defs.covers.require_by_name(c).cloned())
                    .collect::<Result<Vec<_>>>()?;
                let mut location = Location::new(spec.id, spec.name);
                location.exits = spec.exits.into_iter().map(LocationId).collect();
                location.cover = cover;
                if !spec.layers.is_empty() {
                    location.layers = spec.layers;
                }
                Ok(location)
            });
        match built {
            Ok(location) => defs.locations.push(location),
            Err(err) => reject(&mut rejected, "location", &name, err),
        }
    }

    for (index, entry) in entries(&doc, "combatant").enumerate() {
        let name = entry_name(entry);
        let checked = entry
            .clone()
            .try_into::<CombatantTemplate>()
            .map_err(CombatError::from)
            .and_then(|template| {
                template.build(CombatantId(index as u64 + 1), &defs)?;
                Ok(template)
            });
        match checked {
            Ok(template) => defs.combatants.push(template),
            Err(err) => reject(&mut rejected, "combatant", &name, err),
        }
    }

    info!(
        armor = defs.armor.len(),
        weapons = defs.weapons.len(),
        combatants = defs.combatants.len(),
        rejected = rejected.len(),
        "definitions parsed"
    );
    Ok(LoadReport {
        definitions: defs,
        rejected,
    })
}

/// Load a definitions file
pub fn load_definitions(path: &Path) -> Result<LoadReport> {
    let contents = fs::read_to_string(path)?;
    parse_definitions(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::wounds::WoundSeverity;

    const DOC: &str = r#"
        [[armor]]
        name = "mail"
        minimum_penetration_degree = "Major"
        transformations = [{ from = "Piercing", to = "Crushing", max_severity = "Small" }]

        [armor.formulas.slashing]
        dissipate = "damage - quality"
        absorb = { damage = "damage * 0.5", pain = "damage * 0.5", stun = "damage" }

        [[armor]]
        name = "broken"
        [armor.formulas.tickling]
        dissipate = "damage"
        absorb = "damage"

        [[attack]]
        name = "bite"
        damage_type = "Bite"
        damage = "trait / 10 + degree"

        [[weapon]]
        name = "longsword"
        skill = "swords"
        classifications = ["sword", "blade"]

        [[weapon.attacks]]
        id = 10
        name = "slash"
        damage_type = "Slashing"
        damage = "weaponquality + degree * 2"

        [[weapon]]
        name = "bad sword"
        skill = "swords"

        [[weapon.attacks]]
        id = 11
        name = "bad slash"
        damage_type = "Slashing"
        damage = "toughness * 2"

        [[cover]]
        name = "barrels"
        extent = "Partial"
        cover_type = "Hard"
        position = "Kneeling"

        [[settings]]
        name = "brawler"
        mode = "StandardMelee"

        [[location]]
        id = 1
        name = "yard"
        exits = [2]
        cover = ["barrels"]

        [[location]]
        id = 2
        name = "gate"

        [[combatant]]
        name = "guard"
        location = 1
        settings = "brawler"
        traits = { swords = 60.0 }
        weapons = [{ name = "longsword" }]
        armor = [{ armor = "mail", material = "steel", covers = ["Torso"] }]

        [[combatant]]
        name = "ghost"
        location = 1
        weapons = [{ name = "spectral blade" }]
    "#;

    #[test]
    fn test_loads_good_entries_and_rejects_bad() {
        let report = parse_definitions(DOC).expect("document parses");
        let defs = &report.definitions;

        let mail = defs.armor.get_by_name("mail").expect("mail loaded");
        assert_eq!(mail.minimum_penetration_degree, Some(OpposedOutcomeDegree::Major));
        assert!(mail.formulas_for(DamageType::Slashing).is_some());
        assert_eq!(
            mail.transform(DamageType::Piercing, WoundSeverity::Minor),
            Some(DamageType::Crushing)
        );

        assert!(defs.armor.get_by_name("broken").is_none());
        assert!(defs.weapons.get_by_name("longsword").is_some());
        assert!(defs.weapons.get_by_name("bad sword").is_none());
        assert!(defs.attacks.get_by_name("bite").is_some());
        assert_eq!(defs.locations.len(), 2);
        assert_eq!(defs.locations[0].cover[0].name, "barrels");
        assert_eq!(defs.combatants.len(), 1);
        assert_eq!(report.rejected.len(), 3);
        assert!(report.rejected.iter().all(|e| e.is_configuration_error()));
    }

    #[test]
    fn test_template_builds_combatant() {
        let report = parse_definitions(DOC).unwrap();
        let defs = &report.definitions;
        let guard = defs.combatants[0].build(CombatantId(7), defs).unwrap();
        assert_eq!(guard.trait_value("swords"), 60.0);
        assert_eq!(guard.equipment.wielded_weapons().count(), 1);
        assert_eq!(guard.body.worn.len(), 1);
        assert_eq!(guard.body.worn[0].covers, vec![crate::core::types::LimbId(3)]);
        assert!(guard.settings.is_some());
    }

    #[test]
    fn test_syntax_error_fails_whole_document() {
        assert!(parse_definitions("[[armor]\nname = ").is_err());
    }

    #[test]
    fn test_ids_assigned_in_order() {
        let report = parse_definitions(DOC).unwrap();
        let mail = report.definitions.armor.get_by_name("mail").unwrap();
        assert_eq!(mail.id, DefinitionId(1));
        let world = report.definitions.world();
        assert_eq!(world.len(), 2);
    }
}
