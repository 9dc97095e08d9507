//! Combat settings loaded from TOML
//!
//! Settings decide how an automated combatant weighs attack categories,
//! which intentions it requires, forbids or prefers, and what it manages for
//! itself (weapons, cover, standing up).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attacks::{AttackCategory, DefenseType, IntentionFilter};
use crate::core::error::{CombatError, Result};
use crate::core::types::DefinitionId;
use crate::definitions::repository::Definition;
use crate::strategy::mode::CombatStrategyMode;

/// How a combatant answers a grapple attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GrappleResponse {
    /// Wrestle back
    #[default]
    Counter,
    /// Dodge away
    Avoid,
    /// Let it happen
    Ignore,
}

/// Probability weight for each attack category (0.0 to 1.0, summing to at most 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub weapon: f64,
    pub natural: f64,
    pub magic: f64,
    pub psychic: f64,
    pub auxiliary: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            weapon: 0.8,
            natural: 0.2,
            magic: 0.0,
            psychic: 0.0,
            auxiliary: 0.0,
        }
    }
}

impl CategoryWeights {
    pub fn get(&self, category: AttackCategory) -> f64 {
        match category {
            AttackCategory::Weapon => self.weapon,
            AttackCategory::Natural => self.natural,
            AttackCategory::Magic => self.magic,
            AttackCategory::Psychic => self.psychic,
            AttackCategory::Auxiliary => self.auxiliary,
        }
    }

    pub fn total(&self) -> f64 {
        AttackCategory::BANDS.iter().map(|c| self.get(*c)).sum()
    }
}

/// Things the combatant does for itself without being told
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomaticManagement {
    pub wield_weapons: bool,
    pub wield_shields: bool,
    pub ready_ranged: bool,
    pub retrieve_lost_items: bool,
    pub stand: bool,
    pub seek_cover: bool,
    pub change_layer: bool,
}

impl Default for AutomaticManagement {
    fn default() -> Self {
        Self {
            wield_weapons: true,
            wield_shields: true,
            ready_ranged: true,
            retrieve_lost_items: true,
            stand: true,
            seek_cover: true,
            change_layer: false,
        }
    }
}

fn default_minimum_stamina() -> f64 {
    5.0
}

fn default_attack_order() -> Vec<AttackCategory> {
    AttackCategory::BANDS.to_vec()
}

/// Complete combat settings preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSettings {
    #[serde(default)]
    pub id: DefinitionId,
    pub name: String,
    #[serde(default)]
    pub mode: CombatStrategyMode,
    #[serde(default)]
    pub weights: CategoryWeights,
    #[serde(default)]
    pub intentions: IntentionFilter,
    /// Order in which category bands are laid out for the weighted roll
    #[serde(default = "default_attack_order")]
    pub attack_order: Vec<AttackCategory>,
    #[serde(default)]
    pub preferred_defense: Option<DefenseType>,
    #[serde(default)]
    pub manage: AutomaticManagement,
    /// Below this stamina no attack is started
    #[serde(default = "default_minimum_stamina")]
    pub minimum_stamina_to_attack: f64,
    #[serde(default)]
    pub grapple_response: GrappleResponse,
    /// Classification of the weapon to prefer when wielding
    #[serde(default)]
    pub preferred_weapon: Option<String>,
    /// Refuse to attack without a weapon of the preferred classification
    #[serde(default)]
    pub require_preferred_weapon: bool,
    /// Health fraction below which the combatant switches to fleeing
    #[serde(default)]
    pub flee_below_health: Option<f64>,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            id: DefinitionId(0),
            name: "default".to_string(),
            mode: CombatStrategyMode::StandardMelee,
            weights: CategoryWeights::default(),
            intentions: IntentionFilter::default(),
            attack_order: default_attack_order(),
            preferred_defense: None,
            manage: AutomaticManagement::default(),
            minimum_stamina_to_attack: default_minimum_stamina(),
            grapple_response: GrappleResponse::default(),
            preferred_weapon: None,
            require_preferred_weapon: false,
            flee_below_health: None,
        }
    }
}

impl CombatSettings {
    pub fn validate(&self) -> Result<()> {
        for category in AttackCategory::BANDS {
            let weight = self.weights.get(category);
            if !(0.0..=1.0).contains(&weight) {
                return Err(CombatError::InvalidSettings(format!(
                    "{}: {:?} weight {} outside [0, 1]",
                    self.name, category, weight
                )));
            }
        }
        if self.weights.total() > 1.0 + 1e-9 {
            return Err(CombatError::InvalidSettings(format!(
                "{}: category weights sum to {}",
                self.name,
                self.weights.total()
            )));
        }
        if self.minimum_stamina_to_attack < 0.0 {
            return Err(CombatError::InvalidSettings(format!(
                "{}: minimum stamina must not be negative",
                self.name
            )));
        }
        if let Some(threshold) = self.flee_below_health {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(CombatError::InvalidSettings(format!(
                    "{}: flee threshold {} outside [0, 1]",
                    self.name, threshold
                )));
            }
        }
        self.intentions.validate()
    }

    /// Band layout: each category in preference order, then any left out
    pub fn band_order(&self) -> Vec<AttackCategory> {
        let mut order: Vec<AttackCategory> = Vec::with_capacity(AttackCategory::BANDS.len());
        for category in self.attack_order.iter().chain(AttackCategory::BANDS.iter()) {
            if !order.contains(category) {
                order.push(*category);
            }
        }
        order
    }
}

impl Definition for CombatSettings {
    const KIND: &'static str = "combat settings";

    fn id(&self) -> DefinitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Load a single settings preset from a TOML file
pub fn load_settings(path: &Path) -> Result<CombatSettings> {
    let contents = fs::read_to_string(path)?;
    let settings: CombatSettings = toml::from_str(&contents)?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attacks::{AttackIntention, Intentions};

    #[test]
    fn test_default_settings_valid() {
        let settings = CombatSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.weights.total(), 1.0);
    }

    #[test]
    fn test_weights_over_one_rejected() {
        let mut settings = CombatSettings::default();
        settings.weights.magic = 0.5;
        let err = settings.validate().unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_band_order_fills_missing_categories() {
        let settings = CombatSettings {
            attack_order: vec![AttackCategory::Natural],
            ..CombatSettings::default()
        };
        let order = settings.band_order();
        assert_eq!(order[0], AttackCategory::Natural);
        assert_eq!(order[1], AttackCategory::Weapon);
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn test_parse_from_toml() {
        let settings: CombatSettings = toml::from_str(
            r#"
            name = "duellist"
            mode = "Ward"
            preferred_defense = "Parry"

            [weights]
            weapon = 1.0
            natural = 0.0

            [intentions]
            forbidden = ["Reckless"]
            preferred = ["Precise"]
            "#,
        )
        .expect("parses");
        assert_eq!(settings.mode, CombatStrategyMode::Ward);
        assert_eq!(settings.preferred_defense, Some(DefenseType::Parry));
        assert!(settings
            .intentions
            .forbidden
            .contains(AttackIntention::Reckless));
        assert_eq!(settings.intentions.required, Intentions::empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_settings_missing_file() {
        let err = load_settings(Path::new("/nonexistent/settings.toml")).unwrap_err();
        assert!(matches!(err, CombatError::Io(_)));
    }
}
