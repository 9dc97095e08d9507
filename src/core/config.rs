//! Engine configuration with documented constants
//!
//! All tunable timings and cost figures live here. Values load from TOML
//! (`[engine]` documents) or fall back to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::check::{Difficulty, Outcome};
use crate::core::error::{CombatError, Result};

/// Multipliers applied to a move's base delay after the recovery check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecoveryTable {
    pub major_pass: f64,
    pub pass: f64,
    pub minor_pass: f64,
    pub minor_fail: f64,
    pub fail: f64,
    pub major_fail: f64,
}

impl Default for RecoveryTable {
    fn default() -> Self {
        Self {
            major_pass: 0.6,
            pass: 0.8,
            minor_pass: 0.9,
            minor_fail: 1.1,
            fail: 1.25,
            major_fail: 1.5,
        }
    }
}

impl RecoveryTable {
    /// Recovery formula: the delay multiplier for a recovery check outcome
    pub fn multiplier(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::MajorPass => self.major_pass,
            Outcome::Pass => self.pass,
            Outcome::MinorPass => self.minor_pass,
            Outcome::MinorFail => self.minor_fail,
            Outcome::Fail => self.fail,
            Outcome::MajorFail => self.major_fail,
        }
    }
}

/// Configuration for the combat engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    // === SCHEDULING ===
    /// Scales every reschedule delay. Below 1.0 speeds combat up for the whole world.
    pub global_speed_multiplier: f64,

    /// Seconds before a newly joined combatant's first action at Normal difficulty
    pub initial_delay_base: f64,

    /// Fractional change of the initial delay per difficulty step away from Normal
    ///
    /// At 0.25 a combatant joining at Hard waits 25% longer; at Easy, 25% less.
    pub initial_delay_per_step: f64,

    /// Seconds to wait when a combatant has nothing to do this cycle
    pub idle_delay: f64,

    /// Delay multipliers by recovery check outcome
    pub recovery: RecoveryTable,

    // === STAMINA ===
    /// Stamina regained on each idle cycle
    pub idle_stamina_regain: f64,
    pub block_stamina_cost: f64,
    pub parry_stamina_cost: f64,
    pub dodge_stamina_cost: f64,
    pub ranged_dodge_stamina_cost: f64,
    pub grapple_counter_stamina_cost: f64,
    pub movement_stamina_cost: f64,

    /// Below this stamina a defender cannot attempt any active defense
    pub helpless_stamina_floor: f64,

    // === TACTICS ===
    /// Chance to escalate a grapple with one controlled limb; halves per extra limb
    pub grapple_escalation_base: f64,

    /// Difficulty of the check to flee combat
    pub flee_difficulty: Difficulty,

    /// Multiplies every mode's cover preference when scoring cover fitness
    pub cover_seeking_bias: f64,

    /// Aim fraction gained per aim move at Normal difficulty
    pub aim_gain_per_move: f64,

    /// Aim fraction at which ranged modes stop aiming and fire
    pub fire_aim_threshold: f64,

    /// Locations beyond this many steps are out of ranged reach
    pub max_ranged_distance: u32,

    // === DAMAGE ===
    /// Damage thresholds for Superficial..Horrifying wound severities
    pub severity_thresholds: [f64; 8],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_speed_multiplier: 1.0,
            initial_delay_base: 3.0,
            initial_delay_per_step: 0.25,
            idle_delay: 1.0,
            recovery: RecoveryTable::default(),

            idle_stamina_regain: 2.0,
            block_stamina_cost: 3.0,
            parry_stamina_cost: 3.0,
            dodge_stamina_cost: 4.0,
            ranged_dodge_stamina_cost: 5.0,
            grapple_counter_stamina_cost: 4.0,
            movement_stamina_cost: 2.0,
            helpless_stamina_floor: 1.0,

            grapple_escalation_base: 0.5,
            flee_difficulty: Difficulty::Normal,
            cover_seeking_bias: 1.0,
            aim_gain_per_move: 0.25,
            fire_aim_threshold: 0.75,
            max_ranged_distance: 3,

            severity_thresholds: [0.5, 2.0, 4.0, 7.0, 12.0, 18.0, 27.0, 40.0],
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an engine configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.global_speed_multiplier <= 0.0 {
            return Err(CombatError::InvalidConfig(format!(
                "global_speed_multiplier ({}) must be positive",
                self.global_speed_multiplier
            )));
        }

        if self.idle_delay <= 0.0 || self.initial_delay_base <= 0.0 {
            return Err(CombatError::InvalidConfig(
                "idle_delay and initial_delay_base must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.grapple_escalation_base) {
            return Err(CombatError::InvalidConfig(format!(
                "grapple_escalation_base ({}) must lie in [0, 1]",
                self.grapple_escalation_base
            )));
        }

        if self.cover_seeking_bias < 0.0 || self.helpless_stamina_floor < 0.0 {
            return Err(CombatError::InvalidConfig(
                "cover_seeking_bias and helpless_stamina_floor must not be negative".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.fire_aim_threshold) {
            return Err(CombatError::InvalidConfig(format!(
                "fire_aim_threshold ({}) must lie in [0, 1]",
                self.fire_aim_threshold
            )));
        }

        if self
            .severity_thresholds
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(CombatError::InvalidConfig(
                "severity_thresholds must be strictly increasing".into(),
            ));
        }

        Ok(())
    }
}

/// Load an engine configuration file
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path)?;
    EngineConfig::from_toml_str(&contents)
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Get the global engine config (initializes with defaults if not set)
pub fn config() -> &'static EngineConfig {
    CONFIG.get_or_init(EngineConfig::default)
}

/// Set the global engine config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: EngineConfig) -> std::result::Result<(), EngineConfig> {
    CONFIG.set(config)
}
