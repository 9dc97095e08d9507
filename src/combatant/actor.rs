//! The combatant: everything the engine reads and writes about one actor

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attacks::{NaturalAttack, WeaponAttack};
use crate::combat::layers::{absorb_through, Absorption, AbsorptionContext, DamageLayer};
use crate::combat::{Damage, Wound};
use crate::combatant::body::Body;
use crate::combatant::effects::Effects;
use crate::combatant::equipment::Equipment;
use crate::combatant::settings::CombatSettings;
use crate::combatant::stamina::Stamina;
use crate::combatant::state::{CharacterState, PositionState};
use crate::core::types::{CombatantId, LocationId, RoomLayer, SessionId};
use crate::strategy::mode::CombatStrategyMode;
use crate::tracking::TrackerId;

/// Trait names the engine rolls against
pub mod trait_names {
    pub const DODGE: &str = "dodge";
    pub const STRENGTH: &str = "strength";
    pub const WRESTLING: &str = "wrestling";
    pub const BRAWLING: &str = "brawling";
    pub const ATHLETICS: &str = "athletics";
    pub const WILLPOWER: &str = "willpower";
    pub const FORTITUDE: &str = "fortitude";
}

/// Control over another combatant's limbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrappleHold {
    pub target: CombatantId,
}

/// What happened when a hit reached a combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    pub absorption: Absorption,
    pub wound: Option<Wound>,
    pub killed: bool,
    pub knocked_out: bool,
}

/// An actor able to take part in combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    /// Allegiance; combatants on the same side never target each other
    pub side: u32,
    pub location: LocationId,
    pub layer: RoomLayer,
    pub target: Option<CombatantId>,
    /// In striking distance of the target
    pub melee_range: bool,
    pub mode: CombatStrategyMode,
    pub settings: Option<CombatSettings>,
    pub stamina: Stamina,
    pub position: PositionState,
    pub state: CharacterState,
    pub body: Body,
    pub equipment: Equipment,
    pub effects: Effects,
    pub traits: BTreeMap<String, f64>,
    pub natural_attacks: Vec<NaturalAttack>,
    /// Magic and psychic attacks
    pub powers: Vec<WeaponAttack>,
    pub auxiliary: Vec<WeaponAttack>,
    pub can_fly: bool,
    #[serde(skip)]
    pub aim: Option<TrackerId>,
    #[serde(skip)]
    pub cover: Option<TrackerId>,
    #[serde(skip)]
    pub grapple: Option<GrappleHold>,
    /// Part-way through moving between locations
    #[serde(skip)]
    pub in_transit: bool,
    #[serde(skip)]
    pub session: Option<SessionId>,
}

impl Combatant {
    pub fn new(id: CombatantId, name: impl Into<String>, location: LocationId) -> Self {
        Self {
            id,
            name: name.into(),
            side: 0,
            location,
            layer: RoomLayer::GroundLevel,
            target: None,
            melee_range: false,
            mode: CombatStrategyMode::default(),
            settings: None,
            stamina: Stamina::default(),
            position: PositionState::Standing,
            state: CharacterState::Awake,
            body: Body::humanoid(),
            equipment: Equipment::new(),
            effects: Effects::new(),
            traits: BTreeMap::new(),
            natural_attacks: Vec::new(),
            powers: Vec::new(),
            auxiliary: Vec::new(),
            can_fly: false,
            aim: None,
            cover: None,
            grapple: None,
            in_transit: false,
            session: None,
        }
    }

    pub fn with_side(mut self, side: u32) -> Self {
        self.side = side;
        self
    }

    pub fn with_settings(mut self, settings: CombatSettings) -> Self {
        self.mode = settings.mode;
        self.settings = Some(settings);
        self
    }

    pub fn with_trait(mut self, name: &str, value: f64) -> Self {
        self.traits.insert(name.to_lowercase(), value);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = equipment;
        self
    }

    /// Trait or skill value; untrained traits are zero
    pub fn trait_value(&self, name: &str) -> f64 {
        self.traits
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn power(&self) -> f64 {
        self.trait_value(trait_names::STRENGTH)
    }

    pub fn can_act(&self) -> bool {
        self.state.can_act()
    }

    pub fn is_helpless(&self) -> bool {
        self.state.is_helpless()
    }

    pub fn is_dead(&self) -> bool {
        self.state.is_dead()
    }

    /// Can no longer meaningfully fight
    pub fn is_incapacitated(&self) -> bool {
        matches!(
            self.state,
            CharacterState::Unconscious | CharacterState::Paralysed | CharacterState::Dead
        )
    }

    pub fn is_opponent_of(&self, other: &Combatant) -> bool {
        self.id != other.id && self.side != other.side
    }

    /// The mode the combatant's settings ask for
    pub fn default_mode(&self) -> CombatStrategyMode {
        self.settings
            .as_ref()
            .map(|s| s.mode)
            .unwrap_or_default()
    }

    /// Clear everything that only makes sense during a fight
    ///
    /// Trackers are released by the arena; this only drops the handles.
    pub fn reset_combat_state(&mut self) {
        self.target = None;
        self.melee_range = false;
        self.aim = None;
        self.cover = None;
        self.grapple = None;
        self.in_transit = false;
        self.mode = self.default_mode();
        self.effects.clear_combat_transient();
        self.session = None;
    }

    /// Reconcile consciousness with the body's condition
    pub fn update_state(&mut self) {
        if self.is_dead() {
            return;
        }
        if self.body.is_dead() {
            self.state = CharacterState::Dead;
        } else if self.body.is_unconscious() && self.state != CharacterState::Paralysed {
            self.state = CharacterState::Unconscious;
        }
    }

    /// Pass a hit through shields, worn layers over the limb and natural armour
    pub fn receive_damage(
        &mut self,
        damage: Damage,
        ctx: &mut AbsorptionContext<'_>,
    ) -> DamageReport {
        let limb = damage
            .bodypart
            .or_else(|| self.body.random_limb(&mut *ctx.rng));
        let damage = match limb {
            Some(limb) => damage.on_bodypart(limb),
            None => damage,
        };

        let absorption = {
            let mut layers: Vec<&mut dyn DamageLayer> = Vec::new();
            for shield in self.effects.shields_mut() {
                layers.push(shield);
            }
            if let Some(limb) = limb {
                for worn in self.body.worn.iter_mut().filter(|w| w.covers(limb)) {
                    layers.push(worn);
                }
            }
            if let Some(natural) = self.body.natural_armor.as_mut() {
                layers.push(natural);
            }
            absorb_through(&mut layers, damage, ctx)
        };

        let was_dead = self.is_dead();
        let was_out = self.is_incapacitated();
        let wound = match (&absorption.residual, limb) {
            (Some(residual), Some(limb)) => {
                let wound = Wound::new(limb, residual.clone(), &ctx.severity_thresholds);
                self.body.apply_wound(wound.clone());
                Some(wound)
            }
            _ => None,
        };
        self.update_state();

        let report = DamageReport {
            absorption,
            wound,
            killed: !was_dead && self.is_dead(),
            knocked_out: !was_out && self.is_incapacitated() && !self.is_dead(),
        };
        debug!(
            combatant = %self.id,
            wounded = report.wound.is_some(),
            killed = report.killed,
            "damage received"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{FixedCheck, Outcome};
    use crate::combat::{
        ArmorFormulas, ArmorType, ChannelFormulas, DamageType, Material, ShieldingEffect, WornArmor,
    };
    use crate::combatant::effects::Effect;
    use crate::core::types::{DefinitionId, ItemId, LimbId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const THRESHOLDS: [f64; 8] = [0.5, 2.0, 4.0, 7.0, 12.0, 18.0, 27.0, 40.0];

    fn plate() -> ArmorType {
        ArmorType::new(DefinitionId(1), "plate").with_fallback(ArmorFormulas {
            dissipate: ChannelFormulas::uniform("damage - 100").unwrap(),
            absorb: ChannelFormulas::uniform("damage").unwrap(),
        })
    }

    #[test]
    fn test_armour_over_limb_stops_hit() {
        let mut soldier = Combatant::new(CombatantId(1), "soldier", LocationId(1));
        soldier.body.worn.push(
            WornArmor::new(ItemId(1), plate(), 10.0, Material::steel()).covering([LimbId(3)]),
        );
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);

        let hit = Damage::new(DamageType::Slashing, 30.0, 5.0, 0.0).on_bodypart(LimbId(3));
        let report = soldier.receive_damage(hit, &mut ctx);
        assert!(report.wound.is_none());
        assert_eq!(report.absorption.hits.len(), 1);

        let bare = Damage::new(DamageType::Slashing, 30.0, 5.0, 0.0).on_bodypart(LimbId(4));
        let report = soldier.receive_damage(bare, &mut ctx);
        assert!(report.absorption.hits.is_empty());
        assert_eq!(report.wound.unwrap().limb, LimbId(4));
    }

    #[test]
    fn test_shield_effect_processed_first() {
        let mut mage = Combatant::new(CombatantId(2), "mage", LocationId(1));
        mage.effects.add(Effect::Shielding(
            ShieldingEffect::new("ward", 5.0)
                .with_dissipate(DamageType::Burning, ChannelFormulas::uniform("0").unwrap()),
        ));
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let report = mage.receive_damage(
            Damage::new(DamageType::Burning, 20.0, 20.0, 20.0).on_bodypart(LimbId(3)),
            &mut ctx,
        );
        assert_eq!(report.absorption.hits[0].layer, "ward");
        assert!(report.wound.is_none());
    }

    #[test]
    fn test_lethal_hit_kills_once() {
        let mut victim = Combatant::new(CombatantId(3), "victim", LocationId(1));
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let report = victim.receive_damage(
            Damage::new(DamageType::Crushing, 200.0, 0.0, 0.0).on_bodypart(LimbId(1)),
            &mut ctx,
        );
        assert!(report.killed);
        assert!(victim.is_dead());
        let again = victim.receive_damage(
            Damage::new(DamageType::Crushing, 5.0, 0.0, 0.0).on_bodypart(LimbId(1)),
            &mut ctx,
        );
        assert!(!again.killed);
    }

    #[test]
    fn test_reset_restores_settings_mode() {
        let settings = CombatSettings {
            mode: CombatStrategyMode::StandardRange,
            ..CombatSettings::default()
        };
        let mut archer =
            Combatant::new(CombatantId(4), "archer", LocationId(1)).with_settings(settings);
        archer.mode = CombatStrategyMode::Flee;
        archer.target = Some(CombatantId(9));
        archer.effects.add(Effect::Truce);
        archer.reset_combat_state();
        assert_eq!(archer.mode, CombatStrategyMode::StandardRange);
        assert!(archer.target.is_none());
        assert!(archer.effects.is_empty());
    }

    #[test]
    fn test_trait_lookup_case_insensitive() {
        let fighter = Combatant::new(CombatantId(5), "f", LocationId(1)).with_trait("Swords", 60.0);
        assert_eq!(fighter.trait_value("swords"), 60.0);
        assert_eq!(fighter.trait_value("SWORDS"), 60.0);
        assert_eq!(fighter.trait_value("axes"), 0.0);
    }
}
