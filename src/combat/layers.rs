//! Layer-by-layer damage absorption
//!
//! Every layer, whether worn armour, natural hide or a magical shield, runs the
//! same sequence on the damage that reaches it:
//!
//! 1. Penetration: an attack that beats the layer by its minimum degree passes
//!    through unmodified and no formula is evaluated.
//! 2. Dissipate: per-channel formulas; if every channel ends at zero or below
//!    the damage stops here.
//! 3. The layer itself suffers what remains after dissipation.
//! 4. Absorb: per-channel formulas produce the residual for the next layer.
//! 5. Transformation: a weak enough residual may change damage type.
//!
//! Layers are processed outermost first, each consuming its predecessor's
//! residual.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::check::{CheckEvaluator, OpposedOutcomeDegree};
use crate::combat::armor::{ArmorFormulas, ArmorType, ChannelFormulas};
use crate::combat::constants::{
    ANGLE, DAMAGE, DENSITY, ELECTRICAL, ORGANIC, ORIGINAL, QUALITY, STRENGTH,
};
use crate::combat::damage::{Damage, DamageType};
use crate::combat::material::Material;
use crate::combat::penetration::{resolve_penetration, PenetrationResult};
use crate::combat::wounds::WoundSeverity;
use crate::core::types::{ItemId, LimbId};
use crate::formula::FormulaParameters;

/// What a layer needs from the outside world while processing
pub struct AbsorptionContext<'a> {
    pub evaluator: &'a dyn CheckEvaluator,
    pub rng: &'a mut dyn RngCore,
    pub severity_thresholds: [f64; 8],
}

impl<'a> AbsorptionContext<'a> {
    pub fn new(
        evaluator: &'a dyn CheckEvaluator,
        rng: &'a mut dyn RngCore,
        severity_thresholds: [f64; 8],
    ) -> Self {
        Self {
            evaluator,
            rng,
            severity_thresholds,
        }
    }
}

/// Which stages ran for one layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTrace {
    pub penetration_bypassed: bool,
    pub dissipate_evaluated: bool,
    pub absorb_evaluated: bool,
    pub transformed_from: Option<DamageType>,
}

/// Outcome of one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerResult {
    /// Damage suffered by the layer itself
    pub layer_damage: Option<Damage>,
    /// Damage passed to the next layer or bodypart
    pub residual: Option<Damage>,
    pub trace: StageTrace,
}

impl LayerResult {
    fn untouched(damage: &Damage, trace: StageTrace) -> Self {
        Self {
            layer_damage: None,
            residual: Some(damage.clone()),
            trace,
        }
    }

    fn stopped(layer_damage: Option<Damage>, trace: StageTrace) -> Self {
        Self {
            layer_damage,
            residual: None,
            trace,
        }
    }
}

/// How channel parameters are built for pain and stun
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelParameters {
    /// Each channel's formula sees its own amount as `damage`
    #[default]
    PerChannel,
    /// Pain and stun formulas see the damage channel's amount as `damage`
    SharedDamage,
}

/// Formula stages a layer runs
#[derive(Debug, Clone, Copy)]
pub enum LayerStages<'a> {
    Full(&'a ArmorFormulas),
    DissipateOnly(&'a ChannelFormulas),
}

/// Static description of one layer for a single hit
pub struct LayerProfile<'a> {
    pub quality: f64,
    pub material: &'a Material,
    pub penetration_defense: f64,
    pub minimum_penetration_degree: Option<OpposedOutcomeDegree>,
    pub stages: Option<LayerStages<'a>>,
    pub channel_parameters: ChannelParameters,
    pub armor: Option<&'a ArmorType>,
}

fn base_parameters(profile: &LayerProfile<'_>, damage: &Damage) -> FormulaParameters {
    let material = profile.material;
    FormulaParameters::new()
        .with(QUALITY, profile.quality)
        .with(ANGLE, damage.angle_of_incidence)
        .with(DENSITY, material.density)
        .with(ELECTRICAL, material.electrical_conductivity)
        .with(ORGANIC, if material.organic { 1.0 } else { 0.0 })
        .with(STRENGTH, material.yield_strength(damage.damage_type))
}

/// Evaluate one channel triple against `input`; `original` feeds the absorb stage
fn evaluate_channels(
    formulas: &ChannelFormulas,
    base: &FormulaParameters,
    input: &Damage,
    original: Option<&Damage>,
    mode: ChannelParameters,
    rng: &mut dyn RngCore,
) -> (f64, f64, f64) {
    let channels = [
        (&formulas.damage, input.amount, original.map(|o| o.amount)),
        (&formulas.pain, input.pain, original.map(|o| o.pain)),
        (&formulas.stun, input.stun, original.map(|o| o.stun)),
    ];
    let mut out = [0.0; 3];
    let mut shared = base.clone().with(DAMAGE, input.amount);
    if let Some(original) = original {
        shared.set(ORIGINAL, original.amount);
    }
    for (slot, (formula, amount, original_amount)) in out.iter_mut().zip(channels) {
        *slot = match mode {
            ChannelParameters::PerChannel => {
                let mut params = base.clone().with(DAMAGE, amount);
                if let Some(original_amount) = original_amount {
                    params.set(ORIGINAL, original_amount);
                }
                formula.evaluate(&params, rng)
            }
            ChannelParameters::SharedDamage => formula.evaluate(&shared, rng),
        };
    }
    (out[0], out[1], out[2])
}

/// Run the five stages for one layer
pub fn process_layer(
    profile: &LayerProfile<'_>,
    damage: &Damage,
    ctx: &mut AbsorptionContext<'_>,
) -> LayerResult {
    let mut trace = StageTrace::default();

    let penetration = resolve_penetration(
        damage.penetration,
        profile.penetration_defense,
        profile.minimum_penetration_degree,
        ctx.evaluator,
        ctx.rng,
    );
    if let PenetrationResult::Bypassed(_) = penetration {
        trace.penetration_bypassed = true;
        return LayerResult::untouched(damage, trace);
    }

    let Some(stages) = profile.stages else {
        return LayerResult::untouched(damage, trace);
    };
    let dissipate = match stages {
        LayerStages::Full(formulas) => &formulas.dissipate,
        LayerStages::DissipateOnly(formulas) => formulas,
    };

    let base = base_parameters(profile, damage);
    trace.dissipate_evaluated = true;
    let (amount, pain, stun) = evaluate_channels(
        dissipate,
        &base,
        damage,
        None,
        profile.channel_parameters,
        ctx.rng,
    );
    if amount <= 0.0 && pain <= 0.0 && stun <= 0.0 {
        return LayerResult::stopped(None, trace);
    }
    let dissipated = damage.with_channels(amount, pain, stun);

    let residual = match stages {
        LayerStages::DissipateOnly(_) => dissipated.clone(),
        LayerStages::Full(formulas) => {
            trace.absorb_evaluated = true;
            let (amount, pain, stun) = evaluate_channels(
                &formulas.absorb,
                &base,
                &dissipated,
                Some(damage),
                profile.channel_parameters,
                ctx.rng,
            );
            if amount <= 0.0 && pain <= 0.0 && stun <= 0.0 {
                return LayerResult::stopped(Some(dissipated), trace);
            }
            dissipated.with_channels(amount, pain, stun)
        }
    };

    let residual = match profile.armor {
        Some(armor) => {
            let severity = WoundSeverity::classify(residual.amount, &ctx.severity_thresholds);
            match armor.transform(residual.damage_type, severity) {
                Some(to) => {
                    trace.transformed_from = Some(residual.damage_type);
                    Damage {
                        damage_type: to,
                        ..residual
                    }
                }
                None => residual,
            }
        }
        None => residual,
    };

    LayerResult {
        layer_damage: Some(dissipated),
        residual: Some(residual),
        trace,
    }
}

/// Anything that sits between an attack and a bodypart
pub trait DamageLayer {
    fn layer_name(&self) -> &str;

    fn absorb(&mut self, damage: &Damage, ctx: &mut AbsorptionContext<'_>) -> LayerResult;
}

/// An armour item worn over a set of limbs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WornArmor {
    pub item: ItemId,
    pub armor: ArmorType,
    pub quality: f64,
    pub material: Material,
    pub covers: Vec<LimbId>,
    /// Damage the item can take before it is ruined
    pub durability: f64,
    pub damage_taken: f64,
}

impl WornArmor {
    pub fn new(item: ItemId, armor: ArmorType, quality: f64, material: Material) -> Self {
        Self {
            item,
            armor,
            quality,
            material,
            covers: Vec::new(),
            durability: 100.0,
            damage_taken: 0.0,
        }
    }

    pub fn covering(mut self, limbs: impl IntoIterator<Item = LimbId>) -> Self {
        self.covers.extend(limbs);
        self
    }

    pub fn covers(&self, limb: LimbId) -> bool {
        self.covers.contains(&limb)
    }

    /// Remaining condition in [0, 1]
    pub fn condition(&self) -> f64 {
        if self.durability <= 0.0 {
            return 0.0;
        }
        (1.0 - self.damage_taken / self.durability).clamp(0.0, 1.0)
    }

    pub fn is_ruined(&self) -> bool {
        self.condition() <= 0.0
    }
}

impl DamageLayer for WornArmor {
    fn layer_name(&self) -> &str {
        &self.armor.name
    }

    fn absorb(&mut self, damage: &Damage, ctx: &mut AbsorptionContext<'_>) -> LayerResult {
        if self.is_ruined() {
            return LayerResult::untouched(damage, StageTrace::default());
        }
        let profile = LayerProfile {
            quality: self.quality * self.condition(),
            material: &self.material,
            penetration_defense: self.armor.penetration_defense,
            minimum_penetration_degree: self.armor.minimum_penetration_degree,
            stages: self.armor.formulas_for(damage.damage_type).map(LayerStages::Full),
            channel_parameters: ChannelParameters::PerChannel,
            armor: Some(&self.armor),
        };
        let result = process_layer(&profile, damage, ctx);
        if let Some(suffered) = &result.layer_damage {
            self.damage_taken += suffered.amount;
        }
        result
    }
}

/// Hide, scales or chitin; processed innermost, takes no item damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalArmor {
    pub armor: ArmorType,
    pub quality: f64,
    pub material: Material,
}

impl DamageLayer for NaturalArmor {
    fn layer_name(&self) -> &str {
        &self.armor.name
    }

    fn absorb(&mut self, damage: &Damage, ctx: &mut AbsorptionContext<'_>) -> LayerResult {
        let profile = LayerProfile {
            quality: self.quality,
            material: &self.material,
            penetration_defense: self.armor.penetration_defense,
            minimum_penetration_degree: self.armor.minimum_penetration_degree,
            stages: self.armor.formulas_for(damage.damage_type).map(LayerStages::Full),
            channel_parameters: ChannelParameters::PerChannel,
            armor: Some(&self.armor),
        };
        process_layer(&profile, damage, ctx)
    }
}

/// A magical ward; dissipates only, processed outermost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldingEffect {
    pub name: String,
    pub quality: f64,
    pub dissipate: std::collections::BTreeMap<DamageType, ChannelFormulas>,
    pub minimum_penetration_degree: Option<OpposedOutcomeDegree>,
    pub penetration_defense: f64,
    /// Defaults to `SharedDamage`: pain and stun formulas read the damage
    /// channel's amount. Kept as observed until the intended behaviour is confirmed.
    pub channel_parameters: ChannelParameters,
}

impl ShieldingEffect {
    pub fn new(name: impl Into<String>, quality: f64) -> Self {
        Self {
            name: name.into(),
            quality,
            dissipate: Default::default(),
            minimum_penetration_degree: None,
            penetration_defense: 50.0,
            channel_parameters: ChannelParameters::SharedDamage,
        }
    }

    pub fn with_dissipate(mut self, damage_type: DamageType, formulas: ChannelFormulas) -> Self {
        self.dissipate.insert(damage_type, formulas);
        self
    }
}

impl DamageLayer for ShieldingEffect {
    fn layer_name(&self) -> &str {
        &self.name
    }

    fn absorb(&mut self, damage: &Damage, ctx: &mut AbsorptionContext<'_>) -> LayerResult {
        let material = Material::intangible();
        let profile = LayerProfile {
            quality: self.quality,
            material: &material,
            penetration_defense: self.penetration_defense,
            minimum_penetration_degree: self.minimum_penetration_degree,
            stages: self
                .dissipate
                .get(&damage.damage_type)
                .map(LayerStages::DissipateOnly),
            channel_parameters: self.channel_parameters,
            armor: None,
        };
        let mut result = process_layer(&profile, damage, ctx);
        result.layer_damage = None;
        result
    }
}

/// One layer's part in an absorption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerHit {
    pub layer: String,
    pub result: LayerResult,
}

/// Full record of a hit travelling through a stack of layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Absorption {
    pub original: Damage,
    pub hits: Vec<LayerHit>,
    /// What reaches the bodypart, if anything
    pub residual: Option<Damage>,
}

/// Feed `damage` through `layers`, outermost first
pub fn absorb_through(
    layers: &mut [&mut dyn DamageLayer],
    damage: Damage,
    ctx: &mut AbsorptionContext<'_>,
) -> Absorption {
    let original = damage.clone();
    let mut current = Some(damage);
    let mut hits = Vec::with_capacity(layers.len());
    for layer in layers.iter_mut() {
        let Some(incoming) = current.take() else {
            break;
        };
        let result = layer.absorb(&incoming, ctx);
        current = result.residual.clone();
        hits.push(LayerHit {
            layer: layer.layer_name().to_string(),
            result,
        });
    }
    Absorption {
        original,
        hits,
        residual: current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{FixedCheck, Outcome};
    use crate::core::types::DefinitionId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const THRESHOLDS: [f64; 8] = [0.5, 2.0, 4.0, 7.0, 12.0, 18.0, 27.0, 40.0];

    fn plate() -> ArmorType {
        ArmorType::new(DefinitionId(1), "plate")
            .with_minimum_penetration(OpposedOutcomeDegree::Total)
            .with_fallback(ArmorFormulas {
                dissipate: ChannelFormulas::uniform("damage - quality").unwrap(),
                absorb: ChannelFormulas::uniform("damage * 0.5").unwrap(),
            })
    }

    fn worn(armor: ArmorType, quality: f64) -> WornArmor {
        WornArmor::new(ItemId(1), armor, quality, Material::steel())
    }

    #[test]
    fn test_dissipate_then_absorb() {
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let mut layer = worn(plate(), 4.0);

        let result = layer.absorb(&Damage::new(DamageType::Slashing, 10.0, 6.0, 2.0), &mut ctx);

        let suffered = result.layer_damage.expect("layer hit");
        assert_eq!(suffered.amount, 6.0);
        assert_eq!(suffered.pain, 2.0);
        assert_eq!(suffered.stun, 0.0);
        let residual = result.residual.expect("something passes");
        assert_eq!(residual.amount, 3.0);
        assert_eq!(residual.pain, 1.0);
        assert!(result.trace.absorb_evaluated);
        assert_eq!(layer.damage_taken, 6.0);
    }

    #[test]
    fn test_full_dissipation_skips_absorb() {
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let mut layer = worn(plate(), 20.0);

        let result = layer.absorb(&Damage::new(DamageType::Crushing, 5.0, 5.0, 5.0), &mut ctx);

        assert!(result.trace.dissipate_evaluated);
        assert!(!result.trace.absorb_evaluated);
        assert!(result.residual.is_none());
        assert!(result.layer_damage.is_none());
        assert_eq!(layer.damage_taken, 0.0);
    }

    #[test]
    fn test_penetration_bypass_passes_original() {
        // Defender check always major-fails; MajorPass vs MajorFail is Total
        let check = FixedCheck::new(Outcome::MajorFail);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let mut layer = worn(plate(), 20.0);
        let damage =
            Damage::new(DamageType::Piercing, 9.0, 3.0, 1.0).with_penetration(Outcome::MajorPass);

        let result = layer.absorb(&damage, &mut ctx);

        assert!(result.trace.penetration_bypassed);
        assert!(!result.trace.dissipate_evaluated);
        assert!(!result.trace.absorb_evaluated);
        assert_eq!(result.residual, Some(damage));
    }

    #[test]
    fn test_transformation_on_weak_residual() {
        let armor = plate().with_transformation(crate::combat::armor::DamageTransformation {
            from: DamageType::Piercing,
            to: DamageType::Crushing,
            max_severity: WoundSeverity::Minor,
        });
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let mut layer = worn(armor, 4.0);

        let result = layer.absorb(&Damage::new(DamageType::Piercing, 6.0, 0.0, 0.0), &mut ctx);

        let residual = result.residual.expect("residual");
        assert_eq!(residual.amount, 1.0);
        assert_eq!(residual.damage_type, DamageType::Crushing);
        assert_eq!(result.trace.transformed_from, Some(DamageType::Piercing));
    }

    #[test]
    fn test_stack_stops_once_spent() {
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let mut outer = worn(plate(), 20.0);
        let mut inner = worn(plate(), 1.0);
        let mut layers: Vec<&mut dyn DamageLayer> = vec![&mut outer, &mut inner];

        let absorption = absorb_through(
            &mut layers,
            Damage::new(DamageType::Chopping, 8.0, 0.0, 0.0),
            &mut ctx,
        );

        assert_eq!(absorption.hits.len(), 1);
        assert!(absorption.residual.is_none());
        assert_eq!(inner.damage_taken, 0.0);
    }

    #[test]
    fn test_ruined_armor_offers_nothing() {
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let mut layer = worn(plate(), 20.0);
        layer.damage_taken = layer.durability;
        let damage = Damage::new(DamageType::Slashing, 4.0, 1.0, 0.0);

        let result = layer.absorb(&damage, &mut ctx);
        assert_eq!(result.residual, Some(damage));
    }

    #[test]
    fn test_shielding_shares_damage_channel_parameters() {
        let check = FixedCheck::new(Outcome::MinorPass);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ctx = AbsorptionContext::new(&check, &mut rng, THRESHOLDS);
        let mut ward = ShieldingEffect::new("ward", 2.0).with_dissipate(
            DamageType::Burning,
            ChannelFormulas::uniform("damage - quality").unwrap(),
        );

        let result = ward.absorb(&Damage::new(DamageType::Burning, 10.0, 1.0, 0.0), &mut ctx);

        let residual = result.residual.expect("residual");
        assert_eq!(residual.amount, 8.0);
        // pain formula saw damage = 10, not pain = 1
        assert_eq!(residual.pain, 8.0);
        assert!(!result.trace.absorb_evaluated);
        assert!(result.layer_damage.is_none());

        ward.channel_parameters = ChannelParameters::PerChannel;
        let result = ward.absorb(&Damage::new(DamageType::Burning, 10.0, 1.0, 0.0), &mut ctx);
        assert_eq!(result.residual.expect("residual").pain, 0.0);
    }
}
