//! Move resolution
//!
//! [`resolve_move`] dispatches on the move kind. Every pairing of move and
//! response a strategy can produce has a handler; anything else is an engine
//! defect and surfaces as [`CombatError::UnhandledMoveType`] instead of being
//! silently ignored.
//!
//! The assailant and defender are passed in by mutable reference. The engine
//! lifts both out of its map for the duration of the call, so resolution never
//! touches any other combatant.

use rand::RngCore;
use tracing::debug;

use crate::attacks::{AttackCategory, AttackInputs, AttackKind};
use crate::check::{CheckEvaluator, Difficulty, OpposedOutcome, OpposedOutcomeDegree, Outcome};
use crate::combat::{roll_penetration, AbsorptionContext, Damage, DamageType};
use crate::combatant::effects::{Effect, EffectKind};
use crate::combatant::equipment::GearItem;
use crate::combatant::{trait_names, CharacterState, Combatant, GrappleHold, LimbKind, PositionState};
use crate::core::config::EngineConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::{CombatantId, ItemId, LimbId};
use crate::moves::defense::{defense_check, DefenseMove};
use crate::moves::kinds::{AttackMove, CombatMove, GrappleStage, MoveKind};
use crate::moves::result::{MoveNote, MoveResult};
use crate::tracking::{Aim, CoverOccupation, TrackerArena, TrackerEvent};
use crate::world::Terrain;

/// Everything resolution reads or writes besides the two combatants
pub struct ResolutionContext<'a> {
    pub evaluator: &'a dyn CheckEvaluator,
    pub rng: &'a mut dyn RngCore,
    pub config: &'a EngineConfig,
    pub terrain: &'a dyn Terrain,
    pub trackers: &'a mut TrackerArena,
}

impl ResolutionContext<'_> {
    fn check(&mut self, value: f64, difficulty: Difficulty) -> Outcome {
        self.evaluator.evaluate(value, difficulty, &mut *self.rng).outcome
    }

    /// Roll the attacker, then the defense; no defense is a forced MajorFail
    fn contest(
        &mut self,
        attack: (f64, Difficulty),
        defense: Option<(f64, Difficulty)>,
    ) -> (Outcome, OpposedOutcome) {
        let outcome = self.check(attack.0, attack.1);
        let defended = match defense {
            Some((value, difficulty)) => self.check(value, difficulty),
            None => Outcome::MajorFail,
        };
        (outcome, OpposedOutcome::new(outcome, defended))
    }
}

/// Resolve one move against its target
pub fn resolve_move(
    mv: &CombatMove,
    response: Option<&DefenseMove>,
    assailant: &mut Combatant,
    defender: Option<&mut Combatant>,
    ctx: &mut ResolutionContext<'_>,
) -> Result<MoveResult> {
    let mut result = match (&mv.kind, defender) {
        (MoveKind::Attack(attack), Some(defender)) => {
            let response = require_response(mv, response)?;
            resolve_attack(mv, attack, response, assailant, defender, ctx)?
        }
        (MoveKind::Fire { weapon, .. }, Some(defender)) => {
            let response = require_response(mv, response)?;
            resolve_fire(mv, *weapon, response, assailant, defender, ctx)?
        }
        (MoveKind::Grapple(stage), Some(defender)) => {
            let response = require_response(mv, response)?;
            resolve_grapple(mv, *stage, response, assailant, defender, ctx)?
        }
        (MoveKind::BreakClinch, Some(defender)) => {
            let response = require_response(mv, response)?;
            resolve_break_clinch(mv, response, assailant, defender, ctx)?
        }
        (MoveKind::Rescue { ally }, Some(defender)) => {
            let response = require_response(mv, response)?;
            let mut result = resolve_rescue(mv, response, assailant, defender, ctx)?;
            if result.landed() {
                result.notes.push(MoveNote::Rescued { ally: *ally });
            }
            result
        }
        (MoveKind::Aim { weapon }, Some(defender)) => {
            resolve_aim(mv, *weapon, assailant, defender, ctx)
        }
        (MoveKind::Engage, Some(defender)) => resolve_engage(mv, assailant, defender),
        (kind, _) if !kind.needs_target() => resolve_solo(mv, assailant, ctx)?,
        (kind, None) => {
            return Err(CombatError::UnhandledMoveType(format!(
                "{} without a target",
                kind.label()
            )))
        }
        (kind, Some(_)) => {
            return Err(CombatError::UnhandledMoveType(format!(
                "{} has no targeted resolution",
                kind.label()
            )))
        }
    };

    result.recovery_difficulty = match result.opposed {
        Some(o) if o.proponent_wins() => mv.recovery_difficulty.stage_down(1),
        Some(o) if o.opponent_wins() => mv.recovery_difficulty.stage_up(1),
        _ => mv.recovery_difficulty,
    };
    let recovery_value = match &mv.kind {
        MoveKind::Attack(attack) => assailant.trait_value(&attack.skill),
        MoveKind::Grapple(_) | MoveKind::BreakClinch => {
            assailant.trait_value(trait_names::WRESTLING)
        }
        _ => assailant.trait_value(trait_names::ATHLETICS),
    };
    result.recovery = ctx.check(recovery_value, result.recovery_difficulty);

    debug!(
        assailant = %assailant.id,
        action = %mv.describe(),
        outcome = ?result.outcome,
        landed = result.landed(),
        recovery = ?result.recovery,
        "move resolved"
    );
    Ok(result)
}

fn require_response<'r>(mv: &CombatMove, response: Option<&'r DefenseMove>) -> Result<&'r DefenseMove> {
    response.ok_or_else(|| {
        CombatError::UnhandledMoveType(format!("{} reached resolution unanswered", mv.kind.label()))
    })
}

fn same_spot(a: &Combatant, b: &Combatant) -> bool {
    a.location == b.location && a.layer == b.layer
}

/// Run damage through the defender's layers and record what came of it
fn land_hit(
    damage: Damage,
    defender: &mut Combatant,
    ctx: &mut ResolutionContext<'_>,
    result: &mut MoveResult,
) {
    let report = {
        let mut absorb = AbsorptionContext::new(
            ctx.evaluator,
            &mut *ctx.rng,
            ctx.config.severity_thresholds,
        );
        defender.receive_damage(damage, &mut absorb)
    };
    match &report.wound {
        Some(wound) => result.notes.push(MoveNote::Wounded {
            target: defender.id,
            limb: wound.limb,
            amount: wound.damage.amount,
            severity: wound.severity,
        }),
        None => result.notes.push(MoveNote::Absorbed { target: defender.id }),
    }
    if report.killed {
        result.notes.push(MoveNote::Killed { target: defender.id });
        result
            .released
            .extend(ctx.trackers.notify(TrackerEvent::Died(defender.id)));
    } else if report.knocked_out {
        result.notes.push(MoveNote::KnockedOut { target: defender.id });
    }
}

/// Drop `holder`'s grapple on `held`
fn release_hold(holder: &mut Combatant, held: &mut Combatant) {
    if holder.grapple.is_some_and(|g| g.target == held.id) {
        holder.grapple = None;
        held.body.release_grapple();
    }
}

/// End any clinch or grapple between two combatants
fn break_clinch(a: &mut Combatant, b: &mut Combatant) -> bool {
    let clinched = a.effects.clinching() == Some(b.id) || b.effects.clinching() == Some(a.id);
    let held = a.grapple.is_some_and(|g| g.target == b.id) || b.grapple.is_some_and(|g| g.target == a.id);
    if clinched {
        a.effects.remove_all(EffectKind::Clinching);
        b.effects.remove_all(EffectKind::Clinching);
    }
    release_hold(a, b);
    release_hold(b, a);
    clinched || held
}

fn vital_limb(combatant: &Combatant) -> Option<LimbId> {
    [LimbKind::Neck, LimbKind::Head, LimbKind::Torso]
        .into_iter()
        .find_map(|kind| combatant.body.first_of_kind(kind))
        .map(|l| l.id)
}

fn resolve_attack(
    mv: &CombatMove,
    attack: &AttackMove,
    response: &DefenseMove,
    assailant: &mut Combatant,
    defender: &mut Combatant,
    ctx: &mut ResolutionContext<'_>,
) -> Result<MoveResult> {
    let mut result = MoveResult::new(Outcome::MajorFail, mv.recovery_difficulty);
    let at_range = matches!(
        attack.attack.category,
        AttackCategory::Magic | AttackCategory::Psychic
    );
    if !at_range && !same_spot(assailant, defender) {
        result.notes.push(MoveNote::failed("target out of reach"));
        return Ok(result);
    }

    let defense = defense_check(response, defender, mv)?;
    result.defender_acted = !response.is_helpless();

    let kind = attack.attack.kind;
    let skill = assailant.trait_value(&attack.skill);
    let (outcome, opposed) = if kind == AttackKind::CoupDeGrace && response.is_helpless() {
        (
            Outcome::MajorPass,
            OpposedOutcome::proponent_victory(OpposedOutcomeDegree::Total),
        )
    } else {
        ctx.contest((skill + attack.quality, attack.attack.difficulty), defense)
    };
    result.outcome = outcome;
    result.opposed = Some(opposed);

    if !at_range {
        assailant.melee_range = true;
        defender.melee_range = true;
    }
    if !opposed.proponent_wins() {
        result.notes.push(MoveNote::Missed);
        return Ok(result);
    }

    if kind == AttackKind::Clinch {
        assailant.effects.add(Effect::Clinching { with: defender.id });
        defender.effects.add(Effect::Clinching { with: assailant.id });
        result.notes.push(MoveNote::ClinchStarted { with: defender.id });
        return Ok(result);
    }

    let inputs = AttackInputs {
        degree: opposed.degree,
        trait_value: skill,
        weapon_quality: attack.quality,
        power: assailant.power(),
    };
    let mut damage = attack
        .attack
        .roll_damage(&inputs, &mut *ctx.rng)
        .from_source(assailant.id);
    if let Some(difficulty) = attack.attack.penetration {
        let roll = roll_penetration(ctx.evaluator, skill, difficulty, &mut *ctx.rng);
        damage = damage.with_penetration(roll);
    }
    if kind == AttackKind::CoupDeGrace {
        if let Some(limb) = vital_limb(defender) {
            damage = damage.on_bodypart(limb);
        }
    }
    let secondary =
        kind.has_secondary_effect() && opposed.proponent_wins_by(attack.attack.secondary_degree);

    land_hit(damage, defender, ctx, &mut result);
    if secondary && !defender.is_dead() {
        apply_secondary(kind, mv, assailant, defender, &mut result);
    }
    Ok(result)
}

fn apply_secondary(
    kind: AttackKind,
    mv: &CombatMove,
    assailant: &mut Combatant,
    defender: &mut Combatant,
    result: &mut MoveResult,
) {
    let target = defender.id;
    match kind {
        AttackKind::StaggeringBlow => {
            defender.effects.add(Effect::Staggered {
                delay: mv.base_delay * 0.5,
            });
            result.notes.push(MoveNote::Staggered { target });
        }
        AttackKind::UnbalancingBlow => {
            if !defender.effects.has(EffectKind::Unbalanced) {
                defender.effects.add(Effect::Unbalanced);
            }
            result.notes.push(MoveNote::Unbalanced { target });
        }
        AttackKind::Pushback => {
            break_clinch(assailant, defender);
            assailant.melee_range = false;
            defender.melee_range = false;
            result.notes.push(MoveNote::PushedBack { target });
        }
        AttackKind::Disarm => {
            let item = defender.equipment.wielded_weapons().next().map(|(g, _)| g.item);
            if let Some(item) = item {
                defender.equipment.drop_item(item);
                result.notes.push(MoveNote::Disarmed { target, item });
            }
        }
        AttackKind::DisablingStrike => {
            if break_clinch(assailant, defender) {
                result.notes.push(MoveNote::ClinchBroken { with: target });
            }
        }
        _ => {}
    }
}

fn resolve_fire(
    mv: &CombatMove,
    weapon: ItemId,
    response: &DefenseMove,
    assailant: &mut Combatant,
    defender: &mut Combatant,
    ctx: &mut ResolutionContext<'_>,
) -> Result<MoveResult> {
    let mut result = MoveResult::new(Outcome::MajorFail, mv.recovery_difficulty);
    let (skill, fire_difficulty, quality, range, ready) = match assailant.equipment.wielded_ranged()
    {
        Some(view) if view.item == weapon => (
            view.weapon.skill.clone(),
            view.weapon.fire_difficulty,
            view.quality,
            view.weapon.range.min(ctx.config.max_ranged_distance),
            view.readied || !view.weapon.requires_readying,
        ),
        _ => {
            result.notes.push(MoveNote::failed("weapon not in hand"));
            return Ok(result);
        }
    };
    if !ready {
        result.notes.push(MoveNote::failed("weapon not readied"));
        return Ok(result);
    }
    if !ctx
        .terrain
        .in_line_of_sight(assailant.location, defender.location, range)
    {
        result.notes.push(MoveNote::failed("target out of range"));
        return Ok(result);
    }
    let own_cover = assailant.cover.and_then(|id| ctx.trackers.cover(id));
    if own_cover.is_some_and(|c| c.cover.blocks_own_fire) {
        result.notes.push(MoveNote::failed("cover blocks the shot"));
        return Ok(result);
    }
    let Some(round) = assailant.equipment.fire_round() else {
        result.notes.push(MoveNote::OutOfAmmunition);
        return Ok(result);
    };

    let aim_stages = assailant
        .aim
        .and_then(|id| ctx.trackers.aim(id))
        .filter(|a| a.target == defender.id && a.weapon == weapon)
        .map_or(0, |a| (a.percentage.value() * 3.0).floor() as u32);
    let mut difficulty = fire_difficulty.stage_down(aim_stages);
    if let Some(occupation) = defender.cover.and_then(|id| ctx.trackers.cover(id)) {
        difficulty = occupation.cover.shift_difficulty(difficulty);
    }
    if assailant.melee_range && same_spot(assailant, defender) {
        difficulty = difficulty.stage_up(1);
    }
    if let Some(id) = assailant.aim.take() {
        result.released.extend(ctx.trackers.release(id));
    }

    mark_firing(assailant, defender.id);

    let defense = defense_check(response, defender, mv)?;
    result.defender_acted = !response.is_helpless();
    let value = assailant.trait_value(&skill);
    let (outcome, opposed) = ctx.contest((value, difficulty), defense);
    result.outcome = outcome;
    result.opposed = Some(opposed);
    if !opposed.proponent_wins() {
        result.notes.push(MoveNote::Missed);
        return Ok(result);
    }

    let inputs = AttackInputs {
        degree: opposed.degree,
        trait_value: value,
        weapon_quality: quality,
        power: 0.0,
    };
    let mut damage = round
        .ammunition
        .roll_damage(&inputs, round.quality, &mut *ctx.rng)
        .from_source(assailant.id);
    if let Some(penetration) = round.ammunition.penetration {
        let roll = roll_penetration(ctx.evaluator, value, penetration, &mut *ctx.rng);
        damage = damage.with_penetration(roll);
    }
    land_hit(damage, defender, ctx, &mut result);
    if defender.is_dead() {
        assailant.effects.remove_all(EffectKind::FiringInProgress);
    }
    Ok(result)
}

/// Mark a firing sequence against `target`, replacing one against anyone else
fn mark_firing(assailant: &mut Combatant, target: CombatantId) {
    if assailant.effects.firing_target() != Some(target) {
        assailant.effects.remove_all(EffectKind::FiringInProgress);
        assailant.effects.add(Effect::FiringInProgress { target });
    }
}

/// Share of the configured gain an aim check earns
fn aim_factor(outcome: Outcome) -> f64 {
    match outcome {
        Outcome::MajorPass => 1.5,
        Outcome::Pass => 1.0,
        Outcome::MinorPass => 0.75,
        Outcome::MinorFail => 0.5,
        Outcome::Fail => 0.25,
        Outcome::MajorFail => 0.0,
    }
}

fn resolve_aim(
    mv: &CombatMove,
    weapon: ItemId,
    assailant: &mut Combatant,
    defender: &mut Combatant,
    ctx: &mut ResolutionContext<'_>,
) -> MoveResult {
    let mut result = MoveResult::new(Outcome::MajorFail, mv.recovery_difficulty);
    let (skill, difficulty, multiplier) = match assailant.equipment.wielded_ranged() {
        Some(view) if view.item == weapon => (
            view.weapon.skill.clone(),
            view.weapon.aim_difficulty,
            view.weapon.aim_gain_multiplier,
        ),
        _ => {
            result.notes.push(MoveNote::failed("weapon not in hand"));
            return result;
        }
    };
    let outcome = ctx.check(assailant.trait_value(&skill), difficulty);
    result.outcome = outcome;
    let gain = ctx.config.aim_gain_per_move * multiplier * aim_factor(outcome);

    let current = assailant.aim.filter(|id| {
        ctx.trackers
            .aim(*id)
            .is_some_and(|a| a.target == defender.id && a.weapon == weapon)
    });
    let id = match current {
        Some(id) => id,
        None => {
            if let Some(old) = assailant.aim.take() {
                result.released.extend(ctx.trackers.release(old));
            }
            let id = ctx
                .trackers
                .begin_aim(Aim::new(assailant.id, defender.id, weapon));
            assailant.aim = Some(id);
            id
        }
    };
    let percentage = match ctx.trackers.aim_mut(id) {
        Some(aim) => {
            aim.improve(gain);
            aim.percentage.value()
        }
        None => 0.0,
    };

    if assailant.cover.is_some() {
        mark_firing(assailant, defender.id);
    }
    result.notes.push(MoveNote::AimImproved {
        target: defender.id,
        percentage,
    });
    result
}

fn resolve_engage(mv: &CombatMove, assailant: &mut Combatant, defender: &mut Combatant) -> MoveResult {
    let mut result = MoveResult::new(Outcome::MinorPass, mv.recovery_difficulty);
    if same_spot(assailant, defender) {
        assailant.melee_range = true;
        defender.melee_range = true;
        result.notes.push(MoveNote::Engaged { target: defender.id });
    } else {
        result.outcome = Outcome::MinorFail;
        result.notes.push(MoveNote::failed("target not here"));
    }
    result
}

fn wrestling(combatant: &Combatant) -> f64 {
    combatant.trait_value(trait_names::WRESTLING) + combatant.power() / 10.0
}

fn resolve_grapple(
    mv: &CombatMove,
    stage: GrappleStage,
    response: &DefenseMove,
    assailant: &mut Combatant,
    defender: &mut Combatant,
    ctx: &mut ResolutionContext<'_>,
) -> Result<MoveResult> {
    let mut result = MoveResult::new(Outcome::MajorFail, mv.recovery_difficulty);
    if !same_spot(assailant, defender) || !assailant.melee_range {
        result.notes.push(MoveNote::failed("target out of reach"));
        return Ok(result);
    }
    if stage.is_escalation() && assailant.grapple.map(|g| g.target) != Some(defender.id) {
        result.notes.push(MoveNote::failed("no hold to work from"));
        return Ok(result);
    }

    let defense = defense_check(response, defender, mv)?;
    result.defender_acted = !response.is_helpless();
    let difficulty = match stage {
        GrappleStage::Takedown => Difficulty::Hard,
        _ => Difficulty::Normal,
    };
    let (outcome, opposed) = ctx.contest((wrestling(assailant), difficulty), defense);
    result.outcome = outcome;
    result.opposed = Some(opposed);
    if !opposed.proponent_wins() {
        result.notes.push(MoveNote::Missed);
        return Ok(result);
    }

    let degree = opposed.degree.value();
    match stage {
        GrappleStage::ExtendControl { limb } => {
            if let Some(l) = defender.body.limb_mut(limb) {
                l.grappled = true;
            }
            assailant.grapple = Some(GrappleHold {
                target: defender.id,
            });
            result.notes.push(MoveNote::LimbGrappled {
                target: defender.id,
                limb,
            });
        }
        GrappleStage::Takedown => {
            defender.position = PositionState::Prone;
            result
                .released
                .extend(ctx.trackers.notify(TrackerEvent::Moved(defender.id)));
            result.notes.push(MoveNote::TakenDown {
                target: defender.id,
            });
        }
        GrappleStage::Wrench { limb } => {
            let amount = assailant.power() / 5.0 + degree * 3.0;
            let damage = Damage::new(DamageType::Wrenching, amount, amount * 1.5, 0.0)
                .on_bodypart(limb)
                .from_source(assailant.id);
            land_hit(damage, defender, ctx, &mut result);
        }
        GrappleStage::Strangle => {
            let mut damage = Damage::new(DamageType::Hypoxia, degree * 2.0, degree * 2.0, degree * 10.0)
                .from_source(assailant.id);
            if let Some(neck) = defender.body.first_of_kind(LimbKind::Neck) {
                damage = damage.on_bodypart(neck.id);
            }
            land_hit(damage, defender, ctx, &mut result);
        }
    }
    Ok(result)
}

fn resolve_break_clinch(
    mv: &CombatMove,
    response: &DefenseMove,
    assailant: &mut Combatant,
    defender: &mut Combatant,
    ctx: &mut ResolutionContext<'_>,
) -> Result<MoveResult> {
    let mut result = MoveResult::new(Outcome::MajorFail, mv.recovery_difficulty);
    let defense = defense_check(response, defender, mv)?;
    result.defender_acted = !response.is_helpless();
    let (outcome, opposed) = ctx.contest((wrestling(assailant), Difficulty::Normal), defense);
    result.outcome = outcome;
    result.opposed = Some(opposed);
    if opposed.proponent_wins() {
        break_clinch(assailant, defender);
        result.notes.push(MoveNote::ClinchBroken { with: defender.id });
    } else {
        result.notes.push(MoveNote::Missed);
    }
    Ok(result)
}

fn resolve_rescue(
    mv: &CombatMove,
    response: &DefenseMove,
    assailant: &mut Combatant,
    defender: &mut Combatant,
    ctx: &mut ResolutionContext<'_>,
) -> Result<MoveResult> {
    let mut result = MoveResult::new(Outcome::MajorFail, mv.recovery_difficulty);
    if !same_spot(assailant, defender) {
        result.notes.push(MoveNote::failed("attacker out of reach"));
        return Ok(result);
    }
    let defense = defense_check(response, defender, mv)?;
    result.defender_acted = !response.is_helpless();
    let athletics = assailant.trait_value(trait_names::ATHLETICS);
    let (outcome, opposed) = ctx.contest((athletics, Difficulty::Normal), defense);
    result.outcome = outcome;
    result.opposed = Some(opposed);
    if !opposed.proponent_wins() {
        result.notes.push(MoveNote::Missed);
        return Ok(result);
    }
    defender.target = Some(assailant.id);
    defender.effects.remove_all(EffectKind::FiringInProgress);
    result
        .released
        .extend(ctx.trackers.notify(TrackerEvent::TargetChanged(defender.id)));
    assailant.target = Some(defender.id);
    assailant.melee_range = true;
    defender.melee_range = true;
    Ok(result)
}

/// Wield an item, putting away other held items until enough hands are free
fn wield_freeing_hands(combatant: &mut Combatant, item: ItemId) -> bool {
    let hands = combatant.body.working_hands();
    let Some(needed) = combatant.equipment.item(item).map(GearItem::hands) else {
        return false;
    };
    if needed > hands {
        return false;
    }
    while combatant.equipment.free_hands(hands) < needed {
        let other = combatant
            .equipment
            .items
            .iter()
            .find(|i| i.wielded && i.item != item)
            .map(|i| i.item);
        match other {
            Some(other) => combatant.equipment.unwield(other),
            None => break,
        }
    }
    combatant.equipment.wield(item, hands)
}

fn resolve_solo(
    mv: &CombatMove,
    assailant: &mut Combatant,
    ctx: &mut ResolutionContext<'_>,
) -> Result<MoveResult> {
    let mut result = MoveResult::new(Outcome::MinorPass, mv.recovery_difficulty);
    let id = assailant.id;
    match &mv.kind {
        MoveKind::Ready { weapon } => {
            let held = assailant
                .equipment
                .wielded_ranged()
                .is_some_and(|v| v.item == *weapon);
            if held && assailant.equipment.ready_ranged() {
                result.notes.push(MoveNote::Readied);
            } else {
                result.notes.push(MoveNote::failed("nothing to ready"));
            }
        }
        MoveKind::Load { .. } => {
            if assailant.equipment.load_ranged() {
                result.notes.push(MoveNote::Loaded);
            } else if assailant.equipment.ammunition_available() == 0 {
                result.notes.push(MoveNote::OutOfAmmunition);
            } else {
                result.notes.push(MoveNote::failed("weapon already full"));
            }
        }
        MoveKind::Wield { item } => {
            if wield_freeing_hands(assailant, *item) {
                result.notes.push(MoveNote::Wielded { item: *item });
            } else {
                result.notes.push(MoveNote::failed("not enough hands"));
            }
        }
        MoveKind::Retrieve { item } => {
            if assailant.equipment.retrieve(*item) {
                result.notes.push(MoveNote::Retrieved { item: *item });
                if wield_freeing_hands(assailant, *item) {
                    result.notes.push(MoveNote::Wielded { item: *item });
                }
            } else {
                result.notes.push(MoveNote::failed("item is gone"));
            }
        }
        MoveKind::Stand => {
            assailant.position = PositionState::Standing;
            result
                .released
                .extend(ctx.trackers.notify(TrackerEvent::Moved(id)));
            result.notes.push(MoveNote::StoodUp);
        }
        MoveKind::Wake => {
            if assailant.state == CharacterState::Sleeping {
                assailant.state = CharacterState::Awake;
                result.notes.push(MoveNote::WokeUp);
            } else {
                result.notes.push(MoveNote::failed("cannot wake"));
            }
        }
        MoveKind::Flee { to } => {
            let here = assailant.location;
            let difficulty = if assailant.melee_range {
                ctx.config.flee_difficulty.stage_up(1)
            } else {
                ctx.config.flee_difficulty
            };
            let destination = to.filter(|to| ctx.terrain.neighbours(here).contains(to));
            let able = assailant.position.can_move() && assailant.body.can_walk();
            match destination {
                Some(to) if able => {
                    let outcome = ctx.check(assailant.trait_value(trait_names::ATHLETICS), difficulty);
                    result.outcome = outcome;
                    if outcome.is_pass() {
                        assailant.location = to;
                        assailant.melee_range = false;
                        result
                            .released
                            .extend(ctx.trackers.notify(TrackerEvent::LocationChanged(id)));
                        result.left_combat = true;
                        result.notes.push(MoveNote::Fled { to });
                    } else {
                        result.notes.push(MoveNote::failed("could not get away"));
                    }
                }
                _ => {
                    result.outcome = Outcome::MajorFail;
                    result.notes.push(MoveNote::failed("nowhere to run"));
                }
            }
        }
        MoveKind::Move { to } => {
            let here = assailant.location;
            if assailant.position.can_move() && ctx.terrain.neighbours(here).contains(to) {
                assailant.location = *to;
                assailant.melee_range = false;
                result
                    .released
                    .extend(ctx.trackers.notify(TrackerEvent::LocationChanged(id)));
                result.notes.push(MoveNote::Moved { to: *to });
            } else {
                result.outcome = Outcome::MinorFail;
                result.notes.push(MoveNote::failed("no way there"));
            }
        }
        MoveKind::ChangeLayer { to } => {
            let reachable = ctx.terrain.layers_at(assailant.location).contains(to);
            if reachable && (!to.is_airborne() || assailant.can_fly) {
                assailant.layer = *to;
                assailant.melee_range = false;
                result
                    .released
                    .extend(ctx.trackers.notify(TrackerEvent::Moved(id)));
                result.notes.push(MoveNote::LayerChanged);
            } else {
                result.outcome = Outcome::MinorFail;
                result.notes.push(MoveNote::failed("cannot reach that layer"));
            }
        }
        MoveKind::SeekCover { cover } => {
            let location = assailant.location;
            let offered = ctx
                .terrain
                .cover_at(location)
                .iter()
                .any(|c| c.id == cover.id);
            let occupants = ctx.trackers.occupants(location, cover.id);
            if offered && cover.has_room(occupants) {
                if let Some(old) = assailant.cover.take() {
                    result.released.extend(ctx.trackers.release(old));
                }
                result
                    .released
                    .extend(ctx.trackers.notify(TrackerEvent::Moved(id)));
                assailant.position = cover.position;
                let tracker = ctx.trackers.take_cover(CoverOccupation {
                    occupant: id,
                    cover: cover.clone(),
                    location,
                });
                assailant.cover = Some(tracker);
                result.notes.push(MoveNote::TookCover {
                    cover: cover.name.clone(),
                });
            } else {
                result.outcome = Outcome::MinorFail;
                result.notes.push(MoveNote::failed("no room in cover"));
            }
        }
        kind => {
            return Err(CombatError::UnhandledMoveType(format!(
                "{} needs a target",
                kind.label()
            )))
        }
    }
    Ok(result)
}
