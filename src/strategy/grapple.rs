//! Grapple escalation
//!
//! A grappler first takes hold of limbs one at a time. With a hold it may
//! escalate towards its goal; the chance to escalate halves with every limb
//! already held, so a grappler keeps extending control while it can. Once every
//! relevant limb is held there is nothing left to extend, and only the finishing
//! move remains.

use rand::{Rng, RngCore};

use crate::combatant::{Combatant, LimbKind};
use crate::core::types::LimbId;
use crate::moves::{CombatMove, GrappleStage, MoveKind};
use crate::strategy::mode::GrappleGoal;
use crate::strategy::Battlefield;

const GRAPPLE_STAMINA: f64 = 5.0;
const GRAPPLE_DELAY: f64 = 3.0;

fn grapple_move(actor: &Combatant, target: &Combatant, stage: GrappleStage) -> CombatMove {
    CombatMove::new(actor.id, MoveKind::Grapple(stage), GRAPPLE_STAMINA, GRAPPLE_DELAY)
        .against(target.id)
}

/// A held limb worth wrenching, sturdiest kinds last
fn wrench_target(target: &Combatant) -> Option<LimbId> {
    target
        .body
        .grapple_relevant()
        .filter(|l| l.grappled && !l.disabled)
        .min_by_key(|l| !l.kind.is_extremity())
        .map(|l| l.id)
}

/// The move that realises the goal, if one applies to this target
pub fn finishing_stage(goal: GrappleGoal, target: &Combatant) -> Option<GrappleStage> {
    let upright = target.position.is_upright();
    match goal {
        GrappleGoal::Control => upright.then_some(GrappleStage::Takedown),
        GrappleGoal::Incapacitate if upright => Some(GrappleStage::Takedown),
        GrappleGoal::Incapacitate => wrench_target(target).map(|limb| GrappleStage::Wrench { limb }),
        GrappleGoal::Kill => {
            if target.body.first_of_kind(LimbKind::Neck).is_some() {
                Some(GrappleStage::Strangle)
            } else {
                wrench_target(target).map(|limb| GrappleStage::Wrench { limb })
            }
        }
    }
}

/// Next grapple move against the actor's target
pub fn choose(
    actor: &Combatant,
    goal: GrappleGoal,
    field: &Battlefield<'_>,
    rng: &mut dyn RngCore,
) -> Option<CombatMove> {
    let target = field.target_of(actor)?;
    if !actor.melee_range || actor.location != target.location || actor.layer != target.layer {
        return None;
    }
    let holding = actor.grapple.is_some_and(|g| g.target == target.id);
    if !holding {
        let limb = target.body.free_extremity()?;
        return Some(grapple_move(actor, target, GrappleStage::ExtendControl { limb }));
    }

    if target.body.all_grappled() {
        return finishing_stage(goal, target).map(|stage| grapple_move(actor, target, stage));
    }

    let held = target.body.grappled_count().max(1) as i32;
    let chance = (field.config.grapple_escalation_base * 0.5f64.powi(held - 1)).clamp(0.0, 1.0);
    if rng.gen_bool(chance) {
        if let Some(stage) = finishing_stage(goal, target) {
            return Some(grapple_move(actor, target, stage));
        }
    }
    let limb = target.body.free_extremity()?;
    Some(grapple_move(actor, target, GrappleStage::ExtendControl { limb }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::StandardCheck;
    use crate::combatant::{GrappleHold, PositionState};
    use crate::core::config::EngineConfig;
    use crate::core::types::{CombatantId, LocationId};
    use crate::tracking::TrackerArena;
    use crate::world::{Location, LocationGraph};
    use ahash::AHashMap;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pair() -> (Combatant, Combatant) {
        let mut actor = Combatant::new(CombatantId(1), "grappler", LocationId(1)).with_side(0);
        let target = Combatant::new(CombatantId(2), "victim", LocationId(1)).with_side(1);
        actor.target = Some(target.id);
        actor.melee_range = true;
        (actor, target)
    }

    fn decide(actor: &Combatant, target: &Combatant, goal: GrappleGoal, seed: u64) -> Option<CombatMove> {
        let mut combatants = AHashMap::new();
        combatants.insert(target.id, target.clone());
        let mut terrain = LocationGraph::new();
        terrain.insert(Location::new(1, "pit"));
        let trackers = TrackerArena::new();
        let config = EngineConfig::default();
        let evaluator = StandardCheck::new();
        let field = Battlefield {
            combatants: &combatants,
            terrain: &terrain,
            trackers: &trackers,
            config: &config,
            evaluator: &evaluator,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        choose(actor, goal, &field, &mut rng)
    }

    fn grapple_stage(mv: &CombatMove) -> Option<GrappleStage> {
        match mv.kind {
            MoveKind::Grapple(stage) => Some(stage),
            _ => None,
        }
    }

    #[test]
    fn test_first_move_takes_a_limb() {
        let (actor, target) = pair();
        let mv = decide(&actor, &target, GrappleGoal::Kill, 1).unwrap();
        assert!(matches!(
            grapple_stage(&mv),
            Some(GrappleStage::ExtendControl { .. })
        ));
    }

    #[test]
    fn test_fully_grappled_target_gets_no_extension() {
        let (mut actor, mut target) = pair();
        actor.grapple = Some(GrappleHold { target: target.id });
        for limb in &mut target.body.limbs {
            limb.grappled = true;
        }
        for seed in 0..20 {
            let mv = decide(&actor, &target, GrappleGoal::Kill, seed).unwrap();
            assert_eq!(grapple_stage(&mv), Some(GrappleStage::Strangle));
        }

        target.position = PositionState::Prone;
        for seed in 0..20 {
            assert!(decide(&actor, &target, GrappleGoal::Control, seed).is_none());
        }
    }

    #[test]
    fn test_out_of_reach_does_nothing() {
        let (mut actor, target) = pair();
        actor.melee_range = false;
        assert!(decide(&actor, &target, GrappleGoal::Control, 3).is_none());
    }

    #[test]
    fn test_incapacitate_wrenches_downed_target() {
        let target = {
            let (_, mut target) = pair();
            target.position = PositionState::Prone;
            target.body.limbs[3].grappled = true;
            target
        };
        assert!(matches!(
            finishing_stage(GrappleGoal::Incapacitate, &target),
            Some(GrappleStage::Wrench { limb }) if limb == target.body.limbs[3].id
        ));
        assert_eq!(finishing_stage(GrappleGoal::Control, &target), None);
    }
}
