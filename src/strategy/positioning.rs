//! Positioning: clinch breaking, fleeing, cover, layers and range

use ordered_float::OrderedFloat;
use rand::RngCore;

use crate::attacks::AttackKind;
use crate::combatant::settings::CombatSettings;
use crate::combatant::stamina::StaminaLedger;
use crate::combatant::{Combatant, PositionState};
use crate::core::types::RoomLayer;
use crate::definitions::cover::{CoverType, RangedCover};
use crate::moves::{CombatMove, MoveKind};
use crate::strategy::attack::usable_candidates;
use crate::strategy::mode::{ModeProfile, RangePreference};
use crate::strategy::{Battlefield, TwoStageSampler, MOVEMENT_DELAY, QUICK_ACTION_DELAY};

const BREAK_CLINCH_STAMINA: f64 = 5.0;
const BREAK_CLINCH_DELAY: f64 = 3.0;
/// Below this stamina fraction a swooper climbs away from its target
const SWOOP_WITHDRAW_STAMINA: f64 = 0.5;

pub fn choose(
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
    rng: &mut dyn RngCore,
) -> Option<CombatMove> {
    if let Some(mv) = break_clinch(actor, profile, settings, field, rng) {
        return Some(mv);
    }
    if profile.flees {
        return flee(actor, field);
    }
    if let Some(mv) = seek_cover(actor, profile, settings, field) {
        return Some(mv);
    }
    if let Some(mv) = change_layer(actor, profile, settings, field) {
        return Some(mv);
    }
    if profile.defensive_only || profile.counter_attacks_only {
        return None;
    }
    close_range(actor, profile, field)
}

pub(crate) fn movement(actor: &Combatant, kind: MoveKind, field: &Battlefield<'_>) -> Option<CombatMove> {
    let cost = field.config.movement_stamina_cost;
    actor
        .stamina
        .can_spend(cost)
        .then(|| CombatMove::new(actor.id, kind, cost, MOVEMENT_DELAY))
}

fn mobile(actor: &Combatant) -> bool {
    actor.position.can_move() && actor.body.can_walk()
}

/// Get out of a clinch the mode has no use for
fn break_clinch(
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
    rng: &mut dyn RngCore,
) -> Option<CombatMove> {
    let partner = actor.effects.clinching()?;
    if profile.initiates_clinch || profile.grapple.is_some() {
        return None;
    }
    let partner = field.combatant(partner)?;

    let strikes: Vec<_> = usable_candidates(actor, partner, profile, settings, field)
        .into_iter()
        .filter(|c| c.attack.kind == AttackKind::DisablingStrike)
        .collect();
    let sampler = TwoStageSampler::default();
    if let Some(strike) = sampler.sample(&strikes, |c| c.attack.weighting, |_| false, rng) {
        return Some(strike.clone().into_move(actor, partner));
    }
    actor.stamina.can_spend(BREAK_CLINCH_STAMINA).then(|| {
        CombatMove::new(
            actor.id,
            MoveKind::BreakClinch,
            BREAK_CLINCH_STAMINA,
            BREAK_CLINCH_DELAY,
        )
        .against(partner.id)
    })
}

pub(crate) fn flee(actor: &Combatant, field: &Battlefield<'_>) -> Option<CombatMove> {
    if !mobile(actor) {
        return None;
    }
    let threat = field
        .target_of(actor)
        .map_or(actor.location, |t| t.location);
    let to = field
        .terrain
        .step_away(actor.location, threat)
        .or_else(|| field.terrain.neighbours(actor.location).into_iter().next())?;
    movement(actor, MoveKind::Flee { to: Some(to) }, field)
}

/// How attractive a piece of cover is; zero means unusable
pub fn cover_fitness(
    cover: &RangedCover,
    actor: &Combatant,
    profile: &ModeProfile,
    field: &Battlefield<'_>,
) -> f64 {
    if actor.layer.is_airborne() {
        return 0.0;
    }
    if !cover.has_room(field.trackers.occupants(actor.location, cover.id)) {
        return 0.0;
    }
    if cover.blocks_own_fire && profile.uses_ranged {
        return 0.0;
    }
    let hardness = match cover.cover_type {
        CoverType::Hard => 1.0,
        CoverType::Soft => 0.6,
    };
    let mut fitness = cover.extent.difficulty_stages() as f64
        * hardness
        * (1.0 + profile.cover_bias)
        * field.config.cover_seeking_bias;
    if cover.position == PositionState::Prone {
        fitness *= 0.5;
    }
    fitness.max(0.0)
}

fn seek_cover(
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
) -> Option<CombatMove> {
    if !profile.seeks_cover || !settings.manage.seek_cover {
        return None;
    }
    if actor.cover.is_some() || actor.melee_range {
        return None;
    }
    let cover = best_cover(actor, profile, field)?;
    movement(actor, MoveKind::SeekCover { cover }, field)
}

/// The fittest cover at the actor's location, if any is usable
pub fn best_cover(
    actor: &Combatant,
    profile: &ModeProfile,
    field: &Battlefield<'_>,
) -> Option<RangedCover> {
    field
        .terrain
        .cover_at(actor.location)
        .into_iter()
        .map(|c| (cover_fitness(&c, actor, profile, field), c))
        .filter(|(fitness, _)| *fitness > 0.0)
        .max_by_key(|(fitness, _)| OrderedFloat(*fitness))
        .map(|(_, cover)| cover)
}

fn change_layer(
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
) -> Option<CombatMove> {
    let target = field.target_of(actor)?;
    if target.location != actor.location {
        return None;
    }
    let destination = if profile.swoops && actor.can_fly {
        if actor.stamina.fraction() < SWOOP_WITHDRAW_STAMINA && actor.layer == target.layer {
            actor.layer.step_towards(RoomLayer::HighInAir)
        } else {
            actor.layer.step_towards(target.layer)
        }
    } else if profile.range == RangePreference::Close && settings.manage.change_layer {
        actor.layer.step_towards(target.layer)
    } else {
        None
    }?;
    let reachable = field.terrain.layers_at(actor.location).contains(&destination);
    if !reachable || (destination.is_airborne() && !actor.can_fly) {
        return None;
    }
    movement(actor, MoveKind::ChangeLayer { to: destination }, field)
}

/// Effective reach of the wielded ranged weapon, zero without one
fn ranged_reach(actor: &Combatant, field: &Battlefield<'_>) -> u32 {
    actor
        .equipment
        .wielded_ranged()
        .map_or(0, |v| v.weapon.range.min(field.config.max_ranged_distance))
}

fn approach(actor: &Combatant, target: &Combatant, field: &Battlefield<'_>) -> Option<CombatMove> {
    if target.location == actor.location {
        if actor.layer == target.layer && !actor.melee_range {
            return Some(
                CombatMove::new(actor.id, MoveKind::Engage, 0.0, QUICK_ACTION_DELAY)
                    .against(target.id),
            );
        }
        return None;
    }
    if !mobile(actor) {
        return None;
    }
    let to = field.terrain.next_step(actor.location, target.location)?;
    movement(actor, MoveKind::Move { to }, field)
}

fn close_range(
    actor: &Combatant,
    profile: &ModeProfile,
    field: &Battlefield<'_>,
) -> Option<CombatMove> {
    let target = field.target_of(actor)?;
    match profile.range {
        RangePreference::Close => approach(actor, target, field),
        RangePreference::Hold => None,
        RangePreference::Distance => {
            if actor.equipment.wielded_ranged().is_none() {
                return approach(actor, target, field);
            }
            if target.location != actor.location || !mobile(actor) {
                return None;
            }
            let to = field.terrain.step_away(actor.location, target.location)?;
            movement(actor, MoveKind::Move { to }, field)
        }
        RangePreference::Advance => {
            let reach = ranged_reach(actor, field);
            let in_range = reach > 0
                && field
                    .terrain
                    .in_line_of_sight(actor.location, target.location, reach);
            if in_range && target.location != actor.location {
                None
            } else {
                approach(actor, target, field)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::StandardCheck;
    use crate::combatant::effects::Effect;
    use crate::core::config::EngineConfig;
    use crate::core::types::{CombatantId, DefinitionId, LocationId};
    use crate::definitions::cover::CoverExtent;
    use crate::strategy::mode::CombatStrategyMode;
    use crate::tracking::TrackerArena;
    use crate::world::{Location, LocationGraph};
    use ahash::AHashMap;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn cover(id: u32, extent: CoverExtent, cover_type: CoverType) -> RangedCover {
        RangedCover {
            id: DefinitionId(id),
            name: format!("cover {}", id),
            extent,
            cover_type,
            position: PositionState::Kneeling,
            max_occupants: 0,
            blocks_own_fire: false,
        }
    }

    fn terrain() -> LocationGraph {
        let mut graph = LocationGraph::new();
        graph.insert(
            Location::new(1, "courtyard")
                .with_cover(cover(1, CoverExtent::Partial, CoverType::Soft))
                .with_cover(cover(2, CoverExtent::Partial, CoverType::Hard))
                .with_layers(&[
                    RoomLayer::GroundLevel,
                    RoomLayer::InTrees,
                    RoomLayer::HighInTrees,
                    RoomLayer::InAir,
                    RoomLayer::HighInAir,
                ]),
        );
        graph.insert(Location::new(2, "gatehouse"));
        graph.insert(Location::new(3, "bridge"));
        graph.connect(LocationId(1), LocationId(2));
        graph.connect(LocationId(2), LocationId(3));
        graph
    }

    fn decide(actor: &Combatant, target: &Combatant, mode: CombatStrategyMode) -> Option<CombatMove> {
        let mut combatants = AHashMap::new();
        combatants.insert(target.id, target.clone());
        let terrain = terrain();
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
        let settings = CombatSettings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        choose(actor, &mode.profile(), &settings, &field, &mut rng)
    }

    fn pair(actor_at: u32, target_at: u32) -> (Combatant, Combatant) {
        let mut actor = Combatant::new(CombatantId(1), "actor", LocationId(actor_at));
        let target = Combatant::new(CombatantId(2), "target", LocationId(target_at)).with_side(1);
        actor.target = Some(target.id);
        (actor, target)
    }

    #[test]
    fn test_melee_closes_then_engages() {
        let (actor, target) = pair(1, 3);
        let mv = decide(&actor, &target, CombatStrategyMode::StandardMelee).unwrap();
        assert_eq!(mv.kind, MoveKind::Move { to: LocationId(2) });

        let (actor, target) = pair(3, 3);
        let mv = decide(&actor, &target, CombatStrategyMode::StandardMelee).unwrap();
        assert_eq!(mv.kind, MoveKind::Engage);

        let (mut actor, target) = pair(3, 3);
        actor.melee_range = true;
        assert!(decide(&actor, &target, CombatStrategyMode::StandardMelee).is_none());
    }

    #[test]
    fn test_ranged_prefers_hard_cover() {
        let (actor, target) = pair(1, 3);
        let mv = decide(&actor, &target, CombatStrategyMode::StandardRange).unwrap();
        match mv.kind {
            MoveKind::SeekCover { cover } => assert_eq!(cover.id, DefinitionId(2)),
            other => panic!("expected cover, got {:?}", other),
        }
        assert!(decide(&actor, &target, CombatStrategyMode::FireNoCover).is_none());
    }

    #[test]
    fn test_flee_steps_away() {
        let (actor, target) = pair(2, 3);
        let mv = decide(&actor, &target, CombatStrategyMode::Flee).unwrap();
        assert_eq!(mv.kind, MoveKind::Flee { to: Some(LocationId(1)) });
    }

    #[test]
    fn test_unwanted_clinch_is_broken() {
        let (mut actor, target) = pair(1, 1);
        actor.effects.add(Effect::Clinching { with: target.id });
        let mv = decide(&actor, &target, CombatStrategyMode::StandardMelee).unwrap();
        assert_eq!(mv.kind, MoveKind::BreakClinch);
        let mv = decide(&actor, &target, CombatStrategyMode::Clinch).unwrap();
        assert_ne!(mv.kind, MoveKind::BreakClinch);
    }

    #[test]
    fn test_swooper_rises_then_withdraws_when_tired() {
        let (mut actor, mut target) = pair(1, 1);
        actor.can_fly = true;
        target.layer = RoomLayer::InAir;
        target.can_fly = true;
        let mv = decide(&actor, &target, CombatStrategyMode::Swooper).unwrap();
        assert_eq!(mv.kind, MoveKind::ChangeLayer { to: RoomLayer::InTrees });

        actor.layer = RoomLayer::InAir;
        actor.stamina.current = 20.0;
        let mv = decide(&actor, &target, CombatStrategyMode::Swooper).unwrap();
        assert_eq!(mv.kind, MoveKind::ChangeLayer { to: RoomLayer::HighInAir });
    }
}
