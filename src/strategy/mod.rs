//! Strategy engine
//!
//! One staged pipeline serves every mode. `choose_move` runs the stages in a
//! fixed order and takes the first move any of them proposes:
//!
//! 1. stoppers: blocking effects, missing settings, mid-movement, unable to act
//! 2. obligatory: wake, manual actions, stand, rescue a guarded ally
//! 3. inventory: retrieve a lost favourite, wield weapons and shields
//! 4. positioning: break clinch, flee, cover, range, layer
//! 5. attack: ranged sequence, grapple, clinch, weighted attack roll
//!
//! Modes differ only in the [`ModeProfile`] data the stages read.

pub mod attack;
pub mod grapple;
pub mod inventory;
pub mod mode;
pub mod obligatory;
pub mod positioning;
pub mod ranged;
pub mod response;
pub mod sampler;

use std::collections::BTreeSet;

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use rand::RngCore;
use tracing::trace;

use crate::check::CheckEvaluator;
use crate::combatant::effects::EffectKind;
use crate::combatant::stamina::StaminaLedger;
use crate::combatant::Combatant;
use crate::core::config::EngineConfig;
use crate::core::types::{CombatantId, Seconds};
use crate::moves::{CombatMove, DefenseMove};
use crate::tracking::TrackerArena;
use crate::world::Terrain;

pub use mode::{CombatStrategyMode, GrappleGoal, ModeProfile, RangePreference};
pub use sampler::TwoStageSampler;

/// Delay after wielding, standing, readying and similar quick actions
pub const QUICK_ACTION_DELAY: Seconds = 1.5;
/// Delay after moving between locations, layers or into cover
pub const MOVEMENT_DELAY: Seconds = 3.0;

/// Read-only view of the fight a strategy decides against
pub struct Battlefield<'a> {
    pub combatants: &'a AHashMap<CombatantId, Combatant>,
    pub terrain: &'a dyn Terrain,
    pub trackers: &'a TrackerArena,
    pub config: &'a EngineConfig,
    pub evaluator: &'a dyn CheckEvaluator,
}

impl<'a> Battlefield<'a> {
    pub fn combatant(&self, id: CombatantId) -> Option<&'a Combatant> {
        self.combatants.get(&id)
    }

    pub fn target_of(&self, actor: &Combatant) -> Option<&'a Combatant> {
        actor.target.and_then(|id| self.combatant(id))
    }

    /// Aim percentage the actor holds on a target, zero without an aim
    pub fn aim_on(&self, actor: &Combatant, target: CombatantId) -> f64 {
        actor
            .aim
            .and_then(|id| self.trackers.aim(id))
            .filter(|a| a.target == target)
            .map_or(0.0, |a| a.percentage.value())
    }
}

/// Policy choosing moves and responses for one mode
pub trait Strategy {
    fn mode(&self) -> CombatStrategyMode;

    /// Next move, or `None` to idle
    fn choose_move(
        &self,
        actor: &Combatant,
        field: &Battlefield<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<CombatMove>;

    /// Defense against an incoming move
    fn response_to_move(
        &self,
        mv: &CombatMove,
        defender: &Combatant,
        assailant: &Combatant,
        field: &Battlefield<'_>,
    ) -> DefenseMove;
}

/// The staged pipeline tuned by a mode profile
#[derive(Debug, Clone, Copy)]
pub struct StagedStrategy {
    pub profile: ModeProfile,
    pub sampler: TwoStageSampler,
}

impl StagedStrategy {
    pub fn for_mode(mode: CombatStrategyMode) -> Self {
        Self {
            profile: mode.profile(),
            sampler: TwoStageSampler::default(),
        }
    }
}

/// Conditions under which no move is ever produced
pub fn stopped(actor: &Combatant) -> bool {
    actor.effects.has(EffectKind::BlocksCombat)
        || actor.settings.is_none()
        || actor.in_transit
        || actor.is_incapacitated()
}

impl Strategy for StagedStrategy {
    fn mode(&self) -> CombatStrategyMode {
        self.profile.mode
    }

    fn choose_move(
        &self,
        actor: &Combatant,
        field: &Battlefield<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<CombatMove> {
        if stopped(actor) {
            return None;
        }
        let settings = actor.settings.as_ref()?;
        let profile = &self.profile;

        let chosen = obligatory::choose(actor, profile, settings, field)
            .map(|mv| ("obligatory", mv))
            .or_else(|| inventory::choose(actor, profile, settings).map(|mv| ("inventory", mv)));
        let chosen = match chosen {
            Some(found) => Some(found),
            None => match positioning::choose(actor, profile, settings, field, rng) {
                Some(mv) => Some(("positioning", mv)),
                None => attack::choose(actor, profile, settings, field, &self.sampler, rng)
                    .map(|mv| ("attack", mv)),
            },
        };

        let (stage, mv) = chosen?;
        if !actor.stamina.can_spend(mv.stamina_cost) {
            return None;
        }
        trace!(combatant = %actor.id, stage, action = %mv.describe(), "move chosen");
        Some(mv)
    }

    fn response_to_move(
        &self,
        mv: &CombatMove,
        defender: &Combatant,
        assailant: &Combatant,
        field: &Battlefield<'_>,
    ) -> DefenseMove {
        response::respond(mv, defender, assailant, field)
    }
}

/// Mode the combatant should be in right now
pub fn desired_mode(actor: &Combatant) -> CombatStrategyMode {
    let Some(settings) = actor.settings.as_ref() else {
        return actor.mode;
    };
    match settings.flee_below_health {
        Some(threshold) if actor.body.health_fraction() < threshold => CombatStrategyMode::Flee,
        _ => settings.mode,
    }
}

/// Pick a target among a session's members
///
/// Opponents still able to fight come first; among those, ones already
/// attacking the actor, then the nearest reachable. A helpless opponent is
/// picked only when nobody else is left. The dead are never picked.
pub fn acquire_target(
    actor: &Combatant,
    pool: &BTreeSet<CombatantId>,
    field: &Battlefield<'_>,
) -> Option<CombatantId> {
    pool.iter()
        .filter_map(|id| field.combatant(*id))
        .filter(|c| actor.is_opponent_of(c) && !c.is_dead())
        .filter_map(|c| {
            let distance = field.terrain.distance(actor.location, c.location)?;
            let attacking_me = c.target == Some(actor.id);
            let key = (
                c.is_incapacitated(),
                !attacking_me,
                distance,
                OrderedFloat(c.body.health_fraction()),
            );
            Some((c.id, key))
        })
        .min_by_key(|(_, key)| *key)
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::StandardCheck;
    use crate::combatant::effects::Effect;
    use crate::combatant::settings::CombatSettings;
    use crate::combatant::state::CharacterState;
    use crate::core::types::LocationId;
    use crate::world::{Location, LocationGraph};

    fn world() -> LocationGraph {
        let mut world = LocationGraph::new();
        world.insert(Location::new(1, "hall"));
        world.insert(Location::new(2, "stair"));
        world.insert(Location::new(3, "tower"));
        world.connect(LocationId(1), LocationId(2));
        world.connect(LocationId(2), LocationId(3));
        world
    }

    fn at(id: u64, side: u32, location: u32) -> Combatant {
        Combatant::new(CombatantId(id), format!("c{}", id), LocationId(location))
            .with_side(side)
            .with_settings(CombatSettings::default())
    }

    #[test]
    fn test_acquire_prefers_attackers_then_nearest() {
        let mut combatants = AHashMap::new();
        let me = at(1, 0, 1);
        let near = at(2, 1, 1);
        let mut far = at(3, 1, 3);
        combatants.insert(me.id, me.clone());
        combatants.insert(near.id, near);
        combatants.insert(CombatantId(4), at(4, 0, 1));
        let terrain = world();
        let trackers = TrackerArena::new();
        let config = EngineConfig::default();
        let evaluator = StandardCheck::new();
        let pool: BTreeSet<CombatantId> = [1, 2, 3, 4].into_iter().map(CombatantId).collect();

        combatants.insert(far.id, far.clone());
        {
            let field = Battlefield {
                combatants: &combatants,
                terrain: &terrain,
                trackers: &trackers,
                config: &config,
                evaluator: &evaluator,
            };
            assert_eq!(acquire_target(&me, &pool, &field), Some(CombatantId(2)));
        }

        far.target = Some(CombatantId(1));
        combatants.insert(far.id, far);
        let field = Battlefield {
            combatants: &combatants,
            terrain: &terrain,
            trackers: &trackers,
            config: &config,
            evaluator: &evaluator,
        };
        assert_eq!(acquire_target(&me, &pool, &field), Some(CombatantId(3)));
    }

    #[test]
    fn test_acquire_falls_back_to_helpless() {
        let mut combatants = AHashMap::new();
        let me = at(1, 0, 1);
        let mut sleeper = at(2, 1, 1);
        sleeper.state = CharacterState::Unconscious;
        let mut corpse = at(3, 1, 1);
        corpse.state = CharacterState::Dead;
        combatants.insert(me.id, me.clone());
        combatants.insert(sleeper.id, sleeper);
        combatants.insert(corpse.id, corpse);
        let terrain = world();
        let trackers = TrackerArena::new();
        let config = EngineConfig::default();
        let evaluator = StandardCheck::new();
        let pool: BTreeSet<CombatantId> = [1, 2, 3].into_iter().map(CombatantId).collect();
        {
            let field = Battlefield {
                combatants: &combatants,
                terrain: &terrain,
                trackers: &trackers,
                config: &config,
                evaluator: &evaluator,
            };
            assert_eq!(acquire_target(&me, &pool, &field), Some(CombatantId(2)));
        }

        combatants.insert(CombatantId(4), at(4, 1, 3));
        let pool: BTreeSet<CombatantId> = [1, 2, 3, 4].into_iter().map(CombatantId).collect();
        let field = Battlefield {
            combatants: &combatants,
            terrain: &terrain,
            trackers: &trackers,
            config: &config,
            evaluator: &evaluator,
        };
        assert_eq!(acquire_target(&me, &pool, &field), Some(CombatantId(4)));
    }

    #[test]
    fn test_stoppers() {
        let mut actor = at(1, 0, 1);
        assert!(!stopped(&actor));
        actor.effects.add(Effect::BlocksCombat {
            reason: "paralysing venom".into(),
        });
        assert!(stopped(&actor));

        let bare = Combatant::new(CombatantId(2), "bare", LocationId(1));
        assert!(stopped(&bare));
    }

    #[test]
    fn test_flee_below_health() {
        let mut actor = at(1, 0, 1);
        if let Some(settings) = actor.settings.as_mut() {
            settings.flee_below_health = Some(0.5);
        }
        assert_eq!(desired_mode(&actor), CombatStrategyMode::StandardMelee);
        actor.body.limbs[2].damage = 60.0;
        assert_eq!(desired_mode(&actor), CombatStrategyMode::Flee);
    }
}
