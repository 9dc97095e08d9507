//! Ranged sequence: ready, load, aim, fire

use crate::combatant::settings::CombatSettings;
use crate::combatant::Combatant;
use crate::moves::{CombatMove, MoveKind};
use crate::strategy::mode::ModeProfile;
use crate::strategy::{Battlefield, QUICK_ACTION_DELAY};

/// Next step of the ranged sequence against the actor's target
///
/// Returns `None` when there is no wielded ranged weapon, no ammunition left
/// or no clear shot.
///
/// Modes that only keep up fire still ready and load. Without a sequence
/// underway on the target they open one by aiming from cover, and stay
/// hidden when out of cover.
pub fn choose(
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
) -> Option<CombatMove> {
    let target = field.target_of(actor)?;
    let view = actor.equipment.wielded_ranged()?;
    let weapon = view.weapon;

    if weapon.requires_readying && !view.readied {
        if !settings.manage.ready_ranged {
            return None;
        }
        return Some(CombatMove::new(
            actor.id,
            MoveKind::Ready { weapon: view.item },
            0.0,
            weapon.ready_delay.max(QUICK_ACTION_DELAY),
        ));
    }

    if view.loaded.is_empty() {
        if actor.equipment.ammunition_available() == 0 {
            return None;
        }
        return Some(CombatMove::new(
            actor.id,
            MoveKind::Load { weapon: view.item },
            weapon.stamina_to_load,
            weapon.load_delay,
        ));
    }

    let range = weapon.range.min(field.config.max_ranged_distance);
    if !field
        .terrain
        .in_line_of_sight(actor.location, target.location, range)
    {
        return None;
    }
    if actor.melee_range && actor.location == target.location {
        return None;
    }
    if actor
        .cover
        .and_then(|id| field.trackers.cover(id))
        .is_some_and(|c| c.cover.blocks_own_fire)
    {
        return None;
    }

    let underway = actor.effects.firing_target() == Some(target.id);
    if profile.continue_firing_only && !underway && actor.cover.is_none() {
        return None;
    }
    let steady = field.aim_on(actor, target.id) >= field.config.fire_aim_threshold;
    let opening = profile.continue_firing_only && !underway;
    if opening || (profile.aims && !steady) {
        return Some(
            CombatMove::new(
                actor.id,
                MoveKind::Aim { weapon: view.item },
                0.0,
                QUICK_ACTION_DELAY,
            )
            .against(target.id),
        );
    }

    Some(
        CombatMove::new(
            actor.id,
            MoveKind::Fire {
                weapon: view.item,
                dodge: weapon.dodge_difficulty,
                block: weapon.block_difficulty,
            },
            weapon.stamina_to_fire,
            weapon.fire_delay,
        )
        .against(target.id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::StandardCheck;
    use crate::combatant::effects::Effect;
    use crate::combatant::equipment::{AmmoStack, Equipment, GearItem};
    use crate::combatant::state::PositionState;
    use crate::core::config::EngineConfig;
    use crate::core::types::{CombatantId, DefinitionId, ItemId, LocationId};
    use crate::definitions::cover::{CoverExtent, CoverType, RangedCover};
    use crate::definitions::weapons::{AmmunitionType, RangedWeaponType};
    use crate::strategy::mode::CombatStrategyMode;
    use crate::tracking::{Aim, CoverOccupation, TrackerArena};
    use crate::world::{Location, LocationGraph};
    use ahash::AHashMap;

    fn crossbow() -> RangedWeaponType {
        toml::from_str(
            r#"
            id = 1
            name = "crossbow"
            skill = "crossbows"
            ammunition_tag = "bolt"
            capacity = 1
            fire_difficulty = "Normal"
            aim_difficulty = "Easy"
            requires_readying = true
            range = 2
            hands = 2
            dodge_difficulty = "Hard"
            block_difficulty = "Normal"
            "#,
        )
        .unwrap()
    }

    fn wall() -> RangedCover {
        RangedCover {
            id: DefinitionId(3),
            name: "parapet".into(),
            extent: CoverExtent::Partial,
            cover_type: CoverType::Hard,
            position: PositionState::Kneeling,
            max_occupants: 0,
            blocks_own_fire: false,
        }
    }

    fn bolt() -> AmmunitionType {
        toml::from_str(
            r#"
            id = 2
            name = "bolt"
            tag = "bolt"
            damage_type = "Piercing"
            damage = "8"
            "#,
        )
        .unwrap()
    }

    fn shooter(rounds: u32) -> Combatant {
        let mut equipment = Equipment::new();
        let mut bow = GearItem::ranged(ItemId(7), crossbow(), 0.0);
        bow.wielded = true;
        equipment.carry(bow);
        equipment.ammunition.push(AmmoStack {
            ammunition: bolt(),
            quality: 0.0,
            count: rounds,
        });
        let mut actor = Combatant::new(CombatantId(1), "shooter", LocationId(1))
            .with_settings(CombatSettings::default())
            .with_equipment(equipment);
        actor.target = Some(CombatantId(2));
        actor
    }

    fn decide(actor: &Combatant, mode: CombatStrategyMode, trackers: &TrackerArena) -> Option<CombatMove> {
        let target = Combatant::new(CombatantId(2), "target", LocationId(2)).with_side(1);
        let mut combatants = AHashMap::new();
        combatants.insert(target.id, target);
        let mut terrain = LocationGraph::new();
        terrain.insert(Location::new(1, "wall"));
        terrain.insert(Location::new(2, "field"));
        terrain.connect(LocationId(1), LocationId(2));
        let config = EngineConfig::default();
        let evaluator = StandardCheck::new();
        let field = Battlefield {
            combatants: &combatants,
            terrain: &terrain,
            trackers,
            config: &config,
            evaluator: &evaluator,
        };
        let settings = CombatSettings::default();
        choose(actor, &mode.profile(), &settings, &field)
    }

    #[test]
    fn test_sequence_ready_load_aim_fire() {
        let trackers = TrackerArena::new();
        let mut actor = shooter(3);
        let mv = decide(&actor, CombatStrategyMode::StandardRange, &trackers).unwrap();
        assert!(matches!(mv.kind, MoveKind::Ready { .. }));

        actor.equipment.ready_ranged();
        let mv = decide(&actor, CombatStrategyMode::StandardRange, &trackers).unwrap();
        assert!(matches!(mv.kind, MoveKind::Load { .. }));

        actor.equipment.load_ranged();
        let mv = decide(&actor, CombatStrategyMode::StandardRange, &trackers).unwrap();
        assert!(matches!(mv.kind, MoveKind::Aim { .. }));
        assert_eq!(mv.target(), Some(CombatantId(2)));

        let mv = decide(&actor, CombatStrategyMode::CoveringFire, &trackers).unwrap();
        assert!(matches!(mv.kind, MoveKind::Fire { .. }));
    }

    #[test]
    fn test_fires_once_aim_is_steady() {
        let mut trackers = TrackerArena::new();
        let mut actor = shooter(1);
        actor.equipment.ready_ranged();
        actor.equipment.load_ranged();
        let mut aim = Aim::new(actor.id, CombatantId(2), ItemId(7));
        aim.improve(0.9);
        actor.aim = Some(trackers.begin_aim(aim));
        let mv = decide(&actor, CombatStrategyMode::StandardRange, &trackers).unwrap();
        match mv.kind {
            MoveKind::Fire { dodge, .. } => assert_eq!(dodge, crossbow().dodge_difficulty),
            other => panic!("expected fire, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_ammunition_gives_up() {
        let trackers = TrackerArena::new();
        let mut actor = shooter(0);
        actor.equipment.ready_ranged();
        assert!(decide(&actor, CombatStrategyMode::StandardRange, &trackers).is_none());
    }

    #[test]
    fn test_full_cover_prepares_but_stays_hidden_in_the_open() {
        let trackers = TrackerArena::new();
        let mut actor = shooter(2);
        let mv = decide(&actor, CombatStrategyMode::FullCover, &trackers).unwrap();
        assert!(matches!(mv.kind, MoveKind::Ready { .. }));
        actor.equipment.ready_ranged();
        let mv = decide(&actor, CombatStrategyMode::FullCover, &trackers).unwrap();
        assert!(matches!(mv.kind, MoveKind::Load { .. }));
        actor.equipment.load_ranged();
        assert!(decide(&actor, CombatStrategyMode::FullCover, &trackers).is_none());
    }

    #[test]
    fn test_full_cover_opens_with_aim_then_keeps_firing() {
        let mut trackers = TrackerArena::new();
        let mut actor = shooter(2);
        actor.equipment.ready_ranged();
        actor.equipment.load_ranged();
        actor.cover = Some(trackers.take_cover(CoverOccupation {
            occupant: actor.id,
            cover: wall(),
            location: LocationId(1),
        }));

        let mv = decide(&actor, CombatStrategyMode::FullCover, &trackers).unwrap();
        assert!(matches!(mv.kind, MoveKind::Aim { .. }));

        actor.effects.add(Effect::FiringInProgress {
            target: CombatantId(2),
        });
        let mut aim = Aim::new(actor.id, CombatantId(2), ItemId(7));
        aim.improve(1.0);
        actor.aim = Some(trackers.begin_aim(aim));
        let mv = decide(&actor, CombatStrategyMode::FullCover, &trackers).unwrap();
        assert!(matches!(mv.kind, MoveKind::Fire { .. }));
    }
}
