//! Strategy integration tests
//!
//! Decisions made by the staged strategy for combatants built from a
//! definitions document, and the defenses their opponents pick.

use ahash::AHashMap;
use combat_engine::check::StandardCheck;
use combat_engine::combatant::{CharacterState, Combatant, PositionState};
use combat_engine::core::config::EngineConfig;
use combat_engine::core::types::CombatantId;
use combat_engine::definitions::{parse_definitions, Definitions};
use combat_engine::moves::{CombatMove, DefenseMove, MoveKind};
use combat_engine::strategy::{Battlefield, StagedStrategy, Strategy};
use combat_engine::tracking::TrackerArena;
use combat_engine::world::LocationGraph;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const DUEL: &str = include_str!("../data/duel.toml");

struct Scene {
    combatants: AHashMap<CombatantId, Combatant>,
    terrain: LocationGraph,
    trackers: TrackerArena,
    config: EngineConfig,
    evaluator: StandardCheck,
}

impl Scene {
    fn new(defs: &Definitions, fighters: Vec<Combatant>) -> Self {
        Self {
            combatants: fighters.into_iter().map(|c| (c.id, c)).collect(),
            terrain: defs.world(),
            trackers: TrackerArena::new(),
            config: EngineConfig::default(),
            evaluator: StandardCheck::new(),
        }
    }

    fn field(&self) -> Battlefield<'_> {
        Battlefield {
            combatants: &self.combatants,
            terrain: &self.terrain,
            trackers: &self.trackers,
            config: &self.config,
            evaluator: &self.evaluator,
        }
    }

    fn get(&self, id: u64) -> &Combatant {
        &self.combatants[&CombatantId(id)]
    }

    fn decide(&self, id: u64, seed: u64) -> Option<CombatMove> {
        let actor = self.get(id);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        StagedStrategy::for_mode(actor.mode).choose_move(actor, &self.field(), &mut rng)
    }

    fn respond(&self, mv: &CombatMove, defender: u64) -> DefenseMove {
        let defender = self.get(defender);
        let assailant = self.get(mv.assailant.0);
        StagedStrategy::for_mode(defender.mode).response_to_move(mv, defender, assailant, &self.field())
    }
}

/// Sellsword (1) and hound (2), each targeting the other
fn duel(in_melee: bool) -> (Definitions, Vec<Combatant>) {
    let defs = parse_definitions(DUEL).unwrap().definitions;
    let mut sellsword = defs.combatants[0].build(CombatantId(1), &defs).unwrap();
    let mut hound = defs.combatants[1].build(CombatantId(2), &defs).unwrap();
    sellsword.target = Some(hound.id);
    hound.target = Some(sellsword.id);
    sellsword.melee_range = in_melee;
    hound.melee_range = in_melee;
    (defs, vec![sellsword, hound])
}

#[test]
fn test_closes_before_striking() {
    let (defs, fighters) = duel(false);
    let scene = Scene::new(&defs, fighters);
    let mv = scene.decide(1, 1).expect("sellsword acts");
    assert_eq!(mv.kind, MoveKind::Engage);
    assert_eq!(mv.target(), Some(CombatantId(2)));
}

#[test]
fn test_swordsman_only_uses_the_sword() {
    let (defs, fighters) = duel(true);
    let scene = Scene::new(&defs, fighters);
    let wielded = scene
        .get(1)
        .equipment
        .wielded_weapons()
        .map(|(gear, _)| gear.item)
        .next();
    for seed in 0..40 {
        let mv = scene.decide(1, seed).expect("sellsword attacks");
        let attack = mv.attack().expect("an attack");
        assert!(["cut", "thrust"].contains(&attack.attack.name.as_str()));
        assert_eq!(attack.weapon, wielded);
        assert_eq!(mv.target(), Some(CombatantId(2)));
    }
}

#[test]
fn test_beast_only_uses_natural_attacks() {
    let (defs, fighters) = duel(true);
    let scene = Scene::new(&defs, fighters);
    for seed in 0..40 {
        let mv = scene.decide(2, seed).expect("hound attacks");
        let attack = mv.attack().expect("an attack");
        assert!(["bite", "pounce"].contains(&attack.attack.name.as_str()));
        assert!(attack.weapon.is_none());
    }
}

#[test]
fn test_sleeper_wakes_and_cannot_defend() {
    let (defs, mut fighters) = duel(true);
    fighters[1].state = CharacterState::Sleeping;
    let scene = Scene::new(&defs, fighters);

    assert_eq!(scene.decide(2, 1).map(|mv| mv.kind), Some(MoveKind::Wake));

    let swing = scene.decide(1, 1).unwrap();
    assert_eq!(scene.respond(&swing, 2), DefenseMove::Helpless);
}

#[test]
fn test_armed_defender_parries_or_dodges() {
    let (defs, fighters) = duel(true);
    let scene = Scene::new(&defs, fighters);
    let bite = scene.decide(2, 3).unwrap();
    match scene.respond(&bite, 1) {
        DefenseMove::Parry { .. } | DefenseMove::Dodge => {}
        other => panic!("unexpected defense {:?}", other),
    }
}

#[test]
fn test_unarmed_beast_dodges() {
    let (defs, fighters) = duel(true);
    let scene = Scene::new(&defs, fighters);
    let swing = scene.decide(1, 5).unwrap();
    assert_eq!(scene.respond(&swing, 2), DefenseMove::Dodge);
}

#[test]
fn test_prone_defender_cannot_dodge() {
    let (defs, mut fighters) = duel(true);
    fighters[1].position = PositionState::Prone;
    let scene = Scene::new(&defs, fighters);
    let swing = scene.decide(1, 5).unwrap();
    assert_eq!(scene.respond(&swing, 2), DefenseMove::Helpless);
}

#[test]
fn test_no_settings_no_moves() {
    let (defs, mut fighters) = duel(true);
    fighters[0].settings = None;
    let scene = Scene::new(&defs, fighters);
    assert!(scene.decide(1, 1).is_none());
}
