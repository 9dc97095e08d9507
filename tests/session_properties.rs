//! Property-based tests for session bookkeeping.
//!
//! Random rosters join each other in random order and fight for a while;
//! whatever happens, sessions must stay consistent with their members.

#![allow(missing_docs)]

use proptest::prelude::*;

use combat_engine::core::types::CombatantId;
use combat_engine::definitions::{parse_definitions, Definitions};
use combat_engine::session::{CombatEvent, Engine, SessionState};

const DUEL: &str = include_str!("../data/duel.toml");

fn definitions() -> Definitions {
    parse_definitions(DUEL).unwrap().definitions
}

/// `sides[i]` is the side of combatant `i + 1`; templates alternate
fn roster(defs: &Definitions, sides: &[u32], seed: u64) -> Engine {
    let mut engine = Engine::builder()
        .seed(seed)
        .terrain(defs.world())
        .build()
        .unwrap();
    for (index, side) in sides.iter().enumerate() {
        let template = &defs.combatants[index % defs.combatants.len()];
        let mut combatant = template
            .build(CombatantId(index as u64 + 1), defs)
            .unwrap();
        combatant.side = *side;
        engine.add_combatant(combatant);
    }
    engine
}

fn check_consistency(engine: &Engine) -> Result<(), TestCaseError> {
    let log = engine.events();
    for finished in engine.finished_sessions() {
        prop_assert_eq!(finished.state, SessionState::Destroyed);
        prop_assert_eq!(log.ends_of(finished.id), 1);
    }
    for live in engine.sessions() {
        prop_assert!(live.is_active());
        prop_assert_eq!(log.ends_of(live.id), 0);
        for member in live.members() {
            let combatant = engine.combatant(*member).unwrap();
            prop_assert_eq!(combatant.session, Some(live.id));
        }
    }
    for combatant in engine.combatants() {
        match combatant.session {
            Some(id) => {
                let live = engine.session(id);
                prop_assert!(live.is_some_and(|s| s.contains(combatant.id)));
                prop_assert_eq!(engine.sessions().filter(|s| s.contains(combatant.id)).count(), 1);
            }
            None => {
                prop_assert!(engine.sessions().all(|s| !s.contains(combatant.id)));
                prop_assert!(engine.next_turn(combatant.id).is_none());
            }
        }
    }
    let merged = log.count(|e| matches!(e, CombatEvent::CombatMerged { .. }));
    let started = log.count(|e| matches!(e, CombatEvent::CombatStarted { .. }));
    prop_assert_eq!(started, merged + engine.finished_sessions().len() + engine.sessions().count());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Sessions stay consistent while rosters join, merge and fight.
    #[test]
    fn prop_sessions_consistent(
        sides in proptest::collection::vec(0u32..3, 2..6),
        joins in proptest::collection::vec((0usize..6, 0usize..6), 1..8),
        seed in any::<u64>(),
        seconds in 0.0f64..300.0,
    ) {
        let defs = definitions();
        let mut engine = roster(&defs, &sides, seed);
        let n = sides.len();
        for (a, b) in joins {
            let (a, b) = (a % n, b % n);
            if a == b {
                continue;
            }
            let _ = engine.join_combat(CombatantId(a as u64 + 1), CombatantId(b as u64 + 1));
            check_consistency(&engine)?;
        }
        engine.run_until(seconds).unwrap();
        check_consistency(&engine)?;
    }

    /// Leaving never produces a second end for the same session.
    #[test]
    fn prop_leaving_ends_once(
        seed in any::<u64>(),
        leaver in 0u64..4,
    ) {
        let defs = definitions();
        let mut engine = roster(&defs, &[0, 1, 0, 1], seed);
        let first = engine.join_combat(CombatantId(1), CombatantId(2)).unwrap();
        engine.join_combat(CombatantId(3), CombatantId(4)).unwrap();
        engine.join_combat(CombatantId(4), CombatantId(1)).unwrap();
        engine.run_until(20.0).unwrap();

        for id in 1..=4u64 {
            engine.leave_combat(CombatantId((leaver + id) % 4 + 1)).unwrap();
            check_consistency(&engine)?;
        }
        prop_assert!(engine.sessions().next().is_none());
        prop_assert!(engine.events().ends_of(first) <= 1);
    }
}
