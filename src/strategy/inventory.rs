//! Inventory upkeep: recover lost gear and get weapons into hand

use crate::combatant::settings::CombatSettings;
use crate::combatant::Combatant;
use crate::core::types::ItemId;
use crate::moves::{CombatMove, MoveKind};
use crate::strategy::mode::ModeProfile;
use crate::strategy::QUICK_ACTION_DELAY;

fn quick(actor: &Combatant, kind: MoveKind) -> CombatMove {
    CombatMove::new(actor.id, kind, 0.0, QUICK_ACTION_DELAY)
}

/// Sheathed melee weapon to draw, preferred classification first
fn melee_to_draw(actor: &Combatant, settings: &CombatSettings) -> Option<ItemId> {
    let hands = actor.body.working_hands();
    let mut fitting = actor
        .equipment
        .sheathed_weapons()
        .filter(|(gear, _)| gear.hands() <= hands);
    match settings.preferred_weapon.as_deref() {
        Some(class) => {
            let all: Vec<_> = fitting.collect();
            all.iter()
                .find(|(_, w)| w.has_classification(class))
                .or_else(|| all.first())
                .map(|(gear, _)| gear.item)
        }
        None => fitting.next().map(|(gear, _)| gear.item),
    }
}

pub fn choose(
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
) -> Option<CombatMove> {
    let manage = &settings.manage;
    if manage.retrieve_lost_items {
        if let Some(item) = actor.equipment.favourite_lost() {
            return Some(quick(actor, MoveKind::Retrieve { item }));
        }
    }

    let hands = actor.body.working_hands();
    let equipment = &actor.equipment;
    let holding_ranged = equipment.wielded_ranged().is_some();
    if manage.wield_weapons {
        if profile.uses_ranged && !holding_ranged {
            let bow = equipment
                .unwielded_ranged()
                .filter(|id| equipment.item(*id).is_some_and(|g| g.hands() <= hands));
            if let Some(item) = bow {
                return Some(quick(actor, MoveKind::Wield { item }));
            }
        }
        if profile.melee_attacks && !holding_ranged && equipment.wielded_weapons().next().is_none() {
            if let Some(item) = melee_to_draw(actor, settings) {
                return Some(quick(actor, MoveKind::Wield { item }));
            }
        }
    }

    if manage.wield_shields && equipment.wielded_shield().is_none() && equipment.free_hands(hands) >= 1 {
        if let Some(item) = equipment.unwielded_shield() {
            return Some(quick(actor, MoveKind::Wield { item }));
        }
    }
    None
}
