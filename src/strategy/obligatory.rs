//! Moves that come before any tactical choice
//!
//! Waking up, carrying out an order the combatant was given by hand, getting
//! back on its feet and stepping in for a guarded ally.

use crate::combatant::effects::ManualAction;
use crate::combatant::settings::CombatSettings;
use crate::combatant::{CharacterState, Combatant};
use crate::moves::{CombatMove, MoveKind};
use crate::strategy::mode::ModeProfile;
use crate::strategy::{attack, positioning, Battlefield, QUICK_ACTION_DELAY};

const RESCUE_STAMINA: f64 = 5.0;
const RESCUE_DELAY: f64 = 3.0;

fn quick(actor: &Combatant, kind: MoveKind) -> CombatMove {
    CombatMove::new(actor.id, kind, 0.0, QUICK_ACTION_DELAY)
}

/// Turn an order into a move, if it can be carried out now
fn manual_move(
    action: &ManualAction,
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
) -> Option<CombatMove> {
    let mv = match action {
        ManualAction::Stand => quick(actor, MoveKind::Stand),
        ManualAction::Flee => positioning::flee(actor, field)?,
        ManualAction::SeekCover => {
            let cover = positioning::best_cover(actor, profile, field)?;
            positioning::movement(actor, MoveKind::SeekCover { cover }, field)?
        }
        ManualAction::Aim => {
            let target = field.target_of(actor)?;
            let weapon = actor.equipment.wielded_ranged()?.item;
            quick(actor, MoveKind::Aim { weapon }).against(target.id)
        }
        ManualAction::Attack { attack: name } => {
            let target = field.target_of(actor)?;
            // Orders override the mode's own restrictions on melee
            let permissive = ModeProfile {
                melee_attacks: true,
                initiates_clinch: true,
                ..*profile
            };
            attack::usable_candidates(actor, target, &permissive, settings, field)
                .into_iter()
                .find(|c| c.attack.name.eq_ignore_ascii_case(name))?
                .into_move(actor, target)
        }
    };
    Some(mv.manual())
}

/// Someone in melee with the actor who is going after its ward
fn threat_to_ward<'a>(actor: &Combatant, field: &Battlefield<'a>) -> Option<&'a Combatant> {
    let ward = actor.effects.guarding()?;
    field
        .combatants
        .values()
        .filter(|c| c.target == Some(ward) && c.melee_range && !c.is_incapacitated())
        .filter(|c| c.is_opponent_of(actor))
        .filter(|c| c.location == actor.location && c.layer == actor.layer)
        .min_by_key(|c| c.id)
}

pub fn choose(
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
) -> Option<CombatMove> {
    if actor.state == CharacterState::Sleeping {
        return Some(quick(actor, MoveKind::Wake));
    }
    if let Some(action) = actor.effects.pending_action() {
        if let Some(mv) = manual_move(action, actor, profile, settings, field) {
            return Some(mv);
        }
    }
    if !actor.position.is_upright()
        && actor.cover.is_none()
        && settings.manage.stand
        && actor.body.can_walk()
    {
        return Some(quick(actor, MoveKind::Stand));
    }
    if let Some(attacker) = threat_to_ward(actor, field) {
        let ally = actor.effects.guarding()?;
        return Some(
            CombatMove::new(
                actor.id,
                MoveKind::Rescue { ally },
                RESCUE_STAMINA,
                RESCUE_DELAY,
            )
            .against(attacker.id),
        );
    }
    None
}
