//! Choosing a defense against an incoming move

use ordered_float::OrderedFloat;

use crate::attacks::{AttackCategory, AttackKind};
use crate::combatant::effects::EffectKind;
use crate::combatant::settings::GrappleResponse;
use crate::combatant::stamina::StaminaLedger;
use crate::combatant::Combatant;
use crate::moves::{defense_check, CombatMove, DefenseMove, MoveKind};
use crate::strategy::Battlefield;

/// Defenses that make sense against this kind of move, before stamina
fn options(mv: &CombatMove, defender: &Combatant) -> Vec<DefenseMove> {
    let shield = defender
        .equipment
        .wielded_shield()
        .map(|(gear, _)| DefenseMove::Block { shield: gear.item });
    let can_dodge = defender.position.can_dodge();
    let grapple_answer = || match defender
        .settings
        .as_ref()
        .map(|s| s.grapple_response)
        .unwrap_or_default()
    {
        GrappleResponse::Counter => vec![DefenseMove::Counter],
        GrappleResponse::Avoid if can_dodge => vec![DefenseMove::Dodge],
        GrappleResponse::Avoid | GrappleResponse::Ignore => Vec::new(),
    };

    match &mv.kind {
        MoveKind::Grapple(_) | MoveKind::BreakClinch => grapple_answer(),
        MoveKind::Rescue { .. } if can_dodge => vec![DefenseMove::Dodge],
        MoveKind::Rescue { .. } => Vec::new(),
        MoveKind::Fire { .. } => {
            let mut options: Vec<DefenseMove> = shield.into_iter().collect();
            if can_dodge {
                options.push(DefenseMove::RangedDodge);
            }
            options
        }
        MoveKind::Attack(attack) if attack.attack.kind == AttackKind::Clinch => grapple_answer(),
        MoveKind::Attack(attack) => match attack.attack.category {
            AttackCategory::Psychic => vec![DefenseMove::Counter],
            AttackCategory::Magic => {
                let mut options: Vec<DefenseMove> = shield.into_iter().collect();
                if can_dodge {
                    options.push(DefenseMove::Dodge);
                }
                options
            }
            _ => {
                let mut options: Vec<DefenseMove> = shield.into_iter().collect();
                options.extend(
                    defender
                        .equipment
                        .wielded_weapons()
                        .map(|(gear, _)| DefenseMove::Parry { weapon: gear.item }),
                );
                if can_dodge {
                    options.push(DefenseMove::Dodge);
                }
                options
            }
        },
        _ => Vec::new(),
    }
}

/// Pick the defense most likely to succeed, honouring a preferred type
pub fn respond(
    mv: &CombatMove,
    defender: &Combatant,
    _assailant: &Combatant,
    field: &Battlefield<'_>,
) -> DefenseMove {
    let config = field.config;
    if defender.is_helpless()
        || !defender.can_act()
        || defender.stamina.current() < config.helpless_stamina_floor
        || defender.effects.has(EffectKind::BlocksCombat)
    {
        return DefenseMove::Helpless;
    }

    let affordable: Vec<(DefenseMove, f64)> = options(mv, defender)
        .into_iter()
        .filter(|d| defender.stamina.can_spend(d.stamina_cost(config)))
        .filter_map(|d| match defense_check(&d, defender, mv) {
            Ok(Some((value, difficulty))) => {
                Some((d, field.evaluator.success_chance(value, difficulty)))
            }
            _ => None,
        })
        .collect();

    let preferred = defender.settings.as_ref().and_then(|s| s.preferred_defense);
    if let Some(preferred) = preferred {
        if let Some((defense, _)) = affordable
            .iter()
            .find(|(d, _)| d.defense_type() == preferred)
        {
            return *defense;
        }
    }
    affordable
        .into_iter()
        .max_by_key(|(_, chance)| OrderedFloat(*chance))
        .map_or(DefenseMove::Helpless, |(d, _)| d)
}
