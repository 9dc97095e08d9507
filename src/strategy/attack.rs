//! Attack selection
//!
//! Ranged modes run the ranged sequence first and grappling modes hand off to
//! grapple escalation. Everything else gathers the attacks the combatant could
//! make right now, rolls a category band from its settings, then samples an
//! attack within the category.

use rand::RngCore;

use crate::attacks::{AttackCategory, AttackKind, WeaponAttack};
use crate::combatant::settings::CombatSettings;
use crate::combatant::stamina::StaminaLedger;
use crate::combatant::{trait_names, Combatant};
use crate::core::types::ItemId;
use crate::definitions::weapons::WeaponType;
use crate::moves::{AttackMove, CombatMove, MoveKind};
use crate::strategy::mode::ModeProfile;
use crate::strategy::sampler::{roll_category, TwoStageSampler};
use crate::strategy::{grapple, ranged, Battlefield};

/// An attack the combatant could make, with what it would be made with
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub attack: &'a WeaponAttack,
    pub weapon: Option<ItemId>,
    pub weapon_type: Option<&'a WeaponType>,
    pub quality: f64,
    pub skill: &'a str,
}

impl Candidate<'_> {
    pub fn into_move(self, actor: &Combatant, target: &Combatant) -> CombatMove {
        CombatMove::new(
            actor.id,
            MoveKind::Attack(AttackMove {
                attack: self.attack.clone(),
                weapon: self.weapon,
                quality: self.quality,
                skill: self.skill.to_string(),
            }),
            self.attack.stamina_cost,
            self.attack.base_delay,
        )
        .against(target.id)
        .with_recovery(self.attack.recovery_difficulty)
    }
}

/// Every attack the combatant has, usable or not
pub fn all_candidates(actor: &Combatant) -> Vec<Candidate<'_>> {
    let mut candidates = Vec::new();
    for (gear, weapon) in actor.equipment.wielded_weapons() {
        candidates.extend(
            weapon
                .attacks
                .iter()
                .filter(|a| a.handedness.permits(gear.hands()))
                .map(|attack| Candidate {
                    attack,
                    weapon: Some(gear.item),
                    weapon_type: Some(weapon),
                    quality: gear.quality,
                    skill: &weapon.skill,
                }),
        );
    }
    candidates.extend(
        actor
            .natural_attacks
            .iter()
            .filter(|n| actor.body.first_of_kind(n.limb).is_some())
            .map(|n| Candidate {
                attack: &n.attack,
                weapon: None,
                weapon_type: None,
                quality: n.quality,
                skill: trait_names::BRAWLING,
            }),
    );
    candidates.extend(actor.powers.iter().map(|attack| Candidate {
        attack,
        weapon: None,
        weapon_type: None,
        quality: 0.0,
        skill: trait_names::WILLPOWER,
    }));
    candidates.extend(actor.auxiliary.iter().map(|attack| Candidate {
        attack,
        weapon: None,
        weapon_type: None,
        quality: 0.0,
        skill: trait_names::ATHLETICS,
    }));
    candidates
}

fn at_range(category: AttackCategory) -> bool {
    matches!(category, AttackCategory::Magic | AttackCategory::Psychic)
}

/// Can this candidate be used against the target right now?
fn usable(
    candidate: &Candidate<'_>,
    actor: &Combatant,
    target: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
) -> bool {
    let attack = candidate.attack;
    if !actor.stamina.can_spend(attack.stamina_cost)
        || !settings.intentions.permits(attack.intentions)
        || !attack.usable_from(actor.position)
    {
        return false;
    }
    if !profile.melee_attacks && !at_range(attack.category) {
        return false;
    }
    if at_range(attack.category) {
        let reach = field.config.max_ranged_distance;
        if !field
            .terrain
            .in_line_of_sight(actor.location, target.location, reach)
        {
            return false;
        }
    } else if actor.location != target.location || actor.layer != target.layer {
        return false;
    }

    let clinching = actor.effects.clinching().is_some();
    if clinching && !attack.kind.usable_in_clinch() && attack.category != AttackCategory::Natural {
        return false;
    }
    let kind_allowed = match attack.kind {
        AttackKind::Clinch => profile.initiates_clinch && !clinching,
        AttackKind::CoupDeGrace => target.is_helpless(),
        AttackKind::Disarm => target.equipment.wielded_weapons().next().is_some(),
        AttackKind::DisablingStrike => clinching,
        _ => true,
    };
    if !kind_allowed {
        return false;
    }

    if settings.require_preferred_weapon {
        if let Some(class) = settings.preferred_weapon.as_deref() {
            return candidate
                .weapon_type
                .is_some_and(|w| w.has_classification(class));
        }
    }
    true
}

/// Attacks usable against the target right now
pub fn usable_candidates<'a>(
    actor: &'a Combatant,
    target: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
) -> Vec<Candidate<'a>> {
    all_candidates(actor)
        .into_iter()
        .filter(|c| usable(c, actor, target, profile, settings, field))
        .collect()
}

pub fn choose(
    actor: &Combatant,
    profile: &ModeProfile,
    settings: &CombatSettings,
    field: &Battlefield<'_>,
    sampler: &TwoStageSampler,
    rng: &mut dyn RngCore,
) -> Option<CombatMove> {
    if profile.defensive_only {
        return None;
    }
    // Ward only strikes back at someone already engaging it
    if profile.counter_attacks_only && !actor.melee_range {
        return None;
    }
    if actor.stamina.current() < settings.minimum_stamina_to_attack {
        return None;
    }
    let target = field.target_of(actor)?;
    if target.is_dead() {
        return None;
    }

    if profile.uses_ranged {
        if let Some(mv) = ranged::choose(actor, profile, settings, field) {
            return Some(mv);
        }
    }
    if let Some(goal) = profile.grapple {
        return grapple::choose(actor, goal, field, rng);
    }

    let candidates = usable_candidates(actor, target, profile, settings, field);
    if candidates.is_empty() {
        return None;
    }

    if profile.initiates_clinch && actor.effects.clinching().is_none() {
        let clinches: Vec<Candidate<'_>> = candidates
            .iter()
            .filter(|c| c.attack.kind == AttackKind::Clinch)
            .cloned()
            .collect();
        if let Some(pick) = sampler.sample(
            &clinches,
            |c| c.attack.weighting,
            |c| settings.intentions.prefers(c.attack.intentions),
            rng,
        ) {
            return Some(pick.clone().into_move(actor, target));
        }
    }

    let category = roll_category(
        &settings.band_order(),
        &settings.weights,
        |category| candidates.iter().any(|c| c.attack.category == category),
        rng,
    )?;
    let pool: Vec<Candidate<'_>> = candidates
        .into_iter()
        .filter(|c| c.attack.category == category)
        .collect();
    sampler
        .sample(
            &pool,
            |c| c.attack.weighting,
            |c| settings.intentions.prefers(c.attack.intentions),
            rng,
        )
        .map(|pick| pick.clone().into_move(actor, target))
}
