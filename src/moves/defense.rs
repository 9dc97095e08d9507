//! Defensive responses and the checks behind them

use serde::{Deserialize, Serialize};

use crate::attacks::{AttackCategory, AttackKind, DefenseType};
use crate::check::Difficulty;
use crate::combatant::effects::EffectKind;
use crate::combatant::equipment::GearKind;
use crate::combatant::{trait_names, Combatant};
use crate::core::config::EngineConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::ItemId;
use crate::moves::kinds::{CombatMove, MoveKind};

/// A defender's answer to an incoming move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefenseMove {
    Block { shield: ItemId },
    Parry { weapon: ItemId },
    Dodge,
    /// Dodge against missiles
    RangedDodge,
    /// Wrestle back, or resist with willpower against psychic attacks
    Counter,
    /// Forced failure
    Helpless,
}

impl DefenseMove {
    pub fn defense_type(&self) -> DefenseType {
        match self {
            DefenseMove::Block { .. } => DefenseType::Block,
            DefenseMove::Parry { .. } => DefenseType::Parry,
            DefenseMove::Dodge | DefenseMove::RangedDodge => DefenseType::Dodge,
            DefenseMove::Counter => DefenseType::Counter,
            DefenseMove::Helpless => DefenseType::Helpless,
        }
    }

    pub fn stamina_cost(&self, config: &EngineConfig) -> f64 {
        match self {
            DefenseMove::Block { .. } => config.block_stamina_cost,
            DefenseMove::Parry { .. } => config.parry_stamina_cost,
            DefenseMove::Dodge => config.dodge_stamina_cost,
            DefenseMove::RangedDodge => config.ranged_dodge_stamina_cost,
            DefenseMove::Counter => config.grapple_counter_stamina_cost,
            DefenseMove::Helpless => 0.0,
        }
    }

    pub fn is_helpless(&self) -> bool {
        matches!(self, DefenseMove::Helpless)
    }
}

fn unhandled(defense: &DefenseMove, mv: &CombatMove) -> CombatError {
    CombatError::UnhandledMoveType(format!("{:?} against {}", defense, mv.kind.label()))
}

/// Trait value and difficulty of a defense against a move
///
/// `None` means the defense fails outright.
pub fn defense_check(
    defense: &DefenseMove,
    defender: &Combatant,
    mv: &CombatMove,
) -> Result<Option<(f64, Difficulty)>> {
    let ranged = match &mv.kind {
        MoveKind::Fire { dodge, block, .. } => Some((*dodge, *block)),
        MoveKind::Attack(_)
        | MoveKind::Grapple(_)
        | MoveKind::BreakClinch
        | MoveKind::Rescue { .. } => None,
        _ => return Err(unhandled(defense, mv)),
    };
    let attack = mv.attack().map(|a| &a.attack);

    let check = match defense {
        DefenseMove::Helpless => return Ok(None),
        DefenseMove::Block { shield } => {
            let Some(gear) = defender.equipment.item(*shield) else {
                return Ok(None);
            };
            let GearKind::Shield(shield_type) = &gear.kind else {
                return Err(unhandled(defense, mv));
            };
            let difficulty = match (attack, ranged) {
                (Some(a), _) => a.defense.block,
                (None, Some((_, block))) => block,
                (None, None) => return Err(unhandled(defense, mv)),
            };
            let value =
                defender.trait_value(&shield_type.skill) + shield_type.block_bonus + gear.quality;
            (value, difficulty)
        }
        DefenseMove::Parry { weapon } => {
            let (Some(a), None) = (attack, ranged) else {
                return Err(unhandled(defense, mv));
            };
            let Some(gear) = defender.equipment.item(*weapon) else {
                return Ok(None);
            };
            let GearKind::Melee(weapon_type) = &gear.kind else {
                return Err(unhandled(defense, mv));
            };
            let value =
                defender.trait_value(&weapon_type.skill) + weapon_type.parry_bonus + gear.quality;
            (value, a.defense.parry)
        }
        DefenseMove::Dodge => {
            if ranged.is_some() {
                return Err(unhandled(defense, mv));
            }
            let difficulty = attack.map_or(Difficulty::Normal, |a| a.defense.dodge);
            let difficulty = if defender.position.is_upright() {
                difficulty
            } else {
                difficulty.stage_up(1)
            };
            (defender.trait_value(trait_names::DODGE), difficulty)
        }
        DefenseMove::RangedDodge => {
            let Some((dodge, _)) = ranged else {
                return Err(unhandled(defense, mv));
            };
            let dodge = if defender.position.can_dodge() {
                dodge
            } else {
                Difficulty::Impossible
            };
            (defender.trait_value(trait_names::DODGE), dodge)
        }
        DefenseMove::Counter => match attack {
            Some(a) if a.category == AttackCategory::Psychic => {
                (defender.trait_value(trait_names::WILLPOWER), Difficulty::Normal)
            }
            Some(a) if a.kind != AttackKind::Clinch => return Err(unhandled(defense, mv)),
            _ if ranged.is_some() => return Err(unhandled(defense, mv)),
            _ => (
                defender.trait_value(trait_names::WRESTLING) + defender.power() / 10.0,
                Difficulty::Normal,
            ),
        },
    };

    let (value, difficulty) = check;
    let difficulty = if defender.effects.has(EffectKind::Unbalanced) {
        difficulty.stage_up(1)
    } else {
        difficulty
    };
    Ok(Some((value, difficulty)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attacks::WeaponAttack;
    use crate::combat::DamageType;
    use crate::combatant::effects::Effect;
    use crate::core::types::{CombatantId, DefinitionId, LocationId};
    use crate::formula::Formula;
    use crate::moves::kinds::AttackMove;

    fn punch(kind: AttackKind, category: AttackCategory) -> CombatMove {
        let attack = WeaponAttack::new(
            DefinitionId(1),
            "punch",
            DamageType::Crushing,
            Formula::constant(2.0),
        )
        .with_kind(kind)
        .with_category(category);
        CombatMove::new(
            CombatantId(1),
            MoveKind::Attack(AttackMove {
                attack,
                weapon: None,
                quality: 0.0,
                skill: "brawling".into(),
            }),
            5.0,
            3.0,
        )
        .against(CombatantId(2))
    }

    #[test]
    fn test_helpless_has_no_check() {
        let defender = Combatant::new(CombatantId(2), "d", LocationId(1));
        let mv = punch(AttackKind::Standard, AttackCategory::Natural);
        assert_eq!(defense_check(&DefenseMove::Helpless, &defender, &mv).unwrap(), None);
    }

    #[test]
    fn test_unbalanced_dodge_is_harder() {
        let mut defender =
            Combatant::new(CombatantId(2), "d", LocationId(1)).with_trait("dodge", 40.0);
        let mv = punch(AttackKind::Standard, AttackCategory::Natural);
        let steady = defense_check(&DefenseMove::Dodge, &defender, &mv).unwrap().unwrap();
        defender.effects.add(Effect::Unbalanced);
        let shaky = defense_check(&DefenseMove::Dodge, &defender, &mv).unwrap().unwrap();
        assert_eq!(steady.0, 40.0);
        assert!(shaky.1 > steady.1);
    }

    #[test]
    fn test_mismatched_defense_is_a_defect() {
        let defender = Combatant::new(CombatantId(2), "d", LocationId(1));
        let fire = CombatMove::new(
            CombatantId(1),
            MoveKind::Fire {
                weapon: ItemId(1),
                dodge: Difficulty::Hard,
                block: Difficulty::Normal,
            },
            1.0,
            3.0,
        )
        .against(CombatantId(2));
        let err = defense_check(&DefenseMove::Parry { weapon: ItemId(5) }, &defender, &fire)
            .unwrap_err();
        assert!(matches!(err, CombatError::UnhandledMoveType(_)));

        let stand = CombatMove::new(CombatantId(1), MoveKind::Stand, 0.0, 1.0);
        assert!(defense_check(&DefenseMove::Dodge, &defender, &stand).is_err());
    }

    #[test]
    fn test_counter_uses_willpower_against_psychic() {
        let defender = Combatant::new(CombatantId(2), "d", LocationId(1))
            .with_trait("willpower", 70.0)
            .with_trait("wrestling", 10.0);
        let mv = punch(AttackKind::Standard, AttackCategory::Psychic);
        let (value, _) = defense_check(&DefenseMove::Counter, &defender, &mv).unwrap().unwrap();
        assert_eq!(value, 70.0);
    }
}
