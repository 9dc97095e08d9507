//! Strategy modes
//!
//! A mode is a tag selecting a [`ModeProfile`]: plain data describing which
//! decision stages run and how they are tuned. There is no per-mode type.

use serde::{Deserialize, Serialize};

/// The policy a combatant fights with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CombatStrategyMode {
    #[default]
    StandardMelee,
    FullDefense,
    Ward,
    Clinch,
    GrappleForControl,
    GrappleForIncapacitation,
    GrappleForKill,
    Flee,
    Skirmish,
    Swooper,
    StandardRange,
    FullCover,
    CoveringFire,
    FireAndAdvance,
    FireNoCover,
    FullAdvance,
    MeleeShooter,
}

/// How far a grappling mode pushes once it has control
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrappleGoal {
    Control,
    Incapacitate,
    Kill,
}

/// Preferred distance to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangePreference {
    /// Close to melee
    Close,
    /// Hold position and shoot
    Hold,
    /// Keep out of melee, stay in shooting range
    Distance,
    /// Close while shooting
    Advance,
}

/// Data describing how a mode behaves
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModeProfile {
    pub mode: CombatStrategyMode,
    pub range: RangePreference,
    pub uses_ranged: bool,
    pub melee_attacks: bool,
    pub seeks_cover: bool,
    /// Bias added to cover fitness; higher means cover at almost any cost
    pub cover_bias: f64,
    pub initiates_clinch: bool,
    pub grapple: Option<GrappleGoal>,
    /// Only attacks back after successfully defending
    pub counter_attacks_only: bool,
    /// Never attacks
    pub defensive_only: bool,
    pub flees: bool,
    /// Changes room layer to strike then withdraw
    pub swoops: bool,
    /// Fires only while a firing sequence is in progress
    pub continue_firing_only: bool,
    /// Lines up shots before firing
    pub aims: bool,
}

impl CombatStrategyMode {
    pub const ALL: [CombatStrategyMode; 17] = [
        CombatStrategyMode::StandardMelee,
        CombatStrategyMode::FullDefense,
        CombatStrategyMode::Ward,
        CombatStrategyMode::Clinch,
        CombatStrategyMode::GrappleForControl,
        CombatStrategyMode::GrappleForIncapacitation,
        CombatStrategyMode::GrappleForKill,
        CombatStrategyMode::Flee,
        CombatStrategyMode::Skirmish,
        CombatStrategyMode::Swooper,
        CombatStrategyMode::StandardRange,
        CombatStrategyMode::FullCover,
        CombatStrategyMode::CoveringFire,
        CombatStrategyMode::FireAndAdvance,
        CombatStrategyMode::FireNoCover,
        CombatStrategyMode::FullAdvance,
        CombatStrategyMode::MeleeShooter,
    ];

    pub fn profile(&self) -> ModeProfile {
        use CombatStrategyMode as M;
        let melee = ModeProfile {
            mode: *self,
            range: RangePreference::Close,
            uses_ranged: false,
            melee_attacks: true,
            seeks_cover: false,
            cover_bias: 0.0,
            initiates_clinch: false,
            grapple: None,
            counter_attacks_only: false,
            defensive_only: false,
            flees: false,
            swoops: false,
            continue_firing_only: false,
            aims: true,
        };
        let ranged = ModeProfile {
            range: RangePreference::Hold,
            uses_ranged: true,
            melee_attacks: false,
            seeks_cover: true,
            cover_bias: 0.5,
            ..melee
        };
        match self {
            M::StandardMelee => melee,
            M::FullDefense => ModeProfile {
                melee_attacks: false,
                defensive_only: true,
                ..melee
            },
            M::Ward => ModeProfile {
                counter_attacks_only: true,
                ..melee
            },
            M::Clinch => ModeProfile {
                initiates_clinch: true,
                ..melee
            },
            M::GrappleForControl => ModeProfile {
                grapple: Some(GrappleGoal::Control),
                ..melee
            },
            M::GrappleForIncapacitation => ModeProfile {
                grapple: Some(GrappleGoal::Incapacitate),
                ..melee
            },
            M::GrappleForKill => ModeProfile {
                grapple: Some(GrappleGoal::Kill),
                ..melee
            },
            M::Flee => ModeProfile {
                melee_attacks: false,
                flees: true,
                ..melee
            },
            M::Skirmish => ModeProfile {
                range: RangePreference::Distance,
                ..melee
            },
            M::Swooper => ModeProfile {
                swoops: true,
                ..melee
            },
            M::StandardRange => ranged,
            M::FullCover => ModeProfile {
                cover_bias: 2.0,
                continue_firing_only: true,
                ..ranged
            },
            M::CoveringFire => ModeProfile {
                cover_bias: 1.0,
                aims: false,
                ..ranged
            },
            M::FireAndAdvance => ModeProfile {
                range: RangePreference::Advance,
                cover_bias: 0.25,
                melee_attacks: true,
                ..ranged
            },
            M::FireNoCover => ModeProfile {
                seeks_cover: false,
                cover_bias: 0.0,
                ..ranged
            },
            M::FullAdvance => ModeProfile {
                range: RangePreference::Close,
                uses_ranged: false,
                seeks_cover: false,
                cover_bias: 0.0,
                melee_attacks: true,
                ..ranged
            },
            M::MeleeShooter => ModeProfile {
                range: RangePreference::Close,
                seeks_cover: false,
                cover_bias: 0.0,
                melee_attacks: true,
                ..ranged
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_advance_disables_ranged() {
        let profile = CombatStrategyMode::FullAdvance.profile();
        assert!(!profile.uses_ranged);
        assert!(profile.melee_attacks);
        assert_eq!(profile.range, RangePreference::Close);
    }

    #[test]
    fn test_grapple_modes_escalate() {
        assert_eq!(
            CombatStrategyMode::GrappleForKill.profile().grapple,
            Some(GrappleGoal::Kill)
        );
        assert!(GrappleGoal::Kill > GrappleGoal::Control);
        assert_eq!(CombatStrategyMode::StandardMelee.profile().grapple, None);
    }

    #[test]
    fn test_every_mode_has_a_profile() {
        for mode in CombatStrategyMode::ALL {
            let profile = mode.profile();
            assert_eq!(profile.mode, mode);
            assert!(!(profile.defensive_only && profile.melee_attacks));
        }
    }

    #[test]
    fn test_ranged_modes() {
        assert!(CombatStrategyMode::StandardRange.profile().uses_ranged);
        assert!(!CombatStrategyMode::FireNoCover.profile().seeks_cover);
        assert!(CombatStrategyMode::FullCover.profile().cover_bias > 1.0);
        assert!(!CombatStrategyMode::Ward.profile().uses_ranged);
        assert!(!CombatStrategyMode::CoveringFire.profile().aims);
        assert!(CombatStrategyMode::FullCover.profile().aims);
    }
}
