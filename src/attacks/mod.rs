//! Attack definitions and their classifications

pub mod intentions;
pub mod move_type;
pub mod weapon_attack;

pub use intentions::{AttackIntention, IntentionFilter, Intentions};
pub use move_type::{AttackCategory, AttackKind, DefenseType, Handedness};
pub use weapon_attack::{AttackInputs, DefenseDifficulties, NaturalAttack, WeaponAttack};
