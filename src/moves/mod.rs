//! Combat moves: what a combatant proposes, how the target answers, and how
//! the pair is resolved

pub mod defense;
pub mod kinds;
pub mod resolve;
pub mod result;

pub use defense::{defense_check, DefenseMove};
pub use kinds::{AttackMove, CombatMove, GrappleStage, MoveKind};
pub use resolve::{resolve_move, ResolutionContext};
pub use result::{MoveNote, MoveResult};
