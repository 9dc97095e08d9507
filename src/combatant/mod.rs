pub mod actor;
pub mod body;
pub mod effects;
pub mod equipment;
pub mod settings;
pub mod stamina;
pub mod state;

pub use actor::{trait_names, Combatant, DamageReport, GrappleHold};
pub use body::{Body, Limb, LimbKind};
pub use effects::{Effect, EffectKind, Effects, ManualAction};
pub use equipment::{AmmoStack, Equipment, GearItem, GearKind, LoadedRound};
pub use settings::{CombatSettings, GrappleResponse};
pub use stamina::{Stamina, StaminaLedger};
pub use state::{CharacterState, PositionState};
