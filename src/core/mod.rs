pub mod config;
pub mod error;
pub mod types;

pub use config::{config, EngineConfig, RecoveryTable};
pub use error::{CombatError, Result};
pub use types::{
    CombatantId, DefinitionId, ItemId, LimbId, LocationId, RoomLayer, Seconds, SessionId,
};
