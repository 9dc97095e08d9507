use thiserror::Error;

use crate::core::types::{CombatantId, SessionId};

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Failed to parse formula '{text}': {reason}")]
    FormulaParse { text: String, reason: String },

    #[error("Formula '{formula}' references unknown variable '{variable}'")]
    UnknownFormulaVariable { formula: String, variable: String },

    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    #[error("{kind} not found: {key}")]
    DefinitionNotFound { kind: &'static str, key: String },

    #[error("Invalid {kind} '{name}': {reason}")]
    InvalidDefinition {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("Combatant not found: {0}")]
    CombatantNotFound(CombatantId),

    #[error("Combat session not found: {0}")]
    SessionNotFound(SessionId),

    /// A move reached resolution with no handler. Always an engine defect.
    #[error("Unhandled move type in dispatch: {0}")]
    UnhandledMoveType(String),

    #[error("Invalid combat settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CombatError {
    /// Configuration errors only invalidate the single definition that raised them
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CombatError::FormulaParse { .. }
                | CombatError::UnknownFormulaVariable { .. }
                | CombatError::UnknownTag(_)
                | CombatError::DefinitionNotFound { .. }
                | CombatError::InvalidDefinition { .. }
                | CombatError::InvalidSettings(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CombatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_classified() {
        assert!(CombatError::UnknownTag("Slicey".into()).is_configuration_error());
        assert!(!CombatError::UnhandledMoveType("Teleport".into()).is_configuration_error());
        assert!(!CombatError::CombatantNotFound(CombatantId(1)).is_configuration_error());
    }

    #[test]
    fn test_error_messages() {
        let err = CombatError::DefinitionNotFound {
            kind: "weapon type",
            key: "longsword".into(),
        };
        assert_eq!(err.to_string(), "weapon type not found: longsword");
    }
}
