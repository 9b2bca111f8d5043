//! Chemical system errors.

use pf_core::PfError;
use thiserror::Error;

/// Result type for system topology operations.
pub type SystemResult<T> = Result<T, SystemError>;

/// Errors from registry construction and lookups.
#[derive(Error, Debug)]
pub enum SystemError {
    /// A species name that must resolve does not exist in the system.
    #[error("Species not found: {name}")]
    SpeciesNotFound { name: String },

    /// A species name that must resolve does not exist in the given phase.
    #[error("Species {name} not found in phase {phase}")]
    SpeciesNotInPhase { name: String, phase: String },

    /// A reaction equation string could not be parsed.
    #[error("Malformed reaction equation: {what}")]
    MalformedEquation { what: String },

    /// A system definition failed validation.
    #[error("Invalid system definition: {what}")]
    InvalidDefinition { what: String },

    /// YAML schema parse failure.
    #[error("Schema parse error: {0}")]
    Schema(#[from] serde_yaml::Error),
}

impl From<SystemError> for PfError {
    fn from(e: SystemError) -> Self {
        match e {
            SystemError::SpeciesNotFound { .. } => PfError::InvalidArg { what: "species name" },
            SystemError::SpeciesNotInPhase { .. } => PfError::InvalidArg {
                what: "species name in phase",
            },
            SystemError::MalformedEquation { .. } => PfError::InvalidArg {
                what: "reaction equation",
            },
            SystemError::InvalidDefinition { .. } => PfError::Invariant {
                what: "system definition",
            },
            SystemError::Schema(_) => PfError::InvalidArg { what: "schema" },
        }
    }
}
