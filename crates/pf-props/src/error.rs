//! Property engine errors.

use pf_core::PfError;
use pf_system::SystemError;
use thiserror::Error;

/// Result type for property queries.
pub type PropsResult<T> = Result<T, PropsError>;

/// Errors that can occur during property evaluation and queries.
#[derive(Error, Debug)]
pub enum PropsError {
    /// A query was made before the corresponding `update` call.
    #[error("Properties not yet computed for {what}; call update first")]
    NotUpdated { what: &'static str },

    /// Non-physical primitive input (negative temperature, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// A model returned results that do not match the phase partition.
    #[error("Model result shape mismatch for {what} in phase {phase}: expected {expected}, got {got}")]
    ResultShape {
        what: &'static str,
        phase: usize,
        expected: usize,
        got: usize,
    },

    /// The amounts vector does not cover every species.
    #[error("Amounts vector length {got} does not match species count {expected}")]
    AmountsLength { expected: usize, got: usize },

    /// A half reaction carries no electron species under either accepted
    /// spelling (`e-`, `e[-]`).
    #[error("Half reaction has no electron species (e- or e[-])")]
    MissingElectron,

    /// Backend model failure.
    #[error("Model error: {message}")]
    Model { message: String },

    #[error("System error: {0}")]
    System(#[from] SystemError),

    #[error("Numeric error: {0}")]
    Core(#[from] PfError),
}

impl From<PropsError> for PfError {
    fn from(e: PropsError) -> Self {
        match e {
            PropsError::NotUpdated { .. } => PfError::Invariant {
                what: "properties queried before update",
            },
            PropsError::NonPhysical { .. } => PfError::InvalidArg { what: "state input" },
            PropsError::ResultShape { .. } => PfError::Invariant {
                what: "model result shape",
            },
            PropsError::AmountsLength { .. } => PfError::InvalidArg { what: "amounts" },
            PropsError::MissingElectron => PfError::InvalidArg { what: "half reaction" },
            PropsError::Model { .. } => PfError::Invariant { what: "model" },
            PropsError::System(e) => e.into(),
            PropsError::Core(e) => e,
        }
    }
}
