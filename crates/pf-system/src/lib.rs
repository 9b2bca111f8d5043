//! pf-system: chemical system topology for phaseflow.
//!
//! Provides:
//! - Species and phase definitions with molar masses
//! - The partitioned registry (`ChemicalSystem`) with global/local index
//!   bookkeeping over the contiguous phase cover
//! - Synonym tables for logical species (water, hydron, electron)
//! - Half-reaction descriptors with equation-string parsing
//! - A YAML schema for defining systems from configuration

pub mod aliases;
pub mod error;
pub mod reaction;
pub mod registry;
pub mod schema;
pub mod species;

// Re-exports for ergonomics
pub use error::{SystemError, SystemResult};
pub use reaction::HalfReaction;
pub use registry::ChemicalSystem;
pub use schema::{PhaseDef, SpeciesDef, SystemDef, system_from_yaml};
pub use species::{Phase, Species};
