//! System definition schema (YAML ingestion).
//!
//! A convenience construction path for [`ChemicalSystem`]: parse a YAML
//! document into the definition structs, validate, and build the registry.
//! Validation beyond what serde gives us (uniqueness, positive molar
//! masses) happens in [`ChemicalSystem::new`].

use serde::{Deserialize, Serialize};

use crate::error::{SystemError, SystemResult};
use crate::registry::ChemicalSystem;
use crate::species::{Phase, Species};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemDef {
    #[serde(default)]
    pub name: String,
    pub phases: Vec<PhaseDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseDef {
    pub name: String,
    pub species: Vec<SpeciesDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeciesDef {
    pub name: String,
    /// Molar mass [kg/mol].
    pub molar_mass: f64,
}

impl SystemDef {
    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> SystemResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Validate and build the registry.
    pub fn build(self) -> SystemResult<ChemicalSystem> {
        if self.phases.is_empty() {
            return Err(SystemError::InvalidDefinition {
                what: "system has no phases".to_string(),
            });
        }
        for phase in &self.phases {
            if phase.species.is_empty() {
                return Err(SystemError::InvalidDefinition {
                    what: format!("phase {} has no species", phase.name),
                });
            }
        }
        let phases = self
            .phases
            .into_iter()
            .map(|p| {
                Phase::new(
                    p.name,
                    p.species
                        .into_iter()
                        .map(|s| Species::new(s.name, s.molar_mass))
                        .collect(),
                )
            })
            .collect();
        ChemicalSystem::new(phases)
    }
}

/// Parse and build in one step.
pub fn system_from_yaml(text: &str) -> SystemResult<ChemicalSystem> {
    SystemDef::from_yaml_str(text)?.build()
}
