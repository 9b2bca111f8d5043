//! Species and phase definitions.

use crate::error::{SystemError, SystemResult};

/// A chemical species: a named entity with a molar mass, belonging to
/// exactly one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    name: String,
    /// Molar mass [kg/mol].
    molar_mass: f64,
}

impl Species {
    pub fn new(name: impl Into<String>, molar_mass: f64) -> Self {
        Self {
            name: name.into(),
            molar_mass,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.molar_mass
    }
}

/// A homogeneous region of the chemical system holding a contiguous run of
/// species (e.g. aqueous, gaseous).
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    name: String,
    species: Vec<Species>,
}

impl Phase {
    pub fn new(name: impl Into<String>, species: Vec<Species>) -> Self {
        Self {
            name: name.into(),
            species,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    /// Local index of the species with the given name.
    pub fn index_species(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s.name() == name)
    }

    /// Local index of the first species matching any of the given aliases,
    /// probing the aliases in order.
    pub fn index_species_any(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.index_species(a))
    }

    /// Local index of a species that must exist in this phase.
    pub fn index_species_with_error(&self, name: &str) -> SystemResult<usize> {
        self.index_species(name)
            .ok_or_else(|| SystemError::SpeciesNotInPhase {
                name: name.to_string(),
                phase: self.name.clone(),
            })
    }
}
