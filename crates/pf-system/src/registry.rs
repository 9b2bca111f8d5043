//! The chemical system registry: phases, species, and index bookkeeping.
//!
//! Species are ordered globally and partitioned contiguously into phases.
//! The registry precomputes the first-index offset of every phase so that
//! slicing a global per-species vector by phase is O(1).

use nalgebra::DVector;

use crate::error::{SystemError, SystemResult};
use crate::species::{Phase, Species};

/// The partitioned species/phase topology of a chemical system.
///
/// Invariant: the phase partition is a contiguous, non-overlapping cover of
/// the global species array; `num_species() == Σ num_species_in_phase(i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalSystem {
    phases: Vec<Phase>,
    /// First global species index of each phase.
    offsets: Vec<usize>,
    num_species: usize,
}

impl ChemicalSystem {
    /// Build a system from phases, validating that species names are unique
    /// across the whole system and that molar masses are positive and finite.
    pub fn new(phases: Vec<Phase>) -> SystemResult<Self> {
        let mut seen: Vec<&str> = Vec::new();
        for phase in &phases {
            for species in phase.species() {
                if seen.contains(&species.name()) {
                    return Err(SystemError::InvalidDefinition {
                        what: format!("duplicate species name {}", species.name()),
                    });
                }
                if !species.molar_mass().is_finite() || species.molar_mass() <= 0.0 {
                    return Err(SystemError::InvalidDefinition {
                        what: format!("non-positive molar mass for {}", species.name()),
                    });
                }
                seen.push(species.name());
            }
        }

        let mut offsets = Vec::with_capacity(phases.len());
        let mut total = 0;
        for phase in &phases {
            offsets.push(total);
            total += phase.num_species();
        }

        Ok(Self {
            phases,
            offsets,
            num_species: total,
        })
    }

    pub fn num_species(&self) -> usize {
        self.num_species
    }

    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn num_species_in_phase(&self, iphase: usize) -> usize {
        self.phases[iphase].num_species()
    }

    /// First global species index of the given phase.
    pub fn index_first_species_in_phase(&self, iphase: usize) -> usize {
        self.offsets[iphase]
    }

    pub fn phase(&self, iphase: usize) -> &Phase {
        &self.phases[iphase]
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// The species at a global index.
    pub fn species(&self, ispecies: usize) -> Option<&Species> {
        let iphase = self.index_phase_with_species(ispecies)?;
        Some(&self.phases[iphase].species()[ispecies - self.offsets[iphase]])
    }

    /// Global index of the species with the given name.
    pub fn index_species(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for phase in &self.phases {
            if let Some(local) = phase.index_species(name) {
                return Some(offset + local);
            }
            offset += phase.num_species();
        }
        None
    }

    /// Global index of the first species matching any alias, probing the
    /// aliases in order.
    pub fn index_species_any(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.index_species(a))
    }

    /// Global index of a species that must exist in the system.
    pub fn index_species_with_error(&self, name: &str) -> SystemResult<usize> {
        self.index_species(name)
            .ok_or_else(|| SystemError::SpeciesNotFound {
                name: name.to_string(),
            })
    }

    /// Index of the phase containing the given global species index.
    pub fn index_phase_with_species(&self, ispecies: usize) -> Option<usize> {
        if ispecies >= self.num_species {
            return None;
        }
        let mut iphase = 0;
        for (i, &offset) in self.offsets.iter().enumerate() {
            if ispecies >= offset {
                iphase = i;
            } else {
                break;
            }
        }
        Some(iphase)
    }

    /// Molar masses of all species [kg/mol], in global species order.
    pub fn molar_masses(&self) -> DVector<f64> {
        let mut mm = DVector::zeros(self.num_species);
        let mut i = 0;
        for phase in &self.phases {
            for species in phase.species() {
                mm[i] = species.molar_mass();
                i += 1;
            }
        }
        mm
    }
}
