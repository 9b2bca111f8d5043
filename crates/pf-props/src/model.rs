//! Raw per-phase model results and evaluator traits.
//!
//! The engine consumes two external evaluators: a thermodynamic model whose
//! outputs depend only on temperature and pressure, and a chemical model
//! whose outputs also depend on composition. Both return one result per
//! phase, aligned to that phase's local species indices.

use nalgebra::DVector;
use pf_core::dual::{DualScalar, DualVector};
use pf_core::units::{Pressure, Temperature};

use crate::error::PropsResult;

/// Standard partial molar properties of one phase's species.
///
/// These depend on temperature and pressure only; their derivatives with
/// respect to species amounts are identically zero, so plain vectors carry
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseThermoProps {
    /// Standard partial molar Gibbs energies [J/mol].
    pub standard_gibbs_energies: DVector<f64>,
    /// Standard partial molar enthalpies [J/mol].
    pub standard_enthalpies: DVector<f64>,
    /// Standard partial molar volumes [m³/mol].
    pub standard_volumes: DVector<f64>,
    /// Standard partial molar isobaric heat capacities [J/(mol·K)].
    pub standard_heat_capacities_cp: DVector<f64>,
    /// Standard partial molar isochoric heat capacities [J/(mol·K)].
    pub standard_heat_capacities_cv: DVector<f64>,
}

impl PhaseThermoProps {
    /// All-zero result for a phase with `size` species.
    pub fn zeros(size: usize) -> Self {
        Self {
            standard_gibbs_energies: DVector::zeros(size),
            standard_enthalpies: DVector::zeros(size),
            standard_volumes: DVector::zeros(size),
            standard_heat_capacities_cp: DVector::zeros(size),
            standard_heat_capacities_cv: DVector::zeros(size),
        }
    }
}

/// Composition-dependent properties of one phase, in the phase's local
/// index space (derivative length = species in the phase).
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseChemicalProps {
    /// ln activity coefficients of the phase's species.
    pub ln_activity_coefficients: DualVector,
    /// ln activity constants of the phase's species.
    pub ln_activity_constants: DVector<f64>,
    /// ln activities of the phase's species.
    pub ln_activities: DualVector,
    /// Molar volume of the phase [m³/mol]. A non-positive value means the
    /// model does not report one and the engine falls back to the
    /// mole-fraction-weighted standard volume sum.
    pub molar_volume: DualScalar,
    /// Residual molar Gibbs energy of the phase [J/mol].
    pub residual_molar_gibbs_energy: DualScalar,
    /// Residual molar enthalpy of the phase [J/mol].
    pub residual_molar_enthalpy: DualScalar,
    /// Residual molar isobaric heat capacity of the phase [J/(mol·K)].
    pub residual_molar_heat_capacity_cp: DualScalar,
    /// Residual molar isochoric heat capacity of the phase [J/(mol·K)].
    pub residual_molar_heat_capacity_cv: DualScalar,
}

impl PhaseChemicalProps {
    /// All-zero result for a phase with `size` species.
    pub fn zeros(size: usize) -> Self {
        Self {
            ln_activity_coefficients: DualVector::zeros(size, size),
            ln_activity_constants: DVector::zeros(size),
            ln_activities: DualVector::zeros(size, size),
            molar_volume: DualScalar::zeros(size),
            residual_molar_gibbs_energy: DualScalar::zeros(size),
            residual_molar_enthalpy: DualScalar::zeros(size),
            residual_molar_heat_capacity_cp: DualScalar::zeros(size),
            residual_molar_heat_capacity_cv: DualScalar::zeros(size),
        }
    }
}

/// Evaluator for the temperature/pressure-dependent standard properties.
///
/// Implementations must be thread-safe (Send + Sync) so independent engine
/// clones can evaluate in parallel. Assumed to be a pure function of its
/// inputs.
pub trait ThermoModel: Send + Sync {
    /// Model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Evaluate the standard properties of every phase.
    fn evaluate(&self, t: Temperature, p: Pressure) -> PropsResult<Vec<PhaseThermoProps>>;
}

/// Evaluator for the composition-dependent properties.
///
/// `n` is the global amounts vector [mol]; results use each phase's local
/// index space. Assumed to be a pure function of its inputs.
pub trait ChemicalModel: Send + Sync {
    /// Model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Evaluate the chemical properties of every phase.
    fn evaluate(
        &self,
        t: Temperature,
        p: Pressure,
        n: &DVector<f64>,
    ) -> PropsResult<Vec<PhaseChemicalProps>>;
}

/// Shape checks for model results against the phase partition.
pub(crate) mod validation {
    use super::*;
    use crate::error::PropsError;
    use pf_system::ChemicalSystem;

    pub fn check_thermo_shape(
        system: &ChemicalSystem,
        res: &[PhaseThermoProps],
    ) -> PropsResult<()> {
        if res.len() != system.num_phases() {
            return Err(PropsError::ResultShape {
                what: "thermo result phase count",
                phase: 0,
                expected: system.num_phases(),
                got: res.len(),
            });
        }
        for (i, props) in res.iter().enumerate() {
            let size = system.num_species_in_phase(i);
            let fields = [
                ("standard Gibbs energies", &props.standard_gibbs_energies),
                ("standard enthalpies", &props.standard_enthalpies),
                ("standard volumes", &props.standard_volumes),
                ("standard cp", &props.standard_heat_capacities_cp),
                ("standard cv", &props.standard_heat_capacities_cv),
            ];
            for (what, v) in fields {
                if v.len() != size {
                    return Err(PropsError::ResultShape {
                        what,
                        phase: i,
                        expected: size,
                        got: v.len(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn check_chemical_shape(
        system: &ChemicalSystem,
        res: &[PhaseChemicalProps],
    ) -> PropsResult<()> {
        if res.len() != system.num_phases() {
            return Err(PropsError::ResultShape {
                what: "chemical result phase count",
                phase: 0,
                expected: system.num_phases(),
                got: res.len(),
            });
        }
        for (i, props) in res.iter().enumerate() {
            let size = system.num_species_in_phase(i);
            let vectors = [
                (
                    "ln activity coefficients",
                    &props.ln_activity_coefficients,
                ),
                ("ln activities", &props.ln_activities),
            ];
            for (what, v) in vectors {
                if v.len() != size || v.nvars() != size {
                    return Err(PropsError::ResultShape {
                        what,
                        phase: i,
                        expected: size,
                        got: v.len().max(v.nvars()),
                    });
                }
            }
            if props.ln_activity_constants.len() != size {
                return Err(PropsError::ResultShape {
                    what: "ln activity constants",
                    phase: i,
                    expected: size,
                    got: props.ln_activity_constants.len(),
                });
            }
            let scalars = [
                ("molar volume", &props.molar_volume),
                ("residual Gibbs energy", &props.residual_molar_gibbs_energy),
                ("residual enthalpy", &props.residual_molar_enthalpy),
                ("residual cp", &props.residual_molar_heat_capacity_cp),
                ("residual cv", &props.residual_molar_heat_capacity_cv),
            ];
            for (what, s) in scalars {
                if s.nvars() != size {
                    return Err(PropsError::ResultShape {
                        what,
                        phase: i,
                        expected: size,
                        got: s.nvars(),
                    });
                }
            }
        }
        Ok(())
    }
}
