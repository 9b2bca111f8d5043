//! Reference model backends.
//!
//! These fill the evaluator seam with the simplest physically meaningful
//! behavior: a fixed standard-property table and an ideal solution. Real
//! equation-of-state backends implement the same traits.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use pf_core::dual::DualVector;
use pf_core::units::{Pressure, Temperature};
use pf_system::ChemicalSystem;

use crate::error::{PropsError, PropsResult};
use crate::model::{ChemicalModel, PhaseChemicalProps, PhaseThermoProps, ThermoModel};

/// A thermodynamic model backed by fixed per-phase standard-property tables,
/// independent of temperature and pressure.
#[derive(Debug, Clone)]
pub struct ConstantThermoModel {
    phases: Vec<PhaseThermoProps>,
}

impl ConstantThermoModel {
    pub fn new(phases: Vec<PhaseThermoProps>) -> Self {
        Self { phases }
    }
}

impl ThermoModel for ConstantThermoModel {
    fn name(&self) -> &str {
        "constant-thermo"
    }

    fn evaluate(&self, _t: Temperature, _p: Pressure) -> PropsResult<Vec<PhaseThermoProps>> {
        Ok(self.phases.clone())
    }
}

/// An ideal-solution chemical model: unit activity coefficients, activities
/// equal to mole fractions, zero residual properties, and no reported molar
/// volume (the engine then falls back to the mole-fraction-weighted
/// standard volume sum).
///
/// Active phases must have strictly positive species amounts; a zero amount
/// inside a non-empty phase would put ln(0) in the activities. A phase with
/// zero total amount yields an all-zero result instead.
#[derive(Clone)]
pub struct IdealChemicalModel {
    system: Arc<ChemicalSystem>,
}

impl IdealChemicalModel {
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        Self { system }
    }
}

impl ChemicalModel for IdealChemicalModel {
    fn name(&self) -> &str {
        "ideal-solution"
    }

    fn evaluate(
        &self,
        _t: Temperature,
        _p: Pressure,
        n: &DVector<f64>,
    ) -> PropsResult<Vec<PhaseChemicalProps>> {
        if n.len() != self.system.num_species() {
            return Err(PropsError::AmountsLength {
                expected: self.system.num_species(),
                got: n.len(),
            });
        }

        let mut results = Vec::with_capacity(self.system.num_phases());
        let mut offset = 0;
        for i in 0..self.system.num_phases() {
            let size = self.system.num_species_in_phase(i);
            let np = &n.as_slice()[offset..offset + size];
            let nt: f64 = np.iter().sum();

            let mut props = PhaseChemicalProps::zeros(size);
            if nt > 0.0 {
                // ln a_i = ln x_i = ln n_i − ln n_total,
                // ∂ln a_i/∂n_j = δ_ij/n_i − 1/n_total
                let mut val = DVector::zeros(size);
                let mut jac = DMatrix::zeros(size, size);
                for r in 0..size {
                    val[r] = (np[r] / nt).ln();
                    for c in 0..size {
                        jac[(r, c)] = if r == c {
                            1.0 / np[r] - 1.0 / nt
                        } else {
                            -1.0 / nt
                        };
                    }
                }
                props.ln_activities = DualVector::new(val, jac)?;
            }
            results.push(props);
            offset += size;
        }
        Ok(results)
    }
}
