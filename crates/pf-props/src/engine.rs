//! The system property engine.
//!
//! [`SystemProperties`] holds the latest (T, P, n) snapshot together with
//! the raw per-phase results of the two model evaluators. `update` calls
//! re-evaluate the models and replace the caches wholesale; every derived
//! property is recomputed on demand from the cached raw results, so queries
//! never call back into the models.
//!
//! Per-phase intermediate quantities are computed in the phase's local
//! index space and embedded into the global species-index space before
//! leaving the engine.

use std::f64::consts::LN_10;
use std::sync::Arc;

use nalgebra::DVector;
use tracing::debug;

use pf_core::dual::{DualScalar, DualVector, mole_fractions};
use pf_core::numeric::ensure_positive;
use pf_core::units::constants::GAS_CONSTANT;
use pf_core::units::{Pressure, Temperature};
use pf_system::{ChemicalSystem, HalfReaction, aliases};

use crate::error::{PropsError, PropsResult};
use crate::model::{
    ChemicalModel, PhaseChemicalProps, PhaseThermoProps, ThermoModel, validation,
};

/// Thermodynamic and chemical properties of a multi-phase system, with
/// derivatives with respect to every species amount.
///
/// The registry and the model evaluators are shared and immutable; the
/// snapshot and the raw result caches are owned. Cloning an engine
/// duplicates the caches, so a clone can be updated independently without
/// touching the original.
#[derive(Clone)]
pub struct SystemProperties {
    system: Arc<ChemicalSystem>,
    thermo_model: Arc<dyn ThermoModel>,
    chemical_model: Arc<dyn ChemicalModel>,
    t: Option<Temperature>,
    p: Option<Pressure>,
    n: Option<DVector<f64>>,
    tres: Option<Vec<PhaseThermoProps>>,
    cres: Option<Vec<PhaseChemicalProps>>,
}

impl SystemProperties {
    pub fn new(
        system: Arc<ChemicalSystem>,
        thermo_model: Arc<dyn ThermoModel>,
        chemical_model: Arc<dyn ChemicalModel>,
    ) -> Self {
        Self {
            system,
            thermo_model,
            chemical_model,
            t: None,
            p: None,
            n: None,
            tres: None,
            cres: None,
        }
    }

    pub fn system(&self) -> &ChemicalSystem {
        &self.system
    }

    /// Re-evaluate the thermodynamic (T,P-only) model. The composition and
    /// the chemical model results are left untouched on purpose: they stay
    /// valid when the composition is fixed, and stale when it is not yet
    /// known.
    pub fn update(&mut self, t: Temperature, p: Pressure) -> PropsResult<()> {
        ensure_positive(t.value, "temperature")?;
        ensure_positive(p.value, "pressure")?;

        let tres = self.thermo_model.evaluate(t, p)?;
        validation::check_thermo_shape(&self.system, &tres)?;
        debug!(
            t_k = t.value,
            p_pa = p.value,
            model = self.thermo_model.name(),
            "updated standard thermodynamic properties"
        );

        self.t = Some(t);
        self.p = Some(p);
        self.tres = Some(tres);
        Ok(())
    }

    /// Re-evaluate both models and replace the snapshot wholesale.
    pub fn update_with_amounts(
        &mut self,
        t: Temperature,
        p: Pressure,
        n: DVector<f64>,
    ) -> PropsResult<()> {
        ensure_positive(t.value, "temperature")?;
        ensure_positive(p.value, "pressure")?;
        if n.len() != self.system.num_species() {
            return Err(PropsError::AmountsLength {
                expected: self.system.num_species(),
                got: n.len(),
            });
        }
        for v in n.iter() {
            if !v.is_finite() {
                return Err(PropsError::NonPhysical {
                    what: "species amount",
                });
            }
        }

        let tres = self.thermo_model.evaluate(t, p)?;
        validation::check_thermo_shape(&self.system, &tres)?;
        let cres = self.chemical_model.evaluate(t, p, &n)?;
        validation::check_chemical_shape(&self.system, &cres)?;
        debug!(
            t_k = t.value,
            p_pa = p.value,
            thermo = self.thermo_model.name(),
            chemical = self.chemical_model.name(),
            "updated thermodynamic and chemical properties"
        );

        self.t = Some(t);
        self.p = Some(p);
        self.n = Some(n);
        self.tres = Some(tres);
        self.cres = Some(cres);
        Ok(())
    }

    /// Temperature of the last update.
    pub fn temperature(&self) -> PropsResult<Temperature> {
        self.t.ok_or(PropsError::NotUpdated {
            what: "temperature",
        })
    }

    /// Pressure of the last update.
    pub fn pressure(&self) -> PropsResult<Pressure> {
        self.p.ok_or(PropsError::NotUpdated { what: "pressure" })
    }

    /// Species amounts of the last composition update [mol].
    pub fn amounts(&self) -> PropsResult<&DVector<f64>> {
        self.n.as_ref().ok_or(PropsError::NotUpdated {
            what: "species amounts",
        })
    }

    fn tres(&self) -> PropsResult<&[PhaseThermoProps]> {
        self.tres.as_deref().ok_or(PropsError::NotUpdated {
            what: "thermodynamic model results",
        })
    }

    fn cres(&self) -> PropsResult<&[PhaseChemicalProps]> {
        self.cres.as_deref().ok_or(PropsError::NotUpdated {
            what: "chemical model results",
        })
    }

    fn t_kelvin(&self) -> PropsResult<f64> {
        Ok(self.temperature()?.value)
    }

    fn p_pascal(&self) -> PropsResult<f64> {
        Ok(self.pressure()?.value)
    }

    /// Gather one standard-property vector across all phases into global
    /// species order.
    fn collect_standard(
        &self,
        select: fn(&PhaseThermoProps) -> &DVector<f64>,
    ) -> PropsResult<DVector<f64>> {
        let tres = self.tres()?;
        let mut res = DVector::zeros(self.system.num_species());
        let mut offset = 0;
        for props in tres {
            let v = select(props);
            res.rows_mut(offset, v.len()).copy_from(v);
            offset += v.len();
        }
        Ok(res)
    }

    /// Gather one chemical dual vector across all phases; each phase's
    /// local block lands on the diagonal of the global result.
    fn collect_chemical(
        &self,
        select: fn(&PhaseChemicalProps) -> &DualVector,
    ) -> PropsResult<DualVector> {
        let cres = self.cres()?;
        let num_species = self.system.num_species();
        let mut res = DualVector::zeros(num_species, num_species);
        let mut offset = 0;
        for props in cres {
            let v = select(props);
            res.set_rows(offset, offset, v);
            offset += v.len();
        }
        Ok(res)
    }

    /// Per-phase mole-fraction-weighted sum of a standard property plus the
    /// chemical model's residual, as a phase-indexed dual vector.
    fn phase_molar_sum(
        &self,
        standard: fn(&PhaseThermoProps) -> &DVector<f64>,
        residual: fn(&PhaseChemicalProps) -> &DualScalar,
    ) -> PropsResult<DualVector> {
        let tres = self.tres()?;
        let cres = self.cres()?;
        let n = self.amounts()?;
        let mut res = DualVector::zeros(self.system.num_phases(), self.system.num_species());
        let mut offset = 0;
        for i in 0..self.system.num_phases() {
            let size = self.system.num_species_in_phase(i);
            let xp = mole_fractions(&n.as_slice()[offset..offset + size]);
            let total = xp.dot(standard(&tres[i]).as_slice()) + residual(&cres[i]);
            res.set_row(i, offset, &total);
            offset += size;
        }
        Ok(res)
    }

    /// Molar fractions of all species.
    pub fn molar_fractions(&self) -> PropsResult<DualVector> {
        let n = self.amounts()?;
        let num_species = self.system.num_species();
        let mut res = DualVector::zeros(num_species, num_species);
        let mut offset = 0;
        for i in 0..self.system.num_phases() {
            let size = self.system.num_species_in_phase(i);
            let xp = mole_fractions(&n.as_slice()[offset..offset + size]);
            res.set_rows(offset, offset, &xp);
            offset += size;
        }
        Ok(res)
    }

    /// ln activity coefficients of all species.
    pub fn ln_activity_coefficients(&self) -> PropsResult<DualVector> {
        self.collect_chemical(|c| &c.ln_activity_coefficients)
    }

    /// ln activity constants of all species.
    pub fn ln_activity_constants(&self) -> PropsResult<DVector<f64>> {
        let cres = self.cres()?;
        let mut res = DVector::zeros(self.system.num_species());
        let mut offset = 0;
        for props in cres {
            let v = &props.ln_activity_constants;
            res.rows_mut(offset, v.len()).copy_from(v);
            offset += v.len();
        }
        Ok(res)
    }

    /// ln activities of all species.
    pub fn ln_activities(&self) -> PropsResult<DualVector> {
        self.collect_chemical(|c| &c.ln_activities)
    }

    /// Chemical potentials of all species [J/mol]: μ = G° + R·T·ln a.
    pub fn chemical_potentials(&self) -> PropsResult<DualVector> {
        let g = self.standard_partial_molar_gibbs_energies()?;
        let lna = self.ln_activities()?;
        let rt = GAS_CONSTANT * self.t_kelvin()?;
        Ok(lna * rt + &g)
    }

    /// Standard partial molar Gibbs energies of all species [J/mol].
    pub fn standard_partial_molar_gibbs_energies(&self) -> PropsResult<DVector<f64>> {
        self.collect_standard(|t| &t.standard_gibbs_energies)
    }

    /// Standard partial molar enthalpies of all species [J/mol].
    pub fn standard_partial_molar_enthalpies(&self) -> PropsResult<DVector<f64>> {
        self.collect_standard(|t| &t.standard_enthalpies)
    }

    /// Standard partial molar volumes of all species [m³/mol].
    pub fn standard_partial_molar_volumes(&self) -> PropsResult<DVector<f64>> {
        self.collect_standard(|t| &t.standard_volumes)
    }

    /// Standard partial molar entropies of all species [J/(mol·K)]:
    /// S° = (H° − G°)/T.
    pub fn standard_partial_molar_entropies(&self) -> PropsResult<DVector<f64>> {
        let g = self.standard_partial_molar_gibbs_energies()?;
        let h = self.standard_partial_molar_enthalpies()?;
        Ok((h - g) / self.t_kelvin()?)
    }

    /// Standard partial molar internal energies of all species [J/mol]:
    /// U° = H° − P·V°.
    pub fn standard_partial_molar_internal_energies(&self) -> PropsResult<DVector<f64>> {
        let h = self.standard_partial_molar_enthalpies()?;
        let v = self.standard_partial_molar_volumes()?;
        Ok(h - v * self.p_pascal()?)
    }

    /// Standard partial molar Helmholtz energies of all species [J/mol]:
    /// A° = G° − P·V°.
    pub fn standard_partial_molar_helmholtz_energies(&self) -> PropsResult<DVector<f64>> {
        let g = self.standard_partial_molar_gibbs_energies()?;
        let v = self.standard_partial_molar_volumes()?;
        Ok(g - v * self.p_pascal()?)
    }

    /// Standard partial molar isobaric heat capacities [J/(mol·K)].
    pub fn standard_partial_molar_heat_capacities_const_p(&self) -> PropsResult<DVector<f64>> {
        self.collect_standard(|t| &t.standard_heat_capacities_cp)
    }

    /// Standard partial molar isochoric heat capacities [J/(mol·K)].
    pub fn standard_partial_molar_heat_capacities_const_v(&self) -> PropsResult<DVector<f64>> {
        self.collect_standard(|t| &t.standard_heat_capacities_cv)
    }

    /// Molar Gibbs energies of the phases [J/mol].
    pub fn phase_molar_gibbs_energies(&self) -> PropsResult<DualVector> {
        self.phase_molar_sum(
            |t| &t.standard_gibbs_energies,
            |c| &c.residual_molar_gibbs_energy,
        )
    }

    /// Molar enthalpies of the phases [J/mol].
    pub fn phase_molar_enthalpies(&self) -> PropsResult<DualVector> {
        self.phase_molar_sum(|t| &t.standard_enthalpies, |c| &c.residual_molar_enthalpy)
    }

    /// Molar volumes of the phases [m³/mol].
    ///
    /// The chemical model's directly reported molar volume wins whenever it
    /// is strictly positive; otherwise the mole-fraction-weighted standard
    /// volume sum is used. The fallback is a numerical policy, not an error
    /// path.
    pub fn phase_molar_volumes(&self) -> PropsResult<DualVector> {
        let tres = self.tres()?;
        let cres = self.cres()?;
        let n = self.amounts()?;
        let mut res = DualVector::zeros(self.system.num_phases(), self.system.num_species());
        let mut offset = 0;
        for i in 0..self.system.num_phases() {
            let size = self.system.num_species_in_phase(i);
            if cres[i].molar_volume.val > 0.0 {
                res.set_row(i, offset, &cres[i].molar_volume);
            } else {
                let xp = mole_fractions(&n.as_slice()[offset..offset + size]);
                res.set_row(i, offset, &xp.dot(tres[i].standard_volumes.as_slice()));
            }
            offset += size;
        }
        Ok(res)
    }

    /// Molar entropies of the phases [J/(mol·K)]: S = (H − G)/T.
    pub fn phase_molar_entropies(&self) -> PropsResult<DualVector> {
        let g = self.phase_molar_gibbs_energies()?;
        let h = self.phase_molar_enthalpies()?;
        Ok((h - g) / self.t_kelvin()?)
    }

    /// Molar internal energies of the phases [J/mol]: U = H − P·V.
    pub fn phase_molar_internal_energies(&self) -> PropsResult<DualVector> {
        let h = self.phase_molar_enthalpies()?;
        let v = self.phase_molar_volumes()?;
        Ok(h - v * self.p_pascal()?)
    }

    /// Molar Helmholtz energies of the phases [J/mol]: A = G − P·V.
    pub fn phase_molar_helmholtz_energies(&self) -> PropsResult<DualVector> {
        let g = self.phase_molar_gibbs_energies()?;
        let v = self.phase_molar_volumes()?;
        Ok(g - v * self.p_pascal()?)
    }

    /// Molar isobaric heat capacities of the phases [J/(mol·K)].
    pub fn phase_molar_heat_capacities_const_p(&self) -> PropsResult<DualVector> {
        self.phase_molar_sum(
            |t| &t.standard_heat_capacities_cp,
            |c| &c.residual_molar_heat_capacity_cp,
        )
    }

    /// Molar isochoric heat capacities of the phases [J/(mol·K)].
    pub fn phase_molar_heat_capacities_const_v(&self) -> PropsResult<DualVector> {
        self.phase_molar_sum(
            |t| &t.standard_heat_capacities_cv,
            |c| &c.residual_molar_heat_capacity_cv,
        )
    }

    /// Per-mass version of a per-mole phase property.
    fn specific(&self, molar: DualVector) -> PropsResult<DualVector> {
        Ok(self.phase_amounts()? / self.phase_masses()? * molar)
    }

    /// Specific Gibbs energies of the phases [J/kg].
    pub fn phase_specific_gibbs_energies(&self) -> PropsResult<DualVector> {
        let molar = self.phase_molar_gibbs_energies()?;
        self.specific(molar)
    }

    /// Specific enthalpies of the phases [J/kg].
    pub fn phase_specific_enthalpies(&self) -> PropsResult<DualVector> {
        let molar = self.phase_molar_enthalpies()?;
        self.specific(molar)
    }

    /// Specific volumes of the phases [m³/kg].
    pub fn phase_specific_volumes(&self) -> PropsResult<DualVector> {
        let molar = self.phase_molar_volumes()?;
        self.specific(molar)
    }

    /// Specific entropies of the phases [J/(kg·K)].
    pub fn phase_specific_entropies(&self) -> PropsResult<DualVector> {
        let molar = self.phase_molar_entropies()?;
        self.specific(molar)
    }

    /// Specific internal energies of the phases [J/kg].
    pub fn phase_specific_internal_energies(&self) -> PropsResult<DualVector> {
        let molar = self.phase_molar_internal_energies()?;
        self.specific(molar)
    }

    /// Specific Helmholtz energies of the phases [J/kg].
    pub fn phase_specific_helmholtz_energies(&self) -> PropsResult<DualVector> {
        let molar = self.phase_molar_helmholtz_energies()?;
        self.specific(molar)
    }

    /// Specific isobaric heat capacities of the phases [J/(kg·K)].
    pub fn phase_specific_heat_capacities_const_p(&self) -> PropsResult<DualVector> {
        let molar = self.phase_molar_heat_capacities_const_p()?;
        self.specific(molar)
    }

    /// Specific isochoric heat capacities of the phases [J/(kg·K)].
    pub fn phase_specific_heat_capacities_const_v(&self) -> PropsResult<DualVector> {
        let molar = self.phase_molar_heat_capacities_const_v()?;
        self.specific(molar)
    }

    /// Densities of the phases [kg/m³]: mass/(amount × molar volume).
    pub fn phase_densities(&self) -> PropsResult<DualVector> {
        Ok(self.phase_masses()? / (self.phase_amounts()? * self.phase_molar_volumes()?))
    }

    /// Masses of the phases [kg]: Σ molar mass × amount over the phase.
    pub fn phase_masses(&self) -> PropsResult<DualVector> {
        let n = self.amounts()?;
        let mm = self.system.molar_masses();
        let mut res = DualVector::zeros(self.system.num_phases(), self.system.num_species());
        let mut offset = 0;
        for i in 0..self.system.num_phases() {
            let size = self.system.num_species_in_phase(i);
            let np = DualVector::amounts(&n.as_slice()[offset..offset + size]);
            let mass = np.dot(&mm.as_slice()[offset..offset + size]);
            res.set_row(i, offset, &mass);
            offset += size;
        }
        Ok(res)
    }

    /// Molar amounts of the phases [mol]: Σ amount over the phase.
    pub fn phase_amounts(&self) -> PropsResult<DualVector> {
        let n = self.amounts()?;
        let mut res = DualVector::zeros(self.system.num_phases(), self.system.num_species());
        let mut offset = 0;
        for i in 0..self.system.num_phases() {
            let size = self.system.num_species_in_phase(i);
            let np = DualVector::amounts(&n.as_slice()[offset..offset + size]);
            res.set_row(i, offset, &np.sum());
            offset += size;
        }
        Ok(res)
    }

    /// Volumes of the phases [m³]: amount × molar volume.
    pub fn phase_volumes(&self) -> PropsResult<DualVector> {
        Ok(self.phase_amounts()? * self.phase_molar_volumes()?)
    }

    /// Total volume of the system [m³].
    pub fn volume(&self) -> PropsResult<DualScalar> {
        Ok((self.phase_amounts()? * self.phase_molar_volumes()?).sum())
    }

    /// pH of the system.
    ///
    /// Returns an all-zero quantity (value and derivatives, sized to the
    /// total species count) when the system has no water-bearing phase or
    /// that phase has no hydron species; many systems legitimately lack an
    /// aqueous phase.
    pub fn ph(&self) -> PropsResult<DualScalar> {
        let cres = self.cres()?;
        let total = self.system.num_species();

        let iaqueous = self
            .system
            .index_species_any(aliases::WATER_ALIASES)
            .and_then(|iw| self.system.index_phase_with_species(iw));
        let Some(iaqueous) = iaqueous else {
            return Ok(DualScalar::zeros(total));
        };

        let phase = self.system.phase(iaqueous);
        let Some(ihydron) = phase.index_species_any(aliases::HYDRON_ALIASES) else {
            return Ok(DualScalar::zeros(total));
        };

        let ifirst = self.system.index_first_species_in_phase(iaqueous);
        let ph = -(cres[iaqueous].ln_activities.get(ihydron)) / LN_10;
        Ok(ph.embed(total, ifirst)?)
    }

    /// pe of the system for the default hydrogen half reaction
    /// `H2(aq) = 2*H+ + 2*e-`.
    pub fn pe(&self) -> PropsResult<DualScalar> {
        self.pe_with_reaction(&HalfReaction::hydrogen())
    }

    /// pe of the system for an arbitrary half reaction.
    ///
    /// Returns the all-zero sentinel when there is no water-bearing phase.
    /// A half reaction without an electron species under either accepted
    /// spelling is a precondition error, and every named non-electron
    /// species must exist in the aqueous phase.
    pub fn pe_with_reaction(&self, reaction: &HalfReaction) -> PropsResult<DualScalar> {
        let tres = self.tres()?;
        let cres = self.cres()?;
        let total = self.system.num_species();
        let rt = GAS_CONSTANT * self.t_kelvin()?;

        let iaqueous = self
            .system
            .index_species_any(aliases::WATER_ALIASES)
            .and_then(|iw| self.system.index_phase_with_species(iw));
        let Some(iaqueous) = iaqueous else {
            return Ok(DualScalar::zeros(total));
        };

        let mut stoichiometry_eminus = reaction.stoichiometry("e-");
        if stoichiometry_eminus == 0.0 {
            stoichiometry_eminus = reaction.stoichiometry("e[-]");
        }
        if stoichiometry_eminus == 0.0 {
            return Err(PropsError::MissingElectron);
        }

        let phase = self.system.phase(iaqueous);
        let size = phase.num_species();
        let ifirst = self.system.index_first_species_in_phase(iaqueous);

        // Nonzero when the standard chemical potentials were derived from
        // reaction log(k) data; the electron may legitimately be absent.
        let g0_eminus = phase
            .index_species_any(aliases::ELECTRON_ALIASES)
            .map(|ie| tres[iaqueous].standard_gibbs_energies[ie])
            .unwrap_or(0.0);

        let mut pe = DualScalar::zeros(size);
        for (name, coeff) in reaction.terms() {
            if aliases::is_electron(name) {
                continue;
            }
            let ispecies = phase.index_species_with_error(name)?;
            let g0 = tres[iaqueous].standard_gibbs_energies[ispecies] / rt;
            let ln_a = cres[iaqueous].ln_activities.get(ispecies);
            pe -= (ln_a + g0) * *coeff;
        }
        pe /= stoichiometry_eminus;
        pe -= g0_eminus;
        pe /= -LN_10;

        Ok(pe.embed(total, ifirst)?)
    }
}
