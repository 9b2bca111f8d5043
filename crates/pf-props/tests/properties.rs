//! Integration tests for the property engine over hand-computed fixtures.
//!
//! The main fixture is a two-phase, three-species system:
//! Aqueous = [H2O(l), H+], Gaseous = [CO2(g)], n = [55, 1, 2] mol.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::{DMatrix, DVector};

use pf_core::dual::{DualScalar, DualVector};
use pf_core::numeric::{Tolerances, nearly_equal};
use pf_core::units::constants::GAS_CONSTANT;
use pf_core::units::{Pressure, Temperature, k, pa};
use pf_props::{
    ChemicalModel, ConstantThermoModel, PhaseChemicalProps, PhaseThermoProps, PropsError,
    PropsResult, SystemProperties, ThermoModel,
};
use pf_system::{ChemicalSystem, HalfReaction, Phase, Species};

const LN_10: f64 = std::f64::consts::LN_10;

fn tol() -> Tolerances {
    Tolerances::default()
}

/// Chemical model returning fixed tables, counting evaluations.
struct TableChemicalModel {
    phases: Vec<PhaseChemicalProps>,
    calls: Arc<AtomicUsize>,
}

impl ChemicalModel for TableChemicalModel {
    fn name(&self) -> &str {
        "table-chemical"
    }

    fn evaluate(
        &self,
        _t: Temperature,
        _p: Pressure,
        _n: &DVector<f64>,
    ) -> PropsResult<Vec<PhaseChemicalProps>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.phases.clone())
    }
}

/// Thermo model whose standard Gibbs energies scale with temperature, to
/// make thermo-only updates observable.
struct TempScaledThermoModel {
    sizes: Vec<usize>,
}

impl ThermoModel for TempScaledThermoModel {
    fn name(&self) -> &str {
        "temp-scaled-thermo"
    }

    fn evaluate(&self, t: Temperature, _p: Pressure) -> PropsResult<Vec<PhaseThermoProps>> {
        Ok(self
            .sizes
            .iter()
            .map(|&size| {
                let mut props = PhaseThermoProps::zeros(size);
                props.standard_gibbs_energies = DVector::from_element(size, t.value);
                props.standard_enthalpies = DVector::from_element(size, 2.0 * t.value);
                props
            })
            .collect())
    }
}

fn fixture_system() -> Arc<ChemicalSystem> {
    Arc::new(
        ChemicalSystem::new(vec![
            Phase::new(
                "Aqueous",
                vec![
                    Species::new("H2O(l)", 0.018),
                    Species::new("H+", 0.001),
                ],
            ),
            Phase::new("Gaseous", vec![Species::new("CO2(g)", 0.044)]),
        ])
        .unwrap(),
    )
}

fn fixture_thermo() -> Arc<ConstantThermoModel> {
    let aqueous = PhaseThermoProps {
        standard_gibbs_energies: DVector::from_column_slice(&[100.0, 200.0]),
        standard_enthalpies: DVector::from_column_slice(&[300.0, 400.0]),
        standard_volumes: DVector::from_column_slice(&[10.0, 20.0]),
        standard_heat_capacities_cp: DVector::from_column_slice(&[5.0, 6.0]),
        standard_heat_capacities_cv: DVector::from_column_slice(&[3.0, 4.0]),
    };
    let gaseous = PhaseThermoProps {
        standard_gibbs_energies: DVector::from_column_slice(&[500.0]),
        standard_enthalpies: DVector::from_column_slice(&[600.0]),
        standard_volumes: DVector::from_column_slice(&[30.0]),
        standard_heat_capacities_cp: DVector::from_column_slice(&[7.0]),
        standard_heat_capacities_cv: DVector::from_column_slice(&[5.0]),
    };
    Arc::new(ConstantThermoModel::new(vec![aqueous, gaseous]))
}

fn aqueous_chemical() -> PhaseChemicalProps {
    let mut props = PhaseChemicalProps::zeros(2);
    props.ln_activities = DualVector::new(
        DVector::from_column_slice(&[0.5, -1.0]),
        DMatrix::from_row_slice(2, 2, &[0.1, 0.0, 0.0, 0.2]),
    )
    .unwrap();
    props.ln_activity_constants = DVector::from_column_slice(&[1.5, 2.5]);
    // Reported molar volume is positive: the direct branch is live.
    props.molar_volume = DualScalar::new(2.5, DVector::from_column_slice(&[0.01, 0.02]));
    props.residual_molar_gibbs_energy =
        DualScalar::new(7.0, DVector::from_column_slice(&[0.3, 0.4]));
    props.residual_molar_enthalpy = DualScalar::constant(11.0, 2);
    props.residual_molar_heat_capacity_cp = DualScalar::constant(1.0, 2);
    props.residual_molar_heat_capacity_cv = DualScalar::constant(0.5, 2);
    props
}

fn gaseous_chemical() -> PhaseChemicalProps {
    let mut props = PhaseChemicalProps::zeros(1);
    props.ln_activities = DualVector::new(
        DVector::from_column_slice(&[0.25]),
        DMatrix::from_row_slice(1, 1, &[0.05]),
    )
    .unwrap();
    props.ln_activity_constants = DVector::from_column_slice(&[3.5]);
    // Molar volume left at zero: the fallback branch is live.
    props.residual_molar_gibbs_energy = DualScalar::new(2.0, DVector::from_column_slice(&[0.1]));
    props.residual_molar_enthalpy = DualScalar::constant(3.0, 1);
    props
}

fn fixture_chemical(calls: Arc<AtomicUsize>) -> Arc<TableChemicalModel> {
    Arc::new(TableChemicalModel {
        phases: vec![aqueous_chemical(), gaseous_chemical()],
        calls,
    })
}

/// Engine over the main fixture, updated at 298.15 K / 101325 Pa with
/// n = [55, 1, 2].
fn fixture_engine() -> SystemProperties {
    let system = fixture_system();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut props = SystemProperties::new(system, fixture_thermo(), fixture_chemical(calls));
    props
        .update_with_amounts(
            k(298.15),
            pa(101_325.0),
            DVector::from_column_slice(&[55.0, 1.0, 2.0]),
        )
        .unwrap();
    props
}

#[test]
fn molar_fractions_sum_to_one_per_phase() {
    let props = fixture_engine();
    let x = props.molar_fractions().unwrap();

    assert!(nearly_equal(x.val[0] + x.val[1], 1.0, tol()));
    assert!(nearly_equal(x.val[2], 1.0, tol()));
    for xi in x.val.iter() {
        assert!((0.0..=1.0).contains(xi));
    }
    assert!(nearly_equal(x.val[0], 55.0 / 56.0, tol()));
    assert!(nearly_equal(x.val[1], 1.0 / 56.0, tol()));

    // Derivative blocks stay inside their phase.
    assert!(nearly_equal(x.jac[(0, 0)], 1.0 / 3136.0, tol()));
    assert!(nearly_equal(x.jac[(0, 1)], -55.0 / 3136.0, tol()));
    assert_eq!(x.jac[(0, 2)], 0.0);
    assert_eq!(x.jac[(2, 0)], 0.0);
    // Pure phase: the fraction is pinned at one, its derivative is zero.
    assert_eq!(x.jac[(2, 2)], 0.0);
}

#[test]
fn ln_activity_queries_assemble_global_vectors() {
    let props = fixture_engine();

    let lna = props.ln_activities().unwrap();
    assert_eq!(
        lna.val,
        DVector::from_column_slice(&[0.5, -1.0, 0.25])
    );
    assert_eq!(lna.jac[(1, 1)], 0.2);
    assert_eq!(lna.jac[(2, 2)], 0.05);
    assert_eq!(lna.jac[(1, 2)], 0.0);

    let lnc = props.ln_activity_constants().unwrap();
    assert_eq!(lnc, DVector::from_column_slice(&[1.5, 2.5, 3.5]));
}

#[test]
fn chemical_potential_identity() {
    let props = fixture_engine();
    let mu = props.chemical_potentials().unwrap();
    let g = props.standard_partial_molar_gibbs_energies().unwrap();
    let lna = props.ln_activities().unwrap();
    let rt = GAS_CONSTANT * 298.15;

    for i in 0..3 {
        assert!(nearly_equal(mu.val[i], g[i] + rt * lna.val[i], tol()));
    }
    // μ derivatives come from the activities alone.
    assert!(nearly_equal(mu.jac[(1, 1)], rt * 0.2, tol()));
    assert_eq!(mu.jac[(0, 2)], 0.0);
}

#[test]
fn standard_property_identities() {
    let props = fixture_engine();
    let g = props.standard_partial_molar_gibbs_energies().unwrap();
    let h = props.standard_partial_molar_enthalpies().unwrap();
    let v = props.standard_partial_molar_volumes().unwrap();

    assert_eq!(g, DVector::from_column_slice(&[100.0, 200.0, 500.0]));

    let s = props.standard_partial_molar_entropies().unwrap();
    let u = props.standard_partial_molar_internal_energies().unwrap();
    let a = props.standard_partial_molar_helmholtz_energies().unwrap();
    for i in 0..3 {
        assert!(nearly_equal(s[i], (h[i] - g[i]) / 298.15, tol()));
        assert!(nearly_equal(u[i], h[i] - 101_325.0 * v[i], tol()));
        assert!(nearly_equal(a[i], g[i] - 101_325.0 * v[i], tol()));
    }
}

#[test]
fn phase_molar_gibbs_energy_weights_fractions_and_adds_residual() {
    let props = fixture_engine();
    let g = props.phase_molar_gibbs_energies().unwrap();

    let expected_aqueous = (55.0 / 56.0) * 100.0 + (1.0 / 56.0) * 200.0 + 7.0;
    assert!(nearly_equal(g.val[0], expected_aqueous, tol()));
    assert!(nearly_equal(g.val[1], 500.0 + 2.0, tol()));

    // ∂/∂n0 = Σ G°_i ∂x_i/∂n0 + residual gradient
    let expected_d0 = 100.0 / 3136.0 - 200.0 / 3136.0 + 0.3;
    assert!(nearly_equal(g.jac[(0, 0)], expected_d0, tol()));
    assert!(nearly_equal(g.jac[(1, 2)], 0.1, tol()));
    assert_eq!(g.jac[(0, 2)], 0.0);
    assert_eq!(g.jac[(1, 0)], 0.0);
}

#[test]
fn phase_molar_volume_prefers_reported_value() {
    let props = fixture_engine();
    let v = props.phase_molar_volumes().unwrap();

    // Aqueous: the chemical model reports 2.5 > 0, so it wins.
    assert_eq!(v.val[0], 2.5);
    assert_eq!(v.jac[(0, 0)], 0.01);
    assert_eq!(v.jac[(0, 1)], 0.02);

    // Gaseous: reported volume is zero, the mole-fraction-weighted sum of
    // standard volumes is used (pure phase: exactly the standard volume).
    assert_eq!(v.val[1], 30.0);
    assert_eq!(v.jac[(1, 2)], 0.0);
}

#[test]
fn phase_energy_identities() {
    let props = fixture_engine();
    let g = props.phase_molar_gibbs_energies().unwrap();
    let h = props.phase_molar_enthalpies().unwrap();
    let v = props.phase_molar_volumes().unwrap();
    let s = props.phase_molar_entropies().unwrap();
    let u = props.phase_molar_internal_energies().unwrap();
    let a = props.phase_molar_helmholtz_energies().unwrap();

    for i in 0..2 {
        assert!(nearly_equal(s.val[i], (h.val[i] - g.val[i]) / 298.15, tol()));
        assert!(nearly_equal(u.val[i], h.val[i] - 101_325.0 * v.val[i], tol()));
        assert!(nearly_equal(a.val[i], g.val[i] - 101_325.0 * v.val[i], tol()));
    }
    // The identities propagate to derivatives as well.
    assert!(nearly_equal(
        s.jac[(0, 0)],
        (h.jac[(0, 0)] - g.jac[(0, 0)]) / 298.15,
        tol()
    ));
}

#[test]
fn phase_amounts_and_masses() {
    let props = fixture_engine();

    let amounts = props.phase_amounts().unwrap();
    assert_eq!(amounts.val, DVector::from_column_slice(&[56.0, 2.0]));
    assert_eq!(amounts.jac[(0, 0)], 1.0);
    assert_eq!(amounts.jac[(0, 1)], 1.0);
    assert_eq!(amounts.jac[(0, 2)], 0.0);
    assert_eq!(amounts.jac[(1, 2)], 1.0);

    let masses = props.phase_masses().unwrap();
    assert!(nearly_equal(masses.val[0], 55.0 * 0.018 + 0.001, tol()));
    assert!(nearly_equal(masses.val[1], 2.0 * 0.044, tol()));
    assert!(nearly_equal(masses.jac[(0, 0)], 0.018, tol()));
    assert!(nearly_equal(masses.jac[(0, 1)], 0.001, tol()));
    assert!(nearly_equal(masses.jac[(1, 2)], 0.044, tol()));
    assert_eq!(masses.jac[(0, 2)], 0.0);
}

#[test]
fn phase_density_and_specific_properties() {
    let props = fixture_engine();

    let rho = props.phase_densities().unwrap();
    let mass_aqueous = 55.0 * 0.018 + 0.001;
    assert!(nearly_equal(rho.val[0], mass_aqueous / (56.0 * 2.5), tol()));
    assert!(nearly_equal(rho.val[1], (2.0 * 0.044) / (2.0 * 30.0), tol()));

    let g_molar = props.phase_molar_gibbs_energies().unwrap();
    let g_specific = props.phase_specific_gibbs_energies().unwrap();
    assert!(nearly_equal(
        g_specific.val[0],
        56.0 / mass_aqueous * g_molar.val[0],
        tol()
    ));
}

#[test]
fn total_volume_matches_hand_computation() {
    let props = fixture_engine();
    let volume = props.volume().unwrap();

    // 56 mol × 2.5 m³/mol + 2 mol × 30 m³/mol
    assert!(nearly_equal(volume.val, 200.0, tol()));
    // d/dn0 = 1·2.5 + 56·0.01, d/dn1 = 1·2.5 + 56·0.02, d/dn2 = 1·30
    assert!(nearly_equal(volume.grad[0], 3.06, tol()));
    assert!(nearly_equal(volume.grad[1], 3.62, tol()));
    assert!(nearly_equal(volume.grad[2], 30.0, tol()));

    let per_phase = props.phase_volumes().unwrap();
    assert!(nearly_equal(per_phase.val[0], 140.0, tol()));
    assert!(nearly_equal(per_phase.val[1], 60.0, tol()));
}

#[test]
fn ph_without_aqueous_phase_is_zero_sentinel() {
    let system = Arc::new(
        ChemicalSystem::new(vec![Phase::new(
            "Gaseous",
            vec![Species::new("CO2(g)", 0.044)],
        )])
        .unwrap(),
    );
    let thermo = Arc::new(ConstantThermoModel::new(vec![PhaseThermoProps::zeros(1)]));
    let chemical = Arc::new(TableChemicalModel {
        phases: vec![PhaseChemicalProps::zeros(1)],
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut props = SystemProperties::new(system, thermo, chemical);
    props
        .update_with_amounts(k(298.15), pa(101_325.0), DVector::from_column_slice(&[2.0]))
        .unwrap();

    let ph = props.ph().unwrap();
    assert_eq!(ph.val, 0.0);
    assert_eq!(ph.grad, DVector::zeros(1));

    // pe degrades the same way when no aqueous phase exists.
    let pe = props.pe().unwrap();
    assert_eq!(pe.val, 0.0);
    assert_eq!(pe.grad, DVector::zeros(1));
}

#[test]
fn ph_with_known_hydron_activity() {
    let system = fixture_system();
    let mut aqueous = PhaseChemicalProps::zeros(2);
    aqueous.ln_activities = DualVector::new(
        DVector::from_column_slice(&[0.0, 1e-5_f64.ln()]),
        DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]),
    )
    .unwrap();
    let chemical = Arc::new(TableChemicalModel {
        phases: vec![aqueous, PhaseChemicalProps::zeros(1)],
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut props = SystemProperties::new(system, fixture_thermo(), chemical);
    props
        .update_with_amounts(
            k(298.15),
            pa(101_325.0),
            DVector::from_column_slice(&[55.0, 1.0, 2.0]),
        )
        .unwrap();

    let ph = props.ph().unwrap();
    assert!(nearly_equal(ph.val, 5.0, tol()));
    // Nonzero only at the hydron's global index.
    assert_eq!(ph.grad.len(), 3);
    assert_eq!(ph.grad[0], 0.0);
    assert!(nearly_equal(ph.grad[1], -1.0 / LN_10, tol()));
    assert_eq!(ph.grad[2], 0.0);
}

#[test]
fn ph_without_hydron_is_zero_sentinel() {
    let system = Arc::new(
        ChemicalSystem::new(vec![Phase::new(
            "Aqueous",
            vec![
                Species::new("H2O(l)", 0.018),
                Species::new("Na+", 0.023),
            ],
        )])
        .unwrap(),
    );
    let thermo = Arc::new(ConstantThermoModel::new(vec![PhaseThermoProps::zeros(2)]));
    let chemical = Arc::new(TableChemicalModel {
        phases: vec![PhaseChemicalProps::zeros(2)],
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut props = SystemProperties::new(system, thermo, chemical);
    props
        .update_with_amounts(
            k(298.15),
            pa(101_325.0),
            DVector::from_column_slice(&[55.0, 0.1]),
        )
        .unwrap();

    let ph = props.ph().unwrap();
    assert_eq!(ph.val, 0.0);
    assert_eq!(ph.grad, DVector::zeros(2));
}

/// Single aqueous phase [H2O(l), H+, H2(aq)] with zero standard Gibbs
/// energies and a(H+) = 0.1, used for the pe hand computation.
fn pe_fixture() -> SystemProperties {
    let system = Arc::new(
        ChemicalSystem::new(vec![Phase::new(
            "Aqueous",
            vec![
                Species::new("H2O(l)", 0.018),
                Species::new("H+", 0.001),
                Species::new("H2(aq)", 0.002),
            ],
        )])
        .unwrap(),
    );
    let thermo = Arc::new(ConstantThermoModel::new(vec![PhaseThermoProps::zeros(3)]));
    let mut aqueous = PhaseChemicalProps::zeros(3);
    aqueous.ln_activities = DualVector::new(
        DVector::from_column_slice(&[0.0, 0.1_f64.ln(), 0.0]),
        DMatrix::from_row_slice(3, 3, &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]),
    )
    .unwrap();
    let chemical = Arc::new(TableChemicalModel {
        phases: vec![aqueous],
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut props = SystemProperties::new(system, thermo, chemical);
    props
        .update_with_amounts(
            k(298.15),
            pa(101_325.0),
            DVector::from_column_slice(&[55.0, 0.1, 0.01]),
        )
        .unwrap();
    props
}

#[test]
fn pe_default_half_reaction_hand_computation() {
    let props = pe_fixture();
    let pe = props.pe().unwrap();

    // With all standard Gibbs energies zero:
    // pe = −[−1·0 + 2·ln a(H+)]/2 / (−ln 10) = ln a(H+)/ln 10 = −1
    assert!(nearly_equal(pe.val, -1.0, tol()));
    assert_eq!(pe.grad[0], 0.0);
    assert!(nearly_equal(pe.grad[1], 1.0 / LN_10, tol()));
    assert_eq!(pe.grad[2], 0.0);
}

#[test]
fn pe_accepts_bracketed_electron_spelling() {
    let props = pe_fixture();
    let reaction =
        HalfReaction::from_terms([("H2(aq)", -1.0), ("H+", 2.0), ("e[-]", 2.0)]);
    let pe = props.pe_with_reaction(&reaction).unwrap();
    assert!(nearly_equal(pe.val, -1.0, tol()));
}

#[test]
fn pe_without_electron_fails_precondition() {
    let props = pe_fixture();
    let reaction = HalfReaction::from_terms([("H2(aq)", -1.0), ("H+", 2.0)]);
    assert!(matches!(
        props.pe_with_reaction(&reaction),
        Err(PropsError::MissingElectron)
    ));
}

#[test]
fn pe_with_unresolvable_species_fails_hard() {
    let props = pe_fixture();
    let reaction =
        HalfReaction::from_terms([("O2(aq)", -1.0), ("H+", 4.0), ("e-", 4.0)]);
    assert!(matches!(
        props.pe_with_reaction(&reaction),
        Err(PropsError::System(_))
    ));
}

#[test]
fn thermo_only_update_leaves_chemical_results_stale() {
    let system = fixture_system();
    let calls = Arc::new(AtomicUsize::new(0));
    let thermo = Arc::new(TempScaledThermoModel { sizes: vec![2, 1] });
    let chemical = fixture_chemical(calls.clone());
    let mut props = SystemProperties::new(system, thermo, chemical);

    props
        .update_with_amounts(
            k(300.0),
            pa(101_325.0),
            DVector::from_column_slice(&[55.0, 1.0, 2.0]),
        )
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let lna_before = props.ln_activities().unwrap();
    let g_before = props.standard_partial_molar_gibbs_energies().unwrap();
    assert_eq!(g_before, DVector::from_element(3, 300.0));

    // Thermo-only update: standard properties move with T, the chemical
    // model is not re-evaluated and its cached results are unchanged.
    props.update(k(350.0), pa(101_325.0)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let g_after = props.standard_partial_molar_gibbs_energies().unwrap();
    assert_eq!(g_after, DVector::from_element(3, 350.0));
    assert_eq!(props.ln_activities().unwrap(), lna_before);
}

#[test]
fn cloned_engine_has_value_semantics() {
    let original = fixture_engine();
    let mut copy = original.clone();

    copy.update_with_amounts(
        k(350.0),
        pa(2_000_000.0),
        DVector::from_column_slice(&[1.0, 1.0, 1.0]),
    )
    .unwrap();

    assert_eq!(original.temperature().unwrap().value, 298.15);
    assert_eq!(
        original.amounts().unwrap(),
        &DVector::from_column_slice(&[55.0, 1.0, 2.0])
    );
    let x = original.molar_fractions().unwrap();
    assert!(nearly_equal(x.val[0], 55.0 / 56.0, tol()));

    assert_eq!(copy.temperature().unwrap().value, 350.0);
    let x_copy = copy.molar_fractions().unwrap();
    assert!(nearly_equal(x_copy.val[0], 0.5, tol()));
}
