//! pf-props: thermodynamic and chemical property aggregation for phaseflow.
//!
//! Provides:
//! - Raw per-phase model result types (`PhaseThermoProps`, `PhaseChemicalProps`)
//! - The `ThermoModel`/`ChemicalModel` evaluator traits
//! - Reference backends (constant tables, ideal solution)
//! - The `SystemProperties` engine: snapshot + cached raw results, with
//!   every derived property recomputed on demand and carrying derivatives
//!   with respect to all species amounts
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nalgebra::DVector;
//! use pf_core::units::{k, pa};
//! use pf_system::{ChemicalSystem, Phase, Species};
//! use pf_props::{ConstantThermoModel, IdealChemicalModel, PhaseThermoProps, SystemProperties};
//!
//! let system = Arc::new(
//!     ChemicalSystem::new(vec![Phase::new(
//!         "Gaseous",
//!         vec![
//!             Species::new("N2(g)", 0.028014),
//!             Species::new("O2(g)", 0.031999),
//!         ],
//!     )])
//!     .unwrap(),
//! );
//!
//! let thermo = Arc::new(ConstantThermoModel::new(vec![PhaseThermoProps::zeros(2)]));
//! let chemical = Arc::new(IdealChemicalModel::new(system.clone()));
//!
//! let mut props = SystemProperties::new(system, thermo, chemical);
//! props
//!     .update_with_amounts(
//!         k(298.15),
//!         pa(101_325.0),
//!         DVector::from_column_slice(&[0.79, 0.21]),
//!     )
//!     .unwrap();
//!
//! let x = props.molar_fractions().unwrap();
//! assert!((x.val[0] - 0.79).abs() < 1e-12);
//! ```

pub mod engine;
pub mod error;
pub mod ideal;
pub mod model;

// Re-exports for ergonomics
pub use engine::SystemProperties;
pub use error::{PropsError, PropsResult};
pub use ideal::{ConstantThermoModel, IdealChemicalModel};
pub use model::{ChemicalModel, PhaseChemicalProps, PhaseThermoProps, ThermoModel};
