//! pf-core: stable foundation for phaseflow.
//!
//! Contains:
//! - dual (derivative-carrying scalar/vector quantities over species amounts)
//! - units (uom SI types + constructors + physical constants)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod dual;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use dual::{DualScalar, DualVector, mole_fractions};
pub use error::{PfError, PfResult};
pub use numeric::*;
pub use units::*;
