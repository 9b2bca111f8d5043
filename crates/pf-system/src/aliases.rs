//! Synonym tables for logical species.
//!
//! Species names vary across thermodynamic databases ("H+" vs "H[+]").
//! Lookups that need a logical species probe these fixed synonym lists in
//! order instead of scattering string literals through the code.

/// Accepted spellings for liquid water.
pub const WATER_ALIASES: &[&str] = &["H2O(l)", "H2O", "H2O@", "H2O(aq)", "Water"];

/// Accepted spellings for the hydron species.
pub const HYDRON_ALIASES: &[&str] = &["H+", "H[+]", "H+(aq)"];

/// Accepted spellings for the aqueous electron.
pub const ELECTRON_ALIASES: &[&str] = &["e-", "e[-]"];

/// Whether a species name is one of the electron spellings.
pub fn is_electron(name: &str) -> bool {
    ELECTRON_ALIASES.contains(&name)
}
