//! Half-reaction descriptors for redox-potential queries.
//!
//! A half reaction is an ordered mapping from species name to signed
//! stoichiometric coefficient. Species on the product side carry positive
//! coefficients, species on the reactant side negative ones, so
//! `"H2(aq) = 2*H+ + 2*e-"` maps to `{H2(aq): -1, H+: 2, e-: 2}`.

use std::str::FromStr;

use crate::error::{SystemError, SystemResult};

/// An ordered species-name → stoichiometric-coefficient mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfReaction {
    terms: Vec<(String, f64)>,
}

impl HalfReaction {
    /// Build from explicit (name, coefficient) pairs.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(|(s, c)| (s.into(), c)).collect(),
        }
    }

    /// The default hydrogen half reaction `H2(aq) = 2*H+ + 2*e-`.
    pub fn hydrogen() -> Self {
        Self::from_terms([("H2(aq)", -1.0), ("H+", 2.0), ("e-", 2.0)])
    }

    /// Stoichiometric coefficient of the named species, 0 if absent.
    /// A species listed more than once contributes the sum of its entries.
    pub fn stoichiometry(&self, name: &str) -> f64 {
        self.terms
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, c)| c)
            .sum()
    }

    /// The (name, coefficient) terms in declaration order.
    pub fn terms(&self) -> &[(String, f64)] {
        &self.terms
    }
}

impl FromStr for HalfReaction {
    type Err = SystemError;

    /// Parse an equation of the form `"H2(aq) = 2*H+ + 2*e-"`. Terms are
    /// separated by `" + "` (species names may themselves contain `+`);
    /// each term is `coefficient*name` or a bare name with coefficient 1.
    fn from_str(text: &str) -> SystemResult<Self> {
        let (lhs, rhs) = text
            .split_once('=')
            .ok_or_else(|| SystemError::MalformedEquation {
                what: format!("missing `=` in {text:?}"),
            })?;

        let mut terms = Vec::new();
        for (side, sign) in [(lhs, -1.0), (rhs, 1.0)] {
            for term in side.split(" + ") {
                let term = term.trim();
                if term.is_empty() {
                    return Err(SystemError::MalformedEquation {
                        what: format!("empty term in {text:?}"),
                    });
                }
                let (coeff, name) = match term.split_once('*') {
                    Some((c, n)) => {
                        let coeff =
                            c.trim()
                                .parse::<f64>()
                                .map_err(|_| SystemError::MalformedEquation {
                                    what: format!("bad coefficient {c:?} in {text:?}"),
                                })?;
                        (coeff, n.trim())
                    }
                    None => (1.0, term),
                };
                if name.is_empty() {
                    return Err(SystemError::MalformedEquation {
                        what: format!("missing species name in {text:?}"),
                    });
                }
                terms.push((name.to_string(), sign * coeff));
            }
        }
        Ok(Self { terms })
    }
}
