//! Derivative-carrying scalar and vector quantities.
//!
//! Every composition-dependent quantity in the property layer carries its
//! value together with a dense row of partial derivatives with respect to
//! species amounts. Arithmetic operators propagate those derivatives (sum,
//! product and quotient rules), so composite properties fall out of plain
//! expressions with their sensitivities intact.
//!
//! Quantities computed inside a single phase use that phase's local index
//! space (derivative length = number of species in the phase). They must be
//! re-expanded into the global space with [`DualScalar::embed`] or
//! [`DualVector::set_rows`] before being combined with quantities from other
//! phases or handed back to callers. The expansion is always explicit; the
//! operators themselves never resize.
//!
//! Combining two quantities whose derivative axes cover different index
//! spaces is a caller error, checked with debug assertions only. Division by
//! a zero-valued quantity is likewise a caller precondition and is not
//! guarded.

use nalgebra::{DMatrix, DVector};
use std::ops::{Add, Div, DivAssign, Mul, Neg, Sub, SubAssign};

use crate::error::{PfError, PfResult};

/// A scalar value with partial derivatives with respect to species amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct DualScalar {
    /// The value.
    pub val: f64,
    /// Partial derivatives of the value, one entry per species amount.
    pub grad: DVector<f64>,
}

impl DualScalar {
    /// Zero value with a zero derivative row of length `nvars`.
    pub fn zeros(nvars: usize) -> Self {
        Self {
            val: 0.0,
            grad: DVector::zeros(nvars),
        }
    }

    /// A constant: the derivative row is all zeros.
    pub fn constant(val: f64, nvars: usize) -> Self {
        Self {
            val,
            grad: DVector::zeros(nvars),
        }
    }

    /// Build from a value and an explicit derivative row.
    pub fn new(val: f64, grad: DVector<f64>) -> Self {
        Self { val, grad }
    }

    /// Number of derivative variables.
    pub fn nvars(&self) -> usize {
        self.grad.len()
    }

    /// Re-expand a locally-indexed derivative row into a larger index space.
    ///
    /// The existing entries land at columns `offset..offset + nvars`; every
    /// other position is zero. This is the only sanctioned way to move a
    /// per-phase quantity into the system-wide index space.
    pub fn embed(&self, total: usize, offset: usize) -> PfResult<DualScalar> {
        if offset + self.nvars() > total {
            return Err(PfError::ShapeMismatch {
                what: "embed target too small for derivative row",
                expected: offset + self.nvars(),
                got: total,
            });
        }
        let mut grad = DVector::zeros(total);
        grad.rows_mut(offset, self.nvars()).copy_from(&self.grad);
        Ok(DualScalar {
            val: self.val,
            grad,
        })
    }
}

impl Neg for DualScalar {
    type Output = DualScalar;
    fn neg(self) -> DualScalar {
        DualScalar {
            val: -self.val,
            grad: -self.grad,
        }
    }
}

impl Add for DualScalar {
    type Output = DualScalar;
    fn add(self, rhs: DualScalar) -> DualScalar {
        debug_assert_eq!(self.nvars(), rhs.nvars());
        DualScalar {
            val: self.val + rhs.val,
            grad: self.grad + rhs.grad,
        }
    }
}

impl Add<&DualScalar> for DualScalar {
    type Output = DualScalar;
    fn add(self, rhs: &DualScalar) -> DualScalar {
        debug_assert_eq!(self.nvars(), rhs.nvars());
        DualScalar {
            val: self.val + rhs.val,
            grad: self.grad + &rhs.grad,
        }
    }
}

impl Add<f64> for DualScalar {
    type Output = DualScalar;
    fn add(self, rhs: f64) -> DualScalar {
        DualScalar {
            val: self.val + rhs,
            grad: self.grad,
        }
    }
}

impl Sub for DualScalar {
    type Output = DualScalar;
    fn sub(self, rhs: DualScalar) -> DualScalar {
        debug_assert_eq!(self.nvars(), rhs.nvars());
        DualScalar {
            val: self.val - rhs.val,
            grad: self.grad - rhs.grad,
        }
    }
}

impl Sub<f64> for DualScalar {
    type Output = DualScalar;
    fn sub(self, rhs: f64) -> DualScalar {
        DualScalar {
            val: self.val - rhs,
            grad: self.grad,
        }
    }
}

impl SubAssign for DualScalar {
    fn sub_assign(&mut self, rhs: DualScalar) {
        debug_assert_eq!(self.nvars(), rhs.nvars());
        self.val -= rhs.val;
        self.grad -= rhs.grad;
    }
}

impl SubAssign<f64> for DualScalar {
    fn sub_assign(&mut self, rhs: f64) {
        self.val -= rhs;
    }
}

impl Mul for DualScalar {
    type Output = DualScalar;
    /// Product rule: d(uv) = u·dv + v·du.
    fn mul(self, rhs: DualScalar) -> DualScalar {
        debug_assert_eq!(self.nvars(), rhs.nvars());
        DualScalar {
            val: self.val * rhs.val,
            grad: rhs.grad * self.val + self.grad * rhs.val,
        }
    }
}

impl Mul<f64> for DualScalar {
    type Output = DualScalar;
    fn mul(self, rhs: f64) -> DualScalar {
        DualScalar {
            val: self.val * rhs,
            grad: self.grad * rhs,
        }
    }
}

impl Mul<DualScalar> for f64 {
    type Output = DualScalar;
    fn mul(self, rhs: DualScalar) -> DualScalar {
        rhs * self
    }
}

impl Div for DualScalar {
    type Output = DualScalar;
    /// Quotient rule: d(u/v) = (v·du − u·dv)/v².
    fn div(self, rhs: DualScalar) -> DualScalar {
        debug_assert_eq!(self.nvars(), rhs.nvars());
        let v2 = rhs.val * rhs.val;
        DualScalar {
            val: self.val / rhs.val,
            grad: (self.grad * rhs.val - rhs.grad * self.val) / v2,
        }
    }
}

impl Div<f64> for DualScalar {
    type Output = DualScalar;
    fn div(self, rhs: f64) -> DualScalar {
        DualScalar {
            val: self.val / rhs,
            grad: self.grad / rhs,
        }
    }
}

impl DivAssign<f64> for DualScalar {
    fn div_assign(&mut self, rhs: f64) {
        self.val /= rhs;
        self.grad /= rhs;
    }
}

/// A vector of values with a Jacobian of partial derivatives with respect to
/// species amounts, one row per value.
#[derive(Debug, Clone, PartialEq)]
pub struct DualVector {
    /// The values.
    pub val: DVector<f64>,
    /// Jacobian: row i holds the derivatives of `val[i]`.
    pub jac: DMatrix<f64>,
}

impl DualVector {
    /// All-zero values and Jacobian.
    pub fn zeros(len: usize, nvars: usize) -> Self {
        Self {
            val: DVector::zeros(len),
            jac: DMatrix::zeros(len, nvars),
        }
    }

    /// A constant vector: the Jacobian is all zeros.
    pub fn constant(val: DVector<f64>, nvars: usize) -> Self {
        let len = val.len();
        Self {
            val,
            jac: DMatrix::zeros(len, nvars),
        }
    }

    /// The amounts vector itself as a differentiable quantity: the Jacobian
    /// is the identity (∂n_i/∂n_j = δ_ij), in the local space of the slice.
    pub fn amounts(n: &[f64]) -> Self {
        let len = n.len();
        Self {
            val: DVector::from_column_slice(n),
            jac: DMatrix::identity(len, len),
        }
    }

    /// Build from raw parts, checking that the Jacobian row count matches.
    pub fn new(val: DVector<f64>, jac: DMatrix<f64>) -> PfResult<Self> {
        if jac.nrows() != val.len() {
            return Err(PfError::ShapeMismatch {
                what: "Jacobian rows must match value length",
                expected: val.len(),
                got: jac.nrows(),
            });
        }
        Ok(Self { val, jac })
    }

    pub fn len(&self) -> usize {
        self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.val.len() == 0
    }

    /// Number of derivative variables.
    pub fn nvars(&self) -> usize {
        self.jac.ncols()
    }

    /// Clone out entry `i` as a scalar with its derivative row.
    pub fn get(&self, i: usize) -> DualScalar {
        DualScalar {
            val: self.val[i],
            grad: self.jac.row(i).transpose(),
        }
    }

    /// Place a locally-indexed block: values at rows `row_offset..` and the
    /// derivative block at columns `col_offset..`. Bounds are the caller's
    /// responsibility (they come from the phase partition).
    pub fn set_rows(&mut self, row_offset: usize, col_offset: usize, local: &DualVector) {
        debug_assert!(row_offset + local.len() <= self.len());
        debug_assert!(col_offset + local.nvars() <= self.nvars());
        self.val
            .rows_mut(row_offset, local.len())
            .copy_from(&local.val);
        self.jac
            .view_mut((row_offset, col_offset), (local.len(), local.nvars()))
            .copy_from(&local.jac);
    }

    /// Place a locally-indexed scalar at row `row`, its derivative row at
    /// columns `col_offset..`.
    pub fn set_row(&mut self, row: usize, col_offset: usize, local: &DualScalar) {
        debug_assert!(col_offset + local.nvars() <= self.nvars());
        self.val[row] = local.val;
        self.jac
            .view_mut((row, col_offset), (1, local.nvars()))
            .copy_from(&local.grad.transpose());
    }

    /// Sum of all entries.
    pub fn sum(&self) -> DualScalar {
        DualScalar {
            val: self.val.sum(),
            grad: self.jac.row_sum().transpose(),
        }
    }

    /// Weighted sum against a constant vector: Σ wᵢ·selfᵢ.
    pub fn dot(&self, w: &[f64]) -> DualScalar {
        debug_assert_eq!(self.len(), w.len());
        let mut grad = DVector::zeros(self.nvars());
        let mut val = 0.0;
        for (i, wi) in w.iter().enumerate() {
            val += wi * self.val[i];
            grad += self.jac.row(i).transpose() * *wi;
        }
        DualScalar { val, grad }
    }
}

impl Add for DualVector {
    type Output = DualVector;
    fn add(self, rhs: DualVector) -> DualVector {
        debug_assert_eq!(self.len(), rhs.len());
        debug_assert_eq!(self.nvars(), rhs.nvars());
        DualVector {
            val: self.val + rhs.val,
            jac: self.jac + rhs.jac,
        }
    }
}

impl Sub for DualVector {
    type Output = DualVector;
    fn sub(self, rhs: DualVector) -> DualVector {
        debug_assert_eq!(self.len(), rhs.len());
        debug_assert_eq!(self.nvars(), rhs.nvars());
        DualVector {
            val: self.val - rhs.val,
            jac: self.jac - rhs.jac,
        }
    }
}

impl Add<&DVector<f64>> for DualVector {
    type Output = DualVector;
    /// Shift by a constant vector; the Jacobian is unchanged.
    fn add(self, rhs: &DVector<f64>) -> DualVector {
        debug_assert_eq!(self.len(), rhs.len());
        DualVector {
            val: self.val + rhs,
            jac: self.jac,
        }
    }
}

impl Sub<&DVector<f64>> for DualVector {
    type Output = DualVector;
    fn sub(self, rhs: &DVector<f64>) -> DualVector {
        debug_assert_eq!(self.len(), rhs.len());
        DualVector {
            val: self.val - rhs,
            jac: self.jac,
        }
    }
}

impl Mul for DualVector {
    type Output = DualVector;
    /// Component-wise product, product rule applied per row.
    fn mul(self, rhs: DualVector) -> DualVector {
        debug_assert_eq!(self.len(), rhs.len());
        debug_assert_eq!(self.nvars(), rhs.nvars());
        let mut jac = DMatrix::zeros(self.len(), self.nvars());
        for i in 0..self.len() {
            let row = self.jac.row(i) * rhs.val[i] + rhs.jac.row(i) * self.val[i];
            jac.row_mut(i).copy_from(&row);
        }
        DualVector {
            val: self.val.component_mul(&rhs.val),
            jac,
        }
    }
}

impl Div for DualVector {
    type Output = DualVector;
    /// Component-wise quotient, quotient rule applied per row. Zero-valued
    /// divisor entries are a caller precondition.
    fn div(self, rhs: DualVector) -> DualVector {
        debug_assert_eq!(self.len(), rhs.len());
        debug_assert_eq!(self.nvars(), rhs.nvars());
        let mut jac = DMatrix::zeros(self.len(), self.nvars());
        for i in 0..self.len() {
            let v2 = rhs.val[i] * rhs.val[i];
            let row = (self.jac.row(i) * rhs.val[i] - rhs.jac.row(i) * self.val[i]) / v2;
            jac.row_mut(i).copy_from(&row);
        }
        DualVector {
            val: self.val.component_div(&rhs.val),
            jac,
        }
    }
}

impl Mul<f64> for DualVector {
    type Output = DualVector;
    fn mul(self, rhs: f64) -> DualVector {
        DualVector {
            val: self.val * rhs,
            jac: self.jac * rhs,
        }
    }
}

impl Div<f64> for DualVector {
    type Output = DualVector;
    fn div(self, rhs: f64) -> DualVector {
        DualVector {
            val: self.val / rhs,
            jac: self.jac / rhs,
        }
    }
}

/// Intra-phase molar fractions of a phase's species amounts, with analytic
/// derivatives with respect to those amounts (local index space):
/// x_i = n_i/n_total, ∂x_i/∂n_j = (δ_ij·n_total − n_i)/n_total².
///
/// A zero phase total yields the all-zero result; callers treat the phase as
/// absent rather than failing.
pub fn mole_fractions(n: &[f64]) -> DualVector {
    let len = n.len();
    let nt: f64 = n.iter().sum();
    if nt == 0.0 {
        return DualVector::zeros(len, len);
    }
    let nt2 = nt * nt;
    let mut val = DVector::zeros(len);
    let mut jac = DMatrix::zeros(len, len);
    for i in 0..len {
        val[i] = n[i] / nt;
        for j in 0..len {
            jac[(i, j)] = if i == j {
                (nt - n[i]) / nt2
            } else {
                -n[i] / nt2
            };
        }
    }
    DualVector { val, jac }
}
