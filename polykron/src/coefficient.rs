use core::fmt::{Debug, Display};

use num::bigint::BigInt;
use num::rational::BigRational;
use num::{One, Zero};

use crate::kronecker::{Error, Result};

/// The coefficient-ring contract the polynomial engine relies on.
///
/// Addition, multiplication and negation may be partial; a failure surfaces
/// as [`Error::Coefficient`] and aborts the enclosing operation. Exact rings
/// guarantee that accumulating to zero removes the term; approximate rings
/// such as `f64` only remove terms that combine to exact zero.
pub trait Coefficient: 'static + Clone + Debug + Display + PartialEq + Send + Sync {
    fn zero() -> Self;

    fn one() -> Self;

    fn is_zero(&self) -> bool;

    /// Adds `rhs` into `self`; `self` is left unchanged on failure.
    fn checked_add_assign(&mut self, rhs: &Self) -> Result<()>;

    fn checked_mul(&self, rhs: &Self) -> Result<Self>;

    fn checked_neg(&self) -> Result<Self>;
}

impl Coefficient for BigInt {
    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        One::one()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn checked_add_assign(&mut self, rhs: &Self) -> Result<()> {
        *self += rhs;
        Ok(())
    }

    fn checked_mul(&self, rhs: &Self) -> Result<Self> {
        Ok(self * rhs)
    }

    fn checked_neg(&self) -> Result<Self> {
        Ok(-self)
    }
}

impl Coefficient for BigRational {
    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        One::one()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn checked_add_assign(&mut self, rhs: &Self) -> Result<()> {
        *self += rhs;
        Ok(())
    }

    fn checked_mul(&self, rhs: &Self) -> Result<Self> {
        Ok(self * rhs)
    }

    fn checked_neg(&self) -> Result<Self> {
        Ok(-self)
    }
}

/// Machine-word ring. All operations are overflow-checked, so a coefficient
/// that no longer fits aborts the computation instead of wrapping silently.
impl Coefficient for i64 {
    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn checked_add_assign(&mut self, rhs: &Self) -> Result<()> {
        *self = i64::checked_add(*self, *rhs).ok_or_else(|| {
            Error::Coefficient(format!("{} + {} overflows i64", self, rhs))
        })?;
        Ok(())
    }

    fn checked_mul(&self, rhs: &Self) -> Result<Self> {
        i64::checked_mul(*self, *rhs)
            .ok_or_else(|| Error::Coefficient(format!("{} * {} overflows i64", self, rhs)))
    }

    fn checked_neg(&self) -> Result<Self> {
        i64::checked_neg(*self)
            .ok_or_else(|| Error::Coefficient(format!("-({}) overflows i64", self)))
    }
}

/// Approximate ring: terms are only removed when they accumulate to exact
/// zero.
impl Coefficient for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn checked_add_assign(&mut self, rhs: &Self) -> Result<()> {
        *self += rhs;
        Ok(())
    }

    fn checked_mul(&self, rhs: &Self) -> Result<Self> {
        Ok(self * rhs)
    }

    fn checked_neg(&self) -> Result<Self> {
        Ok(-self)
    }
}
