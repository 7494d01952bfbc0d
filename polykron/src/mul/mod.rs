//! Polynomial multiplication kernels.
//!
//! Both kernels produce the same set of non-zero terms; the parallel one
//! partitions the output space into hash segments and fills them from worker
//! threads, the simple one is the single-threaded reference.

mod parallel;
mod simple;

pub use parallel::mul_mt_hm;
pub use simple::mul_simple;

use num::bigint::BigInt;

use crate::coefficient::Coefficient;
use crate::kronecker::{Error, PackedWord, Result, SymbolSet};
use crate::polynomial::Polynomial;

/// Keep only products whose partial degree over the selected symbols stays
/// within `degree`. Without an explicit selection the degree is measured
/// over the operands' full symbol set.
#[derive(Clone, Debug)]
pub struct Truncation {
    degree: BigInt,
    symbols: Option<SymbolSet>,
}

impl Truncation {
    /// Bound the degree over the full symbol set of the operands.
    pub fn total(degree: impl Into<BigInt>) -> Self {
        Self {
            degree: degree.into(),
            symbols: None,
        }
    }

    /// Bound the degree over `symbols` only; exponents of other symbols do
    /// not count.
    pub fn over(degree: impl Into<BigInt>, symbols: SymbolSet) -> Self {
        Self {
            degree: degree.into(),
            symbols: Some(symbols),
        }
    }

    pub fn degree(&self) -> &BigInt {
        &self.degree
    }

    pub fn symbols(&self) -> Option<&SymbolSet> {
        self.symbols.as_ref()
    }

    /// Positions in `operands` the degree is measured over.
    pub(crate) fn positions(&self, operands: &SymbolSet) -> Vec<usize> {
        match &self.symbols {
            Some(symbols) => operands.positions_of(symbols),
            None => (0..operands.len()).collect(),
        }
    }
}

/// Both multipliers insist on an empty destination carrying the operands'
/// symbol set.
pub(crate) fn check_preconditions<W: PackedWord, C: Coefficient>(
    h: &Polynomial<W, C>,
    f: &Polynomial<W, C>,
    g: &Polynomial<W, C>,
) -> Result<()> {
    if f.symbol_set() != g.symbol_set() || h.symbol_set() != f.symbol_set() {
        return Err(Error::InvalidArgument(format!(
            "symbol sets must coincide: destination {}, operands {} and {}",
            h.symbol_set(),
            f.symbol_set(),
            g.symbol_set(),
        )));
    }
    if !h.is_empty() {
        return Err(Error::InvalidArgument(
            "the destination polynomial must be empty".into(),
        ));
    }
    Ok(())
}
