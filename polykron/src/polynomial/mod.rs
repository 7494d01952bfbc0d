use core::fmt;
use core::hash::BuildHasher;

use ahash::RandomState;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use num::bigint::BigInt;
use polykron_util::log2_strict;

use crate::coefficient::Coefficient;
use crate::kronecker::{Error, PackedMonomial, PackedWord, Result, SymbolSet};
use crate::mul::{mul_mt_hm, Truncation};

/// Upper bound on the segment exponent a caller may request; `2^16` segments
/// is far past any sensible split.
pub const MAX_LOG2_SEGMENTS: u32 = 16;

/// Fixed-seed hasher shared by every polynomial, so a monomial lands in the
/// same segment no matter which map it is routed from. Stable within a run.
fn segment_state() -> RandomState {
    RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    )
}

pub(crate) type TermMap<W, C> = HashMap<PackedMonomial<W>, C>;

/// Destination segment of a monomial under a power-of-two segment count.
pub(crate) fn segment_index<W: PackedWord>(key: PackedMonomial<W>, n_segments: usize) -> usize {
    debug_assert!(n_segments.is_power_of_two());
    (segment_state().hash_one(key) as usize) & (n_segments - 1)
}

/// Combines `coeff` into `map` under `key`: duplicate keys accumulate, exact
/// zeros are never stored.
pub(crate) fn accumulate_term<W: PackedWord, C: Coefficient>(
    map: &mut TermMap<W, C>,
    key: PackedMonomial<W>,
    coeff: C,
) -> Result<()> {
    match map.entry(key) {
        Entry::Occupied(mut entry) => {
            entry.get_mut().checked_add_assign(&coeff)?;
            if entry.get().is_zero() {
                entry.remove();
            }
        }
        Entry::Vacant(entry) => {
            if !coeff.is_zero() {
                entry.insert(coeff);
            }
        }
    }
    Ok(())
}

/// A sparse polynomial: an unordered set of (monomial, coefficient) pairs
/// over a named symbol set, stored in `2^n` hash segments.
///
/// Invariants: every stored monomial is a valid packing at the symbol set's
/// arity, no two entries share a monomial, no entry holds an exact zero, and
/// a monomial resides in the segment its shared hash selects.
#[derive(Clone, Debug)]
pub struct Polynomial<W: PackedWord, C: Coefficient> {
    pub(crate) symbols: SymbolSet,
    /// Segment exponent requested for the next multiplication; zero lets the
    /// multiplier choose.
    pub(crate) requested_log2_segments: u32,
    pub(crate) segments: Vec<TermMap<W, C>>,
}

impl<W: PackedWord, C: Coefficient> Polynomial<W, C> {
    /// An empty polynomial over `symbols`, with no segments allocated yet.
    pub fn new(symbols: SymbolSet) -> Self {
        Self {
            symbols,
            requested_log2_segments: 0,
            segments: Vec::new(),
        }
    }

    /// Builds a polynomial from (exponent vector, coefficient) pairs,
    /// combining duplicates.
    pub fn from_terms<I>(symbols: SymbolSet, terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<W>, C)>,
    {
        let mut poly = Self::new(symbols);
        for (exponents, coeff) in terms {
            if exponents.len() != poly.arity() {
                return Err(Error::InvalidArgument(format!(
                    "exponent vector of length {} over the {}-symbol set {}",
                    exponents.len(),
                    poly.arity(),
                    poly.symbols,
                )));
            }
            let key = PackedMonomial::pack(&exponents)?;
            poly.insert_or_accumulate(key, coeff)?;
        }
        Ok(poly)
    }

    /// The constant polynomial `coeff`.
    pub fn constant(symbols: SymbolSet, coeff: C) -> Result<Self> {
        let mut poly = Self::new(symbols);
        poly.insert_or_accumulate(PackedMonomial::unit(), coeff)?;
        Ok(poly)
    }

    pub fn symbol_set(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn arity(&self) -> usize {
        self.symbols.len()
    }

    /// Replaces the symbol set; only valid while the polynomial is empty.
    pub fn set_symbol_set(&mut self, symbols: SymbolSet) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::InvalidArgument(
                "the symbol set can only be replaced on an empty polynomial".into(),
            ));
        }
        self.symbols = symbols;
        Ok(())
    }

    /// Requests `2^n` segments for subsequent storage; only valid while the
    /// polynomial is empty. Zero hands the choice back to the multiplier.
    pub fn set_n_segments(&mut self, n: u32) -> Result<()> {
        if n > MAX_LOG2_SEGMENTS {
            return Err(Error::InvalidArgument(format!(
                "2^{n} segments requested, the maximum is 2^{MAX_LOG2_SEGMENTS}",
            )));
        }
        if !self.is_empty() {
            return Err(Error::InvalidArgument(
                "the segment count can only be changed on an empty polynomial".into(),
            ));
        }
        self.requested_log2_segments = n;
        self.segments.clear();
        Ok(())
    }

    /// The segment exponent a caller has pinned, zero if the multiplier is
    /// free to choose.
    pub fn requested_log2_segments(&self) -> u32 {
        self.requested_log2_segments
    }

    /// Number of currently allocated segments; zero before first use.
    pub fn n_segments(&self) -> usize {
        self.segments.len()
    }

    /// Drops every term but keeps the symbol set and the requested segment
    /// count.
    pub fn clear_terms(&mut self) {
        for segment in &mut self.segments {
            segment.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.segments.iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(HashMap::is_empty)
    }

    /// Iterates the terms in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&PackedMonomial<W>, &C)> {
        self.segments.iter().flat_map(|segment| segment.iter())
    }

    pub fn get(&self, key: &PackedMonomial<W>) -> Option<&C> {
        if self.segments.is_empty() {
            return None;
        }
        self.segments[segment_index(*key, self.segments.len())].get(key)
    }

    /// Inserts a term, accumulating into an existing one with the same
    /// monomial; an accumulated exact zero removes the entry.
    pub fn insert_or_accumulate(&mut self, key: PackedMonomial<W>, coeff: C) -> Result<()> {
        key.validate(self.arity())?;
        self.ensure_segments();
        let n_segments = self.segments.len();
        accumulate_term(
            &mut self.segments[segment_index(key, n_segments)],
            key,
            coeff,
        )
    }

    fn ensure_segments(&mut self) {
        if self.segments.is_empty() {
            let count = 1usize << self.requested_log2_segments;
            self.segments = (0..count).map(|_| TermMap::new()).collect();
        }
    }

    /// Adopts fully-built segments; the multiplier's merge step ends here.
    pub(crate) fn install_segments(&mut self, segments: Vec<TermMap<W, C>>) {
        debug_assert_eq!(1 << log2_strict(segments.len()), segments.len());
        self.segments = segments;
    }

    /// Largest total degree among the terms, `None` for the zero polynomial.
    pub fn total_degree(&self) -> Result<Option<BigInt>> {
        let arity = self.arity();
        let mut best: Option<BigInt> = None;
        for (key, _) in self.iter() {
            let degree = key.total_degree(arity)?;
            if best.as_ref().map_or(true, |b| degree > *b) {
                best = Some(degree);
            }
        }
        Ok(best)
    }

    /// Largest partial degree over `selection` among the terms, `None` for
    /// the zero polynomial. Symbols outside this polynomial's set contribute
    /// nothing.
    pub fn partial_degree(&self, selection: &SymbolSet) -> Result<Option<BigInt>> {
        let arity = self.arity();
        let positions = self.symbols.positions_of(selection);
        let mut best: Option<BigInt> = None;
        for (key, _) in self.iter() {
            let degree = key.partial_degree(arity, &positions)?;
            if best.as_ref().map_or(true, |b| degree > *b) {
                best = Some(degree);
            }
        }
        Ok(best)
    }

    /// Re-encodes every term over `superset`, which must contain the current
    /// symbol set.
    pub fn extend_symbol_set(&self, superset: &SymbolSet) -> Result<Self> {
        let map = self.symbols.insertion_map_to(superset)?;
        let arity = self.arity();
        let mut out = Self::new(superset.clone());
        out.requested_log2_segments = self.requested_log2_segments;
        for (key, coeff) in self.iter() {
            out.insert_or_accumulate(key.merge_symbols(&map, arity)?, coeff.clone())?;
        }
        Ok(out)
    }

    /// The product `self * rhs` via the parallel kernel.
    pub fn mul(&self, rhs: &Self) -> Result<Self> {
        let mut out = Self::new(self.symbols.clone());
        mul_mt_hm(&mut out, self, rhs, None)?;
        Ok(out)
    }

    /// The truncated product: only terms within the truncation bound are
    /// produced.
    pub fn mul_truncated(&self, rhs: &Self, truncation: &Truncation) -> Result<Self> {
        let mut out = Self::new(self.symbols.clone());
        mul_mt_hm(&mut out, self, rhs, Some(truncation))?;
        Ok(out)
    }

    /// `self` raised to `exp` by repeated squaring. Packed-exponent overflow
    /// is detected before any output is produced.
    pub fn pow(&self, exp: u64) -> Result<Self> {
        let acc = Self::constant(self.symbols.clone(), C::one())?;
        if exp == 0 {
            return Ok(acc);
        }
        let mut acc = acc;
        let mut base = self.clone();
        let mut exp = exp;
        loop {
            if exp & 1 == 1 {
                acc = acc.mul(&base)?;
            }
            exp >>= 1;
            if exp == 0 {
                break;
            }
            base = base.mul(&base)?;
        }
        Ok(acc)
    }
}

/// Set equality of the non-zero terms; segmentation and iteration order are
/// irrelevant.
impl<W: PackedWord, C: Coefficient> PartialEq for Polynomial<W, C> {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols
            && self.len() == other.len()
            && self.iter().all(|(key, coeff)| other.get(key) == Some(coeff))
    }
}

impl<W: PackedWord, C: Coefficient + Eq> Eq for Polynomial<W, C> {}

impl<W: PackedWord, C: Coefficient> fmt::Display for Polynomial<W, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "0");
        }
        let mut terms: Vec<_> = self.iter().collect();
        terms.sort_by_key(|(key, _)| **key);
        for (i, (key, coeff)) in terms.into_iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{coeff}")?;
            let exponents = key.unpack(self.arity()).map_err(|_| fmt::Error)?;
            for (position, exponent) in exponents.into_iter().enumerate() {
                if exponent == W::ZERO {
                    continue;
                }
                let name = self.symbols.name(position).ok_or(fmt::Error)?;
                write!(f, "*{name}")?;
                if exponent != W::ONE {
                    write!(f, "^{exponent}")?;
                }
            }
        }
        Ok(())
    }
}
