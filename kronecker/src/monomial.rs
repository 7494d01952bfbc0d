use num::bigint::BigInt;
use num::Zero;

use crate::error::{Error, Result};
use crate::packing::{self, BitPacker, BitUnpacker, SlotBounds};
use crate::symbols::InsertionMap;
use crate::word::PackedWord;

/// A monomial whose exponent vector is packed into a single machine word.
///
/// The arity is carried externally by the owning symbol set; a monomial is
/// only meaningful together with it. Equality and hashing operate on the
/// packed word directly, so equal words always hash equally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackedMonomial<W: PackedWord>(W);

impl<W: PackedWord> PackedMonomial<W> {
    /// The unit monomial: every exponent zero, at any arity.
    pub const fn unit() -> Self {
        Self(W::ZERO)
    }

    pub const fn from_word(word: W) -> Self {
        Self(word)
    }

    pub const fn word(self) -> W {
        self.0
    }

    pub fn is_unit(self) -> bool {
        self.0 == W::ZERO
    }

    pub fn pack(exponents: &[W]) -> Result<Self> {
        packing::pack(exponents).map(Self)
    }

    pub fn unpack(self, arity: usize) -> Result<Vec<W>> {
        packing::unpack(self.0, arity)
    }

    /// Checks that the word is a reachable packing at `arity` without
    /// decoding it.
    pub fn validate(self, arity: usize) -> Result<()> {
        BitUnpacker::new(self.0, arity).map(|_| ())
    }

    /// The product monomial: the element-wise exponent sum, with per-slot
    /// range checks.
    pub fn try_mul(self, rhs: Self, arity: usize) -> Result<Self> {
        let bounds = SlotBounds::<W>::new(arity)?;
        let mut lhs = BitUnpacker::new(self.0, arity)?;
        let mut rhs = BitUnpacker::new(rhs.0, arity)?;
        let mut packer = BitPacker::new(arity)?;
        for _ in 0..arity {
            let a = lhs.pop()?;
            let b = rhs.pop()?;
            let sum = a
                .checked_add(b)
                .filter(|sum| bounds.contains(*sum))
                .ok_or_else(|| {
                    Error::Overflow(format!(
                        "exponent sum {a} + {b} escapes [{}, {}] at arity {arity}",
                        bounds.lo(),
                        bounds.hi(),
                    ))
                })?;
            packer.push(sum)?;
        }
        packer.get().map(Self)
    }

    /// Word-level product without slot checks.
    ///
    /// Adding two packed words adds their exponent vectors slot by slot, as
    /// long as no slot sum escapes its range. Callers must have established
    /// that bound, e.g. by checking the slot extrema of both operand sets.
    pub fn mul_unchecked(self, rhs: Self) -> Self {
        Self(W::from_bits(
            self.0.to_bits().wrapping_add(rhs.0.to_bits()) & W::WORD_MASK,
        ))
    }

    /// Sum of all exponents, exact at any magnitude.
    pub fn total_degree(self, arity: usize) -> Result<BigInt> {
        let mut unpacker = BitUnpacker::new(self.0, arity)?;
        let mut degree = BigInt::zero();
        for _ in 0..arity {
            degree += unpacker.pop()?.into_bigint();
        }
        Ok(degree)
    }

    /// Sum of the exponents at the given positions of the symbol set.
    pub fn partial_degree(self, arity: usize, positions: &[usize]) -> Result<BigInt> {
        let exponents = self.unpack(arity)?;
        let mut degree = BigInt::zero();
        for &position in positions {
            let exponent = exponents.get(position).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "position {position} exceeds arity {arity}",
                ))
            })?;
            degree += exponent.into_bigint();
        }
        Ok(degree)
    }

    /// Re-encodes the monomial over a superset of its symbol set, placing a
    /// zero exponent at every inserted position.
    ///
    /// Distinct monomials stay distinct under the same map, and a non-unit
    /// monomial stays non-unit: the old exponents are carried over verbatim
    /// and only zeros are interleaved.
    pub fn merge_symbols(self, map: &InsertionMap, arity: usize) -> Result<Self> {
        let mut previous = None;
        for (index, names) in map.entries() {
            if *index > arity || names.is_empty() || previous.map_or(false, |p| p >= *index) {
                return Err(Error::InvalidArgument(format!(
                    "malformed insertion map entry at index {index}",
                )));
            }
            previous = Some(*index);
        }
        let exponents = self.unpack(arity)?;
        let mut packer = BitPacker::new(arity + map.inserted())?;
        let mut entries = map.entries().iter().peekable();
        for (position, &exponent) in exponents.iter().enumerate() {
            if let Some((_, names)) = entries.next_if(|(index, _)| *index == position) {
                for _ in 0..names.len() {
                    packer.push(W::ZERO)?;
                }
            }
            packer.push(exponent)?;
        }
        if let Some((_, names)) = entries.next_if(|(index, _)| *index == arity) {
            for _ in 0..names.len() {
                packer.push(W::ZERO)?;
            }
        }
        packer.get().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolSet;

    fn key(exponents: &[i64]) -> PackedMonomial<i64> {
        PackedMonomial::pack(exponents).unwrap()
    }

    #[test]
    fn multiplication_adds_exponents() {
        let product = key(&[1, 2, 3]).try_mul(key(&[4, 0, -3]), 3).unwrap();
        assert_eq!(product.unpack(3).unwrap(), vec![5, 2, 0]);
        // The unchecked product agrees when nothing overflows.
        assert_eq!(key(&[1, 2, 3]).mul_unchecked(key(&[4, 0, -3])), product);
    }

    #[test]
    fn multiplication_detects_slot_overflow() {
        let bounds = SlotBounds::<i64>::new(2).unwrap();
        let near_max = key(&[bounds.hi(), 0]);
        assert!(matches!(
            near_max.try_mul(key(&[1, 0]), 2),
            Err(Error::Overflow(_))
        ));
        let near_min = key(&[bounds.lo(), 0]);
        assert!(matches!(
            near_min.try_mul(key(&[-1, 0]), 2),
            Err(Error::Overflow(_))
        ));
    }

    #[test]
    fn degrees() {
        let m = key(&[3, -1, 4]);
        assert_eq!(m.total_degree(3).unwrap(), BigInt::from(6));
        assert_eq!(m.partial_degree(3, &[0, 2]).unwrap(), BigInt::from(7));
        assert_eq!(m.partial_degree(3, &[1]).unwrap(), BigInt::from(-1));
        assert_eq!(m.partial_degree(3, &[]).unwrap(), BigInt::from(0));
        assert!(m.partial_degree(3, &[3]).is_err());
    }

    #[test]
    fn unit_behaviour() {
        let unit = PackedMonomial::<u64>::unit();
        assert!(unit.is_unit());
        assert_eq!(unit.total_degree(4).unwrap(), BigInt::from(0));
        let m = PackedMonomial::<u64>::pack(&[2, 5]).unwrap();
        assert_eq!(unit.mul_unchecked(m), m);
    }

    #[test]
    fn merge_symbols_interleaves_zeros() {
        // {u, x} -> {t, u, x, y}: insert t before u, y after x.
        let base = SymbolSet::new(["u", "x"]).unwrap();
        let superset = SymbolSet::new(["t", "u", "x", "y"]).unwrap();
        let map = base.insertion_map_to(&superset).unwrap();
        let merged = key(&[7, -2]).merge_symbols(&map, 2).unwrap();
        assert_eq!(merged.unpack(4).unwrap(), vec![0, 7, -2, 0]);
    }

    #[test]
    fn merge_symbols_preserves_distinctness_and_nonzero() {
        let base = SymbolSet::new(["x", "y"]).unwrap();
        let superset = SymbolSet::new(["w", "x", "y", "z"]).unwrap();
        let map = base.insertion_map_to(&superset).unwrap();

        let keys = [key(&[0, 1]), key(&[1, 0]), key(&[2, -1]), key(&[0, 0])];
        let merged: Vec<_> = keys
            .iter()
            .map(|k| k.merge_symbols(&map, 2).unwrap())
            .collect();
        for i in 0..keys.len() {
            for j in i + 1..keys.len() {
                assert_ne!(merged[i], merged[j]);
            }
            assert_eq!(keys[i].is_unit(), merged[i].is_unit());
            merged[i].validate(4).unwrap();
        }
    }

    #[test]
    fn merge_symbols_rejects_malformed_maps() {
        let base = SymbolSet::new(["x"]).unwrap();
        let superset = SymbolSet::new(["x", "y", "z"]).unwrap();
        let map = base.insertion_map_to(&superset).unwrap();
        // The map targets arity 1; applying it at arity 0 must fail.
        assert!(PackedMonomial::<i64>::unit().merge_symbols(&map, 0).is_err());
    }

    #[test]
    fn validate_checks_reachability() {
        PackedMonomial::<u64>::from_word(u64::MAX).validate(1).unwrap();
        assert!(matches!(
            PackedMonomial::<u64>::from_word(u64::MAX).validate(3),
            Err(Error::Overflow(_))
        ));
        assert!(matches!(
            PackedMonomial::<u64>::from_word(1).validate(0),
            Err(Error::InvalidArgument(_))
        ));
    }
}
