use crate::error::{Error, Result};
use crate::word::PackedWord;

/// Per-slot geometry of the packed encoding at a given arity: the slot width
/// in bits and the admissible value range `[lo, hi]`.
///
/// For unsigned words every slot gets `BITS / k` bits. For signed words a
/// single slot spans the whole word; at two or more slots one bit is shaved
/// off when `k` divides `BITS`, so the packed sum of two in-range vectors can
/// never wrap the word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotBounds<W: PackedWord> {
    arity: usize,
    width: u32,
    lo: W,
    hi: W,
}

impl<W: PackedWord> SlotBounds<W> {
    pub fn new(arity: usize) -> Result<Self> {
        let bits = W::BITS as usize;
        if arity > bits || (W::SIGNED && arity == bits) {
            return Err(Error::Overflow(format!(
                "arity {arity} exceeds the capacity of a {bits}-bit {} word",
                if W::SIGNED { "signed" } else { "unsigned" },
            )));
        }
        if arity == 0 {
            return Ok(Self {
                arity,
                width: 0,
                lo: W::ZERO,
                hi: W::ZERO,
            });
        }
        let (width, lo, hi) = if !W::SIGNED {
            let p = bits / arity;
            let hi = if p == bits {
                W::MAX
            } else {
                W::from_bits((1u128 << p) - 1)
            };
            (p, W::ZERO, hi)
        } else if arity == 1 {
            (bits, W::MIN, W::MAX)
        } else {
            let p = bits / arity - usize::from(bits % arity == 0);
            let hi = W::from_bits((1u128 << (p - 1)) - 1);
            let lo = W::from_bits(W::WORD_MASK & (u128::MAX << (p - 1)));
            (p, lo, hi)
        };
        Ok(Self {
            arity,
            width: width as u32,
            lo,
            hi,
        })
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Slot width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn lo(&self) -> W {
        self.lo
    }

    pub fn hi(&self) -> W {
        self.hi
    }

    pub fn contains(&self, value: W) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// Packs up to `arity` integers into a single word, lowest slot first.
#[derive(Clone, Debug)]
pub struct BitPacker<W: PackedWord> {
    bounds: SlotBounds<W>,
    acc: u128,
    shift: u32,
    pushed: usize,
}

impl<W: PackedWord> BitPacker<W> {
    pub fn new(arity: usize) -> Result<Self> {
        Ok(Self {
            bounds: SlotBounds::new(arity)?,
            acc: 0,
            shift: 0,
            pushed: 0,
        })
    }

    pub fn bounds(&self) -> &SlotBounds<W> {
        &self.bounds
    }

    /// Appends the next slot value. The state is untouched on failure.
    pub fn push(&mut self, value: W) -> Result<()> {
        if self.pushed == self.bounds.arity() {
            return Err(Error::OutOfRange(format!(
                "all {} slots of the packer are already filled",
                self.bounds.arity(),
            )));
        }
        if !self.bounds.contains(value) {
            return Err(Error::Overflow(format!(
                "cannot pack {value}: slot values at arity {} lie in [{}, {}]",
                self.bounds.arity(),
                self.bounds.lo(),
                self.bounds.hi(),
            )));
        }
        // Multiply-by-2^s on the unsigned image instead of shifting the
        // (possibly negative) word; wrapping keeps the update exact modulo
        // 2^BITS.
        self.acc = self
            .acc
            .wrapping_add(value.to_bits().wrapping_mul(1u128 << self.shift))
            & W::WORD_MASK;
        self.shift += self.bounds.width();
        self.pushed += 1;
        Ok(())
    }

    /// Finalizes the packed word; every slot must have been pushed.
    pub fn get(&self) -> Result<W> {
        if self.pushed < self.bounds.arity() {
            return Err(Error::OutOfRange(format!(
                "only {} of {} slots filled",
                self.pushed,
                self.bounds.arity(),
            )));
        }
        Ok(W::from_bits(self.acc))
    }
}

/// Decodes a packed word back into its `arity` slot values, lowest first.
#[derive(Clone, Debug)]
pub struct BitUnpacker<W: PackedWord> {
    bounds: SlotBounds<W>,
    /// Unsigned positional image: the raw word for unsigned `W`, the offset
    /// from the smallest packed word for signed `W`.
    image: u128,
    remaining: usize,
}

impl<W: PackedWord> BitUnpacker<W> {
    pub fn new(word: W, arity: usize) -> Result<Self> {
        let bounds = SlotBounds::new(arity)?;
        if arity == 0 {
            if word != W::ZERO {
                return Err(Error::InvalidArgument(format!(
                    "cannot unpack the non-zero word {word} at arity 0",
                )));
            }
            return Ok(Self {
                bounds,
                image: 0,
                remaining: 0,
            });
        }
        let (min, max) = W::packed_bounds(arity);
        if word < min || word > max {
            return Err(Error::Overflow(format!(
                "word {word} is not a packing of {arity} slots: admissible words lie in [{min}, {max}]",
            )));
        }
        let image = if W::SIGNED {
            word.to_bits().wrapping_sub(min.to_bits()) & W::WORD_MASK
        } else {
            word.to_bits()
        };
        Ok(Self {
            bounds,
            image,
            remaining: arity,
        })
    }

    /// Extracts the next slot value.
    pub fn pop(&mut self) -> Result<W> {
        if self.remaining == 0 {
            return Err(Error::OutOfRange(format!(
                "all {} slots have already been extracted",
                self.bounds.arity(),
            )));
        }
        let width = self.bounds.width();
        let slot_mask = if width == 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        };
        let raw = self.image & slot_mask;
        let value = if W::SIGNED {
            W::from_bits(raw.wrapping_add(self.bounds.lo().to_bits()) & W::WORD_MASK)
        } else {
            W::from_bits(raw)
        };
        // A full-width slot cannot shift its own width; the image is simply
        // exhausted.
        if width >= W::BITS {
            self.image = 0;
        } else {
            self.image >>= width;
        }
        self.remaining -= 1;
        Ok(value)
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

/// Packs a whole exponent vector; the arity is the vector length.
pub fn pack<W: PackedWord>(values: &[W]) -> Result<W> {
    let mut packer = BitPacker::new(values.len())?;
    for &value in values {
        packer.push(value)?;
    }
    packer.get()
}

/// Unpacks `word` into its `arity` components.
pub fn unpack<W: PackedWord>(word: W, arity: usize) -> Result<Vec<W>> {
    let mut unpacker = BitUnpacker::new(word, arity)?;
    let mut out = Vec::with_capacity(arity);
    for _ in 0..arity {
        out.push(unpacker.pop()?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use rand::distributions::uniform::SampleUniform;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::error::Error;

    fn sample_slot<W: PackedWord + SampleUniform, R: Rng>(
        bounds: &SlotBounds<W>,
        rng: &mut R,
    ) -> W {
        rng.gen_range(bounds.lo()..=bounds.hi())
    }

    macro_rules! test_packing {
        ($mod:ident, $t:ty) => {
            mod $mod {
                use super::*;

                #[test]
                fn round_trip() {
                    let mut rng = StdRng::seed_from_u64(0x706b);
                    let max_arity =
                        <$t as PackedWord>::BITS as usize - usize::from(<$t as PackedWord>::SIGNED);
                    for arity in 1..=max_arity {
                        let bounds = SlotBounds::<$t>::new(arity).unwrap();
                        for _ in 0..8 {
                            let values: Vec<$t> =
                                (0..arity).map(|_| sample_slot(&bounds, &mut rng)).collect();
                            let word = pack(&values).unwrap();
                            assert_eq!(unpack(word, arity).unwrap(), values);
                        }
                        // The packed extremes decode to all-lo and all-hi.
                        let (min, max) = <$t as PackedWord>::packed_bounds(arity);
                        assert_eq!(unpack(min, arity).unwrap(), vec![bounds.lo(); arity]);
                        assert_eq!(unpack(max, arity).unwrap(), vec![bounds.hi(); arity]);
                    }
                }

                #[test]
                fn zero_arity() {
                    assert_eq!(pack::<$t>(&[]).unwrap(), 0);
                    assert!(unpack::<$t>(0, 0).unwrap().is_empty());
                    assert!(matches!(
                        BitUnpacker::<$t>::new(1, 0),
                        Err(Error::InvalidArgument(_))
                    ));
                }

                #[test]
                fn rejects_excessive_arity() {
                    let limit = <$t as PackedWord>::BITS as usize
                        + usize::from(!<$t as PackedWord>::SIGNED);
                    assert!(matches!(
                        BitPacker::<$t>::new(limit),
                        Err(Error::Overflow(_))
                    ));
                }

                #[test]
                fn push_rejects_out_of_range_and_keeps_state() {
                    let arity = 4;
                    let bounds = SlotBounds::<$t>::new(arity).unwrap();
                    let mut packer = BitPacker::<$t>::new(arity).unwrap();
                    packer.push(1).unwrap();
                    assert!(matches!(
                        packer.push(bounds.hi().checked_add(1).unwrap()),
                        Err(Error::Overflow(_))
                    ));
                    // The failed push must not have consumed a slot.
                    packer.push(bounds.hi()).unwrap();
                    packer.push(bounds.lo()).unwrap();
                    packer.push(1).unwrap();
                    let word = packer.get().unwrap();
                    assert_eq!(
                        unpack(word, arity).unwrap(),
                        vec![1, bounds.hi(), bounds.lo(), 1]
                    );
                }

                #[test]
                fn slot_count_is_enforced() {
                    let mut packer = BitPacker::<$t>::new(2).unwrap();
                    assert!(matches!(packer.get(), Err(Error::OutOfRange(_))));
                    packer.push(1).unwrap();
                    assert!(matches!(packer.get(), Err(Error::OutOfRange(_))));
                    packer.push(1).unwrap();
                    packer.get().unwrap();
                    assert!(matches!(packer.push(1), Err(Error::OutOfRange(_))));

                    let word = pack::<$t>(&[1, 1]).unwrap();
                    let mut unpacker = BitUnpacker::new(word, 2).unwrap();
                    unpacker.pop().unwrap();
                    unpacker.pop().unwrap();
                    assert!(matches!(unpacker.pop(), Err(Error::OutOfRange(_))));
                }
            }
        };
    }

    test_packing!(packing_i32, i32);
    test_packing!(packing_u32, u32);
    test_packing!(packing_i64, i64);
    test_packing!(packing_u64, u64);
    test_packing!(packing_i128, i128);
    test_packing!(packing_u128, u128);

    #[test]
    fn unpacker_rejects_unreachable_words() {
        // Three 21-bit slots cannot reach the top u64 bit.
        assert!(matches!(
            BitUnpacker::<u64>::new(u64::MAX, 3),
            Err(Error::Overflow(_))
        ));
        // Below the packed minimum for two signed slots.
        assert!(matches!(
            BitUnpacker::<i64>::new(i64::MIN, 2),
            Err(Error::Overflow(_))
        ));
    }

    #[test]
    fn signed_round_trip_with_negatives() {
        let values: Vec<i64> = vec![-5, 7, 0, -(1 << 10)];
        let word = pack(&values).unwrap();
        assert_eq!(unpack(word, 4).unwrap(), values);
    }

    #[test]
    fn full_width_single_slot() {
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(unpack(pack(&[value]).unwrap(), 1).unwrap(), vec![value]);
        }
        for value in [0u64, 1, u64::MAX] {
            assert_eq!(unpack(pack(&[value]).unwrap(), 1).unwrap(), vec![value]);
        }
    }
}
