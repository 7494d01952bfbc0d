use core::fmt::{Debug, Display};
use core::hash::Hash;

use num::bigint::BigInt;
use static_assertions::assert_eq_size;

/// Machine integers that can carry a packed exponent vector.
///
/// The codec works on the two's-complement image of a word, confined to the
/// low [`BITS`](Self::BITS) bits of a `u128`, so signed and unsigned widths
/// share one arithmetic model. `BITS` counts value bits, including the sign
/// bit for signed types.
pub trait PackedWord:
    'static + Copy + Eq + Ord + Hash + Debug + Display + Default + Send + Sync
{
    const BITS: u32;
    const SIGNED: bool;
    /// Mask selecting the low `BITS` bits of the 128-bit image.
    const WORD_MASK: u128;

    const ZERO: Self;
    const ONE: Self;
    const MIN: Self;
    const MAX: Self;

    /// Two's-complement image of `self` in the low `BITS` bits.
    fn to_bits(self) -> u128;

    /// Inverse of [`to_bits`](Self::to_bits): reinterprets the low `BITS`
    /// bits as a word.
    fn from_bits(bits: u128) -> Self;

    fn checked_add(self, rhs: Self) -> Option<Self>;

    fn into_bigint(self) -> BigInt;

    /// Smallest and largest words reachable by packing `arity` slots, read
    /// from a compile-time table. `arity` must not exceed `BITS`.
    fn packed_bounds(arity: usize) -> (Self, Self);
}

macro_rules! impl_packed_word {
    ($t:ty, $u:ty, $signed:literal) => {
        assert_eq_size!($t, $u);

        impl PackedWord for $t {
            const BITS: u32 = <$t>::BITS;
            const SIGNED: bool = $signed;
            const WORD_MASK: u128 = if <$t>::BITS == 128 {
                u128::MAX
            } else {
                (1u128 << <$t>::BITS) - 1
            };

            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;

            #[inline]
            fn to_bits(self) -> u128 {
                (self as $u) as u128
            }

            #[inline]
            fn from_bits(bits: u128) -> Self {
                (bits as $u) as $t
            }

            #[inline]
            fn checked_add(self, rhs: Self) -> Option<Self> {
                <$t>::checked_add(self, rhs)
            }

            fn into_bigint(self) -> BigInt {
                BigInt::from(self)
            }

            fn packed_bounds(arity: usize) -> (Self, Self) {
                // Index k holds the packing of k copies of the per-slot
                // minimum resp. maximum at arity k. Entries for inadmissible
                // arities stay (0, 0); `SlotBounds::new` rejects those before
                // any lookup.
                const TABLE: [($t, $t); <$t>::BITS as usize + 1] = {
                    let bits = <$t>::BITS as usize;
                    let mut table = [(0 as $t, 0 as $t); <$t>::BITS as usize + 1];
                    let mut k = 1usize;
                    while k <= bits {
                        if $signed {
                            if k == 1 {
                                table[1] = (<$t>::MIN, <$t>::MAX);
                            } else if k < bits {
                                let p = bits / k - if bits % k == 0 { 1 } else { 0 };
                                let hi: $t = ((1 as $t) << (p - 1)) - 1;
                                // Two's complement: !hi == -hi - 1 == -2^(p-1).
                                let lo: $t = !hi;
                                let mut vmin: $t = 0;
                                let mut vmax: $t = 0;
                                let mut i = 0usize;
                                while i < k {
                                    vmin = vmin.wrapping_add(lo << (i * p));
                                    vmax = vmax.wrapping_add(hi << (i * p));
                                    i += 1;
                                }
                                table[k] = (vmin, vmax);
                            }
                        } else {
                            let p = bits / k;
                            let hi: $t = if p == bits {
                                <$t>::MAX
                            } else {
                                ((1 as $t) << p) - 1
                            };
                            let mut vmax: $t = 0;
                            let mut i = 0usize;
                            while i < k {
                                vmax = vmax.wrapping_add(hi << (i * p));
                                i += 1;
                            }
                            table[k] = (0 as $t, vmax);
                        }
                        k += 1;
                    }
                    table
                };
                TABLE[arity]
            }
        }
    };
}

impl_packed_word!(i32, u32, true);
impl_packed_word!(u32, u32, false);
impl_packed_word!(i64, u64, true);
impl_packed_word!(u64, u64, false);
impl_packed_word!(i128, u128, true);
impl_packed_word!(u128, u128, false);
