use itertools::{izip, Itertools};
use log::debug;
use num::bigint::BigInt;
use num::{Signed, Zero};
use polykron_maybe_rayon::*;
use polykron_util::{ceil_div_usize, log2_ceil};

use crate::coefficient::Coefficient;
use crate::kronecker::{BitUnpacker, Error, PackedMonomial, PackedWord, Result, SlotBounds};
use crate::mul::{check_preconditions, Truncation};
use crate::polynomial::{accumulate_term, segment_index, Polynomial, TermMap, MAX_LOG2_SEGMENTS};

/// Target number of output terms per segment when the caller leaves the
/// segment count to the multiplier.
const TARGET_SEGMENT_LOAD: usize = 1 << 12;

/// One operand term, scanned once up front.
struct Term<'a, W: PackedWord, C> {
    key: PackedMonomial<W>,
    coeff: &'a C,
    /// Partial degree over the truncation positions; zero when no truncation
    /// is active.
    degree: BigInt,
}

/// Parallel segmented multiplier.
///
/// Writes the (optionally truncated) product of `f` and `g` into `h`. The
/// output space is split into `2^n` hash segments; workers fill private
/// per-segment maps from chunks of `f`'s terms, and the segments are merged
/// and installed into `h` at the end. Packed-exponent overflow is detected
/// before any bulk work starts, and any failure leaves `h` empty.
pub fn mul_mt_hm<W: PackedWord, C: Coefficient>(
    h: &mut Polynomial<W, C>,
    f: &Polynomial<W, C>,
    g: &Polynomial<W, C>,
    truncation: Option<&Truncation>,
) -> Result<()> {
    check_preconditions(h, f, g)?;
    if f.is_empty() || g.is_empty() {
        return Ok(());
    }
    if let Some(truncation) = truncation {
        if truncation.degree().is_negative() {
            return Ok(());
        }
    }

    let arity = f.arity();
    let positions = truncation.map(|t| t.positions(f.symbol_set()));
    let (f_terms, f_slot_lo, f_slot_hi) = scan(f, positions.as_deref())?;
    let (g_terms, g_slot_lo, g_slot_hi) = scan(g, positions.as_deref())?;
    pre_check(
        &SlotBounds::<W>::new(arity)?,
        &f_slot_lo,
        &f_slot_hi,
        &g_slot_lo,
        &g_slot_hi,
    )?;

    // Residual budget per right-hand term: a pair survives truncation iff
    // the left partial degree fits into it.
    let allowances = truncation.map(|truncation| {
        g_terms
            .iter()
            .map(|gt| truncation.degree() - &gt.degree)
            .collect::<Vec<_>>()
    });

    let log2_segments = if h.requested_log2_segments() > 0 {
        h.requested_log2_segments()
    } else {
        let pairs = f_terms.len().saturating_mul(g_terms.len());
        let ideal = num_threads().min((pairs / TARGET_SEGMENT_LOAD).max(1));
        (log2_ceil(ideal) as u32).min(MAX_LOG2_SEGMENTS)
    };
    let n_segments = 1usize << log2_segments;
    debug!(
        "mul_mt_hm: {} x {} terms into {} segments across {} threads",
        f_terms.len(),
        g_terms.len(),
        n_segments,
        num_threads(),
    );

    let chunk_size = ceil_div_usize(f_terms.len(), 4 * num_threads()).max(1);
    let worker_buckets = f_terms
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut buckets: Vec<TermMap<W, C>> =
                (0..n_segments).map(|_| TermMap::new()).collect();
            for ft in chunk {
                match &allowances {
                    Some(allowances) => {
                        for (gt, allowance) in g_terms.iter().zip(allowances) {
                            if ft.degree > *allowance {
                                continue;
                            }
                            emit(&mut buckets, ft, gt)?;
                        }
                    }
                    None => {
                        for gt in &g_terms {
                            emit(&mut buckets, ft, gt)?;
                        }
                    }
                }
            }
            Ok(buckets)
        })
        .collect::<Result<Vec<_>>>()?;

    // Regroup the workers' buckets by segment, then fold each segment on its
    // own thread. No pair is revisited: only duplicate monomials combine.
    let mut piles: Vec<Vec<TermMap<W, C>>> = (0..n_segments).map(|_| Vec::new()).collect();
    for buckets in worker_buckets {
        for (segment, map) in buckets.into_iter().enumerate() {
            if !map.is_empty() {
                piles[segment].push(map);
            }
        }
    }
    let segments = piles
        .into_par_iter()
        .map(merge_segment)
        .collect::<Result<Vec<_>>>()?;
    h.install_segments(segments);
    Ok(())
}

#[inline]
fn emit<W: PackedWord, C: Coefficient>(
    buckets: &mut [TermMap<W, C>],
    ft: &Term<'_, W, C>,
    gt: &Term<'_, W, C>,
) -> Result<()> {
    // Sound after `pre_check`: no slot sum can escape its range.
    let key = ft.key.mul_unchecked(gt.key);
    let coeff = ft.coeff.checked_mul(gt.coeff)?;
    let n_segments = buckets.len();
    accumulate_term(&mut buckets[segment_index(key, n_segments)], key, coeff)
}

/// Unpacks every term once, collecting per-slot extrema and (under
/// truncation) per-term partial degrees.
fn scan<'a, W: PackedWord, C: Coefficient>(
    poly: &'a Polynomial<W, C>,
    positions: Option<&[usize]>,
) -> Result<(Vec<Term<'a, W, C>>, Vec<W>, Vec<W>)> {
    let arity = poly.arity();
    let mut slot_lo = vec![W::MAX; arity];
    let mut slot_hi = vec![W::MIN; arity];
    let mut exponents = vec![W::ZERO; arity];
    let mut terms = Vec::with_capacity(poly.len());
    for (key, coeff) in poly.iter() {
        let mut unpacker = BitUnpacker::new(key.word(), arity)?;
        for slot in exponents.iter_mut() {
            *slot = unpacker.pop()?;
        }
        for (slot, (lo, hi)) in exponents
            .iter()
            .zip(slot_lo.iter_mut().zip(slot_hi.iter_mut()))
        {
            if *slot < *lo {
                *lo = *slot;
            }
            if *slot > *hi {
                *hi = *slot;
            }
        }
        let degree = match positions {
            Some(positions) => positions.iter().map(|&i| exponents[i].into_bigint()).sum(),
            None => <BigInt as Zero>::zero(),
        };
        terms.push(Term {
            key: *key,
            coeff,
            degree,
        });
    }
    Ok((terms, slot_lo, slot_hi))
}

/// Verifies that no pairwise product can push a slot outside its range, by
/// summing the per-slot extrema of both operands.
fn pre_check<W: PackedWord>(
    bounds: &SlotBounds<W>,
    f_lo: &[W],
    f_hi: &[W],
    g_lo: &[W],
    g_hi: &[W],
) -> Result<()> {
    for (slot, (f_lo, f_hi, g_lo, g_hi)) in izip!(f_lo, f_hi, g_lo, g_hi).enumerate() {
        let lowest = f_lo.checked_add(*g_lo).filter(|v| bounds.lo() <= *v);
        let highest = f_hi.checked_add(*g_hi).filter(|v| *v <= bounds.hi());
        if lowest.is_none() || highest.is_none() {
            return Err(Error::Overflow(format!(
                "slot {slot}: exponent sums can reach [{f_lo} + {g_lo}, {f_hi} + {g_hi}], \
                 outside the admissible [{}, {}]",
                bounds.lo(),
                bounds.hi(),
            )));
        }
    }
    Ok(())
}

fn merge_segment<W: PackedWord, C: Coefficient>(
    mut maps: Vec<TermMap<W, C>>,
) -> Result<TermMap<W, C>> {
    // Fold into the largest pile member so most entries never move.
    let mut base = match maps.iter().position_max_by_key(|map| map.len()) {
        Some(largest) => maps.swap_remove(largest),
        None => TermMap::new(),
    };
    for map in maps {
        for (key, coeff) in map {
            accumulate_term(&mut base, key, coeff)?;
        }
    }
    Ok(base)
}
