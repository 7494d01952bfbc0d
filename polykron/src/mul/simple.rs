use num::Signed;

use crate::coefficient::Coefficient;
use crate::kronecker::{PackedWord, Result};
use crate::mul::{check_preconditions, Truncation};
use crate::polynomial::Polynomial;

/// Single-threaded reference multiplier.
///
/// Writes the (optionally truncated) product of `f` and `g` into `h`. On any
/// failure `h` is left empty.
pub fn mul_simple<W: PackedWord, C: Coefficient>(
    h: &mut Polynomial<W, C>,
    f: &Polynomial<W, C>,
    g: &Polynomial<W, C>,
    truncation: Option<&Truncation>,
) -> Result<()> {
    check_preconditions(h, f, g)?;
    let result = mul_simple_inner(h, f, g, truncation);
    if result.is_err() {
        h.clear_terms();
    }
    result
}

fn mul_simple_inner<W: PackedWord, C: Coefficient>(
    h: &mut Polynomial<W, C>,
    f: &Polynomial<W, C>,
    g: &Polynomial<W, C>,
    truncation: Option<&Truncation>,
) -> Result<()> {
    if let Some(truncation) = truncation {
        if truncation.degree().is_negative() {
            return Ok(());
        }
    }
    let arity = f.arity();
    let positions = truncation.map(|t| t.positions(f.symbol_set()));
    for (f_key, f_coeff) in f.iter() {
        for (g_key, g_coeff) in g.iter() {
            let key = f_key.try_mul(*g_key, arity)?;
            if let (Some(truncation), Some(positions)) = (truncation, positions.as_ref()) {
                if key.partial_degree(arity, positions)? > *truncation.degree() {
                    continue;
                }
            }
            h.insert_or_accumulate(key, f_coeff.checked_mul(g_coeff)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use num::bigint::BigInt;

    use super::*;
    use crate::kronecker::{Error, SymbolSet};

    fn symbols(names: &[&str]) -> SymbolSet {
        SymbolSet::new(names.iter().copied()).unwrap()
    }

    fn poly(names: &[&str], terms: &[(&[i64], i64)]) -> Polynomial<i64, i64> {
        Polynomial::from_terms(
            symbols(names),
            terms.iter().map(|(e, c)| (e.to_vec(), *c)),
        )
        .unwrap()
    }

    fn product(
        f: &Polynomial<i64, i64>,
        g: &Polynomial<i64, i64>,
        truncation: Option<&Truncation>,
    ) -> Polynomial<i64, i64> {
        let mut h = Polynomial::new(f.symbol_set().clone());
        mul_simple(&mut h, f, g, truncation).unwrap();
        h
    }

    // f = x + y and g = x - y over {x, y, z}.
    fn sum_and_difference() -> (Polynomial<i64, i64>, Polynomial<i64, i64>) {
        (
            poly(&["x", "y", "z"], &[(&[1, 0, 0], 1), (&[0, 1, 0], 1)]),
            poly(&["x", "y", "z"], &[(&[1, 0, 0], 1), (&[0, 1, 0], -1)]),
        )
    }

    #[test]
    fn untruncated_product() {
        let (f, g) = sum_and_difference();
        let expected = poly(&["x", "y", "z"], &[(&[2, 0, 0], 1), (&[0, 2, 0], -1)]);
        assert_eq!(product(&f, &g, None), expected);
    }

    #[test]
    fn generous_bound_changes_nothing() {
        let (f, g) = sum_and_difference();
        let truncation = Truncation::over(100, symbols(&["x"]));
        let expected = poly(&["x", "y", "z"], &[(&[2, 0, 0], 1), (&[0, 2, 0], -1)]);
        assert_eq!(product(&f, &g, Some(&truncation)), expected);
    }

    #[test]
    fn tight_bound_empties_the_product() {
        let (f, g) = sum_and_difference();
        let truncation = Truncation::over(1, symbols(&["x", "y"]));
        assert!(product(&f, &g, Some(&truncation)).is_empty());
    }

    #[test]
    fn zero_bound_over_one_symbol() {
        let (f, g) = sum_and_difference();
        let truncation = Truncation::over(0, symbols(&["x"]));
        let expected = poly(&["x", "y", "z"], &[(&[0, 2, 0], -1)]);
        assert_eq!(product(&f, &g, Some(&truncation)), expected);
    }

    #[test]
    fn mixed_terms_with_total_bound() {
        // (z*x + y) * (x - y - 1) within total degree 2.
        let f = poly(&["x", "y", "z"], &[(&[1, 0, 1], 1), (&[0, 1, 0], 1)]);
        let g = poly(
            &["x", "y", "z"],
            &[(&[1, 0, 0], 1), (&[0, 1, 0], -1), (&[0, 0, 0], -1)],
        );
        let truncation = Truncation::total(2);
        let expected = poly(
            &["x", "y", "z"],
            &[
                (&[1, 0, 1], -1),
                (&[1, 1, 0], 1),
                (&[0, 2, 0], -1),
                (&[0, 1, 0], -1),
            ],
        );
        assert_eq!(product(&f, &g, Some(&truncation)), expected);
    }

    #[test]
    fn negative_bound_is_empty() {
        let (f, g) = sum_and_difference();
        let truncation = Truncation::total(-1);
        assert!(product(&f, &g, Some(&truncation)).is_empty());
        let truncation = Truncation::over(BigInt::from(-1000), symbols(&["x"]));
        assert!(product(&f, &g, Some(&truncation)).is_empty());
    }

    #[test]
    fn preconditions_are_checked() {
        let (f, g) = sum_and_difference();
        let mut h = Polynomial::new(symbols(&["x", "y"]));
        assert!(matches!(
            mul_simple(&mut h, &f, &g, None),
            Err(Error::InvalidArgument(_))
        ));
        let mut h = poly(&["x", "y", "z"], &[(&[0, 0, 0], 1)]);
        assert!(matches!(
            mul_simple(&mut h, &f, &g, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn monomial_overflow_surfaces_and_empties_h() {
        // Two slots of an i64 word hold values up to 2^30 - 1; squaring a
        // monomial near that bound must fail.
        let huge = poly(&["x", "y"], &[(&[(1 << 30) - 1, 0], 1), (&[0, 0], 1)]);
        let mut h = Polynomial::new(huge.symbol_set().clone());
        assert!(matches!(
            mul_simple(&mut h, &huge, &huge, None),
            Err(Error::Overflow(_))
        ));
        assert!(h.is_empty());
    }

    #[test]
    fn coefficient_failure_surfaces_and_empties_h() {
        let big = poly(&["x"], &[(&[1], i64::MAX), (&[0], 1)]);
        let mut h = Polynomial::new(big.symbol_set().clone());
        assert!(matches!(
            mul_simple(&mut h, &big, &big, None),
            Err(Error::Coefficient(_))
        ));
        assert!(h.is_empty());
    }
}
