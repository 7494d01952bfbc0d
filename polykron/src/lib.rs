//! Sparse multivariate polynomial arithmetic over Kronecker-packed
//! monomials.
//!
//! A polynomial is an unordered set of (packed monomial, coefficient) pairs
//! grouped into hash segments; multiplication is the performance core, with
//! a single-threaded reference kernel and a parallel segmented kernel that
//! agree term for term.

#![deny(rustdoc::broken_intra_doc_links)]
#![allow(clippy::len_without_is_empty)]

pub use polykron_kronecker as kronecker;

pub mod coefficient;
pub mod mul;
pub mod polynomial;

pub use coefficient::Coefficient;
pub use kronecker::{Error, PackedMonomial, PackedWord, Result, SymbolSet};
pub use mul::{mul_mt_hm, mul_simple, Truncation};
pub use polynomial::Polynomial;
