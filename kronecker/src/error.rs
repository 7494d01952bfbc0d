use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors shared by the packed-monomial codec and the polynomial engine.
///
/// Messages carry the offending values and the admissible ranges, so a caller
/// can diagnose a failure without re-running the operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A slot value, exponent sum or packed word escaped the representable
    /// range of the encoding.
    #[error("overflow: {0}")]
    Overflow(String),

    /// A packer or unpacker was driven past its configured arity, or
    /// finalized before all slots were filled.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A precondition on the arguments was violated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A coefficient-ring operation failed; the message is surfaced unchanged.
    #[error("coefficient arithmetic: {0}")]
    Coefficient(String),
}
