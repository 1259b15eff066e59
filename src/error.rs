//! Error types.

use core::fmt;

/// Result type with the `sm2-pke` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// SM2 encryption errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// ASN.1 DER error: the ciphertext is structurally malformed, has
    /// trailing bytes, or could not be encoded.
    Asn1(der::Error),

    /// An append would exceed the capacity of a buffered context.
    Capacity,

    /// The recomputed `C3` digest disagrees with the ciphertext's hash.
    ///
    /// The integrity check failed; the recovered plaintext has been
    /// discarded.
    HashMismatch,

    /// A length or range bound was violated: an oversized coordinate or
    /// `C2` field, a hash field that is not 32 bytes, an undersized
    /// output buffer, or a secret scalar byte string outside its field.
    Length,

    /// Plaintext length is outside the
    /// [`MIN_PLAINTEXT_SIZE`][crate::MIN_PLAINTEXT_SIZE] to
    /// [`MAX_PLAINTEXT_SIZE`][crate::MAX_PLAINTEXT_SIZE] range.
    PlaintextSize,

    /// The ephemeral point `C1` does not lie on the SM2 curve, or a key
    /// could not be decoded as a valid curve point.
    PointNotOnCurve,

    /// The fixed-length variant could not produce an ephemeral point with
    /// the requested DER size within its retry budget.
    RetriesExhausted,

    /// The random number generator failed to produce output.
    Rng,

    /// The derived keystream is all zero and cannot mask the message.
    ZeroKeystream,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Asn1(err) => write!(f, "ASN.1 error: {err}"),
            Error::Capacity => f.write_str("context buffer capacity exceeded"),
            Error::HashMismatch => f.write_str("ciphertext hash mismatch"),
            Error::Length => f.write_str("length out of range"),
            Error::PlaintextSize => f.write_str("plaintext size out of range"),
            Error::PointNotOnCurve => f.write_str("point not on curve"),
            Error::RetriesExhausted => f.write_str("fixed-length retries exhausted"),
            Error::Rng => f.write_str("RNG failure"),
            Error::ZeroKeystream => f.write_str("derived keystream is zero"),
        }
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Asn1(err) => Some(err),
            _ => None,
        }
    }
}
