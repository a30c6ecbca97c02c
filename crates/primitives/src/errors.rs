//! Errors during parsing of boundary values.

use thiserror::Error;

/// Parsing errors for hex-encoded identifiers and keys.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The input is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded value has the wrong size.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// The provided pubkey is not a valid point on the curve.
    #[error("supplied pubkey is invalid")]
    InvalidPubkey(#[from] secp256k1::Error),
}
