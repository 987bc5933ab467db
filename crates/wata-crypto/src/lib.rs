//! Wata Crypto - Cryptographic primitives for wallet identity
//!
//! This crate provides:
//! - Keccak-256 hashing and the personal-message signing hash
//! - Recovery of an account [`Address`](wata_types::Address) from a
//!   65-byte recoverable secp256k1 signature
//! - Personal-message signing for local keys (tooling and tests)

pub mod hash;
pub mod signature;

pub use hash::*;
pub use signature::*;

use thiserror::Error;

/// Signature decoding and recovery errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("signature too short: {0} hex characters")]
    SignatureTooShort(usize),

    #[error("signature is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
