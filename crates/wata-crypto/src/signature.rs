//! Recoverable secp256k1 signatures over personal messages
//!
//! A wallet signs `personal_message_hash(message)` and hands back 65 bytes,
//! `r (32) || s (32) || v (1)`, hex-encoded. The signer's account address is
//! recovered from those bytes alone.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint as _;
use tracing::debug;
use wata_types::{Address, WataError};

use crate::{keccak256, personal_message_hash, CryptoError, CryptoResult};

/// Minimum hex length of the signature body (r and s)
const MIN_SIGNATURE_HEX_LEN: usize = 128;

/// Length of a recoverable signature in bytes
const SIGNATURE_LEN: usize = 65;

/// Recover the signer's address from a personal-message signature.
///
/// Every failure is reported as [`WataError::InvalidSignature`].
pub fn recover_address(message: &str, signature: &str) -> Result<Address, WataError> {
    recover_signer(message.as_bytes(), signature).map_err(|e| {
        debug!(error = %e, "Signature recovery failed");
        WataError::InvalidSignature
    })
}

/// Same as [`recover_address`] but keeps the detailed failure
pub fn recover_signer(message: &[u8], signature: &str) -> CryptoResult<Address> {
    let body = signature
        .strip_prefix("0x")
        .or_else(|| signature.strip_prefix("0X"))
        .unwrap_or(signature);

    if body.len() < MIN_SIGNATURE_HEX_LEN {
        return Err(CryptoError::SignatureTooShort(body.len()));
    }

    let bytes = hex::decode(body)?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidLength(bytes.len()));
    }

    let mut v = bytes[64];
    if v >= 27 {
        v -= 27;
    }
    let mut recovery_id = RecoveryId::from_byte(v).ok_or(CryptoError::InvalidRecoveryId(v))?;

    let mut sig = Signature::from_slice(&bytes[..64])
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;

    // Wallets may hand back high-s signatures; flip to low-s and the parity with it.
    if let Some(normalized) = sig.normalize_s() {
        sig = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let digest = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    Ok(address_of(&key))
}

/// Account address of a secp256k1 public key: the last 20 bytes of the
/// Keccak-256 hash of the uncompressed point without its `0x04` tag.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

/// Parse a 32-byte hex private key (optional `0x`)
pub fn signing_key_from_hex(secret: &str) -> CryptoResult<SigningKey> {
    let body = secret.trim().trim_start_matches("0x");
    let bytes = hex::decode(body).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))
}

/// Sign a personal message, returning `0x`-prefixed `r || s || v` with
/// `v` in the 27/28 convention.
pub fn sign_message(key: &SigningKey, message: &[u8]) -> CryptoResult<String> {
    let digest = personal_message_hash(message);
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let mut bytes = sig.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);
    Ok(format!("0x{}", hex::encode(bytes)))
}
