//! Account addresses
//!
//! An [`Address`] is a 20-byte account identifier whose canonical text form is
//! the EIP-55 checksum-cased, `0x`-prefixed 42-character string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::WataError;

/// Length of the canonical textual form (`0x` + 40 hex digits)
pub const ADDRESS_TEXT_LEN: usize = 42;

/// Reasons a free-text identifier is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("missing 0x prefix")]
    MissingPrefix,

    #[error("non-hex character {0:?}")]
    InvalidHex(char),

    #[error("zero address")]
    ZeroAddress,

    #[error("expected {ADDRESS_TEXT_LEN} characters, got {0}")]
    InvalidLength(usize),
}

impl From<AddressError> for WataError {
    fn from(_: AddressError) -> Self {
        WataError::InvalidAddressFormat
    }
}

/// A 20-byte account identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// EIP-55 checksum-cased text
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(ADDRESS_TEXT_LEN);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Uppercased trailing 8 hex characters of the canonical form
    pub fn short_code(&self) -> String {
        let text = self.to_checksum();
        text[text.len() - 8..].to_ascii_uppercase()
    }
}

/// Validate and canonicalize a free-text account identifier.
///
/// Whitespace is trimmed and the `0x` prefix may be in either case. The body
/// must be exactly 40 hex digits and must not be all zeros.
pub fn normalize_address(input: &str) -> Result<Address, AddressError> {
    let trimmed = input.trim();

    let body = match trimmed.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => &trimmed[2..],
        _ => return Err(AddressError::MissingPrefix),
    };

    if let Some(bad) = body.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex(bad));
    }

    if body.chars().all(|c| c == '0') {
        return Err(AddressError::ZeroAddress);
    }

    if body.len() + 2 != ADDRESS_TEXT_LEN {
        return Err(AddressError::InvalidLength(body.len() + 2));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(body, &mut bytes).map_err(|_| AddressError::InvalidLength(body.len() + 2))?;

    let address = Address(bytes);
    let canonical = address.to_checksum();
    if canonical.len() != ADDRESS_TEXT_LEN {
        return Err(AddressError::InvalidLength(canonical.len()));
    }
    Ok(address)
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_address(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        normalize_address(&s).map_err(serde::de::Error::custom)
    }
}
