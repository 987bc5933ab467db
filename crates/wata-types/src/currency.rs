//! Supported balance currencies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::WataError;

/// Currencies an account can hold a balance in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Platform token
    Wata,
    /// Tether
    Usdt,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Wata, Currency::Usdt];

    /// Lowercase tag used in storage and requests
    pub fn code(&self) -> &'static str {
        match self {
            Self::Wata => "wata",
            Self::Usdt => "usdt",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = WataError;

    /// Case-insensitive; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(tag))
            .ok_or_else(|| WataError::InvalidCurrency(tag.to_string()))
    }
}
