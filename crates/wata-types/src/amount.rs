//! Decimal amounts and balances
//!
//! Balances are base-10 decimals kept to [`BALANCE_SCALE`] fraction digits.
//! Their textual form trims trailing zeros and a trailing decimal point, so
//! `10.500000` renders as `10.5` and `10.000000` as `10`.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{Currency, TransactionKind, WataError};

/// Fraction digits retained in stored balances
pub const BALANCE_SCALE: u32 = 8;

/// Render a decimal with at most 8 fraction digits and no trailing zeros
pub fn format_decimal(value: Decimal) -> String {
    let rounded = value.round_dp(BALANCE_SCALE).normalize();
    if rounded.is_zero() {
        return "0".to_string();
    }
    rounded.to_string()
}

/// Parse a request amount: trimmed base-10 text, strictly positive, with at
/// most [`BALANCE_SCALE`] significant fraction digits. The result is
/// normalized, so `10.500000` parses to `10.5`.
pub fn parse_amount(input: &str) -> Result<Decimal, WataError> {
    let text = input.trim();
    let value = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| WataError::InvalidAmount(text.to_string()))?
        .normalize();

    if value <= Decimal::ZERO || value.scale() > BALANCE_SCALE {
        return Err(WataError::InvalidAmount(text.to_string()));
    }
    Ok(value)
}

/// A non-negative account balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Balance = Balance(Decimal::ZERO);

    /// Rounds to [`BALANCE_SCALE`] digits; rejects negative values
    pub fn new(value: Decimal) -> Result<Self, WataError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(WataError::InternalError(format!("negative balance {}", value)));
        }
        Ok(Self(value.round_dp(BALANCE_SCALE).normalize()))
    }

    /// Parse a stored balance. Empty text is treated as zero.
    pub fn parse(text: &str) -> Result<Self, WataError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::ZERO);
        }
        let value = Decimal::from_str(text)
            .map_err(|e| WataError::InternalError(format!("malformed balance {:?}: {}", text, e)))?;
        Self::new(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_decimal(self.0))
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Balance::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A signed balance delta, applied atomically by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    Credit(Decimal),
    Debit(Decimal),
}

impl BalanceChange {
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Credit(amount) | Self::Debit(amount) => *amount,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Credit(_) => TransactionKind::Deposit,
            Self::Debit(_) => TransactionKind::Withdraw,
        }
    }

    /// Compute the balance after this change.
    ///
    /// A debit larger than `current` fails without producing a value; the
    /// result of a permitted debit is floored at zero. A credit that would
    /// overflow the decimal range is refused as an invalid amount.
    pub fn apply(&self, currency: Currency, current: Balance) -> Result<Balance, WataError> {
        match self {
            Self::Credit(amount) => {
                let total = current.0.checked_add(*amount).ok_or_else(|| {
                    WataError::InvalidAmount(format!(
                        "{} overflows the {} balance",
                        format_decimal(*amount),
                        currency
                    ))
                })?;
                Balance::new(total)
            }
            Self::Debit(amount) => {
                let remaining = current
                    .0
                    .checked_sub(*amount)
                    .filter(|r| !r.is_sign_negative() || r.is_zero())
                    .ok_or_else(|| WataError::InsufficientBalance {
                        currency: currency.to_string(),
                        available: current.to_string(),
                        requested: format_decimal(*amount),
                    })?;
                Balance::new(remaining)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bal(text: &str) -> Balance {
        Balance::parse(text).unwrap()
    }

    #[test]
    fn test_format_trims_zeros() {
        assert_eq!(format_decimal(dec!(10.500000)), "10.5");
        assert_eq!(format_decimal(dec!(10.000000)), "10");
        assert_eq!(format_decimal(dec!(0.00000000)), "0");
        assert_eq!(format_decimal(dec!(0.123456789)), "0.12345679");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 10.5 ").unwrap(), dec!(10.5));
        assert_eq!(parse_amount("1e2").unwrap(), dec!(100));
        assert!(matches!(parse_amount("0"), Err(WataError::InvalidAmount(_))));
        assert!(matches!(parse_amount("-1"), Err(WataError::InvalidAmount(_))));
        assert!(matches!(parse_amount("ten"), Err(WataError::InvalidAmount(_))));
        assert!(matches!(parse_amount(""), Err(WataError::InvalidAmount(_))));
    }

    #[test]
    fn test_parse_amount_scale() {
        assert_eq!(parse_amount("10.500000").unwrap().to_string(), "10.5");
        assert_eq!(parse_amount("0.000000010").unwrap(), dec!(0.00000001));
        assert!(matches!(parse_amount("0.000000001"), Err(WataError::InvalidAmount(_))));
        assert!(matches!(parse_amount("0.000000025"), Err(WataError::InvalidAmount(_))));
        assert!(matches!(parse_amount("1.123456789"), Err(WataError::InvalidAmount(_))));
    }

    #[test]
    fn test_credit_overflow_is_refused() {
        let amount = parse_amount("79228162514264337593543950335").unwrap();
        assert_eq!(amount, Decimal::MAX);

        let err = BalanceChange::Credit(amount).apply(Currency::Wata, bal("1")).unwrap_err();
        assert!(matches!(err, WataError::InvalidAmount(_)));
        assert_eq!(err.code(), "0005");
    }

    #[test]
    fn test_credit() {
        let after = BalanceChange::Credit(dec!(10.5)).apply(Currency::Wata, bal("0")).unwrap();
        assert_eq!(after.to_string(), "10.5");
        let after = BalanceChange::Credit(dec!(0.25)).apply(Currency::Wata, after).unwrap();
        assert_eq!(after.to_string(), "10.75");
    }

    #[test]
    fn test_debit_to_zero() {
        let after = BalanceChange::Debit(dec!(10.75)).apply(Currency::Usdt, bal("10.75")).unwrap();
        assert_eq!(after.to_string(), "0");
    }

    #[test]
    fn test_debit_insufficient() {
        let err = BalanceChange::Debit(dec!(20)).apply(Currency::Usdt, bal("10")).unwrap_err();
        assert_eq!(
            err,
            WataError::InsufficientBalance {
                currency: "usdt".into(),
                available: "10".into(),
                requested: "20".into(),
            }
        );
    }

    #[test]
    fn test_withdraw_then_deposit_restores() {
        for (b, a) in [("10", "10"), ("10.75", "0.25"), ("1", "0.00000001"), ("123.456", "23.456")] {
            let start = bal(b);
            let amount = parse_amount(a).unwrap();
            let mid = BalanceChange::Debit(amount).apply(Currency::Wata, start).unwrap();
            let end = BalanceChange::Credit(amount).apply(Currency::Wata, mid).unwrap();
            assert_eq!(end, start, "round trip of {} by {}", b, a);
        }

        // a ninth fraction digit never reaches the balance
        let start = bal("0.00000003");
        assert!(parse_amount("0.000000025").is_err());
        let amount = parse_amount("0.00000002").unwrap();
        let mid = BalanceChange::Debit(amount).apply(Currency::Wata, start).unwrap();
        let end = BalanceChange::Credit(amount).apply(Currency::Wata, mid).unwrap();
        assert_eq!(end, start);
    }

    #[test]
    fn test_balance_rejects_negative() {
        assert!(Balance::new(dec!(-0.1)).is_err());
        assert!(Balance::parse("abc").is_err());
        assert_eq!(Balance::parse("").unwrap(), Balance::ZERO);
    }

    #[test]
    fn test_balance_serde_as_text() {
        let json = serde_json::to_string(&bal("10.50")).unwrap();
        assert_eq!(json, "\"10.5\"");
    }
}
