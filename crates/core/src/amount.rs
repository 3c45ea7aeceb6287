//! Amount - Non-negative money wrapper
//!
//! Every amount that enters the ledger is validated here: it must be
//! non-negative and carry at most two decimal places. Balances, transfer
//! amounts and payment-request amounts are all `Amount`s; signed deltas
//! (admin adjustments) stay plain `Decimal` until they hit a balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when constructing amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    Negative(Decimal),

    #[error("Amount has more than 2 decimal places: {0}")]
    TooPrecise(Decimal),

    #[error("Not a decimal number: {0}")]
    Unparseable(String),
}

/// A non-negative money amount with at most two decimal places.
///
/// # Invariant
/// The inner value is always >= 0 and has scale <= 2. Arithmetic on two
/// such values is exact, so debit/credit pairs can never drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Rejects negative values and values finer than cents.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        let normalized = value.normalize();
        if normalized.scale() > 2 {
            return Err(AmountError::TooPrecise(value));
        }
        Ok(Self(normalized))
    }

    /// Create an Amount from a whole number of currency units.
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::new(units, 0))
    }

    /// Create an Amount without validation.
    ///
    /// The caller must guarantee the value is non-negative with scale <= 2.
    /// Used when reading balances back from validated storage.
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition; `None` on Decimal overflow.
    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction; `None` if the result would be negative.
    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Decimal = s
            .trim()
            .parse()
            .map_err(|_| AmountError::Unparseable(s.to_string()))?;
        Self::new(value)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn positive_amount_accepted() {
        let amount = Amount::new(dec!(123.45)).unwrap();
        assert_eq!(amount.value(), dec!(123.45));
    }

    #[test]
    fn zero_is_zero() {
        assert!(Amount::new(Decimal::ZERO).unwrap().is_zero());
    }

    #[test]
    fn negative_rejected() {
        let result = Amount::new(dec!(-100));
        assert!(matches!(result, Err(AmountError::Negative(_))));
    }

    #[test]
    fn sub_cent_precision_rejected() {
        let result = Amount::new(dec!(1.005));
        assert!(matches!(result, Err(AmountError::TooPrecise(_))));
    }

    #[test]
    fn trailing_zeros_normalized() {
        // 10.100 is only three digits lexically; numerically it is 10.1
        let amount = Amount::new(dec!(10.100)).unwrap();
        assert_eq!(amount.value(), dec!(10.1));
    }

    #[test]
    fn checked_sub_prevents_negative() {
        let a = Amount::from_major(50);
        let b = Amount::from_major(100);
        assert!(a.checked_sub(b).is_none());
    }

    #[test]
    fn checked_sub_exact() {
        let a = Amount::new(dec!(100.25)).unwrap();
        let b = Amount::new(dec!(0.25)).unwrap();
        assert_eq!(a.checked_sub(b).unwrap().value(), dec!(100));
    }

    #[test]
    fn parse_from_str() {
        let amount: Amount = "42.50".parse().unwrap();
        assert_eq!(amount.value(), dec!(42.5));
        assert!("abc".parse::<Amount>().is_err());
        assert!("-1".parse::<Amount>().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let amount = Amount::new(dec!(123.45)).unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        let parsed: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, parsed);
    }
}
