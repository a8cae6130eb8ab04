use std::fmt;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Maximum number of integer digits a `Money` value may carry (spec: "magnitude
/// fitting in a 20-digit decimal"). Scale is always 2.
const MAX_INTEGER_DIGITS: u32 = 20;
const SCALE: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount is not a finite number")]
    NotFinite,
    #[error("amount could not be parsed as a decimal: {0}")]
    Unparseable(String),
    #[error("amount exceeds the maximum supported magnitude")]
    TooLarge,
    #[error("amount must be strictly positive")]
    NotPositive,
    #[error("amount must not be negative")]
    Negative,
}

/// A fixed-point monetary amount: scale 2, non-negative magnitude bounded to
/// 20 integer digits, exact decimal arithmetic (never routed through binary
/// floating point). This is the single canonical amount type shared by the
/// ledger engine and every boundary (HTTP bodies, persistence) that touches
/// money, per the "dynamic amount typing" design note: callers may hand us a
/// JSON string or number, we normalize to this immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Normalizes a raw `Decimal` into canonical scale-2 form, rejecting
    /// values whose magnitude does not fit the budget. Negative values are
    /// accepted here; callers that require non-negative or strictly positive
    /// amounts should follow up with [`Money::require_non_negative`] /
    /// [`Money::require_positive`].
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        let rescaled = value.round_dp(SCALE);
        if rescaled.trunc().abs() >= Decimal::from(10u64).powu(MAX_INTEGER_DIGITS as u64) {
            return Err(MoneyError::TooLarge);
        }
        Ok(Money(rescaled))
    }

    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let trimmed = input.trim();
        let decimal = trimmed
            .parse::<Decimal>()
            .map_err(|e| MoneyError::Unparseable(e.to_string()))?;
        Self::from_decimal(decimal)
    }

    pub fn require_positive(self) -> Result<Self, MoneyError> {
        if self.0 <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }
        Ok(self)
    }

    pub fn require_non_negative(self) -> Result<Self, MoneyError> {
        if self.0 < Decimal::ZERO {
            return Err(MoneyError::Negative);
        }
        Ok(self)
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

impl From<Decimal> for Money {
    /// Infallible conversion used internally once a value is already known to
    /// be in range (e.g. reading a `NUMERIC(22,2)` column back from the
    /// store). Prefer [`Money::from_decimal`] at any external boundary.
    fn from(value: Decimal) -> Self {
        Money(value.round_dp(SCALE))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a decimal amount, as a JSON string or number")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Money::parse(v).map_err(de::Error::custom)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Money::from_decimal(Decimal::from(v)).map_err(de::Error::custom)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Money::from_decimal(Decimal::from(v)).map_err(de::Error::custom)
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if !v.is_finite() {
            return Err(de::Error::custom(MoneyError::NotFinite));
        }
        let decimal = Decimal::try_from(v).map_err(|e| de::Error::custom(e.to_string()))?;
        Money::from_decimal(decimal).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_and_rescales_to_two_decimals() {
        let m = Money::parse("50").unwrap();
        assert_eq!(m.as_decimal(), Decimal::new(5000, 2));
    }

    #[test]
    fn parses_fractional_string() {
        let m = Money::parse("  20.5  ").unwrap();
        assert_eq!(m.as_decimal(), Decimal::new(2050, 2));
    }

    #[test]
    fn rejects_unparseable_input() {
        assert!(matches!(
            Money::parse("not-a-number"),
            Err(MoneyError::Unparseable(_))
        ));
    }

    #[test]
    fn zero_is_not_positive() {
        assert!(Money::ZERO.require_positive().is_err());
    }

    #[test]
    fn negative_is_not_positive_nor_non_negative() {
        let m = Money::from_decimal(Decimal::new(-100, 2)).unwrap();
        assert!(m.require_positive().is_err());
        assert!(m.require_non_negative().is_err());
    }

    #[test]
    fn too_large_magnitude_is_rejected() {
        let huge = Decimal::from(10u64).powu(25);
        assert_eq!(Money::from_decimal(huge), Err(MoneyError::TooLarge));
    }

    #[test]
    fn deserializes_from_json_string_or_number() {
        let from_str: Money = serde_json::from_str("\"12.34\"").unwrap();
        let from_num: Money = serde_json::from_str("12.34").unwrap();
        assert_eq!(from_str.as_decimal(), from_num.as_decimal());
    }

    #[test]
    fn roundtrips_through_serde() {
        let m = Money::parse("99.90").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"99.90\"");
    }

    #[test]
    fn checked_add_and_sub() {
        let a = Money::parse("10.00").unwrap();
        let b = Money::parse("4.50").unwrap();
        assert_eq!(a.checked_add(b).unwrap().as_decimal(), Decimal::new(1450, 2));
        assert_eq!(a.checked_sub(b).unwrap().as_decimal(), Decimal::new(550, 2));
    }
}
