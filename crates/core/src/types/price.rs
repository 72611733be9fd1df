//! Type-safe price representation using decimal arithmetic.
//!
//! Prices travel over the wire as plain JSON numbers (the remote catalog
//! stores `"price": 19.99`), but are held as [`Decimal`] so that cart totals
//! never accumulate floating point error.

use core::fmt;
use core::iter::Sum;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `cents` is below zero.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `quantity` units at this price.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.get())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_rejected() {
        assert_eq!(
            Price::from_cents(-1),
            Err(PriceError::Negative(Decimal::new(-1, 2)))
        );
        assert!(Price::from_cents(0).is_ok());
    }

    #[test]
    fn test_times_quantity() {
        let price = Price::from_cents(1999).unwrap();
        let qty = Quantity::new(3).unwrap();
        assert_eq!(price.times(qty), Decimal::new(5997, 2));
    }

    #[test]
    fn test_wire_format_is_json_number() {
        let price: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(price, Price::from_cents(1999).unwrap());
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.99");

        let whole: Price = serde_json::from_str("100").unwrap();
        assert_eq!(whole.amount(), Decimal::from(100));
    }

    #[test]
    fn test_negative_wire_value_rejected() {
        assert!(serde_json::from_str::<Price>("-5").is_err());
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Price::from_cents(500).unwrap().to_string(), "5.00");
    }
}
