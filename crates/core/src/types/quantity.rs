//! Line item quantity.
//!
//! A cart line never holds zero units, so the quantity is a [`NonZeroU32`].
//! Zero and negative requests are rejected at construction instead of being
//! clamped somewhere downstream.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// The value does not fit in a `u32`.
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// A positive number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from a signed value.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for zero or negative values and
    /// [`QuantityError::TooLarge`] for values beyond `u32::MAX`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(QuantityError::TooLarge(value))
    }

    /// The number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Sum two quantities, failing on overflow.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] if the sum exceeds `u32::MAX`.
    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        self.0
            .checked_add(other.get())
            .map(Self)
            .ok_or_else(|| QuantityError::TooLarge(i64::from(self.get()) + i64::from(other.get())))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}
