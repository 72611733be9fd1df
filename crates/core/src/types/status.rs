//! Order lifecycle status.

use core::convert::Infallible;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Status of an order record.
///
/// New orders start as [`OrderStatus::Pending`]. Later edits are plain
/// partial updates; the client does not police which transitions are legal,
/// and statuses it has no name for are carried through as [`OrderStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    /// Awaiting payment.
    #[default]
    Pending,
    /// Payment received.
    Paid,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Completed,
    /// Cancelled before completion.
    Cancelled,
    /// Any other status the remote store uses, lowercased.
    Other(String),
}

impl OrderStatus {
    /// The statuses the client knows by name, in lifecycle order.
    pub const KNOWN: [Self; 5] = [
        Self::Pending,
        Self::Paid,
        Self::Shipped,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Ok(Self::KNOWN
            .into_iter()
            .find(|status| status.as_str() == lower)
            .unwrap_or(Self::Other(lower)))
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse() {
            Ok(status) => Ok(status),
            Err(never) => match never {},
        }
    }
}
