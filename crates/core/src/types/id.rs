//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! Ids are assigned by the remote store and are opaque to the client. A
//! json-server style store may hand out `7` or `"a1b2"`; both are accepted
//! and written back in the form they arrived in.

use serde::Serializer;

/// Error returned for a blank id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: id must not be empty")]
pub struct InvalidId {
    /// Name of the id type that rejected the value.
    pub kind: &'static str,
}

/// Write `id` as a JSON number when it is a canonical integer, else as a string.
#[doc(hidden)]
pub fn serialize_id<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match id.parse::<i64>() {
        Ok(n) if n.to_string() == id => serializer.serialize_i64(n),
        _ => serializer.serialize_str(id),
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around an opaque `String` with:
/// - `Serialize` as a JSON number when the id is a canonical integer,
///   otherwise as a string
/// - `Deserialize` from either a JSON number or a non-empty string
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`, `FromStr`
/// - Conversion methods: `new()`, `as_str()`
///
/// # Example
///
/// ```rust
/// # use shop_sync_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new(1);
/// let order_id = OrderId::new("a1b2");
/// assert_eq!(order_id.as_str(), "a1b2");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Create an ID from anything with a textual form (`7`, `"a1b2"`).
            #[must_use]
            pub fn new(id: impl ::core::fmt::Display) -> Self {
                Self(id.to_string())
            }

            /// The id as sent by the remote store.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.pad(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::InvalidId;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err($crate::types::id::InvalidId {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                $crate::types::id::serialize_id(&self.0, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                #[derive(::serde::Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Number(i64),
                    Text(String),
                }

                match Raw::deserialize(deserializer)? {
                    Raw::Number(id) => Ok(Self(id.to_string())),
                    Raw::Text(text) => text
                        .parse()
                        .map_err(<D::Error as ::serde::de::Error>::custom),
                }
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ProductId);
define_id!(CartItemId);
define_id!(OrderId);
define_id!(CategoryId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_accepts_number_and_numeric_string() {
        let from_number: ProductId = serde_json::from_str("7").unwrap();
        let from_text: ProductId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(from_number, ProductId::new(7));
        assert_eq!(from_text, from_number);
    }

    #[test]
    fn test_id_accepts_opaque_string() {
        let id: CartItemId = serde_json::from_str("\"a1b2\"").unwrap();
        assert_eq!(id.as_str(), "a1b2");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a1b2\"");
    }

    #[test]
    fn test_id_rejects_blank_string() {
        let err = serde_json::from_str::<OrderId>("\"  \"").unwrap_err();
        assert!(err.to_string().contains("invalid OrderId"));
    }

    #[test]
    fn test_numeric_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&UserId::new(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&UserId::new("007")).unwrap(), "\"007\"");
    }

    #[test]
    fn test_id_from_str() {
        assert_eq!(" 12 ".parse::<CartItemId>().unwrap(), CartItemId::new(12));
        assert_eq!("x9".parse::<CartItemId>().unwrap().as_str(), "x9");
        assert!("".parse::<CartItemId>().is_err());
    }
}
