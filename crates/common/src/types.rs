use serde::{Deserialize, Deserializer, Serialize};

/// Either a JSON number or a numeric string, as produced by older clients
/// that stored identifiers as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

/// Deserializes an integer given either as a number or as numeric text.
///
/// For use with `#[serde(deserialize_with = "...")]`.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("not an integer: {s:?}"))),
    }
}

/// Like [`lenient_i64`], but the value must also fit a `u32`.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = lenient_i64(deserializer)?;
    u32::try_from(n).map_err(|_| serde::de::Error::custom(format!("out of range: {n}")))
}

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier as assigned by the remote service.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            pub fn get(&self) -> i64 {
                self.0
            }

            /// Returns true if the identifier is a positive integer.
            pub fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                lenient_i64(deserializer).map(Self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

remote_id!(
    /// Identifier of a customer account.
    CustomerId
);

remote_id!(
    /// Identifier of a product (and its stock record) in the remote catalog.
    ProductId
);

remote_id!(
    /// Identifier the remote order service assigns to an order header.
    OrderId
);
