//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every persisted record has a strongly-typed ID so a particle id can never
//! be handed to a chat-message lookup by accident. All IDs use UUID v7
//! (time-ordered), which keeps store keys roughly in creation order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a `HyperBit` particle (birth record).
    HyperBitId
}

define_id! {
    /// Unique identifier for a chat message.
    MessageId
}

define_id! {
    /// Unique identifier for an audit-log (genesis) entry.
    GenesisId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let bit = HyperBitId::new();
        let message = MessageId::new();
        assert_ne!(bit.into_inner(), Uuid::nil());
        assert_ne!(message.into_inner(), Uuid::nil());
    }

    #[test]
    fn ids_are_unique() {
        let a = HyperBitId::new();
        let b = HyperBitId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_serializes_as_plain_uuid() {
        let id = GenesisId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
    }

    #[test]
    fn id_parses_from_display() {
        let id = HyperBitId::new();
        let parsed: HyperBitId = id.to_string().parse().unwrap_or_default();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<HyperBitId>().is_err());
    }
}
