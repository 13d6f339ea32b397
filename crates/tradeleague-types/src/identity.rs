//! Identity types for TradeLeague
//!
//! Every identifier is a strongly typed wrapper around a UUID so that an
//! account id can never be passed where a league id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// The bare UUID, as stored in the database
            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }
    };
}

// Participants
define_id_type!(AccountId, "acct", "Unique identifier for a trading account");

// Portfolio
define_id_type!(LotId, "lot", "Unique identifier for a holding lot");
define_id_type!(TransactionId, "tx", "Unique identifier for an immutable ledger entry");

// Competition
define_id_type!(LeagueId, "league", "Unique identifier for a fantasy league");
define_id_type!(ArchiveId, "season", "Unique identifier for a season archive");

// Messaging
define_id_type!(NotificationId, "notif", "Unique identifier for a notification record");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_display_prefix() {
        let id = AccountId::new();
        assert!(id.to_string().starts_with("acct_"));
    }

    #[test]
    fn test_id_parsing_accepts_prefix_and_bare() {
        let id = LeagueId::new();
        assert_eq!(LeagueId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(LeagueId::parse(&id.0.to_string()).unwrap(), id);
    }

    #[test]
    fn test_id_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id = LotId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AccountId::parse("acct_not-a-uuid").is_err());
    }
}
