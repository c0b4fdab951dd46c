//! Domain identifier types with validation
//!
//! Identifiers are opaque strings. Each newtype rejects blank values so an
//! empty slot or visit id can never reach a store lookup.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", $label, " from a string")]
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty or whitespace only.
            pub fn new(id: impl Into<String>) -> Result<Self, String> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(format!("{} cannot be empty", $label));
                }
                Ok(Self(id))
            }

            #[doc = concat!("Returns the ", $label, " as a string slice")]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes self and returns the inner String
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a booked visit
    ///
    /// # Examples
    ///
    /// ```
    /// use visit_scheduler::domain::ids::VisitId;
    ///
    /// let id = VisitId::generate();
    /// assert!(id.as_str().starts_with("visit_"));
    /// ```
    VisitId,
    "Visit ID"
);

string_id!(
    /// Identifier of a bookable slot
    ///
    /// Slot ids may carry a synthetic encoding such as `mock-slot-2025-01-15-09:00`;
    /// see [`crate::core::synthetic`].
    SlotId,
    "Slot ID"
);

string_id!(
    /// Identifier of a property listing
    ListingId,
    "Listing ID"
);

string_id!(
    /// Identifier of the user booking a visit
    UserId,
    "User ID"
);

string_id!(
    /// Caller-supplied key that makes visit creation idempotent
    IdempotencyKey,
    "Idempotency key"
);

const VISIT_ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

impl VisitId {
    /// Generates a fresh visit id: `visit_<epochMillis>_<9 base-36 chars>`
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..VISIT_ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("visit_{}_{}", Utc::now().timestamp_millis(), suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_id_valid() {
        let id = SlotId::new("mock-slot-2025-01-15-09:00").unwrap();
        assert_eq!(id.as_str(), "mock-slot-2025-01-15-09:00");
        assert_eq!(id.to_string(), "mock-slot-2025-01-15-09:00");
    }

    #[test]
    fn test_ids_reject_blank() {
        assert!(SlotId::new("").is_err());
        assert!(VisitId::new("   ").is_err());
        assert!(IdempotencyKey::from_str("").is_err());
        assert!(UserId::new("\t").is_err());
        assert!(ListingId::new("").is_err());
    }

    #[test]
    fn test_generated_visit_ids_are_unique() {
        let a = VisitId::generate();
        let b = VisitId::generate();
        assert_ne!(a, b);

        let parts: Vec<&str> = a.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "visit");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn test_id_serde_round_trip_rejects_empty() {
        let json = serde_json::to_string(&ListingId::new("listing-1").unwrap()).unwrap();
        assert_eq!(json, "\"listing-1\"");
        assert!(serde_json::from_str::<ListingId>("\"\"").is_err());
    }
}
