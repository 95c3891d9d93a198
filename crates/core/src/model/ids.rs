use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a Slide
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlideId(Uuid);

/// Unique identifier for a Wine
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WineId(Uuid);

/// Unique identifier for a tasting Session
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

/// Unique identifier for a Participant
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(Uuid);

macro_rules! id_impls {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Creates a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID value
            #[must_use]
            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map($name::new).map_err(|_| ParseIdError {
                    kind: $label.to_string(),
                })
            }
        }
    };
}

id_impls!(SlideId, "SlideId");
id_impls!(WineId, "WineId");
id_impls!(SessionId, "SessionId");
id_impls!(ParticipantId, "ParticipantId");

/// Error type for parsing an ID from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_id_roundtrip() {
        let original = SlideId::random();
        let serialized = original.to_string();
        let deserialized: SlideId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn wine_id_from_str_invalid() {
        let result = "not-a-uuid".parse::<WineId>();
        assert!(result.is_err());
    }

    #[test]
    fn session_id_debug_names_kind() {
        let id = SessionId::random();
        assert!(format!("{id:?}").starts_with("SessionId("));
    }
}
