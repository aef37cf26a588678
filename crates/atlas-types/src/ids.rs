//! Identity newtypes
//!
//! Every entity is keyed by a UUID v4, wrapped in a distinct type so the
//! compiler rejects mixing up a `LocationId` and a `PlayerId` at a call
//! site even though both are, underneath, a `Uuid`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(LocationId);
uuid_id!(PlayerId);
uuid_id!(WorldEventId);
uuid_id!(DescriptionLayerId);
uuid_id!(DebounceRecordId);

/// A partition identifier that routes a record to a single logical stream.
///
/// Format is one of `loc:<id>`, `player:<id>`, or `global:<category>`. Kept
/// as a parsed enum rather than a bare string so that callers can't build a
/// malformed scope key and so partition-local operations can match on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ScopeKey {
    Location(LocationId),
    Player(PlayerId),
    Global(String),
}

impl ScopeKey {
    pub fn location(id: LocationId) -> Self {
        Self::Location(id)
    }

    pub fn player(id: PlayerId) -> Self {
        Self::Player(id)
    }

    pub fn global(category: impl Into<String>) -> Self {
        Self::Global(category.into())
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::Location(id) => write!(f, "loc:{id}"),
            ScopeKey::Player(id) => write!(f, "player:{id}"),
            ScopeKey::Global(category) => write!(f, "global:{category}"),
        }
    }
}

impl From<ScopeKey> for String {
    fn from(key: ScopeKey) -> Self {
        key.to_string()
    }
}

/// Error returned when a string does not parse into a well-formed
/// [`ScopeKey`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed scope key: {0}")]
pub struct ScopeKeyParseError(pub String);

impl TryFrom<String> for ScopeKey {
    type Error = ScopeKeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if let Some(rest) = value.strip_prefix("loc:") {
            let id = LocationId::parse(rest).map_err(|_| ScopeKeyParseError(value.clone()))?;
            return Ok(ScopeKey::Location(id));
        }
        if let Some(rest) = value.strip_prefix("player:") {
            let id = PlayerId::parse(rest).map_err(|_| ScopeKeyParseError(value.clone()))?;
            return Ok(ScopeKey::Player(id));
        }
        if let Some(rest) = value.strip_prefix("global:") {
            return Ok(ScopeKey::Global(rest.to_string()));
        }
        Err(ScopeKeyParseError(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_key_round_trips_through_display_and_parse() {
        let id = LocationId::new();
        let key = ScopeKey::location(id);
        let s = key.to_string();
        let parsed = ScopeKey::try_from(s).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn scope_key_rejects_unknown_prefix() {
        assert!(ScopeKey::try_from("weird:thing".to_string()).is_err());
    }

    #[test]
    fn global_scope_key_keeps_category_verbatim() {
        let key = ScopeKey::global("ai-cost");
        assert_eq!(key.to_string(), "global:ai-cost");
    }
}
