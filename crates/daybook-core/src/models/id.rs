//! Identifiers for records and collections

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Opaque record identifier assigned by the API.
///
/// The backend hands out either UUID strings or integer keys; both are kept
/// as text so ids compare the same way regardless of where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a locally generated id using UUID v7 (time-sortable)
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Integer(number) => Self(number.to_string()),
        })
    }
}

/// Name of a logical list tracked independently by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionKey(String);

impl CollectionKey {
    pub const ENTRIES: &'static str = "entries";
    pub const TRANSACTIONS: &'static str = "transactions";
    pub const RECENT: &'static str = "recent";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Journal entries list
    #[must_use]
    pub fn entries() -> Self {
        Self::new(Self::ENTRIES)
    }

    /// Income/expense transactions list
    #[must_use]
    pub fn transactions() -> Self {
        Self::new(Self::TRANSACTIONS)
    }

    /// Short "recent items" summary shown on the home screen
    #[must_use]
    pub fn recent() -> Self {
        Self::new(Self::RECENT)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ItemId::generate(), ItemId::generate());
    }

    #[test]
    fn item_id_accepts_integer_keys() {
        let from_number: ItemId = serde_json::from_str("42").unwrap();
        let from_text: ItemId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"42\"");
    }

    #[test]
    fn collection_keys_are_distinct() {
        assert_ne!(CollectionKey::entries(), CollectionKey::recent());
        assert_eq!(CollectionKey::transactions().as_str(), "transactions");
    }
}
