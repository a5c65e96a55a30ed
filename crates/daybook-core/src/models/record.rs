//! The contract every cached record type fulfils.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::ItemId;

/// An item held in a collection cache.
///
/// The sync layer only looks at the id and creation time; everything else
/// is payload it carries around untouched.
pub trait Record: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Payload sent to the API to create or update a record.
    type Draft: Serialize + Send + Sync;

    /// Stable identifier, the deduplication key.
    fn id(&self) -> &ItemId;

    /// Creation timestamp (Unix ms), used for ordering.
    fn created_at(&self) -> i64;

    /// Calendar day (UTC) the record is grouped under.
    fn day(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.created_at()).map(|dt| dt.date_naive())
    }

    /// Text a search query is matched against.
    fn search_text(&self) -> String;

    /// Materialize a draft as a record carrying `id`.
    fn from_draft(id: ItemId, draft: &Self::Draft, now: i64) -> Self;

    /// Apply a draft on top of this record, keeping its identity.
    fn apply_draft(&self, draft: &Self::Draft, now: i64) -> Self {
        Self::from_draft(self.id().clone(), draft, now)
    }
}
