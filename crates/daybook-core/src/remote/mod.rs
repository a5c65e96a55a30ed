//! Remote data source contract.
//!
//! The sync controller only ever talks to the backend through
//! [`RemoteSource`]. [`HttpSource`] speaks the JSON API; [`MemorySource`] is
//! an in-process backend used by tests.

mod http;
mod memory;

use std::future::Future;

use serde::{Deserialize, Serialize};

pub use http::{endpoint_path, HttpSource};
pub use memory::MemorySource;

use crate::error::SyncResult;
use crate::models::{CollectionKey, ItemId, Record};

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// 1-based page index
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(alias = "has_more")]
    pub has_more: bool,
}

/// Items returned for one page request.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent when the API returned the complete result in one go
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    /// Page carrying pagination info.
    pub const fn paged(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            items,
            pagination: Some(pagination),
        }
    }

    /// Complete, unpaginated result.
    pub const fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            pagination: None,
        }
    }

    /// Whether the API reports more pages after this one. A response without
    /// pagination is the whole result set.
    pub fn has_more(&self) -> bool {
        self.pagination.is_some_and(|pagination| pagination.has_more)
    }
}

/// Backend holding the authoritative copy of every collection.
///
/// Calls are implicitly authorized; a rejected credential surfaces as
/// [`SyncError::Auth`](crate::SyncError::Auth).
pub trait RemoteSource<T: Record>: Send + Sync {
    /// Fetch one page of a collection, newest first.
    fn fetch_page(
        &self,
        collection: &CollectionKey,
        query: &PageQuery,
    ) -> impl Future<Output = SyncResult<Page<T>>> + Send;

    /// Create a record; returns the stored version with its server id.
    fn create_item(
        &self,
        collection: &CollectionKey,
        draft: &T::Draft,
    ) -> impl Future<Output = SyncResult<T>> + Send;

    /// Overwrite a record's payload.
    fn update_item(
        &self,
        collection: &CollectionKey,
        id: &ItemId,
        draft: &T::Draft,
    ) -> impl Future<Output = SyncResult<T>> + Send;

    /// Delete a record.
    fn delete_item(
        &self,
        collection: &CollectionKey,
        id: &ItemId,
    ) -> impl Future<Output = SyncResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_accepts_both_spellings() {
        let camel: Pagination =
            serde_json::from_str(r#"{"page": 2, "limit": 20, "total": 41, "hasMore": true}"#)
                .unwrap();
        let snake: Pagination =
            serde_json::from_str(r#"{"page": 2, "limit": 20, "has_more": true}"#).unwrap();
        assert!(camel.has_more);
        assert!(snake.has_more);
        assert_eq!(camel.total, Some(41));
        assert_eq!(snake.total, None);
    }

    #[test]
    fn complete_page_has_no_more() {
        let page: Page<()> = Page::complete(vec![(), ()]);
        assert!(!page.has_more());
    }
}
