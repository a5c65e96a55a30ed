//! In-process remote source, primarily for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::{Page, PageQuery, Pagination, RemoteSource};
use crate::error::{SyncError, SyncResult};
use crate::models::{CollectionKey, ItemId, Record};
use crate::util::unix_millis_now;

#[derive(Debug)]
struct MemoryState<T> {
    collections: HashMap<CollectionKey, Vec<T>>,
    requests: Vec<PageQuery>,
    scripted: VecDeque<SyncResult<Page<T>>>,
    failures: VecDeque<SyncError>,
}

/// Paginated backend kept in memory, newest item first.
///
/// Besides serving real pages it can script the next fetch responses, inject
/// failures, and hold every fetch at its suspension point until resumed.
#[derive(Debug)]
pub struct MemorySource<T> {
    state: Mutex<MemoryState<T>>,
    paused: watch::Sender<bool>,
}

impl<T: Record> Default for MemorySource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemorySource<T> {
    #[must_use]
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            state: Mutex::new(MemoryState {
                collections: HashMap::new(),
                requests: Vec::new(),
                scripted: VecDeque::new(),
                failures: VecDeque::new(),
            }),
            paused,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace a collection's server-side contents (given newest first).
    #[must_use]
    pub fn with_items(self, collection: &CollectionKey, items: Vec<T>) -> Self {
        self.lock().collections.insert(collection.clone(), items);
        self
    }

    /// Add a record at the head of a collection, as another client would.
    pub fn push_front(&self, collection: &CollectionKey, item: T) {
        self.lock()
            .collections
            .entry(collection.clone())
            .or_default()
            .insert(0, item);
    }

    /// Server-side contents of a collection.
    pub fn items(&self, collection: &CollectionKey) -> Vec<T> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Answer the next fetch with `response` instead of real data.
    pub fn script_fetch(&self, response: SyncResult<Page<T>>) {
        self.lock().scripted.push_back(response);
    }

    /// Fail the next call of any kind with `error`.
    pub fn fail_next(&self, error: SyncError) {
        self.lock().failures.push_back(error);
    }

    /// Every page request received so far.
    pub fn requests(&self) -> Vec<PageQuery> {
        self.lock().requests.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Hold fetches at their suspension point until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    async fn wait_until_resumed(&self) {
        let mut receiver = self.paused.subscribe();
        // The sender lives in `self`, so the channel can't close while waiting.
        let _ = receiver.wait_for(|paused| !paused).await;
    }

    fn take_failure(&self) -> SyncResult<()> {
        self.lock().failures.pop_front().map_or(Ok(()), Err)
    }

    fn serve_page(&self, collection: &CollectionKey, query: &PageQuery) -> SyncResult<Page<T>> {
        let mut state = self.lock();
        state.requests.push(query.clone());
        if let Some(failure) = state.failures.pop_front() {
            return Err(failure);
        }
        if let Some(scripted) = state.scripted.pop_front() {
            return scripted;
        }

        let needle = query.search.as_deref().map(str::to_lowercase);
        let matching: Vec<&T> = state
            .collections
            .get(collection)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| {
                        needle.as_deref().map_or(true, |needle| {
                            item.search_text().to_lowercase().contains(needle)
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let page_size = query.page_size.max(1) as usize;
        let start = (query.page.max(1) as usize - 1) * page_size;
        let end = (start + page_size).min(matching.len());
        let items = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|item| (*item).clone())
            .collect();

        Ok(Page::paged(
            items,
            Pagination {
                page: query.page,
                limit: query.page_size,
                total: Some(matching.len() as u64),
                has_more: end < matching.len(),
            },
        ))
    }
}

impl<T: Record> RemoteSource<T> for MemorySource<T> {
    async fn fetch_page(
        &self,
        collection: &CollectionKey,
        query: &PageQuery,
    ) -> SyncResult<Page<T>> {
        let response = self.serve_page(collection, query);
        self.wait_until_resumed().await;
        response
    }

    async fn create_item(&self, collection: &CollectionKey, draft: &T::Draft) -> SyncResult<T> {
        self.take_failure()?;
        let item = T::from_draft(ItemId::generate(), draft, unix_millis_now());
        self.push_front(collection, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        collection: &CollectionKey,
        id: &ItemId,
        draft: &T::Draft,
    ) -> SyncResult<T> {
        self.take_failure()?;
        let mut state = self.lock();
        let existing = state
            .collections
            .get_mut(collection)
            .and_then(|items| items.iter_mut().find(|item| item.id() == id))
            .ok_or_else(|| SyncError::Api(format!("record not found: {id}")))?;
        *existing = existing.apply_draft(draft, unix_millis_now());
        Ok(existing.clone())
    }

    async fn delete_item(&self, collection: &CollectionKey, id: &ItemId) -> SyncResult<()> {
        self.take_failure()?;
        let mut state = self.lock();
        let items = state.collections.entry(collection.clone()).or_default();
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            return Err(SyncError::Api(format!("record not found: {id}")));
        }
        Ok(())
    }
}
