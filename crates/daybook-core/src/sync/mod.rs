//! List synchronization controller.
//!
//! A [`ListSync`] keeps one cached collection in step with the remote source.
//! It owns the rules for when the network is consulted (freshness-based reuse,
//! forced refresh, search changes), how pages are merged (replace on the first
//! page, append-with-dedupe afterwards), and how the pagination cursor moves.
//!
//! At most one fetch per collection is outstanding: a trigger that arrives
//! while one is in flight is dropped and reported as
//! [`SkipReason::InFlight`]. The single exception is a search change, which
//! always reloads and makes the older request's result stale. Failed fetches
//! leave the cached items and cursor exactly as they were.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use crate::cache::{dedupe_by_id, CacheEntry, CacheStore, FetchTicket, LIST_MAX_AGE, RECENT_MAX_AGE};
use crate::config::{ClientConfig, DEFAULT_PAGE_SIZE, RECENT_LIMIT};
use crate::error::{SyncError, SyncResult};
use crate::models::{CollectionKey, ItemId, Record};
use crate::remote::{Page, PageQuery, RemoteSource};
use crate::triggers;
use crate::util::normalize_text_option;

#[cfg(test)]
mod tests;

/// Paging and freshness settings for one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page_size: u32,
    pub max_age: Duration,
    pub search_query: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_age: LIST_MAX_AGE,
            search_query: None,
        }
    }
}

impl ListOptions {
    /// Settings for the short "recent items" summary.
    #[must_use]
    pub const fn recent() -> Self {
        Self {
            page_size: RECENT_LIMIT,
            max_age: RECENT_MAX_AGE,
            search_query: None,
        }
    }

    #[must_use]
    pub const fn from_config(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_age: config.list_max_age(),
            search_query: None,
        }
    }

    #[must_use]
    pub fn recent_from_config(config: &ClientConfig) -> Self {
        Self {
            max_age: config.recent_max_age(),
            ..Self::recent()
        }
    }

    #[must_use]
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = normalize_text_option(Some(query.into()));
        self
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// What a controller is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Loading,
    LoadingMore,
    Refreshing,
}

/// Why a trigger did not reach the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A fetch for the collection is already outstanding
    InFlight,
    /// The API reported no further pages
    Exhausted,
    /// No first page has been loaded for the active query yet
    NotLoaded,
    /// The list has no items to extend
    Empty,
    /// A text input owns the gesture
    InputFocused,
}

/// Result of a sync operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A page was fetched and merged
    Fetched {
        /// Items in the response
        received: usize,
        /// Items that made it into the cache after dedupe
        added: usize,
    },
    /// The cache was fresh; no request was made
    FromCache,
    /// The trigger was dropped
    Skipped(SkipReason),
    /// A newer request for the collection replaced this one; its result was discarded
    Superseded,
}

/// Snapshot handed to a list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub is_refreshing: bool,
    pub has_more: bool,
}

#[derive(Debug, Default)]
struct Activity {
    phase: SyncPhase,
    ticket: Option<FetchTicket>,
}

/// Synchronization controller for one collection.
pub struct ListSync<T, R> {
    store: CacheStore<T>,
    remote: Arc<R>,
    collection: CollectionKey,
    page_size: u32,
    max_age: Duration,
    search: RwLock<Option<String>>,
    activity: Mutex<Activity>,
}

impl<T, R> std::fmt::Debug for ListSync<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListSync")
            .field("collection", &self.collection)
            .field("page_size", &self.page_size)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl<T: Record, R: RemoteSource<T>> ListSync<T, R> {
    pub fn new(
        store: CacheStore<T>,
        remote: Arc<R>,
        collection: CollectionKey,
        options: ListOptions,
    ) -> Self {
        Self {
            store,
            remote,
            collection,
            page_size: options.page_size.max(1),
            max_age: options.max_age,
            search: RwLock::new(normalize_text_option(options.search_query)),
            activity: Mutex::new(Activity::default()),
        }
    }

    pub const fn collection(&self) -> &CollectionKey {
        &self.collection
    }

    pub const fn store(&self) -> &CacheStore<T> {
        &self.store
    }

    /// Active search filter, if any.
    pub fn search_query(&self) -> Option<String> {
        self.search
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.activity().phase
    }

    /// Current cache entry of the collection.
    pub fn entry(&self) -> CacheEntry<T> {
        self.store.get(&self.collection)
    }

    /// Copy of everything a list view renders.
    pub fn view(&self) -> ListView<T> {
        let entry = self.entry();
        let phase = self.phase();
        let is_loading_more = phase == SyncPhase::LoadingMore;
        ListView {
            items: entry.items,
            is_loading: entry.loading && !is_loading_more,
            is_loading_more,
            is_refreshing: phase == SyncPhase::Refreshing,
            has_more: entry.has_more,
        }
    }

    /// Load the first page, or serve the cache when it is fresh, non-empty
    /// and unfiltered.
    pub async fn load_initial(&self) -> SyncResult<SyncOutcome> {
        self.load_first_page(false).await
    }

    /// Reload the first page regardless of freshness.
    pub async fn refresh(&self) -> SyncResult<SyncOutcome> {
        self.load_first_page(true).await
    }

    /// Change the search filter and reload from page 1.
    ///
    /// Runs even while another fetch is outstanding; that fetch's result is
    /// discarded when it lands.
    pub async fn set_search_query(&self, query: Option<String>) -> SyncResult<SyncOutcome> {
        let query = normalize_text_option(query);
        *self.search.write().unwrap_or_else(PoisonError::into_inner) = query.clone();
        tracing::debug!(
            "{}: search changed to {:?}, reloading",
            self.collection,
            query
        );
        let ticket = self.store.begin_reload(&self.collection);
        self.fetch_first_page(ticket, SyncPhase::Loading, query).await
    }

    /// Fetch the next page and append its unseen items.
    pub async fn load_more(&self) -> SyncResult<SyncOutcome> {
        let search = self.search_query();
        if let Some(reason) = Self::cursor_block(&self.entry(), search.as_deref()) {
            return Ok(self.skipped("load more", reason));
        }
        let Some(ticket) = self.store.begin_fetch(&self.collection) else {
            return Ok(self.skipped("load more", SkipReason::InFlight));
        };

        // Read the cursor only once the slot is ours, so a page that landed in
        // between is accounted for.
        let entry = self.entry();
        if let Some(reason) = Self::cursor_block(&entry, search.as_deref()) {
            self.store.abort_fetch(&self.collection, ticket);
            return Ok(self.skipped("load more", reason));
        }
        let page_number = entry.loaded_page;

        self.enter(SyncPhase::LoadingMore, ticket);
        let query = PageQuery {
            page: page_number,
            page_size: self.page_size,
            search,
        };
        let result = self.remote.fetch_page(&self.collection, &query).await;
        let page = match result {
            Ok(page) => page,
            Err(error) => return Err(self.fail(ticket, page_number, error)),
        };

        self.note_anomalies(&page, page_number);
        let has_more = page.has_more();
        let received = page.items.len();
        let applied = self.store.finish_fetch(&self.collection, ticket, |entry| {
            let mut known: HashSet<ItemId> =
                entry.items.iter().map(|item| item.id().clone()).collect();
            let before = entry.items.len();
            entry
                .items
                .extend(page.items.into_iter().filter(|item| known.insert(item.id().clone())));
            if has_more {
                entry.loaded_page = page_number + 1;
            } else {
                entry.has_more = false;
            }
            entry.items.len() - before
        });
        self.leave(ticket);

        let Some(added) = applied else {
            tracing::debug!(
                "{}: page {} was superseded, discarding",
                self.collection,
                page_number
            );
            return Ok(SyncOutcome::Superseded);
        };
        if added < received {
            tracing::debug!(
                "{}: dropped {} already cached items from page {}",
                self.collection,
                received - added,
                page_number
            );
        }
        tracing::info!(
            "{}: merged page {} (+{} items, more: {})",
            self.collection,
            page_number,
            added,
            has_more
        );
        Ok(SyncOutcome::Fetched { received, added })
    }

    /// Pull-to-refresh entry point. Suppressed while a fetch is outstanding
    /// or a text input has focus.
    pub async fn on_pull_past_threshold(&self, input_focused: bool) -> SyncResult<SyncOutcome> {
        if let Some(reason) = triggers::refresh_block(&self.entry(), input_focused) {
            return Ok(self.skipped("pull to refresh", reason));
        }
        self.refresh().await
    }

    /// Near-end-of-list entry point. Suppressed when nothing is left to load,
    /// a fetch is outstanding, or the list is empty.
    pub async fn on_near_end(&self) -> SyncResult<SyncOutcome> {
        if let Some(reason) = triggers::load_more_block(&self.entry()) {
            return Ok(self.skipped("near end", reason));
        }
        self.load_more().await
    }

    /// Show `item` immediately: prepended, or replacing the cached item with
    /// the same id. Calling it twice with one id leaves a single item.
    pub fn insert_optimistic(&self, item: T) {
        self.store.insert(&self.collection, item);
    }

    /// Replace the cached item with the same id; no-op when absent.
    pub fn update_optimistic(&self, item: T) {
        self.store.update(&self.collection, item);
    }

    /// Drop the cached item with `id`; no-op when absent.
    pub fn remove_optimistic(&self, id: &ItemId) {
        self.store.remove(&self.collection, id);
    }

    /// Create on the server, then cache the confirmed record.
    pub async fn create(&self, draft: &T::Draft) -> SyncResult<T> {
        let created = self.remote.create_item(&self.collection, draft).await?;
        self.store.insert(&self.collection, created.clone());
        tracing::info!("{}: created {}", self.collection, created.id());
        Ok(created)
    }

    /// Show a placeholder right away, then swap in the server's record.
    /// The placeholder is withdrawn if the server rejects the draft.
    pub async fn create_optimistic(&self, draft: &T::Draft) -> SyncResult<T> {
        let placeholder = T::from_draft(ItemId::generate(), draft, self.store.now_millis());
        let local_id = placeholder.id().clone();
        self.store.insert(&self.collection, placeholder);

        match self.remote.create_item(&self.collection, draft).await {
            Ok(created) => {
                self.store
                    .reconcile(&self.collection, &local_id, created.clone());
                tracing::info!(
                    "{}: confirmed {} as {}",
                    self.collection,
                    local_id,
                    created.id()
                );
                Ok(created)
            }
            Err(error) => {
                self.store.remove(&self.collection, &local_id);
                tracing::warn!("{}: create failed: {}", self.collection, error);
                Err(error)
            }
        }
    }

    /// Update on the server, then replace the cached record.
    pub async fn update(&self, id: &ItemId, draft: &T::Draft) -> SyncResult<T> {
        let updated = self.remote.update_item(&self.collection, id, draft).await?;
        self.store.update(&self.collection, updated.clone());
        tracing::info!("{}: updated {}", self.collection, id);
        Ok(updated)
    }

    /// Delete on the server, then drop the cached record.
    pub async fn delete(&self, id: &ItemId) -> SyncResult<()> {
        self.remote.delete_item(&self.collection, id).await?;
        self.store.remove(&self.collection, id);
        tracing::info!("{}: deleted {}", self.collection, id);
        Ok(())
    }

    async fn load_first_page(&self, force: bool) -> SyncResult<SyncOutcome> {
        let search = self.search_query();
        if !force && search.is_none() && self.cache_is_reusable() {
            tracing::debug!("{}: cache is fresh, skipping fetch", self.collection);
            return Ok(SyncOutcome::FromCache);
        }

        let operation = if force { "refresh" } else { "initial load" };
        let Some(ticket) = self.store.begin_fetch(&self.collection) else {
            return Ok(self.skipped(operation, SkipReason::InFlight));
        };
        let phase = if force {
            SyncPhase::Refreshing
        } else {
            SyncPhase::Loading
        };
        self.fetch_first_page(ticket, phase, search).await
    }

    fn cache_is_reusable(&self) -> bool {
        let entry = self.entry();
        !entry.items.is_empty()
            && entry.query.is_none()
            && !self.store.is_stale(&self.collection, self.max_age)
    }

    async fn fetch_first_page(
        &self,
        ticket: FetchTicket,
        phase: SyncPhase,
        search: Option<String>,
    ) -> SyncResult<SyncOutcome> {
        self.enter(phase, ticket);
        let query = PageQuery {
            page: 1,
            page_size: self.page_size,
            search: search.clone(),
        };
        let page = match self.remote.fetch_page(&self.collection, &query).await {
            Ok(page) => page,
            Err(error) => return Err(self.fail(ticket, 1, error)),
        };

        self.note_anomalies(&page, 1);
        let has_more = page.has_more();
        let received = page.items.len();
        let applied = self.store.finish_fetch(&self.collection, ticket, |entry| {
            let (items, _) = dedupe_by_id(page.items);
            entry.items = items;
            entry.loaded_page = if has_more { 2 } else { 1 };
            entry.has_more = has_more;
            entry.query = search;
            entry.items.len()
        });
        self.leave(ticket);

        let Some(added) = applied else {
            tracing::debug!(
                "{}: first page was superseded, discarding",
                self.collection
            );
            return Ok(SyncOutcome::Superseded);
        };
        tracing::info!(
            "{}: loaded {} items (more: {})",
            self.collection,
            added,
            has_more
        );
        Ok(SyncOutcome::Fetched { received, added })
    }

    fn cursor_block(entry: &CacheEntry<T>, search: Option<&str>) -> Option<SkipReason> {
        if entry.loading {
            Some(SkipReason::InFlight)
        } else if !entry.has_more {
            Some(SkipReason::Exhausted)
        } else if entry.loaded_page == 0 || entry.query.as_deref() != search {
            Some(SkipReason::NotLoaded)
        } else {
            None
        }
    }

    fn note_anomalies(&self, page: &Page<T>, page_number: u32) {
        let has_more = page.has_more();
        if has_more && page.items.is_empty() {
            tracing::warn!(
                "{}: page {} was empty but the API reports more pages; moving past it",
                self.collection,
                page_number
            );
        } else if !has_more
            && page.pagination.is_some()
            && page.items.len() >= self.page_size as usize
        {
            tracing::debug!(
                "{}: page {} was full but the API reports no more pages",
                self.collection,
                page_number
            );
        }
    }

    fn fail(&self, ticket: FetchTicket, page_number: u32, error: SyncError) -> SyncError {
        self.store.abort_fetch(&self.collection, ticket);
        self.leave(ticket);
        if error.is_auth() {
            tracing::warn!(
                "{}: page {} rejected, re-authentication required: {}",
                self.collection,
                page_number,
                error
            );
        } else {
            tracing::warn!(
                "{}: fetching page {} failed: {}",
                self.collection,
                page_number,
                error
            );
        }
        error
    }

    fn skipped(&self, operation: &str, reason: SkipReason) -> SyncOutcome {
        tracing::debug!("{}: {} skipped ({:?})", self.collection, operation, reason);
        SyncOutcome::Skipped(reason)
    }

    fn activity(&self) -> MutexGuard<'_, Activity> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, phase: SyncPhase, ticket: FetchTicket) {
        let mut activity = self.activity();
        activity.phase = phase;
        activity.ticket = Some(ticket);
    }

    fn leave(&self, ticket: FetchTicket) {
        let mut activity = self.activity();
        if activity.ticket == Some(ticket) {
            *activity = Activity::default();
        }
    }
}
