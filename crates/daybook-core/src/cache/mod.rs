//! Per-collection list cache.
//!
//! `CacheStore` holds the materialized item list of every collection together
//! with its freshness stamp and pagination cursor. It is pure in-memory state:
//! every operation is synchronous, never fails, and never performs I/O. Readers
//! always receive copies, so a snapshot can't tear while a fetch result lands.
//!
//! The only writer is the sync controller; the fetch bookkeeping methods
//! (`begin_fetch`, `finish_fetch`, ...) are crate-private for that reason.

mod clock;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

pub use clock::{duration_millis, Clock, ManualClock, SystemClock};

use crate::models::{CollectionKey, ItemId, Record};

/// Default freshness window for list collections.
pub const LIST_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// Default freshness window for the "recent items" summary.
pub const RECENT_MAX_AGE: Duration = Duration::from_secs(2 * 60);

/// Cached state of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// Newest-first, unique by id
    pub items: Vec<T>,
    /// Unix ms of the last successful fetch, `None` if never fetched
    pub last_fetch: Option<i64>,
    /// A fetch for this collection is in flight
    pub loading: bool,
    /// Page the next `load_more` requests; 0 until a first page is merged
    pub loaded_page: u32,
    /// The API reported pages beyond `loaded_page`
    pub has_more: bool,
    /// Search query the items were fetched with
    pub query: Option<String>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            last_fetch: None,
            loading: false,
            loaded_page: 0,
            has_more: true,
            query: None,
        }
    }
}

impl<T> CacheEntry<T> {
    #[must_use]
    pub const fn cursor(&self) -> PageCursor {
        PageCursor {
            loaded_page: self.loaded_page,
            has_more: self.has_more,
        }
    }
}

impl<T: Record> CacheEntry<T> {
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }
}

/// Pagination bookkeeping written alongside a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub loaded_page: u32,
    pub has_more: bool,
}

/// Identifies one issued fetch. Only the newest ticket of a collection may
/// write its result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

#[derive(Debug)]
struct Slot<T> {
    entry: CacheEntry<T>,
    ticket: Option<FetchTicket>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            entry: CacheEntry::default(),
            ticket: None,
        }
    }
}

/// Process-wide, collection-keyed list cache. Clones share state.
pub struct CacheStore<T> {
    slots: Arc<RwLock<HashMap<CollectionKey, Slot<T>>>>,
    next_ticket: Arc<AtomicU64>,
    clock: Arc<dyn Clock>,
}

impl<T> Clone for CacheStore<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            next_ticket: Arc::clone(&self.next_ticket),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T> std::fmt::Debug for CacheStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("collections", &self.read().len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl<T: Record> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl<T> CacheStore<T> {
    // A panic while holding the lock can't leave a slot half-written (every
    // mutation is a single assignment or Vec operation), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<CollectionKey, Slot<T>>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CollectionKey, Slot<T>>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Record> CacheStore<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            next_ticket: Arc::new(AtomicU64::new(1)),
            clock,
        }
    }

    /// Current time according to the store's clock (Unix ms).
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Snapshot of a collection, created empty on first access.
    pub fn get(&self, collection: &CollectionKey) -> CacheEntry<T> {
        if let Some(slot) = self.read().get(collection) {
            return slot.entry.clone();
        }
        self.write()
            .entry(collection.clone())
            .or_default()
            .entry
            .clone()
    }

    /// Replace a collection's items and loading flag and stamp it fresh.
    ///
    /// Duplicate ids in `items` are dropped, keeping the first occurrence.
    pub fn set(
        &self,
        collection: &CollectionKey,
        items: Vec<T>,
        loading: bool,
        cursor: Option<PageCursor>,
    ) {
        let now = self.now_millis();
        let (items, _) = dedupe_by_id(items);
        let mut slots = self.write();
        let entry = &mut slots.entry(collection.clone()).or_default().entry;
        entry.items = items;
        entry.loading = loading;
        entry.last_fetch = Some(now);
        if let Some(cursor) = cursor {
            entry.loaded_page = cursor.loaded_page;
            entry.has_more = cursor.has_more;
        }
    }

    /// Whether a collection must be fetched again: never fetched, or fetched
    /// longer than `max_age` ago.
    pub fn is_stale(&self, collection: &CollectionKey, max_age: Duration) -> bool {
        let last_fetch = self
            .read()
            .get(collection)
            .and_then(|slot| slot.entry.last_fetch);
        last_fetch.map_or(true, |last_fetch| {
            self.now_millis().saturating_sub(last_fetch) > duration_millis(max_age)
        })
    }

    /// Prepend `item`, or replace the cached item with the same id in place.
    pub fn insert(&self, collection: &CollectionKey, item: T) {
        let mut slots = self.write();
        let items = &mut slots.entry(collection.clone()).or_default().entry.items;
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => items.insert(0, item),
        }
    }

    /// Replace the cached item with the same id; no-op when absent.
    pub fn update(&self, collection: &CollectionKey, item: T) {
        let mut slots = self.write();
        if let Some(slot) = slots.get_mut(collection) {
            if let Some(existing) = slot
                .entry
                .items
                .iter_mut()
                .find(|existing| existing.id() == item.id())
            {
                *existing = item;
            }
        }
    }

    /// Drop the item with `id`; no-op when absent.
    pub fn remove(&self, collection: &CollectionKey, id: &ItemId) {
        if let Some(slot) = self.write().get_mut(collection) {
            slot.entry.items.retain(|item| item.id() != id);
        }
    }

    /// Swap a locally created placeholder for its server-confirmed version.
    ///
    /// The confirmed item takes the placeholder's position. If it is already
    /// cached (a refresh delivered it first) the placeholder is just dropped,
    /// and if the placeholder is gone the confirmed item is prepended.
    pub fn reconcile(&self, collection: &CollectionKey, local_id: &ItemId, confirmed: T) {
        let mut slots = self.write();
        let items = &mut slots.entry(collection.clone()).or_default().entry.items;
        if items.iter().any(|item| item.id() == confirmed.id()) {
            items.retain(|item| item.id() != local_id);
            if let Some(existing) = items.iter_mut().find(|item| item.id() == confirmed.id()) {
                *existing = confirmed;
            }
            return;
        }
        match items.iter_mut().find(|item| item.id() == local_id) {
            Some(placeholder) => *placeholder = confirmed,
            None => items.insert(0, confirmed),
        }
    }

    /// Reset one collection, or every collection when `None`.
    ///
    /// A fetch in flight for a cleared collection loses its ticket and its
    /// result is discarded when it lands.
    pub fn clear(&self, collection: Option<&CollectionKey>) {
        let mut slots = self.write();
        match collection {
            Some(collection) => {
                slots.insert(collection.clone(), Slot::default());
            }
            None => slots.clear(),
        }
    }

    /// Claim the collection's in-flight slot. Returns `None` if a fetch is
    /// already outstanding.
    pub(crate) fn begin_fetch(&self, collection: &CollectionKey) -> Option<FetchTicket> {
        let mut slots = self.write();
        let slot = slots.entry(collection.clone()).or_default();
        if slot.ticket.is_some() {
            return None;
        }
        let ticket = self.issue_ticket();
        slot.ticket = Some(ticket);
        slot.entry.loading = true;
        Some(ticket)
    }

    /// Claim the in-flight slot unconditionally, superseding any outstanding
    /// fetch (whose result will then be discarded).
    pub(crate) fn begin_reload(&self, collection: &CollectionKey) -> FetchTicket {
        let mut slots = self.write();
        let slot = slots.entry(collection.clone()).or_default();
        let ticket = self.issue_ticket();
        slot.ticket = Some(ticket);
        slot.entry.loading = true;
        ticket
    }

    /// Apply a fetch result if `ticket` is still the collection's newest.
    ///
    /// `apply` receives the entry and the current time; the entry is then
    /// stamped fresh and marked idle. Returns `None` for superseded tickets.
    pub(crate) fn finish_fetch<R>(
        &self,
        collection: &CollectionKey,
        ticket: FetchTicket,
        apply: impl FnOnce(&mut CacheEntry<T>) -> R,
    ) -> Option<R> {
        let now = self.now_millis();
        let mut slots = self.write();
        let slot = slots.get_mut(collection)?;
        if slot.ticket != Some(ticket) {
            return None;
        }
        let result = apply(&mut slot.entry);
        slot.entry.last_fetch = Some(now);
        slot.entry.loading = false;
        slot.ticket = None;
        Some(result)
    }

    /// Release the in-flight slot after a failed fetch, leaving the entry
    /// otherwise untouched.
    pub(crate) fn abort_fetch(&self, collection: &CollectionKey, ticket: FetchTicket) {
        let mut slots = self.write();
        if let Some(slot) = slots.get_mut(collection) {
            if slot.ticket == Some(ticket) {
                slot.ticket = None;
                slot.entry.loading = false;
            }
        }
    }

    fn issue_ticket(&self) -> FetchTicket {
        FetchTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed))
    }
}

/// Drop items whose id was already seen, keeping the first occurrence.
/// Returns the kept items and how many were dropped.
pub fn dedupe_by_id<T: Record>(items: Vec<T>) -> (Vec<T>, usize) {
    let mut seen = HashSet::with_capacity(items.len());
    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(item.id().clone()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
