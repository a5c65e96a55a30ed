//! Signed-in session context.
//!
//! A `Session` owns the list caches for one signed-in user. It is created at
//! sign-in, handed to every list controller, and cleared at logout so the next
//! user never sees stale data.

use std::sync::Arc;

use crate::cache::{CacheStore, Clock, SystemClock};
use crate::models::{CollectionKey, LogEntry, Transaction};
use crate::remote::RemoteSource;
use crate::sync::{ListOptions, ListSync};

/// Cache context shared by all list controllers of one user session.
#[derive(Debug, Clone)]
pub struct Session {
    entries: CacheStore<LogEntry>,
    transactions: CacheStore<Transaction>,
    clock: Arc<dyn Clock>,
}

impl Default for Session {
    fn default() -> Self {
        Self::init()
    }
}

impl Session {
    /// Start a session backed by the system clock.
    pub fn init() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        tracing::debug!("Starting cache session");
        Self {
            entries: CacheStore::new(Arc::clone(&clock)),
            transactions: CacheStore::new(Arc::clone(&clock)),
            clock,
        }
    }

    /// Journal entries, including the "recent" summary collection.
    pub const fn entries(&self) -> &CacheStore<LogEntry> {
        &self.entries
    }

    pub const fn transactions(&self) -> &CacheStore<Transaction> {
        &self.transactions
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Drop every cached collection. Fetches still in flight are discarded
    /// when they complete.
    pub fn clear(&self) {
        self.entries.clear(None);
        self.transactions.clear(None);
        tracing::info!("Cleared cached collections");
    }

    /// Controller for the journal entry list.
    pub fn entry_list<R: RemoteSource<LogEntry>>(
        &self,
        remote: Arc<R>,
        options: ListOptions,
    ) -> ListSync<LogEntry, R> {
        ListSync::new(
            self.entries.clone(),
            remote,
            CollectionKey::entries(),
            options,
        )
    }

    /// Controller for the "recent items" summary.
    pub fn recent_list<R: RemoteSource<LogEntry>>(
        &self,
        remote: Arc<R>,
        options: ListOptions,
    ) -> ListSync<LogEntry, R> {
        ListSync::new(self.entries.clone(), remote, CollectionKey::recent(), options)
    }

    pub fn transaction_list<R: RemoteSource<Transaction>>(
        &self,
        remote: Arc<R>,
        options: ListOptions,
    ) -> ListSync<Transaction, R> {
        ListSync::new(
            self.transactions.clone(),
            remote,
            CollectionKey::transactions(),
            options,
        )
    }
}
