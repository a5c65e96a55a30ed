//! daybook-core - Core library for Daybook
//!
//! This crate contains the record models, the per-collection list cache, and
//! the synchronization controller that keeps cached lists in step with the
//! remote paginated API. The CLI (and any other front end) builds on it.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod summary;
pub mod sync;
pub mod triggers;
pub mod util;

pub use cache::{CacheEntry, CacheStore, Clock, ManualClock, SystemClock};
pub use error::{Error, Result, SyncError, SyncResult};
pub use models::{CollectionKey, ItemId, LogEntry, Record, Transaction};
pub use session::Session;
pub use sync::{ListOptions, ListSync, ListView, SkipReason, SyncOutcome};
