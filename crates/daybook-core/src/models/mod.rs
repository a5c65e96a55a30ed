//! Data models for Daybook

mod entry;
mod id;
mod record;
pub(crate) mod timestamp;
mod transaction;

pub use entry::{EntryAccounting, EntryDraft, LogEntry, Mood, ENTRY_TITLE_PREVIEW_CHARS};
pub use id::{CollectionKey, ItemId};
pub use record::Record;
pub use transaction::{
    Transaction, TransactionDraft, TransactionKind, EXPENSE_CATEGORIES, INCOME_CATEGORIES,
};
