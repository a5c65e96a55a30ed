use std::path::Path;

use chrono::NaiveDate;
use daybook_core::config::ClientConfig;
use daybook_core::models::{EntryDraft, Mood, TransactionDraft, TransactionKind};
use daybook_core::{ListOptions, Session};

use crate::commands::common::{open_source, resolve_entry_content};
use crate::error::CliError;

pub async fn run_add_entry(
    content_parts: &[String],
    title: Option<String>,
    moods: Vec<String>,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let draft = build_entry_draft(resolve_entry_content(content_parts)?, title, moods)?;
    let source = open_source(config, config_path)?;
    let session = Session::init();
    let entry = session
        .entry_list(source, ListOptions::from_config(config))
        .create(&draft)
        .await?;

    println!("{}", entry.id);
    Ok(())
}

pub fn build_entry_draft(
    content: String,
    title: Option<String>,
    moods: Vec<String>,
) -> Result<EntryDraft, CliError> {
    let mut draft = EntryDraft::new(content).with_moods(
        moods
            .into_iter()
            .map(|mood| mood.trim().to_string())
            .filter(|mood| !mood.is_empty())
            .map(Mood::from),
    );
    if let Some(title) = title {
        draft = draft.with_title(title);
    }
    draft.validate()?;
    Ok(draft)
}

pub async fn run_add_transaction(
    kind: TransactionKind,
    amount: f64,
    category: &str,
    description: Option<String>,
    date: Option<NaiveDate>,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let draft = build_transaction_draft(kind, amount, category, description, date)?;
    let source = open_source(config, config_path)?;
    let session = Session::init();
    let transaction = session
        .transaction_list(source, ListOptions::from_config(config))
        .create(&draft)
        .await?;

    println!("{}", transaction.id);
    Ok(())
}

pub fn build_transaction_draft(
    kind: TransactionKind,
    amount: f64,
    category: &str,
    description: Option<String>,
    date: Option<NaiveDate>,
) -> Result<TransactionDraft, CliError> {
    let mut draft = TransactionDraft::new(kind, amount, category.trim());
    if let Some(description) = description {
        draft = draft.with_description(description.trim());
    }
    if let Some(date) = date {
        draft = draft.on(date);
    }
    draft.validate()?;
    if !kind.owns_category(&draft.category) {
        tracing::warn!("'{}' is not a built-in {} category", draft.category, kind);
    }
    Ok(draft)
}
