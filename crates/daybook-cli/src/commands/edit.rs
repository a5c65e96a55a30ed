use std::path::Path;

use chrono::NaiveDate;
use daybook_core::config::ClientConfig;
use daybook_core::models::TransactionKind;
use daybook_core::{ItemId, ListOptions, Session};

use crate::commands::add::{build_entry_draft, build_transaction_draft};
use crate::commands::common::{normalize_identifier, open_source, resolve_entry_content};
use crate::error::CliError;

/// Replace an entry's content, title and moods.
pub async fn run_edit_entry(
    id: &str,
    content_parts: &[String],
    title: Option<String>,
    moods: Vec<String>,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let id = ItemId::new(normalize_identifier(id)?);
    let draft = build_entry_draft(resolve_entry_content(content_parts)?, title, moods)?;
    let source = open_source(config, config_path)?;
    let entry = Session::init()
        .entry_list(source, ListOptions::from_config(config))
        .update(&id, &draft)
        .await?;

    println!("{}", entry.id);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_edit_transaction(
    id: &str,
    kind: TransactionKind,
    amount: f64,
    category: &str,
    description: Option<String>,
    date: Option<NaiveDate>,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let id = ItemId::new(normalize_identifier(id)?);
    let draft = build_transaction_draft(kind, amount, category, description, date)?;
    let source = open_source(config, config_path)?;
    let transaction = Session::init()
        .transaction_list(source, ListOptions::from_config(config))
        .update(&id, &draft)
        .await?;

    println!("{}", transaction.id);
    Ok(())
}
