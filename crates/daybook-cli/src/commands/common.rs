use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use daybook_core::config::ClientConfig;
use daybook_core::models::{LogEntry, Mood, Transaction};
use daybook_core::remote::{HttpSource, RemoteSource};
use daybook_core::util::truncate_with_ellipsis;
use daybook_core::{ListSync, Record, SkipReason, SyncOutcome};
use serde::Serialize;

use crate::error::CliError;

const SHORT_ID_CHARS: usize = 13;
const PREVIEW_CHARS: usize = 40;

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub moods: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionListItem {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub amount: f64,
    pub signed_amount: f64,
    pub description: String,
}

/// HTTP source for the configured API. Fails when no base URL is set.
pub fn open_source(config: &ClientConfig, config_path: &Path) -> Result<Arc<HttpSource>, CliError> {
    if config.api_base_url.is_none() {
        return Err(CliError::NotConfigured(config_path.display().to_string()));
    }
    Ok(Arc::new(HttpSource::from_config(config)?))
}

/// Load the first page and then up to `pages - 1` more, stopping early once
/// the list is exhausted.
pub async fn load_pages<T, R>(list: &ListSync<T, R>, pages: u32) -> Result<usize, CliError>
where
    T: Record,
    R: RemoteSource<T>,
{
    if pages == 0 {
        return Err(CliError::InvalidPageCount);
    }

    let mut loaded = 1;
    list.load_initial().await?;
    while loaded < pages {
        match list.load_more().await? {
            SyncOutcome::Skipped(SkipReason::Exhausted | SkipReason::Empty) => break,
            SyncOutcome::Skipped(reason) => {
                tracing::debug!("Stopped paging early ({:?})", reason);
                break;
            }
            _ => loaded += 1,
        }
    }
    Ok(list.view().items.len())
}

pub fn entry_to_list_item(entry: &LogEntry, now_ms: i64) -> EntryListItem {
    EntryListItem {
        id: entry.id.to_string(),
        title: entry.display_title(),
        preview: entry_preview(entry, PREVIEW_CHARS),
        content: entry.content.clone(),
        moods: entry.moods.iter().map(ToString::to_string).collect(),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        relative_time: format_relative_time(entry.created_at, now_ms),
    }
}

pub fn transaction_to_list_item(transaction: &Transaction) -> TransactionListItem {
    TransactionListItem {
        id: transaction.id.to_string(),
        date: transaction.date.to_string(),
        kind: transaction.kind.to_string(),
        category: transaction.category.clone(),
        amount: transaction.amount,
        signed_amount: transaction.signed_amount(),
        description: transaction.description.clone(),
    }
}

pub fn format_entry_lines(entries: &[LogEntry]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    entries
        .iter()
        .map(|entry| format_entry_line(entry, now_ms))
        .collect()
}

pub fn format_entry_line(entry: &LogEntry, now_ms: i64) -> String {
    let short_id = short_id(entry.id.as_str());
    let preview = entry_preview(entry, PREVIEW_CHARS);
    let relative_time = format_relative_time(entry.created_at, now_ms);
    let moods = render_moods(&entry.moods);

    if moods.is_empty() {
        format!("{short_id:<13}  {preview:<40}  {relative_time}")
    } else {
        format!("{short_id:<13}  {preview:<40}  {relative_time:<10}  {moods}")
    }
}

pub fn format_transaction_line(transaction: &Transaction) -> String {
    let short_id = short_id(transaction.id.as_str());
    let amount = format!("{:+.2}", transaction.signed_amount());
    let description = truncate_with_ellipsis(transaction.description.trim(), PREVIEW_CHARS);
    format!(
        "{short_id:<13}  {:<10}  {amount:>10}  {:<14}  {description}",
        transaction.date, transaction.category
    )
}

pub fn entry_preview(entry: &LogEntry, max_chars: usize) -> String {
    let first_line = entry
        .display_title()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    truncate_with_ellipsis(&first_line, max_chars)
}

pub fn render_moods(moods: &[Mood]) -> String {
    moods
        .iter()
        .map(|mood| format!("{} {}", mood.emoji(), mood))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_CHARS).collect()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn resolve_entry_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}
