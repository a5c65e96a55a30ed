use std::path::Path;

use chrono::Utc;
use daybook_core::config::ClientConfig;
use daybook_core::models::LogEntry;
use daybook_core::{ListOptions, Session};

use crate::commands::common::{entry_to_list_item, format_entry_line, open_source, EntryListItem};
use crate::error::CliError;

pub async fn run_recent(
    as_json: bool,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let source = open_source(config, config_path)?;
    let session = Session::init();
    let list = session.recent_list(source, ListOptions::recent_from_config(config));
    list.load_initial().await?;
    let items = list.view().items;
    let now_ms = Utc::now().timestamp_millis();

    if as_json {
        let json_items = items
            .iter()
            .map(|entry| entry_to_list_item(entry, now_ms))
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Nothing recorded yet");
    }
    for entry in &items {
        println!("{}", format_recent_line(entry, now_ms));
    }
    Ok(())
}

/// Entry line with its linked transaction, if any.
pub fn format_recent_line(entry: &LogEntry, now_ms: i64) -> String {
    let line = format_entry_line(entry, now_ms);
    match &entry.accounting {
        Some(accounting) => {
            let category = accounting.category.as_deref().unwrap_or("uncategorized");
            format!(
                "{line}  [{} {:.2} {category}]",
                accounting.kind, accounting.amount
            )
        }
        None => line,
    }
}
