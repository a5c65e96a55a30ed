use std::path::Path;

use chrono::Utc;
use daybook_core::config::ClientConfig;
use daybook_core::summary::group_by_day;
use daybook_core::{ListOptions, Session};

use crate::commands::common::{
    entry_to_list_item, format_entry_lines, load_pages, open_source, EntryListItem,
};
use crate::error::CliError;

pub async fn run_entries(
    search: Option<String>,
    pages: u32,
    as_json: bool,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let source = open_source(config, config_path)?;
    let mut options = ListOptions::from_config(config);
    if let Some(query) = search {
        options = options.with_search(query);
    }

    let session = Session::init();
    let list = session.entry_list(source, options);
    load_pages(&list, pages).await?;
    let view = list.view();

    if as_json {
        let now_ms = Utc::now().timestamp_millis();
        let json_items = view
            .items
            .iter()
            .map(|entry| entry_to_list_item(entry, now_ms))
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if view.items.is_empty() {
        println!("No entries found");
        return Ok(());
    }
    for group in group_by_day(&view.items) {
        println!("{}", group.day.format("%a %Y-%m-%d"));
        for line in format_entry_lines(&group.items) {
            println!("  {line}");
        }
    }
    if view.has_more {
        println!("(more entries available, use --pages to load further)");
    }

    Ok(())
}
