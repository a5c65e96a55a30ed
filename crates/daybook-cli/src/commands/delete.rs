use std::path::Path;

use daybook_core::config::ClientConfig;
use daybook_core::{ItemId, ListOptions, Session};

use crate::commands::common::{normalize_identifier, open_source};
use crate::error::CliError;

pub async fn run_delete_entry(
    id: &str,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let id = ItemId::new(normalize_identifier(id)?);
    let source = open_source(config, config_path)?;
    Session::init()
        .entry_list(source, ListOptions::from_config(config))
        .delete(&id)
        .await?;

    println!("{id}");
    Ok(())
}

pub async fn run_delete_transaction(
    id: &str,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let id = ItemId::new(normalize_identifier(id)?);
    let source = open_source(config, config_path)?;
    Session::init()
        .transaction_list(source, ListOptions::from_config(config))
        .delete(&id)
        .await?;

    println!("{id}");
    Ok(())
}
