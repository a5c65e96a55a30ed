//! Daybook CLI - Browse and record journal entries and transactions
//!
//! Thin front end over `daybook-core`: every command resolves the client
//! configuration, opens a cache session, and drives one list controller.

mod cli;
mod commands;
mod config;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::add::{run_add_entry, run_add_transaction};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::{run_delete_entry, run_delete_transaction};
use crate::commands::edit::{run_edit_entry, run_edit_transaction};
use crate::commands::entries::run_entries;
use crate::commands::recent::run_recent;
use crate::commands::stats::run_stats;
use crate::commands::transactions::run_transactions;
use crate::config::{config_path, load_config};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("daybook=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let path = config_path(cli.config.as_deref())?;
    let config = load_config(&path)?;

    match cli.command {
        Commands::Entries {
            search,
            pages,
            json,
        } => run_entries(search, pages, json, &config, &path).await?,
        Commands::Transactions {
            kind,
            category,
            pages,
            json,
        } => {
            run_transactions(kind.map(Into::into), category, pages, json, &config, &path).await?;
        }
        Commands::Recent { json } => run_recent(json, &config, &path).await?,
        Commands::AddEntry {
            content,
            title,
            moods,
        } => run_add_entry(&content, title, moods, &config, &path).await?,
        Commands::AddTransaction {
            amount,
            category,
            kind,
            description,
            date,
        } => {
            run_add_transaction(
                kind.into(),
                amount,
                &category,
                description,
                date,
                &config,
                &path,
            )
            .await?;
        }
        Commands::EditEntry {
            id,
            content,
            title,
            moods,
        } => run_edit_entry(&id, &content, title, moods, &config, &path).await?,
        Commands::EditTransaction {
            id,
            amount,
            category,
            kind,
            description,
            date,
        } => {
            run_edit_transaction(
                &id,
                kind.into(),
                amount,
                &category,
                description,
                date,
                &config,
                &path,
            )
            .await?;
        }
        Commands::DeleteEntry { id } => run_delete_entry(&id, &config, &path).await?,
        Commands::DeleteTransaction { id } => run_delete_transaction(&id, &config, &path).await?,
        Commands::Stats { range, pages, json } => {
            run_stats(range.into(), pages, json, &config, &path).await?;
        }
        Commands::Config { command } => run_config(command, &config, &path)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
