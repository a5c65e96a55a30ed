use std::path::Path;

use daybook_core::config::ClientConfig;
use daybook_core::models::TransactionKind;
use daybook_core::summary::{group_by_day, Totals, TransactionFilter};
use daybook_core::{ListOptions, Session, Transaction};
use serde::Serialize;

use crate::commands::common::{
    format_transaction_line, load_pages, open_source, transaction_to_list_item,
    TransactionListItem,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct TransactionReport {
    transactions: Vec<TransactionListItem>,
    income: f64,
    expense: f64,
    balance: f64,
}

pub async fn run_transactions(
    kind: Option<TransactionKind>,
    category: Option<String>,
    pages: u32,
    as_json: bool,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let source = open_source(config, config_path)?;
    let session = Session::init();
    let list = session.transaction_list(source, ListOptions::from_config(config));
    load_pages(&list, pages).await?;
    let view = list.view();

    let filter = TransactionFilter::new(kind, category);
    let matching: Vec<Transaction> = filter.apply(&view.items).into_iter().cloned().collect();
    let totals = Totals::of(&matching);

    if as_json {
        let report = TransactionReport {
            transactions: matching.iter().map(transaction_to_list_item).collect(),
            income: totals.income,
            expense: totals.expense,
            balance: totals.balance,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if matching.is_empty() {
        println!("No transactions found");
    }
    for group in group_by_day(&matching) {
        println!("{}", group.day.format("%a %Y-%m-%d"));
        for transaction in &group.items {
            println!("  {}", format_transaction_line(transaction));
        }
    }
    println!(
        "Income {:.2}  Expense {:.2}  Balance {:+.2}",
        totals.income, totals.expense, totals.balance
    );
    if view.has_more {
        println!("(more transactions available, use --pages to load further)");
    }

    Ok(())
}
