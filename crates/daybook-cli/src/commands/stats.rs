use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use daybook_core::config::ClientConfig;
use daybook_core::models::{LogEntry, Transaction};
use daybook_core::summary::{
    category_breakdown, cashflow_series, entry_activity, mood_counts, within_range, TimeRange,
    Totals,
};
use daybook_core::{ListOptions, Session};
use serde::Serialize;

use crate::commands::common::{load_pages, open_source};
use crate::error::CliError;

#[derive(Debug, Serialize, PartialEq)]
pub struct StatsReport {
    pub range: &'static str,
    pub total_entries: usize,
    pub total_transactions: usize,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    pub activity: Vec<ActivityRow>,
    pub moods: Vec<MoodRow>,
    pub categories: Vec<CategoryRow>,
    pub cashflow: Vec<CashflowRow>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ActivityRow {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MoodRow {
    pub mood: String,
    pub emoji: &'static str,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryRow {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub category: String,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CashflowRow {
    pub label: String,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

pub async fn run_stats(
    range: TimeRange,
    pages: u32,
    as_json: bool,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    let source = open_source(config, config_path)?;
    let session = Session::init();
    let options = ListOptions::from_config(config);

    let entries = session.entry_list(Arc::clone(&source), options.clone());
    let transactions = session.transaction_list(source, options);
    load_pages(&entries, pages).await?;
    load_pages(&transactions, pages).await?;

    let entries = entries.view();
    let transactions = transactions.view();
    if entries.has_more || transactions.has_more {
        tracing::warn!(
            "Statistics cover the first {} page(s) only, use --pages to load further",
            pages
        );
    }

    let report = build_stats_report(
        &entries.items,
        &transactions.items,
        range,
        Utc::now().date_naive(),
    );
    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_stats_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn build_stats_report(
    entries: &[LogEntry],
    transactions: &[Transaction],
    range: TimeRange,
    today: NaiveDate,
) -> StatsReport {
    let totals = Totals::of(within_range(transactions, range, today));
    StatsReport {
        range: range.as_str(),
        total_entries: within_range(entries, range, today).len(),
        total_transactions: within_range(transactions, range, today).len(),
        income: totals.income,
        expense: totals.expense,
        balance: totals.balance,
        activity: entry_activity(entries, range, today)
            .into_iter()
            .map(|point| ActivityRow {
                label: point.bucket.label(),
                count: point.count,
            })
            .collect(),
        moods: mood_counts(entries, range, today)
            .into_iter()
            .map(|count| MoodRow {
                emoji: count.mood.emoji(),
                mood: count.mood.to_string(),
                count: count.count,
            })
            .collect(),
        categories: category_breakdown(transactions, range, today)
            .into_iter()
            .map(|total| CategoryRow {
                kind: total.kind.as_str(),
                category: total.category,
                amount: total.amount,
                count: total.count,
            })
            .collect(),
        cashflow: cashflow_series(transactions, range, today)
            .into_iter()
            .map(|point| CashflowRow {
                label: point.bucket.label(),
                income: point.totals.income,
                expense: point.totals.expense,
                balance: point.totals.balance,
            })
            .collect(),
    }
}

pub fn format_stats_lines(report: &StatsReport) -> Vec<String> {
    let mut lines = vec![
        format!("Last {}", report.range),
        format!(
            "{} entries, {} transactions",
            report.total_entries, report.total_transactions
        ),
        format!(
            "Income {:.2}  Expense {:.2}  Balance {:+.2}",
            report.income, report.expense, report.balance
        ),
        String::new(),
        "Entries".to_string(),
    ];
    lines.extend(
        report
            .activity
            .iter()
            .map(|row| format!("  {:<6} {}", row.label, "#".repeat(row.count))),
    );

    if !report.moods.is_empty() {
        lines.push(String::new());
        lines.push("Moods".to_string());
        lines.extend(
            report
                .moods
                .iter()
                .map(|row| format!("  {} {:<10} {}", row.emoji, row.mood, row.count)),
        );
    }

    if !report.categories.is_empty() {
        lines.push(String::new());
        lines.push("Categories".to_string());
        lines.extend(report.categories.iter().map(|row| {
            format!(
                "  {:<8} {:<14} {:>10.2}  ({}x)",
                row.kind, row.category, row.amount, row.count
            )
        }));
    }

    lines.push(String::new());
    lines.push("Cash flow".to_string());
    lines.extend(report.cashflow.iter().map(|row| {
        format!(
            "  {:<6} +{:<10.2} -{:<10.2} {:+.2}",
            row.label, row.income, row.expense, row.balance
        )
    }));
    lines
}
