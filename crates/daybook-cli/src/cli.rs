use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use daybook_core::models::TransactionKind;
use daybook_core::summary::TimeRange;

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Browse and record journal entries and transactions from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List journal entries, newest first
    #[command(alias = "logs")]
    Entries {
        /// Only show entries matching this text
        #[arg(short, long)]
        search: Option<String>,
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List income and expense transactions
    Transactions {
        /// Only show one kind of transaction
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Only show one category
        #[arg(long)]
        category: Option<String>,
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recent entries
    Recent {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a journal entry
    #[command(alias = "add")]
    AddEntry {
        /// Entry content (read from stdin when omitted)
        content: Vec<String>,
        /// Entry title (derived from the content when omitted)
        #[arg(long)]
        title: Option<String>,
        /// Mood tag, repeatable
        #[arg(long = "mood", value_name = "MOOD")]
        moods: Vec<String>,
    },
    /// Record an income or expense
    AddTransaction {
        /// Amount, always positive
        #[arg(long)]
        amount: f64,
        /// Category id (e.g. food, salary)
        #[arg(long)]
        category: String,
        /// Income or expense
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Free-form description
        #[arg(long)]
        description: Option<String>,
        /// Booking date (YYYY-MM-DD, today when omitted)
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Replace the content of a journal entry
    EditEntry {
        /// Entry ID
        id: String,
        /// New content (read from stdin when omitted)
        content: Vec<String>,
        /// New title (derived from the content when omitted)
        #[arg(long)]
        title: Option<String>,
        /// Mood tag, repeatable
        #[arg(long = "mood", value_name = "MOOD")]
        moods: Vec<String>,
    },
    /// Replace a transaction
    EditTransaction {
        /// Transaction ID
        id: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        category: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        description: Option<String>,
        /// Booking date (YYYY-MM-DD, today when omitted)
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Delete a journal entry
    DeleteEntry {
        /// Entry ID
        id: String,
    },
    /// Delete a transaction
    DeleteTransaction {
        /// Transaction ID
        id: String,
    },
    /// Summarize entries, moods and cash flow over a time range
    Stats {
        #[arg(short, long, value_enum, default_value = "week")]
        range: RangeArg,
        /// Number of pages to load per list
        #[arg(short, long, default_value = "5")]
        pages: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or write client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration (token redacted)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file location
    Path,
    /// Write settings to the config file, keeping the ones not given
    Init {
        /// API base URL (e.g. https://app.example.com/api)
        #[arg(long)]
        api_url: Option<String>,
        /// Bearer token sent with every request
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Seconds before a cached list is refetched
        #[arg(long)]
        list_max_age_secs: Option<u64>,
        /// Seconds before the recent summary is refetched
        #[arg(long)]
        recent_max_age_secs: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for TransactionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Income => Self::Income,
            KindArg::Expense => Self::Expense,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RangeArg {
    Week,
    Month,
    Year,
}

impl From<RangeArg> for TimeRange {
    fn from(range: RangeArg) -> Self {
        match range {
            RangeArg::Week => Self::Week,
            RangeArg::Month => Self::Month,
            RangeArg::Year => Self::Year,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
