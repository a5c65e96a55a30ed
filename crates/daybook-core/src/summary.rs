//! Derived views over cached lists: day groups, transaction filters, totals,
//! and the range statistics behind the stats screen.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::Error;
use crate::models::{LogEntry, Mood, Record, Transaction, TransactionKind};

/// Records that share a calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<T> {
    pub day: NaiveDate,
    pub items: Vec<T>,
}

/// Group records by calendar day, newest day first and newest record first
/// within a day.
pub fn group_by_day<T: Record>(items: &[T]) -> Vec<DayGroup<T>> {
    let mut dated: Vec<(NaiveDate, &T)> = items
        .iter()
        .filter_map(|item| match item.day() {
            Some(day) => Some((day, item)),
            None => {
                tracing::debug!("Skipping {} with out-of-range timestamp", item.id());
                None
            }
        })
        .collect();
    dated.sort_by(|(left_day, left), (right_day, right)| {
        right_day
            .cmp(left_day)
            .then_with(|| right.created_at().cmp(&left.created_at()))
    });

    let mut groups: Vec<DayGroup<T>> = Vec::new();
    for (day, item) in dated {
        match groups.last_mut() {
            Some(group) if group.day == day => group.items.push(item.clone()),
            _ => groups.push(DayGroup {
                day,
                items: vec![item.clone()],
            }),
        }
    }
    groups
}

/// Kind and category selection of the transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    kind: Option<TransactionKind>,
    category: Option<String>,
}

impl TransactionFilter {
    #[must_use]
    pub fn new(kind: Option<TransactionKind>, category: Option<String>) -> Self {
        let mut filter = Self::default();
        filter.set_kind(kind);
        filter.set_category(category);
        filter
    }

    pub const fn kind(&self) -> Option<TransactionKind> {
        self.kind
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Switch the kind. A selected category that the new kind does not offer
    /// is cleared.
    pub fn set_kind(&mut self, kind: Option<TransactionKind>) {
        self.kind = kind;
        if let (Some(kind), Some(category)) = (kind, self.category.as_deref()) {
            if !kind.owns_category(category) {
                self.category = None;
            }
        }
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = crate::util::normalize_text_option(category);
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.kind.map_or(true, |kind| transaction.kind == kind)
            && self
                .category
                .as_deref()
                .map_or(true, |category| transaction.category == category)
    }

    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions
            .iter()
            .filter(|transaction| self.matches(transaction))
            .collect()
    }
}

/// Income, expense, and balance over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl Totals {
    pub fn of<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut totals = Self::default();
        for transaction in transactions {
            match transaction.kind {
                TransactionKind::Income => totals.income += transaction.amount,
                TransactionKind::Expense => totals.expense += transaction.amount,
            }
        }
        totals.balance = totals.income - totals.expense;
        totals
    }
}

/// Look-back window of the statistics views, ending today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    #[default]
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// First day inside the window.
    pub fn start(self, today: NaiveDate) -> NaiveDate {
        let start = match self {
            Self::Week => today.checked_sub_days(Days::new(7)),
            Self::Month => today.checked_sub_months(Months::new(1)),
            Self::Year => today.checked_sub_months(Months::new(12)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(self, day: NaiveDate, today: NaiveDate) -> bool {
        self.start(today) <= day && day <= today
    }

    /// Chart buckets, oldest first: 7 or 30 days, or 12 calendar months.
    pub fn buckets(self, today: NaiveDate) -> Vec<Bucket> {
        match self {
            Self::Week | Self::Month => {
                let days = if self == Self::Week { 7 } else { 30 };
                (0..days)
                    .rev()
                    .filter_map(|back| today.checked_sub_days(Days::new(back)))
                    .map(Bucket::Day)
                    .collect()
            }
            Self::Year => {
                let Some(first) = today.with_day(1) else {
                    return Vec::new();
                };
                (0..12)
                    .rev()
                    .filter_map(|back| first.checked_sub_months(Months::new(back)))
                    .map(Bucket::Month)
                    .collect()
            }
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(Error::InvalidInput(format!(
                "unknown time range '{other}' (expected week, month or year)"
            ))),
        }
    }
}

/// One slot of a statistics series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Day(NaiveDate),
    /// Calendar month, keyed by its first day.
    Month(NaiveDate),
}

impl Bucket {
    pub fn contains(self, day: NaiveDate) -> bool {
        match self {
            Self::Day(bucket) => bucket == day,
            Self::Month(first) => first.year() == day.year() && first.month() == day.month(),
        }
    }

    /// Short axis label: `MM/dd` for days, `yy/MM` for months.
    pub fn label(self) -> String {
        match self {
            Self::Day(day) => day.format("%m/%d").to_string(),
            Self::Month(first) => first.format("%y/%m").to_string(),
        }
    }
}

/// Number of records created in one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityPoint {
    pub bucket: Bucket,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: usize,
}

/// Amount and number of bookings of one kind and category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub kind: TransactionKind,
    pub category: String,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashflowPoint {
    pub bucket: Bucket,
    pub totals: Totals,
}

/// Records whose day falls inside `range`.
pub fn within_range<T: Record>(items: &[T], range: TimeRange, today: NaiveDate) -> Vec<&T> {
    items
        .iter()
        .filter(|item| item.day().is_some_and(|day| range.contains(day, today)))
        .collect()
}

/// Records created per bucket of `range`.
pub fn entry_activity<T: Record>(
    items: &[T],
    range: TimeRange,
    today: NaiveDate,
) -> Vec<ActivityPoint> {
    let days: Vec<NaiveDate> = within_range(items, range, today)
        .into_iter()
        .filter_map(|item| item.day())
        .collect();
    range
        .buckets(today)
        .into_iter()
        .map(|bucket| ActivityPoint {
            bucket,
            count: days.iter().filter(|day| bucket.contains(**day)).count(),
        })
        .collect()
}

/// How often each mood was tagged inside `range`, most frequent first.
/// Ties keep the order in which moods were first seen.
pub fn mood_counts(entries: &[LogEntry], range: TimeRange, today: NaiveDate) -> Vec<MoodCount> {
    let mut counts: Vec<MoodCount> = Vec::new();
    for entry in within_range(entries, range, today) {
        for mood in &entry.moods {
            match counts.iter_mut().find(|count| &count.mood == mood) {
                Some(count) => count.count += 1,
                None => counts.push(MoodCount {
                    mood: mood.clone(),
                    count: 1,
                }),
            }
        }
    }
    counts.sort_by(|left, right| right.count.cmp(&left.count));
    counts
}

/// Totals per kind and category inside `range`, largest amount first.
pub fn category_breakdown(
    transactions: &[Transaction],
    range: TimeRange,
    today: NaiveDate,
) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for transaction in within_range(transactions, range, today) {
        let slot = totals.iter_mut().find(|total| {
            total.kind == transaction.kind && total.category == transaction.category
        });
        match slot {
            Some(total) => {
                total.amount += transaction.amount;
                total.count += 1;
            }
            None => totals.push(CategoryTotal {
                kind: transaction.kind,
                category: transaction.category.clone(),
                amount: transaction.amount,
                count: 1,
            }),
        }
    }
    totals.sort_by(|left, right| right.amount.total_cmp(&left.amount));
    totals
}

/// Income, expense and balance per bucket of `range`.
pub fn cashflow_series(
    transactions: &[Transaction],
    range: TimeRange,
    today: NaiveDate,
) -> Vec<CashflowPoint> {
    let booked = within_range(transactions, range, today);
    range
        .buckets(today)
        .into_iter()
        .map(|bucket| CashflowPoint {
            bucket,
            totals: Totals::of(
                booked
                    .iter()
                    .copied()
                    .filter(|transaction| bucket.contains(transaction.date)),
            ),
        })
        .collect()
}
