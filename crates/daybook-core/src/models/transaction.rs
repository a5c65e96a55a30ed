//! Income/expense transaction model

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use super::{ItemId, Record};
use crate::error::{Error, Result};

/// Category ids offered for income.
pub const INCOME_CATEGORIES: &[&str] = &["salary", "bonus", "investment", "other_income"];

/// Category ids offered for expenses.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "food",
    "shopping",
    "transport",
    "entertainment",
    "health",
    "housing",
    "utilities",
    "education",
    "other_expense",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    #[must_use]
    pub const fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Income => INCOME_CATEGORIES,
            Self::Expense => EXPENSE_CATEGORIES,
        }
    }

    /// Whether `category` is one of this kind's built-in categories.
    #[must_use]
    pub fn owns_category(self, category: &str) -> bool {
        self.categories().contains(&category)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::InvalidInput(format!(
                "Transaction type must be income or expense, got '{other}'"
            ))),
        }
    }
}

/// A booked income or expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: ItemId,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Day the money moved
    pub date: NaiveDate,
    /// Creation timestamp (Unix ms), 0 when the API omitted it
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: i64,
}

impl Transaction {
    /// Amount with its sign applied: income positive, expense negative.
    #[must_use]
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

impl Record for Transaction {
    type Draft = TransactionDraft;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn created_at(&self) -> i64 {
        if self.created_at > 0 {
            return self.created_at;
        }
        self.date
            .and_hms_opt(0, 0, 0)
            .map_or(0, |midnight| midnight.and_utc().timestamp_millis())
    }

    fn day(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn search_text(&self) -> String {
        format!("{}\n{}\n{}", self.category, self.description, self.kind)
    }

    fn from_draft(id: ItemId, draft: &TransactionDraft, now: i64) -> Self {
        let date = draft.date.unwrap_or_else(|| {
            chrono::DateTime::from_timestamp_millis(now)
                .map_or_else(|| Utc::now().date_naive(), |dt| dt.date_naive())
        });
        Self {
            id,
            amount: draft.amount,
            category: draft.category.trim().to_string(),
            description: draft.description.trim().to_string(),
            kind: draft.kind,
            date,
            created_at: now,
        }
    }

    fn apply_draft(&self, draft: &TransactionDraft, now: i64) -> Self {
        Self {
            created_at: self.created_at,
            ..Self::from_draft(self.id.clone(), draft, now)
        }
    }
}

/// Payload for booking or editing a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Defaults to today on the server when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl TransactionDraft {
    pub fn new(kind: TransactionKind, amount: f64, category: impl Into<String>) -> Self {
        Self {
            amount,
            category: category.into(),
            description: String::new(),
            kind,
            date: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Reject drafts the API would refuse.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidInput(
                "Amount must be a positive number".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidInput("Category cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn transaction_decodes_api_row() {
        let tx: Transaction = serde_json::from_str(
            r#"{
                "id": "t1",
                "user_id": "00000000-0000-0000-0000-000000000000",
                "amount": 12.5,
                "category": "food",
                "description": "lunch",
                "type": "expense",
                "date": "2024-05-02",
                "created_at": "2024-05-02T12:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(tx.kind, TransactionKind::Expense);
        assert_eq!(tx.signed_amount(), -12.5);
        assert_eq!(tx.day(), NaiveDate::from_ymd_opt(2024, 5, 2));
    }

    #[test]
    fn missing_created_at_falls_back_to_date() {
        let tx: Transaction = serde_json::from_str(
            r#"{"id": "t2", "amount": 1, "category": "salary", "type": "income", "date": "1970-01-02"}"#,
        )
        .unwrap();
        assert_eq!(tx.created_at, 0);
        assert_eq!(Record::created_at(&tx), 86_400_000);
    }

    #[test]
    fn kind_parsing_and_categories() {
        assert_eq!("Income".parse::<TransactionKind>().unwrap(), TransactionKind::Income);
        assert!("transfer".parse::<TransactionKind>().is_err());
        assert!(TransactionKind::Expense.owns_category("food"));
        assert!(!TransactionKind::Income.owns_category("food"));
    }

    #[test]
    fn draft_validation() {
        assert!(TransactionDraft::new(TransactionKind::Expense, 0.0, "food")
            .validate()
            .is_err());
        assert!(TransactionDraft::new(TransactionKind::Expense, f64::NAN, "food")
            .validate()
            .is_err());
        assert!(TransactionDraft::new(TransactionKind::Expense, 3.0, " ")
            .validate()
            .is_err());
        assert!(TransactionDraft::new(TransactionKind::Income, 3.0, "bonus")
            .validate()
            .is_ok());
    }

    #[test]
    fn from_draft_defaults_date_to_creation_day() {
        let draft = TransactionDraft::new(TransactionKind::Income, 100.0, "salary");
        let tx = Transaction::from_draft(ItemId::from("t3"), &draft, 86_400_000 + 5);
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
        assert_eq!(tx.created_at, 86_400_005);
    }
}
