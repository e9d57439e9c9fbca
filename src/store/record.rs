//! Income and expense record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two kinds of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Income,
    Expense,
}

impl RecordKind {
    /// Lowercase label used in spoken prompts
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Income => "income",
            RecordKind::Expense => "expense",
        }
    }

    /// Capitalized label used at the start of a sentence
    pub fn title(&self) -> &'static str {
        match self {
            RecordKind::Income => "Income",
            RecordKind::Expense => "Expense",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A record as submitted by the voice form or a client, before it is stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to the time of insertion when absent
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// A stored ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate amounts across the whole ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl Totals {
    pub fn from_amounts(income: f64, expense: f64) -> Self {
        Self {
            income,
            expense,
            balance: income - expense,
        }
    }
}

/// A record tagged with its kind, as shown in transaction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: RecordKind,
    #[serde(flatten)]
    pub record: Record,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&RecordKind::Expense).unwrap();
        assert_eq!(json, "\"expense\"");
        let kind: RecordKind = serde_json::from_str("\"income\"").unwrap();
        assert_eq!(kind, RecordKind::Income);
    }

    #[test]
    fn test_new_record_optional_fields() {
        let json = r#"{"title":"salary","amount":500,"category":"salary"}"#;
        let record: NewRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.description, "");
        assert!(record.date.is_none());
        assert_eq!(record.amount, 500.0);
    }

    #[test]
    fn test_totals_balance() {
        let totals = Totals::from_amounts(800.0, 200.0);
        assert_eq!(totals.balance, 600.0);
    }
}
