//! Record persistence
//!
//! Provides the `RecordStore` trait used by the voice controller and the
//! IPC server, plus a JSON file backed implementation.

mod json;
mod record;

use async_trait::async_trait;

pub use json::JsonStore;
pub use record::{NewRecord, Record, RecordKind, Totals, Transaction};

/// Number of entries returned by `recent` when the caller gives no limit
pub const DEFAULT_RECENT_LIMIT: usize = 3;

/// Errors returned by a record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid record: {0}")]
    Validation(String),

    #[error("{kind} record '{id}' not found")]
    NotFound { kind: RecordKind, id: String },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode ledger: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Stable error code reported to IPC clients
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "validation",
            StoreError::NotFound { .. } => "not_found",
            StoreError::Io(_) | StoreError::Serialization(_) => "storage",
        }
    }
}

/// Create, list and delete for income and expense records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Validate and store a new record, returning it with id and timestamps
    async fn create(&self, kind: RecordKind, record: NewRecord) -> Result<Record, StoreError>;

    /// All records of one kind, in insertion order
    async fn list(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError>;

    /// Remove a record by id
    async fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StoreError>;

    /// Sum of amounts per kind and their difference, recomputed on each call
    async fn totals(&self) -> Result<Totals, StoreError> {
        let income = self.list(RecordKind::Income).await?;
        let expense = self.list(RecordKind::Expense).await?;
        Ok(Totals::from_amounts(
            income.iter().map(|r| r.amount).sum(),
            expense.iter().map(|r| r.amount).sum(),
        ))
    }

    /// Most recently created records of both kinds, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<Transaction>, StoreError> {
        let mut history = Vec::new();
        for kind in [RecordKind::Income, RecordKind::Expense] {
            history.extend(
                self.list(kind)
                    .await?
                    .into_iter()
                    .map(|record| Transaction { kind, record }),
            );
        }
        history.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
        history.truncate(limit);
        Ok(history)
    }
}

/// Check the required fields of a record before it is stored
pub fn validate(record: &NewRecord) -> Result<(), StoreError> {
    if record.title.trim().is_empty() {
        return Err(StoreError::Validation("title is required".into()));
    }
    if record.category.trim().is_empty() {
        return Err(StoreError::Validation("category is required".into()));
    }
    if !record.amount.is_finite() {
        return Err(StoreError::Validation("amount must be a number".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewRecord {
        NewRecord {
            title: "groceries".into(),
            amount: 42.5,
            category: "groceries".into(),
            description: String::new(),
            date: None,
        }
    }

    #[test]
    fn test_validate_accepts_complete_record() {
        assert!(validate(&sample()).is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let record = NewRecord {
            title: "   ".into(),
            ..sample()
        };
        assert!(matches!(validate(&record), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_missing_category() {
        let record = NewRecord {
            category: String::new(),
            ..sample()
        };
        assert!(matches!(validate(&record), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_nan_amount() {
        let record = NewRecord {
            amount: f64::NAN,
            ..sample()
        };
        let err = validate(&record).unwrap_err();
        assert_eq!(err.code(), "validation");
    }
}
