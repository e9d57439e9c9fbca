//! JSON file backed record store
//!
//! The whole ledger is held in memory and rewritten to disk after every
//! mutation. Writes go to a temporary file first and are renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{validate, NewRecord, Record, RecordKind, RecordStore, StoreError};

/// On-disk layout of `records.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct Ledger {
    #[serde(default)]
    incomes: Vec<Record>,
    #[serde(default)]
    expenses: Vec<Record>,
}

impl Ledger {
    fn records(&self, kind: RecordKind) -> &Vec<Record> {
        match kind {
            RecordKind::Income => &self.incomes,
            RecordKind::Expense => &self.expenses,
        }
    }

    fn records_mut(&mut self, kind: RecordKind) -> &mut Vec<Record> {
        match kind {
            RecordKind::Income => &mut self.incomes,
            RecordKind::Expense => &mut self.expenses,
        }
    }
}

/// Record store persisted as a single JSON document
pub struct JsonStore {
    path: PathBuf,
    ledger: RwLock<Ledger>,
}

impl JsonStore {
    /// Open the ledger at `path`, starting empty if the file does not exist
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let ledger = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ledger::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            ?path,
            incomes = ledger.incomes.len(),
            expenses = ledger.expenses.len(),
            "ledger loaded"
        );

        Ok(Self {
            path,
            ledger: RwLock::new(ledger),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(ledger)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = ?self.path, "ledger persisted");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonStore {
    async fn create(&self, kind: RecordKind, record: NewRecord) -> Result<Record, StoreError> {
        validate(&record)?;

        let now = Utc::now();
        let stored = Record {
            id: Uuid::new_v4().to_string(),
            title: record.title,
            amount: record.amount,
            category: record.category,
            description: record.description,
            date: record.date.unwrap_or(now),
            created_at: now,
        };

        let mut ledger = self.ledger.write().await;
        ledger.records_mut(kind).push(stored.clone());

        if let Err(e) = self.persist(&ledger).await {
            ledger.records_mut(kind).pop();
            return Err(e);
        }

        info!(%kind, id = %stored.id, amount = stored.amount, "record created");
        Ok(stored)
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        Ok(self.ledger.read().await.records(kind).clone())
    }

    async fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StoreError> {
        let mut ledger = self.ledger.write().await;
        let index = ledger
            .records(kind)
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })?;

        let removed = ledger.records_mut(kind).remove(index);

        if let Err(e) = self.persist(&ledger).await {
            ledger.records_mut(kind).insert(index, removed);
            return Err(e);
        }

        info!(%kind, id, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::DEFAULT_RECENT_LIMIT;

    fn entry(title: &str, amount: f64) -> NewRecord {
        NewRecord {
            title: title.to_string(),
            amount,
            category: "other".to_string(),
            description: String::new(),
            date: None,
        }
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("records.json")).await.unwrap();
        assert!(store.list(RecordKind::Income).await.unwrap().is_empty());
        assert!(store.list(RecordKind::Expense).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let created = {
            let store = JsonStore::open(&path).await.unwrap();
            store
                .create(RecordKind::Expense, entry("coffee", 100.0))
                .await
                .unwrap()
        };

        let reopened = JsonStore::open(&path).await.unwrap();
        let expenses = reopened.list(RecordKind::Expense).await.unwrap();
        assert_eq!(expenses, vec![created]);
        assert!(reopened.list(RecordKind::Income).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_defaults_date_to_now() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("records.json")).await.unwrap();

        let before = Utc::now();
        let record = store
            .create(RecordKind::Income, entry("salary", 500.0))
            .await
            .unwrap();

        assert!(record.date >= before);
        assert_eq!(record.date, record.created_at);
        assert!(!record.id.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("records.json")).await.unwrap();

        let result = store.create(RecordKind::Income, entry("", 10.0)).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.list(RecordKind::Income).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("records.json")).await.unwrap();

        let keep = store
            .create(RecordKind::Income, entry("salary", 500.0))
            .await
            .unwrap();
        let gone = store
            .create(RecordKind::Income, entry("bonus", 300.0))
            .await
            .unwrap();

        store.delete(RecordKind::Income, &gone.id).await.unwrap();
        assert_eq!(store.list(RecordKind::Income).await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn test_delete_wrong_kind_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("records.json")).await.unwrap();

        let record = store
            .create(RecordKind::Income, entry("salary", 500.0))
            .await
            .unwrap();

        let result = store.delete(RecordKind::Expense, &record.id).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(store.list(RecordKind::Income).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_totals() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("records.json")).await.unwrap();

        store.create(RecordKind::Income, entry("salary", 500.0)).await.unwrap();
        store.create(RecordKind::Income, entry("freelance", 300.0)).await.unwrap();
        store.create(RecordKind::Expense, entry("rent", 200.0)).await.unwrap();

        let totals = store.totals().await.unwrap();
        assert_eq!(totals.income, 800.0);
        assert_eq!(totals.expense, 200.0);
        assert_eq!(totals.balance, 600.0);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("records.json")).await.unwrap();

        for (kind, title) in [
            (RecordKind::Income, "first"),
            (RecordKind::Expense, "second"),
            (RecordKind::Income, "third"),
            (RecordKind::Expense, "fourth"),
        ] {
            store.create(kind, entry(title, 1.0)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let recent = store.recent(DEFAULT_RECENT_LIMIT).await.unwrap();
        let titles: Vec<_> = recent.iter().map(|t| t.record.title.as_str()).collect();
        assert_eq!(titles, vec!["fourth", "third", "second"]);
        assert_eq!(recent[0].kind, RecordKind::Expense);
    }

    #[test]
    fn test_corrupt_ledger_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, b"not json").unwrap();

        let result = tokio_test::block_on(JsonStore::open(&path));
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
