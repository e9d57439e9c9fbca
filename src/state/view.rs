//! Views the client can be asked to show

use serde::{Deserialize, Serialize};

use crate::store::RecordKind;

/// Top-level views of the finance client, numbered as in its menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Dashboard,
    Transactions,
    Income,
    Expenses,
}

impl Default for View {
    fn default() -> Self {
        Self::Dashboard
    }
}

impl View {
    /// Menu id used by the client
    pub fn id(&self) -> u8 {
        match self {
            View::Dashboard => 1,
            View::Transactions => 2,
            View::Income => 3,
            View::Expenses => 4,
        }
    }

    /// The view that lists records of the given kind
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Income => View::Income,
            RecordKind::Expense => View::Expenses,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Dashboard => write!(f, "Dashboard"),
            View::Transactions => write!(f, "Transactions"),
            View::Income => write!(f, "Income"),
            View::Expenses => write!(f, "Expenses"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_ids() {
        assert_eq!(View::Dashboard.id(), 1);
        assert_eq!(View::Transactions.id(), 2);
        assert_eq!(View::Income.id(), 3);
        assert_eq!(View::Expenses.id(), 4);
    }

    #[test]
    fn test_view_for_kind() {
        assert_eq!(View::for_kind(RecordKind::Income), View::Income);
        assert_eq!(View::for_kind(RecordKind::Expense), View::Expenses);
    }
}
