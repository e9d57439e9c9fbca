//! Transcript classification
//!
//! Commands are recognized by greedy substring matching against an ordered
//! rule table. The first rule with a matching phrase wins, so the add-record
//! phrases must come before the bare "income"/"expense" navigation phrases
//! they contain.

use crate::state::{DialogueSession, View};
use crate::store::RecordKind;

const DASHBOARD_PHRASES: &[&str] = &["dashboard", "home", "main"];
const ADD_INCOME_PHRASES: &[&str] = &["add income", "new income", "create income"];
const ADD_EXPENSE_PHRASES: &[&str] = &["add expense", "new expense", "create expense"];
const INCOME_PHRASES: &[&str] = &["income", "earnings", "revenue"];
const EXPENSE_PHRASES: &[&str] = &["expense", "spending", "costs"];
const TRANSACTIONS_PHRASES: &[&str] = &["transactions", "history"];
const CANCEL_PHRASES: &[&str] = &["cancel", "stop", "abort"];
const TOTALS_PHRASES: &[&str] = &["read total", "balance", "summary", "total"];

/// A normalized recognition result: trimmed and lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript(String);

impl Transcript {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any of the phrases occurs anywhere in the transcript
    pub fn contains_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.0.contains(p))
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregate questions the controller can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Income, expense and balance totals
    Totals,
}

/// What a transcript asks the controller to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Navigate(View),
    StartForm(RecordKind),
    Cancel,
    Query(Query),
    /// Free text answering the current form field
    FormInput(String),
    Unrecognized,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Navigate(View),
    StartForm(RecordKind),
    Cancel,
    Query(Query),
}

impl From<Action> for Command {
    fn from(action: Action) -> Self {
        match action {
            Action::Navigate(view) => Command::Navigate(view),
            Action::StartForm(kind) => Command::StartForm(kind),
            Action::Cancel => Command::Cancel,
            Action::Query(query) => Command::Query(query),
        }
    }
}

struct Rule {
    phrases: &'static [&'static str],
    action: Action,
}

const RULES: &[Rule] = &[
    Rule {
        phrases: DASHBOARD_PHRASES,
        action: Action::Navigate(View::Dashboard),
    },
    Rule {
        phrases: ADD_INCOME_PHRASES,
        action: Action::StartForm(RecordKind::Income),
    },
    Rule {
        phrases: ADD_EXPENSE_PHRASES,
        action: Action::StartForm(RecordKind::Expense),
    },
    Rule {
        phrases: INCOME_PHRASES,
        action: Action::Navigate(View::Income),
    },
    Rule {
        phrases: EXPENSE_PHRASES,
        action: Action::Navigate(View::Expenses),
    },
    Rule {
        phrases: TRANSACTIONS_PHRASES,
        action: Action::Navigate(View::Transactions),
    },
    Rule {
        phrases: CANCEL_PHRASES,
        action: Action::Cancel,
    },
    Rule {
        phrases: TOTALS_PHRASES,
        action: Action::Query(Query::Totals),
    },
];

/// Classify a transcript against the current session.
///
/// Navigation phrases win over form input even while a form is active.
pub fn classify(transcript: &Transcript, session: &DialogueSession) -> Command {
    if let Some(rule) = RULES.iter().find(|r| transcript.contains_any(r.phrases)) {
        return rule.action.into();
    }

    if session.is_active() {
        Command::FormInput(transcript.as_str().to_string())
    } else {
        Command::Unrecognized
    }
}
