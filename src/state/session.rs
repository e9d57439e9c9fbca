//! Form-filling session for voice record entry
//!
//! A session walks the fixed field list of one record kind. It holds the
//! values collected so far and nothing else; speaking prompts and submitting
//! the finished record are left to the controller.

use chrono::Utc;

use crate::store::{NewRecord, RecordKind};

/// Category stored when none was collected
pub const DEFAULT_CATEGORY: &str = "Other";

/// How a field's answer is validated and coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Stored as spoken
    Text,
    /// Coerced to a number
    Amount,
}

/// One named, typed slot of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    const fn amount(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Amount,
        }
    }

    /// Wording used when asking for this field
    pub fn prompt_label(&self) -> &'static str {
        match self.kind {
            FieldKind::Amount => "amount in rupees",
            FieldKind::Text => self.name,
        }
    }
}

const INCOME_FIELDS: [FieldSpec; 4] = [
    FieldSpec::text("title"),
    FieldSpec::amount("amount"),
    FieldSpec::text("category"),
    FieldSpec::text("description"),
];

const EXPENSE_FIELDS: [FieldSpec; 4] = [
    FieldSpec::text("title"),
    FieldSpec::amount("amount"),
    FieldSpec::text("category"),
    FieldSpec::text("description"),
];

/// Prompt order of the fields for a record kind
pub fn fields_for(kind: RecordKind) -> &'static [FieldSpec] {
    match kind {
        RecordKind::Income => &INCOME_FIELDS,
        RecordKind::Expense => &EXPENSE_FIELDS,
    }
}

/// A coerced field answer
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Amount(f64),
}

/// Errors from feeding an answer into the session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("'{0}' does not contain a valid amount")]
    InvalidAmount(String),

    #[error("no form is in progress")]
    NoActiveForm,
}

/// Result of an accepted answer
#[derive(Debug, Clone, PartialEq)]
pub enum FieldStep {
    /// The answer was stored and another field follows
    Next {
        accepted: &'static FieldSpec,
        next: &'static FieldSpec,
    },
    /// The last field was answered; the record is ready to submit
    Complete(NewRecord),
}

/// Observable state of the form dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Idle,
    AwaitingField { kind: RecordKind, index: usize },
    Submitting { kind: RecordKind },
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogueState::Idle => write!(f, "Idle"),
            DialogueState::AwaitingField { kind, index } => {
                write!(f, "AwaitingField({}, {})", kind, index)
            }
            DialogueState::Submitting { kind } => write!(f, "Submitting({})", kind),
        }
    }
}

/// The single mutable form-filling state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueSession {
    active_kind: Option<RecordKind>,
    field_index: usize,
    collected: Vec<(&'static str, FieldValue)>,
}

impl DialogueSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh form for `kind`, discarding anything in progress
    pub fn begin(&mut self, kind: RecordKind) {
        self.active_kind = Some(kind);
        self.field_index = 0;
        self.collected.clear();
    }

    /// Return to idle, discarding collected fields
    pub fn reset(&mut self) {
        self.active_kind = None;
        self.field_index = 0;
        self.collected.clear();
    }

    pub fn active_kind(&self) -> Option<RecordKind> {
        self.active_kind
    }

    pub fn is_active(&self) -> bool {
        self.active_kind.is_some()
    }

    pub fn field_index(&self) -> usize {
        self.field_index
    }

    /// Values collected so far, in prompt order
    pub fn collected(&self) -> &[(&'static str, FieldValue)] {
        &self.collected
    }

    /// The field currently being asked for
    pub fn current_field(&self) -> Option<&'static FieldSpec> {
        self.active_kind
            .and_then(|kind| fields_for(kind).get(self.field_index))
    }

    pub fn state(&self) -> DialogueState {
        match self.active_kind {
            None => DialogueState::Idle,
            Some(kind) => DialogueState::AwaitingField {
                kind,
                index: self.field_index,
            },
        }
    }

    /// Validate and store an answer for the current field.
    ///
    /// On the last field the session is left as is and the assembled record
    /// is returned; the caller resets the session once submission resolves.
    pub fn accept(&mut self, input: &str) -> Result<FieldStep, FieldError> {
        let kind = self.active_kind.ok_or(FieldError::NoActiveForm)?;
        let fields = fields_for(kind);
        let field = &fields[self.field_index];

        let value = match field.kind {
            FieldKind::Text => FieldValue::Text(input.to_string()),
            FieldKind::Amount => FieldValue::Amount(
                parse_amount(input).ok_or_else(|| FieldError::InvalidAmount(input.to_string()))?,
            ),
        };

        match fields.get(self.field_index + 1) {
            Some(next) => {
                self.collected.push((field.name, value));
                self.field_index += 1;
                Ok(FieldStep::Next {
                    accepted: field,
                    next,
                })
            }
            None => Ok(FieldStep::Complete(self.assemble(field.name, value))),
        }
    }

    fn assemble(&self, last_name: &'static str, last_value: FieldValue) -> NewRecord {
        let mut fields = self.collected.clone();
        fields.push((last_name, last_value));

        let amount = match lookup(&fields, "amount") {
            Some(FieldValue::Amount(a)) => *a,
            _ => 0.0,
        };

        NewRecord {
            title: text_field(&fields, "title").unwrap_or_default(),
            amount,
            category: text_field(&fields, "category")
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            description: text_field(&fields, "description").unwrap_or_default(),
            date: Some(Utc::now()),
        }
    }
}

fn lookup<'a>(fields: &'a [(&'static str, FieldValue)], name: &str) -> Option<&'a FieldValue> {
    fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
}

fn text_field(fields: &[(&'static str, FieldValue)], name: &str) -> Option<String> {
    match lookup(fields, name) {
        Some(FieldValue::Text(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Coerce a spoken amount to a number.
///
/// Every character other than a digit or `.` is dropped, then the longest
/// leading decimal number is taken, so "$1,200.50" is 1200.5 and "1.2.3" is
/// 1.2. Returns `None` when no digit precedes the cut.
pub fn parse_amount(input: &str) -> Option<f64> {
    let stripped: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in stripped.chars() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        } else {
            seen_digit = true;
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }

    stripped[..end].parse::<f64>().ok().filter(|a| a.is_finite())
}
