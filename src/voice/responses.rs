//! Spoken responses

use crate::state::{FieldSpec, View};
use crate::store::{RecordKind, Totals};

pub const WELCOME: &str = "Welcome to your accessible financial management app. You can navigate using voice commands. Say \"dashboard\" for overview, \"income\" for income management, or \"expenses\" for expense tracking.";

pub const NOT_RECOGNIZED: &str = "Command not recognized. Say \"dashboard\" for home, \"income\" for income section, \"expenses\" for expenses, \"add income\" to add income, or \"add expense\" to add expense.";

pub const INVALID_AMOUNT: &str = "Please provide a valid amount in numbers.";

pub const SAVE_ERROR: &str = "There was an error saving your entry. Please try again.";

pub const READ_ERROR: &str = "Sorry, I couldn't read your totals right now. Please try again.";

pub const SPEECH_ERROR: &str = "Sorry, I couldn't understand that. Please try again.";

pub const FORM_CANCELLED: &str = "Form cancelled";

pub fn navigation(view: View) -> &'static str {
    match view {
        View::Dashboard => "Navigating to Dashboard",
        View::Income => "Navigating to Income section",
        View::Expenses => "Navigating to Expenses section",
        View::Transactions => "Navigating to Transactions",
    }
}

pub fn form_started(kind: RecordKind) -> String {
    format!(
        "Starting {kind} entry. Please provide the title or name for this {kind}.",
        kind = kind.label()
    )
}

pub fn next_field(field: &FieldSpec) -> String {
    format!("Got it. Now please provide the {}.", field.prompt_label())
}

pub fn record_added(kind: RecordKind, title: &str, amount: f64) -> String {
    format!(
        "{} entry added successfully. {} for {} rupees has been recorded.",
        kind.title(),
        title,
        amount
    )
}

pub fn totals(totals: &Totals) -> String {
    format!(
        "Your total income is {} rupees. Total expenses are {} rupees. Your current balance is {} rupees.",
        totals.income, totals.expense, totals.balance
    )
}
