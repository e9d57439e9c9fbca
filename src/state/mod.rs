//! Dialogue state for voice record entry
//!
//! Provides the form session, the controller that drives it, and the
//! views the controller can switch between. The form dialogue has three
//! states:
//! - Idle: no form in progress
//! - AwaitingField: collecting one field of an income or expense
//! - Submitting: the completed record is being stored

mod machine;
mod session;
mod view;

pub use machine::{Controller, ControllerInput, FormInterruptPolicy};
pub use session::{fields_for, DialogueSession, FieldSpec};
pub use view::View;
