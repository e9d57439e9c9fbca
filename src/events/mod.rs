//! Events emitted by the voice controller
//!
//! Some events are directives for the external speech capability (speak,
//! cancel speech, start or stop recognition); the rest report view changes
//! and form progress. All of them are pushed to subscribed IPC clients.

use serde::{Deserialize, Serialize};

use crate::state::View;
use crate::store::RecordKind;

/// Events emitted by the controller while handling input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// Play this text; a `CancelSpeech` precedes it if something is playing
    Speak { text: String },

    /// Stop the utterance that is currently playing
    CancelSpeech,

    /// Begin one single-shot recognition cycle
    StartRecognition,

    /// Abort the pending recognition cycle
    StopRecognition,

    /// A recognition cycle produced a result or an error
    RecognitionEnded,

    /// Playback started or finished on the client
    PlaybackChanged { speaking: bool },

    /// Spoken responses were switched on or off
    SpeechEnabledChanged { enabled: bool },

    /// The client should show another view
    ViewChanged { view: View },

    /// A voice form was started for a record kind
    FormStarted { kind: RecordKind },

    /// A field answer was stored
    FieldAccepted {
        kind: RecordKind,
        field: String,
        /// The field asked for next
        next: String,
    },

    /// A field answer failed validation and will be asked for again
    FieldRejected { kind: RecordKind, field: String },

    /// The in-progress form was discarded
    FormCancelled,

    /// The completed form was stored
    RecordSaved {
        kind: RecordKind,
        id: String,
        title: String,
        amount: f64,
    },

    /// The completed form could not be stored and was discarded
    RecordFailed { kind: RecordKind, reason: String },
}

impl std::fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerEvent::Speak { text } => write!(f, "SPEAK ({})", text),
            ControllerEvent::CancelSpeech => write!(f, "CANCEL_SPEECH"),
            ControllerEvent::StartRecognition => write!(f, "START_RECOGNITION"),
            ControllerEvent::StopRecognition => write!(f, "STOP_RECOGNITION"),
            ControllerEvent::RecognitionEnded => write!(f, "RECOGNITION_ENDED"),
            ControllerEvent::PlaybackChanged { speaking } => {
                write!(f, "PLAYBACK_CHANGED (speaking={})", speaking)
            }
            ControllerEvent::SpeechEnabledChanged { enabled } => {
                write!(f, "SPEECH_ENABLED_CHANGED (enabled={})", enabled)
            }
            ControllerEvent::ViewChanged { view } => write!(f, "VIEW_CHANGED ({})", view),
            ControllerEvent::FormStarted { kind } => write!(f, "FORM_STARTED ({})", kind),
            ControllerEvent::FieldAccepted { kind, field, next } => {
                write!(f, "FIELD_ACCEPTED ({} {} -> {})", kind, field, next)
            }
            ControllerEvent::FieldRejected { kind, field } => {
                write!(f, "FIELD_REJECTED ({} {})", kind, field)
            }
            ControllerEvent::FormCancelled => write!(f, "FORM_CANCELLED"),
            ControllerEvent::RecordSaved { kind, id, .. } => {
                write!(f, "RECORD_SAVED ({} {})", kind, id)
            }
            ControllerEvent::RecordFailed { kind, reason } => {
                write!(f, "RECORD_FAILED ({}: {})", kind, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = ControllerEvent::FieldAccepted {
            kind: RecordKind::Expense,
            field: "title".into(),
            next: "amount".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("field_accepted"));
        assert!(json.contains("\"expense\""));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"view_changed","view":"transactions"}"#;
        let event: ControllerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ControllerEvent::ViewChanged {
                view: View::Transactions
            }
        );
    }

    #[test]
    fn test_display() {
        let event = ControllerEvent::Speak {
            text: "Form cancelled".into(),
        };
        assert_eq!(event.to_string(), "SPEAK (Form cancelled)");
    }
}
