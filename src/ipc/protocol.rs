//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::config::{RecognitionSettings, SpeechSettings};
use crate::events::ControllerEvent;
use crate::state::{fields_for, ControllerInput, View};
use crate::store::{NewRecord, Record, RecordKind, Totals, Transaction};

/// Requests from a client to the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request current daemon status
    GetStatus,

    /// Subscribe to controller event notifications
    Subscribe,

    /// One recognized utterance
    Transcript { text: String },

    /// The pending recognition cycle failed
    RecognitionError { error: String },

    StartListening,

    StopListening,

    PlaybackStarted,

    PlaybackEnded,

    SetSpeechEnabled { enabled: bool },

    /// Store a record entered through a form
    AddRecord { kind: RecordKind, record: NewRecord },

    ListRecords { kind: RecordKind },

    DeleteRecord { kind: RecordKind, id: String },

    GetTotals,

    /// Newest records of both kinds
    RecentTransactions {
        #[serde(default)]
        limit: Option<usize>,
    },
}

impl Request {
    /// The controller input this request maps to, if it is meant for the controller
    pub fn into_controller_input(self) -> Result<ControllerInput, Request> {
        match self {
            Request::Transcript { text } => Ok(ControllerInput::Transcript(text)),
            Request::RecognitionError { error } => Ok(ControllerInput::RecognitionFailed(error)),
            Request::StartListening => Ok(ControllerInput::StartListening),
            Request::StopListening => Ok(ControllerInput::StopListening),
            Request::PlaybackStarted => Ok(ControllerInput::PlaybackStarted),
            Request::PlaybackEnded => Ok(ControllerInput::PlaybackEnded),
            Request::SetSpeechEnabled { enabled } => Ok(ControllerInput::SetSpeechEnabled(enabled)),
            other => Err(other),
        }
    }
}

/// Responses from daemon to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Current daemon status
    Status(DaemonStatus),

    /// Subscription confirmed
    Subscribed,

    /// Input queued for the controller
    Accepted,

    Record(Record),

    Records { records: Vec<Record> },

    Transactions { entries: Vec<Transaction> },

    Deleted { id: String },

    Totals(Totals),

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// The controller emitted an event
    Event { event: ControllerEvent },
}

/// The voice form currently being filled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormProgress {
    pub kind: RecordKind,
    /// Field currently asked for
    pub field: String,
}

/// Full daemon status snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// View the client was last asked to show
    pub view: View,

    /// Voice form in progress, if any
    pub form: Option<FormProgress>,

    pub listening: bool,

    pub speaking: bool,

    pub speech_enabled: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,

    pub speech: SpeechSettings,

    pub recognition: RecognitionSettings,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            view: View::default(),
            form: None,
            listening: false,
            speaking: false,
            speech_enabled: true,
            uptime_secs: 0,
            speech: SpeechSettings::default(),
            recognition: RecognitionSettings::default(),
        }
    }
}

impl DaemonStatus {
    /// Fold a controller event into the snapshot
    pub fn apply(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::StartRecognition => self.listening = true,
            ControllerEvent::StopRecognition | ControllerEvent::RecognitionEnded => {
                self.listening = false
            }
            ControllerEvent::CancelSpeech => self.speaking = false,
            ControllerEvent::PlaybackChanged { speaking } => self.speaking = *speaking,
            ControllerEvent::SpeechEnabledChanged { enabled } => self.speech_enabled = *enabled,
            ControllerEvent::ViewChanged { view } => self.view = *view,
            ControllerEvent::FormStarted { kind } => {
                self.form = Some(FormProgress {
                    kind: *kind,
                    field: fields_for(*kind)
                        .first()
                        .map(|f| f.name.to_string())
                        .unwrap_or_default(),
                })
            }
            ControllerEvent::FieldAccepted { kind, next, .. } => {
                self.form = Some(FormProgress {
                    kind: *kind,
                    field: next.clone(),
                })
            }
            ControllerEvent::FormCancelled
            | ControllerEvent::RecordSaved { .. }
            | ControllerEvent::RecordFailed { .. } => self.form = None,
            ControllerEvent::Speak { .. } | ControllerEvent::FieldRejected { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::DeleteRecord {
            kind: RecordKind::Expense,
            id: "abc".into(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("delete_record"));
        assert!(json.contains("expense"));
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"type":"add_record","kind":"income","record":{"title":"salary","amount":500,"category":"salary"}}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        match req {
            Request::AddRecord { kind, record } => {
                assert_eq!(kind, RecordKind::Income);
                assert_eq!(record.amount, 500.0);
            }
            other => panic!("unexpected request: {:?}", other),
        }

        let req: Request = serde_json::from_str(r#"{"type":"recent_transactions"}"#).unwrap();
        assert_eq!(req, Request::RecentTransactions { limit: None });
    }

    #[test]
    fn test_controller_requests_map_to_inputs() {
        let input = Request::Transcript {
            text: "add income".into(),
        }
        .into_controller_input();
        assert_eq!(input, Ok(ControllerInput::Transcript("add income".into())));

        assert_eq!(Request::Ping.into_controller_input(), Err(Request::Ping));
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::Status(DaemonStatus::default());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"type\":\"status\""));
        assert!(json.contains("en-IN"));
    }

    #[test]
    fn test_notification_keeps_event_tag() {
        let note = Notification::Event {
            event: ControllerEvent::Speak {
                text: "Form cancelled".into(),
            },
        };
        let json = serde_json::to_string(&note).unwrap();
        assert_eq!(
            json,
            r#"{"type":"event","event":{"type":"speak","text":"Form cancelled"}}"#
        );
    }

    #[test]
    fn test_status_tracks_form_progress() {
        let mut status = DaemonStatus::default();
        status.apply(&ControllerEvent::FormStarted {
            kind: RecordKind::Income,
        });
        assert_eq!(status.form.as_ref().unwrap().field, "title");

        status.apply(&ControllerEvent::FieldAccepted {
            kind: RecordKind::Income,
            field: "title".into(),
            next: "amount".into(),
        });
        assert_eq!(status.form.as_ref().unwrap().field, "amount");

        status.apply(&ControllerEvent::RecordFailed {
            kind: RecordKind::Income,
            reason: "disk full".into(),
        });
        assert!(status.form.is_none());
    }

    #[test]
    fn test_status_tracks_voice_flags() {
        let mut status = DaemonStatus::default();
        status.apply(&ControllerEvent::StartRecognition);
        status.apply(&ControllerEvent::PlaybackChanged { speaking: true });
        assert!(status.listening && status.speaking);

        status.apply(&ControllerEvent::RecognitionEnded);
        status.apply(&ControllerEvent::CancelSpeech);
        assert!(!status.listening && !status.speaking);
    }
}
