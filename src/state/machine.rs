//! Voice dialogue controller
//!
//! Classifies each transcript against the current session and drives the
//! form dialogue between Idle, AwaitingField and Submitting. Inputs are
//! handled one at a time; a submission is awaited before the next input is
//! looked at.

use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::events::ControllerEvent;
use crate::store::{NewRecord, RecordKind, RecordStore};
use crate::voice::{classify, responses, Command, Query, Transcript, VoiceIo};

use super::session::{DialogueSession, DialogueState, FieldError, FieldStep};
use super::view::View;

/// Inputs delivered to the controller by the speech client
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerInput {
    /// One recognized utterance
    Transcript(String),
    /// The pending recognition cycle failed
    RecognitionFailed(String),
    StartListening,
    StopListening,
    PlaybackStarted,
    PlaybackEnded,
    SetSpeechEnabled(bool),
}

/// What a navigation command does to a form in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormInterruptPolicy {
    /// Leave the form as it is; later free text keeps filling it
    #[default]
    Keep,
    /// Discard the form
    Cancel,
}

impl FromStr for FormInterruptPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "cancel" => Ok(Self::Cancel),
            other => Err(format!("unknown form interrupt policy '{}'", other)),
        }
    }
}

/// The voice dialogue controller
pub struct Controller {
    /// Form being filled, if any
    session: DialogueSession,
    /// Set while a completed record is being stored
    submitting: Option<RecordKind>,
    /// View the client was last asked to show
    view: View,
    voice: VoiceIo,
    interrupt_policy: FormInterruptPolicy,
    welcome: bool,
    store: Arc<dyn RecordStore>,
    /// Channel for emitting controller events
    event_tx: broadcast::Sender<ControllerEvent>,
}

impl Controller {
    /// Create a controller with speech on, no welcome, and the keep policy
    pub fn new(store: Arc<dyn RecordStore>, event_tx: broadcast::Sender<ControllerEvent>) -> Self {
        Self {
            session: DialogueSession::new(),
            submitting: None,
            view: View::default(),
            voice: VoiceIo::new(true),
            interrupt_policy: FormInterruptPolicy::default(),
            welcome: false,
            store,
            event_tx,
        }
    }

    pub fn with_interrupt_policy(mut self, policy: FormInterruptPolicy) -> Self {
        self.interrupt_policy = policy;
        self
    }

    pub fn with_speech_enabled(mut self, enabled: bool) -> Self {
        self.voice = VoiceIo::new(enabled);
        self
    }

    /// Speak the welcome message when `run` starts
    pub fn with_welcome(mut self, welcome: bool) -> Self {
        self.welcome = welcome;
        self
    }

    pub fn state(&self) -> DialogueState {
        match self.submitting {
            Some(kind) => DialogueState::Submitting { kind },
            None => self.session.state(),
        }
    }

    pub fn session(&self) -> &DialogueSession {
        &self.session
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn voice(&self) -> &VoiceIo {
        &self.voice
    }

    /// Run the controller, processing inputs until the channel closes
    pub async fn run(&mut self, mut input_rx: mpsc::Receiver<ControllerInput>) {
        info!(state = %self.state(), "voice controller started");

        if self.welcome {
            self.say(responses::WELCOME);
        }

        while let Some(input) = input_rx.recv().await {
            self.handle_input(input).await;
        }

        info!("voice controller stopped");
    }

    /// Handle a single input to completion
    pub async fn handle_input(&mut self, input: ControllerInput) {
        match input {
            ControllerInput::Transcript(text) => {
                if let Some(event) = self.voice.recognition_finished() {
                    self.emit(event);
                }
                self.handle_transcript(&text).await;
            }
            ControllerInput::RecognitionFailed(error) => {
                warn!(%error, "speech recognition failed");
                if let Some(event) = self.voice.recognition_finished() {
                    self.emit(event);
                }
                self.say(responses::SPEECH_ERROR);
            }
            ControllerInput::StartListening => match self.voice.start_listening() {
                Some(event) => self.emit(event),
                None => debug!("recognition already pending"),
            },
            ControllerInput::StopListening => {
                if let Some(event) = self.voice.stop_listening() {
                    self.emit(event);
                }
            }
            ControllerInput::PlaybackStarted => {
                if let Some(event) = self.voice.set_playing(true) {
                    self.emit(event);
                }
            }
            ControllerInput::PlaybackEnded => {
                if let Some(event) = self.voice.set_playing(false) {
                    self.emit(event);
                }
            }
            ControllerInput::SetSpeechEnabled(enabled) => {
                info!(enabled, "speech output toggled");
                for event in self.voice.set_speech_enabled(enabled) {
                    self.emit(event);
                }
            }
        }
    }

    async fn handle_transcript(&mut self, raw: &str) {
        let transcript = Transcript::new(raw);
        if transcript.is_empty() {
            debug!("empty transcript ignored");
            return;
        }

        let command = classify(&transcript, &self.session);
        debug!(%transcript, ?command, state = %self.state(), "transcript classified");

        match command {
            Command::Navigate(view) => self.navigate(view),
            Command::StartForm(kind) => self.start_form(kind),
            Command::Cancel => self.cancel_form(),
            Command::Query(Query::Totals) => self.read_totals().await,
            Command::FormInput(text) => self.form_input(&text).await,
            Command::Unrecognized => self.say(responses::NOT_RECOGNIZED),
        }
    }

    fn navigate(&mut self, view: View) {
        self.set_view(view);
        self.say(responses::navigation(view));

        if self.session.is_active() && self.interrupt_policy == FormInterruptPolicy::Cancel {
            let from = self.state();
            self.session.reset();
            self.log_transition(from);
            self.emit(ControllerEvent::FormCancelled);
        }
    }

    fn start_form(&mut self, kind: RecordKind) {
        let from = self.state();
        self.session.begin(kind);
        self.log_transition(from);

        self.set_view(View::for_kind(kind));
        self.emit(ControllerEvent::FormStarted { kind });
        self.say(&responses::form_started(kind));
    }

    fn cancel_form(&mut self) {
        let from = self.state();
        self.session.reset();
        self.log_transition(from);

        self.emit(ControllerEvent::FormCancelled);
        self.say(responses::FORM_CANCELLED);
    }

    async fn form_input(&mut self, text: &str) {
        let Some(kind) = self.session.active_kind() else {
            self.say(responses::NOT_RECOGNIZED);
            return;
        };
        let field = self
            .session
            .current_field()
            .map(|f| f.name)
            .unwrap_or_default();

        match self.session.accept(text) {
            Ok(FieldStep::Next { accepted, next }) => {
                let from = DialogueState::AwaitingField {
                    kind,
                    index: self.session.field_index() - 1,
                };
                self.log_transition(from);
                self.emit(ControllerEvent::FieldAccepted {
                    kind,
                    field: accepted.name.to_string(),
                    next: next.name.to_string(),
                });
                self.say(&responses::next_field(next));
            }
            Ok(FieldStep::Complete(record)) => self.submit(kind, record).await,
            Err(FieldError::InvalidAmount(input)) => {
                debug!(%kind, field, %input, "field rejected");
                self.emit(ControllerEvent::FieldRejected {
                    kind,
                    field: field.to_string(),
                });
                self.say(responses::INVALID_AMOUNT);
            }
            Err(FieldError::NoActiveForm) => self.say(responses::NOT_RECOGNIZED),
        }
    }

    /// Store a completed record. The session is cleared whatever the outcome.
    async fn submit(&mut self, kind: RecordKind, record: NewRecord) {
        let from = self.state();
        self.submitting = Some(kind);
        self.log_transition(from);

        info!(%kind, title = %record.title, amount = record.amount, "submitting record");

        match self.store.create(kind, record).await {
            Ok(saved) => {
                self.emit(ControllerEvent::RecordSaved {
                    kind,
                    id: saved.id.clone(),
                    title: saved.title.clone(),
                    amount: saved.amount,
                });
                self.say(&responses::record_added(kind, &saved.title, saved.amount));
            }
            Err(e) => {
                warn!(%kind, error = %e, "failed to save record");
                self.emit(ControllerEvent::RecordFailed {
                    kind,
                    reason: e.to_string(),
                });
                self.say(responses::SAVE_ERROR);
            }
        }

        let from = self.state();
        self.submitting = None;
        self.session.reset();
        self.log_transition(from);
    }

    async fn read_totals(&mut self) {
        match self.store.totals().await {
            Ok(totals) => {
                debug!(?totals, "totals computed");
                self.say(&responses::totals(&totals));
            }
            Err(e) => {
                warn!(error = %e, "failed to compute totals");
                self.say(responses::READ_ERROR);
            }
        }
    }

    fn set_view(&mut self, view: View) {
        if self.view != view {
            info!(from = %self.view, to = %view, "view changed");
        }
        self.view = view;
        self.emit(ControllerEvent::ViewChanged { view });
    }

    fn say(&mut self, text: &str) {
        for directive in self.voice.speak(text) {
            self.emit(directive);
        }
    }

    fn log_transition(&self, from: DialogueState) {
        let to = self.state();
        if from != to {
            info!(from = %from, to = %to, "state transition");
        }
    }

    fn emit(&self, event: ControllerEvent) {
        debug!(%event, "emitting event");
        let _ = self.event_tx.send(event);
    }
}
