//! Listening and speaking state of the external speech capability
//!
//! The controller never blocks on recognition or playback. It flips these
//! flags and emits directives; the client reports back when a recognition
//! cycle ends or playback starts and stops.

use crate::events::ControllerEvent;

/// Flags tracking recognition and playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceIo {
    listening: bool,
    speaking: bool,
    speech_enabled: bool,
}

impl VoiceIo {
    pub fn new(speech_enabled: bool) -> Self {
        Self {
            listening: false,
            speaking: false,
            speech_enabled,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech_enabled
    }

    /// Begin a recognition cycle. Only one may be outstanding.
    pub fn start_listening(&mut self) -> Option<ControllerEvent> {
        if self.listening {
            return None;
        }
        self.listening = true;
        Some(ControllerEvent::StartRecognition)
    }

    pub fn stop_listening(&mut self) -> Option<ControllerEvent> {
        if !self.listening {
            return None;
        }
        self.listening = false;
        Some(ControllerEvent::StopRecognition)
    }

    /// A result or error arrived for the pending cycle
    pub fn recognition_finished(&mut self) -> Option<ControllerEvent> {
        if !self.listening {
            return None;
        }
        self.listening = false;
        Some(ControllerEvent::RecognitionEnded)
    }

    /// Directives for playing `text`, pre-empting any utterance in progress
    pub fn speak(&mut self, text: &str) -> Vec<ControllerEvent> {
        if !self.speech_enabled {
            return Vec::new();
        }

        let mut directives = Vec::with_capacity(2);
        if self.speaking {
            self.speaking = false;
            directives.push(ControllerEvent::CancelSpeech);
        }
        directives.push(ControllerEvent::Speak {
            text: text.to_string(),
        });
        directives
    }

    pub fn set_playing(&mut self, speaking: bool) -> Option<ControllerEvent> {
        if self.speaking == speaking {
            return None;
        }
        self.speaking = speaking;
        Some(ControllerEvent::PlaybackChanged { speaking })
    }

    /// Switch spoken responses on or off. Turning them off cuts current playback.
    pub fn set_speech_enabled(&mut self, enabled: bool) -> Vec<ControllerEvent> {
        if self.speech_enabled == enabled {
            return Vec::new();
        }
        self.speech_enabled = enabled;

        let mut events = Vec::with_capacity(2);
        if !enabled && self.speaking {
            self.speaking = false;
            events.push(ControllerEvent::CancelSpeech);
        }
        events.push(ControllerEvent::SpeechEnabledChanged { enabled });
        events
    }
}
