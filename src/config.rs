//! Configuration loading and management

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::state::FormInterruptPolicy;

/// Errors in environment-provided configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HOME is not set and FINABLE_DATA_DIR was not given")]
    NoDataDir,

    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Voice settings passed on to the speech synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: 0.8,
            pitch: 1.0,
            volume: 1.0,
            lang: "en-IN".to_string(),
        }
    }
}

/// Settings passed on to the speech recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionSettings {
    pub lang: String,
    /// One result per listening cycle
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u8,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            lang: "en-IN".to_string(),
            continuous: false,
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Ledger file holding income and expense records
    pub store_path: PathBuf,

    /// Whether responses are spoken at startup
    pub speech_enabled: bool,

    /// Speak the welcome message when the controller starts
    pub welcome: bool,

    /// What navigation does to a voice form in progress
    pub form_interrupt: FormInterruptPolicy,

    pub speech: SpeechSettings,

    pub recognition: RecognitionSettings,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Ok(Self::from_lookup(|var| std::env::var(var).ok())?)
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup("FINABLE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME").ok_or(ConfigError::NoDataDir)?;
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("finable")
            }
        };

        let socket_path = lookup("FINABLE_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));
        let store_path = data_dir.join("records.json");

        let speech_enabled = parse_bool(&lookup, "FINABLE_SPEECH_ENABLED", true)?;
        let welcome = parse_bool(&lookup, "FINABLE_WELCOME", true)?;

        let form_interrupt = match lookup("FINABLE_FORM_INTERRUPT") {
            Some(value) => value
                .parse::<FormInterruptPolicy>()
                .map_err(|reason| ConfigError::Invalid {
                    var: "FINABLE_FORM_INTERRUPT",
                    value,
                    reason,
                })?,
            None => FormInterruptPolicy::default(),
        };

        let mut speech = SpeechSettings::default();
        let mut recognition = RecognitionSettings::default();

        if let Some(value) = lookup("FINABLE_SPEECH_RATE") {
            speech.rate = match value.parse::<f32>() {
                Ok(rate) if rate > 0.0 && rate <= 10.0 => rate,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "FINABLE_SPEECH_RATE",
                        value,
                        reason: "expected a number between 0 and 10".into(),
                    })
                }
            };
        }

        if let Some(lang) = lookup("FINABLE_LANG") {
            speech.lang = lang.clone();
            recognition.lang = lang;
        }

        Ok(Self {
            socket_path,
            data_dir,
            store_path,
            speech_enabled,
            welcome,
            form_interrupt,
            speech,
            recognition,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(default);
    };

    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value,
            reason: "expected true or false".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("HOME", "/home/tester")])).unwrap();
        assert_eq!(
            config.data_dir,
            PathBuf::from("/home/tester/.local/share/finable")
        );
        assert_eq!(config.socket_path, config.data_dir.join("daemon.sock"));
        assert_eq!(config.store_path, config.data_dir.join("records.json"));
        assert!(config.speech_enabled);
        assert!(config.welcome);
        assert_eq!(config.form_interrupt, FormInterruptPolicy::Keep);
        assert_eq!(config.speech, SpeechSettings::default());
        assert!(!config.recognition.continuous);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("FINABLE_DATA_DIR", "/tmp/finable"),
            ("FINABLE_SOCKET", "/run/finable.sock"),
            ("FINABLE_SPEECH_ENABLED", "off"),
            ("FINABLE_WELCOME", "0"),
            ("FINABLE_FORM_INTERRUPT", "cancel"),
            ("FINABLE_SPEECH_RATE", "1.2"),
            ("FINABLE_LANG", "en-US"),
        ]))
        .unwrap();

        assert_eq!(config.store_path, PathBuf::from("/tmp/finable/records.json"));
        assert_eq!(config.socket_path, PathBuf::from("/run/finable.sock"));
        assert!(!config.speech_enabled);
        assert!(!config.welcome);
        assert_eq!(config.form_interrupt, FormInterruptPolicy::Cancel);
        assert_eq!(config.speech.rate, 1.2);
        assert_eq!(config.recognition.lang, "en-US");
    }

    #[test]
    fn test_config_without_home() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::NoDataDir)));
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let result = Config::from_lookup(lookup_from(&[
            ("HOME", "/home/tester"),
            ("FINABLE_WELCOME", "maybe"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                var: "FINABLE_WELCOME",
                ..
            })
        ));

        let result = Config::from_lookup(lookup_from(&[
            ("HOME", "/home/tester"),
            ("FINABLE_FORM_INTERRUPT", "merge"),
        ]));
        assert!(result.is_err());
    }
}
