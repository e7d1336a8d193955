//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::narration::VoiceSettings;

/// Runtime configuration for the tour driver.
#[derive(Debug, Clone)]
pub struct TourAppConfig {
    /// Path of the libSQL file holding client-local settings.
    pub db_path: PathBuf,
    /// Role assumed when the host does not supply one.
    pub default_role: String,
    /// Host text-to-speech command. `None` runs the tour without voice.
    pub tts_command: Option<String>,
    /// Voice parameters applied to every utterance.
    pub voice: VoiceSettings,
}

impl Default for TourAppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/cardio-tour.db"),
            default_role: "admin".to_string(),
            tts_command: Some("espeak".to_string()),
            voice: VoiceSettings::default(),
        }
    }
}

impl TourAppConfig {
    /// Build from `CARDIO_TOUR_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("CARDIO_TOUR_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(role) = lookup("CARDIO_TOUR_ROLE") {
            config.default_role = role;
        }
        if let Some(cmd) = lookup("CARDIO_TOUR_TTS_COMMAND") {
            let cmd = cmd.trim();
            // "none" disables voice entirely
            config.tts_command = if cmd.is_empty() || cmd.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(cmd.to_string())
            };
        }
        if let Some(rate) = lookup("CARDIO_TOUR_VOICE_RATE") {
            config.voice.rate = parse_unit("CARDIO_TOUR_VOICE_RATE", &rate, 0.1, 10.0)?;
        }
        if let Some(pitch) = lookup("CARDIO_TOUR_VOICE_PITCH") {
            config.voice.pitch = parse_unit("CARDIO_TOUR_VOICE_PITCH", &pitch, 0.0, 2.0)?;
        }
        if let Some(volume) = lookup("CARDIO_TOUR_VOICE_VOLUME") {
            config.voice.volume = parse_unit("CARDIO_TOUR_VOICE_VOLUME", &volume, 0.0, 1.0)?;
        }

        Ok(config)
    }
}

fn parse_unit(key: &str, raw: &str, min: f32, max: f32) -> Result<f32, ConfigError> {
    let value: f32 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?} is not a number: {e}"),
    })?;
    if !(min..=max).contains(&value) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value} is outside {min}..={max}"),
        });
    }
    Ok(value)
}
