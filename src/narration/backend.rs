//! Speech backends — the host text-to-speech capability.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use uuid::Uuid;

use crate::error::NarrationError;

/// Words per minute at `rate == 1.0`.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// Voice parameters applied to an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Speaking rate multiplier.
    pub rate: f32,
    /// Pitch multiplier, 1.0 is the voice default.
    pub pitch: f32,
    /// Volume in `0.0..=1.0`.
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// A single piece of text to be spoken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    pub voice: VoiceSettings,
}

impl Utterance {
    pub fn new(text: impl Into<String>, voice: VoiceSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            voice,
        }
    }
}

/// Host speech capability.
///
/// `speak` resolves when playback ends. Dropping the returned future must
/// stop the audio; that is how the narrator cancels an utterance.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Whether the host can speak at all. When false the narrator never
    /// calls `speak`.
    fn is_available(&self) -> bool;

    /// Speak one utterance to completion.
    async fn speak(&self, utterance: &Utterance) -> Result<(), NarrationError>;
}

/// Backend for hosts without speech synthesis. The tour stays visual-only.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBackend;

#[async_trait]
impl SpeechBackend for SilentBackend {
    fn name(&self) -> &str {
        "silent"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn speak(&self, _utterance: &Utterance) -> Result<(), NarrationError> {
        Err(NarrationError::Unavailable {
            backend: self.name().to_string(),
        })
    }
}

/// Speaks through a host TTS program (`espeak`, `espeak-ng`, `say`, or any
/// command that takes the text as its last argument).
///
/// The child process is killed when the playback future is dropped.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    resolved: Option<PathBuf>,
}

impl CommandBackend {
    /// Create a backend for `program`, resolving it against `PATH` once.
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let resolved = resolve_program(&program);
        if resolved.is_none() {
            tracing::info!(program = %program, "TTS program not found, narration disabled");
        }
        Self { program, resolved }
    }

    /// Command-line arguments for an utterance.
    pub fn args_for(&self, utterance: &Utterance) -> Vec<String> {
        let words_per_minute = (BASE_WORDS_PER_MINUTE * utterance.voice.rate).round() as u32;
        let stem = Path::new(&self.program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.program);

        match stem {
            "espeak" | "espeak-ng" => {
                let pitch = (50.0 * utterance.voice.pitch).round().clamp(0.0, 99.0) as u32;
                let amplitude = (100.0 * utterance.voice.volume).round().clamp(0.0, 200.0) as u32;
                vec![
                    "-s".to_string(),
                    words_per_minute.to_string(),
                    "-p".to_string(),
                    pitch.to_string(),
                    "-a".to_string(),
                    amplitude.to_string(),
                    utterance.text.clone(),
                ]
            }
            "say" => vec![
                "-r".to_string(),
                words_per_minute.to_string(),
                utterance.text.clone(),
            ],
            _ => vec![utterance.text.clone()],
        }
    }
}

#[async_trait]
impl SpeechBackend for CommandBackend {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        self.resolved.is_some()
    }

    async fn speak(&self, utterance: &Utterance) -> Result<(), NarrationError> {
        let program = self.resolved.as_ref().ok_or_else(|| NarrationError::Unavailable {
            backend: self.program.clone(),
        })?;

        let child = Command::new(program)
            .args(self.args_for(utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NarrationError::SpawnFailed {
                backend: self.program.clone(),
                reason: e.to_string(),
            })?;

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(NarrationError::PlaybackFailed {
                backend: self.program.clone(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            })
        }
    }
}

/// Locate `program` on `PATH`, or check it directly when it contains a
/// path separator.
fn resolve_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
