//! Narration — text-to-speech for tour steps.
//!
//! A [`Narrator`] wraps one [`SpeechBackend`] and enforces the
//! single-utterance rule. Hosts without speech get [`SilentBackend`] and a
//! visual-only tour.

pub mod backend;
pub mod narrator;

pub use backend::{CommandBackend, SilentBackend, SpeechBackend, Utterance, VoiceSettings};
pub use narrator::{NarrationEvent, Narrator};
