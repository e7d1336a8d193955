//! Narrator — single-flight speech playback with an observable
//! "is speaking" flag.
//!
//! At most one utterance is in flight. Starting a new one cancels the
//! previous one through its `CancellationToken`; the superseded utterance
//! never emits a terminal event. Playback runs in a spawned task, so
//! `speak` and `stop` return immediately.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::backend::{SpeechBackend, Utterance, VoiceSettings};

/// Default broadcast channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Playback lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarrationEvent {
    /// `speak` accepted the text. Emitted synchronously.
    Requested { id: Uuid, text: String },
    /// The backend began playback.
    Started { id: Uuid },
    /// Playback ran to completion.
    Finished { id: Uuid },
    /// The backend reported an error.
    Failed { id: Uuid, reason: String },
    /// `stop` cancelled the utterance.
    Stopped { id: Uuid },
}

impl NarrationEvent {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Requested { id, .. }
            | Self::Started { id }
            | Self::Finished { id }
            | Self::Failed { id, .. }
            | Self::Stopped { id } => *id,
        }
    }

    /// Whether this event ends an utterance (speaking goes false).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished { .. } | Self::Failed { .. } | Self::Stopped { .. }
        )
    }
}

struct InFlight {
    id: Uuid,
    cancel: CancellationToken,
}

/// State shared between the narrator and its playback tasks.
struct Shared {
    speaking: watch::Sender<bool>,
    events: broadcast::Sender<NarrationEvent>,
    in_flight: Mutex<Option<InFlight>>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        // A poisoned slot still holds a valid Option.
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_speaking(&self, value: bool) {
        self.speaking.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    fn mark_started(&self, id: Uuid) {
        let slot = self.slot();
        if slot.as_ref().map(|f| f.id) == Some(id) {
            self.set_speaking(true);
            let _ = self.events.send(NarrationEvent::Started { id });
        }
    }

    /// Clear the slot and emit `event` only if `id` is still current.
    fn finish(&self, id: Uuid, event: NarrationEvent) {
        let mut slot = self.slot();
        if slot.as_ref().map(|f| f.id) == Some(id) {
            slot.take();
            self.set_speaking(false);
            let _ = self.events.send(event);
        }
    }
}

/// Speech playback service.
///
/// Construct once per application session and inject it where narration is
/// needed. Dropping the narrator (or calling [`Narrator::shutdown`]) cancels
/// anything still playing. `speak` must be called inside a tokio runtime.
pub struct Narrator {
    backend: Arc<dyn SpeechBackend>,
    voice: VoiceSettings,
    shared: Arc<Shared>,
}

impl Narrator {
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        Self::with_voice(backend, VoiceSettings::default())
    }

    pub fn with_voice(backend: Arc<dyn SpeechBackend>, voice: VoiceSettings) -> Self {
        let (speaking, _) = watch::channel(false);
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            backend,
            voice,
            shared: Arc::new(Shared {
                speaking,
                events,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Whether the host can speak at all.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn is_speaking(&self) -> bool {
        *self.shared.speaking.borrow()
    }

    /// Observe the speaking flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.speaking.subscribe()
    }

    /// Observe playback lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<NarrationEvent> {
        self.shared.events.subscribe()
    }

    /// Speak `text`, cancelling whatever is playing. Returns the utterance
    /// id, or `None` when the host has no speech capability.
    pub fn speak(&self, text: &str) -> Option<Uuid> {
        if !self.backend.is_available() {
            debug!(backend = self.backend.name(), "Speech unavailable, skipping narration");
            return None;
        }

        let utterance = Utterance::new(text, self.voice);
        let id = utterance.id;
        let cancel = CancellationToken::new();

        {
            let mut slot = self.shared.slot();
            if let Some(previous) = slot.replace(InFlight {
                id,
                cancel: cancel.clone(),
            }) {
                debug!(superseded = %previous.id, utterance = %id, "Cancelling previous narration");
                previous.cancel.cancel();
            }
            let _ = self.shared.events.send(NarrationEvent::Requested {
                id,
                text: utterance.text.clone(),
            });
        }

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            if cancel.is_cancelled() {
                return;
            }
            shared.mark_started(id);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = backend.speak(&utterance) => Some(result),
            };

            match outcome {
                // Superseded or stopped; whoever cancelled owns the flag.
                None => debug!(utterance = %id, "Narration cancelled"),
                Some(Ok(())) => shared.finish(id, NarrationEvent::Finished { id }),
                Some(Err(e)) => {
                    warn!(utterance = %id, backend = backend.name(), error = %e, "Narration failed");
                    shared.finish(
                        id,
                        NarrationEvent::Failed {
                            id,
                            reason: e.to_string(),
                        },
                    );
                }
            }
        });

        Some(id)
    }

    /// Cancel any in-flight utterance and force the speaking flag off.
    /// Idempotent.
    pub fn stop(&self) {
        let mut slot = self.shared.slot();
        if let Some(current) = slot.take() {
            current.cancel.cancel();
            debug!(utterance = %current.id, "Narration stopped");
            let _ = self.shared.events.send(NarrationEvent::Stopped { id: current.id });
        }
        self.shared.set_speaking(false);
    }

    /// Dispose of the narrator at session teardown.
    pub fn shutdown(&self) {
        self.stop();
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        if let Some(current) = self.shared.slot().take() {
            current.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::timeout;

    use super::*;
    use crate::error::NarrationError;
    use crate::narration::SilentBackend;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    /// Texts starting with "slow" take far longer than any test; "fail"
    /// errors out; everything else finishes quickly.
    struct ScriptedBackend;

    #[async_trait]
    impl SpeechBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn speak(&self, utterance: &Utterance) -> Result<(), NarrationError> {
            if utterance.text.starts_with("slow") {
                tokio::time::sleep(Duration::from_secs(60)).await;
            } else {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            if utterance.text.starts_with("fail") {
                return Err(NarrationError::PlaybackFailed {
                    backend: "scripted".into(),
                    reason: "synthetic".into(),
                });
            }
            Ok(())
        }
    }

    fn narrator() -> Narrator {
        Narrator::new(Arc::new(ScriptedBackend))
    }

    async fn next_terminal(rx: &mut broadcast::Receiver<NarrationEvent>) -> NarrationEvent {
        timeout(TEST_TIMEOUT, async {
            loop {
                let event = rx.recv().await.unwrap();
                if event.is_terminal() {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for terminal event")
    }

    #[tokio::test]
    async fn unavailable_backend_is_silent_noop() {
        let narrator = Narrator::new(Arc::new(SilentBackend));
        let mut events = narrator.events();
        assert!(narrator.speak("hello").is_none());
        assert!(!narrator.is_speaking());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn natural_end_clears_speaking() {
        let narrator = narrator();
        let mut events = narrator.events();
        let mut speaking = narrator.subscribe();

        let id = narrator.speak("hello").unwrap();
        assert_eq!(next_terminal(&mut events).await, NarrationEvent::Finished { id });
        assert!(!narrator.is_speaking());

        // The flag went true at some point before settling on false.
        assert!(speaking.has_changed().unwrap());
        assert!(!*speaking.borrow_and_update());
    }

    #[tokio::test]
    async fn error_clears_speaking_without_panicking() {
        let narrator = narrator();
        let mut events = narrator.events();

        narrator.speak("fail please").unwrap();
        let event = next_terminal(&mut events).await;
        assert!(matches!(event, NarrationEvent::Failed { .. }));
        assert!(!narrator.is_speaking());
    }

    #[tokio::test]
    async fn second_speak_supersedes_first() {
        let narrator = narrator();
        let mut events = narrator.events();

        let first = narrator.speak("slow first").unwrap();
        let second = narrator.speak("second").unwrap();

        let terminal = next_terminal(&mut events).await;
        assert_eq!(terminal, NarrationEvent::Finished { id: second });

        // Nothing further arrives for the cancelled utterance.
        tokio::time::sleep(Duration::from_millis(50)).await;
        while let Ok(event) = events.try_recv() {
            assert!(!event.is_terminal(), "unexpected terminal event {event:?}");
            assert_ne!(event, NarrationEvent::Started { id: first });
        }
        assert!(!narrator.is_speaking());
    }

    #[tokio::test]
    async fn stop_cancels_and_is_idempotent() {
        let narrator = narrator();
        let mut events = narrator.events();

        let id = narrator.speak("slow narration").unwrap();
        timeout(TEST_TIMEOUT, async {
            while !narrator.is_speaking() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        narrator.stop();
        assert!(!narrator.is_speaking());
        assert_eq!(next_terminal(&mut events).await, NarrationEvent::Stopped { id });

        narrator.stop();
        assert!(!narrator.is_speaking());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn requested_event_is_synchronous() {
        let narrator = narrator();
        let mut events = narrator.events();

        let id = narrator.speak("caption text").unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            NarrationEvent::Requested {
                id,
                text: "caption text".into()
            }
        );
    }
}
