//! TourManager — owns the tour session, applies transitions, and drives
//! narration.
//!
//! Every operation is infallible from the caller's point of view. Invalid
//! requests are no-ops, and store or speech failures are logged here and go
//! no further.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::narration::Narrator;
use crate::store::{SettingsStore, settings_keys};

use super::content::{Role, RoleTourConfig, TourStep, resolve_role};
use super::highlight::{ElementLocator, locate_highlight};
use super::overlay::{OverlayAction, OverlayView};
use super::state::TourPhase;

/// Mutable tour state. Only the manager touches it.
#[derive(Debug, Default)]
struct TourSession {
    phase: TourPhase,
    role: Option<Role>,
    config: Option<&'static RoleTourConfig>,
}

impl TourSession {
    fn total_steps(&self) -> usize {
        self.config.map(|c| c.len()).unwrap_or(0)
    }

    fn current_step(&self) -> Option<&'static TourStep> {
        let index = self.phase.step_index()?;
        self.config?.step(index)
    }

    fn snapshot(&self) -> TourSnapshot {
        TourSnapshot {
            active: self.phase.is_active(),
            phase: self.phase,
            current_step_index: self.phase.current_step_index(),
            role: self.role,
            total_steps: self.total_steps(),
            current_step: self.current_step().copied(),
        }
    }
}

/// Read-only view of the session, published after every committed change.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct TourSnapshot {
    pub active: bool,
    pub phase: TourPhase,
    /// -1 for the overview and when inactive.
    pub current_step_index: i64,
    pub role: Option<Role>,
    pub total_steps: usize,
    pub current_step: Option<TourStep>,
}

/// Coordinates the tour session, the narrator, and completion persistence.
pub struct TourManager {
    narrator: Arc<Narrator>,
    store: Arc<dyn SettingsStore>,
    session: RwLock<TourSession>,
    snapshot_tx: watch::Sender<TourSnapshot>,
}

impl TourManager {
    /// Create a manager with no role loaded. Call [`TourManager::set_role`]
    /// before starting a tour.
    pub fn new(narrator: Arc<Narrator>, store: Arc<dyn SettingsStore>) -> Self {
        let (snapshot_tx, _) = watch::channel(TourSnapshot::default());
        Self {
            narrator,
            store,
            session: RwLock::new(TourSession::default()),
            snapshot_tx,
        }
    }

    pub fn narrator(&self) -> &Arc<Narrator> {
        &self.narrator
    }

    /// Observe committed session changes.
    pub fn subscribe(&self) -> watch::Receiver<TourSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> TourSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub async fn is_active(&self) -> bool {
        self.session.read().await.phase.is_active()
    }

    pub fn is_speaking(&self) -> bool {
        self.narrator.is_speaking()
    }

    pub async fn phase(&self) -> TourPhase {
        self.session.read().await.phase
    }

    pub async fn current_step_index(&self) -> i64 {
        self.session.read().await.phase.current_step_index()
    }

    pub async fn tour_config(&self) -> Option<&'static RoleTourConfig> {
        self.session.read().await.config
    }

    pub async fn current_step(&self) -> Option<&'static TourStep> {
        self.session.read().await.current_step()
    }

    pub async fn role(&self) -> Option<Role> {
        self.session.read().await.role
    }

    fn publish(&self, session: &TourSession) {
        self.snapshot_tx.send_replace(session.snapshot());
    }

    /// Load the tour for the viewer's role. Unknown names get the default
    /// role's tour; an empty name keeps whatever is loaded.
    ///
    /// Changing role while a tour is running ends it without marking it
    /// completed.
    pub async fn set_role(&self, name: &str) {
        if name.trim().is_empty() {
            debug!("Empty role, keeping current tour config");
            return;
        }
        let role = resolve_role(name);
        if Role::parse(name).is_none() {
            debug!(requested = name, fallback = %role, "No tour for role, using default");
        }

        let mut session = self.session.write().await;
        if session.role == Some(role) && session.config.is_some() {
            return;
        }
        if session.phase.is_active() {
            info!(from = ?session.role, to = %role, "Role changed mid-tour, ending tour");
            self.narrator.stop();
            session.phase = TourPhase::Inactive;
        }
        session.role = Some(role);
        session.config = Some(role.config());
        self.publish(&session);
    }

    /// Show the overview. No-op until a role is loaded. Does not narrate.
    pub async fn start_tour(&self) {
        let mut session = self.session.write().await;
        if session.config.is_none() {
            debug!("start_tour ignored: no tour config loaded");
            return;
        }
        session.phase = TourPhase::Overview;
        info!(role = ?session.role, steps = session.total_steps(), "Tour started");
        self.publish(&session);
    }

    /// Narrate the overview. Only valid while the overview is showing.
    pub async fn play_overview(&self) {
        let session = self.session.read().await;
        match (session.phase, session.config) {
            (TourPhase::Overview, Some(config)) => {
                self.narrator.speak(config.overview_narration);
            }
            (phase, _) => debug!(%phase, "play_overview ignored"),
        }
    }

    /// Advance one step. From the last step this ends the tour.
    pub async fn next_step(&self) {
        let mut session = self.session.write().await;
        let Some(next) = session.phase.next(session.total_steps()) else {
            debug!(phase = %session.phase, "next_step ignored");
            return;
        };

        if next.is_active() {
            self.enter(&mut session, next);
        } else {
            self.end_locked(&mut session);
            drop(session);
            self.persist_completion().await;
        }
    }

    /// Go back one step. From the first step this returns to the overview
    /// without narrating.
    pub async fn prev_step(&self) {
        let mut session = self.session.write().await;
        match session.phase.prev() {
            Some(prev) => self.enter(&mut session, prev),
            None => debug!(phase = %session.phase, "prev_step ignored"),
        }
    }

    /// Jump to any step while the tour is running.
    pub async fn skip_to_step(&self, index: usize) {
        let mut session = self.session.write().await;
        match session.phase.skip_to(index, session.total_steps()) {
            Some(target) => self.enter(&mut session, target),
            None => debug!(
                phase = %session.phase,
                index,
                total = session.total_steps(),
                "skip_to_step ignored"
            ),
        }
    }

    /// Stop narration, close the tour, and remember that a tour was
    /// completed. Safe to call in any state.
    pub async fn end_tour(&self) {
        let mut session = self.session.write().await;
        self.end_locked(&mut session);
        drop(session);
        self.persist_completion().await;
    }

    /// Say the current step (or the overview) again.
    pub async fn replay_step(&self) {
        let session = self.session.read().await;
        match (session.phase, session.config) {
            (TourPhase::Overview, Some(config)) => {
                self.narrator.speak(config.overview_narration);
            }
            (TourPhase::OnStep(_), Some(_)) => {
                if let Some(step) = session.current_step() {
                    self.narrator.speak(step.narration_text);
                }
            }
            (phase, _) => debug!(%phase, "replay_step ignored"),
        }
    }

    pub fn stop_speaking(&self) {
        self.narrator.stop();
    }

    /// Whether any tour has ever been ended on this profile.
    pub async fn has_completed_tour(&self) -> bool {
        match self.store.get_setting(settings_keys::TOUR_COMPLETED).await {
            Ok(value) => value.as_deref() == Some(settings_keys::TOUR_COMPLETED_VALUE),
            Err(e) => {
                warn!(error = %e, "Failed to read tour completion flag");
                false
            }
        }
    }

    /// Apply a button press from the overlay.
    pub async fn dispatch(&self, action: OverlayAction) {
        match action {
            OverlayAction::Next => self.next_step().await,
            OverlayAction::Back => self.prev_step().await,
            OverlayAction::Skip | OverlayAction::Close | OverlayAction::Backdrop => {
                self.end_tour().await
            }
            OverlayAction::PlayOverview => self.play_overview().await,
            OverlayAction::Replay => self.replay_step().await,
            OverlayAction::Pause => self.stop_speaking(),
        }
    }

    /// Build the overlay for the current state, resolving the highlight
    /// against `locator`. `None` while the tour is inactive.
    pub async fn overlay(&self, locator: &dyn ElementLocator) -> Option<OverlayView> {
        let session = self.session.read().await;
        let config = session.config?;
        let highlight = locate_highlight(
            session.phase.is_active(),
            session.current_step(),
            locator,
        );
        OverlayView::build(session.phase, config, self.narrator.is_speaking(), highlight)
    }

    /// Commit `phase` and narrate the step it lands on. The new phase is
    /// published before narration is requested.
    fn enter(&self, session: &mut TourSession, phase: TourPhase) {
        debug!(from = %session.phase, to = %phase, "Tour transition");
        session.phase = phase;
        self.publish(session);

        if let Some(step) = session.current_step() {
            self.narrator.speak(step.narration_text);
        }
    }

    fn end_locked(&self, session: &mut TourSession) {
        self.narrator.stop();
        if session.phase.is_active() {
            info!(role = ?session.role, at = %session.phase, "Tour ended");
        }
        session.phase = TourPhase::Inactive;
        self.publish(session);
    }

    async fn persist_completion(&self) {
        if let Err(e) = self
            .store
            .set_setting(
                settings_keys::TOUR_COMPLETED,
                settings_keys::TOUR_COMPLETED_VALUE,
            )
            .await
        {
            warn!(error = %e, "Failed to persist tour completion");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::broadcast;

    use super::*;
    use crate::error::{NarrationError, StoreError};
    use crate::narration::{NarrationEvent, SilentBackend, SpeechBackend, Utterance};
    use crate::store::MemorySettings;

    /// Backend that finishes instantly.
    struct InstantBackend;

    #[async_trait]
    impl SpeechBackend for InstantBackend {
        fn name(&self) -> &str {
            "instant"
        }
        fn is_available(&self) -> bool {
            true
        }
        async fn speak(&self, _utterance: &Utterance) -> Result<(), NarrationError> {
            Ok(())
        }
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    #[async_trait]
    impl SettingsStore for BrokenStore {
        async fn get_setting(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Query("disk on fire".into()))
        }
        async fn set_setting(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Query("disk on fire".into()))
        }
    }

    fn manager_with(store: Arc<dyn SettingsStore>) -> TourManager {
        let narrator = Arc::new(Narrator::new(Arc::new(InstantBackend)));
        TourManager::new(narrator, store)
    }

    fn requested_texts(rx: &mut broadcast::Receiver<NarrationEvent>) -> Vec<String> {
        let mut texts = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let NarrationEvent::Requested { text, .. } = event {
                texts.push(text);
            }
        }
        texts
    }

    #[tokio::test]
    async fn start_without_config_is_noop() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        manager.start_tour().await;
        assert!(!manager.is_active().await);
        assert_eq!(manager.current_step_index().await, -1);
    }

    #[tokio::test]
    async fn start_shows_overview_without_narrating() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        let mut events = manager.narrator().events();
        manager.set_role("nurse").await;
        manager.start_tour().await;

        assert_eq!(manager.phase().await, TourPhase::Overview);
        assert!(manager.current_step().await.is_none());
        assert!(requested_texts(&mut events).is_empty());
    }

    #[tokio::test]
    async fn play_overview_only_from_overview() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        let mut events = manager.narrator().events();
        manager.set_role("researcher").await;

        manager.play_overview().await;
        assert!(requested_texts(&mut events).is_empty());

        manager.start_tour().await;
        manager.play_overview().await;
        assert_eq!(
            requested_texts(&mut events),
            vec![Role::Researcher.config().overview_narration.to_string()]
        );

        manager.next_step().await;
        requested_texts(&mut events);
        manager.play_overview().await;
        assert!(requested_texts(&mut events).is_empty());
    }

    #[tokio::test]
    async fn operations_while_inactive_are_noops() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        let mut events = manager.narrator().events();
        manager.set_role("doctor").await;

        manager.next_step().await;
        manager.prev_step().await;
        manager.skip_to_step(1).await;
        manager.replay_step().await;

        assert!(!manager.is_active().await);
        assert!(requested_texts(&mut events).is_empty());
        // next_step from Inactive must not have ended (and persisted) a tour
        assert!(!manager.has_completed_tour().await);
    }

    #[tokio::test]
    async fn step_transition_publishes_full_snapshot() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        let mut snapshots = manager.subscribe();
        manager.set_role("pharmacist").await;
        manager.start_tour().await;
        manager.next_step().await;

        assert!(snapshots.has_changed().unwrap());
        let snap = snapshots.borrow_and_update().clone();
        assert_eq!(snap.phase, TourPhase::OnStep(0));
        assert_eq!(snap.current_step_index, 0);
        assert_eq!(snap.total_steps, 4);
        assert_eq!(snap.current_step.map(|s| s.id), Some("dashboard"));
        assert_eq!(snap.role, Some(Role::Pharmacist));
    }

    #[tokio::test]
    async fn replay_repeats_current_step() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        let mut events = manager.narrator().events();
        manager.set_role("lab_technician").await;
        manager.start_tour().await;
        manager.skip_to_step(2).await;
        manager.replay_step().await;

        let step = Role::LabTechnician.config().steps[2];
        assert_eq!(
            requested_texts(&mut events),
            vec![step.narration_text.to_string(), step.narration_text.to_string()]
        );
    }

    #[tokio::test]
    async fn role_change_while_inactive_swaps_config() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        manager.set_role("nurse").await;
        manager.set_role("doctor").await;
        assert_eq!(manager.role().await, Some(Role::Doctor));
        assert_eq!(manager.tour_config().await, Some(Role::Doctor.config()));
    }

    #[tokio::test]
    async fn role_change_mid_tour_ends_without_completion() {
        let store = Arc::new(MemorySettings::new());
        let manager = manager_with(store.clone());
        manager.set_role("nurse").await;
        manager.start_tour().await;
        manager.skip_to_step(4).await;

        manager.set_role("researcher").await;

        assert!(!manager.is_active().await);
        assert!(!manager.is_speaking());
        assert_eq!(manager.tour_config().await, Some(Role::Researcher.config()));
        assert!(store.get_setting("tourCompleted").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_role_mid_tour_keeps_tour_running() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        manager.set_role("nurse").await;
        manager.start_tour().await;
        manager.next_step().await;

        manager.set_role("NURSE").await;
        assert_eq!(manager.phase().await, TourPhase::OnStep(0));
    }

    #[tokio::test]
    async fn empty_role_keeps_loaded_config() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        manager.set_role("pharmacist").await;
        manager.set_role("   ").await;
        assert_eq!(manager.role().await, Some(Role::Pharmacist));
    }

    #[tokio::test]
    async fn unknown_role_loads_admin_tour() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        manager.set_role("receptionist").await;
        assert_eq!(manager.role().await, Some(Role::Admin));
        assert_eq!(manager.tour_config().await, Some(Role::Admin.config()));
    }

    #[tokio::test]
    async fn store_failure_does_not_escape_end_tour() {
        let manager = manager_with(Arc::new(BrokenStore));
        manager.set_role("admin").await;
        manager.start_tour().await;
        manager.end_tour().await;

        assert!(!manager.is_active().await);
        assert!(!manager.has_completed_tour().await);
    }

    #[tokio::test]
    async fn silent_host_still_walks_the_tour() {
        let narrator = Arc::new(Narrator::new(Arc::new(SilentBackend)));
        let manager = TourManager::new(narrator, Arc::new(MemorySettings::new()));
        manager.set_role("researcher").await;
        manager.start_tour().await;
        manager.play_overview().await;
        manager.next_step().await;
        manager.next_step().await;

        assert_eq!(manager.phase().await, TourPhase::OnStep(1));
        assert!(!manager.is_speaking());
    }

    #[tokio::test]
    async fn dispatch_maps_buttons() {
        let manager = manager_with(Arc::new(MemorySettings::new()));
        manager.set_role("researcher").await;
        manager.start_tour().await;

        manager.dispatch(OverlayAction::Next).await;
        assert_eq!(manager.phase().await, TourPhase::OnStep(0));
        manager.dispatch(OverlayAction::Back).await;
        assert_eq!(manager.phase().await, TourPhase::Overview);
        manager.dispatch(OverlayAction::Skip).await;
        assert!(!manager.is_active().await);
        assert!(manager.has_completed_tour().await);
    }
}
