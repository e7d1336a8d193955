//! `SettingsStore` trait — the client-local durable key-value store.

use async_trait::async_trait;

use crate::error::StoreError;

/// Well-known settings keys.
pub mod settings_keys {
    /// Set once any tour is ended. Global to the local profile, not per role.
    pub const TOUR_COMPLETED: &str = "tourCompleted";
    /// Value stored under [`TOUR_COMPLETED`].
    pub const TOUR_COMPLETED_VALUE: &str = "true";
}

/// Backend-agnostic string key-value store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a value, `None` if the key was never set.
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
