//! In-memory `SettingsStore` for tests and ephemeral sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::traits::SettingsStore;

/// Settings held in a map; lost when dropped.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_overwrite() {
        let store = MemorySettings::new();
        assert!(store.get_setting("k").await.unwrap().is_none());

        store.set_setting("k", "v").await.unwrap();
        assert_eq!(store.get_setting("k").await.unwrap().as_deref(), Some("v"));

        store.set_setting("k", "w").await.unwrap();
        assert_eq!(store.get_setting("k").await.unwrap().as_deref(), Some("w"));
    }
}
