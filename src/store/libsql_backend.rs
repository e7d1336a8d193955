//! libSQL backend — async `SettingsStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::SettingsStore;

/// libSQL settings backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlSettings {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlSettings {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Connection(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        migrations::run_migrations(&backend.conn).await?;
        info!(path = %path.display(), "Settings database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

#[async_trait]
impl SettingsStore for LibSqlSettings {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?1", params![key])
            .await
            .map_err(|e| StoreError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<String>(0)
                .map(Some)
                .map_err(|e| StoreError::Query(format!("get_setting: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_setting: {e}"))),
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("set_setting: {e}")))?;

        Ok(())
    }
}
