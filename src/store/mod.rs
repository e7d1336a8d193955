//! Persistence layer — client-local settings.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlSettings;
pub use memory::MemorySettings;
pub use traits::{SettingsStore, settings_keys};
