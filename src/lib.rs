//! Cardio Tour — guided onboarding tour engine for the registry app.

pub mod config;
pub mod driver;
pub mod error;
pub mod narration;
pub mod store;
pub mod tour;
