//! Guided tour — per-role onboarding walkthrough with narration and
//! on-screen highlighting.
//!
//! The [`TourManager`] owns the session and is the only thing that mutates
//! it. Content, highlight lookup and the overlay view model are pure.

pub mod content;
pub mod highlight;
pub mod manager;
pub mod overlay;
pub mod state;

pub use content::{Role, RoleTourConfig, TourStep, get_config};
pub use highlight::{ElementLocator, LayoutMap, Rect, locate_highlight};
pub use manager::{TourManager, TourSnapshot};
pub use overlay::{CardPlacement, OverlayAction, OverlayView};
pub use state::TourPhase;
