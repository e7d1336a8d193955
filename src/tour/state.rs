//! Tour state machine — which phase of the walkthrough is showing.
//!
//! Transitions are pure functions of the current phase and the step count.
//! `None` means "no transition" and callers treat it as a no-op.

use serde::{Deserialize, Serialize};

/// Phase of the guided tour.
///
/// Inactive → Overview → OnStep(0) → … → OnStep(N-1) → Inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "phase", content = "step", rename_all = "snake_case")]
pub enum TourPhase {
    #[default]
    Inactive,
    Overview,
    OnStep(usize),
}

impl TourPhase {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Inactive)
    }

    /// Index reported to observers: the step index, or -1 for the overview
    /// and when inactive.
    pub fn current_step_index(&self) -> i64 {
        match self {
            Self::OnStep(i) => *i as i64,
            Self::Inactive | Self::Overview => -1,
        }
    }

    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::OnStep(i) => Some(*i),
            Self::Inactive | Self::Overview => None,
        }
    }

    /// Phase after "next" with `total` steps. Advancing past the last step
    /// ends the tour.
    pub fn next(&self, total: usize) -> Option<TourPhase> {
        match *self {
            Self::Inactive => None,
            Self::Overview if total == 0 => Some(Self::Inactive),
            Self::Overview => Some(Self::OnStep(0)),
            Self::OnStep(i) if i + 1 < total => Some(Self::OnStep(i + 1)),
            Self::OnStep(_) => Some(Self::Inactive),
        }
    }

    /// Phase after "back". Stepping back from the first step returns to the
    /// overview.
    pub fn prev(&self) -> Option<TourPhase> {
        match *self {
            Self::Inactive | Self::Overview => None,
            Self::OnStep(0) => Some(Self::Overview),
            Self::OnStep(i) => Some(Self::OnStep(i - 1)),
        }
    }

    /// Phase after jumping to `index`. Only valid while active and in range.
    pub fn skip_to(&self, index: usize, total: usize) -> Option<TourPhase> {
        if self.is_active() && index < total {
            Some(Self::OnStep(index))
        } else {
            None
        }
    }
}

impl std::fmt::Display for TourPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Overview => write!(f, "overview"),
            Self::OnStep(i) => write!(f, "on_step({i})"),
        }
    }
}
