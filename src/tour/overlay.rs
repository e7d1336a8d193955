//! Overlay view model — what the tour card and spotlight show for a given
//! phase.

use serde::Serialize;

use super::content::RoleTourConfig;
use super::highlight::Rect;
use super::state::TourPhase;

const OVERVIEW_HEADER: &str = "System Overview";
const OVERVIEW_TITLE: &str = "Welcome to CardioRegistry";

/// Where the tour card sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPlacement {
    /// Centred on screen (overview).
    Centered,
    /// Docked at the bottom so the spotlight stays visible.
    Bottom,
}

/// Buttons and clicks the overlay can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayAction {
    Next,
    Back,
    /// "Skip" on the overview card.
    Skip,
    /// The close (X) button.
    Close,
    /// Click on the dimmed backdrop.
    Backdrop,
    PlayOverview,
    Replay,
    Pause,
}

/// Everything the overlay renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayView {
    pub header: String,
    pub title: String,
    pub body: String,
    /// 0 on the overview, `(i + 1) / N * 100` on step `i`.
    pub progress_percent: f64,
    pub primary_label: &'static str,
    pub audio_label: &'static str,
    /// What the audio button does when pressed.
    pub audio_action: OverlayAction,
    pub show_back: bool,
    pub show_skip: bool,
    pub speaking: bool,
    pub placement: CardPlacement,
    /// Padded spotlight around the highlighted element.
    pub spotlight: Option<Rect>,
}

impl OverlayView {
    /// Build the view for `phase`. `None` when the tour is inactive or the
    /// phase points past the end of `config`.
    pub fn build(
        phase: TourPhase,
        config: &RoleTourConfig,
        speaking: bool,
        highlight: Option<Rect>,
    ) -> Option<OverlayView> {
        let total = config.len();
        let last = config.last_index();
        let (audio_label, audio_action) = match (speaking, phase) {
            (true, _) => ("Pause", OverlayAction::Pause),
            (false, TourPhase::Overview) => ("Play Audio", OverlayAction::PlayOverview),
            (false, _) => ("Replay", OverlayAction::Replay),
        };

        match phase {
            TourPhase::Inactive => None,
            TourPhase::Overview => Some(OverlayView {
                header: OVERVIEW_HEADER.to_string(),
                title: OVERVIEW_TITLE.to_string(),
                body: config.overview_narration.to_string(),
                progress_percent: 0.0,
                primary_label: "Start Tour",
                audio_label,
                audio_action,
                show_back: false,
                show_skip: true,
                speaking,
                placement: CardPlacement::Centered,
                spotlight: None,
            }),
            TourPhase::OnStep(index) => {
                let step = config.step(index)?;
                let primary_label = if Some(index) == last { "Finish" } else { "Next" };
                Some(OverlayView {
                    header: format!("Step {} of {}", index + 1, total),
                    title: step.title.to_string(),
                    body: step.description.to_string(),
                    progress_percent: (index + 1) as f64 * 100.0 / total as f64,
                    primary_label,
                    audio_label,
                    audio_action,
                    show_back: true,
                    show_skip: false,
                    speaking,
                    placement: CardPlacement::Bottom,
                    spotlight: highlight.map(|r| r.spotlight()),
                })
            }
        }
    }

    /// Plain-text rendering for terminals.
    pub fn render_text(&self) -> String {
        const BAR_WIDTH: usize = 20;
        let filled = ((self.progress_percent / 100.0) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));

        let mut lines = vec![
            format!(
                "[{}] {}",
                if self.speaking { "speaking" } else { "muted" },
                self.header
            ),
            self.title.clone(),
            self.body.clone(),
            format!("[{bar}] {:.0}%", self.progress_percent),
        ];
        if let Some(rect) = self.spotlight {
            lines.push(format!(
                "spotlight: top={:.0} left={:.0} {:.0}x{:.0}",
                rect.top, rect.left, rect.width, rect.height
            ));
        }

        let mut buttons = vec![self.audio_label];
        if self.show_back {
            buttons.push("Back");
        }
        buttons.push(self.primary_label);
        if self.show_skip {
            buttons.push("Skip");
        }
        lines.push(format!("< {} >", buttons.join(" | ")));
        lines.join("\n")
    }
}
