//! Highlight locator — resolves a step's target selector to a viewport
//! rectangle for the spotlight.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::content::{TourStep, data_tour_key};

/// Padding the spotlight draws around the target, in pixels.
pub const SPOTLIGHT_PADDING: f64 = 8.0;

/// Rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn inflate(&self, by: f64) -> Rect {
        Rect {
            top: self.top - by,
            left: self.left - by,
            width: self.width + 2.0 * by,
            height: self.height + 2.0 * by,
        }
    }

    /// The rectangle the overlay actually outlines.
    pub fn spotlight(&self) -> Rect {
        self.inflate(SPOTLIGHT_PADDING)
    }
}

/// The host's view tree.
pub trait ElementLocator {
    /// Bounding rectangle of the first element matching `selector`.
    fn bounding_rect(&self, selector: &str) -> Option<Rect>;

    /// Smooth-scroll the matching element to the centre of the viewport.
    fn scroll_into_view(&self, selector: &str);
}

/// Rectangle to spotlight for `step`, or `None` when the tour is inactive,
/// the step has no target, or nothing on screen matches.
///
/// Stateless; hosts call this again whenever the step or the viewport
/// changes.
pub fn locate_highlight(
    active: bool,
    step: Option<&TourStep>,
    locator: &dyn ElementLocator,
) -> Option<Rect> {
    if !active {
        return None;
    }
    let selector = step?.target_selector?;
    let rect = locator.bounding_rect(selector)?;
    locator.scroll_into_view(selector);
    Some(rect)
}

/// In-memory layout keyed by `data-tour` key, with a vertical scroll offset.
///
/// Stands in for a real view tree in the terminal driver and in tests.
/// Rectangles are stored in page coordinates; `bounding_rect` reports them
/// relative to the current scroll position.
#[derive(Debug)]
pub struct LayoutMap {
    elements: HashMap<String, Rect>,
    viewport_height: f64,
    scroll_top: Mutex<f64>,
}

impl LayoutMap {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            elements: HashMap::new(),
            viewport_height,
            scroll_top: Mutex::new(0.0),
        }
    }

    /// Place an element by its `data-tour` key, in page coordinates.
    pub fn insert(&mut self, key: impl Into<String>, rect: Rect) {
        self.elements.insert(key.into(), rect);
    }

    /// Lay out `steps` as a vertical sidebar of equal-height rows.
    pub fn sidebar(steps: &[TourStep], row_height: f64, viewport_height: f64) -> Self {
        let mut layout = Self::new(viewport_height);
        for (row, step) in steps.iter().enumerate() {
            if let Some(key) = step.target_selector.and_then(data_tour_key) {
                layout.insert(key, Rect::new(row as f64 * row_height, 0.0, 256.0, row_height));
            }
        }
        layout
    }

    pub fn scroll_top(&self) -> f64 {
        *self.scroll_top.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_scroll_top(&self, top: f64) {
        *self.scroll_top.lock().unwrap_or_else(|e| e.into_inner()) = top.max(0.0);
    }

    fn page_rect(&self, selector: &str) -> Option<Rect> {
        let key = data_tour_key(selector)?;
        self.elements.get(key).copied()
    }
}

impl ElementLocator for LayoutMap {
    fn bounding_rect(&self, selector: &str) -> Option<Rect> {
        let rect = self.page_rect(selector)?;
        Some(Rect {
            top: rect.top - self.scroll_top(),
            ..rect
        })
    }

    fn scroll_into_view(&self, selector: &str) {
        if let Some(rect) = self.page_rect(selector) {
            let centred = rect.top + rect.height / 2.0 - self.viewport_height / 2.0;
            self.set_scroll_top(centred);
        }
    }
}
