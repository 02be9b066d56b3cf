//! Keyboard/pointer navigation over ranked suggestions.
//!
//! The overlay only owns selection and visibility. Splicing a confirmed
//! candidate into the draft is the composer's job.

use std::time::{Duration, Instant};

use super::suggest::Suggestion;
use super::trigger::Trigger;

/// How the suggestion list is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    /// Floating list anchored at the caret (desktop)
    #[default]
    Popper,
    /// Collapsed strip above the keyboard (mobile)
    Inline,
}

impl Presentation {
    /// Maximum number of candidates shown at once
    pub const fn max_items(self) -> usize {
        match self {
            Self::Popper => 8,
            Self::Inline => 4,
        }
    }
}

/// Keys the overlay reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKey {
    /// Move selection up
    Up,
    /// Move selection down
    Down,
    /// Confirm selection
    Enter,
    /// Dismiss until the trigger changes
    Escape,
}

/// Result of feeding a key to the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not consumed; the input should handle the key itself
    Ignored,
    /// Selection moved
    Moved,
    /// Overlay dismissed
    Dismissed,
    /// Candidate chosen
    Confirm(Suggestion),
}

/// Selection and visibility state of the suggestion list
#[derive(Debug, Clone)]
pub struct SuggestionOverlay {
    presentation: Presentation,
    grace: Duration,
    candidates: Vec<Suggestion>,
    selected: usize,
    trigger: Trigger,
    focused: bool,
    blur_deadline: Option<Instant>,
    dismissed: bool,
}

impl SuggestionOverlay {
    /// Create a closed overlay
    pub fn new(presentation: Presentation, grace: Duration) -> Self {
        Self {
            presentation,
            grace,
            candidates: Vec::new(),
            selected: 0,
            trigger: Trigger::None,
            focused: false,
            blur_deadline: None,
            dismissed: false,
        }
    }

    /// Presentation strategy
    pub const fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// Feed the latest trigger and its ranked candidates
    pub fn update(&mut self, trigger: Trigger, mut candidates: Vec<Suggestion>) {
        if trigger != self.trigger {
            self.selected = 0;
            self.dismissed = false;
        }
        candidates.truncate(self.presentation.max_items());
        if self.selected >= candidates.len() {
            self.selected = 0;
        }
        self.trigger = trigger;
        self.candidates = candidates;
    }

    /// How long the list outlives a blur
    pub const fn grace(&self) -> Duration {
        self.grace
    }

    /// Trigger the candidates belong to
    pub const fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Whether the list is shown
    pub fn is_visible(&self) -> bool {
        self.trigger.is_active()
            && !self.dismissed
            && (self.focused || self.blur_deadline.is_some())
    }

    /// Candidates currently shown
    pub fn candidates(&self) -> &[Suggestion] {
        &self.candidates
    }

    /// Index of the highlighted candidate
    pub const fn selected_index(&self) -> usize {
        self.selected
    }

    /// The highlighted candidate
    pub fn selected(&self) -> Option<&Suggestion> {
        self.candidates.get(self.selected)
    }

    /// The input gained focus
    pub fn focus(&mut self) {
        self.focused = true;
        self.blur_deadline = None;
    }

    /// The input lost focus; the list stays up for the grace period so a
    /// pointer click on a candidate can still land
    pub fn blur(&mut self, now: Instant) {
        self.focused = false;
        self.blur_deadline = Some(now + self.grace);
    }

    /// Advance time, closing the list once the blur grace period is over
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.blur_deadline
            && now >= deadline
        {
            self.blur_deadline = None;
        }
    }

    /// Handle a navigation key
    pub fn handle_key(&mut self, key: OverlayKey) -> KeyOutcome {
        if !self.is_visible() || self.candidates.is_empty() {
            return KeyOutcome::Ignored;
        }

        let count = self.candidates.len();
        match key {
            OverlayKey::Up => {
                self.selected = (self.selected + count - 1) % count;
                KeyOutcome::Moved
            }
            OverlayKey::Down => {
                self.selected = (self.selected + 1) % count;
                KeyOutcome::Moved
            }
            OverlayKey::Enter => KeyOutcome::Confirm(self.candidates[self.selected].clone()),
            OverlayKey::Escape => {
                self.dismissed = true;
                KeyOutcome::Dismissed
            }
        }
    }

    /// Pointer confirm of a specific row
    pub fn pick(&mut self, index: usize) -> Option<Suggestion> {
        if !self.is_visible() {
            return None;
        }
        let picked = self.candidates.get(index).cloned();
        if picked.is_some() {
            self.selected = index;
        }
        picked
    }

    /// Close after a confirm and reset the selection
    pub fn close(&mut self) {
        self.selected = 0;
        self.trigger = Trigger::None;
        self.candidates.clear();
        self.dismissed = false;
    }
}
