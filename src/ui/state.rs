use std::collections::BTreeSet;

use super::events::RequestId;
use super::render::RenderedResults;

/// What the results panel shows. Error, no-results and populated results are
/// variants of one enum, so at most one of them can be visible.
#[derive(Debug, Clone, Default)]
pub(crate) enum PanelState {
    #[default]
    Empty,
    Error(String),
    NoResults,
    Results(RenderedResults),
}

/// The results panel plus its independent loading indicator.
#[derive(Debug, Default)]
pub(crate) struct ResultsPanel {
    pub(crate) state: PanelState,
    in_flight: BTreeSet<RequestId>,
}

impl ResultsPanel {
    /// Clear cards, hide error and no-results messaging, and hide the heading.
    pub(crate) fn reset(&mut self) {
        self.state = PanelState::Empty;
    }

    pub(crate) fn show_error(&mut self, message: impl Into<String>) {
        self.state = PanelState::Error(message.into());
    }

    pub(crate) fn show_no_results(&mut self) {
        self.state = PanelState::NoResults;
    }

    pub(crate) fn show_results(&mut self, results: RenderedResults) {
        self.state = PanelState::Results(results);
    }

    /// Loading stays visible while any request is outstanding.
    pub(crate) fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub(crate) fn start_request(&mut self, id: RequestId) {
        self.in_flight.insert(id);
    }

    /// Returns false when the id was not outstanding.
    pub(crate) fn finish_request(&mut self, id: RequestId) -> bool {
        self.in_flight.remove(&id)
    }

    pub(crate) fn error_message(&self) -> Option<&str> {
        match &self.state {
            PanelState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn results(&self) -> Option<&RenderedResults> {
        match &self.state {
            PanelState::Results(results) => Some(results),
            _ => None,
        }
    }

    pub(crate) fn results_mut(&mut self) -> Option<&mut RenderedResults> {
        match &mut self.state {
            PanelState::Results(results) => Some(results),
            _ => None,
        }
    }

    pub(crate) fn card_count(&self) -> usize {
        self.results().map_or(0, |results| results.cards.len())
    }
}

/// Whether the results view may scroll. Opening the modal saves the current
/// state and locks; closing puts the saved state back.
#[derive(Debug, Default)]
pub(crate) struct ScrollLock {
    locked: bool,
    saved: Option<bool>,
}

impl ScrollLock {
    pub(crate) fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn lock(&mut self) {
        if self.saved.is_none() {
            self.saved = Some(self.locked);
        }
        self.locked = true;
    }

    pub(crate) fn restore(&mut self) {
        if let Some(previous) = self.saved.take() {
            self.locked = previous;
        }
    }
}
