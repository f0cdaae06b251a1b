//! Typed events the dispatch loop feeds into [`App`](super::App), and the
//! commands the app hands back for the loop to run off the UI thread.

use std::time::Instant;

use ratatui::layout::Rect;

use crate::api::RecommendationApi;
use crate::error::ApiResult;
use crate::models::{FetchResponse, RecommendOutcome, RecommendationQuery};

/// Identifies one orchestrated request. Ids only grow, so a larger id is a
/// newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Edits applied to the focused search form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormInput {
    Char(char),
    Backspace,
    NextField,
}

#[derive(Debug)]
pub enum AppEvent {
    SubmitSearch,
    RandomSearch,
    RefreshData,
    ToggleTheme,
    CardClicked(usize),
    CloseModal,
    Escape,
    /// A card entered the results viewport.
    IntersectionVisible(usize),
    FocusSearch,
    FormInput(FormInput),
    /// Move the card selection by a signed number of cards.
    Navigate(isize),
    OpenImage,
    Click {
        column: u16,
        row: u16,
    },
    Resize(Rect),
    Tick(Instant),
    Quit,
    SearchFinished {
        id: RequestId,
        title: String,
        outcome: ApiResult<RecommendOutcome>,
    },
    RefreshFinished {
        id: RequestId,
        outcome: ApiResult<FetchResponse>,
    },
    ImageChecked {
        search: RequestId,
        card: usize,
        outcome: ApiResult<()>,
    },
}

/// Work the app asks the loop to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Recommend {
        id: RequestId,
        query: RecommendationQuery,
    },
    RefreshData {
        id: RequestId,
        pages: u32,
    },
    ProbeImage {
        search: RequestId,
        card: usize,
        url: String,
    },
    Quit,
}

impl Command {
    /// Run the blocking call behind this command and turn its result into the
    /// completion event. `Quit` has no completion.
    pub fn execute(self, api: &dyn RecommendationApi) -> Option<AppEvent> {
        match self {
            Command::Recommend { id, query } => {
                let outcome = api.recommend(&query);
                Some(AppEvent::SearchFinished {
                    id,
                    title: query.title,
                    outcome,
                })
            }
            Command::RefreshData { id, pages } => Some(AppEvent::RefreshFinished {
                id,
                outcome: api.refresh_data(pages),
            }),
            Command::ProbeImage { search, card, url } => Some(AppEvent::ImageChecked {
                search,
                card,
                outcome: api.probe_image(&url),
            }),
            Command::Quit => None,
        }
    }
}
