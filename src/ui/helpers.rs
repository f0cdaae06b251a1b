use std::ops::Range;

use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Number of recommendation cards per grid row.
pub(crate) const GRID_COLUMNS: usize = 3;
/// Height of one card including its border.
pub(crate) const CARD_HEIGHT: u16 = 6;
/// Header space for the page title and theme toggle.
const HEADER_HEIGHT: u16 = 3;
/// Search form: two fields inside a border.
const SEARCH_HEIGHT: u16 = 4;
/// One line for loading / error / no-results / heading.
const STATUS_HEIGHT: u16 = 1;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// Fixed page regions. Computed from the frame size alone so input handling
/// can hit-test with the same geometry the draw pass used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScreenLayout {
    pub(crate) header: Rect,
    pub(crate) search: Rect,
    pub(crate) status: Rect,
    pub(crate) grid: Rect,
    pub(crate) footer: Rect,
}

pub(crate) fn screen_layout(area: Rect) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(SEARCH_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    ScreenLayout {
        header: chunks[0],
        search: chunks[1],
        status: chunks[2],
        grid: chunks[3],
        footer: chunks[4],
    }
}

/// Card rows that fit in the grid; always at least one.
pub(crate) fn visible_rows(grid: Rect) -> usize {
    usize::from(grid.height / CARD_HEIGHT).max(1)
}

/// Indices of the cards inside the viewport for a given scroll offset.
pub(crate) fn visible_cards(grid: Rect, scroll_row: usize, count: usize) -> Range<usize> {
    let start = (scroll_row * GRID_COLUMNS).min(count);
    let end = (start + visible_rows(grid) * GRID_COLUMNS).min(count);
    start..end
}

/// Rectangle of the card at `index`, assuming it is inside the viewport.
pub(crate) fn card_rect(grid: Rect, scroll_row: usize, index: usize) -> Rect {
    let slot = index.saturating_sub(scroll_row * GRID_COLUMNS);
    let row = (slot / GRID_COLUMNS) as u16;
    let col = (slot % GRID_COLUMNS) as u16;
    let columns = GRID_COLUMNS as u16;
    let width = grid.width / columns;
    let x = grid.x + col * width;
    let width = if col + 1 == columns {
        grid.width - col * width
    } else {
        width
    };
    let y = grid.y + row * CARD_HEIGHT;
    let height = CARD_HEIGHT.min((grid.y + grid.height).saturating_sub(y));
    Rect::new(x, y, width, height)
}

/// Card under a terminal cell, if any.
pub(crate) fn card_at(
    grid: Rect,
    scroll_row: usize,
    count: usize,
    column: u16,
    row: u16,
) -> Option<usize> {
    visible_cards(grid, scroll_row, count)
        .find(|&index| rect_contains(card_rect(grid, scroll_row, index), column, row))
}

pub(crate) fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for the detail modal.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

pub(crate) fn modal_rect(area: Rect) -> Rect {
    centered_rect(70, 60, area)
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
