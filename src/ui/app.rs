use std::time::Instant;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use rand::seq::SliceRandom;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{debug, error, info};

use crate::api::FALLBACK_IMAGE_PATH;
use crate::config::Config;
use crate::db::{load_theme, save_theme};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    FetchResponse, RecommendOutcome, RecommendationQuery, ThemePreference, MAX_COUNT,
};

use super::events::{AppEvent, Command, FormInput, RequestId};
use super::forms::{SearchField, SearchForm};
use super::helpers::{
    card_at, card_rect, modal_rect, rect_contains, screen_layout, surface_error, visible_cards,
    visible_rows, GRID_COLUMNS,
};
use super::notifications::{NotificationCenter, NotificationPhase};
use super::render::{display_recommendations, show_manga_details, MangaDetails};
use super::state::{PanelState, ResultsPanel, ScrollLock};
use super::theme::{resolve_theme, Palette};

/// Well-known titles the random search picks from.
pub const POPULAR_TITLES: [&str; 10] = [
    "One Piece",
    "Naruto",
    "Bleach",
    "Attack on Titan",
    "Death Note",
    "Fullmetal Alchemist",
    "Dragon Ball",
    "Hunter x Hunter",
    "Berserk",
    "JoJo",
];

/// Width of the notification stack in the top-right corner.
const NOTIFICATION_WIDTH: u16 = 48;

/// Which part of the page receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Search,
    Results,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self, palette: &Palette) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(palette.success),
            StatusKind::Error => Style::default().fg(palette.error),
        }
    }
}

/// The whole page: form, results, modal, notifications and the theme. Every
/// operation takes `&mut self`, so the dispatch loop is the only writer.
pub struct App {
    conn: Connection,
    api_url: String,
    default_count: u32,
    refresh_pages: u32,
    theme: ThemePreference,
    focus: Focus,
    form: SearchForm,
    panel: ResultsPanel,
    modal: Option<MangaDetails>,
    scroll: ScrollLock,
    notifications: NotificationCenter,
    status: Option<StatusMessage>,
    selected: usize,
    scroll_row: usize,
    area: Rect,
    next_request: u64,
    latest_search: Option<RequestId>,
}

impl App {
    /// Build the page state. The stored theme wins over `system_theme`, which
    /// wins over light.
    pub fn new(
        conn: Connection,
        config: &Config,
        system_theme: Option<ThemePreference>,
    ) -> Result<Self> {
        let stored = load_theme(&conn)?;
        let theme = resolve_theme(stored, system_theme);
        info!(%theme, stored = stored.is_some(), "theme initialized");

        Ok(Self {
            conn,
            api_url: config.api_url.clone(),
            default_count: config.default_count,
            refresh_pages: config.refresh_pages,
            theme,
            focus: Focus::Search,
            form: SearchForm::default(),
            panel: ResultsPanel::default(),
            modal: None,
            scroll: ScrollLock::default(),
            notifications: NotificationCenter::default(),
            status: None,
            selected: 0,
            scroll_row: 0,
            area: Rect::default(),
            next_request: 0,
            latest_search: None,
        })
    }

    /// Theme currently applied to the palette.
    pub fn theme(&self) -> ThemePreference {
        self.theme
    }

    /// Record the terminal size used for hit-testing and scroll reveal.
    pub fn set_viewport(&mut self, area: Rect) {
        self.area = area;
        self.keep_selection_visible();
    }

    /// Apply one event to the page and return the work it starts. Network
    /// commands are run by the caller; their results come back as events.
    pub fn handle_event(&mut self, event: AppEvent) -> Result<Vec<Command>> {
        let commands = match event {
            AppEvent::SubmitSearch => self.submit_search(),
            AppEvent::RandomSearch => self.random_recommendations(),
            AppEvent::RefreshData => self.fetch_data(self.refresh_pages),
            AppEvent::ToggleTheme => {
                self.toggle_theme();
                Vec::new()
            }
            AppEvent::CardClicked(index) => self.open_card(index),
            AppEvent::CloseModal => {
                self.close_modal();
                Vec::new()
            }
            AppEvent::Escape => {
                self.handle_escape();
                Vec::new()
            }
            AppEvent::IntersectionVisible(index) => {
                if let Some(card) = self
                    .panel
                    .results_mut()
                    .and_then(|results| results.cards.get_mut(index))
                {
                    card.revealed = true;
                }
                Vec::new()
            }
            AppEvent::FocusSearch => {
                if self.modal.is_none() {
                    self.focus = Focus::Search;
                }
                Vec::new()
            }
            AppEvent::FormInput(input) => {
                self.edit_form(input);
                Vec::new()
            }
            AppEvent::Navigate(offset) => {
                self.move_selection(offset);
                Vec::new()
            }
            AppEvent::OpenImage => {
                self.open_modal_image();
                Vec::new()
            }
            AppEvent::Click { column, row } => self.handle_click(column, row),
            AppEvent::Resize(area) => {
                self.set_viewport(area);
                Vec::new()
            }
            AppEvent::Tick(now) => {
                self.notifications.expire(now);
                Vec::new()
            }
            AppEvent::Quit => vec![Command::Quit],
            AppEvent::SearchFinished { id, title, outcome } => {
                self.finish_search(id, &title, outcome);
                Vec::new()
            }
            AppEvent::RefreshFinished { id, outcome } => {
                self.finish_refresh(id, outcome);
                Vec::new()
            }
            AppEvent::ImageChecked {
                search,
                card,
                outcome,
            } => {
                self.finish_image_check(search, card, outcome);
                Vec::new()
            }
        };
        Ok(commands)
    }

    /// Translate a key press into an event for the current focus.
    pub fn map_key(&self, code: KeyCode) -> Option<AppEvent> {
        if self.modal.is_some() {
            return match code {
                KeyCode::Esc => Some(AppEvent::Escape),
                KeyCode::Enter | KeyCode::Char('c') => Some(AppEvent::CloseModal),
                KeyCode::Char('o') => Some(AppEvent::OpenImage),
                KeyCode::Char('q') => Some(AppEvent::Quit),
                _ => None,
            };
        }

        match self.focus {
            Focus::Search => match code {
                KeyCode::Enter => Some(AppEvent::SubmitSearch),
                KeyCode::Esc => Some(AppEvent::Escape),
                KeyCode::Tab | KeyCode::BackTab => Some(AppEvent::FormInput(FormInput::NextField)),
                KeyCode::Backspace => Some(AppEvent::FormInput(FormInput::Backspace)),
                KeyCode::Char(ch) => Some(AppEvent::FormInput(FormInput::Char(ch))),
                _ => None,
            },
            Focus::Results => {
                let columns = GRID_COLUMNS as isize;
                let page = columns * visible_rows(screen_layout(self.area).grid) as isize;
                match code {
                    KeyCode::Char('q') => Some(AppEvent::Quit),
                    KeyCode::Char('/') | KeyCode::Char('s') => Some(AppEvent::FocusSearch),
                    KeyCode::Char('t') => Some(AppEvent::ToggleTheme),
                    KeyCode::Char('r') => Some(AppEvent::RandomSearch),
                    KeyCode::Char('u') => Some(AppEvent::RefreshData),
                    KeyCode::Left => Some(AppEvent::Navigate(-1)),
                    KeyCode::Right => Some(AppEvent::Navigate(1)),
                    KeyCode::Up => Some(AppEvent::Navigate(-columns)),
                    KeyCode::Down => Some(AppEvent::Navigate(columns)),
                    KeyCode::PageUp => Some(AppEvent::Navigate(-page)),
                    KeyCode::PageDown => Some(AppEvent::Navigate(page)),
                    KeyCode::Enter if self.panel.card_count() > 0 => {
                        Some(AppEvent::CardClicked(self.selected))
                    }
                    KeyCode::Esc => Some(AppEvent::Escape),
                    _ => None,
                }
            }
        }
    }

    /// Cards inside the viewport that have not been revealed yet.
    pub fn unseen_visible_cards(&self) -> Vec<usize> {
        let Some(results) = self.panel.results() else {
            return Vec::new();
        };
        let grid = screen_layout(self.area).grid;
        visible_cards(grid, self.scroll_row, results.cards.len())
            .filter(|&index| !results.cards[index].revealed)
            .collect()
    }

    // Orchestrated operations

    /// Start a recommendation search for `title`. Invalid input is reported
    /// immediately and produces no request.
    pub fn get_recommendations(&mut self, title: &str, count: u32) -> Vec<Command> {
        let title = title.trim();
        if title.is_empty() {
            self.show_input_error(ApiError::EmptyTitle);
            return Vec::new();
        }
        if !(1..=MAX_COUNT).contains(&count) {
            self.show_input_error(ApiError::InvalidCount);
            return Vec::new();
        }

        self.reset_ui();
        let id = self.next_request_id();
        self.panel.start_request(id);
        self.latest_search = Some(id);
        info!(request = id.0, %title, count, "requesting recommendations");

        vec![Command::Recommend {
            id,
            query: RecommendationQuery::new(title, count),
        }]
    }

    /// Ask the service to refresh its manga data.
    pub fn fetch_data(&mut self, pages: u32) -> Vec<Command> {
        let id = self.next_request_id();
        self.panel.start_request(id);
        info!(request = id.0, pages, "requesting data refresh");
        vec![Command::RefreshData { id, pages }]
    }

    /// Search for one of the [`POPULAR_TITLES`] at random.
    pub fn random_recommendations(&mut self) -> Vec<Command> {
        let title = POPULAR_TITLES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(POPULAR_TITLES[0]);
        self.form.set_title(title);
        self.focus = Focus::Results;
        self.get_recommendations(title, self.default_count)
    }

    /// Hide the detail modal and give scrolling back. No-op when closed.
    pub fn close_modal(&mut self) {
        if self.modal.take().is_some() {
            self.scroll.restore();
            debug!("detail modal closed");
        }
    }

    fn submit_search(&mut self) -> Vec<Command> {
        let count = match self.form.count(self.default_count) {
            Ok(count) => count,
            Err(err) => {
                self.show_input_error(err);
                return Vec::new();
            }
        };
        let title = self.form.title.clone();
        let commands = self.get_recommendations(&title, count);
        if !commands.is_empty() {
            self.focus = Focus::Results;
        }
        commands
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    /// Input errors replace whatever the panel shows and also supersede any
    /// search still in flight.
    fn show_input_error(&mut self, err: ApiError) {
        debug!(%err, "rejected search input");
        self.latest_search = None;
        self.panel.show_error(err.to_string());
    }

    /// Clear cards, error and no-results messaging, and the heading.
    fn reset_ui(&mut self) {
        self.close_modal();
        self.status = None;
        self.panel.reset();
        self.selected = 0;
        self.scroll_row = 0;
    }

    fn finish_search(&mut self, id: RequestId, title: &str, outcome: ApiResult<RecommendOutcome>) {
        if !self.panel.finish_request(id) {
            debug!(request = id.0, "search completed without an outstanding request");
        }
        if self.latest_search != Some(id) {
            debug!(request = id.0, "discarding superseded search response");
            return;
        }

        match outcome {
            Ok(RecommendOutcome::Found(records)) if !records.is_empty() => {
                let results = display_recommendations(&records, title, id, Instant::now());
                self.panel.show_results(results);
                self.selected = 0;
                self.scroll_row = 0;
            }
            Ok(_) => {
                debug!(request = id.0, %title, "no recommendations");
                self.panel.show_no_results();
            }
            Err(err) => {
                error!(request = id.0, %title, error = %err, "recommendation request failed");
                self.panel.show_error(format!("Error: {err}"));
            }
        }
    }

    fn finish_refresh(&mut self, id: RequestId, outcome: ApiResult<FetchResponse>) {
        if !self.panel.finish_request(id) {
            debug!(request = id.0, "refresh completed without an outstanding request");
        }
        match outcome {
            Ok(fetched) => {
                self.notifications.push(
                    format!("Database updated successfully! {}", fetched.message),
                    Instant::now(),
                );
            }
            Err(err) => {
                error!(request = id.0, error = %err, "data refresh failed");
                self.panel
                    .show_error(format!("Error updating database: {err}"));
            }
        }
    }

    fn finish_image_check(&mut self, search: RequestId, index: usize, outcome: ApiResult<()>) {
        let Err(err) = outcome else {
            return;
        };
        let Some(results) = self.panel.results_mut() else {
            return;
        };
        if results.search != search {
            return;
        }
        debug!(card = index, error = %err, "image failed to load");
        if let Some(card) = results.cards.get_mut(index) {
            card.image.mark_failed();
        }
        if let Some(details) = self.modal.as_mut().filter(|details| details.card == index) {
            details.image_src = FALLBACK_IMAGE_PATH.to_string();
        }
    }

    // Presentation state

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        debug!(theme = %self.theme, "theme toggled");
        if let Err(err) = save_theme(&self.conn, self.theme) {
            error!(error = %err, "failed to persist theme");
            self.set_status(
                format!("Theme not saved: {}", surface_error(&err)),
                StatusKind::Error,
            );
        }
    }

    fn open_card(&mut self, index: usize) -> Vec<Command> {
        let Some(results) = self.panel.results() else {
            return Vec::new();
        };
        let Some(card) = results.cards.get(index) else {
            return Vec::new();
        };

        let details = show_manga_details(card, index);
        let probe = card.image.probe_target().map(|url| Command::ProbeImage {
            search: results.search,
            card: index,
            url: url.to_string(),
        });

        debug!(card = index, title = %details.title, "detail modal opened");
        self.modal = Some(details);
        self.scroll.lock();
        self.selected = index;
        self.keep_selection_visible();
        probe.into_iter().collect()
    }

    /// Escape peels back one layer: modal, then form focus, then the newest
    /// notification.
    fn handle_escape(&mut self) {
        if self.modal.is_some() {
            self.close_modal();
        } else if self.focus == Focus::Search {
            self.focus = Focus::Results;
        } else if let Some(id) = self.notifications.newest() {
            self.notifications.dismiss(id);
        } else {
            self.status = None;
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) -> Vec<Command> {
        if self.modal.is_some() {
            if !rect_contains(modal_rect(self.area), column, row) {
                self.close_modal();
            }
            return Vec::new();
        }

        let layout = screen_layout(self.area);
        if rect_contains(layout.search, column, row) {
            self.focus = Focus::Search;
            return Vec::new();
        }
        match card_at(
            layout.grid,
            self.scroll_row,
            self.panel.card_count(),
            column,
            row,
        ) {
            Some(index) => {
                self.focus = Focus::Results;
                self.open_card(index)
            }
            None => Vec::new(),
        }
    }

    fn edit_form(&mut self, input: FormInput) {
        if self.focus != Focus::Search || self.modal.is_some() {
            return;
        }
        match input {
            FormInput::Char(ch) => {
                self.form.push_char(ch);
            }
            FormInput::Backspace => self.form.backspace(),
            FormInput::NextField => self.form.toggle_field(),
        }
    }

    fn move_selection(&mut self, offset: isize) {
        let count = self.panel.card_count();
        if self.scroll.is_locked() || count == 0 {
            return;
        }
        let last = count as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
        self.keep_selection_visible();
    }

    /// Scroll just enough that the selected card's row is in the viewport.
    fn keep_selection_visible(&mut self) {
        let rows = visible_rows(screen_layout(self.area).grid);
        let selected_row = self.selected / GRID_COLUMNS;
        if selected_row < self.scroll_row {
            self.scroll_row = selected_row;
        } else if selected_row >= self.scroll_row + rows {
            self.scroll_row = selected_row + 1 - rows;
        }
    }

    fn open_modal_image(&mut self) {
        let Some(details) = &self.modal else {
            return;
        };
        let target = if details.image_src == FALLBACK_IMAGE_PATH {
            format!("{}{}", self.api_url.trim_end_matches('/'), FALLBACK_IMAGE_PATH)
        } else {
            details.image_src.clone()
        };
        match open_link(&target) {
            Ok(()) => self.set_status(format!("Opened {target}."), StatusKind::Info),
            Err(err) => self.set_status(format!("Failed to open image: {err}"), StatusKind::Error),
        }
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    // Drawing

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let palette = Palette::for_theme(self.theme);
        let now = Instant::now();

        frame.render_widget(Block::default().style(palette.base()), area);

        let layout = screen_layout(area);
        self.draw_header(frame, layout.header, palette);
        self.draw_search(frame, layout.search, palette);
        self.draw_status_line(frame, layout.status, palette);
        self.draw_results(frame, layout.grid, palette, now);
        self.draw_footer(frame, layout.footer, palette);
        self.draw_notifications(frame, area, palette, now);

        if let Some(details) = &self.modal {
            self.draw_modal(frame, area, details, palette);
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(Span::styled(" Manga Recommender ", palette.heading()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "Discover manga similar to the ones you love",
                palette.muted(),
            )),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    self.theme.toggle_icon(),
                    Style::default().fg(palette.accent),
                ),
                Span::styled(" [t]", palette.muted()),
            ]))
            .alignment(Alignment::Right),
            chunks[1],
        );
    }

    fn draw_search(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let focused = self.focus == Focus::Search && self.modal.is_none();
        let border = if focused {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.border)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" Search ");
        let inner = block.inner(area);

        let count_placeholder = format!("{} (default)", self.default_count);
        let lines = vec![
            self.form
                .build_line("Title", SearchField::Title, "Enter a manga title", palette, focused),
            self.form
                .build_line("Count", SearchField::Count, &count_placeholder, palette, focused),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if focused && inner.height >= 2 {
            let row = match self.form.active {
                SearchField::Title => 0,
                SearchField::Count => 1,
            };
            let label_len = "Title: ".len() as u16;
            let x = inner
                .x
                .saturating_add(label_len)
                .saturating_add(self.form.value_len(self.form.active) as u16)
                .min(inner.right().saturating_sub(1));
            frame.set_cursor_position((x, inner.y + row));
        }
    }

    fn draw_status_line(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let mut spans = Vec::new();
        if self.panel.is_loading() {
            spans.push(Span::styled(
                "⏳ Loading… ",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::ITALIC),
            ));
        }

        match &self.panel.state {
            PanelState::Empty => {
                if spans.is_empty() {
                    spans.push(Span::styled(
                        "Type a title and press Enter, or press r for a popular pick.",
                        palette.muted(),
                    ));
                }
            }
            PanelState::Error(message) => {
                spans.push(Span::styled(
                    message.clone(),
                    Style::default()
                        .fg(palette.error)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            PanelState::NoResults => {
                spans.push(Span::styled(
                    "No recommendations found. Try a different title.",
                    palette.muted(),
                ));
            }
            PanelState::Results(results) => {
                spans.push(Span::styled(results.heading.clone(), palette.heading()));
            }
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect, palette: &Palette, now: Instant) {
        let Some(results) = self.panel.results() else {
            return;
        };

        for index in visible_cards(area, self.scroll_row, results.cards.len()) {
            let card = &results.cards[index];
            let selected = index == self.selected;
            let rect = card_rect(area, self.scroll_row, index);
            let border = if selected {
                Style::default().fg(palette.accent)
            } else {
                Style::default().fg(palette.border)
            };
            let block = Block::default().borders(Borders::ALL).border_style(border);

            if card.is_shown(results.rendered_at, now) {
                frame.render_widget(
                    Paragraph::new(card.lines(palette, selected)).block(block),
                    rect,
                );
            } else {
                frame.render_widget(block, rect);
            }
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border));

        let line = if let Some(status) = &self.status {
            Line::from(Span::styled(status.text.clone(), status.kind.style(palette)))
        } else {
            let hints = if self.modal.is_some() {
                "[o] open image  [Esc/Enter] close  [q] quit"
            } else if self.focus == Focus::Search {
                "[Enter] search  [Tab] switch field  [Esc] results  [Ctrl+T] theme"
            } else {
                "[/] search  [arrows] move  [Enter] details  [r] random  [u] refresh data  [t] theme  [q] quit"
            };
            Line::from(Span::styled(hints, palette.muted()))
        };

        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn draw_notifications(&self, frame: &mut Frame, area: Rect, palette: &Palette, now: Instant) {
        let width = NOTIFICATION_WIDTH.min(area.width.saturating_sub(2));
        if width < 10 {
            return;
        }
        let x = area.right().saturating_sub(width + 1);
        let mut y = area.y + 1;

        for (notification, phase) in self.notifications.live(now) {
            if y + 3 > area.bottom() {
                break;
            }
            let rect = Rect::new(x, y, width, 3);
            let mut style = Style::default().fg(palette.success).bg(palette.background);
            if phase == NotificationPhase::Fading {
                style = style.add_modifier(Modifier::DIM);
            }
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(format!("✔ {}", notification.message))
                    .style(style)
                    .block(Block::default().borders(Borders::ALL).border_style(style)),
                rect,
            );
            y += 3;
        }
    }

    fn draw_modal(&self, frame: &mut Frame, area: Rect, details: &MangaDetails, palette: &Palette) {
        let popup = modal_rect(area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent))
            .style(palette.base())
            .title(Span::styled(format!(" {} ", details.title), palette.heading()));

        let label = Style::default()
            .fg(palette.foreground)
            .add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(Span::styled(
                format!(" {} ", details.score_label),
                Style::default()
                    .fg(palette.background)
                    .bg(palette.badge)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Image: ", label),
                Span::styled(details.image_src.clone(), palette.muted()),
            ]),
            Line::from(""),
            Line::from(Span::styled("Genres", label)),
            Line::from(Span::styled(
                details.genre_text(),
                Style::default().fg(palette.genre),
            )),
            Line::from(""),
            Line::from(Span::styled("Themes", label)),
            Line::from(Span::styled(
                details.theme_text(),
                Style::default().fg(palette.theme_tag),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press o to open the image, Esc to close.",
                palette.muted(),
            )),
        ];

        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{classify_recommend, MockRecommendationApi};
    use crate::db::init_schema;
    use crate::models::RecommendationRecord;

    fn test_app() -> App {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let mut app = App::new(conn, &Config::default(), None).unwrap();
        app.set_viewport(Rect::new(0, 0, 90, 40));
        app
    }

    fn record(title: &str, score: f64) -> RecommendationRecord {
        RecommendationRecord {
            title: title.to_string(),
            score,
            genres: vec!["Action".into()],
            themes: Vec::new(),
            image_url: Some(format!("https://example.com/{title}.jpg")),
        }
    }

    /// Run commands against the mock and feed completions back until idle.
    fn drive(app: &mut App, api: &MockRecommendationApi, commands: Vec<Command>) {
        let mut queue = commands;
        while let Some(command) = queue.pop() {
            if let Some(event) = command.execute(api) {
                queue.extend(app.handle_event(event).unwrap());
            }
        }
    }

    fn search(app: &mut App, api: &MockRecommendationApi, title: &str) {
        app.form.title = title.to_string();
        let commands = app.handle_event(AppEvent::SubmitSearch).unwrap();
        drive(app, api, commands);
    }

    #[test]
    fn blank_titles_never_reach_the_network() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend().times(0);
        let mut app = test_app();

        for title in ["", "   ", "\t"] {
            search(&mut app, &api, title);
            assert_eq!(app.panel.error_message(), Some("Please enter a manga title"));
            assert!(!app.panel.is_loading());
        }
    }

    #[test]
    fn not_found_shows_no_results_without_error() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend()
            .returning(|_| Ok(RecommendOutcome::NotFound));
        let mut app = test_app();

        search(&mut app, &api, "Unknown");
        assert!(matches!(app.panel.state, PanelState::NoResults));
        assert_eq!(app.panel.error_message(), None);
        assert!(!app.panel.is_loading());
    }

    #[test]
    fn server_failure_reports_status_code() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend()
            .returning(|_| Err(ApiError::Status(503)));
        let mut app = test_app();

        search(&mut app, &api, "Naruto");
        let message = app.panel.error_message().unwrap();
        assert!(message.contains("503"), "{message}");
        assert!(message.starts_with("Error: "));
        assert!(!app.panel.is_loading());
    }

    #[test]
    fn decode_failure_is_surfaced() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend().returning(|_| {
            Err(serde_json::from_str::<FetchResponse>("not json")
                .unwrap_err()
                .into())
        });
        let mut app = test_app();

        search(&mut app, &api, "Naruto");
        assert!(app
            .panel
            .error_message()
            .unwrap()
            .starts_with("Error: invalid response body"));
    }

    #[test]
    fn empty_list_shows_no_results() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend()
            .returning(|_| Ok(RecommendOutcome::Found(Vec::new())));
        let mut app = test_app();

        search(&mut app, &api, "Naruto");
        assert!(matches!(app.panel.state, PanelState::NoResults));
    }

    #[test]
    fn null_list_shows_no_results() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend().returning(|_| {
            classify_recommend(reqwest::StatusCode::OK, r#"{"recommendations":null}"#)
        });
        let mut app = test_app();

        search(&mut app, &api, "Naruto");
        assert!(matches!(app.panel.state, PanelState::NoResults));
        assert_eq!(app.panel.error_message(), None);
        assert!(!app.panel.is_loading());
    }

    #[test]
    fn naruto_with_three_results_renders_three_cards() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend()
            .withf(|query| query.title == "Naruto" && query.count == 5)
            .times(1)
            .returning(|_| {
                Ok(RecommendOutcome::Found(vec![
                    record("Bleach", 0.912),
                    record("One Piece", 0.5),
                    record("Boruto", 0.33333),
                ]))
            });
        let mut app = test_app();
        app.form.count = "5".into();

        search(&mut app, &api, "Naruto");
        let results = app.panel.results().expect("results shown");
        assert_eq!(results.heading, "Recommendations for \"Naruto\"");
        let cards: Vec<_> = results
            .cards
            .iter()
            .map(|card| (card.record.title.as_str(), card.score_label.as_str()))
            .collect();
        assert_eq!(
            cards,
            [("Bleach", "91.2%"), ("One Piece", "50.0%"), ("Boruto", "33.3%")]
        );
        assert_eq!(app.panel.error_message(), None);
        assert!(!app.panel.is_loading());
    }

    #[test]
    fn new_search_replaces_previous_cards() {
        let mut api = MockRecommendationApi::new();
        let mut calls = 0;
        api.expect_recommend().returning(move |_| {
            calls += 1;
            let records = if calls == 1 {
                vec![record("A", 0.1), record("B", 0.2)]
            } else {
                vec![record("C", 0.3)]
            };
            Ok(RecommendOutcome::Found(records))
        });
        let mut app = test_app();

        search(&mut app, &api, "first");
        search(&mut app, &api, "second");
        assert_eq!(app.panel.card_count(), 1);
    }

    #[test]
    fn loading_is_visible_only_while_in_flight() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend()
            .returning(|_| Ok(RecommendOutcome::NotFound));
        let mut app = test_app();

        let commands = app.get_recommendations("Berserk", 10);
        assert!(app.panel.is_loading());
        assert!(matches!(app.panel.state, PanelState::Empty));
        drive(&mut app, &api, commands);
        assert!(!app.panel.is_loading());
    }

    #[test]
    fn superseded_search_response_is_discarded() {
        let mut app = test_app();
        let first = app.get_recommendations("Naruto", 10);
        let second = app.get_recommendations("Bleach", 10);

        let (Command::Recommend { id: first_id, .. }, Command::Recommend { id: second_id, .. }) =
            (&first[0], &second[0])
        else {
            panic!("expected recommend commands");
        };

        app.handle_event(AppEvent::SearchFinished {
            id: *second_id,
            title: "Bleach".into(),
            outcome: Ok(RecommendOutcome::Found(vec![record("Soul", 0.4)])),
        })
        .unwrap();
        app.handle_event(AppEvent::SearchFinished {
            id: *first_id,
            title: "Naruto".into(),
            outcome: Ok(RecommendOutcome::NotFound),
        })
        .unwrap();

        assert_eq!(
            app.panel.results().unwrap().heading,
            "Recommendations for \"Bleach\""
        );
        assert!(!app.panel.is_loading());
    }

    #[test]
    fn toggling_theme_twice_restores_value_and_icon() {
        let mut app = test_app();
        save_theme(&app.conn, ThemePreference::Dark).unwrap();
        app.theme = ThemePreference::Dark;
        let icon = app.theme().toggle_icon();

        app.handle_event(AppEvent::ToggleTheme).unwrap();
        assert_eq!(load_theme(&app.conn).unwrap(), Some(ThemePreference::Light));
        assert_ne!(app.theme().toggle_icon(), icon);

        app.handle_event(AppEvent::ToggleTheme).unwrap();
        assert_eq!(load_theme(&app.conn).unwrap(), Some(ThemePreference::Dark));
        assert_eq!(app.theme().toggle_icon(), icon);
    }

    #[test]
    fn stored_theme_wins_over_system_theme() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        save_theme(&conn, ThemePreference::Light).unwrap();
        let app = App::new(conn, &Config::default(), Some(ThemePreference::Dark)).unwrap();
        assert_eq!(app.theme(), ThemePreference::Light);
    }

    fn app_with_results(api: &mut MockRecommendationApi) -> App {
        api.expect_recommend().returning(|_| {
            Ok(RecommendOutcome::Found(vec![
                record("One", 0.9),
                record("Two", 0.8),
                record("Three", 0.7),
                record("Four", 0.6),
            ]))
        });
        let mut app = test_app();
        search(&mut app, api, "Naruto");
        app
    }

    #[test]
    fn modal_locks_and_restores_scrolling() {
        let mut api = MockRecommendationApi::new();
        api.expect_probe_image().returning(|_| Ok(()));
        let mut app = app_with_results(&mut api);
        assert!(!app.scroll.is_locked());

        let commands = app.handle_event(AppEvent::CardClicked(1)).unwrap();
        assert!(app.scroll.is_locked());
        assert_eq!(app.modal.as_ref().unwrap().title, "Two");
        assert_eq!(
            commands,
            [Command::ProbeImage {
                search: RequestId(1),
                card: 1,
                url: "https://example.com/Two.jpg".into(),
            }]
        );

        app.handle_event(AppEvent::Navigate(1)).unwrap();
        assert_eq!(app.selected, 1);

        app.handle_event(AppEvent::Escape).unwrap();
        assert!(app.modal.is_none());
        assert!(!app.scroll.is_locked());

        app.handle_event(AppEvent::Navigate(1)).unwrap();
        assert_eq!(app.selected, 2);
    }

    #[test]
    fn click_outside_modal_closes_it() {
        let mut api = MockRecommendationApi::new();
        let mut app = app_with_results(&mut api);
        app.handle_event(AppEvent::CardClicked(0)).unwrap();

        app.handle_event(AppEvent::Click { column: 45, row: 20 }).unwrap();
        assert!(app.modal.is_some());

        app.handle_event(AppEvent::Click { column: 0, row: 0 }).unwrap();
        assert!(app.modal.is_none());
        assert!(!app.scroll.is_locked());
    }

    #[test]
    fn clicking_a_card_opens_its_details() {
        let mut api = MockRecommendationApi::new();
        let mut app = app_with_results(&mut api);
        app.handle_event(AppEvent::Click { column: 31, row: 9 }).unwrap();
        assert_eq!(app.modal.as_ref().unwrap().title, "Two");
    }

    #[test]
    fn failed_image_probe_falls_back_in_card_and_modal() {
        let mut api = MockRecommendationApi::new();
        api.expect_probe_image()
            .returning(|_| Err(ApiError::Status(404)));
        let mut app = app_with_results(&mut api);

        let commands = app.handle_event(AppEvent::CardClicked(0)).unwrap();
        drive(&mut app, &api, commands);

        assert_eq!(app.modal.as_ref().unwrap().image_src, FALLBACK_IMAGE_PATH);
        assert_eq!(
            app.panel.results().unwrap().cards[0].image.src(),
            FALLBACK_IMAGE_PATH
        );
        assert_eq!(
            app.panel.results().unwrap().cards[1].image.src(),
            "https://example.com/Two.jpg"
        );
    }

    #[test]
    fn stale_image_failure_is_ignored() {
        let mut api = MockRecommendationApi::new();
        let mut app = app_with_results(&mut api);
        app.handle_event(AppEvent::ImageChecked {
            search: RequestId(99),
            card: 0,
            outcome: Err(ApiError::Status(404)),
        })
        .unwrap();
        assert!(!app.panel.results().unwrap().cards[0].image.is_fallback());
    }

    #[test]
    fn visible_cards_get_revealed() {
        let mut api = MockRecommendationApi::new();
        let mut app = app_with_results(&mut api);
        let unseen = app.unseen_visible_cards();
        assert_eq!(unseen, [0, 1, 2, 3]);
        for index in unseen {
            app.handle_event(AppEvent::IntersectionVisible(index)).unwrap();
        }
        assert!(app.unseen_visible_cards().is_empty());
    }

    #[test]
    fn refresh_success_pushes_notification() {
        let mut api = MockRecommendationApi::new();
        api.expect_refresh_data()
            .withf(|pages| *pages == 10)
            .returning(|_| {
                Ok(FetchResponse {
                    message: "Fetched manga data".into(),
                })
            });
        let mut app = test_app();

        let commands = app.handle_event(AppEvent::RefreshData).unwrap();
        assert!(app.panel.is_loading());
        drive(&mut app, &api, commands);

        let now = Instant::now();
        let messages: Vec<_> = app
            .notifications
            .live(now)
            .map(|(n, _)| n.message.clone())
            .collect();
        assert_eq!(
            messages,
            ["Database updated successfully! Fetched manga data"]
        );
        assert!(!app.panel.is_loading());
    }

    #[test]
    fn refresh_failure_shows_error() {
        let mut api = MockRecommendationApi::new();
        api.expect_refresh_data()
            .returning(|_| Err(ApiError::Status(500)));
        let mut app = test_app();

        let commands = app.fetch_data(3);
        drive(&mut app, &api, commands);
        assert_eq!(
            app.panel.error_message(),
            Some("Error updating database: HTTP error! status: 500")
        );
        assert!(!app.panel.is_loading());
    }

    #[test]
    fn random_search_uses_a_popular_title() {
        let mut app = test_app();
        let commands = app.random_recommendations();
        let [Command::Recommend { query, .. }] = commands.as_slice() else {
            panic!("expected one recommend command");
        };
        assert!(POPULAR_TITLES.contains(&query.title.as_str()));
        assert_eq!(query.count, 10);
        assert_eq!(app.form.title, query.title);
    }

    #[test]
    fn invalid_count_is_rejected_before_request() {
        let mut api = MockRecommendationApi::new();
        api.expect_recommend().times(0);
        let mut app = test_app();
        app.form.count = "50".into();

        search(&mut app, &api, "Naruto");
        assert_eq!(
            app.panel.error_message(),
            Some("Count must be between 1 and 20")
        );
    }

    #[test]
    fn keys_route_by_focus() {
        let mut app = test_app();
        assert!(matches!(
            app.map_key(KeyCode::Char('q')),
            Some(AppEvent::FormInput(FormInput::Char('q')))
        ));
        app.handle_event(AppEvent::Escape).unwrap();
        assert!(matches!(app.map_key(KeyCode::Char('q')), Some(AppEvent::Quit)));
        assert!(matches!(
            app.map_key(KeyCode::Char('t')),
            Some(AppEvent::ToggleTheme)
        ));
    }
}
