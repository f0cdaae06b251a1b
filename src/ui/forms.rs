use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::error::{ApiError, ApiResult};
use crate::models::{MAX_COUNT, MAX_TITLE_LEN};

use super::theme::Palette;

/// Search form state: the title being typed plus an optional result count.
#[derive(Default, Clone)]
pub(crate) struct SearchForm {
    pub(crate) title: String,
    pub(crate) count: String,
    pub(crate) active: SearchField,
}

/// Fields available within the search form.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum SearchField {
    #[default]
    Title,
    Count,
}

impl SearchForm {
    /// Swap focus between the title and count fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            SearchField::Title => SearchField::Count,
            SearchField::Count => SearchField::Title,
        };
    }

    /// Append a character to the active field. Count only takes digits and
    /// the title stops at the length the service accepts.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            SearchField::Count => {
                if ch.is_ascii_digit() && self.count.len() < 3 {
                    self.count.push(ch);
                    true
                } else {
                    false
                }
            }
            SearchField::Title => {
                if ch.is_control() || self.title.chars().count() >= MAX_TITLE_LEN {
                    false
                } else {
                    self.title.push(ch);
                    true
                }
            }
        }
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            SearchField::Title => {
                self.title.pop();
            }
            SearchField::Count => {
                self.count.pop();
            }
        }
    }

    /// Replace the title, as the random-title shortcut does.
    pub(crate) fn set_title(&mut self, title: &str) {
        self.title = title.chars().take(MAX_TITLE_LEN).collect();
    }

    /// Result count to request. A blank field means `default`.
    pub(crate) fn count(&self, default: u32) -> ApiResult<u32> {
        let raw = self.count.trim();
        if raw.is_empty() {
            return Ok(default);
        }
        let count: u32 = raw.parse().map_err(|_| ApiError::InvalidCount)?;
        if (1..=MAX_COUNT).contains(&count) {
            Ok(count)
        } else {
            Err(ApiError::InvalidCount)
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(
        &self,
        field_name: &str,
        field: SearchField,
        placeholder: &str,
        palette: &Palette,
        focused: bool,
    ) -> Line<'static> {
        let value = match field {
            SearchField::Title => &self.title,
            SearchField::Count => &self.count,
        };
        let is_active = focused && self.active == field;

        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.clone()
        };

        let style = if value.is_empty() {
            palette.muted()
        } else if is_active {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.foreground)
        };

        Line::from(vec![
            Span::styled(format!("{field_name}: "), palette.muted()),
            Span::styled(display, style),
        ])
    }

    /// Return the character count for the requested field.
    pub(crate) fn value_len(&self, field: SearchField) -> usize {
        match field {
            SearchField::Title => self.title.chars().count(),
            SearchField::Count => self.count.chars().count(),
        }
    }
}
