//! Turns recommendation records into the card and detail view models the
//! frame is drawn from. Records are untrusted input: every optional or empty
//! field has a defined fallback, and text is only ever placed into spans, so
//! nothing in a record can alter the layout around it.

use std::time::{Duration, Instant};

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use reqwest::Url;

use crate::api::FALLBACK_IMAGE_PATH;
use crate::models::RecommendationRecord;

use super::events::RequestId;
use super::theme::Palette;

/// Delay added per card so cards appear one after another.
pub(crate) const STAGGER_STEP: Duration = Duration::from_millis(100);

pub(crate) const NO_GENRES: &str = "No genres";
pub(crate) const NO_THEMES: &str = "No themes";
pub(crate) const NO_GENRES_DETAIL: &str = "No genres available";
pub(crate) const NO_THEMES_DETAIL: &str = "No themes available";

/// Badge text for a score: percentage rounded to one decimal, with exact
/// halves rounded up.
pub(crate) fn format_score(score: f64) -> String {
    let percent = score * 100.0;
    // An exact tie at one decimal is an odd multiple of 0.25; `{:.1}` alone
    // would round it to even.
    let quarters = percent * 4.0;
    let rounded = if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        (percent.abs() * 10.0).ceil().copysign(percent) / 10.0
    } else {
        percent
    };
    format!("{rounded:.1}%")
}

pub(crate) fn results_heading(search_title: &str) -> String {
    format!("Recommendations for \"{search_title}\"")
}

/// A genre or theme chip on a card. Placeholder tags stand in for an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag {
    pub(crate) label: String,
    pub(crate) placeholder: bool,
}

fn build_tags(values: &[String], placeholder: &str) -> Vec<Tag> {
    if values.is_empty() {
        return vec![Tag {
            label: placeholder.to_string(),
            placeholder: true,
        }];
    }
    values
        .iter()
        .map(|value| Tag {
            label: value.clone(),
            placeholder: false,
        })
        .collect()
}

/// Image source for a card, with the fallback applied both when the record
/// has no image and when loading the image failed later on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageSlot {
    primary: Option<String>,
    failed: bool,
}

impl ImageSlot {
    pub(crate) fn new(url: Option<&str>) -> Self {
        let primary = url.map(str::to_string);
        let failed = primary
            .as_deref()
            .is_some_and(|url| Url::parse(url).is_err());
        Self { primary, failed }
    }

    pub(crate) fn src(&self) -> &str {
        match &self.primary {
            Some(url) if !self.failed => url,
            _ => FALLBACK_IMAGE_PATH,
        }
    }

    pub(crate) fn is_fallback(&self) -> bool {
        self.src() == FALLBACK_IMAGE_PATH
    }

    /// URL worth checking, if the primary image is still in use.
    pub(crate) fn probe_target(&self) -> Option<&str> {
        match &self.primary {
            Some(url) if !self.failed => Some(url),
            _ => None,
        }
    }

    pub(crate) fn mark_failed(&mut self) {
        self.failed = true;
    }
}

/// View model for one recommendation card.
#[derive(Debug, Clone)]
pub(crate) struct MangaCard {
    pub(crate) record: RecommendationRecord,
    pub(crate) score_label: String,
    pub(crate) image: ImageSlot,
    pub(crate) genres: Vec<Tag>,
    pub(crate) themes: Vec<Tag>,
    pub(crate) animation_delay: Duration,
    /// Set once the card has scrolled into the viewport.
    pub(crate) revealed: bool,
}

pub(crate) fn create_manga_card(record: &RecommendationRecord, index: usize) -> MangaCard {
    MangaCard {
        score_label: format_score(record.score),
        image: ImageSlot::new(record.image_url.as_deref()),
        genres: build_tags(&record.genres, NO_GENRES),
        themes: build_tags(&record.themes, NO_THEMES),
        animation_delay: STAGGER_STEP * index as u32,
        revealed: false,
        record: record.clone(),
    }
}

impl MangaCard {
    /// Whether the card's content should be drawn at `now`.
    pub(crate) fn is_shown(&self, rendered_at: Instant, now: Instant) -> bool {
        self.revealed && now.saturating_duration_since(rendered_at) >= self.animation_delay
    }

    pub(crate) fn lines(&self, palette: &Palette, selected: bool) -> Vec<Line<'static>> {
        let title_style = if selected {
            palette.heading()
        } else {
            Style::default()
                .fg(palette.foreground)
                .add_modifier(Modifier::BOLD)
        };
        let image_style = if self.image.is_fallback() {
            palette.muted().add_modifier(Modifier::ITALIC)
        } else {
            palette.muted()
        };

        vec![
            Line::from(vec![
                Span::styled(
                    format!(" {} ", self.score_label),
                    Style::default()
                        .fg(palette.background)
                        .bg(palette.badge)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(self.record.title.clone(), title_style),
            ]),
            Line::from(Span::styled(self.image.src().to_string(), image_style)),
            tag_line(&self.genres, "◆", palette.genre, palette),
            tag_line(&self.themes, "◇", palette.theme_tag, palette),
        ]
    }
}

fn tag_line(tags: &[Tag], icon: &str, color: Color, palette: &Palette) -> Line<'static> {
    let mut spans = Vec::with_capacity(tags.len() * 2);
    for tag in tags {
        if tag.placeholder {
            spans.push(Span::styled(tag.label.clone(), palette.muted()));
        } else {
            spans.push(Span::styled(
                format!("{icon} {}", tag.label),
                Style::default().fg(color),
            ));
        }
        spans.push(Span::raw("  "));
    }
    spans.pop();
    Line::from(spans)
}

/// Detail modal contents for one card.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MangaDetails {
    pub(crate) card: usize,
    pub(crate) title: String,
    pub(crate) score_label: String,
    pub(crate) image_src: String,
    pub(crate) genres: Vec<String>,
    pub(crate) themes: Vec<String>,
}

pub(crate) fn show_manga_details(card: &MangaCard, index: usize) -> MangaDetails {
    MangaDetails {
        card: index,
        title: card.record.title.clone(),
        score_label: format!("{} Match", card.score_label),
        image_src: card.image.src().to_string(),
        genres: card.record.genres.clone(),
        themes: card.record.themes.clone(),
    }
}

impl MangaDetails {
    pub(crate) fn genre_text(&self) -> String {
        join_or(&self.genres, NO_GENRES_DETAIL)
    }

    pub(crate) fn theme_text(&self) -> String {
        join_or(&self.themes, NO_THEMES_DETAIL)
    }
}

fn join_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}

/// Cards currently on screen plus the search they answer.
#[derive(Debug, Clone)]
pub(crate) struct RenderedResults {
    pub(crate) search: RequestId,
    pub(crate) heading: String,
    pub(crate) cards: Vec<MangaCard>,
    pub(crate) rendered_at: Instant,
}

/// Build a fresh result set. Previous cards are never carried over.
pub(crate) fn display_recommendations(
    records: &[RecommendationRecord],
    search_title: &str,
    search: RequestId,
    now: Instant,
) -> RenderedResults {
    RenderedResults {
        search,
        heading: results_heading(search_title),
        cards: records
            .iter()
            .enumerate()
            .map(|(index, record)| create_manga_card(record, index))
            .collect(),
        rendered_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, score: f64) -> RecommendationRecord {
        RecommendationRecord {
            title: title.to_string(),
            score,
            genres: vec!["Action".into(), "Adventure".into()],
            themes: vec!["Martial Arts".into()],
            image_url: Some("https://example.com/naruto.jpg".into()),
        }
    }

    #[test]
    fn score_rounds_to_one_decimal() {
        assert_eq!(format_score(0.8567), "85.7%");
        assert_eq!(format_score(1.0), "100.0%");
        assert_eq!(format_score(0.0), "0.0%");
        assert_eq!(format_score(1.3421), "134.2%");
    }

    #[test]
    fn score_ties_round_up() {
        assert_eq!(format_score(0.0025), "0.3%");
        assert_eq!(format_score(0.0125), "1.3%");
        assert_eq!(format_score(0.0225), "2.3%");
        assert_eq!(format_score(0.5), "50.0%");
    }

    #[test]
    fn missing_image_uses_fallback() {
        let mut rec = record("Bleach", 0.5);
        rec.image_url = None;
        let card = create_manga_card(&rec, 0);
        assert_eq!(card.image.src(), FALLBACK_IMAGE_PATH);
        assert_eq!(card.image.probe_target(), None);
    }

    #[test]
    fn failed_image_switches_to_fallback() {
        let mut card = create_manga_card(&record("Bleach", 0.5), 0);
        assert_eq!(card.image.src(), "https://example.com/naruto.jpg");
        card.image.mark_failed();
        assert_eq!(card.image.src(), FALLBACK_IMAGE_PATH);
    }

    #[test]
    fn unparseable_image_url_fails_immediately() {
        let slot = ImageSlot::new(Some("not a url"));
        assert_eq!(slot.src(), FALLBACK_IMAGE_PATH);
    }

    #[test]
    fn empty_tag_lists_render_single_placeholder() {
        let mut rec = record("Berserk", 0.3);
        rec.genres.clear();
        rec.themes.clear();
        let card = create_manga_card(&rec, 0);
        assert_eq!(
            card.genres,
            vec![Tag {
                label: NO_GENRES.into(),
                placeholder: true
            }]
        );
        assert_eq!(
            card.themes,
            vec![Tag {
                label: NO_THEMES.into(),
                placeholder: true
            }]
        );

        let details = show_manga_details(&card, 0);
        assert_eq!(details.genre_text(), NO_GENRES_DETAIL);
        assert_eq!(details.theme_text(), NO_THEMES_DETAIL);
    }

    #[test]
    fn cards_keep_input_order_and_stagger() {
        let records = vec![record("One", 0.9), record("Two", 0.8), record("Three", 0.7)];
        let results = display_recommendations(&records, "Naruto", RequestId(1), Instant::now());
        let titles: Vec<_> = results.cards.iter().map(|c| c.record.title.as_str()).collect();
        assert_eq!(titles, ["One", "Two", "Three"]);
        assert_eq!(results.cards[2].animation_delay, Duration::from_millis(200));
        assert_eq!(results.heading, "Recommendations for \"Naruto\"");
    }

    #[test]
    fn card_shows_after_reveal_and_delay() {
        let start = Instant::now();
        let mut card = create_manga_card(&record("Two", 0.8), 1);
        assert!(!card.is_shown(start, start + Duration::from_secs(1)));
        card.revealed = true;
        assert!(!card.is_shown(start, start + Duration::from_millis(50)));
        assert!(card.is_shown(start, start + Duration::from_millis(100)));
    }

    #[test]
    fn details_use_match_suffix() {
        let card = create_manga_card(&record("Naruto", 0.5), 0);
        let details = show_manga_details(&card, 0);
        assert_eq!(details.score_label, "50.0% Match");
        assert_eq!(details.genre_text(), "Action, Adventure");
    }
}
