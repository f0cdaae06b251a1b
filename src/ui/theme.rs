use ratatui::style::{Color, Modifier, Style};

use crate::models::ThemePreference;

/// Terminal colors for one theme. Everything the draw code styles goes
/// through here so a toggle repaints the whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Palette {
    pub(crate) background: Color,
    pub(crate) foreground: Color,
    pub(crate) accent: Color,
    pub(crate) muted: Color,
    pub(crate) border: Color,
    pub(crate) badge: Color,
    pub(crate) genre: Color,
    pub(crate) theme_tag: Color,
    pub(crate) error: Color,
    pub(crate) success: Color,
}

const LIGHT: Palette = Palette {
    background: Color::Rgb(0xf5, 0xf5, 0xf7),
    foreground: Color::Rgb(0x1c, 0x1b, 0x1f),
    accent: Color::Rgb(0x67, 0x50, 0xa4),
    muted: Color::Rgb(0x79, 0x74, 0x7e),
    border: Color::Rgb(0xc4, 0xc0, 0xcc),
    badge: Color::Rgb(0xe9, 0x45, 0x60),
    genre: Color::Rgb(0x2b, 0x6c, 0xb0),
    theme_tag: Color::Rgb(0x2f, 0x85, 0x5a),
    error: Color::Rgb(0xba, 0x1a, 0x1a),
    success: Color::Rgb(0x02, 0x9c, 0x76),
};

const DARK: Palette = Palette {
    background: Color::Rgb(0x12, 0x12, 0x18),
    foreground: Color::Rgb(0xe6, 0xe1, 0xe5),
    accent: Color::Rgb(0xd0, 0xbc, 0xff),
    muted: Color::Rgb(0x93, 0x8f, 0x99),
    border: Color::Rgb(0x49, 0x45, 0x4f),
    badge: Color::Rgb(0xff, 0x6b, 0x81),
    genre: Color::Rgb(0x90, 0xcd, 0xf4),
    theme_tag: Color::Rgb(0x9a, 0xe6, 0xb4),
    error: Color::Rgb(0xff, 0xb4, 0xab),
    success: Color::Rgb(0x5c, 0xd6, 0xae),
};

impl Palette {
    pub(crate) fn for_theme(theme: ThemePreference) -> &'static Palette {
        match theme {
            ThemePreference::Dark => &DARK,
            ThemePreference::Light => &LIGHT,
        }
    }

    pub(crate) fn base(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub(crate) fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub(crate) fn heading(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}

/// Pick the starting theme: an explicit stored choice wins, then the system
/// preference, then light.
pub(crate) fn resolve_theme(
    stored: Option<ThemePreference>,
    system: Option<ThemePreference>,
) -> ThemePreference {
    stored.or(system).unwrap_or_default()
}

/// Best-effort read of the terminal's color scheme from `COLORFGBG`.
pub fn detect_system_theme() -> Option<ThemePreference> {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| parse_colorfgbg(&value))
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`). Backgrounds 0-6 and 8
/// are the dark ANSI colors.
pub(crate) fn parse_colorfgbg(value: &str) -> Option<ThemePreference> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match background {
        0..=6 | 8 => Some(ThemePreference::Dark),
        7 | 9..=15 => Some(ThemePreference::Light),
        _ => None,
    }
}
