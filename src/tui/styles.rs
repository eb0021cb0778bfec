//! Clinic colour palette and preset styles.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::RiskLevel;

/// Colour palette for the SLECare screens.
pub struct MedicalTheme;

impl MedicalTheme {
    /// Deep teal
    pub const PRIMARY: Color = Color::Rgb(13, 148, 136);
    pub const PRIMARY_LIGHT: Color = Color::Rgb(45, 212, 191);
    pub const PRIMARY_DARK: Color = Color::Rgb(15, 118, 110);

    pub const BORDER: Color = Color::Rgb(148, 163, 184);

    pub const SUCCESS: Color = Color::Rgb(16, 185, 129);
    pub const WARNING: Color = Color::Rgb(251, 191, 36);
    pub const DANGER: Color = Color::Rgb(244, 63, 94);

    /// Contribution pushing the model output up
    pub const PUSH_UP: Color = Color::Rgb(255, 0, 81);
    /// Contribution pushing the model output down
    pub const PUSH_DOWN: Color = Color::Rgb(0, 139, 251);

    pub const BG_DARK: Color = Color::Rgb(15, 23, 42);

    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252);
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184);
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139);

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// Highlighted option in a radio row
    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::BG_DARK)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Control switched off by a missingness flag
    #[must_use]
    pub fn disabled() -> Style {
        Style::default()
            .fg(Self::TEXT_MUTED)
            .add_modifier(Modifier::DIM | Modifier::ITALIC)
    }

    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn risk_level(level: RiskLevel) -> Style {
        match level {
            RiskLevel::Low => Self::success(),
            RiskLevel::High => Self::danger(),
        }
    }

    /// Colour for a signed attribution.
    #[must_use]
    pub fn contribution(value: f64) -> Style {
        if value >= 0.0 {
            Style::default().fg(Self::PUSH_UP)
        } else {
            Style::default().fg(Self::PUSH_DOWN)
        }
    }

    /// Unsigned magnitude bars in the feature ranking.
    #[must_use]
    pub fn primary_bar() -> Style {
        Style::default().fg(Self::PUSH_DOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribution_colour_follows_sign() {
        assert_eq!(MedicalTheme::contribution(0.4).fg, Some(MedicalTheme::PUSH_UP));
        assert_eq!(MedicalTheme::contribution(-0.4).fg, Some(MedicalTheme::PUSH_DOWN));
    }

    #[test]
    fn test_primary_bar_uses_magnitude_colour() {
        assert_eq!(MedicalTheme::primary_bar().fg, Some(MedicalTheme::PUSH_DOWN));
    }
}
