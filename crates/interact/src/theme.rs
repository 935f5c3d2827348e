use std::io::{self, IsTerminal};

use crossterm::style::Attribute;

/// Styling handed to the engine and its reader at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Theme {
    pub color: bool,
}

impl Theme {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }

    /// Color on when stdout is a terminal and `NO_COLOR` is unset.
    pub fn detect() -> Self {
        Self {
            color: std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal(),
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.color {
            format!("{}{text}{}", Attribute::Dim, Attribute::NormalIntensity)
        } else {
            text.to_string()
        }
    }
}

/// How a reader shows the effective default before anything is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    Dimmed,
    Plain,
}

impl PlaceholderStyle {
    pub fn for_theme(theme: Theme) -> Self {
        if theme.color {
            PlaceholderStyle::Dimmed
        } else {
            PlaceholderStyle::Plain
        }
    }

    pub fn render(&self, theme: &Theme, placeholder: &str) -> String {
        let text = format!("({placeholder})");
        match self {
            PlaceholderStyle::Dimmed => theme.dim(&text),
            PlaceholderStyle::Plain => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_leaves_text_alone() {
        assert_eq!(Theme::plain().dim("  - note"), "  - note");
        assert_eq!(
            PlaceholderStyle::Plain.render(&Theme::plain(), "my-app"),
            "(my-app)"
        );
    }

    #[test]
    fn colored_theme_wraps_in_escape_codes() {
        let dimmed = Theme::colored().dim("(Yes/No)");
        assert!(dimmed.contains("(Yes/No)"));
        assert!(dimmed.starts_with('\u{1b}'));
    }
}
