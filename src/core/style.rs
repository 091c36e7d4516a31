//! ANSI styling of individual tokens

use super::level::{DEFCON, HTTP, NPM, PYTHON, SYSLOG};
use colored::{Color, ColoredString, Colorize};
use std::collections::HashMap;

/// Foreground, background and font styles for one token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSpec {
    pub color: Option<String>,
    pub background: Option<String>,
    pub fonts: Vec<String>,
}

impl StyleSpec {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.background.is_none() && self.fonts.is_empty()
    }
}

/// Wrap `text` in the escape codes described by `spec`.
///
/// Unknown colour or font names are ignored.
#[must_use]
pub fn apply(text: &str, spec: &StyleSpec) -> String {
    if spec.is_empty() {
        return text.to_string();
    }

    let mut styled: ColoredString = text.normal();
    if let Some(color) = spec.color.as_deref().and_then(parse_color) {
        styled = styled.color(color);
    }
    if let Some(background) = spec.background.as_deref().and_then(parse_color) {
        styled = styled.on_color(background);
    }
    for font in &spec.fonts {
        styled = match font.as_str() {
            "bold" => styled.bold(),
            "dim" | "dimmed" => styled.dimmed(),
            "italic" => styled.italic(),
            "underline" => styled.underline(),
            "blink" => styled.blink(),
            "inverse" | "reversed" => styled.reversed(),
            "hidden" => styled.hidden(),
            "strikethrough" => styled.strikethrough(),
            _ => styled,
        };
    }
    styled.to_string()
}

#[must_use]
pub fn parse_color(name: &str) -> Option<Color> {
    name.parse::<Color>().ok()
}

/// Default level colours for the built-in mappers
#[must_use]
pub fn default_color_map(mapper: &str) -> HashMap<String, String> {
    let table: &[(&str, &str)] = match mapper {
        NPM => &[
            ("error", "red"),
            ("warn", "yellow"),
            ("info", "green"),
            ("http", "cyan"),
            ("verbose", "blue"),
            ("debug", "magenta"),
            ("silly", "white"),
        ],
        HTTP => &[
            ("info", "white"),
            ("success", "green"),
            ("redirect", "cyan"),
            ("clientError", "yellow"),
            ("serverError", "red"),
        ],
        SYSLOG => &[
            ("emerg", "bright red"),
            ("alert", "red"),
            ("crit", "red"),
            ("error", "red"),
            ("warning", "yellow"),
            ("notice", "cyan"),
            ("info", "green"),
            ("debug", "blue"),
        ],
        PYTHON => &[
            ("debug", "blue"),
            ("info", "green"),
            ("warning", "yellow"),
            ("error", "red"),
            ("critical", "bright red"),
        ],
        DEFCON => &[
            ("defcon1", "red"),
            ("defcon2", "bright red"),
            ("defcon3", "yellow"),
            ("defcon4", "green"),
            ("defcon5", "blue"),
        ],
        _ => &[],
    };
    table
        .iter()
        .map(|(level, color)| ((*level).to_string(), (*color).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_spec_is_passthrough() {
        assert_eq!(apply("info", &StyleSpec::default()), "info");
    }

    #[test]
    fn test_styled_text_keeps_content() {
        let spec = StyleSpec {
            color: Some("red".to_string()),
            background: Some("white".to_string()),
            fonts: vec!["bold".to_string()],
        };
        assert!(apply("error", &spec).contains("error"));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("bright blue"), Some(Color::BrightBlue));
        assert_eq!(parse_color("no-such-colour"), None);
    }

    #[test]
    fn test_default_color_maps_cover_levels() {
        let levels = crate::core::level::LevelRegistry::new();
        for mapper in [NPM, HTTP, SYSLOG, PYTHON, DEFCON] {
            let colors = default_color_map(mapper);
            for level in levels.get(mapper).unwrap().level_names() {
                assert!(colors.contains_key(level), "{} missing {}", mapper, level);
            }
        }
        assert!(default_color_map("custom").is_empty());
    }
}
