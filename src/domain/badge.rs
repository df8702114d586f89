//! Badge description: style, image format and the badge service URL.

use super::CoverageValue;
use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Visual style understood by the badge service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStyle {
    Plastic,
    Flat,
    FlatSquare,
    ForTheBadge,
    Social,
}

impl BadgeStyle {
    /// Every accepted style, in display order
    pub const ALL: [BadgeStyle; 5] = [
        Self::Plastic,
        Self::Flat,
        Self::FlatSquare,
        Self::ForTheBadge,
        Self::Social,
    ];

    /// Name used on the command line and in the badge URL
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plastic => "plastic",
            Self::Flat => "flat",
            Self::FlatSquare => "flat-square",
            Self::ForTheBadge => "for-the-badge",
            Self::Social => "social",
        }
    }

    fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for BadgeStyle {
    fn default() -> Self {
        Self::Flat
    }
}

impl FromStr for BadgeStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidStyle {
                given: s.to_string(),
                allowed: Self::allowed_list(),
            })
    }
}

impl fmt::Display for BadgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Image format of the rendered badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
        }
    }
}

/// Badge colour for a coverage percentage
pub fn badge_color(coverage: CoverageValue) -> &'static str {
    const THRESHOLDS: [(f64, &str); 5] = [
        (95.0, "brightgreen"),
        (80.0, "green"),
        (65.0, "yellowgreen"),
        (50.0, "yellow"),
        (35.0, "orange"),
    ];

    THRESHOLDS
        .iter()
        .find(|(min, _)| coverage.percent() >= *min)
        .map(|(_, color)| *color)
        .unwrap_or("red")
}

/// Escape a label for a static badge path segment
fn escape_label(label: &str) -> String {
    label
        .replace('-', "--")
        .replace('_', "__")
        .replace(' ', "%20")
}

/// Everything needed to render a badge besides the coverage value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeSpec {
    /// Text preceding the percentage
    pub prefix: String,
    /// Visual style
    pub style: BadgeStyle,
    /// Image format
    pub format: ImageFormat,
}

impl BadgeSpec {
    pub fn new(prefix: impl Into<String>, style: BadgeStyle) -> Self {
        Self {
            prefix: prefix.into(),
            style,
            format: ImageFormat::Png,
        }
    }

    /// Badge URL on the service rooted at `endpoint`
    pub fn url(&self, endpoint: &str, coverage: CoverageValue) -> String {
        format!(
            "{}/{}-{}%25-{}.{}?style={}",
            endpoint.trim_end_matches('/'),
            escape_label(&self.prefix),
            coverage.rounded(),
            badge_color(coverage),
            self.format.extension(),
            self.style
        )
    }
}
