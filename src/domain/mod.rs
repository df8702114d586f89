//! Domain types for coverbadge.
//!
//! - Coverage: the command that produces a report and the value read from it
//! - Badge: style, format and URL of the rendered badge

mod badge;
mod coverage;

pub use badge::{badge_color, BadgeSpec, BadgeStyle, ImageFormat};
pub use coverage::{CommandSource, CoverageCommand, CoverageValue};
