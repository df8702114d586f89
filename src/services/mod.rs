//! Infrastructure services for coverbadge.
//!
//! This module contains:
//! - ProcessService: running the coverage command under a shell
//! - CoverageExtractor / CoverageRun: finding the coverage total in its output
//! - BadgeService: fetching the badge image
//! - MarkdownPatcher: updating badge lines in text files

mod badge;
pub mod extractor;
mod markdown;
pub mod process;

pub use badge::BadgeService;
pub use extractor::{ConsoleEcho, CoverageExtractor, CoverageRun, LineEcho, LineOutcome};
pub use markdown::{marker_line, MarkdownPatcher, PatchOutcome, BADGE_MARKER};
pub use process::{OutputLines, ProcessHandle, ProcessService};
