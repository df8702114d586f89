//! Markdown patching: keeps a badge marker line in text files up to date.

use crate::error::{MarkdownError, MarkdownResult};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Alt text identifying the managed badge line
pub const BADGE_MARKER: &str = "coverage-badge-do-not-edit";

/// What patching did to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Existing marker lines were rewritten
    Replaced(usize),
    /// No marker existed; one was added at the top
    Inserted,
    /// File already carried the same badge
    Unchanged,
}

/// Markdown image line for a badge URL
pub fn marker_line(badge_url: &str) -> String {
    format!("![{}]({})", BADGE_MARKER, badge_url)
}

/// Replaces or inserts the badge marker line
#[derive(Debug, Clone)]
pub struct MarkdownPatcher {
    marker: Regex,
}

impl MarkdownPatcher {
    pub fn new() -> Self {
        let pattern = format!(r"!\[{}\]\([^)]*\)", regex::escape(BADGE_MARKER));
        Self {
            marker: Regex::new(&pattern).expect("badge marker pattern"),
        }
    }

    /// Whether a line carries the badge marker
    pub fn is_marker_line(&self, line: &str) -> bool {
        self.marker.is_match(line)
    }

    /// Patch text in memory.
    ///
    /// Every line carrying a marker is replaced whole, keeping its line ending.
    /// Other lines are left byte-identical.
    pub fn patch_content(&self, content: &str, badge_url: &str) -> (String, usize) {
        let new_line = marker_line(badge_url);
        let mut patched = String::with_capacity(content.len() + new_line.len());
        let mut replaced = 0;

        for segment in content.split_inclusive('\n') {
            let body = segment.trim_end_matches(['\r', '\n']);
            if self.is_marker_line(body) {
                patched.push_str(&new_line);
                patched.push_str(&segment[body.len()..]);
                replaced += 1;
            } else {
                patched.push_str(segment);
            }
        }

        if replaced > 0 {
            return (patched, replaced);
        }

        let inserted = if content.is_empty() {
            format!("{}\n", new_line)
        } else {
            format!("{}\n\n{}", new_line, content)
        };
        (inserted, 0)
    }

    /// Patch a file on disk, writing only when the content changes
    pub fn patch_file(&self, path: &Path, badge_url: &str) -> MarkdownResult<PatchOutcome> {
        let content = fs::read_to_string(path).map_err(|source| MarkdownError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let (patched, replaced) = self.patch_content(&content, badge_url);
        if patched == content {
            tracing::debug!("Badge in {} already up to date", path.display());
            return Ok(PatchOutcome::Unchanged);
        }

        fs::write(path, &patched).map_err(|source| MarkdownError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        if replaced > 0 {
            tracing::info!("Updated badge in {}", path.display());
            Ok(PatchOutcome::Replaced(replaced))
        } else {
            tracing::info!("Inserted badge into {}", path.display());
            Ok(PatchOutcome::Inserted)
        }
    }
}

impl Default for MarkdownPatcher {
    fn default() -> Self {
        Self::new()
    }
}
