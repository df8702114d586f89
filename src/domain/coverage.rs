//! Coverage command and coverage value types.

use std::fmt;

/// Default Go coverage run: test every package, then print a per-function summary.
const DEFAULT_TEST_STEP: &str = "go test ./...";
const DEFAULT_REPORT_STEP: &str = "-coverprofile=coverage.out && go tool cover -func=coverage.out";

/// How a coverage command was derived from the flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSource {
    /// Explicit `covercmd` override. Holds the tags that were ignored, if any.
    Override { ignored_tags: Option<String> },
    /// Default command filtered by build tags
    Tagged(String),
    /// Untagged default command
    Default,
}

/// Shell command line that produces a coverage report on stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageCommand {
    line: String,
    source: CommandSource,
}

impl CoverageCommand {
    /// Build the command from the `covercmd` and `tags` settings.
    ///
    /// An override always wins verbatim; tags only apply to the default command.
    pub fn resolve(covercmd: Option<&str>, tags: Option<&str>) -> Self {
        let covercmd = covercmd.filter(|c| !c.trim().is_empty());
        let tags = tags.filter(|t| !t.trim().is_empty());

        match (covercmd, tags) {
            (Some(cmd), tags) => Self {
                line: cmd.to_string(),
                source: CommandSource::Override {
                    ignored_tags: tags.map(str::to_string),
                },
            },
            (None, Some(tags)) => Self {
                line: format!(
                    "{} -tags \"{}\" {}",
                    DEFAULT_TEST_STEP, tags, DEFAULT_REPORT_STEP
                ),
                source: CommandSource::Tagged(tags.to_string()),
            },
            (None, None) => Self {
                line: format!("{} {}", DEFAULT_TEST_STEP, DEFAULT_REPORT_STEP),
                source: CommandSource::Default,
            },
        }
    }

    /// The shell command line
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// How this command was derived
    pub fn source(&self) -> &CommandSource {
        &self.source
    }

    /// Tags that were given but ignored because of an override
    pub fn ignored_tags(&self) -> Option<&str> {
        match &self.source {
            CommandSource::Override { ignored_tags } => ignored_tags.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for CoverageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line)
    }
}

/// A coverage percentage.
///
/// Nominally in `[0, 100]`, but values are not clamped: a manually supplied
/// `-5` or `120` is carried through as given.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CoverageValue(f64);

impl CoverageValue {
    pub fn new(percent: f64) -> Self {
        Self(percent)
    }

    pub fn percent(&self) -> f64 {
        self.0
    }

    /// Whether the value lies in the nominal percentage range
    pub fn in_range(&self) -> bool {
        (0.0..=100.0).contains(&self.0)
    }

    /// False for NaN and infinities, which only a manual value can carry
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    /// Percentage rounded to a whole number for display
    pub fn rounded(&self) -> i64 {
        self.0.round() as i64
    }
}

impl fmt::Display for CoverageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cmd = CoverageCommand::resolve(None, None);
        assert_eq!(
            cmd.as_str(),
            "go test ./... -coverprofile=coverage.out && go tool cover -func=coverage.out"
        );
        assert_eq!(cmd.source(), &CommandSource::Default);
    }

    #[test]
    fn test_tagged_command() {
        let cmd = CoverageCommand::resolve(None, Some("integration unit"));
        assert_eq!(
            cmd.as_str(),
            "go test ./... -tags \"integration unit\" -coverprofile=coverage.out && go tool cover -func=coverage.out"
        );
        assert_eq!(
            cmd.source(),
            &CommandSource::Tagged("integration unit".to_string())
        );
    }

    #[test]
    fn test_override_wins_over_tags() {
        let cmd = CoverageCommand::resolve(Some("make cover"), Some("integration"));
        assert_eq!(cmd.as_str(), "make cover");
        assert_eq!(cmd.ignored_tags(), Some("integration"));
    }

    #[test]
    fn test_override_without_tags() {
        let cmd = CoverageCommand::resolve(Some("make cover"), Some(""));
        assert_eq!(cmd.as_str(), "make cover");
        assert_eq!(cmd.ignored_tags(), None);
    }

    #[test]
    fn test_blank_override_falls_back_to_default() {
        let cmd = CoverageCommand::resolve(Some("  "), None);
        assert_eq!(cmd.source(), &CommandSource::Default);
    }

    #[test]
    fn test_coverage_value_not_clamped() {
        assert_eq!(CoverageValue::new(120.0).percent(), 120.0);
        assert!(!CoverageValue::new(120.0).in_range());
        assert!(!CoverageValue::new(-3.0).in_range());
        assert!(CoverageValue::new(87.5).in_range());
        assert_eq!(CoverageValue::new(87.5).rounded(), 88);
    }

    #[test]
    fn test_coverage_value_finiteness() {
        assert!(CoverageValue::new(0.0).is_finite());
        assert!(CoverageValue::new(250.0).is_finite());
        assert!(!CoverageValue::new(f64::NAN).is_finite());
        assert!(!CoverageValue::new(f64::INFINITY).is_finite());
        assert!(!CoverageValue::new(f64::NAN).in_range());
    }
}
