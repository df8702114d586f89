//! Application flow: obtain the coverage value, then publish it.

use crate::config::Settings;
use crate::domain::CoverageValue;
use crate::error::{ExtractError, Result};
use crate::services::{
    BadgeService, ConsoleEcho, CoverageRun, LineEcho, MarkdownPatcher, PatchOutcome,
    ProcessService,
};
use std::path::PathBuf;

/// What a run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Coverage value used for the badge
    pub coverage: CoverageValue,
    /// Badge image written, if enabled
    pub badge_path: Option<PathBuf>,
    /// Markdown files and what happened to each
    pub patched: Vec<(PathBuf, PatchOutcome)>,
}

/// Main application state
pub struct App {
    settings: Settings,
    process_service: ProcessService,
    badge_service: BadgeService,
    markdown_patcher: MarkdownPatcher,
}

impl App {
    /// Create a new application instance
    pub fn new(settings: Settings) -> Self {
        let process_service = ProcessService::new(settings.shell.clone());
        let badge_service = BadgeService::new(settings.endpoint.clone());

        if let Some(tags) = settings.command.ignored_tags() {
            tracing::warn!(
                "When the covercmd flag is used the tags flag will be ignored (tags: {})",
                tags
            );
        }

        Self {
            settings,
            process_service,
            badge_service,
            markdown_patcher: MarkdownPatcher::new(),
        }
    }

    /// Resolved settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Obtain the coverage value, write the badge and patch markdown files
    pub async fn run(&self) -> Result<RunSummary> {
        let coverage = self.resolve_coverage().await?;
        if !coverage.is_finite() {
            tracing::warn!("Coverage {} is not a finite number, using it as given", coverage);
        } else if !coverage.in_range() {
            tracing::warn!("Coverage {} is outside 0-100%, using it as given", coverage);
        }

        let badge_path = if self.settings.write_png {
            self.write_badge(coverage).await?;
            Some(self.settings.output.clone())
        } else {
            None
        };

        let patched = self.patch_markdown(coverage)?;

        Ok(RunSummary {
            coverage,
            badge_path,
            patched,
        })
    }

    /// Manual coverage if given, otherwise run the coverage command
    pub async fn resolve_coverage(&self) -> Result<CoverageValue> {
        if let Some(coverage) = self.settings.manual_coverage {
            tracing::info!("Using manual coverage {}", coverage);
            return Ok(coverage);
        }
        self.measure_coverage(ConsoleEcho::stdout()).await
    }

    /// Run the coverage command and read the total from its output
    pub async fn measure_coverage<E>(&self, echo: E) -> Result<CoverageValue>
    where
        E: LineEcho + Send + 'static,
    {
        let command = &self.settings.command;
        let handle = self.process_service.spawn_shell(command.as_str())?;
        let mut run = CoverageRun::start(handle, self.settings.extractor.clone(), echo)?;

        match run.coverage(self.settings.timeout).await {
            Ok(coverage) => {
                let status = run.finish(self.settings.timeout).await?;
                if !status.success() {
                    tracing::warn!("Coverage command exited with {}", status);
                }
                tracing::info!("Found coverage = {}", coverage);
                Ok(coverage)
            }
            Err(ExtractError::Timeout(limit)) => {
                run.abort();
                Err(ExtractError::Timeout(limit).into())
            }
            Err(e) => {
                if let Err(reap) = run.finish(self.settings.timeout).await {
                    tracing::warn!("Failed reaping coverage command: {}", reap);
                }
                Err(e.into())
            }
        }
    }

    /// Download the badge image to the configured output path
    pub async fn write_badge(&self, coverage: CoverageValue) -> Result<()> {
        self.badge_service
            .download(&self.settings.badge, coverage, &self.settings.output)
            .await?;
        Ok(())
    }

    /// Update the badge marker line in every configured file
    pub fn patch_markdown(&self, coverage: CoverageValue) -> Result<Vec<(PathBuf, PatchOutcome)>> {
        let badge_url = self.badge_service.badge_url(&self.settings.badge, coverage);

        let mut patched = Vec::with_capacity(self.settings.markdown_files.len());
        for path in &self.settings.markdown_files {
            let outcome = self.markdown_patcher.patch_file(path, &badge_url)?;
            patched.push((path.clone(), outcome));
        }
        Ok(patched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Overrides, ProjectConfig};
    use crate::error::AppError;
    use crate::services::marker_line;
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct QuietEcho;

    impl LineEcho for QuietEcho {
        fn plain(&mut self, _line: &str) {}
        fn total(&mut self, _line: &str) {}
    }

    /// Log sink shared between a test and its subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
            let sink = self.clone();
            tracing_subscriber::fmt()
                .with_writer(move || sink.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::WARN)
                .finish()
        }

        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn settings(overrides: Overrides) -> Settings {
        let mut config = ProjectConfig::default();
        config.command.shell = "sh".to_string();
        Settings::resolve(config, overrides).unwrap()
    }

    #[tokio::test]
    async fn test_manual_coverage_skips_command() {
        let temp = TempDir::new().unwrap();
        let sentinel = temp.path().join("ran");
        let readme = temp.path().join("README.md");
        fs::write(&readme, "# Widget\n").unwrap();

        let app = App::new(settings(Overrides {
            png: Some(false),
            manualcov: Some(123.0),
            covercmd: Some(format!("touch {}", sentinel.display())),
            md: Some(readme.display().to_string()),
            ..Default::default()
        }));

        let summary = app.run().await.unwrap();

        assert_eq!(summary.coverage, CoverageValue::new(123.0));
        assert_eq!(summary.badge_path, None);
        assert_eq!(summary.patched, vec![(readme.clone(), PatchOutcome::Inserted)]);
        assert!(!sentinel.exists());

        let expected_url = "https://img.shields.io/badge/Go-123%25-brightgreen.png?style=flat";
        assert_eq!(
            fs::read_to_string(&readme).unwrap(),
            format!("{}\n\n# Widget\n", marker_line(expected_url))
        );
    }

    #[tokio::test]
    async fn test_measure_coverage_from_command() {
        let app = App::new(settings(Overrides {
            covercmd: Some(
                "echo 'ok  example.com/widget 0.1s'; echo 'total:\t(statements)\t81.3%'"
                    .to_string(),
            ),
            tags: Some("ignored".to_string()),
            ..Default::default()
        }));

        let coverage = app.measure_coverage(QuietEcho).await.unwrap();
        assert_eq!(coverage, CoverageValue::new(81.3));
    }

    #[test]
    fn test_ignored_tags_warned() {
        let logs = CapturedLogs::default();
        tracing::subscriber::with_default(logs.subscriber(), || {
            App::new(settings(Overrides {
                covercmd: Some("echo 'total: 10%'".to_string()),
                tags: Some("integration".to_string()),
                ..Default::default()
            }))
        });

        let output = logs.contents();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("tags flag will be ignored"), "{output}");
        assert!(output.contains("integration"), "{output}");
    }

    #[test]
    fn test_tags_alone_not_warned() {
        let logs = CapturedLogs::default();
        tracing::subscriber::with_default(logs.subscriber(), || {
            App::new(settings(Overrides {
                tags: Some("integration".to_string()),
                ..Default::default()
            }))
        });

        assert_eq!(logs.contents(), "");
    }

    #[tokio::test]
    async fn test_non_finite_manual_coverage_warned() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let app = App::new(settings(Overrides {
            png: Some(false),
            manualcov: Some(f64::NAN),
            ..Default::default()
        }));
        let summary = app.run().await.unwrap();

        assert!(summary.coverage.percent().is_nan());
        let output = logs.contents();
        assert!(output.contains("is not a finite number"), "{output}");
        assert!(!output.contains("outside 0-100%"), "{output}");
    }

    #[tokio::test]
    async fn test_out_of_range_manual_coverage_warned() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let app = App::new(settings(Overrides {
            png: Some(false),
            manualcov: Some(150.0),
            ..Default::default()
        }));
        app.run().await.unwrap();

        assert!(logs.contents().contains("Coverage 150% is outside 0-100%"));
    }

    #[tokio::test]
    async fn test_measure_coverage_drains_binary_output() {
        let app = App::new(settings(Overrides {
            covercmd: Some(
                "printf 'log \\377\\n'; echo 'total: (statements) 50.0%'; head -c 1000000 /dev/zero"
                    .to_string(),
            ),
            timeout_seconds: Some(5),
            ..Default::default()
        }));

        let coverage = app.measure_coverage(QuietEcho).await.unwrap();
        assert_eq!(coverage, CoverageValue::new(50.0));
    }

    #[tokio::test]
    async fn test_measure_coverage_bounds_reaping() {
        let app = App::new(settings(Overrides {
            covercmd: Some("echo 'total: 50%'; sleep 30".to_string()),
            timeout_seconds: Some(1),
            ..Default::default()
        }));

        let err = app.measure_coverage(QuietEcho).await.unwrap_err();
        assert!(matches!(err, AppError::Extract(ExtractError::ReapTimeout(_))));
    }

    #[tokio::test]
    async fn test_measure_coverage_without_total() {
        let app = App::new(settings(Overrides {
            covercmd: Some("echo 'no tests to run'".to_string()),
            ..Default::default()
        }));

        let err = app.measure_coverage(QuietEcho).await.unwrap_err();
        assert!(matches!(err, AppError::Extract(ExtractError::NotFound)));
    }

    #[tokio::test]
    async fn test_measure_coverage_times_out() {
        let app = App::new(settings(Overrides {
            covercmd: Some("sleep 10".to_string()),
            timeout_seconds: Some(1),
            ..Default::default()
        }));

        let err = app.measure_coverage(QuietEcho).await.unwrap_err();
        assert!(matches!(err, AppError::Extract(ExtractError::Timeout(_))));
    }

    #[test]
    fn test_patch_markdown_missing_file() {
        let temp = TempDir::new().unwrap();
        let app = App::new(settings(Overrides {
            md: Some(temp.path().join("missing.md").display().to_string()),
            ..Default::default()
        }));

        let err = app.patch_markdown(CoverageValue::new(50.0)).unwrap_err();
        assert!(matches!(err, AppError::Markdown(_)));
    }
}
