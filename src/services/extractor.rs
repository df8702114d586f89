//! Coverage extraction from a command's output.
//!
//! Lines are scanned in order until the first coverage total parses. Lines
//! before it are echoed as they arrive, the total itself is echoed
//! highlighted, and anything after it is never inspected.

use super::process::{OutputLines, ProcessHandle};
use crate::domain::CoverageValue;
use crate::error::{AppError, ExtractError, ExtractResult, ProcessError, ProcessResult, Result};
use crossterm::style::{style, Stylize};
use regex::Regex;
use std::fmt::Display;
use std::io::{self, Write};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::io::AsyncBufRead;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Matches a Go coverage summary total, e.g. `total: (statements) 87.5%`
pub const DEFAULT_COVERAGE_PATTERN: &str = r"total:\s*(?:\(statements\))?\s*(\d+\.?\d*)\s*%";

/// Classification of a single output line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Ordinary output
    Plain,
    /// Coverage total with its parsed value
    Total(CoverageValue),
    /// Looked like a total but the number did not parse
    Malformed(String),
}

/// Where scanned lines are echoed
pub trait LineEcho {
    /// An ordinary output line
    fn plain(&mut self, line: &str);
    /// The line carrying the coverage total
    fn total(&mut self, line: &str);
}

/// Echoes to stdout, highlighting the total in green.
///
/// Once the reading end is gone (`coverbadge | head -1`) echoing stops
/// quietly and scanning carries on.
#[derive(Debug)]
pub struct ConsoleEcho<W = io::Stdout> {
    out: W,
    closed: bool,
}

impl ConsoleEcho {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Default for ConsoleEcho {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> ConsoleEcho<W> {
    pub fn new(out: W) -> Self {
        Self { out, closed: false }
    }

    fn emit(&mut self, text: impl Display) {
        if self.closed {
            return;
        }
        match writeln!(self.out, "{}", text) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!("Output closed, no longer echoing command output");
                self.closed = true;
            }
            Err(e) => tracing::debug!("Failed echoing command output: {}", e),
        }
    }
}

impl<W: Write> LineEcho for ConsoleEcho<W> {
    fn plain(&mut self, line: &str) {
        self.emit(line);
    }

    fn total(&mut self, line: &str) {
        self.emit(style(line).green());
    }
}

/// Finds the coverage total in command output
#[derive(Debug, Clone)]
pub struct CoverageExtractor {
    pattern: Regex,
}

impl CoverageExtractor {
    /// Extractor for Go coverage summaries
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_COVERAGE_PATTERN).expect("default coverage pattern"),
        }
    }

    /// Extractor with a custom pattern. The first capture group must hold the number.
    pub fn with_pattern(pattern: &str) -> std::result::Result<Self, regex::Error> {
        let pattern = Regex::new(pattern)?;
        if pattern.captures_len() < 2 {
            return Err(regex::Error::Syntax(
                "coverage pattern needs a capture group for the percentage".to_string(),
            ));
        }
        Ok(Self { pattern })
    }

    /// Classify one line of output
    pub fn classify(&self, line: &str) -> LineOutcome {
        let Some(number) = self
            .pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        else {
            return LineOutcome::Plain;
        };

        match number.trim().parse::<f64>() {
            Ok(percent) if percent.is_finite() => LineOutcome::Total(CoverageValue::new(percent)),
            Ok(_) => LineOutcome::Malformed(format!("{} is not a finite number", number)),
            Err(e) => LineOutcome::Malformed(format!("{}: {}", number, e)),
        }
    }

    /// Scan lines until a total parses.
    ///
    /// Returns `Ok(None)` when the stream ends without one. A matching line
    /// whose number fails to parse is logged and scanning continues.
    pub async fn scan<R, E>(
        &self,
        lines: &mut OutputLines<R>,
        echo: &mut E,
    ) -> ExtractResult<Option<CoverageValue>>
    where
        R: AsyncBufRead + Unpin,
        E: LineEcho + ?Sized,
    {
        while let Some(line) = lines.next_line().await? {
            match self.classify(&line) {
                LineOutcome::Total(value) => {
                    echo.total(&line);
                    tracing::debug!("Found coverage = {}", value);
                    return Ok(Some(value));
                }
                LineOutcome::Malformed(reason) => {
                    tracing::warn!("Parsing coverage to float: {}", reason);
                    echo.plain(&line);
                }
                LineOutcome::Plain => echo.plain(&line),
            }
        }

        Ok(None)
    }
}

impl Default for CoverageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of phase one, handed across a single-slot channel
type ScanOutcome = ExtractResult<Option<CoverageValue>>;

/// A coverage command being scanned in the background.
///
/// The background task runs two phases: scan until a total is found or the
/// output ends, then drain the rest of the output and reap the process. The
/// second phase runs on every path out of the first.
#[derive(Debug)]
pub struct CoverageRun {
    outcome_rx: oneshot::Receiver<ScanOutcome>,
    reaper: JoinHandle<ProcessResult<ExitStatus>>,
}

impl CoverageRun {
    /// Start scanning the stdout of `handle` on a background task
    pub fn start<E>(
        mut handle: ProcessHandle,
        extractor: CoverageExtractor,
        mut echo: E,
    ) -> ProcessResult<Self>
    where
        E: LineEcho + Send + 'static,
    {
        let mut lines = handle
            .take_lines()
            .ok_or(ProcessError::StdoutUnavailable)?;
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let reaper = tokio::spawn(async move {
            let outcome = extractor.scan(&mut lines, &mut echo).await;
            // The receiver may have given up already
            let _ = outcome_tx.send(outcome);

            match lines.drain().await {
                Ok(skipped) => tracing::debug!("Drained {} bytes of command output", skipped),
                Err(e) => {
                    // A child blocked on a full pipe would never exit
                    tracing::warn!("Failed draining command output, killing it: {}", e);
                    handle.kill().await?;
                }
            }
            handle.wait().await
        });

        Ok(Self { outcome_rx, reaper })
    }

    /// Wait for the coverage value.
    ///
    /// Fails with [`ExtractError::NotFound`] when the output ends without a
    /// total, or [`ExtractError::Timeout`] when `limit` elapses first.
    pub async fn coverage(&mut self, limit: Option<Duration>) -> ExtractResult<CoverageValue> {
        let received = match limit {
            Some(limit) => tokio::time::timeout(limit, &mut self.outcome_rx)
                .await
                .map_err(|_| ExtractError::Timeout(limit))?,
            None => (&mut self.outcome_rx).await,
        };

        let outcome = received.map_err(|e| ExtractError::TaskLost(e.to_string()))?;
        outcome?.ok_or(ExtractError::NotFound)
    }

    /// Wait for the drain phase and the process exit.
    ///
    /// Fails with [`ExtractError::ReapTimeout`] when `limit` elapses first,
    /// in which case the process is killed.
    pub async fn finish(self, limit: Option<Duration>) -> Result<ExitStatus> {
        let mut reaper = self.reaper;
        let joined = match limit {
            Some(limit) => match tokio::time::timeout(limit, &mut reaper).await {
                Ok(joined) => joined,
                Err(_) => {
                    reaper.abort();
                    return Err(ExtractError::ReapTimeout(limit).into());
                }
            },
            None => reaper.await,
        };

        let status =
            joined.map_err(|e| AppError::Extract(ExtractError::TaskLost(e.to_string())))??;
        Ok(status)
    }

    /// Stop scanning and kill the process
    pub fn abort(self) {
        self.reaper.abort();
    }
}
