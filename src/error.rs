//! Unified error types for coverbadge.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Coverage extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Badge error: {0}")]
    Badge(#[from] BadgeError),

    #[error("Markdown error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid style flag '{given}'! Must be a member of list: [{allowed}]")]
    InvalidStyle { given: String, allowed: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Coverage command execution errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Coverage command is empty")]
    EmptyCommand,

    #[error("Error starting program {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error obtaining stdout of the coverage command")]
    StdoutUnavailable,

    #[error("Failed waiting for the coverage command: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Failed killing the coverage command: {0}")]
    Kill(#[source] std::io::Error),
}

/// Coverage extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No coverage total found in the command output")]
    NotFound,

    #[error("No coverage total found within {0:?}")]
    Timeout(Duration),

    #[error("Coverage command did not exit within {0:?} after its output was scanned")]
    ReapTimeout(Duration),

    #[error("Failed reading command output: {0}")]
    Read(#[from] std::io::Error),

    #[error("Coverage scan task ended unexpectedly: {0}")]
    TaskLost(String),
}

/// Badge rendering errors
#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("Badge request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Badge service returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed writing badge to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Markdown patching errors
#[derive(Debug, Error)]
pub enum MarkdownError {
    #[error("Failed reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for process operations
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Result type alias for coverage extraction
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for badge operations
pub type BadgeResult<T> = std::result::Result<T, BadgeError>;

/// Result type alias for markdown operations
pub type MarkdownResult<T> = std::result::Result<T, MarkdownError>;
