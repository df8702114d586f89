//! coverbadge: coverage badges from coverage command output
//!
//! This crate runs a coverage-producing command, extracts the total
//! percentage from its output and publishes it as a badge image and as a
//! badge line in markdown files.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;

pub use app::{App, RunSummary};
pub use cli::Cli;
pub use config::{ProjectConfig, Settings};
pub use error::{AppError, Result};
