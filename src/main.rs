//! coverbadge: turn a coverage run into a badge
//!
//! Runs the coverage command, echoes its output, reads the coverage total
//! and writes a badge image and/or badge lines in markdown files.

use anyhow::Result;
use clap::Parser;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coverbadge::{App, Cli, ProjectConfig, Settings};

/// Initialize logging with RUST_LOG environment variable support
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    // Settings are validated before anything is spawned
    let project_root = std::env::current_dir()?;
    let config = ProjectConfig::load(Some(project_root.as_path()))?;
    let settings = Settings::resolve(config, cli.overrides())?;

    tracing::info!("Starting coverbadge in {:?}", project_root);

    let app = App::new(settings);

    tokio::select! {
        res = app.run() => {
            let summary = res?;
            tracing::info!(
                "Coverage {} (badge: {:?}, markdown files: {})",
                summary.coverage,
                summary.badge_path,
                summary.patched.len()
            );
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, stopping coverage run");
            anyhow::bail!("Interrupted");
        }
    }

    Ok(())
}
