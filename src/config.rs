//! Configuration management for coverbadge.
//!
//! Supports layered configuration: defaults → project → user → env → flags.
//! The merged layers are resolved once into an immutable [`Settings`].

use crate::domain::{BadgeSpec, BadgeStyle, CoverageCommand, CoverageValue};
use crate::error::ConfigError;
use crate::services::CoverageExtractor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `manualcov` value meaning "not given"
pub const MANUAL_COVERAGE_UNSET: f64 = -1.0;

/// Project config file name, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".coverbadge.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub badge: BadgeConfig,
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
}

impl ProjectConfig {
    /// Load configuration with hierarchy: defaults → project → user → env
    pub fn load(project_root: Option<&Path>) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(
            config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            )
            .required(false),
        );

        // 2. Project-specific config (.coverbadge.toml in project root)
        if let Some(root) = project_root {
            let project_config = root.join(PROJECT_CONFIG_FILE);
            if project_config.exists() {
                tracing::debug!("Loading project config {:?}", project_config);
                builder = builder.add_source(File::from(project_config).required(false));
            }
        }

        // 3. User config (~/.config/coverbadge/config.toml)
        if let Some(config_dir) = directories::ProjectDirs::from("com", "coverbadge", "coverbadge")
        {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                tracing::debug!("Loading user config {:?}", user_config);
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 4. Environment variables (COVERBADGE_BADGE__STYLE=...)
        builder = builder.add_source(
            Environment::with_prefix("COVERBADGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Badge rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeConfig {
    /// Text preceding the percentage
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// One of plastic, flat, flat-square, for-the-badge, social
    #[serde(default = "default_style")]
    pub style: String,
    /// Whether to write the badge image
    #[serde(default = "default_png")]
    pub png: bool,
    /// Badge image path
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Base URL of the badge service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            style: default_style(),
            png: default_png(),
            output: default_output(),
            endpoint: default_endpoint(),
        }
    }
}

fn default_prefix() -> String {
    "Go".to_string()
}

fn default_style() -> String {
    "flat".to_string()
}

fn default_png() -> bool {
    true
}

fn default_output() -> PathBuf {
    PathBuf::from("coverage_badge.png")
}

fn default_endpoint() -> String {
    "https://img.shields.io/badge".to_string()
}

/// Coverage command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Shell used as `<shell> -c <command>`
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Full override of the coverage command
    #[serde(default)]
    pub covercmd: String,
    /// Build tags for the default command
    #[serde(default)]
    pub tags: String,
    /// Custom total pattern; the first capture group holds the percentage
    #[serde(default)]
    pub pattern: Option<String>,
    /// Give up waiting for a total after this many seconds
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            covercmd: String::new(),
            tags: String::new(),
            pattern: None,
            timeout_seconds: None,
        }
    }
}

fn default_shell() -> String {
    "bash".to_string()
}

/// Markdown patching configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Files whose badge marker line is kept up to date
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// Values given on the command line; `None` leaves the config value in place
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub png: Option<bool>,
    pub style: Option<String>,
    pub md: Option<String>,
    pub prefix: Option<String>,
    pub covercmd: Option<String>,
    pub manualcov: Option<f64>,
    pub tags: Option<String>,
    pub output: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
}

/// Split a comma-separated file list, dropping blanks
fn split_file_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Fully resolved, validated run settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Badge prefix, style and format
    pub badge: BadgeSpec,
    /// Whether to write the badge image
    pub write_png: bool,
    /// Badge image path
    pub output: PathBuf,
    /// Base URL of the badge service
    pub endpoint: String,
    /// Files to patch with the badge marker
    pub markdown_files: Vec<PathBuf>,
    /// Coverage command to run
    pub command: CoverageCommand,
    /// Shell running the coverage command
    pub shell: String,
    /// Total-line matcher
    pub extractor: CoverageExtractor,
    /// Extraction time limit
    pub timeout: Option<Duration>,
    /// Coverage given directly; skips the command entirely
    pub manual_coverage: Option<CoverageValue>,
}

impl Settings {
    /// Merge flags over the loaded config and validate the result
    pub fn resolve(config: ProjectConfig, overrides: Overrides) -> Result<Self, ConfigError> {
        let ProjectConfig {
            badge,
            command,
            markdown,
        } = config;

        let style: BadgeStyle = overrides.style.unwrap_or(badge.style).parse()?;
        let prefix = overrides.prefix.unwrap_or(badge.prefix);

        let markdown_files = match overrides.md {
            Some(list) => split_file_list(&list),
            None => markdown.files,
        };

        let covercmd = overrides.covercmd.unwrap_or(command.covercmd);
        let tags = overrides.tags.unwrap_or(command.tags);
        let command_line = CoverageCommand::resolve(Some(&covercmd), Some(&tags));

        let extractor = match command.pattern.as_deref() {
            Some(pattern) => CoverageExtractor::with_pattern(pattern).map_err(|e| {
                ConfigError::Invalid(format!("coverage pattern {:?}: {}", pattern, e))
            })?,
            None => CoverageExtractor::new(),
        };

        let timeout = match overrides.timeout_seconds.or(command.timeout_seconds) {
            Some(0) => {
                return Err(ConfigError::Invalid(
                    "timeout must be at least one second".to_string(),
                ))
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let manual_coverage = overrides
            .manualcov
            .filter(|v| *v != MANUAL_COVERAGE_UNSET)
            .map(CoverageValue::new);

        Ok(Self {
            badge: BadgeSpec::new(prefix, style),
            write_png: overrides.png.unwrap_or(badge.png),
            output: overrides.output.unwrap_or(badge.output),
            endpoint: badge.endpoint,
            markdown_files,
            command: command_line,
            shell: command.shell,
            extractor,
            timeout,
            manual_coverage,
        })
    }
}
