//! CLI configuration handling.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;
use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "sqlstep.toml";

/// Default migrations directory (relative to project root)
pub const MIGRATIONS_DIR: &str = "migrations";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// sqlstep CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL; `${VAR}` references are expanded
    pub url: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Directory for migration scripts, relative to the config file
    pub directory: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            directory: MIGRATIONS_DIR.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (error, warn, info, debug, trace, off)
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human readable output
    #[default]
    Compact,
    /// Multi-line human readable output
    Pretty,
    /// Structured JSON, one object per line
    Json,
}

/// Settings resolved from arguments, environment and config file.
///
/// Arguments and their environment variables win over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Database connection URL, if any source provides one
    pub database_url: Option<String>,
    /// Migrations directory
    pub migrations_dir: PathBuf,
    /// `--log-level`, if given
    pub log_level_override: Option<String>,
    /// Log level from the config file
    pub config_log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Settings {
    /// Load the config file and merge it with the arguments.
    ///
    /// An explicit `--config` path must exist; otherwise `sqlstep.toml` in
    /// `cwd` is used when present.
    pub fn load(args: &GlobalArgs, cwd: &Path) -> CliResult<Self> {
        let (config, base_dir) = match &args.config {
            Some(path) => {
                let path = cwd.join(path);
                let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
                (Config::load(&path)?, base)
            }
            None => {
                let path = cwd.join(CONFIG_FILE_NAME);
                if path.exists() {
                    (Config::load(&path)?, cwd.to_path_buf())
                } else {
                    (Config::default(), cwd.to_path_buf())
                }
            }
        };

        Self::resolve(args, config, cwd, &base_dir)
    }

    /// Merge arguments over a loaded config.
    pub fn resolve(
        args: &GlobalArgs,
        config: Config,
        cwd: &Path,
        config_dir: &Path,
    ) -> CliResult<Self> {
        let database_url = match args.database_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => Some(url.to_string()),
            None => config
                .database
                .url
                .as_deref()
                .map(expand_env_vars)
                .transpose()?
                .filter(|url| !url.is_empty()),
        };

        let migrations_dir = match &args.migrations_dir {
            Some(dir) => cwd.join(dir),
            None => config_dir.join(&config.migrations.directory),
        };

        Ok(Self {
            database_url,
            migrations_dir,
            log_level_override: args.log_level.clone(),
            config_log_level: config.log.level,
            log_format: args.log_format.unwrap_or(config.log.format),
        })
    }

    /// Get the database URL or explain how to set one.
    pub fn require_database_url(&self) -> CliResult<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CliError::Config(format!(
                "Database URL not found. Set DATABASE_URL, pass --database-url, or configure [database] url in {}",
                CONFIG_FILE_NAME
            ))
        })
    }
}

/// Expand `${VAR}` references from the environment. Unset variables are
/// left as written.
pub fn expand_env_vars(s: &str) -> CliResult<String> {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| CliError::Config(format!("Invalid variable pattern: {}", e)))?;
    let expanded = re.replace_all(s, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(expanded.into_owned())
}
