//! Logging bootstrap.
//!
//! The filter comes from the first source that is set:
//!
//! - `--log-level`
//! - `RUST_LOG` (full `EnvFilter` directive syntax)
//! - `[log] level` in `sqlstep.toml`
//!
//! Logs go to stderr so command output on stdout stays clean.

use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogFormat, Settings};
use crate::error::{CliError, CliResult};

/// Where the log filter came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    /// A single level from `--log-level` or the config file.
    Level(LevelFilter),
    /// Directives from `RUST_LOG`.
    Directives(String),
}

impl FilterSpec {
    /// Pick the filter source by priority.
    pub fn select(
        level_override: Option<&str>,
        rust_log: Option<&str>,
        config_level: &str,
    ) -> CliResult<Self> {
        if let Some(level) = level_override {
            return parse_level(level).map(Self::Level);
        }
        if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
            return Ok(Self::Directives(directives.to_string()));
        }
        parse_level(config_level).map(Self::Level)
    }

    fn into_env_filter(self) -> CliResult<EnvFilter> {
        match self {
            Self::Level(level) => Ok(EnvFilter::default().add_directive(level.into())),
            Self::Directives(directives) => EnvFilter::try_new(&directives)
                .map_err(|e| CliError::Config(format!("Invalid RUST_LOG '{}': {}", directives, e))),
        }
    }
}

fn parse_level(level: &str) -> CliResult<LevelFilter> {
    LevelFilter::from_str(level.trim()).map_err(|_| {
        CliError::Config(format!(
            "Invalid log level '{}': expected error, warn, info, debug, trace or off",
            level
        ))
    })
}

/// Install the global subscriber.
pub fn init(settings: &Settings) -> CliResult<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = FilterSpec::select(
        settings.log_level_override.as_deref(),
        rust_log.as_deref(),
        &settings.config_log_level,
    )?
    .into_env_filter()?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.log_format {
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| CliError::Config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flag_wins() {
        let spec = FilterSpec::select(Some("debug"), Some("trace"), "warn").unwrap();
        assert_eq!(spec, FilterSpec::Level(LevelFilter::DEBUG));
    }

    #[test]
    fn test_rust_log_beats_config() {
        let spec = FilterSpec::select(None, Some("sqlstep_migrate=trace"), "warn").unwrap();
        assert_eq!(spec, FilterSpec::Directives("sqlstep_migrate=trace".to_string()));
    }

    #[test]
    fn test_config_level_fallback() {
        let spec = FilterSpec::select(None, None, "INFO").unwrap();
        assert_eq!(spec, FilterSpec::Level(LevelFilter::INFO));

        let spec = FilterSpec::select(None, Some("  "), "off").unwrap();
        assert_eq!(spec, FilterSpec::Level(LevelFilter::OFF));
    }

    #[test]
    fn test_invalid_level() {
        let err = FilterSpec::select(Some("verbose"), None, "warn").unwrap_err();
        assert!(err.to_string().contains("Invalid log level 'verbose'"));
    }

    #[test]
    fn test_into_env_filter() {
        assert!(FilterSpec::Level(LevelFilter::WARN).into_env_filter().is_ok());
        assert!(
            FilterSpec::Directives("sqlstep=debug".to_string())
                .into_env_filter()
                .is_ok()
        );
    }
}
