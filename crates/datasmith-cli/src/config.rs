use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "datasmith.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_format: LogFormat,
    /// Pretty-print JSON written to stdout or `--out`.
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
            pretty: true,
        }
    }
}

impl CliConfig {
    /// Apply command-line flags on top of the file configuration.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        log_format: Option<LogFormat>,
        compact: bool,
    ) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if let Some(format) = log_format {
            self.log_format = format;
        }
        if compact {
            self.pretty = false;
        }
        self
    }
}

/// Load `explicit`, or `datasmith.toml` if it exists, or the defaults.
pub fn load_config(explicit: Option<&Path>) -> CliResult<CliConfig> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                read_config(path)
            } else {
                Ok(CliConfig::default())
            }
        }
    }
}

fn read_config(path: &Path) -> CliResult<CliConfig> {
    let content = std::fs::read_to_string(path).map_err(|err| CliError::io(path, err))?;
    parse_config(&content)
}

fn parse_config(content: &str) -> CliResult<CliConfig> {
    let config: CliConfig = toml::from_str(content)?;
    if config.log_level.trim().is_empty() {
        return Err(CliError::InvalidConfig(
            "log_level must not be empty".to_string(),
        ));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = parse_config("log_format = \"json\"\n").expect("config");

        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "warn");
        assert!(config.pretty);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_config("verbosity = 3\n").expect_err("unknown key");
        assert!(matches!(err, CliError::TomlDecode(_)));
    }

    #[test]
    fn empty_log_level_is_invalid() {
        let err = parse_config("log_level = \" \"\n").expect_err("empty level");
        assert!(matches!(err, CliError::InvalidConfig(_)));
    }

    #[test]
    fn flags_override_the_file() {
        let config = CliConfig::default().with_overrides(
            Some("datasmith_schema=debug".to_string()),
            Some(LogFormat::Json),
            true,
        );

        assert_eq!(config.log_level, "datasmith_schema=debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.pretty);
    }
}
