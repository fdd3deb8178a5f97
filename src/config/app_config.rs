use config::{Config, ConfigBuilder, FileFormat};
use error_stack::{report, ResultExt};
use serde::{de::IntoDeserializer, Deserialize};
use serde_path_to_error::{Deserializer as PathDeserializer, Segment, Track};
use thiserror::Error;

use super::google_config::GoogleConfig;

pub const DEFAULT_CONFIG_PATH: &str = "Config";
pub const DEFAULT_LOG_FILE: &str = "drive_sheets.log";

#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct DuplicateConfig {
    /// Replaces the built-in branch codes used by `duplicate-sheet`.
    pub branches: Option<Vec<String>>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub google: GoogleConfig,
    #[serde(default)]
    pub duplicate: DuplicateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading config file '{0}'")]
    Read(String),
    #[error("Failed to deserialize config file '{path}' at field '{field}'")]
    Deserialize { path: String, field: String },
}

impl AppConfig {
    /// Reads the file named by `CONFIG_PATH`, or `Config` with any supported extension.
    pub fn load() -> error_stack::Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> error_stack::Result<Self, ConfigError> {
        let builder = Config::builder().add_source(config::File::with_name(config_path));
        Self::build(builder, config_path)
    }

    pub fn from_toml(content: &str) -> error_stack::Result<Self, ConfigError> {
        let builder =
            Config::builder().add_source(config::File::from_str(content, FileFormat::Toml));
        Self::build(builder, "<inline>")
    }

    fn build(
        builder: ConfigBuilder<config::builder::DefaultState>,
        config_path: &str,
    ) -> error_stack::Result<Self, ConfigError> {
        let config = builder
            .build()
            .change_context_lazy(|| ConfigError::Read(config_path.to_string()))?;

        let value = config
            .try_deserialize::<serde_json::Value>()
            .change_context_lazy(|| ConfigError::Read(config_path.to_string()))?;

        let mut track = Track::new();
        let path_de = PathDeserializer::new(value.into_deserializer(), &mut track);
        AppConfig::deserialize(path_de).map_err(|e| {
            let field = track
                .path()
                .iter()
                .map(|seg| match seg {
                    Segment::Seq { index } => format!("[{}]", index),
                    Segment::Map { key } => format!(".{}", key),
                    Segment::Enum { variant } => format!("::{}", variant),
                    Segment::Unknown => String::from("<?>"),
                })
                .collect::<String>();
            report!(ConfigError::Deserialize {
                path: config_path.to_string(),
                field: field.trim_start_matches('.').to_string(),
            })
            .attach_printable(e.to_string())
            .attach_printable("Make sure all required fields are present in the configuration file")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [google]
            priv_key = "secrets/service_account.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.google.priv_key.as_ref(), "secrets/service_account.json");
        assert!(config.duplicate.branches.is_none());
        assert_eq!(config.logging.file, DEFAULT_LOG_FILE);
    }

    #[test]
    fn test_branch_override() {
        let config = AppConfig::from_toml(
            r#"
            [google]
            priv_key = "key.json"

            [duplicate]
            branches = ["North", "South"]

            [logging]
            file = "run.log"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.duplicate.branches,
            Some(vec!["North".to_string(), "South".to_string()])
        );
        assert_eq!(config.logging.file, "run.log");
    }

    #[test]
    fn test_missing_key_reports_field_path() {
        let error = AppConfig::from_toml(
            r#"
            [google]
            key = "oops"
            "#,
        )
        .unwrap_err();

        match error.current_context() {
            ConfigError::Deserialize { field, .. } => assert_eq!(field, "google"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let error = AppConfig::load_from("definitely/not/here").unwrap_err();
        assert!(matches!(error.current_context(), ConfigError::Read(_)));
    }
}
