//! Application settings loading from `eventario.toml`
//!
//! Every section is optional; a missing file yields the defaults. A few
//! environment variables override file values so deployments can keep secrets
//! and host-specific URLs out of the file. The assistant API key is only ever
//! read from the environment.

use crate::entities::TipoRegistro;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default settings file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "eventario.toml";

/// Whole settings file
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    /// `[database]` section
    pub database: DatabaseSettings,
    /// `[import]` section
    pub import: ImportSettings,
    /// `[analytics]` section
    pub analytics: AnalyticsSettings,
    /// `[assistant]` section
    pub assistant: AssistantSettings,
}

/// Data store settings
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection URL; `DATABASE_URL` wins over this
    pub url: Option<String>,
}

/// Spreadsheet import settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ImportSettings {
    /// Tipo assigned to rows whose tipo cell is blank
    pub default_tipo: TipoRegistro,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            default_tipo: TipoRegistro::Estandar,
        }
    }
}

/// Analytics settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Cumulative revenue share covered by the Pareto item subset
    pub pareto_threshold: f64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            pareto_threshold: 0.8,
        }
    }
}

/// Text-generation backend settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AssistantSettings {
    /// Chat-completions endpoint; `ASSISTANT_API_URL` wins over this
    pub api_url: String,
    /// Model name; `ASSISTANT_MODEL` wins over this
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value has the wrong type.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    Ok(toml::from_str(contents)?)
}

/// Loads settings from a TOML file, then applies environment overrides.
///
/// A missing file is not an error: defaults are used.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let mut settings = if path.exists() {
        debug!("Loading settings from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        parse_settings(&contents)?
    } else {
        info!("No settings file at {}, using defaults", path.display());
        Settings::default()
    };
    settings.apply_env_overrides();
    Ok(settings)
}

/// Loads settings from `EVENTARIO_CONFIG`, or [`DEFAULT_CONFIG_PATH`].
pub fn load_default_config() -> Result<Settings> {
    let path =
        std::env::var("EVENTARIO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(path)
}

impl Settings {
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(url) = std::env::var("ASSISTANT_API_URL") {
            self.assistant.api_url = url;
        }
        if let Ok(model) = std::env::var("ASSISTANT_MODEL") {
            self.assistant.model = model;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [database]
            url = "sqlite://tmp/test.sqlite"

            [import]
            default_tipo = "Venta"

            [analytics]
            pareto_threshold = 0.9

            [assistant]
            api_url = "http://localhost:8080/v1/chat/completions"
            model = "local"
            temperature = 0.0
            timeout_secs = 5
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(
            settings.database.url.as_deref(),
            Some("sqlite://tmp/test.sqlite")
        );
        assert_eq!(settings.import.default_tipo, TipoRegistro::Venta);
        assert_eq!(settings.analytics.pareto_threshold, 0.9);
        assert_eq!(settings.assistant.model, "local");
        assert_eq!(settings.assistant.timeout_secs, 5);
    }

    #[test]
    fn test_parse_empty_settings_uses_defaults() {
        let settings = parse_settings("").unwrap();
        assert!(settings.database.url.is_none());
        assert_eq!(settings.import.default_tipo, TipoRegistro::Estandar);
        assert_eq!(settings.analytics.pareto_threshold, 0.8);
        assert_eq!(settings.assistant.timeout_secs, 60);
    }

    #[test]
    fn test_parse_invalid_settings() {
        let result = parse_settings("[analytics]\npareto_threshold = \"high\"");
        assert!(matches!(
            &result,
            Err(Error::Config { message }) if message.starts_with("Failed to parse settings")
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = load_config("/nonexistent/eventario.toml").unwrap();
        assert_eq!(settings.import.default_tipo, TipoRegistro::Estandar);
    }
}
