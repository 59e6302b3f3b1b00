//! Configuration management for the md renderer.
//!
//! Parses `md.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `source.src`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub breaks: Option<bool>,
    pub pedantic: Option<bool>,
    pub sanitize: Option<bool>,
    pub smartypants: Option<bool>,
    /// Override remote source location.
    pub src: Option<String>,
    /// Override fetch timeout in seconds.
    pub timeout_secs: Option<u64>,
    pub disable_remote_sanitization: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "md.toml";

/// Default fetch timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound for the fetch timeout.
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown rendering flags.
    pub render: RenderConfig,
    /// Remote fetch settings.
    pub fetch: FetchConfig,
    /// Default markdown source.
    pub source: SourceConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Rendering flags passed to the element.
///
/// Unset fields fall back to the parser defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render soft line breaks as `<br>`.
    pub breaks: Option<bool>,
    /// Disable GFM extensions.
    pub pedantic: Option<bool>,
    /// Escape raw HTML.
    pub sanitize: Option<bool>,
    /// Smart punctuation.
    pub smartypants: Option<bool>,
}

/// Remote fetch configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Keep `sanitize` untouched when remote content arrives.
    pub disable_remote_sanitization: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            disable_remote_sanitization: false,
        }
    }
}

impl FetchConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default markdown source.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Remote location fetched when no input is given.
    pub src: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`source.src`").
        field: String,
        /// Error message (e.g., "${`DOCS_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Reject URL schemes the fetcher cannot handle.
///
/// `http://`, `https://`, `file://` and bare paths are accepted.
fn require_fetchable(src: &str, field: &str) -> Result<(), ConfigError> {
    let supported = ["http://", "https://", "file://"];
    if src.contains("://") && !supported.iter().any(|scheme| src.starts_with(scheme)) {
        return Err(ConfigError::Validation(format!(
            "{field} must be a path or start with http://, https:// or file://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `md.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values. The merged result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if settings.breaks.is_some() {
            self.render.breaks = settings.breaks;
        }
        if settings.pedantic.is_some() {
            self.render.pedantic = settings.pedantic;
        }
        if settings.sanitize.is_some() {
            self.render.sanitize = settings.sanitize;
        }
        if settings.smartypants.is_some() {
            self.render.smartypants = settings.smartypants;
        }
        if let Some(src) = &settings.src {
            self.source.src = Some(src.clone());
        }
        if let Some(timeout_secs) = settings.timeout_secs {
            self.fetch.timeout_secs = timeout_secs;
        }
        if let Some(disable) = settings.disable_remote_sanitization {
            self.fetch.disable_remote_sanitization = disable;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.resolve_paths(path.parent().unwrap_or(Path::new(".")));
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_fetch()?;
        self.validate_source()?;
        Ok(())
    }

    fn validate_fetch(&self) -> Result<(), ConfigError> {
        let timeout = self.fetch.timeout_secs;
        if timeout == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if timeout > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "fetch.timeout_secs cannot exceed {MAX_TIMEOUT_SECS}"
            )));
        }
        Ok(())
    }

    fn validate_source(&self) -> Result<(), ConfigError> {
        if let Some(ref src) = self.source.src {
            require_non_empty(src, "source.src")?;
            require_fetchable(src, "source.src")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref src) = self.source.src {
            self.source.src = Some(expand::expand_env(src, "source.src")?);
        }
        Ok(())
    }

    /// Resolve a relative source path against the config directory.
    ///
    /// URLs and absolute paths are left alone.
    fn resolve_paths(&mut self, config_dir: &Path) {
        if let Some(ref src) = self.source.src
            && !src.contains("://")
            && !src.is_empty()
            && Path::new(src).is_relative()
        {
            self.source.src = Some(config_dir.join(src).display().to_string());
        }
    }
}
