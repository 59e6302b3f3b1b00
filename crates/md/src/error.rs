//! CLI error types.

use md_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Remote source could not be loaded; the fallback text was rendered.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}
