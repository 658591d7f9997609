//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayOptions;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Load options from a file. `.toml` files are read as TOML, anything else as
/// JSON.
pub fn load_options(path: &Path) -> Result<GatewayOptions, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    parse_options(&content, is_toml)
}

/// Parse options from text.
pub fn parse_options(content: &str, is_toml: bool) -> Result<GatewayOptions, ConfigError> {
    let options = if is_toml {
        toml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };
    Ok(options)
}
