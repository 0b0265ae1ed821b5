mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./exrtiler.toml", "~/.config/exrtiler/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.converter.threads == 0 {
        anyhow::bail!("converter.threads must be at least 1");
    }

    if config.converter.timeout_secs == Some(0) {
        anyhow::bail!("converter.timeout_secs cannot be 0");
    }

    config
        .defaults
        .validate()
        .context("Invalid [defaults] section")?;

    if let Some(ref exe) = config.converter.executable {
        if !exe.exists() {
            tracing::warn!("Configured converter does not exist: {:?}", exe);
        }
    }

    if config.color_space.preserve && config.color_space.filter.is_empty() {
        tracing::warn!("color_space.preserve is on but the filter is empty; nothing will be preserved");
    }

    Ok(())
}
