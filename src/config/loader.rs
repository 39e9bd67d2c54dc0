//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the project identifier.
pub const PROJECT_ID_ENV_VAR: &str = "WALLETCONNECT_PROJECT_ID";

/// Environment variable overriding the bridge URL.
pub const BRIDGE_URL_ENV_VAR: &str = "SIGN_BRIDGE_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay values taken from an environment lookup.
///
/// Takes the lookup as a closure so tests never touch the process environment.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(project_id) = lookup(PROJECT_ID_ENV_VAR).filter(|v| !v.trim().is_empty()) {
        config.project_id = project_id;
    }
    if let Some(url) = lookup(BRIDGE_URL_ENV_VAR).filter(|v| !v.trim().is_empty()) {
        config.bridge.url = url;
    }
}

/// Load, overlay the process environment, apply `overrides`, and validate.
///
/// Without a path the defaults are used, so the environment alone can
/// configure the client. `overrides` runs last (command-line flags).
pub fn load_config<F>(path: Option<&Path>, overrides: F) -> Result<AppConfig, ConfigError>
where
    F: FnOnce(&mut AppConfig),
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
