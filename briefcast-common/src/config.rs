//! Configuration file resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use std::path::PathBuf;

/// Resolve a string setting following the priority order above.
///
/// `toml_key` is looked up at the top level of the config file, when one
/// exists.
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_key: &str,
    default: &str,
) -> String {
    // Priority 1: Command-line argument
    if let Some(value) = cli_arg {
        return value.to_string();
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(env_var_name) {
        return value;
    }

    // Priority 3: TOML config file
    if let Some(config_path) = config_file_path() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(value) = config.get(toml_key).and_then(|v| v.as_str()) {
                    return value.to_string();
                }
            }
        }
    }

    // Priority 4: Compiled default
    default.to_string()
}

/// Default configuration file path for the platform.
///
/// Linux: `~/.config/briefcast/config.toml`, then `/etc/briefcast/config.toml`.
/// Other platforms: the user config dir only.
pub fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("briefcast").join("config.toml"));

    if let Some(ref path) = user_config {
        if path.exists() {
            return user_config;
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/briefcast/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    user_config
}

/// Read and deserialize a TOML config file into the given type.
pub fn load_toml_file<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}
