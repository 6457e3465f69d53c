//! Configuration loading and data directory resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Data directory resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`data_dir` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_dir));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_dir())
}

/// Get default configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("audiocast").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/audiocast/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default data directory path
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("audiocast"))
        .unwrap_or_else(|| PathBuf::from("./audiocast_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let dir = resolve_data_dir(Some("/tmp/audiocast-test"), "AUDIOCAST_TEST_UNSET_VAR")
            .unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/audiocast-test"));
    }

    #[test]
    fn falls_back_to_default_without_sources() {
        let dir = resolve_data_dir(None, "AUDIOCAST_TEST_UNSET_VAR").unwrap();
        // Either a platform dir or the compiled fallback; both end in audiocast*.
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("audiocast"));
    }
}
