use crate::index::types::IndexConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "invindex";
const CONFIG_FILE: &str = "config.json";

/// Get the path of the user config file, if the platform has a config directory
pub fn get_config_path() -> Option<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else {
        // Linux/Unix: XDG_CONFIG_HOME or ~/.config; Windows: roaming AppData
        dirs::config_dir()
    };
    base.map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
}

/// Read an index config from a JSON file. Missing fields take defaults.
pub fn load_config_file(path: &Path) -> Result<IndexConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: IndexConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Load the config from an explicit file, else from the user config file,
/// else return defaults
pub fn load_config(explicit: Option<&Path>) -> Result<IndexConfig> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }

    match get_config_path() {
        Some(path) if path.exists() => load_config_file(&path),
        _ => Ok(IndexConfig::default()),
    }
}

/// Save a config as pretty JSON, creating parent directories
pub fn save_config(config: &IndexConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content).context("Failed to write config file")?;
    Ok(())
}
