use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "replay";
const CONFIG_FILE: &str = "config.json";

/// Defaults for the `replay` command, stored as JSON under the config root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub history_dir: Option<PathBuf>,
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,
    #[serde(default)]
    pub use_utc: bool,
}

fn default_top_limit() -> usize {
    20
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            history_dir: None,
            top_limit: default_top_limit(),
            use_utc: false,
        }
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("REPLAY_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_config() -> Result<ReplayConfig> {
    load_config_from_path(&config_path()?)
}

pub fn save_config(config: &ReplayConfig) -> Result<()> {
    ensure_config_dir()?;
    save_config_to_path(&config_path()?, config)
}

fn load_config_from_path(path: &Path) -> Result<ReplayConfig> {
    if !path.exists() {
        return Ok(ReplayConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: ReplayConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

fn save_config_to_path(path: &Path, config: &ReplayConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
