use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::connection::Connection;

const APP_NAME: &str = "carseed";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conn: Vec<Connection>,
}

impl Config {
    /// Return the application config directory path, creating it if missing.
    pub fn app_config_dir() -> Result<PathBuf> {
        let mut path = if cfg!(target_os = "macos") {
            dirs_next::home_dir().map(|h| h.join(".config"))
        } else {
            dirs_next::config_dir()
        }
        .ok_or_else(|| anyhow::anyhow!("failed to find os config dir."))?;

        path.push(APP_NAME);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::app_config_dir()?.join(CONFIG_FILE))
    }

    /// Load the config file. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&data).with_context(|| format!("failed to parse YAML at {}", path.display()))
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        // an empty file parses as null
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    /// Pick the connection to seed: the one called `name`, else the first
    /// configured, else a local SQLite file.
    pub fn select(&self, name: Option<&str>) -> Result<Connection> {
        match name {
            Some(name) => self
                .conn
                .iter()
                .find(|c| c.name.as_deref() == Some(name))
                .cloned()
                .ok_or_else(|| {
                    let known: Vec<String> = self.conn.iter().map(|c| c.label()).collect();
                    anyhow::anyhow!(
                        "unknown connection '{}' (known: {})",
                        name,
                        if known.is_empty() { "none".to_string() } else { known.join(", ") }
                    )
                }),
            None => Ok(self.conn.first().cloned().unwrap_or_default()),
        }
    }
}
