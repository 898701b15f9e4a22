use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::theme::Theme;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const BASE_URL_ENV: &str = "ORACLE_BASE_URL";
const CSRF_TOKEN_ENV: &str = "ORACLE_CSRF_TOKEN";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub csrf_token: Option<String>,
    pub theme: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            csrf_token: None,
            theme: Some(Theme::default().as_str().to_string()),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_theme(theme: Theme) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.theme = Some(theme.as_str().to_string());
        config.save()
    }

    /// Backend URL: environment first, then the file, then the default
    pub fn resolved_base_url(&self) -> String {
        std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn resolved_csrf_token(&self) -> Option<String> {
        std::env::var(CSRF_TOKEN_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.csrf_token.clone())
    }

    pub fn theme(&self) -> Theme {
        self.theme
            .as_deref()
            .and_then(Theme::from_str)
            .unwrap_or_default()
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("otaku-oracle"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}
