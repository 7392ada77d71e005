use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shell::Theme;

pub const DEFAULT_ENDPOINT: &str = "https://himanshu-portfolio-v2-iv3t.onrender.com/api/chat";
pub const ENDPOINT_ENV: &str = "PORTFOLIO_CHAT_ENDPOINT";

const DEFAULT_GREETING: &str =
    "Hi 👋 I'm Himanshu's AI assistant. Ask me about his skills, projects, or how to contact him!";
const DEFAULT_WELCOME: &str =
    "Welcome to my portfolio! Feel free to ask me anything about my work, skills, or how to get in touch.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub greeting: String,
    pub welcome_phrase: String,
    pub theme: Theme,
    pub speech: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
            max_retries: 0,
            greeting: DEFAULT_GREETING.to_string(),
            welcome_phrase: DEFAULT_WELCOME.to_string(),
            theme: Theme::default(),
            speech: true,
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

    /// Persist a theme change into the config file at `path`, keeping the
    /// rest of the file as it is.
    pub fn save_theme_to(path: &Path, theme: Theme) -> Result<()> {
        let mut config = Self::load_from(path).unwrap_or_else(|_| Self::new());
        config.theme = theme;
        config.save_to(path)
    }

    /// Endpoint URL: environment variable first, then the config file, then
    /// the built-in default.
    pub fn endpoint(&self) -> String {
        self.resolve_endpoint(std::env::var(ENDPOINT_ENV).ok())
    }

    fn resolve_endpoint(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("portfolio-chat"))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}
