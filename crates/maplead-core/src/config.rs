//! Configuration management for maplead.
//!
//! Provides TOML-based configuration with platform-specific paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/maplead/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Scrape loop pacing and limits
    pub scraping: ScrapingConfig,
    /// Spreadsheet export settings
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    /// - A value fails validation
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, falling back to defaults if it is absent.
    ///
    /// The result is validated either way.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let config: Self = if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            tracing::debug!("Config file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `MAPLEAD_BIND_ADDR`: Override the HTTP listen address
    /// - `MAPLEAD_HEADLESS`: Override browser headless mode (true/false)
    /// - `MAPLEAD_OUTPUT_PATH`: Override the spreadsheet output path
    /// - `MAPLEAD_CHROME_PATH`: Override the Chromium executable
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("MAPLEAD_BIND_ADDR") {
            tracing::debug!("Override server.bind_addr from env: {}", addr);
            self.server.bind_addr = addr;
        }

        if let Some(val) = lookup("MAPLEAD_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(path) = lookup("MAPLEAD_OUTPUT_PATH") {
            tracing::debug!("Override export.output_path from env: {}", path);
            self.export.output_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("MAPLEAD_CHROME_PATH") {
            tracing::debug!("Override browser.executable_path from env: {}", path);
            self.browser.executable_path = Some(PathBuf::from(path));
        }
    }

    /// Check values that would otherwise fail at runtime.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scraping.stagnation_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.stagnation_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.scraping.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.channel_capacity".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.export.output_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.output_path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses platform base directories: `~/.config/maplead/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "maplead", "maplead").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,
    /// Origins allowed by CORS; `"*"` allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// User agent sent by the browsing context
    pub user_agent: String,
    /// Chromium executable; auto-detected when unset
    pub executable_path: Option<PathBuf>,
    /// Timeout for a single DevTools request in seconds
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            executable_path: None,
            request_timeout_secs: 30,
        }
    }
}

/// Scrape loop pacing and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Prefix of the search URL; keyword and location are appended
    pub search_base_url: String,
    /// How long to wait for the results panel after navigation
    pub results_panel_timeout_ms: u64,
    /// Pause after opening a card before reading its detail view
    pub card_settle_ms: u64,
    /// Pause after each scroll of the results panel
    pub scroll_settle_ms: u64,
    /// Pixels scrolled per iteration
    pub scroll_step_px: i64,
    /// Consecutive scrolls without new cards before giving up
    pub stagnation_limit: u32,
    /// Capacity of the record channel between loop and controller
    pub channel_capacity: usize,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            search_base_url: "https://www.google.com/maps/search/".to_string(),
            results_panel_timeout_ms: 30_000,
            card_settle_ms: 1500,
            scroll_settle_ms: 2000,
            scroll_step_px: 500,
            stagnation_limit: 30,
            channel_capacity: 16,
        }
    }
}

/// Spreadsheet export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Fixed output file, overwritten by every run
    pub output_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("leads/leads.xlsx"),
        }
    }
}
