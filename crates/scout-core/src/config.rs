//! Configuration management for Scout.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/scout/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target site settings
    pub site: SiteConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Login and session settings
    pub session: SessionConfig,
    /// Discovery loop settings
    pub discovery: DiscoveryConfig,
    /// Evaluation pipeline settings
    pub evaluation: EvaluationConfig,
    /// LLM integration settings
    pub llm: LlmConfig,
    /// Database settings
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if missing.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// See [`AppConfig::apply_env_overrides`] for the supported variables.
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides in place.
    ///
    /// Supports the following environment variables:
    /// - `SCOUT_BASE_URL`: Override the site base URL
    /// - `SCOUT_HEADLESS`: Override browser headless mode (true/false)
    /// - `SCOUT_ALLOW_INTERACTIVE_LOGIN`: Override interactive login permission (true/false)
    /// - `SCOUT_DATABASE_PATH`: Override the SQLite database path
    /// - `SCOUT_LLM_API_KEY`: API key for the LLM provider (never read from file)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SCOUT_BASE_URL") {
            tracing::debug!("Override site.base_url from env: {}", val);
            self.site.base_url = val;
        }

        if let Ok(val) = std::env::var("SCOUT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("SCOUT_ALLOW_INTERACTIVE_LOGIN") {
            if let Ok(allow) = val.parse() {
                self.session.allow_interactive_login = allow;
                tracing::debug!(
                    "Override session.allow_interactive_login from env: {}",
                    allow
                );
            }
        }

        if let Ok(val) = std::env::var("SCOUT_DATABASE_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("SCOUT_LLM_API_KEY") {
            if !val.is_empty() {
                tracing::debug!("Using LLM API key from env");
                self.llm.api_key = Some(val);
            }
        }
    }

    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.evaluation.concurrency == 0 {
            return Err(invalid("evaluation.concurrency", "must be at least 1"));
        }
        if self.discovery.pacing_min_ms > self.discovery.pacing_max_ms {
            return Err(invalid(
                "discovery.pacing_min_ms",
                "must not exceed discovery.pacing_max_ms",
            ));
        }
        if self.session.login_timeout_secs == 0 {
            return Err(invalid("session.login_timeout_secs", "must be positive"));
        }
        if self.site.base_url.trim().is_empty() {
            return Err(invalid("site.base_url", "must not be empty"));
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| invalid("config_path", "no parent directory"))?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Resolve the database file, defaulting to `<data_dir>/scout.db`.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("scout.db")),
        }
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/scout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/scout`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "scout", "scout").ok_or(ConfigError::NoConfigDir)
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Target site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL of the listing site; landing here after login means authenticated
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.zhipin.com".to_string(),
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run the primary browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Browser locale, sent as `--lang`
    pub locale: String,
    /// Explicit Chrome/Chromium executable (auto-detected when unset)
    pub chrome_executable: Option<PathBuf>,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            locale: "zh-CN".to_string(),
            chrome_executable: None,
            navigation_timeout_secs: 30,
        }
    }
}

/// Login and session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Whether a human may be asked to log in through a visible browser
    pub allow_interactive_login: bool,
    /// How long to wait for the interactive login to complete
    pub login_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            allow_interactive_login: true,
            login_timeout_secs: 180,
        }
    }
}

/// Discovery loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Number of listings to collect per run
    pub requested_count: usize,
    /// Lower bound of the delay between clicks
    pub pacing_min_ms: u64,
    /// Upper bound of the delay between clicks
    pub pacing_max_ms: u64,
    /// Timeout for element waits in the listing page
    pub element_timeout_secs: u64,
    /// Timeout for a detail response after a click
    pub detail_timeout_secs: u64,
    /// Timeout for the next list page once every rendered card was visited
    pub page_timeout_secs: u64,
    /// Skip listings whose recruiter has not been active recently
    pub skip_inactive_recruiters: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            requested_count: 20,
            pacing_min_ms: 3000,
            pacing_max_ms: 5000,
            element_timeout_secs: 30,
            detail_timeout_secs: 30,
            page_timeout_secs: 30,
            skip_inactive_recruiters: true,
        }
    }
}

/// Evaluation pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Number of concurrent scoring workers (and queue capacity)
    pub concurrency: usize,
    /// Maximum number of unevaluated listings taken per run
    pub batch_size: usize,
    /// Résumé or other reference document the listings are scored against
    pub reference_document_path: Option<PathBuf>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            concurrency: 7,
            batch_size: 20,
            reference_document_path: None,
        }
    }
}

/// LLM integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model preset: `deepseek-chat` or `kimi-k2-0711-preview`
    pub model: String,
    /// Override for the provider base URL
    pub base_url: Option<String>,
    /// API key (read from `SCOUT_LLM_API_KEY`, never persisted)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// HTTP timeout for a single completion
    pub timeout_secs: u64,
    /// Temperature for completions
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            base_url: None,
            api_key: None,
            timeout_secs: 120,
            temperature: 0.2,
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path (defaults to the XDG data directory)
    pub path: Option<PathBuf>,
}
