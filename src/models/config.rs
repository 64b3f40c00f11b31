//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Source;

/// Environment variable overriding the Telegram bot token.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable overriding the Telegram chat id.
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
/// Environment variable overriding the check interval, in minutes.
pub const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot token (empty disables notifications)
    #[serde(default)]
    pub telegram_bot_token: String,

    /// Telegram chat receiving the notifications
    #[serde(default)]
    pub telegram_chat_id: String,

    /// Minutes between two check cycles in loop mode
    #[serde(default = "defaults::check_interval")]
    pub check_interval_minutes: u64,

    /// Career pages to watch
    #[serde(default)]
    pub sources: Vec<Source>,

    /// Directory holding `seen_jobs.json`
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    /// Whether failed notifications still mark postings as seen
    #[serde(default)]
    pub delivery: DeliveryPolicy,

    /// HTTP and pacing settings for page fetches
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Telegram transport settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Extra extraction patterns appended to the built-in ones
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl Config {
    /// Load configuration from a JSON or TOML file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Load configuration, falling back to defaults when the file is missing.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!(
                "Config file {} not found. Using defaults and environment.",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Override secrets and interval from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override secrets and interval using the given variable lookup.
    ///
    /// Unset or blank variables leave the file values untouched.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_BOT_TOKEN) {
            self.telegram_bot_token = token;
        }
        if let Some(chat_id) = get(ENV_CHAT_ID) {
            self.telegram_chat_id = chat_id;
        }
        if let Some(interval) = get(ENV_CHECK_INTERVAL) {
            self.check_interval_minutes = interval.trim().parse().map_err(|_| {
                AppError::config(format!(
                    "{ENV_CHECK_INTERVAL} must be a whole number of minutes, got '{interval}'"
                ))
            })?;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.check_interval_minutes == 0 {
            return Err(AppError::validation("check_interval_minutes must be > 0"));
        }
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.notifier.timeout_secs == 0 {
            return Err(AppError::validation("notifier.timeout_secs must be > 0"));
        }
        Url::parse(&self.notifier.api_base).map_err(|e| {
            AppError::validation(format!(
                "notifier.api_base '{}' is not a URL: {e}",
                self.notifier.api_base
            ))
        })?;

        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Source with URL '{}' has an empty name",
                    source.url
                )));
            }
            let url = Url::parse(&source.url).map_err(|e| {
                AppError::validation(format!(
                    "Source '{}' has an invalid URL '{}': {e}",
                    source.name, source.url
                ))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "Source '{}' must use http or https",
                    source.name
                )));
            }
        }
        Ok(())
    }

    /// Telegram credentials, if both are configured.
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        let token = self.telegram_bot_token.trim();
        let chat_id = self.telegram_chat_id.trim();
        if token.is_empty() || chat_id.is_empty() {
            None
        } else {
            Some((token, chat_id))
        }
    }

    /// Sleep duration between two check cycles.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    /// Sample configuration written by `--init`.
    pub fn sample() -> Self {
        Self {
            telegram_bot_token: "YOUR_BOT_TOKEN_HERE".to_string(),
            telegram_chat_id: "YOUR_CHAT_ID_HERE".to_string(),
            sources: vec![
                Source::new("Example Company", "https://example.com/careers")
                    .with_keywords(["engineer", "developer", "rust"])
                    .with_exclude_keywords(["senior", "manager"]),
                Source::new("Another Company", "https://another.com/jobs"),
            ],
            ..Self::default()
        }
    }

    /// Write the sample configuration to `path` as pretty JSON.
    ///
    /// Returns `false` without touching the file when `path` already exists.
    pub fn write_sample(path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(false);
        }

        let json = serde_json::to_string_pretty(&Self::sample())?;
        fs::write(path, json)?;
        Ok(true)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            check_interval_minutes: defaults::check_interval(),
            sources: Vec::new(),
            data_dir: defaults::data_dir(),
            delivery: DeliveryPolicy::default(),
            scraper: ScraperConfig::default(),
            notifier: NotifierConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

/// What happens to a posting whose notification failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Record every new posting as seen, even if its notification failed.
    #[default]
    AtMostOnce,
    /// Record a posting only once its notification went through.
    AtLeastOnce,
}

/// HTTP client and fetch pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for page requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept-Language header for page requests
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay after each source in milliseconds
    #[serde(default = "defaults::source_delay")]
    pub source_delay_ms: u64,
}

impl ScraperConfig {
    pub fn source_delay(&self) -> Duration {
        Duration::from_millis(self.source_delay_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
            source_delay_ms: defaults::source_delay(),
        }
    }
}

/// Telegram transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,

    /// Delay after each notification in milliseconds
    #[serde(default = "defaults::notify_delay")]
    pub delay_ms: u64,
}

impl NotifierConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            timeout_secs: defaults::notify_timeout(),
            delay_ms: defaults::notify_delay(),
        }
    }
}

/// User additions to the extraction heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// CSS selectors tried after the built-in listing selectors
    #[serde(default)]
    pub extra_selectors: Vec<String>,

    /// URL regexes tried after the built-in job URL patterns, matched ignoring case
    #[serde(default)]
    pub extra_url_patterns: Vec<String>,

    /// The URL fallback runs when the selector pass finds fewer postings
    #[serde(default = "defaults::fallback_threshold")]
    pub fallback_threshold: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extra_selectors: Vec::new(),
            extra_url_patterns: Vec::new(),
            fallback_threshold: defaults::fallback_threshold(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn check_interval() -> u64 {
        60
    }
    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }

    // Scraper defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept_language() -> String {
        "en-US,en;q=0.5".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn source_delay() -> u64 {
        2000
    }

    // Notifier defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn notify_timeout() -> u64 {
        10
    }
    pub fn notify_delay() -> u64 {
        1000
    }

    // Extraction defaults
    pub fn fallback_threshold() -> usize {
        3
    }
}
