//! Configuration loading for demo-relay.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the demo-relay home directory (~/.demo-relay).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".demo-relay"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.demo-relay/settings.json
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let mut settings: Settings = serde_json::from_str(&content)?;
    settings.telegram.apply_env_overrides();

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or fall back to defaults if no file exists.
///
/// A run does not require a settings file; every field has a usable default
/// and bot credentials can arrive via environment variables. A file that
/// exists but cannot be used is a louder event: the configured URLs and
/// markers are about to be silently replaced, so it warns.
pub fn load_settings_or_default() -> Settings {
    let file_present = get_settings_path().map(|p| p.exists()).unwrap_or(false);

    match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            if file_present {
                tracing::warn!(
                    "Settings file exists but is unusable ({}); running on defaults",
                    e
                );
            } else {
                tracing::debug!("No settings file ({}), using defaults", e);
            }
            let mut settings = Settings::default();
            settings.telegram.apply_env_overrides();
            settings
        }
    }
}

pub(crate) fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.polling.interval_secs == 0 {
        return Err(Error::Config(
            "polling.interval_secs must be at least 1".to_string(),
        ));
    }
    if settings.polling.timeout_secs < settings.polling.interval_secs {
        return Err(Error::Config(format!(
            "polling.timeout_secs ({}) is shorter than polling.interval_secs ({})",
            settings.polling.timeout_secs, settings.polling.interval_secs
        )));
    }
    if settings.mailbox.fallback_domains.is_empty() {
        return Err(Error::Config(
            "mailbox.fallback_domains must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Mailbox provisioning configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MailboxConfig {
    /// Primary provider: tempmail, guerrillamail, local
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Providers tried in order when the primary fails.
    /// The local generator is always the implicit last resort.
    #[serde(default = "default_fallback_providers")]
    pub fallback_providers: Vec<String>,

    /// Domains for locally generated fallback addresses.
    #[serde(default = "default_fallback_domains")]
    pub fallback_domains: Vec<String>,
}

fn default_provider() -> String {
    "tempmail".to_string()
}

fn default_fallback_providers() -> Vec<String> {
    vec!["guerrillamail".to_string()]
}

fn default_fallback_domains() -> Vec<String> {
    vec![
        "sharklasers.com".to_string(),
        "guerrillamailblock.com".to_string(),
        "grr.la".to_string(),
    ]
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            fallback_providers: default_fallback_providers(),
            fallback_domains: default_fallback_domains(),
        }
    }
}

/// Target site configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TargetConfig {
    #[serde(default = "default_check_url")]
    pub check_url: String,

    #[serde(default = "default_submit_url")]
    pub submit_url: String,

    /// Form field carrying the disposable address.
    #[serde(default = "default_form_field")]
    pub form_field: String,

    /// Literal substring expected on the request page.
    #[serde(default = "default_page_marker")]
    pub page_marker: String,

    /// Literal substring confirming the form was accepted.
    #[serde(default = "default_success_marker")]
    pub success_marker: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_check_url() -> String {
    "https://hdmn.cloud/ru/demo/".to_string()
}

fn default_submit_url() -> String {
    "https://hdmn.cloud/ru/demo/success/".to_string()
}

fn default_form_field() -> String {
    "demo_mail".to_string()
}

fn default_page_marker() -> String {
    "Ваша электронная почта".to_string()
}

fn default_success_marker() -> String {
    "Ваш код выслан на почту".to_string()
}

fn default_user_agent() -> String {
    // The unofficial endpoints reject the default reqwest UA.
    "PostmanRuntime/7.49.1".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            check_url: default_check_url(),
            submit_url: default_submit_url(),
            form_field: default_form_field(),
            page_marker: default_page_marker(),
            success_marker: default_success_marker(),
            user_agent: default_user_agent(),
        }
    }
}

/// Inbox polling configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PollingConfig {
    /// Delay before the first poll, letting the mail arrive.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Fixed sleep between polling iterations.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Wall-clock bound on the whole polling phase.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_initial_delay_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    15
}

fn default_timeout_secs() -> u64 {
    720
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PollingConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry configuration shared by all outbound setup calls.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

/// Telegram relay configuration.
///
/// Environment variables take precedence over the settings file.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            if !token.is_empty() {
                self.bot_token = Some(token);
            }
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHANNEL_ID") {
            if !chat_id.is_empty() {
                self.chat_id = Some(chat_id);
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

/// demo-relay settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub mailbox: MailboxConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,
}
