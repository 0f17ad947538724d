//! Watcher configuration.
//!
//! Loaded once from YAML at startup and shared read-only afterwards.
//!
//! # Environment Overrides
//! - `CHIRP_CONFIG`: config file path (handled by the CLI)
//! - `CHIRP_PASSWORD`: account password, wins over the file
//! - `CHIRP_WEBHOOK_URL`: webhook URL, wins over the file

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::timeline::FeedOrder;

pub const ENV_PASSWORD: &str = "CHIRP_PASSWORD";
pub const ENV_WEBHOOK_URL: &str = "CHIRP_WEBHOOK_URL";

pub const DEFAULT_TIMELINE_URL: &str = "https://api.twitter.com/1.1/statuses/home_timeline.json";
pub const DEFAULT_SEARCH_URL: &str = "https://api.twitter.com/1.1/search/tweets.json";
pub const DEFAULT_PROFILE_URL: &str = "https://api.twitter.com/1.1/users/show";
pub const DEFAULT_PROFILE_PAGE_URL: &str = "https://twitter.com";

/// Default pause between two notifications.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 3;

/// Default minimum time between two fetches.
pub const DEFAULT_MIN_POLL_INTERVAL_SECS: u64 = 10;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Local account handle; also used to drop self-authored items.
    pub user: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    /// Saved search queries, fetched in this order.
    #[serde(default)]
    pub searches: Vec<String>,

    /// Keywords that make a notification sticky.
    #[serde(default)]
    pub sticky: Vec<String>,

    #[serde(default = "default_timeline_url")]
    pub timeline_url: String,

    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Profile endpoint; `<profile_url>/<id-or-handle>.json` is fetched.
    #[serde(default = "default_profile_url")]
    pub profile_url: String,

    /// Base of the public profile page a notification links to.
    #[serde(default = "default_profile_page_url")]
    pub profile_page_url: String,

    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    #[serde(default = "default_min_poll_interval_secs")]
    pub min_poll_interval_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub feed_order: FeedOrder,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub notify: NotifySettings,
}

/// Notification channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifySettings {
    /// Desktop notifier command; empty disables the desktop channel.
    #[serde(default = "default_notify_command")]
    pub command: String,

    /// Slack-compatible webhook URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            command: default_notify_command(),
            webhook_url: None,
        }
    }
}

fn default_timeline_url() -> String {
    DEFAULT_TIMELINE_URL.to_string()
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_profile_url() -> String {
    DEFAULT_PROFILE_URL.to_string()
}

fn default_profile_page_url() -> String {
    DEFAULT_PROFILE_PAGE_URL.to_string()
}

fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("chirp"))
        .unwrap_or_else(|| PathBuf::from(".chirp"))
}

const fn default_tick_interval_secs() -> u64 {
    DEFAULT_TICK_INTERVAL_SECS
}

const fn default_min_poll_interval_secs() -> u64 {
    DEFAULT_MIN_POLL_INTERVAL_SECS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("chirp/{}", env!("CARGO_PKG_VERSION"))
}

fn default_notify_command() -> String {
    notify::channels::desktop::DEFAULT_COMMAND.to_string()
}

/// `$XDG_CONFIG_HOME/chirp/config.yml` or the platform equivalent.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("chirp"))
        .unwrap_or_else(|| PathBuf::from(".chirp"))
        .join("config.yml")
}

impl WatchConfig {
    /// Load, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config = Self::from_yaml(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            user = %config.user,
            searches = config.searches.len(),
            sticky_keywords = config.sticky.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse YAML without touching the environment or validating.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Failed to parse YAML")
    }

    /// Overlay secrets from the environment. `lookup` is `std::env::var` in
    /// production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(password) = lookup(ENV_PASSWORD).filter(|v| !v.is_empty()) {
            self.password = password;
        }
        if let Some(url) = lookup(ENV_WEBHOOK_URL).filter(|v| !v.is_empty()) {
            self.notify.webhook_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.user.trim().is_empty() {
            bail!("'user' must not be empty");
        }
        if self.password.is_empty() {
            bail!("no password configured; set 'password' or {ENV_PASSWORD}");
        }
        if self.tick_interval_secs == 0 {
            bail!("'tick_interval_secs' must be greater than zero");
        }
        if self.min_poll_interval_secs == 0 {
            bail!("'min_poll_interval_secs' must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("'request_timeout_secs' must be greater than zero");
        }

        let mut urls = vec![
            ("timeline_url", self.timeline_url.as_str()),
            ("search_url", self.search_url.as_str()),
            ("profile_url", self.profile_url.as_str()),
            ("profile_page_url", self.profile_page_url.as_str()),
        ];
        if let Some(webhook) = &self.notify.webhook_url {
            urls.push(("notify.webhook_url", webhook.as_str()));
        }
        for (field, value) in urls {
            url::Url::parse(value).with_context(|| format!("'{field}' is not a valid URL: {value}"))?;
        }

        Ok(())
    }

    #[must_use]
    pub fn watermark_path(&self) -> PathBuf {
        self.state_dir.join("watermark")
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.state_dir.join("cache")
    }

    #[must_use]
    pub fn avatar_dir(&self) -> PathBuf {
        self.cache_dir().join("avatars")
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    #[must_use]
    pub const fn min_poll_interval(&self) -> Duration {
        Duration::from_secs(self.min_poll_interval_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
