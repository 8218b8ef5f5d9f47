// Configuration file handling

use crate::notify::BotCredentials;
use crate::notify::slack::DEFAULT_API_BASE;
use crate::report::PipelineConfig;
use crate::report::pipeline::DEFAULT_REPORT_DIR;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const CONFIG_FILE_NAME: &str = ".testrun-notify.toml";

pub const ENV_ENABLED: &str = "SLACK_ENABLED";
pub const ENV_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const ENV_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";
pub const ENV_CHANNEL_ID: &str = "SLACK_CHANNEL_ID";
pub const ENV_REPORT_DIR: &str = "PLAYWRIGHT_REPORT_DIR";
pub const ENV_API_URL: &str = "SLACK_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Wire the notification reporter in at all
    #[serde(default)]
    pub enabled: bool,

    /// Incoming webhook for the text summary
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Bot token for the upload and fallback path
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Channel receiving the uploaded report
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Rendered HTML report directory
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Web API root
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            bot_token: None,
            channel_id: None,
            report_dir: default_report_dir(),
            api_base: default_api_base(),
        }
    }
}

impl fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("enabled", &self.enabled)
            .field("webhook_url", &self.webhook_url)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("channel_id", &self.channel_id)
            .field("report_dir", &self.report_dir)
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_DIR)
}

fn default_api_base() -> String {
    String::from(DEFAULT_API_BASE)
}

/// Empty values count as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl NotifyConfig {
    /// Whether the notification reporter should be wired into the run
    pub fn reporter_enabled(&self) -> bool {
        self.enabled && self.has_destination()
    }

    pub fn has_destination(&self) -> bool {
        self.webhook_url.is_some() || (self.bot_token.is_some() && self.channel_id.is_some())
    }

    /// Destinations for the reporting pipeline
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            webhook_url: self.webhook_url.clone(),
            credentials: self.bot_token.as_deref().map(BotCredentials::new),
            channel_id: self.channel_id.clone(),
            report_dir: self.report_dir.clone(),
        }
    }

    fn normalize(&mut self) {
        self.webhook_url = non_empty(self.webhook_url.take());
        self.bot_token = non_empty(self.bot_token.take());
        self.channel_id = non_empty(self.channel_id.take());
    }
}

impl Config {
    /// Load configuration from default locations, with the file it came from
    pub fn load() -> Option<(Self, PathBuf)> {
        // 1. ./.testrun-notify.toml
        // 2. ~/.testrun-notify.toml
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(CONFIG_FILE_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_FILE_NAME));
        }

        let path = paths.into_iter().find(|p| p.exists())?;
        match Self::load_from_file(&path) {
            Ok(config) => Some((config, path)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                None
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.notify.normalize();
        Ok(config)
    }

    /// Override file values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override file values from `lookup`; empty values are ignored
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let notify = &mut self.notify;
        if let Some(enabled) = non_empty(lookup(ENV_ENABLED)) {
            notify.enabled = enabled.trim() == "true";
        }
        if let Some(url) = non_empty(lookup(ENV_WEBHOOK_URL)) {
            notify.webhook_url = Some(url);
        }
        if let Some(token) = non_empty(lookup(ENV_BOT_TOKEN)) {
            notify.bot_token = Some(token);
        }
        if let Some(channel) = non_empty(lookup(ENV_CHANNEL_ID)) {
            notify.channel_id = Some(channel);
        }
        if let Some(dir) = non_empty(lookup(ENV_REPORT_DIR)) {
            notify.report_dir = PathBuf::from(dir);
        }
        if let Some(api) = non_empty(lookup(ENV_API_URL)) {
            notify.api_base = api;
        }
    }

    /// Generate configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[notify]
enabled = true
webhook_url = "https://hooks.example.com/T000/B000"
channel_id = "C0123"
report_dir = "out/report"
"#;

        let config = Config::parse(toml).expect("Failed to parse config");
        assert!(config.notify.enabled);
        assert_eq!(
            config.notify.webhook_url.as_deref(),
            Some("https://hooks.example.com/T000/B000")
        );
        assert_eq!(config.notify.channel_id.as_deref(), Some("C0123"));
        assert_eq!(config.notify.report_dir, PathBuf::from("out/report"));
        assert_eq!(config.notify.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_parse_empty_strings_are_unset() {
        let config = Config::parse("[notify]\nwebhook_url = \"\"\nbot_token = \" \"").unwrap();
        assert!(config.notify.webhook_url.is_none());
        assert!(config.notify.bot_token.is_none());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Config::parse("[notify]\nenabled = \"maybe\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::parse("[notify]\nwebhook_url = \"https://file\"").unwrap();
        config.apply_env_with(env(&[
            (ENV_ENABLED, "true"),
            (ENV_WEBHOOK_URL, "https://env"),
            (ENV_BOT_TOKEN, "xoxb-1"),
            (ENV_CHANNEL_ID, "C1"),
            (ENV_REPORT_DIR, "custom-report"),
        ]));

        assert!(config.notify.enabled);
        assert_eq!(config.notify.webhook_url.as_deref(), Some("https://env"));
        assert_eq!(config.notify.bot_token.as_deref(), Some("xoxb-1"));
        assert_eq!(config.notify.report_dir, PathBuf::from("custom-report"));
    }

    #[test]
    fn test_empty_env_keeps_file_value() {
        let mut config = Config::parse("[notify]\nwebhook_url = \"https://file\"").unwrap();
        config.apply_env_with(env(&[(ENV_WEBHOOK_URL, "")]));
        assert_eq!(config.notify.webhook_url.as_deref(), Some("https://file"));
    }

    #[test]
    fn test_enabled_flag_requires_literal_true() {
        let mut config = Config::default();
        config.apply_env_with(env(&[(ENV_ENABLED, "yes"), (ENV_WEBHOOK_URL, "https://x")]));
        assert!(!config.notify.enabled);
        assert!(!config.notify.reporter_enabled());

        config.apply_env_with(env(&[(ENV_ENABLED, "true")]));
        assert!(config.notify.reporter_enabled());
    }

    #[test]
    fn test_token_without_channel_is_not_a_destination() {
        let mut config = Config::default();
        config.apply_env_with(env(&[(ENV_ENABLED, "true"), (ENV_BOT_TOKEN, "xoxb-1")]));
        assert!(!config.notify.reporter_enabled());
        assert!(config.notify.pipeline_config().upload_target().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.notify.bot_token = Some("xoxb-secret".to_string());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("xoxb-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_to_toml_round_trips_defaults() {
        let toml = Config::default().to_toml();
        let parsed = Config::parse(&toml).unwrap();
        assert_eq!(parsed.notify.report_dir, PathBuf::from(DEFAULT_REPORT_DIR));
        assert!(!parsed.notify.enabled);
    }
}
