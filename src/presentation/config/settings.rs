use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use crate::application::services::{BatchMode, BatchPolicy, RetryPolicy};

use super::Environment;

const API_KEY_OVERRIDE: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub oracle: OracleSettings,
    pub pacing: PacingSettings,
    pub retry: RetrySettings,
    pub batch: BatchSettings,
    pub progress: ProgressSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub referer: Option<String>,
    pub title: String,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "mistralai/mistral-7b-instruct".to_string(),
            temperature: 0.1,
            max_tokens: 5,
            referer: None,
            title: "Keyword Analyzer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub capacity: u32,
    pub refill_period_ms: u64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            capacity: 50,
            refill_period_ms: 60_000,
        }
    }
}

impl PacingSettings {
    pub fn refill_period(&self) -> Duration {
        Duration::from_millis(self.refill_period_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub rate_limit_cooldown_ms: u64,
    pub call_timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 5_000,
            rate_limit_cooldown_ms: 60_000,
            call_timeout_ms: 30_000,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            rate_limit_cooldown: Duration::from_millis(self.rate_limit_cooldown_ms),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub size: usize,
    pub mode: BatchMode,
    pub inter_item_delay_ms: u64,
    pub inter_batch_delay_ms: u64,
    pub consecutive_error_threshold: u32,
    pub consecutive_error_pause_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            size: 10,
            mode: BatchMode::Concurrent,
            inter_item_delay_ms: 300,
            inter_batch_delay_ms: 3_000,
            consecutive_error_threshold: 3,
            consecutive_error_pause_ms: 30_000,
        }
    }
}

impl BatchSettings {
    pub fn policy(&self) -> BatchPolicy {
        BatchPolicy {
            batch_size: self.size,
            mode: self.mode,
            inter_item_delay: Duration::from_millis(self.inter_item_delay_ms),
            inter_batch_delay: Duration::from_millis(self.inter_batch_delay_ms),
            consecutive_error_threshold: self.consecutive_error_threshold,
            consecutive_error_pause: Duration::from_millis(self.consecutive_error_pause_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    pub keep_alive_interval_ms: u64,
    pub subscriber_timeout_ms: u64,
    pub sse_retry_ms: u64,
    pub channel_capacity: usize,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            keep_alive_interval_ms: 15_000,
            subscriber_timeout_ms: 300_000,
            sse_retry_ms: 15_000,
            channel_capacity: 256,
        }
    }
}

impl ProgressSettings {
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_millis(self.keep_alive_interval_ms)
    }

    pub fn subscriber_timeout(&self) -> Duration {
        Duration::from_millis(self.subscriber_timeout_ms)
    }

    pub fn sse_retry(&self) -> Duration {
        Duration::from_millis(self.sse_retry_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Settings {
    /// Layers `appsettings.{environment}` (optional) under `APP__SECTION__KEY` variables.
    ///
    /// `OPENROUTER_API_KEY`, when set, replaces `oracle.api_key`.
    pub fn load(environment: Environment) -> Result<Self, SettingsError> {
        let file_name = format!("appsettings.{}", environment.as_str().to_lowercase());
        let configuration = Config::builder()
            .add_source(File::with_name(&file_name).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = configuration.try_deserialize()?;
        if let Ok(api_key) = std::env::var(API_KEY_OVERRIDE) {
            if !api_key.trim().is_empty() {
                settings.oracle.api_key = api_key;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut problems = Vec::new();

        if self.batch.size == 0 {
            problems.push("batch.size must be positive");
        }
        if self.pacing.capacity == 0 {
            problems.push("pacing.capacity must be positive");
        }
        if self.pacing.refill_period_ms == 0 {
            problems.push("pacing.refill_period_ms must be positive");
        }
        if self.progress.channel_capacity == 0 {
            problems.push("progress.channel_capacity must be positive");
        }
        if self.progress.keep_alive_interval_ms == 0 {
            problems.push("progress.keep_alive_interval_ms must be positive");
        }
        if self.retry.call_timeout_ms == 0 {
            problems.push("retry.call_timeout_ms must be positive");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Invalid(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_validating_then_passes() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn given_zero_batch_size_when_validating_then_names_the_key() {
        let mut settings = Settings::default();
        settings.batch.size = 0;

        let err = settings.validate().unwrap_err();

        assert!(err.to_string().contains("batch.size must be positive"));
    }

    #[test]
    fn given_several_problems_when_validating_then_reports_all() {
        let mut settings = Settings::default();
        settings.pacing.capacity = 0;
        settings.progress.channel_capacity = 0;

        let msg = settings.validate().unwrap_err().to_string();

        assert!(msg.contains("pacing.capacity"));
        assert!(msg.contains("progress.channel_capacity"));
    }

    #[test]
    fn given_retry_settings_when_building_policy_then_converts_millis() {
        let retry = RetrySettings {
            max_retries: 2,
            backoff_base_ms: 250,
            rate_limit_cooldown_ms: 1_000,
            call_timeout_ms: 5_000,
        };

        let policy = retry.policy();

        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.backoff_base, Duration::from_millis(250));
        assert_eq!(policy.rate_limit_cooldown, Duration::from_secs(1));
        assert_eq!(policy.call_timeout, Duration::from_secs(5));
    }
}
