use crate::presentation::config::LoggingSettings;

/// Configuration for tracing initialization.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub default_directive: String,
}

impl TracingConfig {
    pub fn from_settings(settings: &LoggingSettings, environment: &str) -> Self {
        let json_override = std::env::var("LOG_FORMAT")
            .map(|v| v.to_lowercase() == "json")
            .unwrap_or(false);
        Self {
            environment: environment.to_string(),
            json_format: settings.enable_json || json_override,
            default_directive: format!(
                "{},topicsieve=debug,tower_http=debug",
                settings.level
            ),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),
            json_format: std::env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
            default_directive: "info,topicsieve=debug,tower_http=debug".to_string(),
        }
    }
}
