mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    BatchSettings, LoggingSettings, OracleSettings, PacingSettings, ProgressSettings,
    RetrySettings, ServerSettings, Settings, SettingsError,
};
