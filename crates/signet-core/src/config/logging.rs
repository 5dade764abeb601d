use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output JSON format.
    #[serde(default)]
    pub json_format: bool,

    /// Statements slower than this are logged at warn level. 0 disables it.
    #[serde(default = "default_slow_statement_threshold")]
    pub slow_statement_threshold_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            slow_statement_threshold_ms: default_slow_statement_threshold(),
        }
    }
}

impl LoggingConfig {
    pub fn slow_statement_threshold(&self) -> Option<Duration> {
        (self.slow_statement_threshold_ms > 0)
            .then(|| Duration::from_millis(self.slow_statement_threshold_ms))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_slow_statement_threshold() -> u64 {
    100
}
