//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include thread names in log lines
    pub thread_names: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "cfx".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            thread_names: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CFX_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CFX_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `CFX_LOG_THREADS`: Include thread names (default: true)
    pub fn from_env() -> Self {
        Self {
            service_name: "cfx".to_string(),

            log_level: env::var("CFX_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("CFX_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),

            thread_names: env::var("CFX_LOG_THREADS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    /// Raise the log level by `verbosity` steps (`-v` on the command line).
    ///
    /// Only plain level names are raised; a custom filter directive is kept.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

        if let Some(pos) = LEVELS.iter().position(|l| *l == self.log_level) {
            let raised = (pos + verbosity as usize).min(LEVELS.len() - 1);
            self.log_level = LEVELS[raised].to_string();
        }
        self
    }
}
