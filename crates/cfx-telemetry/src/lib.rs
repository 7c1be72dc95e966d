//! # CFx Telemetry
//!
//! Logging and metrics for the controller runtime.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with an environment filter, pretty or
//!   JSON output.
//! - **Metrics**: Prometheus counters for CBT traffic and module faults.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cfx_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // Modules log through `tracing`, the bus counts CBTs.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CFX_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CFX_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |
//! | `CFX_LOG_THREADS` | `true` | Include thread names (one thread per module) |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, CBT_PROCESSED, CBT_ROUTING_ERRORS,
    CBT_SUBMITTED, MODULE_FAULTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register metrics.
///
/// The returned guard keeps the metrics registry alive; hold it for the
/// lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Telemetry shut down");
    }
}

/// Log a CBT-related event with the envelope's addressing fields.
///
/// ```rust,ignore
/// log_cbt_event!(warn, cbt, "Dropping CBT", reason = "unsupported");
/// ```
#[macro_export]
macro_rules! log_cbt_event {
    ($level:ident, $cbt:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            initiator = %$cbt.initiator(),
            recipient = %$cbt.recipient(),
            action = %$cbt.action(),
            $($($field)*,)?
            $msg
        )
    };
}
