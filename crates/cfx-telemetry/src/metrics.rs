//! Prometheus metrics for the CFx runtime.
//!
//! All metrics follow the naming convention: `cfx_<area>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// CBTs accepted by the bus
    pub static ref CBT_SUBMITTED: Counter = Counter::new(
        "cfx_cbt_submitted_total",
        "Total number of CBTs enqueued on a module mailbox"
    ).expect("metric creation failed");

    /// CBTs the bus could not route
    pub static ref CBT_ROUTING_ERRORS: CounterVec = CounterVec::new(
        Opts::new("cfx_cbt_routing_errors_total", "Total CBTs rejected by the bus"),
        &["reason"]  // unknown_recipient, reserved_action
    ).expect("metric creation failed");

    /// CBTs handed to a module's worker
    pub static ref CBT_PROCESSED: CounterVec = CounterVec::new(
        Opts::new("cfx_cbt_processed_total", "Total CBTs processed by module workers"),
        &["module"]
    ).expect("metric creation failed");

    /// Errors and panics caught in module hooks
    pub static ref MODULE_FAULTS: CounterVec = CounterVec::new(
        Opts::new("cfx_module_faults_total", "Faults caught in module hooks"),
        &["module", "hook"]  // hook: process_cbt, timer_method, terminate
    ).expect("metric creation failed");
}

/// Handle to the registered metrics.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Fails if called twice in the same process.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CBT_SUBMITTED.clone()),
        Box::new(CBT_ROUTING_ERRORS.clone()),
        Box::new(CBT_PROCESSED.clone()),
        Box::new(MODULE_FAULTS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
