//! Integration flows across cfx-types, cfx-bus, cfx-telemetry and cfx-runtime.

pub mod config_flows;
pub mod overlay_flows;
