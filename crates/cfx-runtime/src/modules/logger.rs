//! Logs every CBT it receives.

use cfx_types::{Cbt, ControllerModule, ModuleError};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::context::ModuleContext;

/// Severity used for a CBT, chosen by its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

pub struct Logger {
    ctx: ModuleContext,
    /// Level for CBTs whose action is not a level name.
    default_level: LogLevel,
}

impl Logger {
    pub fn new(ctx: ModuleContext, config: &Value) -> Result<Self, ModuleError> {
        let default_level = match config.get("default_level").and_then(Value::as_str) {
            None => LogLevel::Info,
            Some(level) => LogLevel::from_action(level).ok_or_else(|| {
                ModuleError::Config(format!("unknown default_level {level}"))
            })?,
        };
        Ok(Self { ctx, default_level })
    }
}

impl ControllerModule for Logger {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        info!(module = %self.ctx.name(), "Logger loaded");
        Ok(())
    }

    fn process_cbt(&mut self, cbt: Cbt) -> Result<(), ModuleError> {
        let level = LogLevel::from_action(cbt.action()).unwrap_or(self.default_level);
        let message = match cbt.data() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let from = cbt.initiator();
        let action = cbt.action();

        match level {
            LogLevel::Debug => debug!(initiator = %from, action = %action, "{message}"),
            LogLevel::Info => info!(initiator = %from, action = %action, "{message}"),
            LogLevel::Warning => warn!(initiator = %from, action = %action, "{message}"),
            LogLevel::Error => error!(initiator = %from, action = %action, "{message}"),
        }
        Ok(())
    }

    fn terminate(&mut self) -> Result<(), ModuleError> {
        debug!(module = %self.ctx.name(), "Logger exiting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FrameworkSettings, PeerAddressBook};
    use cfx_bus::MessageBus;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> ModuleContext {
        ModuleContext::new(
            "Logger",
            Arc::new(MessageBus::new()),
            Arc::new(FrameworkSettings::default()),
            Arc::new(PeerAddressBook::new()),
        )
    }

    #[test]
    fn test_level_from_action() {
        assert_eq!(LogLevel::from_action("warning"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_action("TINCAN_MSG"), None);
    }

    #[test]
    fn test_accepts_any_cbt() {
        let mut logger = Logger::new(ctx(), &json!({})).unwrap();
        logger
            .process_cbt(Cbt::new("P", "Logger", "error", json!("boom")))
            .unwrap();
        logger
            .process_cbt(Cbt::new("P", "Logger", "TINCAN_MSG", json!({"type": "con_stat"})))
            .unwrap();
    }

    #[test]
    fn test_bad_default_level() {
        assert!(matches!(
            Logger::new(ctx(), &json!({"default_level": "loud"})),
            Err(ModuleError::Config(_))
        ));
    }
}
