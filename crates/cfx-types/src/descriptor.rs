//! # Module Descriptor
//!
//! Everything the loader needs to know about one Controller Module, taken
//! from its section of the configuration document.

use std::time::Duration;

use serde_json::Value;

use crate::errors::DescriptorError;

/// Static description of a Controller Module.
///
/// Immutable once the configuration has been loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDescriptor {
    /// Unique module name (the configuration key).
    pub name: String,
    /// Modules that must be constructed and initialized first, in order.
    pub dependencies: Vec<String>,
    /// Disabled modules are never constructed nor registered.
    pub enabled: bool,
    /// Whether shutdown waits for this module's threads to exit.
    pub join_enabled: bool,
    /// Period of the optional timer context.
    pub timer_interval: Option<Duration>,
    /// The module's whole configuration section, passed to its constructor.
    pub config: Value,
}

impl ModuleDescriptor {
    /// Create an enabled, join-enabled descriptor with no dependencies.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            enabled: true,
            join_enabled: true,
            timer_interval: None,
            config: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set dependencies.
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the module as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn join_enabled(mut self, join: bool) -> Self {
        self.join_enabled = join;
        self
    }

    /// Enable the timer context with the given period.
    pub fn with_timer(mut self, interval: Duration) -> Self {
        self.timer_interval = Some(interval);
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Parse a descriptor from a configuration section.
    ///
    /// Recognised keys: `dependencies` (list of names), `enabled` (bool,
    /// default true), `joinEnabled` / `join_enabled` (bool, default true) and
    /// `timer_interval` (seconds, positive). Everything else is left for the
    /// module itself.
    pub fn from_config_entry(name: &str, entry: &Value) -> Result<Self, DescriptorError> {
        let invalid = |reason: &str| DescriptorError::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let Some(section) = entry.as_object() else {
            return Err(invalid("section must be a JSON object"));
        };

        let dependencies = match section.get("dependencies") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("dependencies must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(invalid("dependencies must be a list")),
        };

        let flag = |key: &str| -> Result<Option<bool>, DescriptorError> {
            match section.get(key) {
                None => Ok(None),
                Some(Value::Bool(b)) => Ok(Some(*b)),
                Some(_) => Err(invalid(&format!("{key} must be a boolean"))),
            }
        };

        let enabled = flag("enabled")?.unwrap_or(true);
        let join_enabled = match flag("joinEnabled")? {
            Some(b) => b,
            None => flag("join_enabled")?.unwrap_or(true),
        };

        let timer_interval = match section.get("timer_interval") {
            None | Some(Value::Null) => None,
            Some(v) => {
                let secs = v
                    .as_f64()
                    .filter(|s| s.is_finite() && *s > 0.0)
                    .ok_or_else(|| invalid("timer_interval must be a positive number"))?;
                Some(Duration::from_secs_f64(secs))
            }
        };

        Ok(Self {
            name: name.to_string(),
            dependencies,
            enabled,
            join_enabled,
            timer_interval,
            config: entry.clone(),
        })
    }
}
