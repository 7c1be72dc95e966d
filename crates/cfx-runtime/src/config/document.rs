use std::fs;
use std::path::Path;

use cfx_types::{ModuleDescriptor, OverlayVariant, FRAMEWORK_NAME};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::identity::{random_uid, resolve_ip4};
use super::{ConfigError, FrameworkSettings};

const SENDER_SECTION: &str = "TincanSender";
const SENDER_KEYS: [&str; 3] = ["switchmode", "localhost", "localhost6"];

/// The merged configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    document: Map<String, Value>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let defaults = match serde_json::to_value(FrameworkSettings::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut document = Map::new();
        document.insert(FRAMEWORK_NAME.to_string(), Value::Object(defaults));
        Self { document }
    }
}

impl ControllerConfig {
    /// Defaults only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults merged with `value`, which must be a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Value::Object(document) = value else {
            return Err(ConfigError::NotAnObject);
        };
        let mut config = Self::new();
        config.merge_document(document);
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Read the configuration file at `path` and merge it over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        info!(path = %path.display(), sections = config.document.len(), "Configuration loaded");
        Ok(config)
    }

    /// Merge `incoming` section by section.
    ///
    /// Keys of an object section are merged into the existing section; any
    /// other value replaces it. New sections are appended in their order.
    pub fn merge_document(&mut self, incoming: Map<String, Value>) {
        for (section, value) in incoming {
            merge_section(&mut self.document, section, value);
        }
    }

    /// Apply a literal JSON override string.
    ///
    /// Only sections that already exist are updated; unknown sections are
    /// logged and ignored.
    pub fn apply_override(&mut self, json: &str) -> Result<(), ConfigError> {
        let Value::Object(overrides) = serde_json::from_str(json)? else {
            return Err(ConfigError::NotAnObject);
        };
        for (section, value) in overrides {
            if self.document.contains_key(&section) {
                debug!(section = %section, "Applying configuration override");
                merge_section(&mut self.document, section, value);
            } else {
                warn!(section = %section, "Override names an unknown section; ignored");
            }
        }
        Ok(())
    }

    /// Fill in generated values. Returns `true` if the document changed.
    pub fn setup(&mut self) -> Result<bool, ConfigError> {
        let settings = self.settings()?;
        if !settings.local_uid.is_empty() {
            return Ok(false);
        }
        let uid = random_uid(settings.uid_size);
        info!(uid = %uid, "Generated local identity");
        self.set_framework_value("local_uid", Value::String(uid));
        Ok(true)
    }

    /// Set one key of the `CFx` section.
    pub fn set_framework_value(&mut self, key: &str, value: Value) {
        let section = self
            .document
            .entry(FRAMEWORK_NAME.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !section.is_object() {
            *section = Value::Object(Map::new());
        }
        if let Value::Object(map) = section {
            map.insert(key.to_string(), value);
        }
    }

    /// Raw section by name.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.document.get(name)
    }

    /// Section names in declaration order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.document.keys().map(String::as_str)
    }

    /// Typed framework settings.
    ///
    /// `switchmode`, `localhost` and `localhost6` are daemon settings that
    /// older documents keep in the `TincanSender` section. When present
    /// there they take precedence over `CFx`.
    pub fn settings(&self) -> Result<FrameworkSettings, ConfigError> {
        let mut section = self
            .document
            .get(FRAMEWORK_NAME)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        self.lift_sender_keys(&mut section);
        serde_json::from_value(section).map_err(|e| ConfigError::Invalid {
            field: FRAMEWORK_NAME.to_string(),
            reason: e.to_string(),
        })
    }

    fn lift_sender_keys(&self, framework: &mut Value) {
        let (Some(Value::Object(sender)), Value::Object(framework)) =
            (self.document.get(SENDER_SECTION), framework)
        else {
            return;
        };
        for key in SENDER_KEYS {
            let Some(value) = sender.get(key) else {
                continue;
            };
            if framework.get(key) != Some(value) {
                warn!(
                    section = SENDER_SECTION,
                    key,
                    value = %value,
                    "Daemon setting taken from the TincanSender section over CFx"
                );
            }
            framework.insert(key.to_string(), value.clone());
        }
    }

    /// One descriptor per module section, in declaration order.
    pub fn descriptors(&self) -> Result<Vec<ModuleDescriptor>, ConfigError> {
        self.document
            .iter()
            .filter(|(name, _)| name.as_str() != FRAMEWORK_NAME)
            .map(|(name, entry)| ModuleDescriptor::from_config_entry(name, entry).map_err(Into::into))
            .collect()
    }

    /// Check the settings every run needs before any module is loaded.
    pub fn validate(&self) -> Result<FrameworkSettings, ConfigError> {
        let settings = self.settings()?;

        if settings.xmpp_username.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingField("xmpp_username"));
        }
        if settings.xmpp_host.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingField("xmpp_host"));
        }
        if settings.vpn_type == OverlayVariant::SocialVpn && settings.local_uid.is_empty() {
            return Err(ConfigError::MissingField("local_uid"));
        }
        resolve_ip4(self, &settings)?;

        Ok(settings)
    }

    /// Write the document to `path`, pretty-printed with sorted keys.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let sorted = sort_keys(Value::Object(self.document.clone()));
        let body = serde_json::to_string_pretty(&sorted)?;
        fs::write(path, body).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.document.clone())
    }
}

fn merge_section(document: &mut Map<String, Value>, section: String, value: Value) {
    match (document.get_mut(&section), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (key, value) in incoming {
                existing.insert(key, value);
            }
        }
        (_, value) => {
            document.insert(section, value);
        }
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
