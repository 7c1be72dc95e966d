//! # Control Block Transfer (CBT)
//!
//! The envelope used for all communication between Controller Modules.
//!
//! ## Properties
//!
//! - **Addressing**: `initiator` and `recipient` are module names as they
//!   appear in the configuration document.
//! - **Action**: an opaque tag chosen by the modules. `TERMINATE` is reserved
//!   for the framework.
//! - **Payload**: opaque JSON data. The bus never looks inside it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name under which the framework itself appears as a CBT initiator, and the
/// reserved configuration section holding framework-wide settings.
pub const FRAMEWORK_NAME: &str = "CFx";

/// A Control Block Transfer.
///
/// Fields are private so that an envelope cannot change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cbt {
    initiator: String,
    recipient: String,
    action: String,
    data: Value,
}

impl Cbt {
    /// Action carried by the framework's termination envelope.
    pub const TERMINATE: &'static str = "TERMINATE";

    /// Create a new envelope.
    pub fn new(
        initiator: impl Into<String>,
        recipient: impl Into<String>,
        action: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            initiator: initiator.into(),
            recipient: recipient.into(),
            action: action.into(),
            data,
        }
    }

    /// The termination envelope the shutdown coordinator injects into a
    /// module's mailbox.
    pub fn termination(recipient: impl Into<String>) -> Self {
        Self::new(FRAMEWORK_NAME, recipient, Self::TERMINATE, Value::Null)
    }

    /// Build a reply addressed back to this envelope's initiator.
    pub fn reply(&self, action: impl Into<String>, data: Value) -> Self {
        Self::new(self.recipient.clone(), self.initiator.clone(), action, data)
    }

    pub fn initiator(&self) -> &str {
        &self.initiator
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Consume the envelope and return its payload.
    pub fn into_data(self) -> Value {
        self.data
    }

    /// True if this is the framework's termination envelope.
    #[must_use]
    pub fn is_termination(&self) -> bool {
        self.action == Self::TERMINATE && self.initiator == FRAMEWORK_NAME
    }
}
