//! # Error Types
//!
//! Errors shared between modules, the bus and the runtime.

use thiserror::Error;

/// Errors raised by a module's own hooks.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The module's configuration section is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The module does not handle this action.
    #[error("unsupported action {action} from {initiator}")]
    UnsupportedAction { action: String, initiator: String },

    /// The payload does not have the expected shape.
    #[error("malformed payload for {action}: {reason}")]
    Payload { action: String, reason: String },

    /// A CBT submitted by the module could not be routed.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors reported by the CBT bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No module with this name is registered (never loaded, or disabled).
    #[error("no module named {recipient} is loaded (CBT {action} from {initiator})")]
    UnknownRecipient {
        initiator: String,
        recipient: String,
        action: String,
    },

    /// Only the framework may send the termination action.
    #[error("{initiator} may not submit reserved action {action}")]
    ReservedAction { initiator: String, action: String },

    /// A mailbox is already registered under this name.
    #[error("a mailbox named {0} is already registered")]
    DuplicateRecipient(String),
}

/// Errors found while reading a module's configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("module {name}: {reason}")]
    Invalid { name: String, reason: String },
}
