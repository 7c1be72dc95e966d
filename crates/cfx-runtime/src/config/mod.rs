//! # Controller Configuration
//!
//! The configuration document is a JSON object keyed by module name. Keys keep
//! their declaration order, which is also the order modules are loaded in.
//! The reserved `CFx` section holds the framework's own settings.
//!
//! ## Layering
//!
//! ```text
//! defaults ──► config file (-c) ──► override string (-s) ──► setup (local_uid)
//!              per-section merge     existing sections only
//! ```

mod credentials;
mod document;
mod identity;
mod peers;
mod settings;

pub use credentials::{resolve_password, PasswordPrompt, TerminalPrompt, PASSWORD_ENV};
pub use document::ControllerConfig;
pub use identity::{gen_ip6, gen_uid, random_uid, resolve_ip4, NodeIdentity};
pub use peers::PeerAddressBook;
pub use settings::FrameworkSettings;

use std::path::PathBuf;

use cfx_types::DescriptorError;
use thiserror::Error;

/// Configuration and identity errors. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("the configuration document must be a JSON object")]
    NotAnObject,

    #[error("missing required setting {0} in the CFx section")]
    MissingField(&'static str),

    #[error("no password for {username}: set xmpp_password, {env} or enter it at the prompt")]
    MissingCredential { username: String, env: &'static str },

    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}
