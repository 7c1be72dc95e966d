//! # Control Socket
//!
//! The controller drives the data-plane daemon with JSON datagrams over UDP
//! loopback. Every datagram starts with a two-byte header:
//!
//! ```text
//! ┌──────────────┬───────────────┬──────────────────────────────┐
//! │ IPOP_VERSION │ message type  │ JSON body {"m": method, ...} │
//! │    1 byte    │    1 byte     │                              │
//! └──────────────┴───────────────┴──────────────────────────────┘
//! ```
//!
//! Calls are fire-and-forget; replies and notifications come back on the
//! transport's sockets and are picked up by the listener module.

mod bootstrap;
mod call;
mod transport;

pub use bootstrap::{bootstrap_calls, bootstrap_daemon};
pub use call::{encode_body, ControlCall, Secret};
pub use transport::ControlTransport;

use thiserror::Error;

/// Protocol version byte.
pub const IPOP_VERSION: u8 = 0x02;
/// Message type of JSON control traffic.
pub const TINCAN_CONTROL: u8 = 0x01;
/// Message type of raw packets relayed by the daemon.
pub const TINCAN_PACKET: u8 = 0x02;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control socket I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode control message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cannot resolve daemon address {0}")]
    Unresolved(String),
}

impl From<ControlError> for cfx_types::ModuleError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Io(e) => Self::Io(e),
            other => Self::Other(other.to_string()),
        }
    }
}
