use std::collections::HashMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use super::ConfigError;

/// Static uid → IPv4 assignments for peers, read from the `-p` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerAddressBook {
    peers: HashMap<String, Ipv4Addr>,
}

impl PeerAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object mapping uid to IPv4 address.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let entries = value.as_object().ok_or(ConfigError::NotAnObject)?;
        let mut peers = HashMap::with_capacity(entries.len());
        for (uid, ip4) in entries {
            let addr = ip4
                .as_str()
                .and_then(|s| s.parse::<Ipv4Addr>().ok())
                .ok_or_else(|| ConfigError::Invalid {
                    field: format!("peer {uid}"),
                    reason: format!("{ip4} is not an IPv4 address"),
                })?;
            peers.insert(uid.clone(), addr);
        }
        Ok(Self { peers })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let book = Self::from_value(&serde_json::from_str(&raw)?)?;
        info!(path = %path.display(), peers = book.len(), "Peer addresses loaded");
        Ok(book)
    }

    pub fn insert(&mut self, uid: impl Into<String>, ip4: Ipv4Addr) {
        self.peers.insert(uid.into(), ip4);
    }

    pub fn peer_ip4(&self, uid: &str) -> Option<Ipv4Addr> {
        self.peers.get(uid).copied()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
