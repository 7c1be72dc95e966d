//! # Module Context
//!
//! What a Controller Module gets at construction instead of a reference to
//! the framework: its own name, a way to create and submit CBTs, read-only
//! framework settings and the peer address book.

use std::net::Ipv4Addr;
use std::sync::Arc;

use cfx_bus::MessageBus;
use cfx_types::{Cbt, RoutingError};
use serde_json::Value;

use crate::config::{FrameworkSettings, PeerAddressBook};

#[derive(Clone)]
pub struct ModuleContext {
    name: Arc<str>,
    bus: Arc<MessageBus>,
    settings: Arc<FrameworkSettings>,
    peers: Arc<PeerAddressBook>,
}

impl ModuleContext {
    pub fn new(
        name: &str,
        bus: Arc<MessageBus>,
        settings: Arc<FrameworkSettings>,
        peers: Arc<PeerAddressBook>,
    ) -> Self {
        Self {
            name: Arc::from(name),
            bus,
            settings,
            peers,
        }
    }

    /// The owning module's name; used as initiator of every CBT it creates.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a CBT from this module.
    pub fn create_cbt(&self, recipient: &str, action: &str, data: Value) -> Cbt {
        self.bus.create(&*self.name, recipient, action, data)
    }

    pub fn submit_cbt(&self, cbt: Cbt) -> Result<(), RoutingError> {
        self.bus.submit(cbt)
    }

    /// Create and submit in one step.
    pub fn send(&self, recipient: &str, action: &str, data: Value) -> Result<(), RoutingError> {
        self.submit_cbt(self.create_cbt(recipient, action, data))
    }

    pub fn settings(&self) -> &FrameworkSettings {
        &self.settings
    }

    /// See [`FrameworkSettings::query`].
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.settings.query(name)
    }

    pub fn peer_ip4(&self, uid: &str) -> Option<Ipv4Addr> {
        self.peers.peer_ip4(uid)
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
