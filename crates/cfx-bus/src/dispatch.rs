//! # CBT Dispatch
//!
//! Routes envelopes to the mailbox of the named recipient.

use std::collections::HashMap;
use std::sync::Arc;

use cfx_telemetry::{log_cbt_event, CBT_ROUTING_ERRORS, CBT_SUBMITTED};
use cfx_types::{Cbt, RoutingError};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::mailbox::Mailbox;

/// Name → mailbox routing table.
///
/// Written while modules are loaded and while they are torn down; read by
/// every `submit` in between.
#[derive(Default)]
pub struct MessageBus {
    routes: RwLock<HashMap<String, Arc<Mailbox>>>,
}

impl MessageBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an envelope. Nothing is sent until [`MessageBus::submit`].
    pub fn create(
        &self,
        initiator: impl Into<String>,
        recipient: impl Into<String>,
        action: impl Into<String>,
        data: Value,
    ) -> Cbt {
        Cbt::new(initiator, recipient, action, data)
    }

    /// Append `cbt` to its recipient's mailbox.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::UnknownRecipient`] if no module of that name is
    ///   registered (never loaded, or disabled in configuration).
    /// - [`RoutingError::ReservedAction`] for any CBT carrying the
    ///   termination action, whatever its initiator. Termination is only
    ///   injected by the shutdown coordinator through
    ///   [`Mailbox::clear_and_inject`].
    pub fn submit(&self, cbt: Cbt) -> Result<(), RoutingError> {
        if cbt.action() == Cbt::TERMINATE {
            warn!(
                initiator = %cbt.initiator(),
                recipient = %cbt.recipient(),
                "Rejected CBT carrying the reserved termination action"
            );
            CBT_ROUTING_ERRORS.with_label_values(&["reserved_action"]).inc();
            return Err(RoutingError::ReservedAction {
                initiator: cbt.initiator().to_string(),
                action: cbt.action().to_string(),
            });
        }

        let mailbox = self.routes.read().get(cbt.recipient()).cloned();
        let Some(mailbox) = mailbox else {
            log_cbt_event!(warn, cbt, "CBT addressed to a module that is not loaded");
            CBT_ROUTING_ERRORS.with_label_values(&["unknown_recipient"]).inc();
            return Err(RoutingError::UnknownRecipient {
                initiator: cbt.initiator().to_string(),
                recipient: cbt.recipient().to_string(),
                action: cbt.action().to_string(),
            });
        };

        log_cbt_event!(trace, cbt, "CBT submitted");
        mailbox.push(cbt);
        CBT_SUBMITTED.inc();
        Ok(())
    }

    /// Make `mailbox` reachable under its owner's name.
    pub fn register(&self, mailbox: Arc<Mailbox>) -> Result<(), RoutingError> {
        let mut routes = self.routes.write();
        if routes.contains_key(mailbox.owner()) {
            return Err(RoutingError::DuplicateRecipient(mailbox.owner().to_string()));
        }
        debug!(module = %mailbox.owner(), "Mailbox registered");
        routes.insert(mailbox.owner().to_string(), mailbox);
        Ok(())
    }

    /// Remove a route. Later submissions to `name` fail.
    pub fn deregister(&self, name: &str) -> Option<Arc<Mailbox>> {
        self.routes.write().remove(name)
    }

    /// Look up a mailbox by module name.
    pub fn mailbox(&self, name: &str) -> Option<Arc<Mailbox>> {
        self.routes.read().get(name).cloned()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.routes.read().contains_key(name)
    }

    /// Sorted list of reachable module names.
    pub fn recipients(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}
