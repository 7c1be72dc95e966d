//! # CFx Bus - CBT Dispatch Between Controller Modules
//!
//! Every loaded module owns exactly one [`Mailbox`]. The [`MessageBus`] maps
//! module names to mailboxes and is the only way modules reach each other.
//!
//! ## Rules
//!
//! - **Mailboxes only:** modules never call each other directly.
//! - **FIFO per recipient:** envelopes submitted to the same recipient are
//!   delivered in submission order, whoever submitted them. Nothing is
//!   promised across recipients.
//! - **At-most-once:** nothing is persisted; envelopes still queued when the
//!   process exits are lost.
//! - **No silent drops:** an envelope addressed to a module that is not loaded
//!   is logged and returned to the caller as a [`RoutingError`].
//!
//! ```text
//! ┌──────────┐  submit(cbt)  ┌──────────────┐  push   ┌─────────────┐  recv  ┌──────────┐
//! │ Module P │ ────────────► │  MessageBus  │ ──────► │ Mailbox (Q) │ ─────► │ worker Q │
//! └──────────┘               │ name → mbox  │         └─────────────┘        └──────────┘
//!                            └──────────────┘
//! ```

pub mod dispatch;
pub mod mailbox;

pub use cfx_types::RoutingError;
pub use dispatch::MessageBus;
pub use mailbox::Mailbox;
