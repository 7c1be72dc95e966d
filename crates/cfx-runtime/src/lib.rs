//! # CFx Runtime
//!
//! The controller framework. Controller Modules are plug-ins that talk to
//! each other only through CBTs; the runtime loads them, gives each one a
//! worker thread and a mailbox, and stops them again.
//!
//! ## Startup Sequence
//!
//! 1. Merge configuration (defaults, file, override string) and generate
//!    `local_uid` if missing
//! 2. Validate signaling settings, resolve the password and node identity
//! 3. Bind the control sockets and send the daemon bootstrap sequence
//! 4. Load modules in dependency order (cycle check first)
//! 5. Start every worker and timer, then run each module's `start` hook
//! 6. Wait for a shutdown signal, then terminate
//!
//! ## Modules
//!
//! - `registry/` - dependency graph, loader, module catalog
//! - `handle` - per-module threads and lifecycle state
//! - `framework` - the [`Cfx`] registry and startup barrier
//! - `shutdown` - two-pass termination
//! - `config/` - configuration document, identity, credentials, peers
//! - `control/` - control calls and the UDP transport
//! - `modules/` - built-in Logger, TincanSender, TincanListener

pub mod cli;
pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod framework;
pub mod handle;
pub mod modules;
pub mod registry;
pub mod shutdown;

pub use context::ModuleContext;
pub use error::{HandleError, StartupError};
pub use framework::Cfx;
pub use handle::ModuleHandle;
pub use modules::builtin_catalog;
pub use registry::{DependencyGraph, ModuleCatalog, ModuleConstructor};
pub use shutdown::{wait_for_shutdown_signal, ShutdownReport};
