//! # Controller Module Contract
//!
//! Defines the interface every Controller Module implements so that the
//! runtime can load, drive and stop it without knowing what it does.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use cfx_types::{Cbt, ControllerModule, ModuleError};
//!
//! pub struct Echo { /* context, config ... */ }
//!
//! impl ControllerModule for Echo {
//!     fn initialize(&mut self) -> Result<(), ModuleError> { Ok(()) }
//!     fn process_cbt(&mut self, cbt: Cbt) -> Result<(), ModuleError> { Ok(()) }
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cbt::Cbt;
use crate::errors::ModuleError;

/// The contract between the runtime and a Controller Module.
///
/// Hooks run on threads owned by the module's handle:
/// - `initialize` on the loading thread, before any worker starts;
/// - `start` on the loading thread, once every worker is running;
/// - `process_cbt` and `terminate` on the worker thread;
/// - `timer_method` on the timer thread, if the module has one.
///
/// An `Err` (or a panic) from `process_cbt` or `timer_method` is logged by
/// the runtime and does not stop the module.
pub trait ControllerModule: Send {
    /// One-time setup. Dependencies are already constructed and initialized.
    fn initialize(&mut self) -> Result<(), ModuleError>;

    /// Called after the startup barrier: every enabled module is registered
    /// and its worker is running. Background producers start here.
    fn start(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Handle one envelope taken from the module's mailbox.
    fn process_cbt(&mut self, cbt: Cbt) -> Result<(), ModuleError>;

    /// Periodic work, called every `timer_interval`.
    fn timer_method(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Called once on the worker thread after the termination envelope.
    fn terminate(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// A type-erased module instance.
pub type DynModule = Box<dyn ControllerModule>;

/// Lifecycle state of a module handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleState {
    /// Instance built, initializer not yet run.
    Constructed,
    /// Initializer completed.
    Initialized,
    /// Worker (and timer) threads started.
    Running,
    /// Mailbox cleared and termination envelope injected.
    Terminating,
    /// Worker has exited.
    Stopped,
}

impl ModuleState {
    /// Whether the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: ModuleState) -> bool {
        matches!(
            (self, next),
            (Self::Constructed, Self::Initialized)
                | (Self::Initialized, Self::Running)
                | (Self::Running, Self::Terminating)
                | (Self::Terminating, Self::Stopped)
        )
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Overlay strategy selecting which implementation satisfies a module name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayVariant {
    #[serde(rename = "GroupVPN")]
    GroupVpn,
    #[serde(rename = "SocialVPN")]
    SocialVpn,
}

impl OverlayVariant {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupVpn => "GroupVPN",
            Self::SocialVpn => "SocialVPN",
        }
    }

    /// Address translation mode the data-plane daemon runs with.
    #[must_use]
    pub fn translation_mode(&self) -> u8 {
        match self {
            Self::GroupVpn => 0,
            Self::SocialVpn => 1,
        }
    }
}

impl fmt::Display for OverlayVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverlayVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GroupVPN" => Ok(Self::GroupVpn),
            "SocialVPN" => Ok(Self::SocialVpn),
            other => Err(format!("unknown overlay variant {other}")),
        }
    }
}
