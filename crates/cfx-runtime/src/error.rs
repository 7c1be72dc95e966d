//! # Startup Errors
//!
//! Everything that can stop the controller before its modules run. All of
//! these are fatal: the process reports them and exits without starting any
//! worker.

use cfx_types::{ModuleError, ModuleState, OverlayVariant, RoutingError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::control::ControlError;

/// Fatal errors raised while loading or starting modules.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The dependency graph contains a cycle. No module has been loaded.
    #[error("circular dependency detected: {}", cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<String> },

    /// Two descriptors share a name.
    #[error("module {0} is declared more than once")]
    DuplicateModule(String),

    /// The catalog has no constructor for this module and variant.
    #[error("no implementation of module {name} for overlay variant {variant}")]
    UnknownModule {
        name: String,
        variant: OverlayVariant,
    },

    /// A transport-owning module was requested but no transport exists.
    #[error("module {0} needs the control transport but none was provided")]
    MissingTransport(String),

    #[error("failed to construct module {name}: {source}")]
    Construction {
        name: String,
        #[source]
        source: ModuleError,
    },

    #[error("failed to initialize module {name}: {source}")]
    Initialization {
        name: String,
        #[source]
        source: ModuleError,
    },

    #[error("failed to start module {name}: {source}")]
    Activation {
        name: String,
        #[source]
        source: ModuleError,
    },

    #[error("modules are already loaded")]
    AlreadyLoaded,

    #[error("modules must be loaded before they are started")]
    NotLoaded,

    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Errors from a module handle's lifecycle operations.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error("module {name} cannot move from {from} to {to}")]
    InvalidTransition {
        name: String,
        from: ModuleState,
        to: ModuleState,
    },

    #[error("failed to spawn thread for module {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
