//! # Built-in Controller Modules
//!
//! | Module           | Constructor    | Role                                   |
//! |------------------|----------------|----------------------------------------|
//! | `Logger`         | standard       | logs CBTs sent to it                   |
//! | `TincanSender`   | with transport | CBT requests → daemon control calls    |
//! | `TincanListener` | with transport | daemon notifications → CBTs            |

pub mod logger;
pub mod tincan_listener;
pub mod tincan_sender;

pub use logger::Logger;
pub use tincan_listener::TincanListener;
pub use tincan_sender::TincanSender;

use crate::registry::ModuleCatalog;

/// Catalog with every built-in module registered for all variants.
pub fn builtin_catalog() -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    catalog
        .register("Logger", Logger::new)
        .register_with_transport("TincanSender", TincanSender::new)
        .register_with_transport("TincanListener", TincanListener::new);
    catalog
}
