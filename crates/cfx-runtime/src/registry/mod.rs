//! # Module Registry
//!
//! Everything that turns configuration into constructed modules: the
//! dependency graph, the load order and the name → constructor catalog.

pub mod catalog;
pub mod graph;
pub mod loader;

pub use catalog::{ModuleCatalog, ModuleConstructor};
pub use graph::{detect_cycle, DependencyGraph};
pub use loader::Loader;
