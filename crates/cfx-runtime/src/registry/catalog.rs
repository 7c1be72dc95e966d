//! # Module Catalog
//!
//! Startup-time table from module name (and optionally overlay variant) to
//! the code that builds it. Lookup prefers the variant-specific entry and
//! falls back to the generic one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cfx_types::{ControllerModule, DynModule, ModuleError, OverlayVariant};
use serde_json::Value;

use crate::context::ModuleContext;
use crate::control::ControlTransport;

type StandardFn = dyn Fn(ModuleContext, &Value) -> Result<DynModule, ModuleError> + Send + Sync;
type TransportFn =
    dyn Fn(ControlTransport, ModuleContext, &Value) -> Result<DynModule, ModuleError> + Send + Sync;

/// How a module is built.
#[derive(Clone)]
pub enum ModuleConstructor {
    /// Context and configuration section only.
    Standard(Arc<StandardFn>),
    /// Also receives its own handles to the control sockets.
    WithTransport(Arc<TransportFn>),
}

impl fmt::Debug for ModuleConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(_) => f.write_str("Standard"),
            Self::WithTransport(_) => f.write_str("WithTransport"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    entries: HashMap<(String, Option<OverlayVariant>), ModuleConstructor>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module for every overlay variant.
    pub fn register<M, F>(&mut self, name: &str, build: F) -> &mut Self
    where
        M: ControllerModule + 'static,
        F: Fn(ModuleContext, &Value) -> Result<M, ModuleError> + Send + Sync + 'static,
    {
        self.insert(name, None, standard(build))
    }

    /// Register a module for one overlay variant only.
    pub fn register_for<M, F>(&mut self, name: &str, variant: OverlayVariant, build: F) -> &mut Self
    where
        M: ControllerModule + 'static,
        F: Fn(ModuleContext, &Value) -> Result<M, ModuleError> + Send + Sync + 'static,
    {
        self.insert(name, Some(variant), standard(build))
    }

    /// Register a module that owns the control transport.
    pub fn register_with_transport<M, F>(&mut self, name: &str, build: F) -> &mut Self
    where
        M: ControllerModule + 'static,
        F: Fn(ControlTransport, ModuleContext, &Value) -> Result<M, ModuleError>
            + Send
            + Sync
            + 'static,
    {
        let ctor = ModuleConstructor::WithTransport(Arc::new(
            move |transport: ControlTransport, ctx: ModuleContext, config: &Value| {
                build(transport, ctx, config).map(|m| Box::new(m) as DynModule)
            },
        ));
        self.insert(name, None, ctor)
    }

    /// Register a prepared constructor.
    pub fn insert(
        &mut self,
        name: &str,
        variant: Option<OverlayVariant>,
        ctor: ModuleConstructor,
    ) -> &mut Self {
        self.entries.insert((name.to_string(), variant), ctor);
        self
    }

    /// Constructor for `name` under `variant`: variant-specific first, then
    /// generic.
    pub fn resolve(&self, name: &str, variant: OverlayVariant) -> Option<&ModuleConstructor> {
        self.entries
            .get(&(name.to_string(), Some(variant)))
            .or_else(|| self.entries.get(&(name.to_string(), None)))
    }

    pub fn contains(&self, name: &str, variant: OverlayVariant) -> bool {
        self.resolve(name, variant).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn standard<M, F>(build: F) -> ModuleConstructor
where
    M: ControllerModule + 'static,
    F: Fn(ModuleContext, &Value) -> Result<M, ModuleError> + Send + Sync + 'static,
{
    ModuleConstructor::Standard(Arc::new(move |ctx: ModuleContext, config: &Value| {
        build(ctx, config).map(|m| Box::new(m) as DynModule)
    }))
}
