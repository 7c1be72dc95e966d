//! # CFx Framework
//!
//! Owns the registry of module handles and drives them through startup and
//! shutdown.
//!
//! ```text
//! Cfx::new ──► load_all ──────────────► start_all ──────────► terminate
//!              cycle check              one worker (+timer)    clear mailboxes,
//!              construct + initialize   per module, in load    inject TERMINATE,
//!              in dependency order      order, then every      join where enabled
//!                                       start hook
//! ```
//!
//! Loading is all-or-nothing: if any module fails to construct or
//! initialize, every module loaded before it is torn down again and the
//! registry is left empty.

use std::collections::HashMap;
use std::sync::Arc;

use cfx_bus::{Mailbox, MessageBus};
use cfx_types::{Cbt, ModuleDescriptor, ModuleState, RoutingError, FRAMEWORK_NAME};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{ControllerConfig, FrameworkSettings, NodeIdentity, PeerAddressBook};
use crate::context::ModuleContext;
use crate::control::{bootstrap_daemon, ControlTransport};
use crate::error::StartupError;
use crate::handle::ModuleHandle;
use crate::registry::{Loader, ModuleCatalog, ModuleConstructor};
use crate::shutdown::{self, ShutdownReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Configured,
    Loaded,
    Running,
    Terminated,
}

/// Builds handles for descriptors.
struct ModuleFactory {
    catalog: ModuleCatalog,
    bus: Arc<MessageBus>,
    settings: Arc<FrameworkSettings>,
    peers: Arc<PeerAddressBook>,
    transport: Option<ControlTransport>,
}

impl ModuleFactory {
    fn build(&self, desc: &ModuleDescriptor) -> Result<ModuleHandle, StartupError> {
        let variant = self.settings.vpn_type;
        let ctor = self
            .catalog
            .resolve(&desc.name, variant)
            .ok_or_else(|| StartupError::UnknownModule {
                name: desc.name.clone(),
                variant,
            })?;

        let ctx = ModuleContext::new(
            &desc.name,
            Arc::clone(&self.bus),
            Arc::clone(&self.settings),
            Arc::clone(&self.peers),
        );
        let instance = match ctor {
            ModuleConstructor::Standard(build) => build(ctx, &desc.config),
            ModuleConstructor::WithTransport(build) => {
                let transport = self
                    .transport
                    .as_ref()
                    .ok_or_else(|| StartupError::MissingTransport(desc.name.clone()))?
                    .try_clone()?;
                build(transport, ctx, &desc.config)
            }
        }
        .map_err(|source| StartupError::Construction {
            name: desc.name.clone(),
            source,
        })?;

        let mailbox = Arc::new(Mailbox::new(desc.name.clone()));
        let mut handle = ModuleHandle::new(desc, instance, Arc::clone(&mailbox));

        // Registered before initialize so the initializer can reach itself
        // and its dependencies.
        self.bus.register(mailbox)?;
        if let Err(e) = handle.initialize() {
            self.bus.deregister(&desc.name);
            return Err(e);
        }
        Ok(handle)
    }
}

/// The controller framework.
pub struct Cfx {
    descriptors: Vec<ModuleDescriptor>,
    factory: ModuleFactory,
    handles: HashMap<String, ModuleHandle>,
    load_order: Vec<String>,
    phase: Phase,
}

impl Cfx {
    /// Framework for the modules named in `config`.
    pub fn new(config: &ControllerConfig, catalog: ModuleCatalog) -> Result<Self, StartupError> {
        Ok(Self::with_descriptors(
            config.settings()?,
            config.descriptors()?,
            catalog,
        ))
    }

    /// Framework for an explicit descriptor list.
    pub fn with_descriptors(
        settings: FrameworkSettings,
        descriptors: Vec<ModuleDescriptor>,
        catalog: ModuleCatalog,
    ) -> Self {
        Self {
            descriptors,
            factory: ModuleFactory {
                catalog,
                bus: Arc::new(MessageBus::new()),
                settings: Arc::new(settings),
                peers: Arc::new(PeerAddressBook::new()),
                transport: None,
            },
            handles: HashMap::new(),
            load_order: Vec::new(),
            phase: Phase::Configured,
        }
    }

    /// Control sockets handed (cloned) to transport-owning modules.
    pub fn with_transport(mut self, transport: ControlTransport) -> Self {
        self.factory.transport = Some(transport);
        self
    }

    pub fn with_peers(mut self, peers: PeerAddressBook) -> Self {
        self.factory.peers = Arc::new(peers);
        self
    }

    pub fn settings(&self) -> &FrameworkSettings {
        &self.factory.settings
    }

    pub fn bus(&self) -> Arc<MessageBus> {
        Arc::clone(&self.factory.bus)
    }

    // =========================================================================
    // STARTUP
    // =========================================================================

    /// Construct and initialize every enabled module in dependency order.
    ///
    /// On error nothing stays registered.
    pub fn load_all(&mut self) -> Result<(), StartupError> {
        if self.phase != Phase::Configured {
            return Err(StartupError::AlreadyLoaded);
        }
        info!(
            vpn_type = %self.factory.settings.vpn_type,
            modules = self.descriptors.len(),
            "Loading controller modules"
        );

        let factory = &self.factory;
        let handles = &mut self.handles;
        let result = Loader::new(&self.descriptors).load_all(|desc| {
            let handle = factory.build(desc)?;
            handles.insert(desc.name.clone(), handle);
            Ok(())
        });

        match result {
            Ok(order) => {
                self.load_order = order;
                self.phase = Phase::Loaded;
                Ok(())
            }
            Err(e) => {
                self.unload_partial();
                Err(e)
            }
        }
    }

    fn unload_partial(&mut self) {
        for (name, mut handle) in self.handles.drain() {
            warn!(module = %name, "Unloading module after failed startup");
            handle.terminate_inline();
            self.factory.bus.deregister(&name);
        }
        self.load_order.clear();
    }

    /// Start every loaded module's threads, in load order.
    pub fn start_all(&mut self) -> Result<(), StartupError> {
        match self.phase {
            Phase::Loaded => {}
            Phase::Configured => return Err(StartupError::NotLoaded),
            Phase::Running | Phase::Terminated => return Err(StartupError::AlreadyLoaded),
        }

        self.phase = Phase::Running;
        let mut failure: Option<StartupError> = None;
        for name in &self.load_order {
            let Some(handle) = self.handles.get_mut(name) else {
                continue;
            };
            if let Err(e) = handle.start() {
                warn!(module = %name, error = %e, "Start failed; stopping started modules");
                failure = Some(e.into());
                break;
            }
        }

        // Barrier passed: every worker is running before any start hook.
        if failure.is_none() {
            for name in &self.load_order {
                let Some(handle) = self.handles.get(name) else {
                    continue;
                };
                if let Err(e) = handle.activate() {
                    warn!(module = %name, error = %e, "Start hook failed; stopping modules");
                    failure = Some(e);
                    break;
                }
            }
        }
        if let Some(e) = failure {
            self.terminate();
            return Err(e);
        }
        info!(modules = self.load_order.len(), "All modules running");
        Ok(())
    }

    /// Send the daemon bootstrap sequence over the control transport.
    pub fn initialize_daemon(
        &self,
        identity: &NodeIdentity,
        password: &str,
    ) -> Result<usize, StartupError> {
        let transport = self
            .factory
            .transport
            .as_ref()
            .ok_or_else(|| StartupError::MissingTransport(FRAMEWORK_NAME.to_string()))?;
        Ok(bootstrap_daemon(
            transport,
            &self.factory.settings,
            identity,
            password,
        )?)
    }

    // =========================================================================
    // ROUTING
    // =========================================================================

    /// A CBT from the framework itself.
    pub fn create_cbt(&self, recipient: &str, action: &str, data: Value) -> Cbt {
        self.factory.bus.create(FRAMEWORK_NAME, recipient, action, data)
    }

    pub fn submit_cbt(&self, cbt: Cbt) -> Result<(), RoutingError> {
        self.factory.bus.submit(cbt)
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    pub fn module_state(&self, name: &str) -> Option<ModuleState> {
        self.handles.get(name).map(ModuleHandle::state)
    }

    pub fn module_count(&self) -> usize {
        self.handles.len()
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    /// Stop every module. Safe to call more than once.
    pub fn terminate(&mut self) -> ShutdownReport {
        if self.phase == Phase::Terminated {
            return ShutdownReport::default();
        }
        let report = shutdown::terminate_all(&self.factory.bus, &mut self.handles, &self.load_order);
        self.phase = Phase::Terminated;
        report
    }
}

impl std::fmt::Debug for Cfx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cfx")
            .field("phase", &self.phase)
            .field("load_order", &self.load_order)
            .finish_non_exhaustive()
    }
}
