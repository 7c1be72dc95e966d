//! # Module Handle
//!
//! Owns one module instance, its mailbox and the threads that drive it.
//!
//! ```text
//!  Constructed ──initialize──► Initialized ──start──► Running
//!                                                       │ coordinator clears mailbox,
//!                                                       ▼ injects TERMINATE
//!                              Stopped ◄──worker exit── Terminating
//! ```
//!
//! ## Threads
//!
//! - `cm-<name>`: pops the mailbox and calls `process_cbt`, one CBT at a time.
//! - `cm-<name>-timer` (optional): calls `timer_method` every interval.
//!
//! Both share the instance behind one mutex. An error or a panic in a hook is
//! logged with the module name and the thread keeps going.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cfx_bus::Mailbox;
use cfx_telemetry::{CBT_PROCESSED, MODULE_FAULTS};
use cfx_types::{Cbt, DynModule, ModuleDescriptor, ModuleError, ModuleState};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::error::{HandleError, StartupError};

type SharedModule = Arc<Mutex<DynModule>>;

// =============================================================================
// STOP SIGNAL
// =============================================================================

/// Tells the timer thread to exit, waking it mid-interval.
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    /// Sleep up to `timeout`. Returns `true` once stopped.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

// =============================================================================
// FAULT ISOLATION
// =============================================================================

enum Fault {
    Error(ModuleError),
    Panic(String),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => write!(f, "{e}"),
            Self::Panic(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

impl Fault {
    fn into_module_error(self, hook: &str) -> ModuleError {
        match self {
            Self::Error(e) => e,
            Self::Panic(msg) => ModuleError::Other(format!("{hook} panicked: {msg}")),
        }
    }
}

fn guarded<F>(hook: F) -> Result<(), Fault>
where
    F: FnOnce() -> Result<(), ModuleError>,
{
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Fault::Error(e)),
        Err(payload) => Err(Fault::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// =============================================================================
// MODULE HANDLE
// =============================================================================

pub struct ModuleHandle {
    name: String,
    instance: SharedModule,
    mailbox: Arc<Mailbox>,
    join_enabled: bool,
    timer_interval: Option<Duration>,
    state: Arc<Mutex<ModuleState>>,
    timer_stop: Arc<StopSignal>,
    worker: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
}

impl ModuleHandle {
    /// Wrap a freshly constructed instance.
    pub fn new(descriptor: &ModuleDescriptor, instance: DynModule, mailbox: Arc<Mailbox>) -> Self {
        Self {
            name: descriptor.name.clone(),
            instance: Arc::new(Mutex::new(instance)),
            mailbox,
            join_enabled: descriptor.join_enabled,
            timer_interval: descriptor.timer_interval,
            state: Arc::new(Mutex::new(ModuleState::Constructed)),
            timer_stop: Arc::new(StopSignal::default()),
            worker: None,
            timer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    pub fn join_enabled(&self) -> bool {
        self.join_enabled
    }

    pub fn state(&self) -> ModuleState {
        *self.state.lock()
    }

    fn transition(&self, to: ModuleState) -> Result<(), HandleError> {
        let mut state = self.state.lock();
        if !state.can_transition_to(to) {
            return Err(HandleError::InvalidTransition {
                name: self.name.clone(),
                from: *state,
                to,
            });
        }
        *state = to;
        Ok(())
    }

    /// Run the module's initializer on the calling thread.
    pub fn initialize(&mut self) -> Result<(), StartupError> {
        self.transition(ModuleState::Initialized)?;
        let instance = Arc::clone(&self.instance);
        guarded(|| instance.lock().initialize()).map_err(|fault| {
            *self.state.lock() = ModuleState::Constructed;
            StartupError::Initialization {
                name: self.name.clone(),
                source: fault.into_module_error("initializer"),
            }
        })?;
        debug!(module = %self.name, "Module initialized");
        Ok(())
    }

    /// Spawn the worker and, if configured, the timer.
    pub fn start(&mut self) -> Result<(), HandleError> {
        self.transition(ModuleState::Running)?;

        let worker = {
            let name = self.name.clone();
            let instance = Arc::clone(&self.instance);
            let mailbox = Arc::clone(&self.mailbox);
            let state = Arc::clone(&self.state);
            let timer_stop = Arc::clone(&self.timer_stop);
            thread::Builder::new()
                .name(format!("cm-{}", self.name))
                .spawn(move || run_worker(&name, &instance, &mailbox, &state, &timer_stop))
        };
        match worker {
            Ok(worker) => self.worker = Some(worker),
            Err(source) => {
                *self.state.lock() = ModuleState::Initialized;
                return Err(HandleError::Spawn {
                    name: self.name.clone(),
                    source,
                });
            }
        }

        if let Some(interval) = self.timer_interval {
            let name = self.name.clone();
            let instance = Arc::clone(&self.instance);
            let stop = Arc::clone(&self.timer_stop);
            let timer = thread::Builder::new()
                .name(format!("cm-{}-timer", self.name))
                .spawn(move || run_timer(&name, &instance, interval, &stop));
            match timer {
                Ok(timer) => self.timer = Some(timer),
                Err(source) => {
                    // The worker is already running; stop it before reporting.
                    self.signal_termination();
                    self.join();
                    return Err(HandleError::Spawn {
                        name: self.name.clone(),
                        source,
                    });
                }
            }
        }

        info!(
            module = %self.name,
            timer = ?self.timer_interval,
            join_enabled = self.join_enabled,
            "Module started"
        );
        Ok(())
    }

    /// Run the module's `start` hook on the calling thread. Only valid once
    /// the worker is running.
    pub fn activate(&self) -> Result<(), StartupError> {
        if self.state() != ModuleState::Running {
            return Err(HandleError::InvalidTransition {
                name: self.name.clone(),
                from: self.state(),
                to: ModuleState::Running,
            }
            .into());
        }
        let instance = Arc::clone(&self.instance);
        guarded(|| instance.lock().start()).map_err(|fault| StartupError::Activation {
            name: self.name.clone(),
            source: fault.into_module_error("start hook"),
        })?;
        debug!(module = %self.name, "Module activated");
        Ok(())
    }

    /// Discard queued CBTs and inject the termination envelope.
    ///
    /// Returns how many CBTs were discarded.
    pub fn signal_termination(&self) -> usize {
        let discarded = self.mailbox.clear_and_inject(Cbt::termination(&self.name));
        let mut state = self.state.lock();
        if *state == ModuleState::Running {
            *state = ModuleState::Terminating;
        }
        discarded
    }

    /// Wait for the worker and timer threads. Returns `false` if either died
    /// outside the fault guard.
    pub fn join(&mut self) -> bool {
        let mut clean = true;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!(module = %self.name, "Worker thread panicked");
                clean = false;
            }
        }
        self.timer_stop.stop();
        if let Some(timer) = self.timer.take() {
            if timer.join().is_err() {
                error!(module = %self.name, "Timer thread panicked");
                clean = false;
            }
        }
        clean
    }

    /// Let the threads finish on their own.
    pub fn detach(&mut self) {
        self.worker.take();
        self.timer.take();
    }

    /// Whether worker threads were ever spawned.
    pub fn is_started(&self) -> bool {
        self.worker.is_some()
    }

    /// Run the terminate hook on the calling thread for a module whose
    /// worker never started.
    pub fn terminate_inline(&mut self) {
        let instance = Arc::clone(&self.instance);
        if let Err(fault) = guarded(|| instance.lock().terminate()) {
            MODULE_FAULTS
                .with_label_values(&[self.name.as_str(), "terminate"])
                .inc();
            warn!(module = %self.name, error = %fault, "Terminate hook failed");
        }
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("join_enabled", &self.join_enabled)
            .field("timer_interval", &self.timer_interval)
            .field("queued", &self.mailbox.len())
            .finish()
    }
}

// =============================================================================
// THREAD BODIES
// =============================================================================

fn run_worker(
    name: &str,
    instance: &SharedModule,
    mailbox: &Mailbox,
    state: &Mutex<ModuleState>,
    timer_stop: &StopSignal,
) {
    debug!(module = %name, "Worker running");

    loop {
        let cbt = mailbox.recv();

        if cbt.is_termination() {
            if let Err(fault) = guarded(|| instance.lock().terminate()) {
                MODULE_FAULTS.with_label_values(&[name, "terminate"]).inc();
                warn!(module = %name, error = %fault, "Terminate hook failed");
            }
            break;
        }

        let initiator = cbt.initiator().to_string();
        let action = cbt.action().to_string();
        match guarded(|| instance.lock().process_cbt(cbt)) {
            Ok(()) => CBT_PROCESSED.with_label_values(&[name]).inc(),
            Err(fault) => {
                MODULE_FAULTS.with_label_values(&[name, "process_cbt"]).inc();
                error!(
                    module = %name,
                    initiator = %initiator,
                    action = %action,
                    error = %fault,
                    "CBT processing failed"
                );
            }
        }
    }

    timer_stop.stop();
    let mut state = state.lock();
    if *state != ModuleState::Terminating {
        debug!(module = %name, from = %*state, "Termination received outside shutdown");
    }
    *state = ModuleState::Stopped;
    info!(module = %name, "Worker stopped");
}

fn run_timer(name: &str, instance: &SharedModule, interval: Duration, stop: &StopSignal) {
    debug!(module = %name, ?interval, "Timer running");
    while !stop.wait(interval) {
        if let Err(fault) = guarded(|| instance.lock().timer_method()) {
            MODULE_FAULTS.with_label_values(&[name, "timer_method"]).inc();
            error!(module = %name, error = %fault, "Timer method failed");
        }
    }
    debug!(module = %name, "Timer stopped");
}
