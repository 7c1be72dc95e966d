//! # Shutdown
//!
//! Two passes over the registry, in load order:
//!
//! 1. every mailbox is cleared and receives exactly one `TERMINATE` CBT;
//! 2. join-enabled modules are waited for, the rest are left to finish on
//!    their own.
//!
//! No module is joined before every module has been signalled.

use std::collections::HashMap;

use cfx_bus::MessageBus;
use tracing::{debug, info, warn};

use crate::handle::ModuleHandle;

/// What `terminate` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// CBTs discarded from each mailbox, in load order.
    pub discarded: Vec<(String, usize)>,
    /// Modules whose threads were joined.
    pub joined: Vec<String>,
    /// Modules left to stop asynchronously.
    pub detached: Vec<String>,
}

impl ShutdownReport {
    pub fn total_discarded(&self) -> usize {
        self.discarded.iter().map(|(_, n)| n).sum()
    }
}

/// Stop every handle in `handles`, emptying the map and the routing table.
pub fn terminate_all(
    bus: &MessageBus,
    handles: &mut HashMap<String, ModuleHandle>,
    load_order: &[String],
) -> ShutdownReport {
    let mut report = ShutdownReport::default();
    info!(modules = handles.len(), "Terminating controller modules");

    // Pass 1: signal.
    for name in load_order {
        let Some(handle) = handles.get(name) else {
            continue;
        };
        let discarded = handle.signal_termination();
        if discarded > 0 {
            debug!(module = %name, discarded, "Pending CBTs discarded");
        }
        report.discarded.push((name.clone(), discarded));
    }

    // Pass 2: join or detach.
    for name in load_order {
        let Some(mut handle) = handles.remove(name) else {
            continue;
        };
        if !handle.is_started() {
            handle.terminate_inline();
            report.joined.push(name.clone());
        } else if handle.join_enabled() {
            if !handle.join() {
                warn!(module = %name, "Module thread exited abnormally");
            }
            report.joined.push(name.clone());
        } else {
            handle.detach();
            report.detached.push(name.clone());
        }
        bus.deregister(name);
    }

    info!(
        joined = report.joined.len(),
        detached = report.detached.len(),
        discarded = report.total_discarded(),
        "Controller terminated"
    );
    report
}

/// Resolves when the process is asked to stop (SIGINT, SIGTERM or SIGQUIT
/// on Unix; Ctrl-C elsewhere).
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => info!("Received SIGINT"),
        _ = terminate.recv() => info!("Received SIGTERM"),
        _ = quit.recv() => info!("Received SIGQUIT"),
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C");
    Ok(())
}
