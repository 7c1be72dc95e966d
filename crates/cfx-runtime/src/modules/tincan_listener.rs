//! Reads daemon traffic off the control sockets and turns it into CBTs.
//!
//! A reader thread polls both sockets. Control datagrams become
//! `TINCAN_MSG` CBTs carrying the decoded JSON; relayed packets become
//! `TINCAN_PACKET` CBTs carrying the hex-encoded bytes. Both go to the
//! configured `recipient`.
//!
//! The reader starts from the `start` hook, once every module is loaded and
//! running, so the recipient may be declared anywhere in the configuration.
//! Datagrams that arrive earlier wait in the socket buffer.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cfx_types::{Cbt, ControllerModule, ModuleError};
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::context::ModuleContext;
use crate::control::{ControlTransport, IPOP_VERSION, TINCAN_CONTROL, TINCAN_PACKET};

pub const TINCAN_MSG: &str = "TINCAN_MSG";
pub const TINCAN_PACKET_ACTION: &str = "TINCAN_PACKET";

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const MAX_DATAGRAM: usize = 65_507;

/// Decode one datagram into `(action, data)`.
pub fn decode_datagram(datagram: &[u8]) -> Result<(&'static str, Value), String> {
    let [version, kind, body @ ..] = datagram else {
        return Err(format!("datagram too short ({} bytes)", datagram.len()));
    };
    if *version != IPOP_VERSION {
        return Err(format!("unsupported protocol version {version:#04x}"));
    }
    match *kind {
        TINCAN_CONTROL => serde_json::from_slice(body)
            .map(|msg| (TINCAN_MSG, msg))
            .map_err(|e| format!("invalid control JSON: {e}")),
        TINCAN_PACKET => Ok((TINCAN_PACKET_ACTION, json!({ "packet": hex::encode(body) }))),
        other => Err(format!("unknown message type {other:#04x}")),
    }
}

pub struct TincanListener {
    ctx: ModuleContext,
    transport: ControlTransport,
    recipient: String,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl TincanListener {
    pub fn new(
        transport: ControlTransport,
        ctx: ModuleContext,
        config: &Value,
    ) -> Result<Self, ModuleError> {
        let recipient = match config.get("recipient") {
            None => "Logger".to_string(),
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(ModuleError::Config("recipient must be a string".into())),
        };
        Ok(Self {
            ctx,
            transport,
            recipient,
            stop: Arc::new(AtomicBool::new(false)),
            reader: None,
        })
    }
}

impl ControllerModule for TincanListener {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        self.transport.set_read_timeout(Some(POLL_INTERVAL))?;
        Ok(())
    }

    fn start(&mut self) -> Result<(), ModuleError> {
        let sockets = [
            self.transport.client().try_clone()?,
            self.transport.server().try_clone()?,
        ];
        let ctx = self.ctx.clone();
        let recipient = self.recipient.clone();
        let stop = Arc::clone(&self.stop);

        let reader = thread::Builder::new()
            .name(format!("cm-{}-reader", self.ctx.name()))
            .spawn(move || read_loop(&ctx, &recipient, &sockets, &stop))?;
        self.reader = Some(reader);

        debug!(module = %self.ctx.name(), recipient = %self.recipient, "Listening for daemon traffic");
        Ok(())
    }

    fn process_cbt(&mut self, cbt: Cbt) -> Result<(), ModuleError> {
        Err(ModuleError::UnsupportedAction {
            action: cbt.action().to_string(),
            initiator: cbt.initiator().to_string(),
        })
    }

    fn terminate(&mut self) -> Result<(), ModuleError> {
        self.stop.store(true, Ordering::Release);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                return Err(ModuleError::Other("reader thread panicked".into()));
            }
        }
        debug!(module = %self.ctx.name(), "Listener stopped");
        Ok(())
    }
}

fn read_loop(ctx: &ModuleContext, recipient: &str, sockets: &[UdpSocket], stop: &AtomicBool) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    while !stop.load(Ordering::Acquire) {
        for socket in sockets {
            let n = match socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    trace!(bytes = n, from = %from, "Datagram received");
                    n
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    continue
                }
                Err(e) => {
                    warn!(module = %ctx.name(), error = %e, "Control socket read failed");
                    continue;
                }
            };

            match decode_datagram(&buf[..n]) {
                Ok((action, data)) => {
                    if let Err(e) = ctx.send(recipient, action, data) {
                        warn!(
                            module = %ctx.name(),
                            recipient = %recipient,
                            error = %e,
                            "Dropping daemon notification"
                        );
                    }
                }
                Err(reason) => warn!(module = %ctx.name(), %reason, "Dropping undecodable datagram"),
            }
        }
    }
}
