use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use super::call::{encode_body, ControlCall};
use super::ControlError;
use crate::config::FrameworkSettings;

/// The controller's two UDP endpoints towards the daemon.
///
/// - `client`: ephemeral port; sends calls and receives replies.
/// - `server`: bound to `localhost[6]:contr_port`; receives notifications.
#[derive(Debug)]
pub struct ControlTransport {
    client: UdpSocket,
    server: UdpSocket,
    daemon: SocketAddr,
}

impl ControlTransport {
    /// Bind both sockets, preferring IPv6 loopback and falling back to IPv4.
    pub fn bind(settings: &FrameworkSettings) -> Result<Self, ControlError> {
        match Self::bind_family(settings, true) {
            Ok(transport) => Ok(transport),
            Err(e) => {
                debug!(error = %e, "IPv6 control socket unavailable, using IPv4");
                Self::bind_family(settings, false)
            }
        }
    }

    fn bind_family(settings: &FrameworkSettings, ipv6: bool) -> Result<Self, ControlError> {
        let any = if ipv6 { "::" } else { "0.0.0.0" };
        let host = settings.daemon_host(ipv6);

        let client = UdpSocket::bind((any, 0))?;
        let server = UdpSocket::bind((host, settings.contr_port))?;
        let daemon = (host, settings.svpn_port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ControlError::Unresolved(format!("{host}:{}", settings.svpn_port)))?;

        debug!(
            client = ?client.local_addr().ok(),
            server = ?server.local_addr().ok(),
            daemon = %daemon,
            "Control sockets bound"
        );
        Ok(Self {
            client,
            server,
            daemon,
        })
    }

    /// Assemble a transport from already-bound sockets.
    pub fn from_parts(client: UdpSocket, server: UdpSocket, daemon: SocketAddr) -> Self {
        Self {
            client,
            server,
            daemon,
        }
    }

    /// New handles to the same sockets, for another module.
    pub fn try_clone(&self) -> Result<Self, ControlError> {
        Ok(Self {
            client: self.client.try_clone()?,
            server: self.server.try_clone()?,
            daemon: self.daemon,
        })
    }

    pub fn client(&self) -> &UdpSocket {
        &self.client
    }

    pub fn server(&self) -> &UdpSocket {
        &self.server
    }

    pub fn daemon_addr(&self) -> SocketAddr {
        self.daemon
    }

    /// Address the daemon should send replies to.
    pub fn callback_endpoint(&self) -> Result<SocketAddr, ControlError> {
        Ok(self.client.local_addr()?)
    }

    /// Apply a read timeout to both sockets.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), ControlError> {
        self.client.set_read_timeout(timeout)?;
        self.server.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Send one call to the daemon.
    pub fn send(&self, call: &ControlCall) -> Result<(), ControlError> {
        let datagram = call.encode()?;
        self.client.send_to(&datagram, self.daemon)?;
        trace!(method = call.method(), bytes = datagram.len(), "Control call sent");
        Ok(())
    }

    /// Send a caller-built JSON body.
    pub fn send_raw(&self, body: &Value) -> Result<(), ControlError> {
        let datagram = encode_body(body)?;
        self.client.send_to(&datagram, self.daemon)?;
        trace!(bytes = datagram.len(), "Raw control message sent");
        Ok(())
    }
}
