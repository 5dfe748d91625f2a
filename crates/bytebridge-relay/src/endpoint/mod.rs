//! Relay endpoints.
//!
//! An [`Endpoint`] is one side of the bridge. Each variant wraps its own
//! transport but exposes the same capability set to the relay engine:
//! [`Endpoint::write`], [`Endpoint::has_pending_bytes`], [`Endpoint::drain`]
//! and [`Endpoint::is_write_ready`].
//!
//! Transports start connecting, listening, or opening as soon as the endpoint
//! is created. Transport failures are logged and leave the endpoint not
//! write-ready; they never propagate to the caller.

pub mod buffer;
pub mod error;
pub mod serial;
mod state;
pub mod tcp_client;
pub mod tcp_server;

use std::sync::Arc;

use bytebridge_core::{ConnectionKind, ConnectionSpec};

pub use error::EndpointError;
pub use serial::SerialEndpoint;
pub use tcp_client::TcpClientEndpoint;
pub use tcp_server::TcpServerEndpoint;

use state::EndpointState;

/// What an endpoint does with the bytes its transport receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Buffers inbound bytes for forwarding.
    Primary,
    /// Write-only mirror; inbound bytes are discarded.
    Sniff,
}

/// One side of the relay.
#[derive(Clone)]
pub enum Endpoint {
    TcpClient(TcpClientEndpoint),
    TcpServer(TcpServerEndpoint),
    Serial(SerialEndpoint),
}

impl Endpoint {
    /// Create the endpoint described by `spec` and start its transport.
    ///
    /// `max_buffered_bytes` caps the inbound buffer (oldest bytes dropped);
    /// `None` leaves it unbounded.
    pub async fn open(spec: &ConnectionSpec, role: Role, max_buffered_bytes: Option<usize>) -> Self {
        let state = EndpointState::new(spec.to_string(), role, max_buffered_bytes);
        match spec {
            ConnectionSpec::IpClient { host, port } => {
                Self::TcpClient(TcpClientEndpoint::connect(state, host, *port))
            }
            ConnectionSpec::IpServer { host, port } => {
                Self::TcpServer(TcpServerEndpoint::listen(state, host, *port).await)
            }
            ConnectionSpec::Serial {
                port_name,
                baud_rate,
            } => Self::Serial(SerialEndpoint::open(state, port_name, *baud_rate).await),
        }
    }

    const fn state(&self) -> &Arc<EndpointState> {
        match self {
            Self::TcpClient(endpoint) => &endpoint.state,
            Self::TcpServer(endpoint) => &endpoint.state,
            Self::Serial(endpoint) => &endpoint.state,
        }
    }

    pub const fn kind(&self) -> ConnectionKind {
        match self {
            Self::TcpClient(_) => ConnectionKind::IpClient,
            Self::TcpServer(_) => ConnectionKind::IpServer,
            Self::Serial(_) => ConnectionKind::Serial,
        }
    }

    /// The specification string this endpoint was created from.
    pub fn label(&self) -> &str {
        self.state().label()
    }

    /// Queue `bytes` for the transport without waiting for delivery.
    ///
    /// Check [`Self::is_write_ready`] first; writes to an endpoint that is not
    /// ready are discarded. Delivery failures surface as log lines and a
    /// readiness change, never as a return value.
    pub async fn write(&self, bytes: Vec<u8>) {
        self.state().write(bytes).await;
    }

    pub async fn has_pending_bytes(&self) -> bool {
        self.state().has_pending_bytes().await
    }

    /// Take all buffered inbound bytes in arrival order.
    pub async fn drain(&self) -> Vec<u8> {
        self.state().drain().await
    }

    pub async fn is_write_ready(&self) -> bool {
        self.state().is_write_ready().await
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Endpoint");
        debug.field("kind", &self.kind()).field("label", &self.label());
        match self {
            Self::TcpClient(endpoint) => debug.field("remote", &endpoint.remote()),
            Self::TcpServer(endpoint) => debug.field("local_addr", &endpoint.local_addr()),
            Self::Serial(endpoint) => debug
                .field("port_name", &endpoint.port_name())
                .field("baud_rate", &endpoint.baud_rate()),
        };
        debug.finish()
    }
}
