//! Listening TCP endpoint serving a single peer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use super::EndpointError;
use super::state::EndpointState;
use super::tcp_client::format_addr;

/// Back-off after a failed `accept` so a persistent error does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Listens on `host:port` for the lifetime of the process and is write-ready
/// while a peer is connected. A new inbound connection closes the current peer
/// and takes its place.
#[derive(Clone)]
pub struct TcpServerEndpoint {
    pub(super) state: Arc<EndpointState>,
    local_addr: Option<SocketAddr>,
}

impl TcpServerEndpoint {
    /// Bind the listener and start accepting peers in the background.
    ///
    /// A bind failure is logged; the endpoint then never becomes write-ready.
    pub(super) async fn listen(state: Arc<EndpointState>, host: &str, port: u16) -> Self {
        let listener = match bind(host, port).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(endpoint = %state.label(), error = %e, "Server failed to start");
                return Self {
                    state,
                    local_addr: None,
                };
            }
        };

        let local_addr = listener.local_addr().ok();
        info!(
            endpoint = %state.label(),
            addr = ?local_addr,
            "Server now listening"
        );

        tokio::spawn(accept_loop(listener, Arc::clone(&state)));
        Self { state, local_addr }
    }

    /// Address the listener is bound to, if binding succeeded.
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

async fn bind(host: &str, port: u16) -> Result<TcpListener, EndpointError> {
    let addr = format_addr(host, port);
    TcpListener::bind(&addr)
        .await
        .map_err(|source| EndpointError::Bind { addr, source })
}

async fn accept_loop(listener: TcpListener, state: Arc<EndpointState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                info!(endpoint = %state.label(), peer = %peer_addr, "Server accepted peer");
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(endpoint = %state.label(), error = %e, "Failed to set TCP_NODELAY");
                }
                state.attach(stream).await;
            }
            Err(e) => {
                warn!(endpoint = %state.label(), error = %e, "Server accept failed");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Role;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn wait_until_ready(endpoint: &TcpServerEndpoint, ready: bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while endpoint.state.is_write_ready().await != ready {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    async fn server() -> TcpServerEndpoint {
        let state = EndpointState::new("ipserver".into(), Role::Primary, None);
        TcpServerEndpoint::listen(state, "127.0.0.1", 0).await
    }

    #[tokio::test]
    async fn not_ready_until_peer_connects() {
        let endpoint = server().await;
        let addr = endpoint.local_addr().unwrap();
        assert!(!endpoint.state.is_write_ready().await);

        let _peer = TcpStream::connect(addr).await.unwrap();
        wait_until_ready(&endpoint, true).await;
    }

    #[tokio::test]
    async fn peer_disconnect_clears_readiness_and_allows_reconnect() {
        let endpoint = server().await;
        let addr = endpoint.local_addr().unwrap();

        let peer = TcpStream::connect(addr).await.unwrap();
        wait_until_ready(&endpoint, true).await;
        drop(peer);
        wait_until_ready(&endpoint, false).await;

        let mut peer = TcpStream::connect(addr).await.unwrap();
        wait_until_ready(&endpoint, true).await;
        endpoint.state.write(b"again".to_vec()).await;
        let mut out = [0u8; 5];
        peer.read_exact(&mut out).await.unwrap();
        assert_eq!(&out, b"again");
    }

    #[tokio::test]
    async fn new_peer_replaces_previous_one() {
        let endpoint = server().await;
        let addr = endpoint.local_addr().unwrap();

        let mut first = TcpStream::connect(addr).await.unwrap();
        wait_until_ready(&endpoint, true).await;
        let mut second = TcpStream::connect(addr).await.unwrap();

        // The first peer is closed once the second is attached.
        let mut buf = [0u8; 4];
        let n = tokio::time::timeout(Duration::from_secs(2), first.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);

        second.write_all(b"hi").await.unwrap();
        endpoint.state.write(b"to-second".to_vec()).await;
        let mut out = [0u8; 9];
        second.read_exact(&mut out).await.unwrap();
        assert_eq!(&out, b"to-second");
    }

    #[tokio::test]
    async fn bind_failure_is_not_fatal() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let state = EndpointState::new("ipserver".into(), Role::Primary, None);
        let endpoint = TcpServerEndpoint::listen(state, "127.0.0.1", port).await;

        assert!(endpoint.local_addr().is_none());
        assert!(!endpoint.state.is_write_ready().await);
    }
}
