//! Outbound TCP endpoint.

use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, error, info};

use super::EndpointError;
use super::state::EndpointState;

/// Connects to `host:port` in the background and becomes write-ready once the
/// handshake completes. A failed connect is logged and not retried.
#[derive(Clone)]
pub struct TcpClientEndpoint {
    pub(super) state: Arc<EndpointState>,
    remote: String,
}

impl TcpClientEndpoint {
    /// Start connecting without waiting for the handshake.
    pub(super) fn connect(state: Arc<EndpointState>, host: &str, port: u16) -> Self {
        let remote = format_addr(host, port);
        info!(endpoint = %state.label(), remote = %remote, "Connecting");

        let task_state = Arc::clone(&state);
        let addr = remote.clone();
        tokio::spawn(async move {
            match connect_stream(&addr).await {
                Ok(stream) => {
                    info!(endpoint = %task_state.label(), remote = %addr, "Connected");
                    task_state.attach(stream).await;
                }
                Err(e) => error!(endpoint = %task_state.label(), error = %e, "Connect failed"),
            }
        });

        Self { state, remote }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }
}

async fn connect_stream(addr: &str) -> Result<TcpStream, EndpointError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| EndpointError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    if let Err(e) = stream.set_nodelay(true) {
        debug!(remote = %addr, error = %e, "Failed to set TCP_NODELAY");
    }
    Ok(stream)
}

/// Join host and port, bracketing IPv6 literals.
pub(super) fn format_addr(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_addr_brackets_ipv6() {
        assert_eq!(format_addr("127.0.0.1", 80), "127.0.0.1:80");
        assert_eq!(format_addr("localhost", 8080), "localhost:8080");
        assert_eq!(format_addr("::1", 9000), "[::1]:9000");
        assert_eq!(format_addr("[::1]", 9000), "[::1]:9000");
    }

    #[tokio::test]
    async fn connect_failure_leaves_endpoint_unready() {
        // Grab a free port, then close the listener so the connect is refused.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let state = EndpointState::new("ipclient".into(), crate::endpoint::Role::Primary, None);
        let endpoint = TcpClientEndpoint::connect(state, "127.0.0.1", port);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        assert!(!endpoint.state.is_write_ready().await);
        assert_eq!(endpoint.remote(), format!("127.0.0.1:{port}"));
    }
}
