//! Endpoint transport errors.

/// Failures starting an endpoint's transport.
///
/// These are logged by the endpoint that hit them; the relay keeps running.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Failed to open serial port {port}: {source}")]
    SerialOpen {
        port: String,
        source: tokio_serial::Error,
    },
}
