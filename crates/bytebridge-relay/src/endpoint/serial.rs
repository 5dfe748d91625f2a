//! Serial port endpoint.

use std::sync::Arc;

use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{error, info};

use super::EndpointError;
use super::state::EndpointState;

/// A serial device opened at a fixed baud rate. Write-ready as soon as the
/// port opens; an open failure is logged and leaves it never ready.
#[derive(Clone)]
pub struct SerialEndpoint {
    pub(super) state: Arc<EndpointState>,
    port_name: String,
    baud_rate: u32,
}

impl SerialEndpoint {
    pub(super) async fn open(state: Arc<EndpointState>, port_name: &str, baud_rate: u32) -> Self {
        let endpoint = Self {
            state,
            port_name: port_name.to_string(),
            baud_rate,
        };
        info!(
            endpoint = %endpoint.state.label(),
            port = endpoint.port_name(),
            baud_rate = endpoint.baud_rate(),
            "Initializing serial port"
        );

        // Opening a device is a blocking syscall; keep it off the runtime workers.
        let name = endpoint.port_name.clone();
        let opened = tokio::task::spawn_blocking(move || open_stream(&name, baud_rate)).await;
        match opened {
            Ok(Ok(stream)) => endpoint.attach_stream(stream).await,
            Ok(Err(e)) => {
                error!(endpoint = %endpoint.state.label(), error = %e, "Serial port failed to open");
            }
            Err(e) => {
                error!(endpoint = %endpoint.state.label(), error = %e, "Serial open task failed");
            }
        }
        endpoint
    }

    async fn attach_stream(&self, stream: SerialStream) {
        info!(endpoint = %self.state.label(), port = self.port_name(), "Serial port open");
        self.state.attach(stream).await;
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub const fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

fn open_stream(port_name: &str, baud_rate: u32) -> Result<SerialStream, EndpointError> {
    tokio_serial::new(port_name, baud_rate)
        .open_native_async()
        .map_err(|source| EndpointError::SerialOpen {
            port: port_name.to_string(),
            source,
        })
}
