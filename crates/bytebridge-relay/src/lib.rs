//! bytebridge Relay Library
//!
//! Core functionality for the bytebridge relay:
//! - Endpoints over TCP client, single-peer TCP server, and serial transports
//! - Topology resolution from connection specifications
//! - Fixed-period relay engine with optional traffic mirroring

pub mod endpoint;
pub mod relay;
pub mod topology;

pub use endpoint::{Endpoint, EndpointError, Role};
pub use relay::{Direction, RelayEngine, RelayStats};
pub use topology::{Topology, TopologyError, TopologySpec};
