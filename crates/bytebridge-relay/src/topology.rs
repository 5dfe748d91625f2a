//! Resolves connection specifications into the relay's endpoints.

use bytebridge_core::{ConnectionSpec, SniffSpec, SniffTarget};
use tracing::info;

use crate::endpoint::{Endpoint, Role};

/// At most one sniff endpoint per primary connection.
pub const MAX_SNIFFS: usize = 2;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("At most {MAX_SNIFFS} sniff connections are supported, got {0}")]
    TooManySniffs(usize),

    #[error("Connection {0} already has a sniff connection")]
    DuplicateSniff(SniffTarget),
}

/// Validated description of the endpoints to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologySpec {
    pub conn1: ConnectionSpec,
    pub conn2: ConnectionSpec,
    pub sniff1: Option<ConnectionSpec>,
    pub sniff2: Option<ConnectionSpec>,
}

impl TopologySpec {
    /// Pair the primary connections with their sniffers.
    pub fn new(
        conn1: ConnectionSpec,
        conn2: ConnectionSpec,
        sniffs: Vec<SniffSpec>,
    ) -> Result<Self, TopologyError> {
        if sniffs.len() > MAX_SNIFFS {
            return Err(TopologyError::TooManySniffs(sniffs.len()));
        }

        let mut spec = Self {
            conn1,
            conn2,
            sniff1: None,
            sniff2: None,
        };
        for sniff in sniffs {
            let slot = match sniff.target {
                SniffTarget::First => &mut spec.sniff1,
                SniffTarget::Second => &mut spec.sniff2,
            };
            if slot.is_some() {
                return Err(TopologyError::DuplicateSniff(sniff.target));
            }
            *slot = Some(sniff.connection);
        }
        Ok(spec)
    }
}

/// The live endpoints the relay engine drives.
#[derive(Debug, Clone)]
pub struct Topology {
    pub conn1: Endpoint,
    pub conn2: Endpoint,
    /// Mirrors the bytes received on `conn1`.
    pub sniff1: Option<Endpoint>,
    /// Mirrors the bytes received on `conn2`.
    pub sniff2: Option<Endpoint>,
}

impl Topology {
    /// Create every endpoint in `spec`. Transports start immediately.
    pub async fn build(spec: &TopologySpec, max_buffered_bytes: Option<usize>) -> Self {
        let conn1 = Endpoint::open(&spec.conn1, Role::Primary, max_buffered_bytes).await;
        let conn2 = Endpoint::open(&spec.conn2, Role::Primary, max_buffered_bytes).await;
        let sniff1 = open_sniff(spec.sniff1.as_ref()).await;
        let sniff2 = open_sniff(spec.sniff2.as_ref()).await;

        info!(
            conn1 = %conn1.label(),
            conn2 = %conn2.label(),
            sniff1 = ?sniff1.as_ref().map(Endpoint::label),
            sniff2 = ?sniff2.as_ref().map(Endpoint::label),
            "Topology ready"
        );
        Self {
            conn1,
            conn2,
            sniff1,
            sniff2,
        }
    }
}

async fn open_sniff(spec: Option<&ConnectionSpec>) -> Option<Endpoint> {
    match spec {
        Some(spec) => Some(Endpoint::open(spec, Role::Sniff, None).await),
        None => None,
    }
}
