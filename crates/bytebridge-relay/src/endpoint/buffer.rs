//! Inbound byte buffer shared between a transport reader and the relay engine.

/// Bytes received on an endpoint and not yet forwarded.
///
/// Appends preserve arrival order and a drain always takes everything. With a
/// limit set, the oldest bytes are discarded once the buffer grows past it.
#[derive(Debug, Default)]
pub struct InboundBuffer {
    bytes: Vec<u8>,
    limit: Option<usize>,
    dropped: u64,
}

impl InboundBuffer {
    pub const fn new(limit: Option<usize>) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    /// Append a received chunk. Returns how many of the oldest buffered bytes
    /// were discarded to stay within the limit.
    pub fn append(&mut self, chunk: &[u8]) -> usize {
        self.bytes.extend_from_slice(chunk);
        match self.limit {
            Some(limit) if self.bytes.len() > limit => {
                let excess = self.bytes.len() - limit;
                self.bytes.drain(..excess);
                self.dropped += excess as u64;
                excess
            }
            _ => 0,
        }
    }

    /// Take every pending byte, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Total bytes discarded by the limit since creation.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}
