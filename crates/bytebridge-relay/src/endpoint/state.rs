//! State shared between an endpoint's transport tasks and the relay engine.
//!
//! A transport stream is attached as the current *peer*. Attaching spawns a
//! reader task (feeding [`InboundBuffer`]) and a writer task (draining an
//! unbounded queue filled by [`EndpointState::write`]). Only one peer is live
//! at a time; events from a replaced peer are ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::Role;
use super::buffer::InboundBuffer;

const READ_CHUNK_SIZE: usize = 8 * 1024;

struct Peer {
    generation: u64,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    reader: JoinHandle<()>,
}

pub struct EndpointState {
    label: String,
    role: Role,
    inbound: Mutex<InboundBuffer>,
    peer: RwLock<Option<Peer>>,
    generations: AtomicU64,
}

impl EndpointState {
    pub fn new(label: String, role: Role, max_buffered_bytes: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            label,
            role,
            inbound: Mutex::new(InboundBuffer::new(max_buffered_bytes)),
            peer: RwLock::new(None),
            generations: AtomicU64::new(0),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Make `stream` the live peer, closing any previous one.
    pub async fn attach<S>(self: &Arc<Self>, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let (read_half, write_half) = tokio::io::split(stream);
        let (tx, rx) = mpsc::unbounded_channel();

        // Hold the slot while spawning so an immediate EOF cannot detach
        // before this peer is installed.
        let mut slot = self.peer.write().await;
        tokio::spawn(Arc::clone(self).write_loop(generation, write_half, rx));
        let reader = tokio::spawn(Arc::clone(self).read_loop(generation, read_half));
        let previous = slot.replace(Peer {
            generation,
            tx,
            reader,
        });
        drop(slot);

        if let Some(previous) = previous {
            // Dropping the sender lets the old writer flush and shut down.
            previous.reader.abort();
            info!(
                endpoint = %self.label,
                replaced = previous.generation,
                "Previous peer closed in favour of new peer"
            );
        }
        info!(endpoint = %self.label, peer = generation, "Endpoint write-ready");
    }

    /// Clear the peer slot if `generation` is still the live peer.
    pub async fn detach(&self, generation: u64, reason: &str) {
        let mut slot = self.peer.write().await;
        if slot.as_ref().is_some_and(|peer| peer.generation == generation) {
            *slot = None;
            info!(endpoint = %self.label, peer = generation, reason, "Endpoint not write-ready");
        }
    }

    pub async fn is_write_ready(&self) -> bool {
        self.peer
            .read()
            .await
            .as_ref()
            .is_some_and(|peer| !peer.tx.is_closed())
    }

    /// Queue `bytes` for the live peer.
    ///
    /// Callers must check [`Self::is_write_ready`] first; without a peer the
    /// bytes are discarded.
    pub async fn write(&self, bytes: Vec<u8>) {
        let len = bytes.len();
        match self.peer.read().await.as_ref() {
            Some(peer) => {
                if peer.tx.send(bytes).is_err() {
                    debug!(endpoint = %self.label, bytes = len, "Writer gone, bytes discarded");
                }
            }
            None => {
                debug!(endpoint = %self.label, bytes = len, "No peer, bytes discarded");
            }
        }
    }

    pub async fn has_pending_bytes(&self) -> bool {
        !self.inbound.lock().await.is_empty()
    }

    pub async fn drain(&self) -> Vec<u8> {
        self.inbound.lock().await.drain()
    }

    async fn ingest(&self, chunk: &[u8]) {
        if self.role == Role::Sniff {
            trace!(endpoint = %self.label, bytes = chunk.len(), "Discarding bytes received on sniff endpoint");
            return;
        }
        let mut inbound = self.inbound.lock().await;
        let dropped = inbound.append(chunk);
        debug!(endpoint = %self.label, bytes = chunk.len(), buffered = inbound.len(), "Received bytes");
        if dropped > 0 {
            warn!(
                endpoint = %self.label,
                dropped,
                total_dropped = inbound.dropped(),
                "Buffer limit reached, oldest bytes dropped"
            );
        }
    }

    async fn read_loop<R>(self: Arc<Self>, generation: u64, mut reader: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => {
                    self.detach(generation, "end of stream").await;
                    return;
                }
                Ok(n) => self.ingest(&chunk[..n]).await,
                Err(e) => {
                    warn!(endpoint = %self.label, peer = generation, error = %e, "Read error");
                    self.detach(generation, "read error").await;
                    return;
                }
            }
        }
    }

    async fn write_loop<W>(
        self: Arc<Self>,
        generation: u64,
        mut writer: W,
        mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) where
        W: AsyncWrite + Unpin,
    {
        while let Some(bytes) = rx.recv().await {
            if let Err(e) = writer.write_all(&bytes).await {
                warn!(endpoint = %self.label, peer = generation, error = %e, "Write error");
                self.detach(generation, "write error").await;
                return;
            }
            trace!(endpoint = %self.label, bytes = bytes.len(), "Wrote bytes");
        }
        if let Err(e) = writer.shutdown().await {
            debug!(endpoint = %self.label, peer = generation, error = %e, "Writer shutdown failed");
        }
    }
}
