//! The relay tick loop.
//!
//! Every tick both directions are evaluated independently:
//!
//! 1. If the source has pending bytes and the destination is write-ready,
//!    the source is drained and the payload written to the destination.
//! 2. The same payload is then copied to the direction's sniff endpoint, but
//!    only if that sniff endpoint is write-ready. The sniffer never gates
//!    the primary write.
//!
//! Otherwise the bytes stay buffered on the source until a later tick finds
//! the destination ready.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::endpoint::Endpoint;
use crate::topology::Topology;

use super::stats::{Direction, RelayStats};

/// Moves bytes between the endpoints of a [`Topology`].
#[derive(Debug)]
pub struct RelayEngine {
    topology: Topology,
    tick_interval: Duration,
    stats: RelayStats,
}

impl RelayEngine {
    pub fn new(topology: Topology, tick_interval: Duration) -> Self {
        Self {
            topology,
            tick_interval,
            stats: RelayStats::default(),
        }
    }

    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    pub const fn stats(&self) -> &RelayStats {
        &self.stats
    }

    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Run one relay step over both directions.
    pub async fn tick(&mut self) {
        self.stats.ticks += 1;
        for direction in Direction::BOTH {
            self.forward(direction).await;
        }
    }

    async fn forward(&mut self, direction: Direction) {
        let (source, destination, sniff) = self.topology.route(direction);

        if !source.has_pending_bytes().await || !destination.is_write_ready().await {
            return;
        }
        let mirror = match sniff {
            Some(sniff) if sniff.is_write_ready().await => Some(sniff),
            Some(sniff) => {
                trace!(%direction, sniff = %sniff.label(), "Sniff endpoint not ready, skipping mirror");
                None
            }
            None => None,
        };

        let payload = source.drain().await;
        if payload.is_empty() {
            return;
        }
        let len = payload.len() as u64;
        debug!(
            %direction,
            from = %source.label(),
            to = %destination.label(),
            bytes = len,
            "Forwarding bytes"
        );

        match mirror {
            Some(sniff) => {
                let copy = payload.clone();
                destination.write(payload).await;
                sniff.write(copy).await;
                self.stats.direction_mut(direction).mirrored_bytes += len;
            }
            None => destination.write(payload).await,
        }

        let stats = self.stats.direction_mut(direction);
        stats.forwarded_bytes += len;
        stats.forwards += 1;
    }

    /// Tick every `tick_interval` until `shutdown` fires, then return the
    /// final counters.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> RelayStats {
        let mut timer = tokio::time::interval(self.tick_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(tick_ms = self.tick_interval().as_millis(), "Relay engine started");

        loop {
            tokio::select! {
                _ = timer.tick() => self.tick().await,
                _ = shutdown.changed() => {
                    info!(
                        forwarded_1_to_2 = self.stats.first_to_second.forwarded_bytes,
                        forwarded_2_to_1 = self.stats.second_to_first.forwarded_bytes,
                        "Relay engine shutting down"
                    );
                    return self.stats;
                }
            }
        }
    }
}

impl Topology {
    /// Source, destination, and sniff endpoint for `direction`.
    fn route(&self, direction: Direction) -> (&Endpoint, &Endpoint, Option<&Endpoint>) {
        match direction {
            Direction::FirstToSecond => (&self.conn1, &self.conn2, self.sniff1.as_ref()),
            Direction::SecondToFirst => (&self.conn2, &self.conn1, self.sniff2.as_ref()),
        }
    }
}
