//! Relay-wide counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::router::DeliveryReport;

/// Live counters, updated from any task
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    connections_total: AtomicU64,
    connections_active: AtomicU64,
    directives_accepted: AtomicU64,
    directives_rejected: AtomicU64,
    chunks_relayed: AtomicU64,
    chunks_dropped: AtomicU64,
    bytes_relayed: AtomicU64,
    delivery_failures: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Connections ever registered
    pub connections_total: u64,
    /// Currently registered connections
    pub connections_active: u64,
    /// Directives that caused a transition
    pub directives_accepted: u64,
    /// Directives rejected (invalid transition or no producer)
    pub directives_rejected: u64,
    /// Chunks forwarded to consumers
    pub chunks_relayed: u64,
    /// Malformed chunks dropped
    pub chunks_dropped: u64,
    /// Payload bytes forwarded
    pub bytes_relayed: u64,
    /// Per-member delivery failures
    pub delivery_failures: u64,
    /// Time since the relay started
    pub uptime: Duration,
}

impl RelayStats {
    /// Create zeroed counters, starting the uptime clock
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            directives_accepted: AtomicU64::new(0),
            directives_rejected: AtomicU64::new(0),
            chunks_relayed: AtomicU64::new(0),
            chunks_dropped: AtomicU64::new(0),
            bytes_relayed: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_closed(&self) {
        // Saturating decrement
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub(crate) fn directive(&self, accepted: bool) {
        if accepted {
            self.directives_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.directives_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn chunk_relayed(&self, bytes: usize) {
        self.chunks_relayed.fetch_add(1, Ordering::Relaxed);
        self.bytes_relayed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn chunk_dropped(&self) {
        self.chunks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn delivery(&self, report: &DeliveryReport) {
        if report.is_partial() {
            self.delivery_failures
                .fetch_add(report.failed.len() as u64, Ordering::Relaxed);
        }
    }

    /// Copy the current values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            directives_accepted: self.directives_accepted.load(Ordering::Relaxed),
            directives_rejected: self.directives_rejected.load(Ordering::Relaxed),
            chunks_relayed: self.chunks_relayed.load(Ordering::Relaxed),
            chunks_dropped: self.chunks_dropped.load(Ordering::Relaxed),
            bytes_relayed: self.bytes_relayed.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}
