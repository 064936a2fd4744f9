//! Named membership groups
//!
//! Each group has its own lock so producer and consumer membership never
//! contend with each other. A fan-out holds the group's read lock for its
//! whole duration:
//! - a connection joining mid-delivery waits and does not get that message
//! - a leave does not complete while a delivery to the member is in flight

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, RwLock};

use super::delivery::DeliveryReport;
use crate::protocol::OutboundMessage;
use crate::registry::ConnectionId;

/// Outbound queue handle of a connection
pub type PeerSender = mpsc::Sender<OutboundMessage>;

/// Logical group name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupName {
    /// Capture devices
    Producers,
    /// Viewers
    Consumers,
}

impl GroupName {
    /// Group name as used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            GroupName::Producers => "producers",
            GroupName::Consumers => "consumers",
        }
    }
}

impl std::fmt::Display for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group and its members
pub struct Group {
    name: GroupName,
    members: RwLock<HashMap<ConnectionId, PeerSender>>,
}

impl Group {
    pub(super) fn new(name: GroupName) -> Self {
        Self {
            name,
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Group name
    pub fn name(&self) -> GroupName {
        self.name
    }

    /// Add a member, returns false if it was already present
    pub(super) async fn insert(&self, id: ConnectionId, sender: PeerSender) -> bool {
        self.members.write().await.insert(id, sender).is_none()
    }

    /// Remove a member; returns whether it was present and the remaining size
    pub(super) async fn remove(&self, id: ConnectionId) -> (bool, usize) {
        let mut members = self.members.write().await;
        let removed = members.remove(&id).is_some();
        (removed, members.len())
    }

    /// Snapshot of member ids
    pub async fn member_ids(&self) -> HashSet<ConnectionId> {
        self.members.read().await.keys().copied().collect()
    }

    /// Number of members
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Whether the group has no members
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Send `message` to every member
    ///
    /// Members are sent to concurrently. A member whose queue is closed or
    /// stays full past `timeout` is recorded as failed and skipped.
    pub(super) async fn deliver(
        &self,
        message: &OutboundMessage,
        timeout: Duration,
    ) -> DeliveryReport {
        let members = self.members.read().await;

        let sends = members.iter().map(|(id, tx)| {
            let message = message.clone();
            async move {
                match tx.send_timeout(message, timeout).await {
                    Ok(()) => Ok(*id),
                    Err(SendTimeoutError::Timeout(_)) => {
                        tracing::debug!(connection_id = %id, "Delivery timed out");
                        Err(*id)
                    }
                    Err(SendTimeoutError::Closed(_)) => {
                        tracing::debug!(connection_id = %id, "Delivery to closed connection");
                        Err(*id)
                    }
                }
            }
        });

        let mut report = DeliveryReport::new(self.name);
        for result in join_all(sends).await {
            match result {
                Ok(_) => report.delivered += 1,
                Err(id) => report.failed.push(id),
            }
        }

        report
    }
}
