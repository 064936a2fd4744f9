//! Group router implementation

use std::collections::HashSet;
use std::time::Duration;

use super::delivery::DeliveryReport;
use super::group::{Group, GroupName, PeerSender};
use crate::protocol::OutboundMessage;
use crate::registry::ConnectionId;

/// Default per-member send timeout
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Maps group names to members and performs fan-out
///
/// Membership is mutated only by the connection registry; everything else
/// reads it.
pub struct GroupRouter {
    producers: Group,
    consumers: Group,
    delivery_timeout: Duration,
}

impl GroupRouter {
    /// Create a router with the default delivery timeout
    pub fn new() -> Self {
        Self::with_delivery_timeout(DEFAULT_DELIVERY_TIMEOUT)
    }

    /// Create a router with a custom per-member send timeout
    pub fn with_delivery_timeout(delivery_timeout: Duration) -> Self {
        Self {
            producers: Group::new(GroupName::Producers),
            consumers: Group::new(GroupName::Consumers),
            delivery_timeout,
        }
    }

    /// Look up a group
    pub fn group(&self, name: GroupName) -> &Group {
        match name {
            GroupName::Producers => &self.producers,
            GroupName::Consumers => &self.consumers,
        }
    }

    pub(crate) async fn join(&self, name: GroupName, id: ConnectionId, sender: PeerSender) {
        let group = self.group(name);
        if group.insert(id, sender).await {
            tracing::info!(connection_id = %id, group = %name, "Joined group");
        }
    }

    /// Remove `id` from `name`, returns the number of remaining members
    pub(crate) async fn leave(&self, name: GroupName, id: ConnectionId) -> usize {
        let (removed, remaining) = self.group(name).remove(id).await;
        if removed {
            tracing::info!(
                connection_id = %id,
                group = %name,
                remaining = remaining,
                "Left group"
            );
        }
        remaining
    }

    /// Snapshot of the members of a group
    pub async fn members_of(&self, name: GroupName) -> HashSet<ConnectionId> {
        self.group(name).member_ids().await
    }

    /// Whether a group currently has members
    pub async fn has_members(&self, name: GroupName) -> bool {
        !self.group(name).is_empty().await
    }

    /// Fan a message out to every current member of a group
    ///
    /// Best effort: unreachable members are listed in the report and never
    /// stop delivery to the rest.
    pub async fn deliver(&self, name: GroupName, message: OutboundMessage) -> DeliveryReport {
        let report = self
            .group(name)
            .deliver(&message, self.delivery_timeout)
            .await;

        if report.is_partial() {
            tracing::warn!(
                group = %name,
                delivered = report.delivered,
                failed = ?report.failed,
                "Partial delivery failure"
            );
        } else {
            tracing::trace!(group = %name, delivered = report.delivered, "Delivered");
        }

        report
    }
}

impl Default for GroupRouter {
    fn default() -> Self {
        Self::new()
    }
}
