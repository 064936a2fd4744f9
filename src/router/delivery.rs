//! Fan-out outcome

use super::group::GroupName;
use crate::registry::ConnectionId;

/// Result of delivering one message to a group
///
/// A partial failure is not an error: unreachable members are listed and the
/// rest still receive the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Target group
    pub group: GroupName,
    /// Members whose queue accepted the message
    pub delivered: usize,
    /// Members that could not be reached
    pub failed: Vec<ConnectionId>,
}

impl DeliveryReport {
    /// Empty report for `group`
    pub fn new(group: GroupName) -> Self {
        Self {
            group,
            delivered: 0,
            failed: Vec::new(),
        }
    }

    /// Number of members targeted
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }

    /// At least one member could not be reached
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Nobody was targeted
    pub fn is_empty(&self) -> bool {
        self.attempted() == 0
    }
}
