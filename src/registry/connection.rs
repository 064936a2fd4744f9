//! Connection records and role classification

use std::time::Instant;

use crate::router::{GroupName, PeerSender};

/// Opaque identifier of a live transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw identifier
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Role of a connection in the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Capture device: receives directives, sends chunks
    Producer,
    /// Viewer: sends directives, receives chunks
    Consumer,
    /// Not a member of any group
    Unassigned,
}

impl Role {
    /// Group this role belongs to, if any
    pub fn group(self) -> Option<GroupName> {
        match self {
            Role::Producer => Some(GroupName::Producers),
            Role::Consumer => Some(GroupName::Consumers),
            Role::Unassigned => None,
        }
    }

    /// Lowercase name used on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Consumer => "consumer",
            Role::Unassigned => "unassigned",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered connection
///
/// Owned by the [`ConnectionRegistry`](super::ConnectionRegistry). Groups only
/// hold the id and a clone of the outbound sender.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Connection identifier
    pub id: ConnectionId,

    /// Current role
    pub role: Role,

    /// When the connection was registered
    pub created_at: Instant,

    /// Outbound queue of the transport connection
    pub(super) sender: PeerSender,
}

impl Connection {
    pub(super) fn new(id: ConnectionId, sender: PeerSender) -> Self {
        Self {
            id,
            role: Role::Unassigned,
            created_at: Instant::now(),
            sender,
        }
    }

    /// Time since registration
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_groups() {
        assert_eq!(Role::Producer.group(), Some(GroupName::Producers));
        assert_eq!(Role::Consumer.group(), Some(GroupName::Consumers));
        assert_eq!(Role::Unassigned.group(), None);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(42).to_string(), "conn-42");
        assert_eq!(ConnectionId::from(7).get(), 7);
    }
}
