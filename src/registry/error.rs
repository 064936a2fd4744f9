//! Registry error types

use super::connection::ConnectionId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Connection id is already registered
    #[error("Connection already registered: {0}")]
    DuplicateId(ConnectionId),

    /// Connection id is not registered
    #[error("Connection not registered: {0}")]
    UnknownConnection(ConnectionId),

    /// Role hint did not match any known role; the connection stays unassigned
    #[error("Unknown role hint: {0:?}")]
    UnknownRoleHint(String),
}
