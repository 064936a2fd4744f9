//! Connection registry implementation

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::RegistryConfig;
use super::connection::{Connection, ConnectionId, Role};
use super::error::RegistryError;
use crate::router::{GroupName, GroupRouter, PeerSender};
use crate::session::SessionMachine;

/// Tracks live connections and their group membership
///
/// The registry lock is never held while a group lock is taken, so fan-outs
/// (which hold a group lock) cannot deadlock against registrations.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    router: Arc<GroupRouter>,
    session: Arc<SessionMachine>,
    config: RegistryConfig,
}

impl ConnectionRegistry {
    /// Create a registry that manages membership in `router`
    pub fn new(
        config: RegistryConfig,
        router: Arc<GroupRouter>,
        session: Arc<SessionMachine>,
    ) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            router,
            session,
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Record a new connection as `Unassigned`
    pub async fn register(
        &self,
        id: ConnectionId,
        sender: PeerSender,
    ) -> Result<Connection, RegistryError> {
        let mut connections = self.connections.write().await;

        if connections.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }

        let connection = Connection::new(id, sender);
        connections.insert(id, connection.clone());

        tracing::debug!(
            connection_id = %id,
            connections = connections.len(),
            "Connection registered"
        );

        Ok(connection)
    }

    /// Classify `hint` and move the connection into the matching group
    ///
    /// An unrecognised hint leaves the connection `Unassigned` (and out of any
    /// group it was in) and returns [`RegistryError::UnknownRoleHint`].
    pub async fn assign_role(&self, id: ConnectionId, hint: &str) -> Result<Role, RegistryError> {
        let (previous, sender) = {
            let connections = self.connections.read().await;
            let connection = connections
                .get(&id)
                .ok_or(RegistryError::UnknownConnection(id))?;
            (connection.role, connection.sender.clone())
        };

        let classified = self.config.classify(hint);
        let role = classified.unwrap_or(Role::Unassigned);

        if role != previous {
            if let Some(group) = previous.group() {
                self.leave_group(group, id).await;
            }
            if let Some(group) = role.group() {
                self.router.join(group, id, sender).await;
            }

            let still_registered = match self.connections.write().await.get_mut(&id) {
                Some(connection) => {
                    connection.role = role;
                    true
                }
                None => false,
            };

            // Unregistered while joining: undo the join
            if !still_registered {
                if let Some(group) = role.group() {
                    self.leave_group(group, id).await;
                }
                return Err(RegistryError::UnknownConnection(id));
            }
        }

        match classified {
            Some(role) => Ok(role),
            None => Err(RegistryError::UnknownRoleHint(hint.to_owned())),
        }
    }

    /// Remove a connection and its group membership
    ///
    /// Returns the removed connection, `None` if it was not registered. When
    /// the last producer leaves, the session is reset to idle.
    pub async fn unregister(&self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.write().await.remove(&id)?;

        if let Some(group) = connection.role.group() {
            self.leave_group(group, id).await;
        }

        tracing::debug!(
            connection_id = %id,
            role = %connection.role,
            age_ms = connection.age().as_millis() as u64,
            "Connection unregistered"
        );

        Some(connection)
    }

    /// Look up a connection
    pub async fn get(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.read().await.get(&id).cloned()
    }

    /// Role of a connection
    pub async fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.connections.read().await.get(&id).map(|c| c.role)
    }

    /// Number of registered connections
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether no connections are registered
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    async fn leave_group(&self, group: GroupName, id: ConnectionId) {
        let remaining = self.router.leave(group, id).await;

        if group == GroupName::Producers && remaining == 0 {
            tracing::info!(connection_id = %id, "Last producer left");
            // Re-checked under the session lock: a producer may join meanwhile
            self.session.reset_if_no_producers().await;
        }
    }
}
