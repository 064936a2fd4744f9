//! Relay hub
//!
//! The entry point the transport calls for every inbound event. It wires the
//! registry, router, session machine and chunk relay together and keeps the
//! relay statistics.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::protocol::OutboundMessage;
use crate::registry::{
    Connection, ConnectionId, ConnectionRegistry, RegistryConfig, RegistryError, Role,
};
use crate::relay::{ChunkRelay, FrameChunk, RelayError};
use crate::router::{
    DeliveryReport, GroupName, GroupRouter, PeerSender, DEFAULT_DELIVERY_TIMEOUT,
};
use crate::session::{ControlDirective, SessionError, SessionMachine, SessionPhase, Transition};
use crate::stats::RelayStats;

/// Default query parameter carrying the role hint
pub const DEFAULT_ROLE_PARAM: &str = "type";

/// Shared relay core
pub struct RelayHub {
    registry: ConnectionRegistry,
    router: Arc<GroupRouter>,
    session: Arc<SessionMachine>,
    relay: ChunkRelay,
    stats: Arc<RelayStats>,
    role_param: String,
}

impl RelayHub {
    /// Create a hub with default settings
    pub fn new() -> Self {
        Self::with_config(
            RegistryConfig::default(),
            DEFAULT_ROLE_PARAM,
            DEFAULT_DELIVERY_TIMEOUT,
        )
    }

    /// Create a hub with custom role classification and delivery timeout
    pub fn with_config(
        registry_config: RegistryConfig,
        role_param: impl Into<String>,
        delivery_timeout: Duration,
    ) -> Self {
        let router = Arc::new(GroupRouter::with_delivery_timeout(delivery_timeout));
        let session = Arc::new(SessionMachine::new(Arc::clone(&router)));
        let registry =
            ConnectionRegistry::new(registry_config, Arc::clone(&router), Arc::clone(&session));
        let relay = ChunkRelay::new(Arc::clone(&router));

        Self {
            registry,
            router,
            session,
            relay,
            stats: Arc::new(RelayStats::new()),
            role_param: role_param.into(),
        }
    }

    /// Connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Group router
    pub fn router(&self) -> &Arc<GroupRouter> {
        &self.router
    }

    /// Relay statistics
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Current session phase
    pub async fn phase(&self) -> SessionPhase {
        self.session.phase().await
    }

    /// Role a connection with `query` will be given by [`on_connect`](Self::on_connect)
    pub fn classify(&self, query: &HashMap<String, String>) -> Role {
        query
            .get(&self.role_param)
            .and_then(|hint| self.registry.config().classify(hint))
            .unwrap_or(Role::Unassigned)
    }

    /// A transport connection opened
    ///
    /// Registers the connection and classifies it from the role query
    /// parameter. A missing or unknown hint is not an error: the connection
    /// stays `Unassigned`. Fails only on a duplicate id.
    pub async fn on_connect(
        &self,
        id: ConnectionId,
        query: &HashMap<String, String>,
        sender: PeerSender,
    ) -> Result<Role, RegistryError> {
        if let Err(e) = self.registry.register(id, sender).await {
            tracing::error!(connection_id = %id, error = %e, "Registration rejected");
            return Err(e);
        }
        self.stats.connection_opened();

        let Some(hint) = query.get(&self.role_param) else {
            tracing::debug!(connection_id = %id, "No role hint, connection unassigned");
            return Ok(Role::Unassigned);
        };

        match self.registry.assign_role(id, hint).await {
            Ok(role) => Ok(role),
            Err(RegistryError::UnknownRoleHint(hint)) => {
                tracing::warn!(
                    connection_id = %id,
                    hint = %hint,
                    "Unknown role hint, connection unassigned"
                );
                Ok(Role::Unassigned)
            }
            Err(e) => Err(e),
        }
    }

    /// A transport connection closed
    pub async fn on_disconnect(&self, id: ConnectionId) -> Option<Connection> {
        let connection = self.registry.unregister(id).await?;
        self.stats.connection_closed();
        Some(connection)
    }

    /// A control directive arrived from `origin`
    pub async fn on_control(
        &self,
        origin: ConnectionId,
        directive: ControlDirective,
    ) -> Result<Transition, SessionError> {
        let result = self.session.apply(directive).await;

        match &result {
            Ok(transition) => {
                self.stats.directive(true);
                self.stats.delivery(&transition.delivery);
            }
            Err(e) => {
                self.stats.directive(false);
                tracing::warn!(
                    connection_id = %origin,
                    directive = %directive,
                    error = %e,
                    "Directive rejected"
                );
            }
        }

        result
    }

    /// A frame chunk arrived from `origin`
    pub async fn on_chunk(
        &self,
        origin: ConnectionId,
        chunk: FrameChunk,
    ) -> Result<DeliveryReport, RelayError> {
        let size = chunk.len();

        match self.relay.relay(origin, chunk).await {
            Ok(report) => {
                self.stats.chunk_relayed(size);
                self.stats.delivery(&report);
                Ok(report)
            }
            Err(e) => {
                self.stats.chunk_dropped();
                Err(e)
            }
        }
    }

    /// Push an uploaded file to every consumer as a single complete frame,
    /// followed by a `FileUploaded` notice
    ///
    /// Called by upload endpoints outside the relay core. Returns the report
    /// for the frame.
    pub async fn publish_upload(&self, file_name: &str, payload: Bytes) -> DeliveryReport {
        let size = payload.len();
        let chunk = FrameChunk::binary(payload, 0, 0).with_stream_id(file_name);

        let report = self
            .router
            .deliver(GroupName::Consumers, OutboundMessage::Frame(chunk))
            .await;
        let notice = OutboundMessage::FileUploaded {
            file_name: file_name.to_owned(),
            size,
        };
        let notice_report = self.router.deliver(GroupName::Consumers, notice).await;

        tracing::info!(
            file_name = %file_name,
            size = size,
            consumers = report.delivered,
            "Upload published"
        );
        self.stats.chunk_relayed(size);
        self.stats.delivery(&report);
        self.stats.delivery(&notice_report);

        report
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn query(hint: &str) -> HashMap<String, String> {
        HashMap::from([(DEFAULT_ROLE_PARAM.to_string(), hint.to_string())])
    }

    #[tokio::test]
    async fn test_on_connect_classifies() {
        let hub = RelayHub::new();
        let (tx, _rx) = mpsc::channel(4);

        let role = hub.on_connect(ConnectionId::new(1), &query("flutter"), tx).await;

        assert_eq!(role, Ok(Role::Consumer));
        assert_eq!(hub.stats().snapshot().connections_active, 1);
    }

    #[tokio::test]
    async fn test_on_connect_unknown_or_missing_hint() {
        let hub = RelayHub::new();
        let (tx, _rx) = mpsc::channel(4);

        let unknown = hub.on_connect(ConnectionId::new(1), &query("desktop"), tx.clone()).await;
        let missing = hub.on_connect(ConnectionId::new(2), &HashMap::new(), tx).await;

        assert_eq!(unknown, Ok(Role::Unassigned));
        assert_eq!(missing, Ok(Role::Unassigned));
        assert!(!hub.router().has_members(GroupName::Producers).await);
        assert!(!hub.router().has_members(GroupName::Consumers).await);
    }

    #[tokio::test]
    async fn test_on_connect_duplicate_id() {
        let hub = RelayHub::new();
        let (tx, _rx) = mpsc::channel(4);
        let id = ConnectionId::new(1);

        hub.on_connect(id, &query("flutter"), tx.clone()).await.unwrap();
        let result = hub.on_connect(id, &query("raspberrypi"), tx).await;

        assert_eq!(result, Err(RegistryError::DuplicateId(id)));
        assert_eq!(hub.registry().role_of(id).await, Some(Role::Consumer));
        assert_eq!(hub.stats().snapshot().connections_total, 1);
    }

    #[tokio::test]
    async fn test_custom_role_param() {
        let hub = RelayHub::with_config(
            RegistryConfig::default().producer_hint("cam"),
            "role",
            DEFAULT_DELIVERY_TIMEOUT,
        );
        let (tx, _rx) = mpsc::channel(4);
        let params = HashMap::from([("role".to_string(), "cam".to_string())]);

        let role = hub.on_connect(ConnectionId::new(1), &params, tx).await;

        assert_eq!(role, Ok(Role::Producer));
    }

    #[tokio::test]
    async fn test_publish_upload_reaches_consumers() {
        let hub = RelayHub::new();
        let (tx, mut rx) = mpsc::channel(4);
        hub.on_connect(ConnectionId::new(1), &query("flutter"), tx)
            .await
            .unwrap();

        let report = hub
            .publish_upload("leaf.jpg", Bytes::from_static(b"\xFF\xD8"))
            .await;

        assert_eq!(report.delivered, 1);
        match rx.recv().await {
            Some(OutboundMessage::Frame(chunk)) => {
                assert_eq!(chunk.stream_id, "leaf.jpg");
                assert!(chunk.is_complete_unit());
                assert_eq!(&chunk.payload[..], b"\xFF\xD8");
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(matches!(
            rx.recv().await,
            Some(OutboundMessage::FileUploaded { size: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_publish_upload_counts_notice_failures() {
        let hub = RelayHub::new();
        let (tx, rx) = mpsc::channel(4);
        hub.on_connect(ConnectionId::new(1), &query("flutter"), tx)
            .await
            .unwrap();
        drop(rx);

        let report = hub.publish_upload("leaf.jpg", Bytes::from_static(b"x")).await;

        assert_eq!(report.failed, vec![ConnectionId::new(1)]);
        // One failure for the frame, one for the notice
        assert_eq!(hub.stats().snapshot().delivery_failures, 2);
    }

    #[tokio::test]
    async fn test_classify_matches_on_connect() {
        let hub = RelayHub::new();

        assert_eq!(hub.classify(&query("raspberrypi")), Role::Producer);
        assert_eq!(hub.classify(&query("flutter")), Role::Consumer);
        assert_eq!(hub.classify(&query("Flutter")), Role::Unassigned);
        assert_eq!(hub.classify(&HashMap::new()), Role::Unassigned);
    }

    #[tokio::test]
    async fn test_negative_chunk_index_is_dropped() {
        let hub = RelayHub::new();
        let (tx, mut rx) = mpsc::channel(4);
        hub.on_connect(ConnectionId::new(1), &query("flutter"), tx)
            .await
            .unwrap();

        let result = hub
            .on_chunk(ConnectionId::new(2), FrameChunk::text("A", -1, 3))
            .await;

        assert_eq!(
            result,
            Err(RelayError::MalformedChunk {
                sequence_index: -1,
                total_chunks: 3
            })
        );
        assert_eq!(hub.stats().snapshot().chunks_dropped, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stats_track_rejections_and_drops() {
        let hub = RelayHub::new();

        assert!(hub
            .on_control(ConnectionId::new(1), ControlDirective::EndCapture)
            .await
            .is_err());
        assert!(hub
            .on_chunk(ConnectionId::new(1), FrameChunk::text("A", 3, 3))
            .await
            .is_err());

        let snapshot = hub.stats().snapshot();
        assert_eq!(snapshot.directives_rejected, 1);
        assert_eq!(snapshot.chunks_dropped, 1);
    }
}
