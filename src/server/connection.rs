//! Per-connection WebSocket task
//!
//! One reader loop feeds inbound events to the hub in arrival order; one
//! writer task drains the connection's bounded outbound queue to the socket.

use std::collections::HashMap;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{accept_hdr_async_with_config, WebSocketStream};

use crate::error::Result;
use crate::hub::RelayHub;
use crate::protocol::{
    decode_chunk, CompletionError, InboundEvent, Invocation, OutboundMessage, WireFrame,
};
use crate::registry::ConnectionId;
use crate::server::config::ServerConfig;

type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// How long the writer may keep flushing queued messages after the peer leaves
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// A single accepted WebSocket connection
pub(super) struct Connection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    hub: Arc<RelayHub>,
    config: ServerConfig,
}

impl Connection {
    pub(super) fn new(
        id: ConnectionId,
        peer_addr: SocketAddr,
        hub: Arc<RelayHub>,
        config: ServerConfig,
    ) -> Self {
        Self {
            id,
            peer_addr,
            hub,
            config,
        }
    }

    /// Complete the WebSocket handshake and serve until the peer leaves
    pub(super) async fn run(self, socket: TcpStream) -> Result<()> {
        let mut query = None;
        let capture_query = |request: &Request,
                             response: Response|
         -> std::result::Result<Response, ErrorResponse> {
            query = request.uri().query().map(str::to_owned);
            Ok(response)
        };

        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(self.config.max_message_size);
        ws_config.max_frame_size = Some(self.config.max_message_size);

        let ws_stream =
            accept_hdr_async_with_config(socket, capture_query, Some(ws_config)).await?;
        let params = parse_query(self.id, query.as_deref());
        let (ws_sender, mut ws_receiver) = ws_stream.split();

        let (tx, rx) = mpsc::channel(self.config.outbound_queue_capacity.max(1));

        // Queued before joining a group so it is the first message out
        let _ = tx
            .send(OutboundMessage::Connected {
                connection_id: self.id,
                role: self.hub.classify(&params),
            })
            .await;
        let role = self.hub.on_connect(self.id, &params, tx.clone()).await?;

        tracing::info!(
            connection_id = %self.id,
            peer = %self.peer_addr,
            role = %role,
            "Connection established"
        );

        let writer = tokio::spawn(write_loop(self.id, ws_sender, rx));

        let result = self.read_loop(&mut ws_receiver, &tx).await;

        self.hub.on_disconnect(self.id).await;
        drop(tx);
        finish_writer(self.id, writer, WRITER_DRAIN_TIMEOUT).await;

        tracing::info!(connection_id = %self.id, "Connection closed");
        result
    }

    async fn read_loop(
        &self,
        ws_receiver: &mut WsSource,
        tx: &mpsc::Sender<OutboundMessage>,
    ) -> Result<()> {
        while let Some(message) = ws_receiver.next().await {
            match message? {
                WsMessage::Text(text) => self.handle_text(&text, tx).await,
                WsMessage::Binary(data) => self.handle_binary(Bytes::from(data)).await,
                WsMessage::Close(_) => break,
                // Ping/pong are answered by tungstenite
                _ => {}
            }
        }

        Ok(())
    }

    async fn handle_text(&self, text: &str, tx: &mpsc::Sender<OutboundMessage>) {
        let event = match Invocation::parse(text).and_then(Invocation::into_event) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    connection_id = %self.id,
                    error = %e,
                    "Ignoring undecodable message"
                );
                return;
            }
        };

        match event {
            InboundEvent::Control(directive) => {
                let outcome = self
                    .hub
                    .on_control(self.id, directive)
                    .await
                    .map(|transition| transition.to)
                    .map_err(|e| CompletionError {
                        kind: e.kind(),
                        message: e.to_string(),
                    });

                let completion = OutboundMessage::Completion {
                    target: directive.name(),
                    outcome,
                };
                if tx.send(completion).await.is_err() {
                    tracing::debug!(connection_id = %self.id, "Completion dropped, writer gone");
                }
            }
            InboundEvent::Chunk(chunk) => {
                // Malformed chunks are logged by the relay; nothing to report back
                let _ = self.hub.on_chunk(self.id, chunk).await;
            }
        }
    }

    async fn handle_binary(&self, data: Bytes) {
        match decode_chunk(data) {
            Ok(chunk) => {
                let _ = self.hub.on_chunk(self.id, chunk).await;
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %self.id,
                    error = %e,
                    "Ignoring undecodable chunk"
                );
            }
        }
    }
}

async fn write_loop<S>(
    id: ConnectionId,
    mut ws_sender: S,
    mut rx: mpsc::Receiver<OutboundMessage>,
) where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    while let Some(message) = rx.recv().await {
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(connection_id = %id, error = %e, "Failed to encode message");
                continue;
            }
        };

        let ws_message = match frame {
            WireFrame::Text(text) => WsMessage::Text(text),
            WireFrame::Binary(bytes) => WsMessage::Binary(bytes.to_vec()),
        };

        if let Err(e) = ws_sender.send(ws_message).await {
            tracing::debug!(connection_id = %id, error = %e, "Socket write failed");
            break;
        }
    }

    let _ = ws_sender.close().await;
}

/// Let the writer flush what is still queued, then close the socket
///
/// Every sender must be dropped first so the queue ends.
async fn finish_writer(id: ConnectionId, mut writer: JoinHandle<()>, drain_timeout: Duration) {
    if tokio::time::timeout(drain_timeout, &mut writer).await.is_err() {
        tracing::debug!(connection_id = %id, "Writer did not drain in time");
        writer.abort();
    }
}

fn parse_query(id: ConnectionId, query: Option<&str>) -> HashMap<String, String> {
    let Some(query) = query else {
        return HashMap::new();
    };

    serde_urlencoded::from_str(query).unwrap_or_else(|e| {
        tracing::warn!(connection_id = %id, error = %e, "Unparseable query string");
        HashMap::new()
    })
}
