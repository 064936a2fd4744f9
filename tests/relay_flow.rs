//! End-to-end flows through the relay hub, using in-memory queues in place
//! of sockets.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use camrelay::protocol::OutboundMessage;
use camrelay::relay::FrameChunk;
use camrelay::session::{ProducerCommand, SessionError};
use camrelay::{ConnectionId, ControlDirective, RelayHub, Role, SessionPhase};

fn hint(value: &str) -> HashMap<String, String> {
    HashMap::from([("type".to_string(), value.to_string())])
}

async fn recv(rx: &mut mpsc::Receiver<OutboundMessage>) -> OutboundMessage {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("queue closed")
}

#[tokio::test]
async fn capture_session_round_trip() {
    let hub = RelayHub::new();
    let camera = ConnectionId::new(1);
    let viewer = ConnectionId::new(2);
    let (camera_tx, mut camera_rx) = mpsc::channel(16);
    let (viewer_tx, mut viewer_rx) = mpsc::channel(16);

    assert_eq!(
        hub.on_connect(camera, &hint("raspberrypi"), camera_tx).await,
        Ok(Role::Producer)
    );
    assert_eq!(
        hub.on_connect(viewer, &hint("flutter"), viewer_tx).await,
        Ok(Role::Consumer)
    );

    let transition = hub
        .on_control(viewer, ControlDirective::InitCapture { timeout_secs: 10 })
        .await
        .unwrap();
    assert_eq!(transition.to, SessionPhase::Capturing);
    assert!(matches!(
        recv(&mut camera_rx).await,
        OutboundMessage::Command(ProducerCommand::StartCapture { timeout_secs: 10 })
    ));

    for index in 0..3 {
        let report = hub
            .on_chunk(camera, FrameChunk::text(format!("part-{index}"), index, 3))
            .await
            .unwrap();
        assert_eq!(report.delivered, 1);
    }
    for index in 0..3 {
        match recv(&mut viewer_rx).await {
            OutboundMessage::Frame(chunk) => {
                assert_eq!(chunk.sequence_index, index);
                assert_eq!(chunk.total_chunks, 3);
                assert_eq!(chunk.payload, format!("part-{index}").into_bytes());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    hub.on_control(viewer, ControlDirective::EndCapture)
        .await
        .unwrap();
    assert!(matches!(
        recv(&mut camera_rx).await,
        OutboundMessage::Command(ProducerCommand::StopCapture)
    ));
    assert_eq!(hub.phase().await, SessionPhase::Idle);

    // Commands never reach viewers
    assert!(viewer_rx.try_recv().is_err());
}

#[tokio::test]
async fn last_producer_leaving_resets_streaming_session() {
    let hub = RelayHub::new();
    let camera = ConnectionId::new(1);
    let viewer = ConnectionId::new(2);
    let (camera_tx, _camera_rx) = mpsc::channel(16);
    let (viewer_tx, _viewer_rx) = mpsc::channel(16);
    hub.on_connect(camera, &hint("raspberrypi"), camera_tx)
        .await
        .unwrap();
    hub.on_connect(viewer, &hint("flutter"), viewer_tx)
        .await
        .unwrap();

    hub.on_control(viewer, ControlDirective::StartLiveStream)
        .await
        .unwrap();
    assert_eq!(hub.phase().await, SessionPhase::Streaming);

    hub.on_disconnect(camera).await;
    assert_eq!(hub.phase().await, SessionPhase::Idle);

    let result = hub
        .on_control(viewer, ControlDirective::StopLiveStream)
        .await;
    assert_eq!(
        result,
        Err(SessionError::InvalidTransition {
            from: SessionPhase::Idle,
            directive: ControlDirective::StopLiveStream,
        })
    );
}

#[tokio::test]
async fn directive_without_producer_is_rejected() {
    let hub = RelayHub::new();
    let viewer = ConnectionId::new(1);
    let (viewer_tx, _viewer_rx) = mpsc::channel(16);
    hub.on_connect(viewer, &hint("flutter"), viewer_tx)
        .await
        .unwrap();

    let result = hub.on_control(viewer, ControlDirective::CaptureStill).await;

    assert_eq!(
        result,
        Err(SessionError::NoProducerAvailable(
            ControlDirective::CaptureStill
        ))
    );
    assert_eq!(hub.phase().await, SessionPhase::Idle);
}

#[tokio::test]
async fn chunks_fan_out_to_every_viewer() {
    let hub = RelayHub::new();
    let camera = ConnectionId::new(1);
    let (camera_tx, _camera_rx) = mpsc::channel(16);
    hub.on_connect(camera, &hint("raspberrypi"), camera_tx)
        .await
        .unwrap();

    let mut viewers = Vec::new();
    for raw in 2..5 {
        let (tx, rx) = mpsc::channel(16);
        hub.on_connect(ConnectionId::new(raw), &hint("flutter"), tx)
            .await
            .unwrap();
        viewers.push(rx);
    }

    let report = hub
        .on_chunk(camera, FrameChunk::text("whole", 0, 1))
        .await
        .unwrap();

    assert_eq!(report.delivered, 3);
    assert!(report.failed.is_empty());
    for rx in &mut viewers {
        assert!(matches!(recv(rx).await, OutboundMessage::Frame(chunk) if chunk.is_last()));
    }
}

#[tokio::test]
async fn departed_viewer_is_reported_as_failed() {
    let hub = RelayHub::new();
    let camera = ConnectionId::new(1);
    let gone = ConnectionId::new(2);
    let (camera_tx, _camera_rx) = mpsc::channel(16);
    let (gone_tx, gone_rx) = mpsc::channel(16);
    let (live_tx, _live_rx) = mpsc::channel(16);
    hub.on_connect(camera, &hint("raspberrypi"), camera_tx)
        .await
        .unwrap();
    hub.on_connect(gone, &hint("flutter"), gone_tx)
        .await
        .unwrap();
    hub.on_connect(ConnectionId::new(3), &hint("flutter"), live_tx)
        .await
        .unwrap();
    drop(gone_rx);

    let report = hub
        .on_chunk(camera, FrameChunk::text("A", 0, 1))
        .await
        .unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, vec![gone]);
    assert!(report.is_partial());
}
