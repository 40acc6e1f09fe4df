//! End-to-end sessions: a real socket, a simulation peer on its own thread
//! and the renderer ticking on the test thread.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use kiframe::networking::{BridgeState, EndReason, KeyEvent, NetworkError, SimulationPeer};
use kiframe::rendering::{RecordingSurface, TickOutcome};
use kiframe::shared::{
    Entity, EntityCategory, Frame, KiframeConfig, MessageType, TransportConfig, WallSegment,
};
use kiframe::{RenderSession, SessionError, SyntheticScene};

const PEER_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config(name: &str) -> KiframeConfig {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();

    let mut config = KiframeConfig::default();
    config.transport = TransportConfig {
        socket_path: std::env::temp_dir().join(format!("kiframe_e2e_{name}_{nanos}.sock")),
        accept_timeout_ms: 5_000,
        recv_timeout_ms: 50,
        join_timeout_ms: 1_000,
        ..TransportConfig::default()
    };
    config.render.hud_interval = 1;
    config.render.tick_interval_ms = 5;
    config
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn quad(x: f64, silhouette: i64) -> WallSegment {
    WallSegment::Quad {
        x1: x,
        y_top1: 50.0,
        y_bottom1: 150.0,
        x2: x + 20.0,
        y_top2: 55.0,
        y_bottom2: 145.0,
        distance: 60.0,
        silhouette,
    }
}

/// Two solid walls, one portal and one enemy box.
fn corridor() -> Frame {
    Frame {
        sequence: Some(1),
        walls: vec![quad(0.0, 3), quad(20.0, 3), quad(40.0, 0)],
        entities: vec![Entity::wireframe(
            160.0,
            80.0,
            120.0,
            20.0,
            EntityCategory::Enemy,
            50.0,
        )],
        ..Frame::default()
    }
}

/// Connects a peer from a background thread and hands it to `script`.
fn spawn_peer<T: Send + 'static>(
    path: PathBuf,
    script: impl FnOnce(SimulationPeer) -> T + Send + 'static,
) -> thread::JoinHandle<T> {
    thread::spawn(move || {
        let mut peer = SimulationPeer::connect(&path, PEER_TIMEOUT).unwrap();
        peer.wait_for_init(PEER_TIMEOUT).unwrap();
        script(peer)
    })
}

/// Reads until the renderer closes, returning every message type seen.
fn drain(mut peer: SimulationPeer) -> Vec<Option<MessageType>> {
    let mut seen = Vec::new();
    let deadline = Instant::now() + PEER_TIMEOUT;
    while Instant::now() < deadline {
        match peer.recv(Duration::from_millis(100)) {
            Ok(Some(message)) => seen.push(message.kind()),
            Ok(None) => {}
            Err(_) => break,
        }
    }
    seen
}

#[test]
fn test_corridor_frame_then_peer_shutdown() {
    let config = test_config("corridor");
    let path = config.transport.socket_path.clone();
    let (go_tx, go_rx) = crossbeam_channel::bounded::<()>(1);

    let peer = spawn_peer(path.clone(), move |mut peer| {
        peer.send_frame(&corridor()).unwrap();
        go_rx.recv().unwrap();

        let key = loop {
            match peer.recv(PEER_TIMEOUT).unwrap() {
                Some(message) if message.kind() == Some(MessageType::KeyEvent) => {
                    break message.decode_key_event().unwrap();
                }
                Some(_) => {}
                None => panic!("no key event from renderer"),
            }
        };
        peer.send_shutdown().unwrap();
        key
    });

    let mut session = RenderSession::open(&config, RecordingSurface::new()).unwrap();
    assert!(wait_until(PEER_TIMEOUT, || {
        session.bridge().stats().frames_received == 1
    }));

    let TickOutcome::Rendered(report) = session.tick() else {
        panic!("frame was not rendered");
    };
    assert_eq!(report.sequence, Some(1));
    assert_eq!(report.wall_lines, 8);
    assert_eq!(report.entity_lines, 4);

    let pools = session.renderer().pools();
    assert_eq!(pools.lines.visible_count(), 12);
    assert_eq!(pools.markers.visible_count(), 0);
    assert_eq!(pools.texts.visible_count(), 0);
    assert_eq!(session.renderer().surface().stats().refreshes, 1);

    assert!(session.bridge().send_key_event(true, 173));
    go_tx.send(()).unwrap();
    assert_eq!(
        peer.join().unwrap(),
        KeyEvent {
            pressed: true,
            key: 173
        }
    );

    assert!(wait_until(config.transport.join_timeout() * 2, || {
        session.bridge().state() == BridgeState::Stopped
    }));
    assert_eq!(session.bridge().end_reason(), Some(EndReason::PeerShutdown));
    assert!(!path.exists());
    assert!(session.is_finished());

    let summary = session.close();
    assert_eq!(summary.render.frames_rendered, 1);
    assert_eq!(summary.bridge.key_events_sent, 1);
    assert_eq!(summary.end_reason, Some(EndReason::PeerShutdown));
}

#[test]
fn test_stop_is_idempotent_and_thread_safe() {
    let config = test_config("stop");
    let path = config.transport.socket_path.clone();

    let peer = spawn_peer(path.clone(), drain);
    let session = RenderSession::open(&config, RecordingSurface::new()).unwrap();

    let bridge = session.bridge();
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(move || bridge.stop());
        }
    });
    bridge.stop();

    assert_eq!(bridge.state(), BridgeState::Stopped);
    assert_eq!(bridge.end_reason(), Some(EndReason::Requested));
    assert!(!path.exists());

    // Exactly one SHUTDOWN reached the peer
    let seen = peer.join().unwrap();
    assert_eq!(
        seen.iter()
            .filter(|kind| **kind == Some(MessageType::Shutdown))
            .count(),
        1
    );

    let summary = session.close();
    assert_eq!(summary.end_reason, Some(EndReason::Requested));
}

#[test]
fn test_streamed_session_runs_to_completion() {
    let config = test_config("stream");
    let path = config.transport.socket_path.clone();

    // Faster than the 5ms tick, so the queue has to drop frames
    let peer = spawn_peer(path, |peer| {
        for frame in SyntheticScene::default().take(60) {
            peer.send_frame(&frame).unwrap();
            thread::sleep(Duration::from_millis(1));
        }
        peer.send_shutdown().unwrap();
    });

    let mut session = RenderSession::open(&config, RecordingSurface::new()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    session.run_until(|| Instant::now() >= deadline);
    peer.join().unwrap();

    assert!(session.is_finished());
    let summary = session.summary();
    assert_eq!(summary.end_reason, Some(EndReason::PeerShutdown));
    assert_eq!(summary.bridge.frames_received, 60);
    assert!(summary.render.frames_rendered >= 1);
    assert_eq!(summary.render.frames_rendered, summary.render.refreshes);
    assert_eq!(summary.render.frames_aborted, 0);
    // The newest frame always survives the queue
    assert_eq!(summary.render.last_sequence, Some(59));

    // Everything on the surface was built up front
    let surface = session.renderer().surface().stats();
    assert_eq!(surface.constructed(), config.pools.total() as u64);
}

#[test]
fn test_malformed_messages_do_not_end_session() {
    let config = test_config("malformed");
    let path = config.transport.socket_path.clone();
    let (go_tx, go_rx) = crossbeam_channel::bounded::<()>(1);

    let peer = spawn_peer(path, move |peer| {
        peer.send_raw(MessageType::FrameData.code(), b"{walls: nope").unwrap();
        peer.send_raw(0x99, b"{}").unwrap();
        peer.send_frame(&corridor()).unwrap();
        go_rx.recv().unwrap();
        peer.send_shutdown().unwrap();
    });

    let mut session = RenderSession::open(&config, RecordingSurface::new()).unwrap();
    assert!(wait_until(PEER_TIMEOUT, || {
        session.bridge().stats().frames_received == 1
    }));

    let stats = session.bridge().stats();
    assert_eq!(stats.receive_errors, 1);
    assert_eq!(stats.ignored_messages, 1);
    assert_eq!(session.bridge().state(), BridgeState::Running);
    assert!(matches!(session.tick(), TickOutcome::Rendered(_)));

    go_tx.send(()).unwrap();
    peer.join().unwrap();
    assert!(wait_until(PEER_TIMEOUT, || session.is_finished()));
}

#[test]
fn test_disconnect_still_drains_queued_frame() {
    let config = test_config("disconnect");
    let path = config.transport.socket_path.clone();

    let peer = spawn_peer(path.clone(), |peer| {
        peer.send_frame(&corridor()).unwrap();
        peer.close();
    });

    let mut session = RenderSession::open(&config, RecordingSurface::new()).unwrap();
    peer.join().unwrap();
    assert!(wait_until(PEER_TIMEOUT, || {
        session.bridge().state() == BridgeState::Stopped
    }));
    assert_eq!(
        session.bridge().end_reason(),
        Some(EndReason::PeerDisconnected)
    );
    assert!(!path.exists());

    assert!(!session.is_finished());
    assert!(matches!(session.tick(), TickOutcome::Rendered(_)));
    assert!(session.is_finished());
}

#[test]
fn test_no_producer_times_out() {
    let mut config = test_config("lonely");
    config.transport.accept_timeout_ms = 100;
    let path = config.transport.socket_path.clone();

    let start = Instant::now();
    let err = RenderSession::open(&config, RecordingSurface::new()).unwrap_err();

    assert!(matches!(
        err,
        SessionError::Network(NetworkError::AcceptTimeout { .. })
    ));
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(!path.exists());
}
