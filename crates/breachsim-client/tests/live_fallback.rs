//! Live-channel behavior against an in-process endpoint: event application,
//! malformed-frame tolerance, outbound commands, and the start-liveness
//! fallback to the local simulator.

use std::net::SocketAddr;
use std::time::Duration;

use breachsim_client::{ClientConfig, SessionController, Timing};
use breachsim_core::agent::{AgentId, AgentStatus};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

fn fast_config(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        base_url: format!("http://{addr}"),
        timing: Timing::scaled_down(30),
    }
}

/// Binds an ephemeral port and runs `handler` on the first connection.
async fn spawn_endpoint<F, Fut>(handler: F) -> SocketAddr
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        handler(ws).await;
    });
    addr
}

#[tokio::test(flavor = "multi_thread")]
async fn test_live_events_drive_the_session() {
    let (commands_tx, mut commands_rx) = mpsc::channel::<String>(8);
    let addr = spawn_endpoint(move |mut ws| async move {
        // The session opens with START.
        let start = ws.next().await.expect("frame").expect("ok frame");
        commands_tx.send(start.into_text().unwrap()).await.unwrap();

        for frame in [
            r#"{"type":"STATE_UPDATE","agent":"RED_SCANNER","status":"THINKING"}"#,
            r#"{"type":"NEW_MESSAGE","agent":"RED_SCANNER","text":"Ports 80/443 open"}"#,
            // Neither of these may kill the channel or touch state.
            r#"{"type":"ATTACK_LAUNCH","damage":10}"#,
            "not json",
            r#"{"type":"IMPACT","damage_taken":30}"#,
            r#"{"type":"NEW_MESSAGE","agent":"RED_SCANNER","text":"Pivoting"}"#,
        ] {
            ws.send(Message::Text(frame.to_string())).await.expect("send");
        }

        // Relay whatever the client sends next.
        while let Some(Ok(frame)) = ws.next().await {
            if let Message::Text(text) = frame {
                commands_tx.send(text).await.unwrap();
            }
        }
    })
    .await;

    let config = fast_config(addr);
    let controller = SessionController::new(config);
    controller.connect().await;
    assert!(controller.is_live().await);

    controller.start("NETWORK_FLOOD").await;
    assert_eq!(
        commands_rx.recv().await.as_deref(),
        Some(r#"{"type":"START","mission":"NETWORK_FLOOD"}"#)
    );

    sleep(Duration::from_millis(200)).await;
    let state = controller.snapshot().await;
    assert_eq!(state.status_of(AgentId::RedScanner), AgentStatus::Thinking);
    // The frame after the malformed ones landed: the reader kept going.
    assert_eq!(state.transcripts[&AgentId::RedScanner], "Pivoting");
    assert_eq!(state.health, 70);

    controller.submit_decision(true).await;
    assert_eq!(
        commands_rx.recv().await.as_deref(),
        Some(r#"{"type":"DECISION","approved":true}"#)
    );
    // Streaming events arrived, so the session never left live mode.
    assert!(controller.is_live().await);

    controller.reset().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_silent_endpoint_falls_back_to_mock() {
    // Accepts the channel and the START but never produces an event.
    let addr = spawn_endpoint(|mut ws| async move {
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let config = fast_config(addr);
    let timing = config.timing;
    let controller = SessionController::new(config);
    controller.connect().await;
    assert!(controller.is_live().await);

    controller.start("NETWORK_FLOOD").await;
    sleep(timing.liveness_timeout + timing.tick_interval * 3).await;
    assert!(controller.is_mock().await);

    // The simulator is actually producing output now.
    assert!(!controller.snapshot().await.statuses.is_empty());

    controller.reset().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_streaming_event_disarms_the_watchdog() {
    let addr = spawn_endpoint(|mut ws| async move {
        let _start = ws.next().await;
        ws.send(Message::Text(
            r#"{"type":"STATE_UPDATE","agent":"RED_SCANNER","status":"THINKING"}"#.to_string(),
        ))
        .await
        .expect("send");
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let config = fast_config(addr);
    let timing = config.timing;
    let controller = SessionController::new(config);
    controller.connect().await;
    controller.start("NETWORK_FLOOD").await;

    sleep(timing.liveness_timeout + timing.tick_interval).await;
    assert!(controller.is_live().await);
    assert!(!controller.is_mock().await);

    controller.reset().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_start_replaces_the_watchdog() {
    // Streams the first event only after the second START, later than the
    // first watchdog's deadline but within the re-armed one. Only the
    // re-armed timer may govern the session.
    let addr = spawn_endpoint(|mut ws| async move {
        let timing = Timing::scaled_down(30);
        let _first_start = ws.next().await;
        let _second_start = ws.next().await;
        sleep(timing.liveness_timeout / 2).await;
        ws.send(Message::Text(
            r#"{"type":"STATE_UPDATE","agent":"RED_SCANNER","status":"THINKING"}"#.to_string(),
        ))
        .await
        .expect("send");
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let config = fast_config(addr);
    let timing = config.timing;
    let controller = SessionController::new(config);
    controller.connect().await;
    controller.start("NETWORK_FLOOD").await;

    sleep(timing.liveness_timeout * 3 / 5).await;
    controller.start("NETWORK_FLOOD").await;

    sleep(timing.liveness_timeout + timing.tick_interval).await;
    assert!(controller.is_live().await);
    assert!(!controller.is_mock().await);

    controller.reset().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_responses_do_not_prove_liveness() {
    // A reply-only endpoint: answers EXPLAIN but never streams events.
    let addr = spawn_endpoint(|mut ws| async move {
        while let Some(Ok(frame)) = ws.next().await {
            if let Message::Text(text) = frame {
                if text.contains("EXPLAIN") {
                    ws.send(Message::Text(
                        r#"{"type":"EDUCATIONAL_RESPONSE","edu_text":"A flood exhausts..."}"#
                            .to_string(),
                    ))
                    .await
                    .expect("send");
                }
            }
        }
    })
    .await;

    let config = fast_config(addr);
    let timing = config.timing;
    let controller = SessionController::new(config);
    controller.connect().await;
    controller.start("NETWORK_FLOOD").await;
    controller.request_explanation().await;

    sleep(timing.tick_interval).await;
    assert_eq!(
        controller.snapshot().await.explanation.as_deref(),
        Some("A flood exhausts...")
    );

    // The reply landed, but it is not simulation output; the watchdog
    // still fires.
    sleep(timing.liveness_timeout).await;
    assert!(controller.is_mock().await);

    controller.reset().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_endpoint_starts_locally() {
    let config = ClientConfig {
        // Reserved port; connect is refused immediately.
        base_url: "http://127.0.0.1:1".to_string(),
        timing: Timing::scaled_down(30),
    };
    let controller = SessionController::new(config);
    controller.connect().await;
    assert!(!controller.is_live().await);

    controller.start("NETWORK_FLOOD").await;
    assert!(controller.is_mock().await);

    controller.reset().await;
}
