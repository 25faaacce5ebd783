//! End-to-end WebSocket session tests against a live gateway.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    futures::{SinkExt, StreamExt},
    serde_json::{Value, json},
    tokio::net::TcpStream,
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message},
};

use {
    parley_engine::EngineConfig,
    parley_gateway::{server::build_gateway_app, state::GatewayState},
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_gateway() -> SocketAddr {
    let state = GatewayState::new(EngineConfig {
        // Long fallback so the bot never interferes with human pairing tests.
        bot_fallback: Duration::from_secs(600),
        bot_reply_delay: Duration::from_millis(10),
    });
    let app = build_gateway_app(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Receive the next text frame as JSON, skipping control frames.
async fn recv_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn two_clients_pair_chat_and_tear_down() {
    let addr = spawn_gateway().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    send(&mut a, json!({"event": "find"})).await;
    let waiting = recv_json(&mut a).await;
    assert_eq!(waiting["event"], "status");

    send(&mut b, json!({"event": "find"})).await;
    let a_paired = recv_json(&mut a).await;
    let b_paired = recv_json(&mut b).await;
    assert_eq!(a_paired["event"], "paired");
    assert_eq!(b_paired["event"], "paired");
    // Each side is told the other's handle, and they differ.
    assert_ne!(a_paired["partnerId"], b_paired["partnerId"]);

    send(&mut a, json!({"event": "message", "text": "hi"})).await;
    let b_msg = recv_json(&mut b).await;
    assert_eq!(b_msg["from"], "stranger");
    assert_eq!(b_msg["text"], "hi");
    let a_echo = recv_json(&mut a).await;
    assert_eq!(a_echo["from"], "you");

    // Handshake payload passes through unmodified.
    let sdp = json!({"type": "offer", "sdp": "v=0\r\n"});
    send(&mut a, json!({"event": "webrtc-offer", "sdp": sdp})).await;
    let offer = recv_json(&mut b).await;
    assert_eq!(offer["event"], "webrtc-offer");
    assert_eq!(offer["sdp"], sdp);
    assert_eq!(&offer["from"], &b_paired["partnerId"]);

    // A drops its socket; B gets the teardown pair.
    a.close(None).await.unwrap();
    let status = recv_json(&mut b).await;
    assert_eq!(status["event"], "status");
    let left = recv_json(&mut b).await;
    assert_eq!(left["event"], "partner-left");
}

#[tokio::test]
async fn malformed_frames_are_ignored() {
    let addr = spawn_gateway().await;
    let mut a = connect(addr).await;

    send(&mut a, json!({"event": "no-such-event"})).await;
    a.send(Message::Text("not json at all".into()))
        .await
        .unwrap();

    // The connection survives and still behaves normally.
    send(&mut a, json!({"event": "find"})).await;
    let status = recv_json(&mut a).await;
    assert_eq!(status["event"], "status");
}
