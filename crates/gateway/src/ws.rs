//! Per-connection WebSocket handling.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::extract::ws::{Message, WebSocket},
    futures::{SinkExt, StreamExt},
    tokio::sync::mpsc,
    tracing::{debug, info, trace},
};

use parley_protocol::{ClientEvent, decode_client_event};

use crate::state::GatewayState;

/// Drive one WebSocket connection until it closes.
///
/// The socket is split: a spawned write loop drains an unbounded channel
/// into the sink, while this task reads inbound frames and dispatches them
/// into the engine. The engine only ever sees the channel sender, so a dead
/// client shows up as a closed channel, never as a blocked send.
pub async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>, addr: SocketAddr) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.engine.connect(&conn_id, tx).await;
    info!(conn_id, %addr, "client connected");

    let write_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        // Drain stops on channel close (engine dropped the sender on
        // disconnect) or sink error; either way, try to close cleanly.
        let _ = ws_tx.close().await;
    });

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(frame)) => dispatch(&state, &conn_id, frame.as_str()).await,
            Ok(Message::Close(_)) | Err(_) => break,
            // Pings are answered by axum; binary and pongs are ignored.
            Ok(_) => {},
        }
    }

    state.engine.disconnect(&conn_id).await;
    write_task.abort();
    info!(conn_id, "client disconnected");
}

/// Decode and route one inbound frame. Malformed input is logged and
/// dropped; out-of-order operations are the engine's problem and never
/// terminate the connection.
async fn dispatch(state: &Arc<GatewayState>, conn_id: &str, frame: &str) {
    let event = match decode_client_event(frame) {
        Ok(event) => event,
        Err(e) => {
            debug!(conn_id, error = %e, "ignoring malformed frame");
            return;
        },
    };
    trace!(conn_id, ?event, "client event");

    let engine = &state.engine;
    match event {
        ClientEvent::Find => {
            engine.find(conn_id).await;
        },
        ClientEvent::Leave => engine.leave(conn_id).await,
        ClientEvent::NewRequest => {
            engine.new_request(conn_id).await;
        },
        ClientEvent::Message { text } => engine.message(conn_id, text).await,
        ClientEvent::Typing { typing } => engine.typing(conn_id, typing).await,
        ClientEvent::WebrtcOffer { sdp } => engine.offer(conn_id, sdp).await,
        ClientEvent::WebrtcAnswer { to, sdp } => engine.answer(conn_id, &to, sdp).await,
        ClientEvent::WebrtcIceCandidate { candidate } => {
            engine.ice_candidate(conn_id, candidate).await;
        },
    }
}
