//! Wire protocol for the parley gateway.
//!
//! Every WebSocket text frame is a JSON object tagged by an `event` field.
//! Clients send [`ClientEvent`]s, the server sends [`ServerEvent`]s. SDP and
//! ICE payloads are carried as opaque [`serde_json::Value`]s — the gateway
//! relays them without interpretation.

pub mod events;

pub use events::{ClientEvent, MessageFrom, ServerEvent};

use thiserror::Error;

/// How long a waiter sits in the queue before the bot steps in.
pub const BOT_FALLBACK_MS: u64 = 15_000;

/// Simulated "thinking" delay before a bot reply is delivered.
pub const BOT_REPLY_DELAY_MS: u64 = 700;

/// The partner id reported to a client paired with the bot.
pub const BOT_PARTNER_ID: &str = "bot";

/// Opening line the bot sends right after a fallback pairing forms.
pub const BOT_GREETING: &str =
    "hi! looks like nobody else is around right now, so you got me. what's up?";

/// Canned reply template wrapping whatever the client said.
pub fn bot_reply(text: &str) -> String {
    format!("interesting! tell me more about \"{text}\"")
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An inbound frame was not valid JSON or not a known event.
    #[error("malformed client frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode one inbound text frame.
pub fn decode_client_event(frame: &str) -> Result<ClientEvent, ProtocolError> {
    Ok(serde_json::from_str(frame)?)
}

/// Encode an outbound event. Infallible in practice; a serialization failure
/// yields `None` and the frame is simply not sent (relay is best-effort).
pub fn encode_server_event(event: &ServerEvent) -> Option<String> {
    serde_json::to_string(event).ok()
}
