//! Client and server event frames.

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

// ── Client → server ──────────────────────────────────────────────────────────

/// Events a client may send. `sdp` / `candidate` payloads are opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Request pairing with a stranger.
    Find,
    /// End the current pairing or stop waiting.
    Leave,
    /// Skip to a new stranger: leave semantics, then find semantics.
    NewRequest,
    /// Chat text for the current partner.
    Message { text: String },
    /// Typing indicator; the client debounces, the server forwards verbatim.
    Typing { typing: bool },
    /// WebRTC handshake offer, relayed to the partner.
    WebrtcOffer { sdp: Value },
    /// WebRTC handshake answer, addressed to the original offerer by handle.
    WebrtcAnswer { to: String, sdp: Value },
    /// ICE candidate, relayed to the partner.
    WebrtcIceCandidate { candidate: Value },
}

// ── Server → client ──────────────────────────────────────────────────────────

/// Attribution on a relayed chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFrom {
    You,
    Stranger,
    Bot,
}

/// Events the server may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Informational text for the client UI.
    Status { msg: String },
    /// The popped queue candidate was stale; re-issue `find` immediately.
    Retry,
    /// A pairing formed. `bot` is omitted on the wire for human pairings.
    Paired {
        #[serde(rename = "partnerId")]
        partner_id: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        bot: bool,
    },
    /// Teardown signal: the partner left or disconnected; release media.
    PartnerLeft,
    /// Relayed chat text.
    Message { from: MessageFrom, text: String },
    /// Relayed typing indicator.
    Typing { typing: bool },
    /// Relayed handshake offer, annotated with the sender's handle.
    WebrtcOffer { from: String, sdp: Value },
    /// Relayed handshake answer, annotated with the sender's handle.
    WebrtcAnswer { from: String, sdp: Value },
    /// Relayed ICE candidate, annotated with the sender's handle.
    WebrtcIceCandidate { from: String, candidate: Value },
}

impl ServerEvent {
    /// Convenience constructor for the most common frame.
    pub fn status(msg: impl Into<String>) -> Self {
        Self::Status { msg: msg.into() }
    }
}
