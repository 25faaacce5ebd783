//! Relay paths: chat text, typing indicators, WebRTC handshake frames.
//!
//! All forwarding is fire-and-forget. Handshake payloads are opaque
//! [`serde_json::Value`]s and pass through unmodified; the relay only adds
//! `from` routing metadata.

use {
    serde_json::Value,
    tracing::{debug, trace},
};

use parley_protocol::{MessageFrom, ServerEvent, bot_reply};

use crate::{directory::PartnerRef, engine::MatchEngine};

impl MatchEngine {
    /// Relay chat text to the current partner.
    pub async fn message(&self, conn_id: &str, text: String) {
        let mut state = self.state.lock().await;
        match state.directory.partner_of(conn_id).cloned() {
            None => {
                state
                    .registry
                    .send_to(conn_id, &ServerEvent::status("no partner to send to"));
            },
            Some(PartnerRef::Bot) => {
                // The bot "thinks" for a moment before replying. The sender's
                // own message is not echoed back; bot-mode transcripts are
                // rendered client-side.
                let engine = self.clone();
                let to = conn_id.to_string();
                let delay = self.config.bot_reply_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    engine.deliver_bot_reply(&to, &text).await;
                });
            },
            Some(PartnerRef::Human(partner)) => {
                if state.registry.is_live(&partner) {
                    state.registry.send_to(&partner, &ServerEvent::Message {
                        from: MessageFrom::Stranger,
                        text: text.clone(),
                    });
                    state.registry.send_to(conn_id, &ServerEvent::Message {
                        from: MessageFrom::You,
                        text,
                    });
                } else {
                    // Stale entry: the partner's transport died before its
                    // disconnect reached us. Clean up as a disconnect would.
                    state
                        .registry
                        .send_to(conn_id, &ServerEvent::status("partner disconnected"));
                    state.directory.unpair(conn_id);
                    state.registry.remove(&partner);
                    debug!(conn_id, partner, "cleaned up dead partner on message");
                }
            },
        }
    }

    /// Deferred bot reply. Only delivered if the sender is still bot-paired
    /// at fire time.
    async fn deliver_bot_reply(&self, conn_id: &str, text: &str) {
        let state = self.state.lock().await;
        if state.directory.partner_of(conn_id) == Some(&PartnerRef::Bot) {
            state.registry.send_to(conn_id, &ServerEvent::Message {
                from: MessageFrom::Bot,
                text: bot_reply(text),
            });
        }
    }

    /// Forward a typing indicator verbatim. No-op without a live human
    /// partner; the bot does not type.
    pub async fn typing(&self, conn_id: &str, typing: bool) {
        let state = self.state.lock().await;
        if let Some(PartnerRef::Human(partner)) = state.directory.partner_of(conn_id) {
            state.registry.send_to(partner, &ServerEvent::Typing { typing });
        }
    }

    /// Relay a handshake offer to the partner, annotated with the sender's
    /// handle so the receiver can verify the pairing before acting. Dropped
    /// silently when there is no human partner — a bot cannot negotiate
    /// media, and the caller's UI already reflects "no partner".
    pub async fn offer(&self, conn_id: &str, sdp: Value) {
        let state = self.state.lock().await;
        match state.directory.partner_of(conn_id) {
            Some(PartnerRef::Human(partner)) => {
                let delivered = state.registry.send_to(partner, &ServerEvent::WebrtcOffer {
                    from: conn_id.to_string(),
                    sdp,
                });
                trace!(conn_id, partner, delivered, "relayed offer");
            },
            _ => debug!(conn_id, "dropped offer with no human partner"),
        }
    }

    /// Relay a handshake answer straight to `to` — the responder addresses
    /// the original offerer by handle, since its own directory lookup may not
    /// have completed yet. An unknown or dead target is a precondition
    /// violation and gets a status back.
    pub async fn answer(&self, conn_id: &str, to: &str, sdp: Value) {
        let state = self.state.lock().await;
        if state.registry.is_live(to) {
            state.registry.send_to(to, &ServerEvent::WebrtcAnswer {
                from: conn_id.to_string(),
                sdp,
            });
            trace!(conn_id, to, "relayed answer");
        } else {
            state
                .registry
                .send_to(conn_id, &ServerEvent::status("no session to answer"));
        }
    }

    /// Relay an ICE candidate to the partner. Same drop rule as offers.
    pub async fn ice_candidate(&self, conn_id: &str, candidate: Value) {
        let state = self.state.lock().await;
        match state.directory.partner_of(conn_id) {
            Some(PartnerRef::Human(partner)) => {
                state.registry.send_to(partner, &ServerEvent::WebrtcIceCandidate {
                    from: conn_id.to_string(),
                    candidate,
                });
            },
            _ => trace!(conn_id, "dropped ice candidate with no human partner"),
        }
    }
}

#[cfg(test)]
mod tests {
    use {serde_json::json, tokio::sync::mpsc::UnboundedReceiver};

    use parley_protocol::BOT_GREETING;

    use {
        super::*,
        crate::engine::{FindOutcome, MatchEngine},
    };

    async fn client(engine: &MatchEngine, id: &str) -> UnboundedReceiver<String> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        engine.connect(id, tx).await;
        rx
    }

    async fn paired_pair(
        engine: &MatchEngine,
    ) -> (UnboundedReceiver<String>, UnboundedReceiver<String>) {
        let mut a = client(engine, "a").await;
        let mut b = client(engine, "b").await;
        assert_eq!(engine.find("a").await, FindOutcome::Queued);
        assert_eq!(engine.find("b").await, FindOutcome::Matched("a".into()));
        drain(&mut a);
        drain(&mut b);
        (a, b)
    }

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn message_reaches_both_transcripts() {
        let engine = MatchEngine::default();
        let (mut a, mut b) = paired_pair(&engine).await;

        engine.message("a", "hello there".into()).await;

        let b_frames = drain(&mut b);
        assert_eq!(b_frames[0]["from"], "stranger");
        assert_eq!(b_frames[0]["text"], "hello there");

        let a_frames = drain(&mut a);
        assert_eq!(a_frames[0]["from"], "you");
        assert_eq!(a_frames[0]["text"], "hello there");
    }

    #[tokio::test]
    async fn message_without_partner_gets_status() {
        let engine = MatchEngine::default();
        let mut a = client(&engine, "a").await;

        engine.message("a", "anyone?".into()).await;

        let frames = drain(&mut a);
        assert_eq!(frames[0]["event"], "status");
    }

    #[tokio::test]
    async fn message_to_dead_partner_cleans_stale_entry() {
        let engine = MatchEngine::default();
        let (mut a, b) = paired_pair(&engine).await;
        drop(b);

        engine.message("a", "still there?".into()).await;

        let frames = drain(&mut a);
        assert_eq!(frames[0]["event"], "status");
        assert_eq!(frames[0]["msg"], "partner disconnected");
        assert_eq!(engine.counts().await.pairings, 0);
        assert!(engine.directory_is_symmetric().await);
    }

    #[tokio::test(start_paused = true)]
    async fn bot_replies_with_template_after_delay() {
        let engine = MatchEngine::default();
        let mut a = client(&engine, "a").await;
        engine.find("a").await;
        tokio::time::sleep(engine.config.bot_fallback + std::time::Duration::from_millis(10))
            .await;
        drain(&mut a);

        engine.message("a", "cats".into()).await;

        // Nothing until the thinking delay elapses, and no "you" echo ever.
        assert!(drain(&mut a).is_empty());
        tokio::time::sleep(engine.config.bot_reply_delay + std::time::Duration::from_millis(10))
            .await;

        let frames = drain(&mut a);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["from"], "bot");
        let text = frames[0]["text"].as_str().unwrap();
        assert!(text.contains("cats"));
        assert_ne!(text, BOT_GREETING);
    }

    #[tokio::test(start_paused = true)]
    async fn bot_reply_suppressed_after_leave() {
        let engine = MatchEngine::default();
        let mut a = client(&engine, "a").await;
        engine.find("a").await;
        tokio::time::sleep(engine.config.bot_fallback + std::time::Duration::from_millis(10))
            .await;
        drain(&mut a);

        engine.message("a", "wait".into()).await;
        engine.leave("a").await;
        tokio::time::sleep(engine.config.bot_reply_delay * 2).await;

        // Only the leave status; the queued reply re-validates and drops.
        let frames = drain(&mut a);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["event"], "status");
    }

    #[tokio::test]
    async fn typing_forwarded_only_to_live_human_partner() {
        let engine = MatchEngine::default();
        let (mut a, mut b) = paired_pair(&engine).await;

        engine.typing("a", true).await;
        let frames = drain(&mut b);
        assert_eq!(frames[0]["event"], "typing");
        assert_eq!(frames[0]["typing"], true);

        engine.typing("a", false).await;
        assert_eq!(drain(&mut b)[0]["typing"], false);
        assert!(drain(&mut a).is_empty());
    }

    #[tokio::test]
    async fn typing_is_noop_without_human_partner() {
        let engine = MatchEngine::default();
        let mut a = client(&engine, "a").await;
        engine.typing("a", true).await;
        assert!(drain(&mut a).is_empty());
    }

    #[tokio::test]
    async fn offer_payload_forwarded_unmodified() {
        let engine = MatchEngine::default();
        let (mut a, mut b) = paired_pair(&engine).await;

        let sdp = json!({
            "type": "offer",
            "sdp": "v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\ns=-\r\n",
        });
        engine.offer("a", sdp.clone()).await;

        let frames = drain(&mut b);
        assert_eq!(frames[0]["event"], "webrtc-offer");
        assert_eq!(frames[0]["from"], "a");
        assert_eq!(frames[0]["sdp"], sdp);
        assert!(drain(&mut a).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn offer_to_bot_partner_dropped_silently() {
        let engine = MatchEngine::default();
        let mut a = client(&engine, "a").await;
        engine.find("a").await;
        tokio::time::sleep(engine.config.bot_fallback + std::time::Duration::from_millis(10))
            .await;
        drain(&mut a);

        engine.offer("a", json!({"type": "offer"})).await;
        assert!(drain(&mut a).is_empty());
    }

    #[tokio::test]
    async fn answer_routed_to_explicit_target() {
        let engine = MatchEngine::default();
        let (mut a, mut b) = paired_pair(&engine).await;

        let sdp = json!({"type": "answer", "sdp": "v=0\r\n"});
        engine.answer("b", "a", sdp.clone()).await;

        let frames = drain(&mut a);
        assert_eq!(frames[0]["event"], "webrtc-answer");
        assert_eq!(frames[0]["from"], "b");
        assert_eq!(frames[0]["sdp"], sdp);
        assert!(drain(&mut b).is_empty());
    }

    #[tokio::test]
    async fn answer_to_missing_session_gets_status() {
        let engine = MatchEngine::default();
        let mut a = client(&engine, "a").await;

        engine.answer("a", "ghost", json!({"type": "answer"})).await;

        let frames = drain(&mut a);
        assert_eq!(frames[0]["event"], "status");
    }

    #[tokio::test]
    async fn ice_candidate_forwarded_with_sender_handle() {
        let engine = MatchEngine::default();
        let (mut a, mut b) = paired_pair(&engine).await;

        let candidate = json!({
            "candidate": "candidate:1 1 UDP 2122252543 192.168.1.7 54321 typ host",
            "sdpMid": "0",
            "sdpMLineIndex": 0,
        });
        engine.ice_candidate("a", candidate.clone()).await;

        let frames = drain(&mut b);
        assert_eq!(frames[0]["event"], "webrtc-ice-candidate");
        assert_eq!(frames[0]["from"], "a");
        assert_eq!(frames[0]["candidate"], candidate);
        assert!(drain(&mut a).is_empty());
    }
}
