//! Session lifecycle: find, leave, disconnect, bot fallback.

use std::{sync::Arc, time::Duration};

use {
    tokio::sync::{Mutex, mpsc},
    tracing::{debug, info},
};

use parley_protocol::{
    BOT_FALLBACK_MS, BOT_GREETING, BOT_PARTNER_ID, BOT_REPLY_DELAY_MS, MessageFrom, ServerEvent,
};

use crate::{
    directory::{PartnerDirectory, PartnerRef},
    queue::WaitingQueue,
    registry::ConnectionRegistry,
};

// ── Config ───────────────────────────────────────────────────────────────────

/// Timing knobs, overridable from config (tests shrink them).
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// How long a waiter stays queued before the bot steps in.
    pub bot_fallback: Duration,
    /// Simulated thinking delay before a bot reply.
    pub bot_reply_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bot_fallback: Duration::from_millis(BOT_FALLBACK_MS),
            bot_reply_delay: Duration::from_millis(BOT_REPLY_DELAY_MS),
        }
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────────────

/// What a `find` call did. Notifications have already been sent; this is for
/// callers that want to log or assert on the path taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindOutcome {
    /// Rejected: the handle already has a partner. No state changed.
    AlreadyPaired,
    /// Rejected: the handle is already in the waiting queue. No state changed.
    AlreadyWaiting,
    /// A human pairing formed with the given handle.
    Matched(String),
    /// The popped candidate's transport was dead; the caller was told to
    /// re-issue `find`.
    RetryStale,
    /// No waiter available; the handle was enqueued and a bot fallback
    /// scheduled.
    Queued,
}

/// Snapshot of engine occupancy for the health endpoint.
#[derive(Debug, Clone, Copy)]
pub struct EngineCounts {
    pub clients: usize,
    pub waiting: usize,
    pub pairings: usize,
}

// ── Engine ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) registry: ConnectionRegistry,
    pub(crate) queue: WaitingQueue,
    pub(crate) directory: PartnerDirectory,
}

/// The matchmaking engine. Cheap to clone; all clones share one state behind
/// a single mutex, which serializes every queue/directory/registry mutation.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    pub(crate) state: Arc<Mutex<EngineState>>,
    pub(crate) config: EngineConfig,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MatchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState::default())),
            config,
        }
    }

    /// Register a freshly upgraded connection.
    pub async fn connect(&self, conn_id: &str, sender: mpsc::UnboundedSender<String>) {
        self.state.lock().await.registry.register(conn_id, sender);
        debug!(conn_id, "connection registered");
    }

    /// Request a pairing for `conn_id`.
    pub async fn find(&self, conn_id: &str) -> FindOutcome {
        let mut state = self.state.lock().await;

        if state.directory.is_paired(conn_id) {
            state
                .registry
                .send_to(conn_id, &ServerEvent::status("you are already in a conversation"));
            return FindOutcome::AlreadyPaired;
        }
        if state.queue.contains(conn_id) {
            state
                .registry
                .send_to(conn_id, &ServerEvent::status("still looking for a partner"));
            return FindOutcome::AlreadyWaiting;
        }

        if let Some(candidate) = state.queue.pop_front() {
            let partner = candidate.conn_id.clone();
            if state.registry.is_live(&partner) {
                state.directory.pair_humans(conn_id, &partner);
                state.registry.send_to(conn_id, &ServerEvent::Paired {
                    partner_id: partner.clone(),
                    bot: false,
                });
                state.registry.send_to(&partner, &ServerEvent::Paired {
                    partner_id: conn_id.to_string(),
                    bot: false,
                });
                info!(conn_id, partner, "paired");
                return FindOutcome::Matched(partner);
            }
            // The head waiter's transport died while queued. Discard it and
            // have the caller try again for the next one.
            state.registry.remove(&partner);
            state
                .registry
                .send_to(conn_id, &ServerEvent::status("that stranger just vanished, retrying"));
            state.registry.send_to(conn_id, &ServerEvent::Retry);
            debug!(conn_id, stale = %partner, "discarded stale waiter");
            return FindOutcome::RetryStale;
        }

        // Nobody waiting: enqueue and give the bot a chance later. The timer
        // task re-validates under the lock, so aborting it is an optimization,
        // not a correctness requirement.
        let engine = self.clone();
        let owner = conn_id.to_string();
        let delay = self.config.bot_fallback;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.fire_bot_fallback(&owner).await;
        });
        state.queue.push(conn_id, timer.abort_handle());
        state
            .registry
            .send_to(conn_id, &ServerEvent::status("waiting for a stranger..."));
        debug!(conn_id, "enqueued");
        FindOutcome::Queued
    }

    /// Bot-fallback timer body. Preconditions (still queued, still unpaired)
    /// are re-checked under the lock to close the race against a concurrent
    /// `find` or `leave` that dequeued this handle after the timer was armed.
    async fn fire_bot_fallback(&self, conn_id: &str) {
        let mut state = self.state.lock().await;
        if state.directory.is_paired(conn_id) {
            return;
        }
        if state.queue.take(conn_id).is_none() {
            return;
        }
        state.directory.pair_bot(conn_id);
        state.registry.send_to(conn_id, &ServerEvent::Paired {
            partner_id: BOT_PARTNER_ID.to_string(),
            bot: true,
        });
        state.registry.send_to(conn_id, &ServerEvent::Message {
            from: MessageFrom::Bot,
            text: BOT_GREETING.to_string(),
        });
        info!(conn_id, "bot fallback pairing");
    }

    /// Graceful exit from a pairing or the waiting queue.
    pub async fn leave(&self, conn_id: &str) {
        let mut state = self.state.lock().await;
        match state.directory.unpair(conn_id) {
            Some(PartnerRef::Human(partner)) => {
                state
                    .registry
                    .send_to(&partner, &ServerEvent::status("your partner left"));
                state.registry.send_to(&partner, &ServerEvent::PartnerLeft);
                state
                    .registry
                    .send_to(conn_id, &ServerEvent::status("you left the conversation"));
                info!(conn_id, partner, "left pairing");
            },
            Some(PartnerRef::Bot) => {
                state
                    .registry
                    .send_to(conn_id, &ServerEvent::status("you left the conversation"));
                debug!(conn_id, "left bot pairing");
            },
            None => {
                state.queue.remove(conn_id);
                state
                    .registry
                    .send_to(conn_id, &ServerEvent::status("you stopped waiting"));
            },
        }
    }

    /// Transport closed. Never errors, safe to call twice; every step is a
    /// no-op when the handle is already gone.
    pub async fn disconnect(&self, conn_id: &str) {
        let mut state = self.state.lock().await;
        state.queue.remove(conn_id);
        match state.directory.unpair(conn_id) {
            Some(PartnerRef::Human(partner)) => {
                state
                    .registry
                    .send_to(&partner, &ServerEvent::status("your partner disconnected"));
                state.registry.send_to(&partner, &ServerEvent::PartnerLeft);
                info!(conn_id, partner, "disconnected while paired");
            },
            Some(PartnerRef::Bot) => debug!(conn_id, "disconnected from bot pairing"),
            None => {},
        }
        state.registry.remove(conn_id);
    }

    /// Skip to a new stranger: leave semantics, then find semantics.
    pub async fn new_request(&self, conn_id: &str) -> FindOutcome {
        self.leave(conn_id).await;
        self.find(conn_id).await
    }

    /// Occupancy snapshot for `/health`.
    pub async fn counts(&self) -> EngineCounts {
        let state = self.state.lock().await;
        EngineCounts {
            clients: state.registry.count(),
            waiting: state.queue.len(),
            pairings: state.directory.pairing_count(),
        }
    }

    /// Directory symmetry invariant, exposed for tests.
    pub async fn directory_is_symmetric(&self) -> bool {
        self.state.lock().await.directory.is_symmetric()
    }
}
