//! Matchmaking and relay core.
//!
//! Pipeline:
//! 1. The gateway registers each WebSocket connection with the engine
//! 2. `find` drives the FIFO waiting queue and the partner directory
//! 3. Once paired, chat/typing/handshake events are routed purely through
//!    directory lookups
//! 4. `leave` / disconnect tear the pairing down and notify the other side
//!
//! All queue/directory/registry mutation is serialized behind a single
//! `tokio::sync::Mutex`; the bot-fallback and bot-reply timers re-acquire it
//! and re-validate their preconditions before touching anything, so a timer
//! racing a concurrent `find` or `leave` can never resurrect a dead entry.

pub mod directory;
pub mod engine;
pub mod queue;
pub mod registry;
pub mod relay;

pub use crate::{
    directory::PartnerRef,
    engine::{EngineConfig, FindOutcome, MatchEngine},
};
