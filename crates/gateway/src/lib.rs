//! Gateway: WebSocket/HTTP server in front of the matchmaking engine.
//!
//! Lifecycle:
//! 1. Load config, build the engine with its timing knobs
//! 2. Bind address, start HTTP server (`/health`)
//! 3. Attach the WebSocket upgrade handler (`/ws`)
//! 4. Per connection: register with the engine, pump frames both ways,
//!    tell the engine on close
//!
//! All pairing/relay logic lives in `parley-engine`; this crate only moves
//! frames between sockets and engine calls.

pub mod server;
pub mod state;
pub mod ws;
