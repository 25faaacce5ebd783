//! Live connection table.

use std::{collections::HashMap, time::Instant};

use tokio::sync::mpsc;

use parley_protocol::{ServerEvent, encode_server_event};

/// A client currently connected to the gateway.
#[derive(Debug)]
pub struct ConnectedClient {
    pub conn_id: String,
    /// Channel for sending serialized frames to this client's write loop.
    pub sender: mpsc::UnboundedSender<String>,
    pub connected_at: Instant,
}

impl ConnectedClient {
    /// Whether the transport behind this entry is still open.
    pub fn is_live(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Send one event to this client. Best-effort: a closed transport makes
    /// this return false, it never errors.
    pub fn send(&self, event: &ServerEvent) -> bool {
        match encode_server_event(event) {
            Some(frame) => self.sender.send(frame).is_ok(),
            None => false,
        }
    }
}

/// All connected clients, keyed by connection handle. Entries exist only
/// while the transport is open; disconnect removes them.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<String, ConnectedClient>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conn_id: impl Into<String>, sender: mpsc::UnboundedSender<String>) {
        let conn_id = conn_id.into();
        self.clients.insert(conn_id.clone(), ConnectedClient {
            conn_id,
            sender,
            connected_at: Instant::now(),
        });
    }

    pub fn remove(&mut self, conn_id: &str) -> Option<ConnectedClient> {
        self.clients.remove(conn_id)
    }

    pub fn get(&self, conn_id: &str) -> Option<&ConnectedClient> {
        self.clients.get(conn_id)
    }

    /// Whether `conn_id` is registered and its transport is still open.
    pub fn is_live(&self, conn_id: &str) -> bool {
        self.clients.get(conn_id).is_some_and(ConnectedClient::is_live)
    }

    /// Best-effort send to `conn_id`; false if unknown, closed, or refused.
    pub fn send_to(&self, conn_id: &str, event: &ServerEvent) -> bool {
        self.clients.get(conn_id).is_some_and(|c| c.send(event))
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }
}
