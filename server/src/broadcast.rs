//! Fan-out of server messages to open connections.
//!
//! Each connection owns a bounded outbound queue drained by its writer task.
//! Sends never wait: a full queue (slow client) or a closed one (dead client)
//! just misses that frame.

use crate::error::GameError;
use crate::session::ConnectionId;
use crate::world::WorldState;
use log::{debug, error};
use shared::ServerMessage;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outbound half of a connection's queue, carrying encoded text frames.
pub type Outbound = mpsc::Sender<String>;

#[derive(Debug, Default)]
pub struct Broadcaster {
    connections: HashMap<ConnectionId, Outbound>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection: ConnectionId, outbound: Outbound) {
        self.connections.insert(connection, outbound);
    }

    pub fn unregister(&mut self, connection: ConnectionId) -> bool {
        self.connections.remove(&connection).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Sends the snapshot to every open connection.
    ///
    /// The message is encoded once and the same frame is queued for every
    /// recipient. Returns how many connections accepted the frame.
    pub fn broadcast(&self, state: WorldState) -> usize {
        let frame = match encode(&ServerMessage::from(state)) {
            Some(frame) => frame,
            None => return 0,
        };

        let mut delivered = 0;
        for (connection, outbound) in &self.connections {
            if deliver(*connection, outbound, frame.clone()) {
                delivered += 1;
            }
        }
        debug!("Broadcast state to {}/{} connections", delivered, self.len());
        delivered
    }

    /// Sends an error to a single connection.
    pub fn send_error(&self, connection: ConnectionId, err: &GameError) -> bool {
        let Some(outbound) = self.connections.get(&connection) else {
            debug!("Cannot report error to unknown connection {}", connection);
            return false;
        };

        let message = ServerMessage::Error {
            message: err.to_string(),
        };
        match encode(&message) {
            Some(frame) => deliver(connection, outbound, frame),
            None => false,
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("Failed to encode server message: {}", e);
            None
        }
    }
}

fn deliver(connection: ConnectionId, outbound: &Outbound, frame: String) -> bool {
    match outbound.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            debug!("Outbound queue full, skipping connection {}", connection);
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!("Connection {} closed, skipping", connection);
            false
        }
    }
}
