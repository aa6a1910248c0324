//! Session registry binding live connections to player names
//!
//! The transport hands out an opaque [`ConnectionId`] for every accepted
//! connection. A session starts when a join on that connection succeeds and
//! ends when the connection closes; the registry is what lets a disconnect be
//! turned back into the player that has to leave the world.

use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Opaque identifier issued by the transport for each connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live association between one connection and one player name
#[derive(Debug, Clone)]
pub struct Session {
    pub player_name: String,
    /// When the join on this connection succeeded
    pub joined_at: Instant,
}

impl Session {
    pub fn new(player_name: String) -> Self {
        Self {
            player_name,
            joined_at: Instant::now(),
        }
    }
}

/// Maps connections to the player they joined as.
///
/// The registry never owns the connection itself, only its identifier, so the
/// world model stays independent of transport details.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnectionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a connection to a player name
    ///
    /// A connection holds at most one identity; binding again replaces the
    /// previous name, which is returned.
    pub fn bind(&mut self, connection: ConnectionId, player_name: &str) -> Option<String> {
        let previous = self
            .sessions
            .insert(connection, Session::new(player_name.to_string()))
            .map(|session| session.player_name);

        match &previous {
            Some(old) => warn!(
                "Connection {} rebound from {} to {}",
                connection, old, player_name
            ),
            None => debug!("Connection {} bound to {}", connection, player_name),
        }
        previous
    }

    pub fn identity_of(&self, connection: ConnectionId) -> Option<&str> {
        self.sessions
            .get(&connection)
            .map(|session| session.player_name.as_str())
    }

    pub(crate) fn session(&self, connection: ConnectionId) -> Option<&Session> {
        self.sessions.get(&connection)
    }

    /// Removes the binding, returning the name that was bound if any
    pub fn unbind(&mut self, connection: ConnectionId) -> Option<String> {
        self.sessions
            .remove(&connection)
            .map(|session| session.player_name)
    }

    /// Returns the number of bound connections
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
