//! Event dispatcher: the single owner of all mutable game state.
//!
//! Every transport event, from every connection, is handled here one at a time
//! and to completion: decode, mutate the world, then broadcast. Because only
//! the dispatcher touches the world and the session registry, no locking is
//! needed and the order of the event queue is the order of the world.

use crate::broadcast::{Broadcaster, Outbound};
use crate::error::GameError;
use crate::session::{ConnectionId, SessionRegistry};
use crate::world::World;
use log::{debug, info, warn};
use shared::{ClientMessage, Direction};

/// Events delivered by the transport to the dispatcher
#[derive(Debug)]
pub enum NetworkEvent {
    Connected {
        connection: ConnectionId,
        outbound: Outbound,
    },
    Message {
        connection: ConnectionId,
        text: String,
    },
    Disconnected {
        connection: ConnectionId,
    },
}

/// Decodes one inbound text frame.
///
/// Frames that are not JSON objects with a string `type` are malformed;
/// objects with an unrecognised `type` are unknown operations.
pub fn decode(text: &str) -> Result<ClientMessage, GameError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| GameError::MalformedMessage(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(|kind| kind.as_str())
        .ok_or_else(|| GameError::MalformedMessage("missing message type".to_string()))?;

    if kind != "join" && kind != "move" {
        return Err(GameError::UnknownOperation(kind.to_string()));
    }

    serde_json::from_value(value).map_err(|e| GameError::MalformedMessage(e.to_string()))
}

pub struct Dispatcher {
    world: World,
    sessions: SessionRegistry,
    broadcaster: Broadcaster,
}

impl Dispatcher {
    /// Takes ownership of the world and places its initial treasure.
    pub fn new(mut world: World) -> Self {
        world.ensure_treasure();
        Self {
            world,
            sessions: SessionRegistry::new(),
            broadcaster: Broadcaster::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn handle_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Connected {
                connection,
                outbound,
            } => {
                debug!("Connection {} registered", connection);
                self.broadcaster.register(connection, outbound);
            }
            NetworkEvent::Message { connection, text } => {
                if let Err(e) = self.handle_message(connection, &text) {
                    if e.is_client_visible() {
                        warn!("Rejected request from connection {}: {}", connection, e);
                        self.broadcaster.send_error(connection, &e);
                    } else {
                        warn!("Dropping message from connection {}: {}", connection, e);
                    }
                }
            }
            NetworkEvent::Disconnected { connection } => {
                self.handle_disconnect(connection);
            }
        }
    }

    /// Applies one inbound frame. Errors leave the world untouched and
    /// nothing is broadcast.
    pub fn handle_message(&mut self, connection: ConnectionId, text: &str) -> Result<(), GameError> {
        match decode(text)? {
            ClientMessage::Join { player_name } => self.join(connection, &player_name),
            ClientMessage::Move {
                player_name,
                direction,
            } => {
                self.move_player(player_name.as_deref(), direction.as_deref());
                Ok(())
            }
        }
    }

    fn join(&mut self, connection: ConnectionId, player_name: &str) -> Result<(), GameError> {
        self.world.join(player_name)?;
        self.sessions.bind(connection, player_name);
        info!("Player {} joined on connection {}", player_name, connection);

        self.world.ensure_treasure();
        self.broadcast();
        Ok(())
    }

    /// Moves are always followed by a broadcast, even when nothing changed.
    fn move_player(&mut self, player_name: Option<&str>, direction: Option<&str>) {
        let direction = direction.and_then(|d| match d.parse::<Direction>() {
            Ok(direction) => Some(direction),
            Err(e) => {
                debug!("Move without effect: {}", e);
                None
            }
        });

        if let Some(name) = player_name {
            self.world.move_player(name, direction);
        }
        self.broadcast();
    }

    /// Ends the session of a closed connection.
    ///
    /// Only connections that completed a join cause a world change and a
    /// broadcast.
    pub fn handle_disconnect(&mut self, connection: ConnectionId) {
        self.broadcaster.unregister(connection);

        let duration = self
            .sessions
            .session(connection)
            .map(|session| session.joined_at.elapsed());
        let Some(name) = self.sessions.unbind(connection) else {
            debug!("Connection {} closed without a session", connection);
            return;
        };

        info!(
            "Player {} disconnected after {:.1}s",
            name,
            duration.unwrap_or_default().as_secs_f32()
        );
        self.world.remove(&name);
        self.world.ensure_treasure();
        self.broadcast();
    }

    fn broadcast(&self) -> usize {
        self.broadcaster.broadcast(self.world.snapshot())
    }
}
