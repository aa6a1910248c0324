//! Wire protocol shared between the treasure hunt server and its clients.
//!
//! Every frame is a JSON text message carrying a `type` tag. Clients send
//! [`ClientMessage`]s, the server answers with [`ServerMessage`]s.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 4520;
pub const DEFAULT_GRID_SIZE: u32 = 10;

/// A player as seen by every client.
///
/// The player's name is not part of the struct; it is the key of the
/// `players` map in [`ServerMessage::State`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Player {
    pub x: u32,
    pub y: u32,
    pub score: u32,
    pub color: String,
}

impl Player {
    pub fn new(x: u32, y: u32, color: String) -> Self {
        Self {
            x,
            y,
            score: 0,
            color,
        }
    }

    pub fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Treasure {
    pub x: u32,
    pub y: u32,
}

impl Treasure {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn is_at(&self, x: u32, y: u32) -> bool {
        self.x == x && self.y == y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// Messages sent from a client to the server.
///
/// The fields of `move` are optional: a missing name or an unrecognised
/// direction still reaches the server, which applies it as a no-op move.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Join {
        #[serde(rename = "playerName")]
        player_name: String,
    },
    Move {
        #[serde(rename = "playerName", default, deserialize_with = "lenient_string")]
        player_name: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        direction: Option<String>,
    },
}

/// Reads a string field, mapping any other JSON value to `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Text(text)) => Some(text),
        Some(Lenient::Other(_)) | None => None,
    })
}

impl ClientMessage {
    pub fn join(name: impl Into<String>) -> Self {
        ClientMessage::Join {
            player_name: name.into(),
        }
    }

    pub fn movement(name: impl Into<String>, direction: Direction) -> Self {
        ClientMessage::Move {
            player_name: Some(name.into()),
            direction: Some(direction.as_str().to_string()),
        }
    }
}

/// Messages sent from the server to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Full world snapshot, broadcast to every open connection.
    State {
        players: HashMap<String, Player>,
        treasures: Vec<Treasure>,
    },
    /// Sent only to the connection whose request failed.
    Error { message: String },
}
