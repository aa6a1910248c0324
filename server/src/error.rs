//! Errors produced while handling client messages.
//!
//! None of these are fatal: the connection stays open and the server keeps
//! running. Only [`GameError::NameTaken`] is reported back to the client.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Name '{0}' is already taken")]
    NameTaken(String),
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl GameError {
    /// Whether the error is reported to the requesting connection.
    pub fn is_client_visible(&self) -> bool {
        matches!(self, GameError::NameTaken(_))
    }
}
