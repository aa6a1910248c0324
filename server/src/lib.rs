//! # Treasure Hunt Server Library
//!
//! Authoritative server for a realtime grid game: clients join a shared
//! square grid, move their avatar one cell at a time and race to collect the
//! treasure. After every change the full world state is broadcast to every
//! connected client, so all views stay aligned with the server.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! All inbound events, from every connection, flow through one channel into
//! a single dispatcher task. Each event is handled to completion (decode,
//! mutate, broadcast) before the next one, so the world needs no locks and
//! its history is simply the arrival order of the queue.
//!
//! ### Fire-and-Forget Broadcasting
//! Broadcasts are encoded once and pushed into per-connection bounded queues
//! without waiting. A slow or closed connection misses the frame instead of
//! stalling the dispatcher.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! Grid size, players keyed by name, the treasure list and the mutation rules
//! for join, move and removal.
//!
//! ### Spawn Module (`spawn`)
//! Keeps exactly one treasure on the board, never on an occupied cell.
//!
//! ### Session Module (`session`)
//! Binds connection identifiers to player names for the lifetime of a
//! connection.
//!
//! ### Dispatcher Module (`dispatcher`)
//! Decodes client messages and drives the world, the registry and the
//! broadcaster.
//!
//! ### Broadcast Module (`broadcast`)
//! State fan-out and unicast error replies.
//!
//! ### Network Module (`network`)
//! WebSocket accept loop and per-connection reader and writer tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::Config;
//! use server::network::GameServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = Config {
//!         port: 8080,
//!         grid_size: 16,
//!         ..Config::default()
//!     };
//!
//!     let server = GameServer::bind(config).await?;
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod network;
pub mod session;
pub mod spawn;
pub mod world;
