//! Authoritative world model: the grid, the active players and the treasures.

use crate::error::GameError;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Direction, Player, ServerMessage, Treasure};
use std::collections::HashMap;

/// Consistent snapshot of every player and treasure, the unit of broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldState {
    pub players: HashMap<String, Player>,
    pub treasures: Vec<Treasure>,
}

impl From<WorldState> for ServerMessage {
    fn from(state: WorldState) -> Self {
        ServerMessage::State {
            players: state.players,
            treasures: state.treasures,
        }
    }
}

/// Square grid of `grid_size` x `grid_size` cells shared by all players.
///
/// Players are keyed by their display name, which is unique among the
/// currently joined players. Names are released as soon as the player is
/// removed.
#[derive(Debug)]
pub struct World {
    pub(crate) grid_size: u32,
    pub(crate) players: HashMap<String, Player>,
    pub(crate) treasures: Vec<Treasure>,
    pub(crate) rng: StdRng,
}

impl World {
    /// Creates an empty world seeded from system entropy.
    ///
    /// The grid size must be at least 1.
    pub fn new(grid_size: u32) -> Self {
        Self::with_rng(grid_size, StdRng::from_entropy())
    }

    /// Creates an empty world with a deterministic random source.
    pub fn with_seed(grid_size: u32, seed: u64) -> Self {
        Self::with_rng(grid_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(grid_size: u32, rng: StdRng) -> Self {
        Self {
            grid_size: grid_size.max(1),
            players: HashMap::new(),
            treasures: Vec::new(),
            rng,
        }
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub fn players(&self) -> &HashMap<String, Player> {
        &self.players
    }

    pub fn treasures(&self) -> &[Treasure] {
        &self.treasures
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.grid_size && y < self.grid_size
    }

    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        self.players.values().any(|p| p.x == x && p.y == y)
    }

    /// Adds a new player at a random cell with a random color.
    ///
    /// Initial positions are independent of other players, so two players may
    /// start on the same cell. Fails if the name belongs to an active player.
    pub fn join(&mut self, name: &str) -> Result<&Player, GameError> {
        if self.players.contains_key(name) {
            return Err(GameError::NameTaken(name.to_string()));
        }

        let (x, y) = self.random_cell();
        let color = self.random_color();

        info!("Added player {} at ({}, {})", name, x, y);
        Ok(&*self
            .players
            .entry(name.to_string())
            .or_insert(Player::new(x, y, color)))
    }

    /// Moves a player one cell, clamped to the grid.
    ///
    /// Unknown players are ignored. A `None` direction leaves the position
    /// unchanged, but the treasure check still runs on the resulting cell.
    /// Returns true if the move collected a treasure.
    pub fn move_player(&mut self, name: &str, direction: Option<Direction>) -> bool {
        let max = self.grid_size - 1;
        let Some(player) = self.players.get_mut(name) else {
            debug!("Ignoring move for unknown player {}", name);
            return false;
        };

        match direction {
            Some(Direction::Up) => player.y = player.y.saturating_sub(1),
            Some(Direction::Down) => player.y = (player.y + 1).min(max),
            Some(Direction::Left) => player.x = player.x.saturating_sub(1),
            Some(Direction::Right) => player.x = (player.x + 1).min(max),
            None => {}
        }

        let (x, y) = player.position();
        let Some(index) = self.treasures.iter().position(|t| t.is_at(x, y)) else {
            return false;
        };

        self.treasures.remove(index);
        player.score += 1;
        info!(
            "Player {} collected treasure at ({}, {}), score {}",
            name, x, y, player.score
        );
        self.ensure_treasure();
        true
    }

    /// Removes a player, freeing the name. Returns the removed player if any.
    pub fn remove(&mut self, name: &str) -> Option<Player> {
        let removed = self.players.remove(name);
        if removed.is_some() {
            info!("Removed player {}", name);
        }
        removed
    }

    pub fn snapshot(&self) -> WorldState {
        WorldState {
            players: self.players.clone(),
            treasures: self.treasures.clone(),
        }
    }

    /// Replaces all treasures with a single one at the given cell.
    pub fn place_treasure(&mut self, x: u32, y: u32) {
        debug_assert!(self.contains(x, y));
        self.treasures = vec![Treasure::new(x, y)];
    }

    /// Teleports a player, clamping the target into the grid.
    pub fn set_position(&mut self, name: &str, x: u32, y: u32) -> bool {
        let max = self.grid_size - 1;
        match self.players.get_mut(name) {
            Some(player) => {
                player.x = x.min(max);
                player.y = y.min(max);
                true
            }
            None => false,
        }
    }

    pub(crate) fn random_cell(&mut self) -> (u32, u32) {
        (
            self.rng.gen_range(0..self.grid_size),
            self.rng.gen_range(0..self.grid_size),
        )
    }

    fn random_color(&mut self) -> String {
        let hue: u32 = self.rng.gen_range(0..360);
        format!("hsl({}, 70%, 60%)", hue)
    }
}
