//! Treasure spawning.
//!
//! The world keeps exactly one treasure once it is initialised. A new one is
//! placed by rejection sampling over random cells, skipping cells that hold a
//! player. Sampling is bounded; after the bound a scan over the free cells
//! takes over, so a nearly full board still terminates.

use crate::world::World;
use log::{debug, warn};
use rand::seq::SliceRandom;
use shared::Treasure;

/// Sampling attempts per grid cell before falling back to a free-cell scan.
const SAMPLES_PER_CELL: u64 = 4;

impl World {
    /// Places a treasure if none exists.
    ///
    /// Returns the new treasure, or `None` when one was already present or
    /// every cell is occupied.
    pub fn ensure_treasure(&mut self) -> Option<Treasure> {
        if !self.treasures.is_empty() {
            return None;
        }

        let cell = self.sample_free_cell().or_else(|| self.scan_free_cell());
        let Some((x, y)) = cell else {
            warn!("No free cell left for a treasure on a {0}x{0} grid", self.grid_size);
            return None;
        };

        let treasure = Treasure::new(x, y);
        debug!("Spawned treasure at ({}, {})", x, y);
        self.treasures.push(treasure);
        Some(treasure)
    }

    fn sample_free_cell(&mut self) -> Option<(u32, u32)> {
        let cells = u64::from(self.grid_size) * u64::from(self.grid_size);
        for _ in 0..cells * SAMPLES_PER_CELL {
            let (x, y) = self.random_cell();
            if !self.is_occupied(x, y) {
                return Some((x, y));
            }
        }
        None
    }

    fn scan_free_cell(&mut self) -> Option<(u32, u32)> {
        let size = self.grid_size;
        let free: Vec<(u32, u32)> = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .filter(|&(x, y)| !self.is_occupied(x, y))
            .collect();
        free.choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_on_empty_world() {
        let mut world = World::with_seed(10, 11);
        let treasure = world.ensure_treasure().unwrap();
        assert!(world.contains(treasure.x, treasure.y));
        assert_eq!(world.treasures(), &[treasure]);
    }

    #[test]
    fn test_spawn_is_idempotent() {
        let mut world = World::with_seed(10, 11);
        world.ensure_treasure();
        let first = world.treasures().to_vec();

        assert!(world.ensure_treasure().is_none());
        assert_eq!(world.treasures(), first.as_slice());
    }

    #[test]
    fn test_spawn_avoids_players() {
        for seed in 0..20 {
            let mut world = World::with_seed(3, seed);
            for i in 0..8 {
                world.join(&format!("p{}", i)).unwrap();
            }
            world.treasures.clear();

            if let Some(treasure) = world.ensure_treasure() {
                assert!(!world.is_occupied(treasure.x, treasure.y));
            }
        }
    }

    #[test]
    fn test_spawn_finds_last_free_cell() {
        let mut world = World::with_seed(2, 5);
        for (i, (x, y)) in [(0, 0), (1, 0), (0, 1)].into_iter().enumerate() {
            let name = format!("p{}", i);
            world.join(&name).unwrap();
            world.set_position(&name, x, y);
        }

        let treasure = world.ensure_treasure().unwrap();
        assert!(treasure.is_at(1, 1));
    }

    #[test]
    fn test_full_board_spawns_nothing() {
        let mut world = World::with_seed(1, 5);
        world.join("solo").unwrap();

        assert!(world.ensure_treasure().is_none());
        assert!(world.treasures().is_empty());

        world.remove("solo");
        assert!(world.ensure_treasure().is_some());
    }
}
