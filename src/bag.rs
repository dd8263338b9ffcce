//! The tile bag.
//!
//! Draws are driven by a seeded RNG owned by the bag, so a cloned bag
//! reproduces the same sequence of draws. Workers clone the game (bag
//! included) and reseed per iteration, which is what makes simulation
//! results independent of thread interleaving.

use crate::error::Error;
use crate::rack::{Rack, RACK_SIZE};
use crate::tiles::MachineLetter;
use crate::tileset::TileSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct Bag {
    tiles: Vec<MachineLetter>,
    rng: StdRng,
}

impl Bag {
    /// A full bag for the distribution, in code order.
    pub fn full(tileset: &TileSet, seed: u64) -> Bag {
        let mut tiles = Vec::with_capacity(tileset.total_tiles() as usize);
        for ml in 0..=tileset.size() as MachineLetter {
            for _ in 0..tileset.count(ml) {
                tiles.push(ml);
            }
        }
        Bag {
            tiles,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restart the draw sequence.
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn count_of(&self, ml: MachineLetter) -> usize {
        self.tiles.iter().filter(|&&t| t == ml).count()
    }

    /// Draw one tile at random.
    pub fn draw_random(&mut self) -> Option<MachineLetter> {
        if self.tiles.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.tiles.len());
        Some(self.tiles.swap_remove(index))
    }

    /// Draw one specific tile.
    /// ## Errors
    /// If the tile is not in the bag.
    pub fn draw_letter(&mut self, ml: MachineLetter) -> Result<(), Error> {
        match self.tiles.iter().position(|&t| t == ml) {
            Some(index) => {
                self.tiles.swap_remove(index);
                Ok(())
            }
            None => Err(Error::RackNotInBag),
        }
    }

    /// Draw a whole known rack.
    /// ## Errors
    /// If any tile is missing; the bag is left partially drawn.
    pub fn draw_rack(&mut self, rack: &Rack) -> Result<(), Error> {
        for ml in rack.letters() {
            self.draw_letter(ml)?;
        }
        Ok(())
    }

    pub fn add_letter(&mut self, ml: MachineLetter) {
        self.tiles.push(ml);
    }

    pub fn add_rack(&mut self, rack: &Rack) {
        for ml in rack.letters() {
            self.add_letter(ml);
        }
    }

    /// Refill `rack` up to the full rack size with random draws.
    pub fn refill_rack(&mut self, rack: &mut Rack) {
        while rack.total() < RACK_SIZE as u8 {
            match self.draw_random() {
                Some(ml) => rack.add_letter(ml),
                None => break,
            }
        }
    }
}
