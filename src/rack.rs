//! The on-turn player's tiles, kept as dense per-letter counts.

use crate::equity::Equity;
use crate::tiles::{get_unblanked, MachineLetter};
use crate::tileset::TileSet;

/// Number of tiles on a full rack.
pub const RACK_SIZE: usize = 7;

/// A multiset of tiles as a dense count array plus a total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rack {
    counts: Vec<u8>,
    total: u8,
}

impl Rack {
    /// An empty rack for an alphabet of `dist_size` letters.
    pub fn new(dist_size: usize) -> Rack {
        Rack {
            counts: vec![0; dist_size + 1],
            total: 0,
        }
    }

    pub fn from_letters(dist_size: usize, mls: &[MachineLetter]) -> Rack {
        let mut rack = Rack::new(dist_size);
        for &ml in mls {
            rack.add_letter(ml);
        }
        rack
    }

    /// Number of distinct letter slots (blank included).
    pub fn dist_size(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u8 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn count(&self, ml: MachineLetter) -> u8 {
        self.counts[ml as usize]
    }

    pub fn add_letter(&mut self, ml: MachineLetter) {
        self.counts[ml as usize] += 1;
        self.total += 1;
    }

    pub fn take_letter(&mut self, ml: MachineLetter) {
        debug_assert!(self.counts[ml as usize] > 0);
        self.counts[ml as usize] -= 1;
        self.total -= 1;
    }

    /// Remove every tile.
    pub fn clear(&mut self) {
        for c in &mut self.counts {
            *c = 0;
        }
        self.total = 0;
    }

    /// True if `other` is contained in this rack.
    pub fn contains(&self, other: &Rack) -> bool {
        self.counts
            .iter()
            .zip(other.counts.iter())
            .all(|(a, b)| a >= b)
    }

    /// Remove `other` from this rack. Caller must check containment.
    pub fn subtract(&mut self, other: &Rack) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            debug_assert!(*a >= *b);
            *a -= b;
            self.total -= b;
        }
    }

    pub fn add_all(&mut self, other: &Rack) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
            self.total += b;
        }
    }

    /// Sum of tile scores on the rack.
    pub fn score(&self, tileset: &TileSet) -> Equity {
        let mut score = Equity::ZERO;
        for (ml, &count) in self.counts.iter().enumerate() {
            if count > 0 {
                score += Equity::from_raw(
                    tileset.score(ml as MachineLetter).raw() * i32::from(count),
                );
            }
        }
        score
    }

    /// Letters in ascending code order, with multiplicity.
    pub fn letters(&self) -> Vec<MachineLetter> {
        let mut mls = Vec::with_capacity(self.total as usize);
        for (ml, &count) in self.counts.iter().enumerate() {
            for _ in 0..count {
                mls.push(ml as MachineLetter);
            }
        }
        mls
    }

    /// Remove the tiles a move played. Blank-designated tiles return the
    /// blank.
    pub fn take_played(&mut self, played: &[MachineLetter]) {
        for &ml in played {
            if crate::tiles::get_is_blanked(ml) {
                self.take_letter(crate::tiles::BLANK_MACHINE_LETTER);
            } else {
                self.take_letter(get_unblanked(ml));
            }
        }
    }
}
