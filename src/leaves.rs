//! Leave values.
//!
//! [`LeaveTable`] is the read-only artifact mapping a multiset of kept
//! tiles to an equity adjustment; multisets it does not know score zero.
//! [`LeaveMap`] is the generator-side cache: every subset of the current
//! rack gets a bit pattern, the cached value of the current leave is
//! maintained in O(1) as the recursion takes and returns tiles.

use crate::bit_rack::BitRack;
use crate::equity::Equity;
use crate::error::Error;
use crate::rack::{Rack, RACK_SIZE};
use crate::tiles::{MachineLetter, MAX_ALPHABET_SIZE};
use crate::tileset::TileSet;
use std::collections::HashMap;

/// The leave-value artifact.
#[derive(Debug, Clone, Default)]
pub struct LeaveTable {
    values: HashMap<BitRack, Equity>,
}

impl LeaveTable {
    /// A table with no entries: every leave is worth zero.
    pub fn empty() -> LeaveTable {
        LeaveTable::default()
    }

    /// Build a table from `(leave, value_in_points)` pairs.
    /// ## Errors
    /// If a leave string can not be encoded.
    pub fn from_pairs(pairs: &[(&str, f64)], tileset: &TileSet) -> Result<LeaveTable, Error> {
        let mut values = HashMap::with_capacity(pairs.len());
        for &(leave, value) in pairs {
            let mls = tileset.encode(leave)?;
            values.insert(BitRack::from_letters(&mls), Equity::from_double(value));
        }
        Ok(LeaveTable { values })
    }

    /// The value of a leave. Unknown leaves (and the empty leave) are
    /// worth zero.
    pub fn value(&self, leave: &BitRack) -> Equity {
        self.values.get(leave).copied().unwrap_or(Equity::ZERO)
    }

    pub fn value_of_rack(&self, rack: &Rack) -> Equity {
        if rack.is_empty() {
            return Equity::ZERO;
        }
        self.value(&BitRack::from_rack(rack))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-rack leave cache for the generator. Each tile on the rack owns
/// one bit; the index of the current leave is updated as letters are
/// taken and returned, and the cached values answer "what is my leave
/// worth" in O(1).
#[derive(Debug, Clone)]
pub struct LeaveMap {
    leave_values: Vec<Equity>,
    letter_base_index: [u8; MAX_ALPHABET_SIZE],
    best_leaves_by_size: [Equity; RACK_SIZE + 1],
    current_index: usize,
    rack_bit_count: u8,
}

impl Default for LeaveMap {
    fn default() -> Self {
        LeaveMap {
            leave_values: vec![Equity::ZERO; 1 << RACK_SIZE],
            letter_base_index: [0; MAX_ALPHABET_SIZE],
            best_leaves_by_size: [Equity::MIN; RACK_SIZE + 1],
            current_index: 0,
            rack_bit_count: 0,
        }
    }
}

impl LeaveMap {
    pub fn new() -> LeaveMap {
        LeaveMap::default()
    }

    /// Re-key the map for `rack` and cache the value of each of its
    /// subsets. The current index starts at the full rack.
    pub fn init(&mut self, rack: &Rack, table: &LeaveTable) {
        let mut base = 0u8;
        for ml in 0..rack.dist_size().min(MAX_ALPHABET_SIZE) {
            let count = rack.count(ml as MachineLetter);
            if count > 0 {
                self.letter_base_index[ml] = base;
                base += count;
            }
        }
        self.rack_bit_count = base;
        let size = 1usize << base;
        for value in &mut self.best_leaves_by_size {
            *value = Equity::MIN;
        }
        let letters = rack.letters();
        for index in 0..size {
            let mut leave = BitRack::new();
            let mut leave_size = 0usize;
            for (bit, &ml) in letters.iter().enumerate() {
                if index & (1 << bit) != 0 {
                    leave.add_letter(ml);
                    leave_size += 1;
                }
            }
            let value = if leave_size == 0 {
                Equity::ZERO
            } else {
                table.value(&leave)
            };
            self.leave_values[index] = value;
            if value > self.best_leaves_by_size[leave_size] {
                self.best_leaves_by_size[leave_size] = value;
            }
        }
        self.current_index = size - 1;
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn set_current_index(&mut self, index: usize) {
        self.current_index = index;
    }

    /// Value of the tiles still on the rack.
    pub fn current_value(&self) -> Equity {
        self.leave_values[self.current_index]
    }

    /// Best leave value among leaves of exactly `size` tiles.
    pub fn best_leave_by_size(&self, size: usize) -> Equity {
        let best = self.best_leaves_by_size[size];
        if best == Equity::MIN {
            Equity::ZERO
        } else {
            best
        }
    }

    /// Record that one copy of `letter` left the rack.
    /// `count_after_take` is the number of copies remaining.
    pub fn take_letter(&mut self, letter: MachineLetter, count_after_take: u8) {
        let bit = self.letter_base_index[letter as usize] + count_after_take;
        self.current_index &= !(1usize << bit);
    }

    /// Record that one copy of `letter` returned to the rack.
    /// `count_before_add` is the number of copies before the return.
    pub fn add_letter(&mut self, letter: MachineLetter, count_before_add: u8) {
        let bit = self.letter_base_index[letter as usize] + count_before_add;
        self.current_index |= 1usize << bit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::Language;
    use anyhow::Result;

    fn tileset() -> TileSet {
        TileSet::new(Language::EN)
    }

    #[test]
    fn test_table_lookup() -> Result<()> {
        let ts = tileset();
        let table = LeaveTable::from_pairs(&[("S", 8.0), ("ERS", 14.5), ("Q", -6.0)], &ts)?;
        let s = BitRack::from_letters(&ts.encode("S")?);
        assert_eq!(table.value(&s), Equity::from_double(8.0));
        // Key is order-independent.
        let res = BitRack::from_letters(&ts.encode("RSE")?);
        assert_eq!(table.value(&res), Equity::from_double(14.5));
        // Unknown leaves are zero.
        let zz = BitRack::from_letters(&ts.encode("ZZ")?);
        assert_eq!(table.value(&zz), Equity::ZERO);
        Ok(())
    }

    #[test]
    fn test_leave_map_take_add() -> Result<()> {
        let ts = tileset();
        let table = LeaveTable::from_pairs(&[("AB", 3.0), ("A", 1.0), ("B", 2.0)], &ts)?;
        let mut rack = Rack::from_letters(ts.size(), &ts.encode("AB")?);
        let mut map = LeaveMap::new();
        map.init(&rack, &table);
        // Full rack kept.
        assert_eq!(map.current_value(), Equity::from_double(3.0));
        let a = ts.encode("A")?[0];
        let b = ts.encode("B")?[0];
        rack.take_letter(a);
        map.take_letter(a, rack.count(a));
        assert_eq!(map.current_value(), Equity::from_double(2.0));
        rack.take_letter(b);
        map.take_letter(b, rack.count(b));
        assert_eq!(map.current_value(), Equity::ZERO);
        map.add_letter(a, rack.count(a));
        rack.add_letter(a);
        assert_eq!(map.current_value(), Equity::from_double(1.0));
        Ok(())
    }

    #[test]
    fn test_leave_map_duplicates() -> Result<()> {
        let ts = tileset();
        let table = LeaveTable::from_pairs(&[("E", 4.0), ("EE", 1.0)], &ts)?;
        let mut rack = Rack::from_letters(ts.size(), &ts.encode("EE")?);
        let mut map = LeaveMap::new();
        map.init(&rack, &table);
        assert_eq!(map.current_value(), Equity::from_double(1.0));
        let e = ts.encode("E")?[0];
        rack.take_letter(e);
        map.take_letter(e, rack.count(e));
        assert_eq!(map.current_value(), Equity::from_double(4.0));
        rack.take_letter(e);
        map.take_letter(e, rack.count(e));
        assert_eq!(map.current_value(), Equity::ZERO);
        Ok(())
    }

    #[test]
    fn test_best_leaves_by_size() -> Result<()> {
        let ts = tileset();
        let table = LeaveTable::from_pairs(&[("A", 1.0), ("B", 5.0), ("AB", 2.0)], &ts)?;
        let rack = Rack::from_letters(ts.size(), &ts.encode("AB")?);
        let mut map = LeaveMap::new();
        map.init(&rack, &table);
        assert_eq!(map.best_leave_by_size(0), Equity::ZERO);
        assert_eq!(map.best_leave_by_size(1), Equity::from_double(5.0));
        assert_eq!(map.best_leave_by_size(2), Equity::from_double(2.0));
        Ok(())
    }
}
