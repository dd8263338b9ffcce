//! Moves and the move list.

use crate::board::BOARD_HORIZONTAL_DIRECTION;
use crate::equity::Equity;
use crate::tiles::{MachineLetter, PLAYED_THROUGH_MARKER};
use crate::tileset::TileSet;
use std::cmp::Ordering;
use tinyvec::ArrayVec;

/// Longest tile strip a move can carry (the super board lane length).
pub const MOVE_MAX_TILES: usize = 21;

pub type TileStrip = ArrayVec<[MachineLetter; MOVE_MAX_TILES]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveKind {
    Place,
    Exchange,
    Pass,
}

impl Default for MoveKind {
    fn default() -> Self {
        MoveKind::Pass
    }
}

/// A placement, exchange or pass. For placements the strip holds one
/// entry per covered square, with [`PLAYED_THROUGH_MARKER`] standing in
/// for tiles that were already on the board. For exchanges it holds the
/// exchanged tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Move {
    pub kind: MoveKind,
    pub row: u8,
    pub col: u8,
    pub dir: u8,
    pub tiles: TileStrip,
    pub tiles_played: u8,
    pub score: Equity,
    pub equity: Equity,
}

impl Move {
    pub fn pass() -> Move {
        Move {
            kind: MoveKind::Pass,
            equity: Equity::PASS,
            ..Move::default()
        }
    }

    pub fn tiles_length(&self) -> usize {
        self.tiles.len()
    }

    /// Natural order used to break score and equity ties: row, column,
    /// direction, then the tile strip. Deterministic so sorted lists and
    /// seeded auto-play are reproducible.
    pub fn natural_cmp(&self, other: &Move) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then(self.row.cmp(&other.row))
            .then(self.col.cmp(&other.col))
            .then(self.dir.cmp(&other.dir))
            .then(self.tiles[..].cmp(&other.tiles[..]))
    }

    /// Descending score, ties broken by natural order.
    pub fn score_cmp(&self, other: &Move) -> Ordering {
        other.score.cmp(&self.score).then(self.natural_cmp(other))
    }

    /// Descending equity, ties broken like [`score_cmp`].
    ///
    /// [`score_cmp`]: Move::score_cmp
    pub fn equity_cmp(&self, other: &Move) -> Ordering {
        other
            .equity
            .cmp(&self.equity)
            .then(other.score.cmp(&self.score))
            .then(self.natural_cmp(other))
    }

    /// Human-readable form, e.g. `8D QUIRKED`, `(exch ABC)`, `(pass)`.
    pub fn to_text(&self, tileset: &TileSet) -> String {
        match self.kind {
            MoveKind::Pass => String::from("(pass)"),
            MoveKind::Exchange => {
                let tiles: String = self
                    .tiles
                    .iter()
                    .map(|&ml| tileset.label(ml))
                    .collect();
                format!("(exch {})", tiles)
            }
            MoveKind::Place => {
                let col_letter = (b'A' + self.col) as char;
                let coord = if self.dir as usize == BOARD_HORIZONTAL_DIRECTION {
                    format!("{}{}", self.row + 1, col_letter)
                } else {
                    format!("{}{}", col_letter, self.row + 1)
                };
                let tiles: String = self
                    .tiles
                    .iter()
                    .map(|&ml| {
                        if ml == PLAYED_THROUGH_MARKER {
                            String::from(".")
                        } else {
                            tileset.label(ml)
                        }
                    })
                    .collect();
                format!("{} {}", coord, tiles)
            }
        }
    }
}

/// How the generator filters what it records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRecordType {
    /// Keep every legal move.
    All,
    /// Keep only the single best move.
    Best,
    /// Keep every move within a fixed equity of the best seen so far.
    WithinEpsilon(Equity),
}

/// What "best" means while recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSortType {
    Equity,
    Score,
}

/// A bounded list of moves with a spare slot for in-place construction.
/// Doubles as a binary max-heap keyed by equity: the heap order is
/// established lazily on the first pop and invalidated by inserts.
#[derive(Debug, Clone)]
pub struct MoveList {
    moves: Vec<Move>,
    spare: Move,
    capacity: usize,
    heaped: bool,
}

impl MoveList {
    pub fn new(capacity: usize) -> MoveList {
        MoveList {
            moves: Vec::with_capacity(capacity.min(1024)),
            spare: Move::default(),
            capacity,
            heaped: false,
        }
    }

    pub fn reset(&mut self) {
        self.moves.clear();
        self.heaped = false;
    }

    pub fn count(&self) -> usize {
        self.moves.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> &Move {
        &self.moves[index]
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// The move under construction.
    pub fn spare_mut(&mut self) -> &mut Move {
        &mut self.spare
    }

    pub fn set_spare_as_pass(&mut self) {
        self.spare = Move::pass();
    }

    /// Push the spare into the list with the given equity (record-all).
    /// When full, the spare replaces the worst member if it beats it.
    pub fn insert_spare(&mut self, equity: Equity) {
        self.spare.equity = equity;
        self.heaped = false;
        if self.moves.len() < self.capacity {
            self.moves.push(self.spare.clone());
            return;
        }
        if let Some(worst) = self.worst_index() {
            if self.spare.equity_cmp(&self.moves[worst]) == Ordering::Less {
                self.moves[worst] = self.spare.clone();
            }
        }
    }

    /// Keep only the better of the current single move and the spare
    /// (record-best).
    pub fn insert_spare_as_best(&mut self, equity: Equity) {
        self.spare.equity = equity;
        self.heaped = false;
        match self.moves.first_mut() {
            None => self.moves.push(self.spare.clone()),
            Some(best) => {
                if self.spare.equity_cmp(best) == Ordering::Less {
                    *best = self.spare.clone();
                }
            }
        }
    }

    /// Push the spare and drop members that fell below the threshold
    /// (record-within-epsilon). Returns the new best equity.
    pub fn insert_spare_within_epsilon(&mut self, equity: Equity, best: Equity, epsilon: Equity) -> Equity {
        self.spare.equity = equity;
        self.heaped = false;
        let new_best = if equity > best { equity } else { best };
        let threshold = if new_best <= Equity::PASS {
            new_best
        } else {
            new_best.saturating_add(Equity::ZERO - epsilon)
        };
        if equity >= threshold {
            self.moves.push(self.spare.clone());
        }
        if new_best > best {
            self.moves.retain(|m| m.equity >= threshold);
        }
        new_best
    }

    fn worst_index(&self) -> Option<usize> {
        let mut worst: Option<usize> = None;
        for i in 0..self.moves.len() {
            match worst {
                None => worst = Some(i),
                Some(w) => {
                    if self.moves[i].equity_cmp(&self.moves[w]) == Ordering::Greater {
                        worst = Some(i);
                    }
                }
            }
        }
        worst
    }

    fn heapify_down(&mut self, parent: usize) {
        let count = self.moves.len();
        let mut parent = parent;
        loop {
            let left = parent * 2 + 1;
            let right = parent * 2 + 2;
            let mut max = parent;
            if left < count && self.moves[left].equity_cmp(&self.moves[max]) == Ordering::Less {
                max = left;
            }
            if right < count && self.moves[right].equity_cmp(&self.moves[max]) == Ordering::Less {
                max = right;
            }
            if max == parent {
                return;
            }
            self.moves.swap(max, parent);
            parent = max;
        }
    }

    /// O(n) bottom-up heap construction.
    fn heapify_all(&mut self) {
        for node in (0..=self.moves.len() / 2).rev() {
            self.heapify_down(node);
        }
        self.heaped = true;
    }

    /// Binary-heap pop: remove and return the best move by equity.
    pub fn pop_max(&mut self) -> Option<Move> {
        if self.moves.is_empty() {
            return None;
        }
        if !self.heaped {
            self.heapify_all();
        }
        let max = self.moves.swap_remove(0);
        self.heapify_down(0);
        Some(max)
    }

    pub fn sort_by_equity(&mut self) {
        self.moves.sort_unstable_by(Move::equity_cmp);
        // A list sorted best-first already satisfies the heap order.
        self.heaped = true;
    }

    pub fn sort_by_score(&mut self) {
        self.moves.sort_unstable_by(Move::score_cmp);
        self.heaped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(row: u8, col: u8, score: i32, equity: i32) -> Move {
        Move {
            kind: MoveKind::Place,
            row,
            col,
            dir: 0,
            tiles: TileStrip::new(),
            tiles_played: 1,
            score: Equity::from_int(score),
            equity: Equity::from_int(equity),
        }
    }

    #[test]
    fn test_sort_by_equity_deterministic() {
        let mut list = MoveList::new(16);
        for mv in [place(3, 4, 10, 20), place(1, 2, 10, 30), place(2, 2, 10, 20)] {
            *list.spare_mut() = mv.clone();
            list.insert_spare(mv.equity);
        }
        list.sort_by_equity();
        assert_eq!(list.get(0).equity, Equity::from_int(30));
        // Equity tie broken by row.
        assert_eq!(list.get(1).row, 2);
        assert_eq!(list.get(2).row, 3);
        // Sorting twice is idempotent.
        let before: Vec<Move> = list.moves().to_vec();
        list.sort_by_equity();
        assert_eq!(before, list.moves());
    }

    #[test]
    fn test_record_best() {
        let mut list = MoveList::new(1);
        *list.spare_mut() = place(0, 0, 5, 5);
        list.insert_spare_as_best(Equity::from_int(5));
        *list.spare_mut() = place(0, 1, 9, 9);
        list.insert_spare_as_best(Equity::from_int(9));
        *list.spare_mut() = place(0, 2, 7, 7);
        list.insert_spare_as_best(Equity::from_int(7));
        assert_eq!(list.count(), 1);
        assert_eq!(list.get(0).equity, Equity::from_int(9));
    }

    #[test]
    fn test_record_within_epsilon() {
        let mut list = MoveList::new(16);
        let eps = Equity::from_int(3);
        let mut best = Equity::INITIAL;
        for (i, equity) in [10, 8, 2, 11, 9].iter().enumerate() {
            *list.spare_mut() = place(i as u8, 0, *equity, *equity);
            best = list.insert_spare_within_epsilon(Equity::from_int(*equity), best, eps);
        }
        assert_eq!(best, Equity::from_int(11));
        // Moves with equity >= 8 survive.
        let mut equities: Vec<i32> = list
            .moves()
            .iter()
            .map(|m| m.equity.raw() / 1000)
            .collect();
        equities.sort_unstable();
        assert_eq!(equities, vec![8, 9, 10, 11]);
    }

    #[test]
    fn test_capacity_keeps_best() {
        let mut list = MoveList::new(2);
        for (i, equity) in [5, 9, 7].iter().enumerate() {
            *list.spare_mut() = place(i as u8, 0, *equity, *equity);
            list.insert_spare(Equity::from_int(*equity));
        }
        assert_eq!(list.count(), 2);
        list.sort_by_equity();
        assert_eq!(list.get(0).equity, Equity::from_int(9));
        assert_eq!(list.get(1).equity, Equity::from_int(7));
    }

    #[test]
    fn test_pop_max() {
        let mut list = MoveList::new(8);
        for (i, equity) in [4, 12, 6].iter().enumerate() {
            *list.spare_mut() = place(i as u8, 0, *equity, *equity);
            list.insert_spare(Equity::from_int(*equity));
        }
        assert_eq!(list.pop_max().unwrap().equity, Equity::from_int(12));
        assert_eq!(list.pop_max().unwrap().equity, Equity::from_int(6));
        // An insert invalidates the heap; the next pop restores it.
        *list.spare_mut() = place(9, 0, 30, 30);
        list.insert_spare(Equity::from_int(30));
        assert_eq!(list.pop_max().unwrap().equity, Equity::from_int(30));
        assert_eq!(list.pop_max().unwrap().equity, Equity::from_int(4));
        assert!(list.pop_max().is_none());
    }

    #[test]
    fn test_pop_max_drains_in_order() {
        let mut list = MoveList::new(32);
        for (i, equity) in [7, 1, 19, 3, 19, 11, 2, 8].iter().enumerate() {
            *list.spare_mut() = place(i as u8, 0, *equity, *equity);
            list.insert_spare(Equity::from_int(*equity));
        }
        let mut drained = Vec::new();
        while let Some(mv) = list.pop_max() {
            drained.push(mv.equity);
        }
        let mut sorted = drained.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(drained, sorted);
        assert_eq!(drained.len(), 8);
    }

    #[test]
    fn test_move_text() {
        let ts = TileSet::default();
        let mut mv = place(7, 3, 0, 0);
        for &ml in &ts.encode("CAT").unwrap() {
            mv.tiles.push(ml);
        }
        assert_eq!(mv.to_text(&ts), "8D CAT");
        mv.dir = crate::board::BOARD_VERTICAL_DIRECTION as u8;
        assert_eq!(mv.to_text(&ts), "D8 CAT");
        assert_eq!(Move::pass().to_text(&ts), "(pass)");
    }
}
