//! The board model.
//!
//! The board keeps four "sub-boards": one pair per direction, one pair
//! per cross index (players with distinct lexicons have distinct cross
//! sets). Letters, bonus squares and cross-word flags are mirrored
//! across all four; cross sets, cross scores and extension sets belong
//! to a single (direction, cross index) sub-board; anchors belong to a
//! direction and are shared across cross indexes.
//!
//! A `transposed` flag swaps rows and columns inside the addressing
//! function so the generator can always scan rightward.

use crate::equity::Equity;
use crate::error::Error;
use crate::layout::{self, BoardLayout, BRICK_VALUE};
use crate::tiles::{get_is_blanked, get_unblanked, EMPTY_SQUARE_MARKER, MachineLetter};
use crate::tileset::TileSet;
use std::fmt;

pub const BOARD_HORIZONTAL_DIRECTION: usize = 0;
pub const BOARD_VERTICAL_DIRECTION: usize = 1;

/// The set of letters legal on a square with no perpendicular neighbor:
/// every non-blank letter, plus the blank bit.
pub fn trivial_cross_set(dist_size: usize) -> u64 {
    let letters = ((1u64 << (dist_size + 1)) - 1) & !1;
    letters | 1
}

/// Set the blank bit iff any letter bit is set. The input must not have
/// bit 0 set.
#[inline]
pub fn cross_set_with_blank(cross_set: u64) -> u64 {
    cross_set + u64::from(cross_set != 0)
}

#[derive(Debug, Clone, Copy)]
pub struct Square {
    pub letter: MachineLetter,
    pub bonus: u8,
    pub cross_set: u64,
    pub left_extension_set: u64,
    pub right_extension_set: u64,
    pub cross_score: Equity,
    pub anchor: bool,
    pub is_cross_word: bool,
}

impl Default for Square {
    fn default() -> Self {
        Square {
            letter: EMPTY_SQUARE_MARKER,
            bonus: 0x11,
            cross_set: 0,
            left_extension_set: 0,
            right_extension_set: 0,
            cross_score: Equity::ZERO,
            anchor: false,
            is_cross_word: false,
        }
    }
}

impl Square {
    pub fn is_brick(&self) -> bool {
        self.bonus == BRICK_VALUE
    }

    pub fn is_empty(&self) -> bool {
        self.letter == EMPTY_SQUARE_MARKER
    }

    pub fn word_multiplier(&self) -> u8 {
        layout::bonus_word_multiplier(self.bonus)
    }

    pub fn letter_multiplier(&self) -> u8 {
        layout::bonus_letter_multiplier(self.bonus)
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    dim: usize,
    dist_size: usize,
    squares: Vec<Square>,
    row_anchor_counts: Vec<u32>,
    opening_move_penalties: Vec<Equity>,
    transposed: bool,
    tiles_played: u32,
    start: (usize, usize),
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..self.dim {
            for col in 0..self.dim {
                let letter = self.letter_at(row, col);
                if letter == EMPTY_SQUARE_MARKER {
                    write!(f, ".")?;
                } else {
                    let c = (b'A' + get_unblanked(letter) - 1) as char;
                    if get_is_blanked(letter) {
                        write!(f, "{}", c.to_ascii_lowercase())?;
                    } else {
                        write!(f, "{}", c)?;
                    }
                }
            }
            if row + 1 < self.dim {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl Board {
    /// Create an empty board from a layout, for an alphabet of
    /// `dist_size` letters.
    pub fn new(bl: &BoardLayout, dist_size: usize) -> Board {
        let dim = bl.dim();
        let mut board = Board {
            dim,
            dist_size,
            squares: vec![Square::default(); 2 * 2 * dim * dim],
            row_anchor_counts: vec![0; dim * 2],
            opening_move_penalties: vec![Equity::ZERO; dim * 2],
            transposed: false,
            tiles_played: 0,
            start: bl.start(),
        };
        board.apply_layout(bl);
        board.reset();
        board
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn dist_size(&self) -> usize {
        self.dist_size
    }

    pub fn start(&self) -> (usize, usize) {
        self.start
    }

    pub fn tiles_played(&self) -> u32 {
        self.tiles_played
    }

    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    pub fn transpose(&mut self) {
        self.transposed = !self.transposed;
    }

    pub fn set_transposed(&mut self, transposed: bool) {
        self.transposed = transposed;
    }

    /// Index into the flat square array. The transposed flag is folded
    /// into the direction; the scan direction's coordinate varies
    /// fastest so a lane is contiguous.
    #[inline]
    fn square_index(&self, row: usize, col: usize, dir: usize, ci: usize) -> usize {
        let cross_offset = ci * 2 * self.dim * self.dim;
        let adjusted_dir = dir ^ (self.transposed as usize);
        let dir_offset = adjusted_dir * self.dim * self.dim;
        let (lane, pos) = if dir == BOARD_HORIZONTAL_DIRECTION {
            (row, col)
        } else {
            (col, row)
        };
        cross_offset + dir_offset + lane * self.dim + pos
    }

    #[inline]
    pub fn square(&self, row: usize, col: usize, dir: usize, ci: usize) -> &Square {
        &self.squares[self.square_index(row, col, dir, ci)]
    }

    #[inline]
    fn square_mut(&mut self, row: usize, col: usize, dir: usize, ci: usize) -> &mut Square {
        let index = self.square_index(row, col, dir, ci);
        &mut self.squares[index]
    }

    // Letters are mirrored across all four sub-boards; read with
    // direction and cross index zero.

    pub fn letter_at(&self, row: usize, col: usize) -> MachineLetter {
        self.square(row, col, 0, 0).letter
    }

    pub fn set_letter(&mut self, row: usize, col: usize, letter: MachineLetter) {
        for ci in 0..2 {
            for dir in 0..2 {
                self.square_mut(row, col, dir, ci).letter = letter;
                if letter != EMPTY_SQUARE_MARKER {
                    // Mark the perpendicular neighbors as forming a
                    // cross word in this direction.
                    let (prev, next) = if dir == BOARD_HORIZONTAL_DIRECTION {
                        (
                            row.checked_sub(1).map(|r| (r, col)),
                            if row + 1 < self.dim { Some((row + 1, col)) } else { None },
                        )
                    } else {
                        (
                            col.checked_sub(1).map(|c| (row, c)),
                            if col + 1 < self.dim { Some((row, col + 1)) } else { None },
                        )
                    };
                    if let Some((r, c)) = prev {
                        self.square_mut(r, c, dir, ci).is_cross_word = true;
                    }
                    if let Some((r, c)) = next {
                        self.square_mut(r, c, dir, ci).is_cross_word = true;
                    }
                }
            }
        }
    }

    pub fn is_empty(&self, row: usize, col: usize) -> bool {
        self.letter_at(row, col) == EMPTY_SQUARE_MARKER
    }

    pub fn bonus_at(&self, row: usize, col: usize) -> u8 {
        self.square(row, col, 0, 0).bonus
    }

    pub fn is_brick(&self, row: usize, col: usize) -> bool {
        self.bonus_at(row, col) == BRICK_VALUE
    }

    pub fn is_empty_or_bricked(&self, row: usize, col: usize) -> bool {
        let s = self.square(row, col, 0, 0);
        s.is_empty() || s.is_brick()
    }

    pub fn is_nonempty_or_bricked(&self, row: usize, col: usize) -> bool {
        let s = self.square(row, col, 0, 0);
        !s.is_empty() || s.is_brick()
    }

    pub fn is_in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && (row as usize) < self.dim && col >= 0 && (col as usize) < self.dim
    }

    pub fn is_cross_word(&self, row: usize, col: usize, dir: usize) -> bool {
        self.square(row, col, dir, 0).is_cross_word
    }

    // Cross sets and cross scores live on one sub-board each.

    pub fn cross_set(&self, row: usize, col: usize, dir: usize, ci: usize) -> u64 {
        self.square(row, col, dir, ci).cross_set
    }

    pub fn set_cross_set(&mut self, row: usize, col: usize, dir: usize, ci: usize, cs: u64) {
        self.square_mut(row, col, dir, ci).cross_set = cs;
    }

    /// Store a set of non-blank letters, adding the blank bit iff the
    /// set is nonempty.
    pub fn set_cross_set_with_blank(
        &mut self,
        row: usize,
        col: usize,
        dir: usize,
        ci: usize,
        cs: u64,
    ) {
        debug_assert_eq!(cs & 1, 0);
        self.square_mut(row, col, dir, ci).cross_set = cross_set_with_blank(cs);
    }

    pub fn cross_score(&self, row: usize, col: usize, dir: usize, ci: usize) -> Equity {
        self.square(row, col, dir, ci).cross_score
    }

    pub fn set_cross_score(&mut self, row: usize, col: usize, dir: usize, ci: usize, s: Equity) {
        self.square_mut(row, col, dir, ci).cross_score = s;
    }

    pub fn left_extension_set(&self, row: usize, col: usize, dir: usize, ci: usize) -> u64 {
        self.square(row, col, dir, ci).left_extension_set
    }

    pub fn set_left_extension_set(
        &mut self,
        row: usize,
        col: usize,
        dir: usize,
        ci: usize,
        set: u64,
    ) {
        self.square_mut(row, col, dir, ci).left_extension_set = set;
    }

    pub fn right_extension_set(&self, row: usize, col: usize, dir: usize, ci: usize) -> u64 {
        self.square(row, col, dir, ci).right_extension_set
    }

    pub fn set_right_extension_set(
        &mut self,
        row: usize,
        col: usize,
        dir: usize,
        ci: usize,
        set: u64,
    ) {
        self.square_mut(row, col, dir, ci).right_extension_set = set;
    }

    // Anchors are per direction, shared across cross indexes. The lane
    // counts are maintained incrementally and are only valid on the
    // untransposed board.

    pub fn anchor(&self, row: usize, col: usize, dir: usize) -> bool {
        self.square(row, col, dir, 0).anchor
    }

    pub fn set_anchor(&mut self, row: usize, col: usize, dir: usize, anchor: bool) {
        for ci in 0..2 {
            let old = {
                let s = self.square_mut(row, col, dir, ci);
                let old = s.anchor;
                s.anchor = anchor;
                old
            };
            if ci == 0 {
                let index = self.anchor_count_index(row, col, dir);
                if old && !anchor {
                    self.row_anchor_counts[index] -= 1;
                } else if !old && anchor {
                    self.row_anchor_counts[index] += 1;
                }
            }
        }
    }

    fn anchor_count_index(&self, row: usize, col: usize, dir: usize) -> usize {
        let mut index = self.dim * (dir ^ (self.transposed as usize));
        index += if dir == BOARD_HORIZONTAL_DIRECTION {
            row
        } else {
            col
        };
        index
    }

    /// Number of anchors on a lane. Only valid when not transposed.
    pub fn row_anchor_count(&self, lane: usize, dir: usize) -> u32 {
        debug_assert!(!self.transposed);
        self.row_anchor_counts[self.anchor_count_index(lane, lane, dir)]
    }

    fn reset_anchor(&mut self, row: usize, col: usize, dir: usize) {
        for ci in 0..2 {
            self.square_mut(row, col, dir, ci).anchor = false;
        }
    }

    /// Recompute both anchor flags for one square.
    ///
    /// An occupied square anchors the direction in which it is the last
    /// tile of its run; an empty square anchors a direction when it has
    /// no neighbor along it but a neighbor across it.
    pub fn update_anchors(&mut self, row: usize, col: usize) {
        self.set_anchor(row, col, BOARD_HORIZONTAL_DIRECTION, false);
        self.set_anchor(row, col, BOARD_VERTICAL_DIRECTION, false);
        if self.is_brick(row, col) {
            return;
        }
        let tile_above = row > 0 && !self.is_empty(row - 1, col);
        let tile_left = col > 0 && !self.is_empty(row, col - 1);
        let tile_below = row + 1 < self.dim && !self.is_empty(row + 1, col);
        let tile_right = col + 1 < self.dim && !self.is_empty(row, col + 1);
        if !self.is_empty(row, col) {
            if !tile_right {
                self.set_anchor(row, col, BOARD_HORIZONTAL_DIRECTION, true);
            }
            if !tile_below {
                self.set_anchor(row, col, BOARD_VERTICAL_DIRECTION, true);
            }
        } else {
            if !tile_left && !tile_right && (tile_above || tile_below) {
                self.set_anchor(row, col, BOARD_HORIZONTAL_DIRECTION, true);
            }
            if !tile_above && !tile_below && (tile_left || tile_right) {
                self.set_anchor(row, col, BOARD_VERTICAL_DIRECTION, true);
            }
        }
    }

    pub fn bonus_squares_symmetric_by_transposition(&self) -> bool {
        for row in 0..self.dim {
            for col in row + 1..self.dim {
                if self.bonus_at(row, col) != self.bonus_at(col, row) {
                    return false;
                }
            }
        }
        true
    }

    /// Recompute every anchor. On an empty board only the start square
    /// anchors, vertically too when the layout is asymmetric.
    pub fn update_all_anchors(&mut self) {
        if self.tiles_played > 0 {
            for row in 0..self.dim {
                for col in 0..self.dim {
                    self.update_anchors(row, col);
                }
            }
        } else {
            for row in 0..self.dim {
                for col in 0..self.dim {
                    self.reset_anchor(row, col, BOARD_HORIZONTAL_DIRECTION);
                    self.reset_anchor(row, col, BOARD_VERTICAL_DIRECTION);
                }
            }
            for count in &mut self.row_anchor_counts {
                *count = 0;
            }
            let (start_row, start_col) = self.start;
            if !self.is_brick(start_row, start_col) {
                self.set_anchor(start_row, start_col, BOARD_HORIZONTAL_DIRECTION, true);
                if start_row != start_col || !self.bonus_squares_symmetric_by_transposition() {
                    self.set_anchor(start_row, start_col, BOARD_VERTICAL_DIRECTION, true);
                }
            }
        }
    }

    /// The column of the last contiguous tile moving from (row, col) in
    /// `step` direction (-1 left, +1 right). Bricks end a word.
    pub fn word_edge(&self, row: usize, col: usize, step: i32) -> usize {
        let mut c = col as i32;
        while self.is_in_bounds(row as i32, c) && !self.is_empty_or_bricked(row, c as usize) {
            c += step;
        }
        (c - step) as usize
    }

    pub fn are_all_adjacent_squares_empty(&self, row: usize, col: usize) -> bool {
        let (r, c) = (row as i32, col as i32);
        for &(dr, dc) in &[(0i32, -1i32), (0, 1), (-1, 0), (1, 0)] {
            if self.is_in_bounds(r + dr, c + dc)
                && !self.is_empty_or_bricked((r + dr) as usize, (c + dc) as usize)
            {
                return false;
            }
        }
        true
    }

    pub fn increment_tiles_played(&mut self, tiles_played: u32) {
        self.tiles_played += tiles_played;
    }

    pub fn opening_move_penalty(&self, lane_pos: usize, dir: usize) -> Equity {
        self.opening_move_penalties[dir * self.dim + lane_pos]
    }

    fn add_opening_penalty(&mut self, dir: usize, i: usize, bonus_row: usize, bonus_col: usize) {
        let bonus = self.bonus_at(bonus_row, bonus_col);
        if bonus == BRICK_VALUE {
            return;
        }
        let word_multiplier = i32::from(layout::bonus_word_multiplier(bonus));
        let letter_multiplier = i32::from(layout::bonus_letter_multiplier(bonus));
        let half = crate::static_eval::OPENING_HOTSPOT_PENALTY.raw() / 2;
        self.opening_move_penalties[dir * self.dim + i] += Equity::from_raw(
            half * (word_multiplier - 1) + half * (letter_multiplier - 1),
        );
    }

    fn apply_layout(&mut self, bl: &BoardLayout) {
        self.transposed = false;
        for row in 0..self.dim {
            for col in 0..self.dim {
                let bonus = bl.bonus_at(row, col);
                for dir in 0..2 {
                    for ci in 0..2 {
                        self.square_mut(row, col, dir, ci).bonus = bonus;
                    }
                }
            }
        }
        for penalty in &mut self.opening_move_penalties {
            *penalty = Equity::ZERO;
        }
        let (start_row, start_col) = self.start;
        if start_row > 0 {
            for col in 0..self.dim {
                self.add_opening_penalty(BOARD_HORIZONTAL_DIRECTION, col, start_row - 1, col);
            }
        }
        if start_row + 1 < self.dim {
            for col in 0..self.dim {
                self.add_opening_penalty(BOARD_HORIZONTAL_DIRECTION, col, start_row + 1, col);
            }
        }
        if start_col > 0 {
            for row in 0..self.dim {
                self.add_opening_penalty(BOARD_VERTICAL_DIRECTION, row, row, start_col - 1);
            }
        }
        if start_col + 1 < self.dim {
            for row in 0..self.dim {
                self.add_opening_penalty(BOARD_VERTICAL_DIRECTION, row, row, start_col + 1);
            }
        }
    }

    /// Clear all letters, cross data and anchors.
    pub fn reset(&mut self) {
        self.tiles_played = 0;
        self.transposed = false;
        for row in 0..self.dim {
            for col in 0..self.dim {
                for dir in 0..2 {
                    for ci in 0..2 {
                        let s = self.square_mut(row, col, dir, ci);
                        s.letter = EMPTY_SQUARE_MARKER;
                        s.is_cross_word = false;
                        s.cross_score = Equity::ZERO;
                    }
                }
            }
        }
        self.set_all_crosses_trivial();
        self.update_all_anchors();
    }

    /// Reset every cross and extension set to the trivial set (or zero
    /// on bricks).
    pub fn set_all_crosses_trivial(&mut self) {
        let trivial = trivial_cross_set(self.dist_size);
        for row in 0..self.dim {
            for col in 0..self.dim {
                let cs = if self.is_brick(row, col) { 0 } else { trivial };
                for dir in 0..2 {
                    for ci in 0..2 {
                        let s = self.square_mut(row, col, dir, ci);
                        s.cross_set = cs;
                        s.left_extension_set = trivial;
                        s.right_extension_set = trivial;
                    }
                }
            }
        }
    }

    /// Place letters from one string per row; `.` or space is an empty
    /// square, lowercase letters are designated blanks. Anchors are
    /// recomputed; cross sets are the caller's responsibility since they
    /// need a lexicon.
    pub fn set_letters_from_strings<S: AsRef<str>>(
        &mut self,
        tileset: &TileSet,
        rows: &[S],
    ) -> Result<(), Error> {
        if rows.len() != self.dim {
            return Err(Error::InvalidRowCount(rows.len(), self.dim));
        }
        self.tiles_played = 0;
        self.transposed = false;
        for (row, line) in rows.iter().enumerate() {
            let chars: Vec<char> = line.as_ref().chars().collect();
            if chars.len() != self.dim {
                return Err(Error::InvalidRowLength(chars.len(), self.dim));
            }
            for (col, c) in chars.into_iter().enumerate() {
                if c == '.' || c == ' ' {
                    self.set_letter(row, col, EMPTY_SQUARE_MARKER);
                } else {
                    let ml = tileset.encode_token(&c.to_string())?;
                    self.set_letter(row, col, ml);
                    self.tiles_played += 1;
                }
            }
        }
        self.update_all_anchors();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::Language;
    use anyhow::Result;

    fn empty_board() -> Board {
        Board::new(&BoardLayout::standard15(), TileSet::new(Language::EN).size())
    }

    #[test]
    fn test_empty_board_anchors() {
        let board = empty_board();
        assert!(board.anchor(7, 7, BOARD_HORIZONTAL_DIRECTION));
        // standard15 is symmetric, so no vertical start anchor
        assert!(!board.anchor(7, 7, BOARD_VERTICAL_DIRECTION));
        assert_eq!(board.row_anchor_count(7, BOARD_HORIZONTAL_DIRECTION), 1);
        assert_eq!(board.row_anchor_count(0, BOARD_HORIZONTAL_DIRECTION), 0);
    }

    #[test]
    fn test_transposed_addressing() {
        let mut board = empty_board();
        board.set_letter(3, 5, 9);
        assert_eq!(board.letter_at(3, 5), 9);
        board.transpose();
        assert_eq!(board.letter_at(5, 3), 9);
        board.transpose();
        assert_eq!(board.letter_at(3, 5), 9);
    }

    #[test]
    fn test_anchors_after_play() -> Result<()> {
        let mut board = empty_board();
        let ts = TileSet::new(Language::EN);
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        board.set_letters_from_strings(&ts, &rows)?;

        // Last tile of the horizontal run anchors horizontally.
        assert!(board.anchor(7, 8, BOARD_HORIZONTAL_DIRECTION));
        assert!(!board.anchor(7, 7, BOARD_HORIZONTAL_DIRECTION));
        // Every tile of the run anchors vertically (no tile below).
        assert!(board.anchor(7, 6, BOARD_VERTICAL_DIRECTION));
        assert!(board.anchor(7, 7, BOARD_VERTICAL_DIRECTION));
        assert!(board.anchor(7, 8, BOARD_VERTICAL_DIRECTION));
        // The empty square above a tile anchors horizontally
        // (cross anchor), not vertically.
        assert!(board.anchor(6, 7, BOARD_HORIZONTAL_DIRECTION));
        assert!(!board.anchor(6, 7, BOARD_VERTICAL_DIRECTION));
        // The square left of the run anchors vertically only.
        assert!(board.anchor(7, 5, BOARD_VERTICAL_DIRECTION));
        assert!(!board.anchor(7, 5, BOARD_HORIZONTAL_DIRECTION));
        Ok(())
    }

    #[test]
    fn test_is_cross_word() {
        let mut board = empty_board();
        board.set_letter(7, 7, 3);
        // Vertical neighbors see a cross word in the horizontal frame.
        assert!(board.is_cross_word(6, 7, BOARD_HORIZONTAL_DIRECTION));
        assert!(board.is_cross_word(8, 7, BOARD_HORIZONTAL_DIRECTION));
        // Horizontal neighbors see one in the vertical frame.
        assert!(board.is_cross_word(7, 6, BOARD_VERTICAL_DIRECTION));
        assert!(!board.is_cross_word(7, 6, BOARD_HORIZONTAL_DIRECTION));
    }

    #[test]
    fn test_word_edge() -> Result<()> {
        let mut board = empty_board();
        let ts = TileSet::new(Language::EN);
        let mut rows = vec![String::from("...............") ; 15];
        rows[4] = String::from("..WORD.........");
        board.set_letters_from_strings(&ts, &rows)?;
        assert_eq!(board.word_edge(4, 3, -1), 2);
        assert_eq!(board.word_edge(4, 3, 1), 5);
        Ok(())
    }

    #[test]
    fn test_trivial_cross_set() {
        let cs = trivial_cross_set(26);
        assert_eq!(cs & 1, 1);
        assert_eq!(cs.count_ones(), 27);
        assert_eq!(cross_set_with_blank(0), 0);
        assert_eq!(cross_set_with_blank(0b10), 0b11);
    }

    #[test]
    fn test_opening_penalties() {
        let board = empty_board();
        // Column 8 is flanked by double-letter squares above and below
        // the start row.
        let penalty = board.opening_move_penalty(8, BOARD_HORIZONTAL_DIRECTION);
        assert_eq!(penalty, crate::static_eval::OPENING_HOTSPOT_PENALTY);
        assert_eq!(
            board.opening_move_penalty(4, BOARD_HORIZONTAL_DIRECTION),
            Equity::ZERO
        );
    }
}
