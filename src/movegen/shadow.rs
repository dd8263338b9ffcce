//! Shadow evaluation: per-anchor upper bounds.
//!
//! The shadow walks every playable extent around an anchor without
//! consulting the lexicon, pretending the best remaining tiles land on
//! the best remaining multipliers. The resulting bound can only
//! overestimate, which is what the anchor heap ordering and the
//! record-best early cutoff need.

use super::{Gen, NO_LAST_ANCHOR};
use crate::anchor::Anchor;
use crate::bit_rack::BitRack;
use crate::board::BOARD_HORIZONTAL_DIRECTION;
use crate::equity::Equity;
use crate::rack::RACK_SIZE;
use crate::static_eval;
use crate::tiles::get_unblanked;

/// A contiguous playable range around an anchor.
pub(crate) struct Extent {
    pub left: usize,
    pub right: usize,
    pub empty_positions: Vec<usize>,
    pub playthrough: BitRack,
    pub playthrough_blocks: u8,
}

impl<'a> Gen<'a> {
    /// Populate the anchor heap with upper bounds for every anchor on
    /// the board.
    pub(crate) fn shadow_scan(&mut self) {
        self.anchor_heap.reset();
        for dir in 0..2 {
            self.dir = dir;
            for lane in 0..self.dim {
                if self.board.row_anchor_count(lane, dir) == 0 {
                    continue;
                }
                self.lane = lane;
                let mut last_anchor_col: i32 = -1;
                for pos in 0..self.dim {
                    let (row, col) = self.coords(pos);
                    if !self.board.anchor(row, col, dir) {
                        continue;
                    }
                    self.shadow_anchor(pos, last_anchor_col);
                    last_anchor_col = pos as i32;
                }
            }
        }
        self.anchor_heap.heapify_all();
    }

    /// Bound one anchor over all of its extents and add it to the heap
    /// if anything at all can be played there.
    fn shadow_anchor(&mut self, anchor_pos: usize, last_anchor_col: i32) {
        let extents = self.extents_for_anchor(anchor_pos, last_anchor_col);
        let mut highest_equity = Equity::INITIAL;
        let mut highest_score = Equity::INITIAL;
        let mut best_extent: Option<&Extent> = None;
        for extent in &extents {
            let (score_bound, equity_bound) = self.shadow_extent_bound(extent);
            if score_bound > highest_score {
                highest_score = score_bound;
            }
            if equity_bound > highest_equity {
                highest_equity = equity_bound;
                best_extent = Some(extent);
            }
        }
        let best_extent = match best_extent {
            Some(extent) => extent,
            None => return,
        };
        let (row, col) = self.coords(anchor_pos);
        self.anchor_heap.add_unheaped(Anchor {
            playthrough: best_extent.playthrough,
            highest_possible_equity: highest_equity,
            highest_possible_score: highest_score,
            row: row as u8,
            col: col as u8,
            last_anchor_col: if last_anchor_col < 0 {
                NO_LAST_ANCHOR
            } else {
                last_anchor_col as u8
            },
            dir: self.dir as u8,
            tiles_to_play: best_extent.empty_positions.len() as u8,
            playthrough_blocks: best_extent.playthrough_blocks,
        });
    }

    /// Enumerate the contiguous ranges through `anchor_pos` that a word
    /// could occupy: word boundaries on both sides, no bricks, every
    /// empty square placeable, at most a rackful of empties, and the
    /// left end strictly past the previous anchor.
    pub(crate) fn extents_for_anchor(
        &self,
        anchor_pos: usize,
        last_anchor_col: i32,
    ) -> Vec<Extent> {
        let rack_len = self.rack_letter_count;
        let mut lefts: Vec<(usize, usize)> = Vec::new();
        {
            let mut empties = 0usize;
            let mut cur = anchor_pos as i32;
            while cur >= 0 && cur > last_anchor_col {
                let (row, col) = self.coords(cur as usize);
                let square = self.board.square(row, col, self.dir, self.cross_index);
                if square.is_brick() {
                    break;
                }
                if square.is_empty() {
                    if square.cross_set == 0 {
                        break;
                    }
                    empties += 1;
                    if empties > rack_len {
                        break;
                    }
                }
                let boundary_ok = cur == 0 || {
                    let (r, c) = self.coords(cur as usize - 1);
                    self.board.is_empty_or_bricked(r, c)
                };
                if boundary_ok {
                    lefts.push((cur as usize, empties));
                }
                cur -= 1;
            }
        }
        let mut rights: Vec<(usize, usize)> = Vec::new();
        {
            let mut empties = 0usize;
            let mut cur = anchor_pos;
            while cur < self.dim {
                if cur > anchor_pos {
                    let (row, col) = self.coords(cur);
                    let square = self.board.square(row, col, self.dir, self.cross_index);
                    if square.is_brick() {
                        break;
                    }
                    if square.is_empty() {
                        if square.cross_set == 0 {
                            break;
                        }
                        empties += 1;
                        if empties > rack_len {
                            break;
                        }
                    }
                }
                let boundary_ok = cur + 1 == self.dim || {
                    let (r, c) = self.coords(cur + 1);
                    self.board.is_empty_or_bricked(r, c)
                };
                if boundary_ok {
                    rights.push((cur, empties));
                }
                cur += 1;
            }
        }
        let mut extents = Vec::new();
        for &(left, left_empties) in &lefts {
            for &(right, right_empties) in &rights {
                let tiles_played = left_empties + right_empties;
                if tiles_played == 0 || tiles_played > rack_len {
                    continue;
                }
                extents.push(self.build_extent(left, right));
            }
        }
        extents
    }

    fn build_extent(&self, left: usize, right: usize) -> Extent {
        let mut empty_positions = Vec::new();
        let mut playthrough = BitRack::new();
        let mut playthrough_blocks = 0u8;
        let mut in_block = false;
        for pos in left..=right {
            let (row, col) = self.coords(pos);
            let square = self.board.square(row, col, self.dir, self.cross_index);
            if square.is_empty() {
                empty_positions.push(pos);
                in_block = false;
            } else {
                playthrough.add_letter(get_unblanked(square.letter));
                if !in_block {
                    playthrough_blocks += 1;
                    in_block = true;
                }
            }
        }
        Extent {
            left,
            right,
            empty_positions,
            playthrough,
            playthrough_blocks,
        }
    }

    /// Upper-bound score and equity for one extent: through tiles times
    /// the full word multiplier, plus the inner product of descending
    /// rack tile scores with descending effective letter multipliers,
    /// plus perpendicular additions, plus best-leave and phase
    /// adjustments.
    fn shadow_extent_bound(&self, extent: &Extent) -> (Equity, Equity) {
        let tiles_played = extent.empty_positions.len();
        let mut word_multiplier = 1i64;
        for &pos in &extent.empty_positions {
            let (row, col) = self.coords(pos);
            let square = self.board.square(row, col, self.dir, self.cross_index);
            word_multiplier *= i64::from(square.word_multiplier());
        }
        let mut through_score = 0i64;
        let mut perpendicular_additional = 0i64;
        let mut effective_multipliers: Vec<i64> = Vec::with_capacity(tiles_played);
        for pos in extent.left..=extent.right {
            let (row, col) = self.coords(pos);
            let square = self.board.square(row, col, self.dir, self.cross_index);
            if !square.is_empty() {
                through_score += i64::from(self.tileset.score(square.letter).raw());
                continue;
            }
            let letter_mult = i64::from(square.letter_multiplier());
            let word_mult = i64::from(square.word_multiplier());
            let mut effective = letter_mult * word_multiplier;
            if square.is_cross_word {
                effective += letter_mult * word_mult;
                perpendicular_additional += i64::from(square.cross_score.raw()) * word_mult;
            }
            effective_multipliers.push(effective);
        }
        effective_multipliers.sort_unstable_by(|a, b| b.cmp(a));
        let mut score = through_score * word_multiplier + perpendicular_additional;
        for (i, &mult) in effective_multipliers.iter().enumerate() {
            score += i64::from(self.descending_tile_scores[i].raw()) * mult;
        }
        if tiles_played == RACK_SIZE {
            score += i64::from(self.bingo_bonus.raw());
        }
        let score_bound = Equity::from_raw(score as i32);
        let leave_map = &self.leave_map;
        let equity_bound = score_bound.saturating_add(static_eval::shadow_equity(
            self.tileset,
            &self.opp_rack,
            &|size| leave_map.best_leave_by_size(size),
            &self.descending_tile_scores,
            self.bag_count,
            self.rack_letter_count,
            tiles_played,
        ));
        (score_bound, equity_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::layout::BoardLayout;
    use crate::leaves::LeaveTable;
    use crate::lexicon::Lexicon;
    use crate::movegen::MoveGenArgs;
    use crate::rack::Rack;
    use crate::tileset::{Language, TileSet};
    use anyhow::Result;

    #[test]
    fn test_empty_board_anchor_bound_covers_best_play() -> Result<()> {
        let ts = TileSet::new(Language::EN);
        let lex = Lexicon::from_words(&["QUIRKED"], &ts)?;
        let leaves = LeaveTable::empty();
        let layout = BoardLayout::standard15();
        let mut game = Game::new(&ts, &layout, [&lex, &lex], [&leaves, &leaves], 0);
        game.set_known_rack(
            0,
            &Rack::from_letters(ts.size(), &ts.encode("QUIRKED")?),
        )?;
        let args = MoveGenArgs::default();
        let mut gen = Gen::new(&game, &args);
        gen.leave_map.init(&gen.rack.clone(), gen.leave_table);
        gen.shadow_scan();
        let anchor = gen.anchor_heap.extract_max().unwrap();
        assert_eq!((anchor.row, anchor.col), (7, 7));
        assert_eq!(anchor.dir as usize, BOARD_HORIZONTAL_DIRECTION);
        // 8D QUIRKED scores 112; the bound must not be below it.
        assert!(anchor.highest_possible_equity >= Equity::from_int(112));
        assert!(anchor.highest_possible_score >= Equity::from_int(112));
        Ok(())
    }

    #[test]
    fn test_extent_boundaries_respect_runs() -> Result<()> {
        let ts = TileSet::new(Language::EN);
        let lex = Lexicon::from_words(&["CAT", "CATS", "AT", "TA"], &ts)?;
        let leaves = LeaveTable::empty();
        let layout = BoardLayout::standard15();
        let mut game = Game::new(&ts, &layout, [&lex, &lex], [&leaves, &leaves], 0);
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        game.load_position(&rows, ["S", ""], [0, 0], 0, 0)?;
        let args = MoveGenArgs::default();
        let mut gen = Gen::new(&game, &args);
        gen.leave_map.init(&gen.rack.clone(), gen.leave_table);
        // Horizontal anchor on the T of CAT.
        gen.dir = BOARD_HORIZONTAL_DIRECTION;
        gen.lane = 7;
        let extents = gen.extents_for_anchor(8, -1);
        // Every extent must cover the whole CAT run: no extent may
        // start inside it.
        for extent in &extents {
            assert!(extent.left <= 6);
            assert_eq!(extent.playthrough_blocks, 1);
            assert_eq!(extent.playthrough.total(), 3);
        }
        // With a single tile on the rack the extent can reach one
        // square past the run on either side.
        assert!(extents.iter().any(|e| e.right == 9));
        Ok(())
    }
}
