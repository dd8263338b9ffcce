//! Move generation.
//!
//! The classical two-phase traversal: from each anchor, extend leftward
//! over the gaddag placing rack tiles or reading through-tiles, switch
//! direction on the separator arc, then extend rightward, recording a
//! candidate at every accepting arc once at least one tile has been
//! placed. Anchors are consumed in descending upper-bound order so a
//! record-best run can stop early.

mod shadow;
mod wordmap_gen;

use crate::anchor::AnchorHeap;
use crate::board::{Board, BOARD_HORIZONTAL_DIRECTION, BOARD_VERTICAL_DIRECTION};
use crate::equity::Equity;
use crate::game::Game;
use crate::leaves::{LeaveMap, LeaveTable};
use crate::lexicon::{Lexicon, SEPARATION_MACHINE_LETTER};
use crate::moves::{
    Move, MoveKind, MoveList, MoveRecordType, MoveSortType, TileStrip, MOVE_MAX_TILES,
};
use crate::rack::{Rack, RACK_SIZE};
use crate::static_eval;
use crate::tiles::{
    get_blanked, get_unblanked, MachineLetter, BLANK_MACHINE_LETTER, PLAYED_THROUGH_MARKER,
};
use crate::tileset::TileSet;

/// Sentinel for "no previous anchor in this lane".
pub(crate) const NO_LAST_ANCHOR: u8 = u8::MAX;

#[derive(Debug, Clone, Copy)]
pub struct MoveGenArgs<'a> {
    pub record_type: MoveRecordType,
    pub sort_type: MoveSortType,
    /// Generate placements by word-map lookup instead of the gaddag
    /// recursion. Requires the on-turn player to have a word map.
    pub use_word_map: bool,
    /// Replaces the on-turn player's lexicon, e.g. with a pruned word
    /// list for endgame solving.
    pub override_lexicon: Option<&'a Lexicon>,
}

impl<'a> Default for MoveGenArgs<'a> {
    fn default() -> Self {
        MoveGenArgs {
            record_type: MoveRecordType::All,
            sort_type: MoveSortType::Equity,
            use_word_map: false,
            override_lexicon: None,
        }
    }
}

/// Generate all legal moves for the on-turn player into `move_list`.
/// The list is reset first and always receives at least a pass.
pub fn generate_moves(game: &Game, args: &MoveGenArgs, move_list: &mut MoveList) {
    move_list.reset();
    let mut gen = Gen::new(game, args);
    gen.run(move_list);
}

pub(crate) struct Gen<'a> {
    pub(crate) board: &'a Board,
    pub(crate) tileset: &'a TileSet,
    pub(crate) lexicon: &'a Lexicon,
    pub(crate) leave_table: &'a LeaveTable,
    pub(crate) word_map: Option<&'a crate::wmp::WordMap>,
    pub(crate) record_type: MoveRecordType,
    pub(crate) sort_type: MoveSortType,
    pub(crate) cross_index: usize,
    pub(crate) bag_count: usize,
    pub(crate) bingo_bonus: Equity,
    pub(crate) dim: usize,
    pub(crate) use_word_map: bool,

    pub(crate) rack: Rack,
    pub(crate) opp_rack: Rack,
    pub(crate) rack_letter_count: usize,
    pub(crate) descending_tile_scores: Vec<Equity>,
    pub(crate) leave_map: LeaveMap,
    pub(crate) anchor_heap: AnchorHeap,

    pub(crate) strip: [MachineLetter; MOVE_MAX_TILES],
    pub(crate) exchange_strip: [MachineLetter; RACK_SIZE],
    pub(crate) dir: usize,
    pub(crate) lane: usize,
    pub(crate) anchor_pos: usize,
    pub(crate) last_anchor_col: i32,
    pub(crate) tiles_played: usize,
    pub(crate) best_equity: Equity,
}

impl<'a> Gen<'a> {
    pub(crate) fn new(game: &'a Game<'_>, args: &MoveGenArgs<'a>) -> Gen<'a> {
        let player = game.on_turn_player();
        let rack = player.rack.clone();
        let rack_letter_count = rack.total() as usize;
        let mut descending_tile_scores: Vec<Equity> = rack
            .letters()
            .iter()
            .map(|&ml| game.tileset().score(ml))
            .collect();
        descending_tile_scores.sort_unstable_by(|a, b| b.cmp(a));
        Gen {
            board: game.board(),
            tileset: game.tileset(),
            lexicon: args.override_lexicon.unwrap_or(player.lexicon),
            leave_table: player.leaves,
            word_map: player.word_map,
            record_type: args.record_type,
            sort_type: args.sort_type,
            cross_index: game.cross_index(game.on_turn_index()),
            bag_count: game.bag().count(),
            bingo_bonus: game.bingo_bonus(),
            dim: game.board().dim(),
            use_word_map: args.use_word_map,
            opp_rack: game.opponent().rack.clone(),
            rack,
            rack_letter_count,
            descending_tile_scores,
            leave_map: LeaveMap::new(),
            anchor_heap: AnchorHeap::with_capacity(game.board().dim() * game.board().dim()),
            strip: [PLAYED_THROUGH_MARKER; MOVE_MAX_TILES],
            exchange_strip: [BLANK_MACHINE_LETTER; RACK_SIZE],
            dir: BOARD_HORIZONTAL_DIRECTION,
            lane: 0,
            anchor_pos: 0,
            last_anchor_col: -1,
            tiles_played: 0,
            best_equity: Equity::INITIAL,
        }
    }

    /// Lane-relative position to board coordinates.
    #[inline]
    pub(crate) fn coords(&self, pos: usize) -> (usize, usize) {
        if self.dir == BOARD_HORIZONTAL_DIRECTION {
            (self.lane, pos)
        } else {
            (pos, self.lane)
        }
    }

    pub(crate) fn run(&mut self, move_list: &mut MoveList) {
        // A pass is recorded first so that record-best always has a
        // fallback and any real move beats it.
        move_list.set_spare_as_pass();
        self.record_spare(move_list, Equity::PASS);

        if self.rack.is_empty() {
            return;
        }
        self.leave_map.init(&self.rack, self.leave_table);
        if self.bag_count >= RACK_SIZE {
            self.gen_exchanges(move_list, 1, 0);
        }
        self.shadow_scan();
        while let Some(anchor) = self.anchor_heap.extract_max() {
            if self.record_type == MoveRecordType::Best
                && !self.best_equity.is_sentinel()
                && anchor.highest_possible_equity <= self.best_equity
            {
                break;
            }
            self.dir = anchor.dir as usize;
            self.lane = if self.dir == BOARD_HORIZONTAL_DIRECTION {
                anchor.row as usize
            } else {
                anchor.col as usize
            };
            self.anchor_pos = if self.dir == BOARD_HORIZONTAL_DIRECTION {
                anchor.col as usize
            } else {
                anchor.row as usize
            };
            self.last_anchor_col = if anchor.last_anchor_col == NO_LAST_ANCHOR {
                -1
            } else {
                anchor.last_anchor_col as i32
            };
            if self.use_word_map && self.word_map.is_some() {
                self.wordmap_gen_anchor(move_list);
            } else {
                self.recursive_gen(
                    self.anchor_pos,
                    self.lexicon.root(),
                    self.anchor_pos,
                    self.anchor_pos,
                    move_list,
                );
            }
        }
    }

    fn take_from_rack(&mut self, ml: MachineLetter) {
        self.rack.take_letter(ml);
        self.leave_map.take_letter(ml, self.rack.count(ml));
        self.tiles_played += 1;
    }

    fn return_to_rack(&mut self, ml: MachineLetter) {
        self.leave_map.add_letter(ml, self.rack.count(ml));
        self.rack.add_letter(ml);
        self.tiles_played -= 1;
    }

    fn recursive_gen(
        &mut self,
        pos: usize,
        node: usize,
        leftstrip: usize,
        rightstrip: usize,
        move_list: &mut MoveList,
    ) {
        let (row, col) = self.coords(pos);
        let square = *self.board.square(row, col, self.dir, self.cross_index);
        if square.is_brick() {
            return;
        }
        if !square.is_empty() {
            let raw = get_unblanked(square.letter);
            if let Some((next, accepts)) = self.lexicon.arc(node, raw) {
                self.go_on(
                    pos,
                    square.letter,
                    true,
                    Some(next),
                    accepts,
                    leftstrip,
                    rightstrip,
                    move_list,
                );
            }
            return;
        }
        if self.rack.is_empty() {
            return;
        }
        let cross_set = square.cross_set;
        for ml in 1..=self.board.dist_size() as MachineLetter {
            if self.rack.count(ml) == 0 || cross_set & (1u64 << ml) == 0 {
                continue;
            }
            if let Some((next, accepts)) = self.lexicon.arc(node, ml) {
                self.take_from_rack(ml);
                self.go_on(pos, ml, false, Some(next), accepts, leftstrip, rightstrip, move_list);
                self.return_to_rack(ml);
            }
        }
        if self.rack.count(BLANK_MACHINE_LETTER) > 0 {
            let arcs: Vec<(MachineLetter, usize, bool)> = self
                .lexicon
                .arcs_of(node)
                .filter(|&(label, _, _, _)| {
                    label != SEPARATION_MACHINE_LETTER && cross_set & (1u64 << label) != 0
                })
                .map(|(label, target, accepts, _)| (label, target, accepts))
                .collect();
            for (label, target, accepts) in arcs {
                self.take_from_rack(BLANK_MACHINE_LETTER);
                self.go_on(
                    pos,
                    get_blanked(label),
                    false,
                    Some(target),
                    accepts,
                    leftstrip,
                    rightstrip,
                    move_list,
                );
                self.return_to_rack(BLANK_MACHINE_LETTER);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn go_on(
        &mut self,
        pos: usize,
        letter: MachineLetter,
        is_through: bool,
        node: Option<usize>,
        accepts: bool,
        leftstrip: usize,
        rightstrip: usize,
        move_list: &mut MoveList,
    ) {
        if pos <= self.anchor_pos {
            self.strip[pos] = if is_through { PLAYED_THROUGH_MARKER } else { letter };
            let leftstrip = pos;
            let no_letter_left = pos == 0 || {
                let (r, c) = self.coords(pos - 1);
                self.board.is_empty_or_bricked(r, c)
            };
            if accepts && no_letter_left && self.tiles_played > 0 {
                self.record_play(leftstrip, rightstrip, move_list);
            }
            if let Some(node) = node {
                if pos > 0 && (pos as i32 - 1) != self.last_anchor_col {
                    self.recursive_gen(pos - 1, node, leftstrip, rightstrip, move_list);
                }
                if no_letter_left && self.anchor_pos + 1 < self.dim {
                    if let Some(sep) = self.lexicon.separator_arc(node) {
                        self.recursive_gen(
                            self.anchor_pos + 1,
                            sep,
                            leftstrip,
                            rightstrip,
                            move_list,
                        );
                    }
                }
            }
        } else {
            self.strip[pos] = if is_through { PLAYED_THROUGH_MARKER } else { letter };
            let rightstrip = pos;
            let no_letter_right = pos + 1 == self.dim || {
                let (r, c) = self.coords(pos + 1);
                self.board.is_empty_or_bricked(r, c)
            };
            if accepts && no_letter_right && self.tiles_played > 0 {
                self.record_play(leftstrip, rightstrip, move_list);
            }
            if let Some(node) = node {
                if pos + 1 < self.dim {
                    self.recursive_gen(pos + 1, node, leftstrip, rightstrip, move_list);
                }
            }
        }
    }

    /// Score the strip span against the board. Shared with the
    /// validator so generated and validated scores agree by
    /// construction.
    pub(crate) fn score_strip(
        board: &Board,
        tileset: &TileSet,
        strip: &[MachineLetter],
        dir: usize,
        cross_index: usize,
        lane: usize,
        leftstrip: usize,
        tiles_played: usize,
        bingo_bonus: Equity,
    ) -> Equity {
        let mut main_score = 0i64;
        let mut word_multiplier = 1i64;
        let mut cross_total = 0i64;
        for (i, &tile) in strip.iter().enumerate() {
            let pos = leftstrip + i;
            let (row, col) = if dir == BOARD_HORIZONTAL_DIRECTION {
                (lane, pos)
            } else {
                (pos, lane)
            };
            let square = board.square(row, col, dir, cross_index);
            if tile == PLAYED_THROUGH_MARKER {
                main_score += i64::from(tileset.score(square.letter).raw());
            } else {
                let letter_mult = i64::from(square.letter_multiplier());
                let word_mult = i64::from(square.word_multiplier());
                let tile_score = i64::from(tileset.score(tile).raw());
                main_score += tile_score * letter_mult;
                word_multiplier *= word_mult;
                if square.is_cross_word {
                    cross_total += (i64::from(square.cross_score.raw())
                        + tile_score * letter_mult)
                        * word_mult;
                }
            }
        }
        let mut total = main_score * word_multiplier + cross_total;
        if tiles_played == RACK_SIZE {
            total += i64::from(bingo_bonus.raw());
        }
        Equity::from_raw(total as i32)
    }

    fn record_play(&mut self, leftstrip: usize, rightstrip: usize, move_list: &mut MoveList) {
        // A single tile whose square also forms a horizontal word is
        // recorded by the horizontal pass only.
        if self.dir == BOARD_VERTICAL_DIRECTION && self.tiles_played == 1 {
            let played_pos = (leftstrip..=rightstrip)
                .find(|&pos| self.strip[pos] != PLAYED_THROUGH_MARKER)
                .expect("one tile was played");
            let (row, col) = self.coords(played_pos);
            if self.board.is_cross_word(row, col, BOARD_VERTICAL_DIRECTION) {
                return;
            }
        }
        let score = Gen::score_strip(
            self.board,
            self.tileset,
            &self.strip[leftstrip..=rightstrip],
            self.dir,
            self.cross_index,
            self.lane,
            leftstrip,
            self.tiles_played,
            self.bingo_bonus,
        );
        let (row, col) = self.coords(leftstrip);
        let mut tiles = TileStrip::new();
        for pos in leftstrip..=rightstrip {
            tiles.push(self.strip[pos]);
        }
        let mv = Move {
            kind: MoveKind::Place,
            row: row as u8,
            col: col as u8,
            dir: self.dir as u8,
            tiles,
            tiles_played: self.tiles_played as u8,
            score,
            equity: Equity::UNDEFINED,
        };
        let equity = match self.sort_type {
            MoveSortType::Score => score,
            MoveSortType::Equity => static_eval::move_equity_with_leave_value(
                self.tileset,
                &mv,
                self.board,
                &self.rack,
                &self.opp_rack,
                self.bag_count,
                self.leave_map.current_value(),
            ),
        };
        *move_list.spare_mut() = mv;
        self.record_spare(move_list, equity);
    }

    pub(crate) fn record_spare(&mut self, move_list: &mut MoveList, equity: Equity) {
        match self.record_type {
            MoveRecordType::All => move_list.insert_spare(equity),
            MoveRecordType::Best => move_list.insert_spare_as_best(equity),
            MoveRecordType::WithinEpsilon(epsilon) => {
                self.best_equity =
                    move_list.insert_spare_within_epsilon(equity, self.best_equity, epsilon);
            }
        }
        if equity > self.best_equity {
            self.best_equity = equity;
        }
    }

    /// Enumerate every distinct sub-multiset of the rack as an exchange.
    fn gen_exchanges(&mut self, move_list: &mut MoveList, ml: MachineLetter, exchange_len: usize) {
        let dist_size = self.board.dist_size() as MachineLetter;
        // Letter 0 (the blank) is visited last so the recursion covers
        // 1..=dist_size then 0.
        if ml > dist_size + 1 {
            if exchange_len > 0 {
                self.record_exchange(move_list, exchange_len);
            }
            return;
        }
        let letter = if ml == dist_size + 1 {
            BLANK_MACHINE_LETTER
        } else {
            ml
        };
        let available = self.rack.count(letter);
        self.gen_exchanges(move_list, ml + 1, exchange_len);
        for taken in 1..=available {
            self.rack.take_letter(letter);
            self.leave_map.take_letter(letter, self.rack.count(letter));
            self.exchange_strip[exchange_len + usize::from(taken) - 1] = letter;
            self.gen_exchanges(move_list, ml + 1, exchange_len + usize::from(taken));
        }
        while self.rack.count(letter) < available {
            self.leave_map.add_letter(letter, self.rack.count(letter));
            self.rack.add_letter(letter);
        }
    }

    fn record_exchange(&mut self, move_list: &mut MoveList, exchange_len: usize) {
        let mut tiles = TileStrip::new();
        for i in 0..exchange_len {
            tiles.push(self.exchange_strip[i]);
        }
        let mv = Move {
            kind: MoveKind::Exchange,
            row: 0,
            col: 0,
            dir: 0,
            tiles,
            tiles_played: exchange_len as u8,
            score: Equity::ZERO,
            equity: Equity::UNDEFINED,
        };
        let equity = match self.sort_type {
            MoveSortType::Score => Equity::ZERO,
            MoveSortType::Equity => static_eval::move_equity_with_leave_value(
                self.tileset,
                &mv,
                self.board,
                &self.rack,
                &self.opp_rack,
                self.bag_count,
                self.leave_map.current_value(),
            ),
        };
        *move_list.spare_mut() = mv;
        self.record_spare(move_list, equity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoardLayout;
    use crate::tileset::{Language, TileSet};
    use crate::wmp::WordMap;
    use anyhow::Result;

    struct Artifacts {
        tileset: TileSet,
        layout: BoardLayout,
        lexicon: Lexicon,
        leaves: LeaveTable,
        word_map: WordMap,
    }

    fn artifacts(words: &[&str]) -> Artifacts {
        let tileset = TileSet::new(Language::EN);
        let lexicon = Lexicon::from_words(words, &tileset).unwrap();
        let word_map = WordMap::from_words(words, &tileset).unwrap();
        Artifacts {
            layout: BoardLayout::standard15(),
            leaves: LeaveTable::empty(),
            tileset,
            lexicon,
            word_map,
        }
    }

    fn game_with_rack<'a>(art: &'a Artifacts, rack: &str) -> Game<'a> {
        let mut game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            0,
        );
        game.set_known_rack(
            0,
            &Rack::from_letters(art.tileset.size(), &art.tileset.encode(rack).unwrap()),
        )
        .unwrap();
        game
    }

    fn all_moves(game: &Game) -> MoveList {
        let mut list = MoveList::new(4096);
        generate_moves(
            game,
            &MoveGenArgs {
                record_type: MoveRecordType::All,
                sort_type: MoveSortType::Equity,
                ..MoveGenArgs::default()
            },
            &mut list,
        );
        list.sort_by_equity();
        list
    }

    #[test]
    fn test_opening_vortex() {
        // Empty board, rack EORSTVX: the X wants the double letter at
        // 8L, so the top play is VORTEX at 8G for 48.
        let art = artifacts(&["VORTEX", "VEX"]);
        let game = game_with_rack(&art, "EORSTVX");
        let list = all_moves(&game);
        let top = list.get(0);
        assert_eq!(top.kind, MoveKind::Place);
        assert_eq!(top.row, 7);
        assert_eq!(top.col, 6);
        assert_eq!(top.dir as usize, BOARD_HORIZONTAL_DIRECTION);
        assert_eq!(art.tileset.decode(&top.tiles), "VORTEX");
        assert_eq!(top.score, Equity::from_int(48));
        // Empty leave table: equity is exactly the score.
        assert_eq!(top.equity, Equity::from_int(48));
    }

    #[test]
    fn test_opening_quirked_equity() {
        // QUIRKED at 8D scores 112; the E lands on a hotspot column so
        // the equity carries one opening vowel penalty.
        let art = artifacts(&["QUIRKED"]);
        let game = game_with_rack(&art, "QUIRKED");
        let list = all_moves(&game);
        let top = list.get(0);
        assert_eq!(top.row, 7);
        assert_eq!(top.col, 3);
        assert_eq!(top.score, Equity::from_int(112));
        assert_eq!(
            top.equity,
            Equity::from_int(112) + crate::static_eval::OPENING_HOTSPOT_PENALTY
        );
    }

    #[test]
    fn test_record_best_matches_record_all_top() {
        let art = artifacts(&["VORTEX", "VEX", "OX", "EX", "TO", "SO", "SOX"]);
        let game = game_with_rack(&art, "EORSTVX");
        let all = all_moves(&game);
        let mut best = MoveList::new(1);
        generate_moves(
            &game,
            &MoveGenArgs {
                record_type: MoveRecordType::Best,
                sort_type: MoveSortType::Equity,
                ..MoveGenArgs::default()
            },
            &mut best,
        );
        assert_eq!(best.count(), 1);
        assert_eq!(best.get(0), all.get(0));
    }

    #[test]
    fn test_record_within_epsilon_contains_near_best() {
        let art = artifacts(&["VORTEX", "VEX"]);
        let game = game_with_rack(&art, "EORSTVX");
        let all = all_moves(&game);
        let best_equity = all.get(0).equity;
        let epsilon = Equity::from_int(10);
        let mut within = MoveList::new(4096);
        generate_moves(
            &game,
            &MoveGenArgs {
                record_type: MoveRecordType::WithinEpsilon(epsilon),
                sort_type: MoveSortType::Equity,
                ..MoveGenArgs::default()
            },
            &mut within,
        );
        within.sort_by_equity();
        assert!(within.count() >= 1);
        for mv in within.moves() {
            assert!(mv.equity >= best_equity.saturating_add(Equity::ZERO - epsilon));
        }
        // Every record-all move inside the band appears.
        let expected = all
            .moves()
            .iter()
            .filter(|m| m.equity >= best_equity.saturating_add(Equity::ZERO - epsilon))
            .count();
        assert_eq!(within.count(), expected);
    }

    #[test]
    fn test_exchanges_generated_only_with_full_bag() {
        let art = artifacts(&["VORTEX"]);
        let mut game = game_with_rack(&art, "ABCDEFG");
        let list = all_moves(&game);
        // Distinct letters: every nonempty subset is one exchange.
        let exchanges = list
            .moves()
            .iter()
            .filter(|m| m.kind == MoveKind::Exchange)
            .count();
        assert_eq!(exchanges, 127);
        // Drain the bag below a rackful: no exchanges, pass remains.
        while game.bag().count() >= RACK_SIZE {
            game.bag_mut().draw_random();
        }
        let list = all_moves(&game);
        assert_eq!(
            list.moves()
                .iter()
                .filter(|m| m.kind == MoveKind::Exchange)
                .count(),
            0
        );
        assert!(list.moves().iter().any(|m| m.kind == MoveKind::Pass));
    }

    #[test]
    fn test_single_tile_plays_are_unique() -> Result<()> {
        // S under CAT forms CATS horizontally and TAS vertically would
        // be the same physical tile twice; exactly one record.
        let art = artifacts(&["CAT", "CATS", "AT", "TA", "TS"]);
        let mut game = game_with_rack(&art, "S");
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        game.load_position(&rows, ["S", ""], [0, 0], 0, 0)?;
        let list = all_moves(&game);
        let mut seen = std::collections::HashSet::new();
        for mv in list.moves() {
            if mv.kind != MoveKind::Place {
                continue;
            }
            // Identify the physical placement: the squares that got a
            // new tile and which tile.
            let mut placement = Vec::new();
            for (i, &tile) in mv.tiles.iter().enumerate() {
                if tile == crate::tiles::PLAYED_THROUGH_MARKER {
                    continue;
                }
                let (row, col) = if mv.dir as usize == BOARD_HORIZONTAL_DIRECTION {
                    (mv.row as usize, mv.col as usize + i)
                } else {
                    (mv.row as usize + i, mv.col as usize)
                };
                placement.push((row, col, tile));
            }
            assert!(
                seen.insert(placement.clone()),
                "duplicate placement {:?}",
                placement
            );
        }
        Ok(())
    }

    #[test]
    fn test_generator_equivalence_with_word_map() -> Result<()> {
        // The recursive generator and the word-map generator must
        // produce identical move lists.
        let art = artifacts(&[
            "CAT", "CATS", "SCAT", "AT", "TA", "TAS", "ACTS", "CAST", "STARS", "RAT", "ARTS",
            "STAR", "TSAR",
        ]);
        let mut game = game_with_rack(&art, "SATR?");
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        game.load_position(&rows, ["SATR?", ""], [0, 0], 0, 0)?;
        game = game.with_word_maps([Some(&art.word_map), Some(&art.word_map)]);
        let recursive = all_moves(&game);
        let mut wordmap = MoveList::new(4096);
        generate_moves(
            &game,
            &MoveGenArgs {
                record_type: MoveRecordType::All,
                sort_type: MoveSortType::Equity,
                use_word_map: true,
                ..MoveGenArgs::default()
            },
            &mut wordmap,
        );
        wordmap.sort_by_equity();
        assert_eq!(recursive.count(), wordmap.count());
        for (a, b) in recursive.moves().iter().zip(wordmap.moves()) {
            assert_eq!(a, b);
        }
        Ok(())
    }

    #[test]
    fn test_oxyphenbutazone() -> Result<()> {
        // The classic triple-triple-triple through five separate
        // letter groups down column A.
        let words = [
            "OXYPHENBUTAZONE",
            "OPACIFYING",
            "XIS",
            "PREQUALIFIED",
            "BRAINWASHING",
            "AWAKENERS",
            "ZONETIME",
            "EJACULATING",
        ];
        let art = artifacts(&words);
        let mut game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            0,
        );
        let rows = [
            ".PACIFYING.....",
            ".IS............",
            "YE.............",
            ".REQUALIFIED...",
            "H.L............",
            "EDS............",
            "NO...T.........",
            ".RAINWASHING...",
            "UM...O.........",
            "T..E.O.........",
            ".WAKEnERS......",
            ".OnETIME.......",
            "OOT..E.B.......",
            "N......U.......",
            ".JACULATING....",
        ];
        game.load_position(&rows, ["ABEOPXZ", ""], [0, 0], 0, 0)?;
        let list = all_moves(&game);
        let top = list.get(0);
        assert_eq!(top.kind, MoveKind::Place);
        assert_eq!((top.row, top.col), (0, 0));
        assert_eq!(top.dir as usize, crate::board::BOARD_VERTICAL_DIRECTION);
        assert_eq!(top.score, Equity::from_int(1780));
        assert_eq!(top.equity, Equity::from_int(1780));
        assert_eq!(usize::from(top.tiles_played), RACK_SIZE);

        // The shadow bound for that anchor must dominate the play.
        let args = MoveGenArgs::default();
        let mut gen = Gen::new(&game, &args);
        gen.leave_map.init(&gen.rack.clone(), gen.leave_table);
        gen.shadow_scan();
        let mut bound = Equity::INITIAL;
        while let Some(anchor) = gen.anchor_heap.extract_max() {
            if anchor.highest_possible_equity > bound {
                bound = anchor.highest_possible_equity;
            }
        }
        assert!(bound >= Equity::from_int(1780));

        // And the validator agrees on the score.
        let vm = crate::validate::validate_move(&game, 0, "A1.OXYPHENBUTAZONE", true, false)?;
        assert_eq!(vm.mv.score, Equity::from_int(1780));
        Ok(())
    }

    #[test]
    fn test_blank_plays_score_zero_for_the_blank() {
        let art = artifacts(&["CAT"]);
        let game = game_with_rack(&art, "CA?");
        let list = all_moves(&game);
        let blanked: Vec<&Move> = list
            .moves()
            .iter()
            .filter(|m| {
                m.kind == MoveKind::Place
                    && m.tiles.iter().any(|&t| crate::tiles::get_is_blanked(t))
            })
            .collect();
        assert!(!blanked.is_empty());
        // CAT with a blank T at 8F..8H: C 3 + A 1 + blank 0, doubled.
        let natural_top = list.get(0);
        assert!(natural_top
            .tiles
            .iter()
            .all(|&t| !crate::tiles::get_is_blanked(t)));
        for mv in blanked {
            assert!(mv.score < natural_top.score);
        }
    }

    #[test]
    fn test_empty_rack_generates_only_pass() {
        let art = artifacts(&["CAT"]);
        let game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            0,
        );
        let mut list = MoveList::new(16);
        generate_moves(&game, &MoveGenArgs::default(), &mut list);
        assert_eq!(list.count(), 1);
        assert_eq!(list.get(0).kind, MoveKind::Pass);
        assert_eq!(list.get(0).equity, Equity::PASS);
    }

    #[test]
    fn test_score_sort_orders_by_score() {
        let art = artifacts(&["VORTEX", "VEX"]);
        let game = game_with_rack(&art, "EORSTVX");
        let mut list = MoveList::new(4096);
        generate_moves(
            &game,
            &MoveGenArgs {
                record_type: MoveRecordType::All,
                sort_type: MoveSortType::Score,
                ..MoveGenArgs::default()
            },
            &mut list,
        );
        list.sort_by_score();
        let scores: Vec<i32> = list
            .moves()
            .iter()
            .map(|m| m.score.raw() / crate::equity::EQUITY_RESOLUTION)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(scores[0], 48);
    }
}
