//! A game position.
//!
//! The caller owns the artifacts (tile set, layout, lexicons, leave
//! tables, word maps); the position borrows them and owns only the
//! mutable state: board, bag, racks, scores and turn bookkeeping.
//! Cloning a position clones exactly that mutable state, which is how
//! simulation and endgame workers get their private copies.

use crate::bag::Bag;
use crate::board::Board;
use crate::cross_set::generate_all_cross_sets;
use crate::equity::Equity;
use crate::error::Error;
use crate::layout::BoardLayout;
use crate::leaves::LeaveTable;
use crate::lexicon::Lexicon;
use crate::moves::{Move, MoveKind};
use crate::rack::Rack;
use crate::tiles::{get_is_blanked, MachineLetter, PLAYED_THROUGH_MARKER};
use crate::tileset::TileSet;
use crate::wmp::WordMap;

/// Turns without a score that end the game.
pub const MAX_SCORELESS_TURNS: u32 = 6;

/// Standard bonus for playing the whole rack.
pub const DEFAULT_BINGO_BONUS: Equity = Equity::from_int(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Classic,
    /// Words are judged as letter multisets rather than spellings.
    WordSmog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEndReason {
    None,
    /// A player emptied their rack with the bag empty.
    Standard,
    /// Too many consecutive scoreless turns.
    ConsecutiveScorelessTurns,
}

/// One player's state and artifacts.
#[derive(Clone)]
pub struct GamePlayer<'a> {
    pub score: Equity,
    pub rack: Rack,
    pub lexicon: &'a Lexicon,
    pub leaves: &'a LeaveTable,
    pub word_map: Option<&'a WordMap>,
}

/// Mutable state snapshot used by play/unplay.
#[derive(Clone)]
struct Snapshot {
    board: Board,
    bag: Bag,
    racks: [Rack; 2],
    scores: [Equity; 2],
    on_turn: usize,
    consecutive_scoreless_turns: u32,
    end_reason: GameEndReason,
}

#[derive(Clone)]
pub struct Game<'a> {
    tileset: &'a TileSet,
    board: Board,
    bag: Bag,
    players: [GamePlayer<'a>; 2],
    on_turn: usize,
    consecutive_scoreless_turns: u32,
    bingo_bonus: Equity,
    variant: Variant,
    end_reason: GameEndReason,
    backups: Vec<Snapshot>,
}

impl<'a> Game<'a> {
    /// A fresh game with full bag and empty racks.
    pub fn new(
        tileset: &'a TileSet,
        layout: &BoardLayout,
        lexicons: [&'a Lexicon; 2],
        leaves: [&'a LeaveTable; 2],
        bag_seed: u64,
    ) -> Game<'a> {
        let board = Board::new(layout, tileset.size());
        let bag = Bag::full(tileset, bag_seed);
        let make_player = |i: usize| GamePlayer {
            score: Equity::ZERO,
            rack: Rack::new(tileset.size()),
            lexicon: lexicons[i],
            leaves: leaves[i],
            word_map: None,
        };
        Game {
            tileset,
            board,
            bag,
            players: [make_player(0), make_player(1)],
            on_turn: 0,
            consecutive_scoreless_turns: 0,
            bingo_bonus: DEFAULT_BINGO_BONUS,
            variant: Variant::Classic,
            end_reason: GameEndReason::None,
            backups: Vec::new(),
        }
    }

    pub fn with_bingo_bonus(mut self, bonus: Equity) -> Game<'a> {
        self.bingo_bonus = bonus;
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Game<'a> {
        self.variant = variant;
        self
    }

    pub fn with_word_maps(mut self, word_maps: [Option<&'a WordMap>; 2]) -> Game<'a> {
        for (player, wmp) in self.players.iter_mut().zip(word_maps.iter()) {
            player.word_map = *wmp;
        }
        self
    }

    pub fn tileset(&self) -> &'a TileSet {
        self.tileset
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn bag(&self) -> &Bag {
        &self.bag
    }

    pub fn bag_mut(&mut self) -> &mut Bag {
        &mut self.bag
    }

    pub fn player(&self, index: usize) -> &GamePlayer<'a> {
        &self.players[index]
    }

    pub fn player_mut(&mut self, index: usize) -> &mut GamePlayer<'a> {
        &mut self.players[index]
    }

    pub fn on_turn_index(&self) -> usize {
        self.on_turn
    }

    pub fn set_on_turn_index(&mut self, index: usize) -> Result<(), Error> {
        if index > 1 {
            return Err(Error::InvalidPlayerIndex(index));
        }
        self.on_turn = index;
        Ok(())
    }

    pub fn on_turn_player(&self) -> &GamePlayer<'a> {
        &self.players[self.on_turn]
    }

    pub fn opponent(&self) -> &GamePlayer<'a> {
        &self.players[1 - self.on_turn]
    }

    pub fn consecutive_scoreless_turns(&self) -> u32 {
        self.consecutive_scoreless_turns
    }

    pub fn bingo_bonus(&self) -> Equity {
        self.bingo_bonus
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn end_reason(&self) -> GameEndReason {
        self.end_reason
    }

    pub fn is_over(&self) -> bool {
        self.end_reason != GameEndReason::None
    }

    /// Spread from `player_index`'s point of view.
    pub fn spread(&self, player_index: usize) -> Equity {
        self.players[player_index].score - self.players[1 - player_index].score
    }

    pub fn lexicons_are_shared(&self) -> bool {
        std::ptr::eq(self.players[0].lexicon, self.players[1].lexicon)
    }

    /// Cross index for a player: distinct lexicons get distinct cross
    /// sets.
    pub fn cross_index(&self, player_index: usize) -> usize {
        usize::from(!self.lexicons_are_shared() && player_index == 1)
    }

    /// Recompute every cross set and extension set on the board.
    pub fn update_cross_sets(&mut self) {
        let shared = self.lexicons_are_shared();
        generate_all_cross_sets(
            &mut self.board,
            [self.players[0].lexicon, self.players[1].lexicon],
            self.tileset,
            shared,
        );
    }

    /// Draw both starting racks from the bag.
    pub fn draw_starting_racks(&mut self) {
        for i in 0..2 {
            let mut rack = std::mem::replace(&mut self.players[i].rack, Rack::new(0));
            self.bag.refill_rack(&mut rack);
            self.players[i].rack = rack;
        }
    }

    /// Give a player a known rack, drawing it from the bag.
    /// ## Errors
    /// If the rack is not available in the bag.
    pub fn set_known_rack(&mut self, player_index: usize, rack: &Rack) -> Result<(), Error> {
        let old = self.players[player_index].rack.clone();
        self.bag.add_rack(&old);
        self.bag.draw_rack(rack)?;
        self.players[player_index].rack = rack.clone();
        Ok(())
    }

    /// Load a position: board rows, racks, scores. Cross sets and
    /// anchors are recomputed; the bag is reduced by the tiles on the
    /// board and racks.
    #[allow(clippy::too_many_arguments)]
    pub fn load_position<S: AsRef<str>>(
        &mut self,
        rows: &[S],
        racks: [&str; 2],
        scores: [i32; 2],
        on_turn: usize,
        consecutive_scoreless_turns: u32,
    ) -> Result<(), Error> {
        self.board.set_letters_from_strings(self.tileset, rows)?;
        self.bag = Bag::full(self.tileset, 0);
        for row in 0..self.board.dim() {
            for col in 0..self.board.dim() {
                let letter = self.board.letter_at(row, col);
                if letter != crate::tiles::EMPTY_SQUARE_MARKER {
                    let natural = if get_is_blanked(letter) {
                        crate::tiles::BLANK_MACHINE_LETTER
                    } else {
                        letter
                    };
                    self.bag.draw_letter(natural)?;
                }
            }
        }
        for (i, rack_str) in racks.iter().enumerate() {
            let rack = Rack::from_letters(self.tileset.size(), &self.tileset.encode(rack_str)?);
            self.bag.draw_rack(&rack)?;
            self.players[i].rack = rack;
            self.players[i].score = Equity::from_int(scores[i]);
        }
        self.set_on_turn_index(on_turn)?;
        self.consecutive_scoreless_turns = consecutive_scoreless_turns;
        self.end_reason = GameEndReason::None;
        self.update_cross_sets();
        Ok(())
    }

    /// Save the mutable state so the next [`unplay_last_move`] can
    /// restore it.
    ///
    /// [`unplay_last_move`]: Game::unplay_last_move
    fn backup(&mut self) {
        self.backups.push(Snapshot {
            board: self.board.clone(),
            bag: self.bag.clone(),
            racks: [self.players[0].rack.clone(), self.players[1].rack.clone()],
            scores: [self.players[0].score, self.players[1].score],
            on_turn: self.on_turn,
            consecutive_scoreless_turns: self.consecutive_scoreless_turns,
            end_reason: self.end_reason,
        });
    }

    /// Undo the most recent backed-up move.
    pub fn unplay_last_move(&mut self) {
        let snapshot = self
            .backups
            .pop()
            .expect("unplay_last_move without a backed-up move");
        self.board = snapshot.board;
        self.bag = snapshot.bag;
        for i in 0..2 {
            self.players[i].rack = snapshot.racks[i].clone();
            self.players[i].score = snapshot.scores[i];
        }
        self.on_turn = snapshot.on_turn;
        self.consecutive_scoreless_turns = snapshot.consecutive_scoreless_turns;
        self.end_reason = snapshot.end_reason;
    }

    /// Apply a move for the on-turn player, refill the rack, advance
    /// the turn and settle end-of-game scoring. Set `backed_up` to make
    /// the move undoable.
    pub fn play_move(&mut self, mv: &Move, backed_up: bool) {
        debug_assert!(!self.is_over());
        if backed_up {
            self.backup();
        }
        let player_index = self.on_turn;
        match mv.kind {
            MoveKind::Pass => {
                self.consecutive_scoreless_turns += 1;
            }
            MoveKind::Exchange => {
                let exchanged =
                    Rack::from_letters(self.tileset.size(), &mv.tiles);
                let mut rack = std::mem::replace(
                    &mut self.players[player_index].rack,
                    Rack::new(0),
                );
                rack.subtract(&exchanged);
                self.bag.refill_rack(&mut rack);
                self.bag.add_rack(&exchanged);
                self.players[player_index].rack = rack;
                self.consecutive_scoreless_turns += 1;
            }
            MoveKind::Place => {
                let dim = self.board.dim();
                let (mut row, mut col) = (mv.row as usize, mv.col as usize);
                let horizontal =
                    mv.dir as usize == crate::board::BOARD_HORIZONTAL_DIRECTION;
                let mut placed: Vec<(usize, usize)> = Vec::new();
                for &tile in mv.tiles.iter() {
                    if tile != PLAYED_THROUGH_MARKER {
                        self.board.set_letter(row, col, tile);
                        placed.push((row, col));
                    }
                    if horizontal {
                        col += 1;
                    } else {
                        row += 1;
                    }
                }
                self.board.increment_tiles_played(u32::from(mv.tiles_played));
                let played: Vec<MachineLetter> = mv
                    .tiles
                    .iter()
                    .cloned()
                    .filter(|&t| t != PLAYED_THROUGH_MARKER)
                    .collect();
                self.players[player_index].rack.take_played(&played);
                self.players[player_index].score += mv.score;
                let mut rack = std::mem::replace(
                    &mut self.players[player_index].rack,
                    Rack::new(0),
                );
                self.bag.refill_rack(&mut rack);
                self.players[player_index].rack = rack;
                if mv.score == Equity::ZERO {
                    self.consecutive_scoreless_turns += 1;
                } else {
                    self.consecutive_scoreless_turns = 0;
                }
                // Anchors depend only on a square and its neighbors.
                for &(r, c) in &placed {
                    for dr in -1i32..=1 {
                        for dc in -1i32..=1 {
                            let (nr, nc) = (r as i32 + dr, c as i32 + dc);
                            if nr >= 0 && nc >= 0 && (nr as usize) < dim && (nc as usize) < dim {
                                self.board.update_anchors(nr as usize, nc as usize);
                            }
                        }
                    }
                }
                self.update_cross_sets();
                if self.players[player_index].rack.is_empty() && self.bag.is_empty() {
                    // Playing out earns twice the opponent's tiles.
                    let opp_score = self.players[1 - player_index]
                        .rack
                        .score(self.tileset);
                    self.players[player_index].score +=
                        Equity::from_raw(2 * opp_score.raw());
                    self.end_reason = GameEndReason::Standard;
                }
            }
        }
        if self.end_reason == GameEndReason::None
            && self.consecutive_scoreless_turns >= MAX_SCORELESS_TURNS
        {
            // Each player gives back their own rack.
            for i in 0..2 {
                let rack_score = self.players[i].rack.score(self.tileset);
                self.players[i].score -= rack_score;
            }
            self.end_reason = GameEndReason::ConsecutiveScorelessTurns;
        }
        self.on_turn = 1 - self.on_turn;
    }
}
