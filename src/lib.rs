#![deny(clippy::wrong_pub_self_convention, clippy::used_underscore_binding,
   clippy::map_unwrap_or,
   clippy::int_plus_one, clippy::string_add_assign, clippy::if_not_else,
   clippy::invalid_upcast_comparisons,
   clippy::mutex_integer, clippy::mut_mut, clippy::items_after_statements,
   clippy::mem_forget, clippy::maybe_infinite_iter)]

//! A crossword board game engine for Rust.
//! <br>
//! This crate is the search and evaluation kernel for crossword-style
//! board games (the standard 15×15 game, the 21×21 super variant, and
//! anagram variants): move generation with exact scores and equities,
//! Monte-Carlo simulation of candidate plays, endgame solving, move
//! validation and rack inference.
//!
//! The engine reads four immutable artifacts that the caller builds
//! and owns: a [`Lexicon`] (a gaddag word automaton), a [`LeaveTable`]
//! (equity per kept multiset), a [`TileSet`] (the letter distribution)
//! and a [`BoardLayout`] (bonus squares, bricks and the start square).
//! A [`Game`] borrows the artifacts and owns the mutable position.
//!
//! # Basic usage
//! ```
//! use crossword_engine::{
//!     generate_moves, BoardLayout, Game, LeaveTable, Lexicon, MoveGenArgs, MoveList, TileSet,
//! };
//! # use crossword_engine::Error;
//! let tileset = TileSet::default();
//! let lexicon = Lexicon::from_words(&["VEX", "VORTEX"], &tileset)?;
//! let leaves = LeaveTable::empty();
//! let layout = BoardLayout::standard15();
//! let mut game = Game::new(&tileset, &layout, [&lexicon, &lexicon], [&leaves, &leaves], 42);
//! game.draw_starting_racks();
//! let mut moves = MoveList::new(64);
//! generate_moves(&game, &MoveGenArgs::default(), &mut moves);
//! moves.sort_by_equity();
//! assert!(moves.count() >= 1);
//! # Ok::<(), Error>(())
//! ```

mod anchor;
mod bag;
mod bit_rack;
mod board;
mod cross_set;
mod endgame;
mod equity;
mod error;
mod game;
mod infer;
mod layout;
mod leaves;
mod lexicon;
mod movegen;
mod moves;
mod rack;
mod sim;
mod static_eval;
mod stats;
mod thread_control;
mod tiles;
mod tileset;
mod validate;
mod win_pct;
mod wmp;

pub use crate::anchor::{Anchor, AnchorHeap};
pub use crate::bag::Bag;
pub use crate::bit_rack::BitRack;
pub use crate::board::{
    Board, Square, BOARD_HORIZONTAL_DIRECTION, BOARD_VERTICAL_DIRECTION,
};
pub use crate::cross_set::{generate_all_cross_sets, generate_cross_set};
pub use crate::endgame::{EndgameSolver, PVLine, ENDGAME_MAX_PLIES};
pub use crate::equity::{Equity, EQUITY_RESOLUTION};
pub use crate::error::Error;
pub use crate::game::{Game, GameEndReason, GamePlayer, Variant, DEFAULT_BINGO_BONUS};
pub use crate::infer::{infer_leaves, InferenceParams, InferenceResults, InferredLeave};
pub use crate::layout::BoardLayout;
pub use crate::leaves::{LeaveMap, LeaveTable};
pub use crate::lexicon::Lexicon;
pub use crate::movegen::{generate_moves, MoveGenArgs};
pub use crate::moves::{Move, MoveKind, MoveList, MoveRecordType, MoveSortType};
pub use crate::rack::{Rack, RACK_SIZE};
pub use crate::sim::{
    simulate, static_evaluation, SimParams, SimResults, SimmedPlay, StoppingCondition,
};
pub use crate::stats::Stat;
pub use crate::static_eval::OPENING_HOTSPOT_PENALTY;
pub use crate::thread_control::{ThreadControl, ThreadControlStatus};
pub use crate::tiles::MachineLetter;
pub use crate::tileset::{Language, TileSet};
pub use crate::validate::{validate_move, validate_moves, FormedWord, ValidatedMove};
pub use crate::win_pct::WinPct;
pub use crate::wmp::WordMap;
