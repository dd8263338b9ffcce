//! Static move evaluation.
//!
//! Converts a fully scored move plus position context into equity:
//! `score + leave value + adjustments`, where the adjustments depend on
//! the phase of the game (opening, pre-endgame, endgame).

use crate::board::Board;
use crate::equity::Equity;
use crate::moves::{Move, MoveKind};
use crate::rack::{Rack, RACK_SIZE};
use crate::tiles::{get_is_blanked, get_unblanked, PLAYED_THROUGH_MARKER};
use crate::tileset::TileSet;

/// Penalty per opening-hotspot vowel, in equity units (-0.7 points).
pub const OPENING_HOTSPOT_PENALTY: Equity = Equity::from_raw(-700);

pub const NON_OUTPLAY_LEAVE_SCORE_MULTIPLIER_PENALTY: i32 = 2;

pub const NON_OUTPLAY_CONSTANT_PENALTY: Equity = Equity::from_int(10);

pub const PEG_ADJUST_VALUES_LENGTH: usize = RACK_SIZE * 2 - 1;

/// Pre-endgame adjustments indexed by `bag + rack − tiles played`.
/// Zero until trained values exist.
pub const PEG_ADJUST_VALUES: [Equity; PEG_ADJUST_VALUES_LENGTH] = [Equity::ZERO; PEG_ADJUST_VALUES_LENGTH];

/// Opening-move penalty: vowels placed on hotspot lanes next to the
/// start square cost equity.
pub fn placement_adjustment(board: &Board, tileset: &TileSet, mv: &Move) -> Equity {
    let mut penalty = Equity::ZERO;
    let dir = mv.dir as usize;
    for (i, &tile) in mv.tiles.iter().enumerate() {
        if tile == PLAYED_THROUGH_MARKER {
            continue;
        }
        let ml = if get_is_blanked(tile) {
            get_unblanked(tile)
        } else {
            tile
        };
        if tileset.is_vowel(ml) {
            let lane_pos = if dir == crate::board::BOARD_HORIZONTAL_DIRECTION {
                mv.col as usize + i
            } else {
                mv.row as usize + i
            };
            penalty += board.opening_move_penalty(lane_pos, dir);
        }
    }
    penalty
}

/// The play keeps tiles back with the bag empty: penalized by the kept
/// score, doubled, plus a constant.
pub fn endgame_nonoutplay_adjustment(player_leave_score: Equity) -> Equity {
    Equity::from_raw(
        -player_leave_score.raw() * NON_OUTPLAY_LEAVE_SCORE_MULTIPLIER_PENALTY
            - NON_OUTPLAY_CONSTANT_PENALTY.raw(),
    )
}

/// The play goes out: gains twice the opponent's remaining tiles.
pub fn endgame_outplay_adjustment(opponent_rack_score: Equity) -> Equity {
    Equity::from_raw(2 * opponent_rack_score.raw())
}

pub fn standard_endgame_adjustment(
    tileset: &TileSet,
    player_leave: &Rack,
    opp_rack: &Rack,
) -> Equity {
    if !player_leave.is_empty() {
        endgame_nonoutplay_adjustment(player_leave.score(tileset))
    } else {
        endgame_outplay_adjustment(opp_rack.score(tileset))
    }
}

/// Endgame adjustment for shadow bounds: the cheapest rack we could be
/// left with, since the shadow does not know which tiles it plays.
fn shadow_endgame_adjustment(
    tileset: &TileSet,
    opp_rack: &Rack,
    descending_tile_scores: &[Equity],
    rack_letter_count: usize,
    tiles_played: usize,
) -> Equity {
    if rack_letter_count > tiles_played {
        let mut lowest_possible = Equity::ZERO;
        for &score in descending_tile_scores
            .iter()
            .take(rack_letter_count)
            .skip(tiles_played)
        {
            lowest_possible += score;
        }
        endgame_nonoutplay_adjustment(lowest_possible)
    } else {
        endgame_outplay_adjustment(opp_rack.score(tileset))
    }
}

/// Upper-bound equity adjustment for a shadow play of `tiles_played`
/// tiles: the best possible leave plus phase adjustments.
#[allow(clippy::too_many_arguments)]
pub fn shadow_equity(
    tileset: &TileSet,
    opp_rack: &Rack,
    best_leaves: &dyn Fn(usize) -> Equity,
    descending_tile_scores: &[Equity],
    bag_count: usize,
    rack_letter_count: usize,
    tiles_played: usize,
) -> Equity {
    let mut equity = Equity::ZERO;
    if bag_count > 0 {
        equity += best_leaves(rack_letter_count - tiles_played);
        let bag_plus_rack_size = bag_count + RACK_SIZE - tiles_played.min(bag_count + RACK_SIZE);
        if bag_plus_rack_size < PEG_ADJUST_VALUES_LENGTH {
            equity += PEG_ADJUST_VALUES[bag_plus_rack_size];
        }
    } else {
        equity += shadow_endgame_adjustment(
            tileset,
            opp_rack,
            descending_tile_scores,
            rack_letter_count,
            tiles_played,
        );
    }
    equity
}

/// Equity of a fully scored move given the leave value. Assumes every
/// field of the move except equity is set.
pub fn move_equity_with_leave_value(
    tileset: &TileSet,
    mv: &Move,
    board: &Board,
    player_leave: &Rack,
    opp_rack: &Rack,
    bag_count: usize,
    leave_value: Equity,
) -> Equity {
    let mut adjustments = Equity::ZERO;
    if board.tiles_played() == 0 && mv.kind == MoveKind::Place {
        adjustments += placement_adjustment(board, tileset, mv);
    }
    let mut leave_adjustment = Equity::ZERO;
    if bag_count > 0 {
        leave_adjustment = leave_value;
        let tiles_played = usize::from(mv.tiles_played).min(bag_count + RACK_SIZE);
        let bag_plus_rack_size = bag_count + RACK_SIZE - tiles_played;
        if bag_plus_rack_size < PEG_ADJUST_VALUES_LENGTH {
            adjustments += PEG_ADJUST_VALUES[bag_plus_rack_size];
        }
    } else {
        adjustments += standard_endgame_adjustment(tileset, player_leave, opp_rack);
    }
    mv.score + leave_adjustment + adjustments
}
