//! Cross-set, cross-score and extension-set computation.
//!
//! For every empty square, direction and cross index the board caches
//! which letters would form a legal perpendicular word on that square
//! and what the perpendicular tiles already score. The word-map path
//! additionally caches which letters can extend an adjacent run in the
//! main-word direction through the square.

use crate::board::{
    cross_set_with_blank, trivial_cross_set, Board, BOARD_HORIZONTAL_DIRECTION,
};
use crate::equity::Equity;
use crate::lexicon::Lexicon;
use crate::tiles::{get_unblanked, MachineLetter};
use crate::tileset::TileSet;

/// Step along the perpendicular of `dir`: rows for horizontal lanes,
/// columns for vertical ones.
#[inline]
fn perp_step(dir: usize, row: usize, col: usize, delta: i32) -> (i32, i32) {
    if dir == BOARD_HORIZONTAL_DIRECTION {
        (row as i32 + delta, col as i32)
    } else {
        (row as i32, col as i32 + delta)
    }
}

/// Step along `dir`'s own lane.
#[inline]
fn lane_step(dir: usize, row: usize, col: usize, delta: i32) -> (i32, i32) {
    if dir == BOARD_HORIZONTAL_DIRECTION {
        (row as i32, col as i32 + delta)
    } else {
        (row as i32 + delta, col as i32)
    }
}

fn collect_run(
    board: &Board,
    dir: usize,
    row: usize,
    col: usize,
    delta: i32,
    step: fn(usize, usize, usize, i32) -> (i32, i32),
) -> Vec<MachineLetter> {
    let mut letters = Vec::new();
    let mut d = delta;
    loop {
        let (r, c) = step(dir, row, col, d);
        if !board.is_in_bounds(r, c) || board.is_empty_or_bricked(r as usize, c as usize) {
            break;
        }
        letters.push(board.letter_at(r as usize, c as usize));
        d += delta;
    }
    if delta < 0 {
        letters.reverse();
    }
    letters
}

/// Recompute the cross set and cross score of one square for one
/// direction and cross index.
pub fn generate_cross_set(
    board: &mut Board,
    lexicon: &Lexicon,
    tileset: &TileSet,
    row: usize,
    col: usize,
    dir: usize,
    ci: usize,
) {
    if board.is_nonempty_or_bricked(row, col) {
        board.set_cross_set(row, col, dir, ci, 0);
        board.set_cross_score(row, col, dir, ci, Equity::ZERO);
        return;
    }
    let before = collect_run(board, dir, row, col, -1, perp_step);
    let after = collect_run(board, dir, row, col, 1, perp_step);
    if before.is_empty() && after.is_empty() {
        board.set_cross_set(row, col, dir, ci, trivial_cross_set(board.dist_size()));
        board.set_cross_score(row, col, dir, ci, Equity::ZERO);
        return;
    }
    let mut cross_score = Equity::ZERO;
    for &ml in before.iter().chain(after.iter()) {
        cross_score += tileset.score(ml);
    }
    let mut word: Vec<MachineLetter> = Vec::with_capacity(before.len() + after.len() + 1);
    word.extend(before.iter().map(|&ml| get_unblanked(ml)));
    let probe_index = word.len();
    word.push(0);
    word.extend(after.iter().map(|&ml| get_unblanked(ml)));
    let mut cross_set = 0u64;
    for letter in 1..=board.dist_size() as MachineLetter {
        word[probe_index] = letter;
        if lexicon.accepts_word(&word) {
            cross_set |= 1u64 << letter;
        }
    }
    board.set_cross_set(row, col, dir, ci, cross_set_with_blank(cross_set));
    board.set_cross_score(row, col, dir, ci, cross_score);
}

/// Recompute the extension sets of one square for one direction and
/// cross index. The left set holds the letters that can precede the run
/// to the square's right; the right set holds the letters that can
/// follow the run to its left when that run starts the word.
pub fn generate_extension_sets(
    board: &mut Board,
    lexicon: &Lexicon,
    row: usize,
    col: usize,
    dir: usize,
    ci: usize,
) {
    let trivial = trivial_cross_set(board.dist_size());
    if board.is_nonempty_or_bricked(row, col) {
        board.set_left_extension_set(row, col, dir, ci, 0);
        board.set_right_extension_set(row, col, dir, ci, 0);
        return;
    }
    let run_right = collect_run(board, dir, row, col, 1, lane_step);
    let left_ext = if run_right.is_empty() {
        trivial
    } else {
        // Letters preceding the run: outgoing letter arcs of the gaddag
        // state reached by reading the run in reverse.
        match walk_reversed(lexicon, &run_right) {
            Some(node) => cross_set_with_blank(letter_arcs(lexicon, node)),
            None => 0,
        }
    };
    board.set_left_extension_set(row, col, dir, ci, left_ext);

    let run_left = collect_run(board, dir, row, col, -1, lane_step);
    let right_ext = if run_left.is_empty() {
        trivial
    } else {
        // Letters following the run when it starts the word: arcs past
        // the separator of the same reversed-run state.
        match walk_reversed(lexicon, &run_left).and_then(|node| lexicon.separator_arc(node)) {
            Some(node) => cross_set_with_blank(letter_arcs(lexicon, node)),
            None => 0,
        }
    };
    board.set_right_extension_set(row, col, dir, ci, right_ext);
}

fn walk_reversed(lexicon: &Lexicon, run: &[MachineLetter]) -> Option<usize> {
    let mut node = lexicon.root();
    for &ml in run.iter().rev() {
        let (next, _) = lexicon.arc(node, get_unblanked(ml))?;
        node = next;
    }
    Some(node)
}

fn letter_arcs(lexicon: &Lexicon, node: usize) -> u64 {
    let mut set = 0u64;
    for (label, _, _, _) in lexicon.arcs_of(node) {
        if label != crate::lexicon::SEPARATION_MACHINE_LETTER {
            set |= 1u64 << label;
        }
    }
    set
}

/// Recompute cross data for every square that could have been affected
/// by a change to the board: squares adjacent to at least one tile.
/// Isolated squares get the trivial set without touching the automaton.
pub fn generate_all_cross_sets(
    board: &mut Board,
    lexicons: [&Lexicon; 2],
    tileset: &TileSet,
    lexicons_are_shared: bool,
) {
    let trivial = trivial_cross_set(board.dist_size());
    let ci_count = if lexicons_are_shared { 1 } else { 2 };
    for row in 0..board.dim() {
        for col in 0..board.dim() {
            if board.is_nonempty_or_bricked(row, col) {
                for dir in 0..2 {
                    for ci in 0..2 {
                        board.set_cross_set(row, col, dir, ci, 0);
                        board.set_cross_score(row, col, dir, ci, Equity::ZERO);
                        board.set_left_extension_set(row, col, dir, ci, 0);
                        board.set_right_extension_set(row, col, dir, ci, 0);
                    }
                }
                continue;
            }
            if board.are_all_adjacent_squares_empty(row, col) {
                for dir in 0..2 {
                    for ci in 0..2 {
                        board.set_cross_set(row, col, dir, ci, trivial);
                        board.set_cross_score(row, col, dir, ci, Equity::ZERO);
                        board.set_left_extension_set(row, col, dir, ci, trivial);
                        board.set_right_extension_set(row, col, dir, ci, trivial);
                    }
                }
                continue;
            }
            for dir in 0..2 {
                for ci in 0..ci_count {
                    generate_cross_set(board, lexicons[ci], tileset, row, col, dir, ci);
                    generate_extension_sets(board, lexicons[ci], row, col, dir, ci);
                }
                if lexicons_are_shared {
                    let cs = board.cross_set(row, col, dir, 0);
                    let score = board.cross_score(row, col, dir, 0);
                    let left = board.left_extension_set(row, col, dir, 0);
                    let right = board.right_extension_set(row, col, dir, 0);
                    board.set_cross_set(row, col, dir, 1, cs);
                    board.set_cross_score(row, col, dir, 1, score);
                    board.set_left_extension_set(row, col, dir, 1, left);
                    board.set_right_extension_set(row, col, dir, 1, right);
                }
            }
        }
    }
}
