//! Rack inference.
//!
//! Given a position and an observed play, enumerate the leaves the
//! player could have held: every multiset of unseen tiles that, added
//! to the played tiles, forms a rack for which the observed play is
//! within an equity margin of the best available play. Each surviving
//! leave is weighted by the number of ways it can be drawn from the
//! unseen pool.

use crate::bit_rack::BitRack;
use crate::equity::Equity;
use crate::error::Error;
use crate::game::Game;
use crate::moves::{Move, MoveKind, MoveList, MoveRecordType, MoveSortType};
use crate::movegen::{generate_moves, MoveGenArgs};
use crate::rack::{Rack, RACK_SIZE};
use crate::tiles::{MachineLetter, BLANK_MACHINE_LETTER, PLAYED_THROUGH_MARKER};

#[derive(Debug, Clone)]
pub struct InferenceParams {
    /// The observed play must be within this much equity of the best
    /// play for the rack to be considered plausible.
    pub equity_epsilon: Equity,
}

impl Default for InferenceParams {
    fn default() -> Self {
        InferenceParams {
            equity_epsilon: Equity::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredLeave {
    pub leave: BitRack,
    /// Number of distinct draws of this leave from the unseen pool.
    pub weight: u64,
}

#[derive(Debug, Clone, Default)]
pub struct InferenceResults {
    pub leaves: Vec<InferredLeave>,
    pub total_weight: u64,
}

impl InferenceResults {
    /// Total weight of leaves containing `ml`.
    pub fn weight_with_letter(&self, ml: MachineLetter) -> u64 {
        self.leaves
            .iter()
            .filter(|l| l.leave.count(ml) > 0)
            .map(|l| l.weight)
            .sum()
    }
}

fn choose(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result = 1u64;
    for i in 0..k {
        result = result * (n - i) / (i + 1);
    }
    result
}

/// The tiles an observed move consumed from the rack.
fn played_tiles(mv: &Move) -> Vec<MachineLetter> {
    mv.tiles
        .iter()
        .cloned()
        .filter(|&ml| ml != PLAYED_THROUGH_MARKER)
        .map(|ml| {
            if crate::tiles::get_is_blanked(ml) {
                BLANK_MACHINE_LETTER
            } else {
                ml
            }
        })
        .collect()
}

/// Infer the possible leaves behind `observed`, played by
/// `player_index` from the position `game` (the position before the
/// move, with that player's tiles unseen in the bag).
///
/// ## Errors
/// If the played tiles are not available in the bag.
pub fn infer_leaves(
    game: &Game,
    player_index: usize,
    observed: &Move,
    params: &InferenceParams,
) -> Result<InferenceResults, Error> {
    if player_index > 1 {
        return Err(Error::InvalidPlayerIndex(player_index));
    }
    let tileset = game.tileset();
    let played = played_tiles(observed);
    if played.is_empty() && observed.kind == MoveKind::Place {
        return Err(Error::TilesNotInRack);
    }
    let leave_size = RACK_SIZE.saturating_sub(played.len());

    // The unseen pool: the bag minus the played tiles.
    let mut pool = Rack::new(tileset.size());
    for ml in 0..=tileset.size() as MachineLetter {
        for _ in 0..game.bag().count_of(ml) {
            pool.add_letter(ml);
        }
    }
    for &ml in &game.player(player_index).rack.letters() {
        pool.add_letter(ml);
    }
    let played_rack = Rack::from_letters(tileset.size(), &played);
    if !pool.contains(&played_rack) {
        return Err(Error::RackNotInBag);
    }
    pool.subtract(&played_rack);

    let mut results = InferenceResults::default();
    let mut current = Rack::new(tileset.size());
    enumerate_leaves(
        game,
        player_index,
        observed,
        params,
        &played_rack,
        &pool,
        leave_size,
        0,
        &mut current,
        &mut results,
    )?;
    results
        .leaves
        .sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.leave.letters().cmp(&b.leave.letters())));
    Ok(results)
}

#[allow(clippy::too_many_arguments)]
fn enumerate_leaves(
    game: &Game,
    player_index: usize,
    observed: &Move,
    params: &InferenceParams,
    played: &Rack,
    pool: &Rack,
    remaining: usize,
    letter: MachineLetter,
    current: &mut Rack,
    results: &mut InferenceResults,
) -> Result<(), Error> {
    if remaining == 0 {
        if let Some(weight) = evaluate_leave(game, player_index, observed, params, played, pool, current)? {
            results.leaves.push(InferredLeave {
                leave: BitRack::from_rack(current),
                weight,
            });
            results.total_weight += weight;
        }
        return Ok(());
    }
    if letter as usize > game.tileset().size() {
        return Ok(());
    }
    let available = usize::from(pool.count(letter));
    for take in 0..=available.min(remaining) {
        for _ in 0..take {
            current.add_letter(letter);
        }
        enumerate_leaves(
            game,
            player_index,
            observed,
            params,
            played,
            pool,
            remaining - take,
            letter + 1,
            current,
            results,
        )?;
        for _ in 0..take {
            current.take_letter(letter);
        }
    }
    Ok(())
}

/// Test one leave: is the observed play within the margin of the best
/// play for `played + leave`? Returns the draw weight when plausible.
fn evaluate_leave(
    game: &Game,
    player_index: usize,
    observed: &Move,
    params: &InferenceParams,
    played: &Rack,
    pool: &Rack,
    leave: &Rack,
) -> Result<Option<u64>, Error> {
    let mut g = game.clone();
    g.set_on_turn_index(player_index)?;
    let mut full_rack = played.clone();
    full_rack.add_all(leave);
    g.set_known_rack(player_index, &full_rack)?;

    let mut list = MoveList::new(4096);
    let args = MoveGenArgs {
        record_type: MoveRecordType::All,
        sort_type: MoveSortType::Equity,
        ..MoveGenArgs::default()
    };
    generate_moves(&g, &args, &mut list);
    let mut best = Equity::INITIAL;
    let mut observed_equity = None;
    for mv in list.moves() {
        if mv.equity > best {
            best = mv.equity;
        }
        if mv.kind == observed.kind
            && mv.row == observed.row
            && mv.col == observed.col
            && mv.dir == observed.dir
            && mv.tiles[..] == observed.tiles[..]
        {
            observed_equity = Some(mv.equity);
        }
    }
    let observed_equity = match observed_equity {
        Some(equity) => equity,
        None => return Ok(None),
    };
    if observed_equity.is_sentinel()
        || best.saturating_add(Equity::ZERO - params.equity_epsilon) > observed_equity
    {
        return Ok(None);
    }
    let mut weight = 1u64;
    for ml in 0..=game.tileset().size() as MachineLetter {
        let taken = leave.count(ml);
        if taken > 0 {
            weight *= choose(u64::from(pool.count(ml)), u64::from(taken));
        }
    }
    Ok(Some(weight))
}
