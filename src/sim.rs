//! Monte-Carlo simulation of candidate plays.
//!
//! Workers are plain OS threads. They claim iteration indices from a
//! shared atomic counter and derive each iteration's RNG from
//! `mix(seed, iteration)`, so the set of sampled rollouts depends only
//! on the seed. Samples are buffered per play and folded into Welford
//! stats in iteration order at deterministic milestones; pruning and
//! stopping decisions read folded stats only. The result: bit-identical
//! output for a fixed seed at any thread count.

use crate::error::Error;
use crate::game::Game;
use crate::moves::{Move, MoveKind, MoveList, MoveRecordType, MoveSortType};
use crate::movegen::{generate_moves, MoveGenArgs};
use crate::rack::{Rack, RACK_SIZE};
use crate::stats::Stat;
use crate::thread_control::{ThreadControl, ThreadControlStatus};
use crate::tiles::MachineLetter;
use crate::win_pct::WinPct;
use log::trace;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

const MAX_SIM_ITERATIONS: usize = 1 << 20;
const MAX_SIM_PLIES: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoppingCondition {
    None,
    P95,
    P99,
    P999,
}

impl StoppingCondition {
    fn z_value(self) -> Option<f64> {
        match self {
            StoppingCondition::None => None,
            StoppingCondition::P95 => Some(1.645),
            StoppingCondition::P99 => Some(2.326),
            StoppingCondition::P999 => Some(3.090),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimParams {
    /// Rollout depth beyond the candidate move.
    pub plies: usize,
    pub max_iterations: usize,
    pub stopping_condition: StoppingCondition,
    /// Completed-iteration interval between stopping checks.
    pub check_interval: usize,
    pub known_opponent_rack: Option<Rack>,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            plies: 2,
            max_iterations: 1000,
            stopping_condition: StoppingCondition::None,
            check_interval: 64,
            known_opponent_rack: None,
        }
    }
}

/// One candidate with its accumulated statistics.
#[derive(Debug, Clone)]
pub struct SimmedPlay {
    pub mv: Move,
    pub play_id: usize,
    pub score_stats: Vec<Stat>,
    pub bingo_stats: Vec<Stat>,
    pub equity_stat: Stat,
    pub win_pct_stat: Stat,
    pub is_pruned: bool,
    pub last_move_chosen: bool,
}

#[derive(Debug, Clone)]
pub struct SimResults {
    pub plays: Vec<SimmedPlay>,
    pub iteration_count: usize,
    pub node_count: u64,
    pub max_plies: usize,
    pub seed: u64,
    pub stopping_condition: StoppingCondition,
}

impl SimResults {
    /// Final ranking: win rate, then mean equity, then the move's
    /// natural order.
    pub fn sort_by_win_rate(&mut self) {
        self.plays.sort_by(|a, b| {
            b.win_pct_stat
                .mean()
                .partial_cmp(&a.win_pct_stat.mean())
                .unwrap_or(Ordering::Equal)
                .then(
                    b.equity_stat
                        .mean()
                        .partial_cmp(&a.equity_stat.mean())
                        .unwrap_or(Ordering::Equal),
                )
                .then_with(|| a.mv.natural_cmp(&b.mv))
        });
    }
}

/// Evaluate a position statically: generate, sort by equity, and
/// return the ranked list. The control object is returned to idle.
pub fn static_evaluation(game: &Game, control: &ThreadControl, capacity: usize) -> MoveList {
    control.unhalt();
    let mut list = MoveList::new(capacity);
    let args = MoveGenArgs {
        record_type: MoveRecordType::All,
        sort_type: MoveSortType::Equity,
        ..MoveGenArgs::default()
    };
    generate_moves(game, &args, &mut list);
    list.sort_by_equity();
    control.set_status(ThreadControlStatus::Idle);
    list
}

/// One iteration's observations for one play.
#[derive(Debug, Clone)]
struct IterSample {
    equity: f64,
    win_pct: f64,
    scores: Vec<i32>,
    bingos: Vec<bool>,
    nodes: u64,
}

#[derive(Debug, Clone)]
struct FoldedPlay {
    equity: Stat,
    win_pct: Stat,
    scores: Vec<Stat>,
    bingos: Vec<Stat>,
    nodes: u64,
}

impl FoldedPlay {
    fn new(plies: usize) -> FoldedPlay {
        FoldedPlay {
            equity: Stat::new(),
            win_pct: Stat::new(),
            scores: vec![Stat::new(); plies],
            bingos: vec![Stat::new(); plies],
            nodes: 0,
        }
    }

    fn fold(&mut self, sample: &IterSample) {
        self.equity.push(sample.equity, 1);
        self.win_pct.push(sample.win_pct, 1);
        for (stat, &score) in self.scores.iter_mut().zip(sample.scores.iter()) {
            stat.push(f64::from(score), 1);
        }
        for (stat, &bingo) in self.bingos.iter_mut().zip(sample.bingos.iter()) {
            stat.push(if bingo { 1.0 } else { 0.0 }, 1);
        }
        self.nodes += sample.nodes;
    }
}

/// Fold-and-prune state, guarded by one mutex. Milestones advance with
/// the largest contiguous prefix of completed iterations, so every
/// decision is a pure function of the seed.
struct FoldState {
    completed: Vec<bool>,
    complete_prefix: usize,
    cursor: usize,
    folded: Vec<FoldedPlay>,
    pruned_at: Vec<Option<usize>>,
    last_checked: usize,
    stopped_at: Option<usize>,
}

struct SharedSim {
    iteration_counter: AtomicUsize,
    samples: Vec<Mutex<Vec<Option<IterSample>>>>,
    fold: Mutex<FoldState>,
}

const UNINITIALIZED_SIMILARITY: i8 = -1;
const PLAYS_DISTINCT: i8 = 0;
const PLAYS_SIMILAR: i8 = 1;
const PLAYS_IDENTICAL: i8 = 2;

/// Two plays are similar when they are strategically interchangeable:
/// same squares, same direction, same tiles modulo blank designation,
/// and the same rack leave afterwards.
fn plays_are_similar(game: &Game, a: &Move, b: &Move) -> bool {
    if a.kind != b.kind {
        return false;
    }
    match a.kind {
        MoveKind::Pass => true,
        MoveKind::Exchange => {
            let dist = game.tileset().size();
            Rack::from_letters(dist, &a.tiles) == Rack::from_letters(dist, &b.tiles)
        }
        MoveKind::Place => {
            if (a.row, a.col, a.dir) != (b.row, b.col, b.dir)
                || a.tiles.len() != b.tiles.len()
            {
                return false;
            }
            let unblank = |tiles: &[MachineLetter]| -> Vec<MachineLetter> {
                tiles.iter().map(|&t| crate::tiles::get_unblanked(t)).collect()
            };
            if unblank(&a.tiles) != unblank(&b.tiles) {
                return false;
            }
            // Same leave afterwards.
            let mut leave_a = game.on_turn_player().rack.clone();
            let mut leave_b = leave_a.clone();
            let played =
                |tiles: &[MachineLetter]| -> Vec<MachineLetter> {
                    tiles
                        .iter()
                        .cloned()
                        .filter(|&t| t != crate::tiles::PLAYED_THROUGH_MARKER)
                        .collect()
                };
            leave_a.take_played(&played(&a.tiles));
            leave_b.take_played(&played(&b.tiles));
            leave_a == leave_b
        }
    }
}

fn mix_seed(seed: u64, iteration: u64) -> u64 {
    // splitmix64 over the seed and iteration index.
    let mut z = seed ^ iteration.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run Monte-Carlo rollouts of `candidates` from `game`.
///
/// ## Errors
/// If the candidate list is empty or a parameter is out of range.
pub fn simulate(
    game: &Game,
    candidates: &[Move],
    params: &SimParams,
    control: &ThreadControl,
    win_pct: &WinPct,
) -> Result<SimResults, Error> {
    if candidates.is_empty() {
        return Err(Error::NoCandidateMoves);
    }
    if params.plies == 0 || params.plies > MAX_SIM_PLIES {
        return Err(Error::InvalidSimParameter(format!(
            "plies must be in 1..={}",
            MAX_SIM_PLIES
        )));
    }
    if params.max_iterations == 0 || params.max_iterations > MAX_SIM_ITERATIONS {
        return Err(Error::InvalidSimParameter(format!(
            "max_iterations must be in 1..={}",
            MAX_SIM_ITERATIONS
        )));
    }
    if params.check_interval == 0 {
        return Err(Error::InvalidSimParameter(String::from(
            "check_interval must be positive",
        )));
    }
    control.unhalt();
    control.set_status(ThreadControlStatus::Started);
    control.record_start_time();

    let num_plays = candidates.len();
    let mut pruned_at: Vec<Option<usize>> = vec![None; num_plays];

    // The similarity cache is filled pairwise; when two plays merge the
    // later-ranked one is pruned before any iteration runs.
    let mut similarity = vec![UNINITIALIZED_SIMILARITY; num_plays * num_plays];
    for i in 0..num_plays {
        similarity[i * num_plays + i] = PLAYS_IDENTICAL;
    }
    for i in 0..num_plays {
        if pruned_at[i].is_some() {
            continue;
        }
        for j in (i + 1)..num_plays {
            if pruned_at[j].is_some()
                || similarity[i * num_plays + j] != UNINITIALIZED_SIMILARITY
            {
                continue;
            }
            let similar = plays_are_similar(game, &candidates[i], &candidates[j]);
            let value = if similar { PLAYS_SIMILAR } else { PLAYS_DISTINCT };
            similarity[i * num_plays + j] = value;
            similarity[j * num_plays + i] = value;
            if similar {
                pruned_at[j] = Some(0);
            }
        }
    }

    let shared = SharedSim {
        iteration_counter: AtomicUsize::new(0),
        samples: (0..num_plays)
            .map(|_| Mutex::new(vec![None; params.max_iterations]))
            .collect(),
        fold: Mutex::new(FoldState {
            completed: vec![false; params.max_iterations],
            complete_prefix: 0,
            cursor: 0,
            folded: (0..num_plays).map(|_| FoldedPlay::new(params.plies)).collect(),
            pruned_at,
            last_checked: 0,
            stopped_at: None,
        }),
    };

    let threads = control.number_of_threads();
    std::thread::scope(|scope| {
        for thread_index in 0..threads {
            let shared = &shared;
            let params = params;
            let game = game;
            let candidates = candidates;
            let win_pct = win_pct;
            scope.spawn(move || {
                sim_worker(
                    thread_index,
                    game,
                    candidates,
                    params,
                    control,
                    win_pct,
                    shared,
                );
            });
        }
    });

    let halted = control.is_halt_requested();
    let mut fold = shared.fold.into_inner().unwrap();
    // Fold everything decidable: up to the stop milestone, or to the
    // complete prefix when the run ended by exhaustion or halt.
    let final_limit = fold.stopped_at.unwrap_or(fold.complete_prefix);
    fold_to(&mut fold, &shared.samples, final_limit);

    let mut plays: Vec<SimmedPlay> = Vec::with_capacity(num_plays);
    let mut node_count = 0u64;
    for (play_id, folded) in fold.folded.iter().enumerate() {
        node_count += folded.nodes;
        plays.push(SimmedPlay {
            mv: candidates[play_id].clone(),
            play_id,
            score_stats: folded.scores.clone(),
            bingo_stats: folded.bingos.clone(),
            equity_stat: folded.equity.clone(),
            win_pct_stat: folded.win_pct.clone(),
            is_pruned: fold.pruned_at[play_id].is_some(),
            last_move_chosen: false,
        });
    }
    let mut results = SimResults {
        plays,
        iteration_count: fold.cursor,
        node_count,
        max_plies: params.plies,
        seed: control.seed(),
        stopping_condition: params.stopping_condition,
    };
    results.sort_by_win_rate();
    if let Some(first) = results.plays.first_mut() {
        first.last_move_chosen = true;
    }
    if !halted {
        control.set_status(ThreadControlStatus::Finished);
    }
    Ok(results)
}

#[allow(clippy::too_many_arguments)]
fn sim_worker(
    thread_index: usize,
    game: &Game,
    candidates: &[Move],
    params: &SimParams,
    control: &ThreadControl,
    win_pct: &WinPct,
    shared: &SharedSim,
) {
    loop {
        if control.is_halt_requested() {
            break;
        }
        {
            let fold = shared.fold.lock().unwrap();
            if fold.stopped_at.is_some() {
                break;
            }
        }
        let iteration = shared
            .iteration_counter
            .fetch_add(1, AtomicOrdering::SeqCst);
        if iteration >= params.max_iterations {
            break;
        }
        let skip_below: Vec<Option<usize>> =
            shared.fold.lock().unwrap().pruned_at.clone();
        for (play_id, candidate) in candidates.iter().enumerate() {
            if let Some(milestone) = skip_below[play_id] {
                // Iterations before the prune milestone still count;
                // later ones are abandoned work.
                if iteration >= milestone {
                    continue;
                }
            }
            let sample =
                sim_single_iteration(game, candidate, iteration, control.seed(), params, win_pct);
            shared.samples[play_id].lock().unwrap()[iteration] = Some(sample);
        }
        let mut fold = shared.fold.lock().unwrap();
        fold.completed[iteration] = true;
        while fold.complete_prefix < params.max_iterations
            && fold.completed[fold.complete_prefix]
        {
            fold.complete_prefix += 1;
        }
        let milestone = fold.complete_prefix - fold.complete_prefix % params.check_interval;
        if milestone > fold.last_checked {
            fold.last_checked = milestone;
            fold_to(&mut fold, &shared.samples, milestone);
            run_stopping_check(&mut fold, params, milestone);
        }
        if fold.complete_prefix >= params.max_iterations {
            break;
        }
    }
    trace!("sim worker {} exiting", thread_index);
}

/// Fold samples in iteration order up to `limit` (exclusive).
fn fold_to(fold: &mut FoldState, samples: &[Mutex<Vec<Option<IterSample>>>], limit: usize) {
    while fold.cursor < limit {
        let iteration = fold.cursor;
        for (play_id, play_samples) in samples.iter().enumerate() {
            if let Some(pruned) = fold.pruned_at[play_id] {
                if iteration >= pruned {
                    continue;
                }
            }
            let guard = play_samples.lock().unwrap();
            if let Some(sample) = &guard[iteration] {
                fold.folded[play_id].fold(sample);
            }
        }
        fold.cursor += 1;
    }
}

/// Prune candidates that are significantly worse than every
/// higher-ranked survivor; stop when one candidate remains.
fn run_stopping_check(fold: &mut FoldState, params: &SimParams, milestone: usize) {
    let z_crit = match params.stopping_condition.z_value() {
        Some(z) => z,
        None => return,
    };
    let mut ranking: Vec<usize> = (0..fold.folded.len())
        .filter(|&i| fold.pruned_at[i].is_none())
        .collect();
    ranking.sort_by(|&a, &b| {
        fold.folded[b]
            .win_pct
            .mean()
            .partial_cmp(&fold.folded[a].win_pct.mean())
            .unwrap_or(Ordering::Equal)
            .then(
                fold.folded[b]
                    .equity
                    .mean()
                    .partial_cmp(&fold.folded[a].equity.mean())
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.cmp(&b))
    });
    for rank in (1..ranking.len()).rev() {
        let candidate = ranking[rank];
        let mut rejected_by_all = true;
        for &better in &ranking[..rank] {
            if fold.pruned_at[better].is_some() {
                continue;
            }
            let a = &fold.folded[better].win_pct;
            let b = &fold.folded[candidate].win_pct;
            if a.weight() == 0 || b.weight() == 0 {
                rejected_by_all = false;
                break;
            }
            let variance_term =
                a.variance() / a.weight() as f64 + b.variance() / b.weight() as f64;
            let z = if variance_term <= 0.0 {
                if a.mean() > b.mean() {
                    f64::INFINITY
                } else {
                    0.0
                }
            } else {
                (a.mean() - b.mean()) / variance_term.sqrt()
            };
            if z <= z_crit {
                rejected_by_all = false;
                break;
            }
        }
        if rejected_by_all {
            fold.pruned_at[candidate] = Some(milestone);
        }
    }
    let survivors = fold
        .pruned_at
        .iter()
        .filter(|pruned| pruned.is_none())
        .count();
    if survivors <= 1 {
        fold.stopped_at = Some(milestone);
    }
}

/// One rollout: play the candidate, roll the position forward with
/// top-equity replies, and read off the leaf value.
fn sim_single_iteration(
    game: &Game,
    candidate: &Move,
    iteration: usize,
    seed: u64,
    params: &SimParams,
    win_pct: &WinPct,
) -> IterSample {
    let mut g = game.clone();
    let initial_player = g.on_turn_index();
    let opponent_index = 1 - initial_player;
    g.bag_mut().seed(mix_seed(seed, iteration as u64));
    // Redraw the opponent's rack: either the known rack or a random
    // one of the same size.
    let opp_rack_size = {
        let total = g.player(opponent_index).rack.total();
        if total == 0 {
            RACK_SIZE as u8
        } else {
            total
        }
    };
    let old_opp_rack = g.player(opponent_index).rack.clone();
    g.bag_mut().add_rack(&old_opp_rack);
    g.player_mut(opponent_index).rack.clear();
    match &params.known_opponent_rack {
        Some(known) => {
            // A known rack that is not available leaves the draw
            // random; the caller validated it beforehand.
            let mut rack = known.clone();
            if g.bag_mut().draw_rack(&rack).is_err() {
                rack.clear();
                for _ in 0..opp_rack_size {
                    match g.bag_mut().draw_random() {
                        Some(ml) => rack.add_letter(ml),
                        None => break,
                    }
                }
            }
            g.player_mut(opponent_index).rack = rack;
        }
        None => {
            let mut rack = Rack::new(g.tileset().size());
            for _ in 0..opp_rack_size {
                match g.bag_mut().draw_random() {
                    Some(ml) => rack.add_letter(ml),
                    None => break,
                }
            }
            g.player_mut(opponent_index).rack = rack;
        }
    }
    g.play_move(candidate, false);

    let mut scores = Vec::with_capacity(params.plies);
    let mut bingos = Vec::with_capacity(params.plies);
    let mut nodes = 0u64;
    let mut list = MoveList::new(1);
    let args = MoveGenArgs {
        record_type: MoveRecordType::Best,
        sort_type: MoveSortType::Equity,
        ..MoveGenArgs::default()
    };
    for _ in 0..params.plies {
        if g.is_over() {
            scores.push(0);
            bingos.push(false);
            continue;
        }
        generate_moves(&g, &args, &mut list);
        nodes += 1;
        let best = list.get(0).clone();
        scores.push(best.score.raw() / crate::equity::EQUITY_RESOLUTION);
        bingos.push(
            best.kind == MoveKind::Place && usize::from(best.tiles_played) == RACK_SIZE,
        );
        g.play_move(&best, false);
    }

    // Leaf value: spread from the initial player's view, adjusted by
    // the side to move's leave (the game's own end scoring already
    // applies when it ended).
    let mut leaf = f64::from(g.spread(initial_player).raw())
        / f64::from(crate::equity::EQUITY_RESOLUTION);
    if !g.is_over() {
        let stm = g.on_turn_index();
        let stm_leave = g
            .player(stm)
            .leaves
            .value_of_rack(&g.player(stm).rack);
        let adjustment = f64::from(stm_leave.raw()) / f64::from(crate::equity::EQUITY_RESOLUTION);
        if stm == initial_player {
            leaf += adjustment;
        } else {
            leaf -= adjustment;
        }
    }
    let unseen = g.bag().count() + g.player(1 - initial_player).rack.total() as usize;
    let win = if g.is_over() {
        if leaf > 0.0 {
            1.0
        } else if leaf < 0.0 {
            0.0
        } else {
            0.5
        }
    } else {
        f64::from(win_pct.get(leaf.round() as i32, unseen.max(1)))
    };
    IterSample {
        equity: leaf,
        win_pct: win,
        scores,
        bingos,
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoardLayout;
    use crate::leaves::LeaveTable;
    use crate::lexicon::Lexicon;
    use crate::tileset::{Language, TileSet};
    use anyhow::Result;

    struct Artifacts {
        tileset: TileSet,
        layout: BoardLayout,
        lexicon: Lexicon,
        leaves: LeaveTable,
        win_pct: WinPct,
    }

    fn artifacts(words: &[&str]) -> Artifacts {
        let tileset = TileSet::new(Language::EN);
        let lexicon = Lexicon::from_words(words, &tileset).unwrap();
        Artifacts {
            layout: BoardLayout::standard15(),
            leaves: LeaveTable::empty(),
            win_pct: WinPct::synthetic(),
            tileset,
            lexicon,
        }
    }

    fn opening_game<'a>(art: &'a Artifacts) -> Game<'a> {
        let mut game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            17,
        );
        game.set_known_rack(
            0,
            &Rack::from_letters(
                art.tileset.size(),
                &art.tileset.encode("EORSTVX").unwrap(),
            ),
        )
        .unwrap();
        game
    }

    fn candidates(game: &Game, count: usize) -> Vec<Move> {
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
        list.moves().iter().take(count).cloned().collect()
    }

    #[test]
    fn test_static_evaluation_returns_control_to_idle() {
        let art = artifacts(&["VORTEX", "VEX"]);
        let game = opening_game(&art);
        let tc = ThreadControl::new(2, 7);
        let list = static_evaluation(&game, &tc, 64);
        assert!(list.count() > 1);
        assert_eq!(tc.status(), ThreadControlStatus::Idle);
    }

    #[test]
    fn test_param_validation() {
        let art = artifacts(&["VORTEX"]);
        let game = opening_game(&art);
        let tc = ThreadControl::new(1, 0);
        let wp = &art.win_pct;
        assert!(matches!(
            simulate(&game, &[], &SimParams::default(), &tc, wp),
            Err(Error::NoCandidateMoves)
        ));
        let moves = candidates(&game, 1);
        let bad = SimParams {
            plies: 0,
            ..SimParams::default()
        };
        assert!(matches!(
            simulate(&game, &moves, &bad, &tc, wp),
            Err(Error::InvalidSimParameter(_))
        ));
    }

    fn run_sim(art: &Artifacts, threads: usize, seed: u64, iterations: usize) -> SimResults {
        let game = opening_game(art);
        let moves = candidates(&game, 3);
        let tc = ThreadControl::new(threads, seed);
        let params = SimParams {
            plies: 2,
            max_iterations: iterations,
            stopping_condition: StoppingCondition::None,
            check_interval: 8,
            known_opponent_rack: None,
        };
        simulate(&game, &moves, &params, &tc, &art.win_pct).unwrap()
    }

    #[test]
    fn test_deterministic_across_thread_counts() {
        let art = artifacts(&["VORTEX", "VEX", "OX", "EX", "SO", "TO"]);
        let baseline = run_sim(&art, 1, 99, 24);
        for &threads in &[2usize, 4, 8] {
            let other = run_sim(&art, threads, 99, 24);
            assert_eq!(other.iteration_count, baseline.iteration_count);
            assert_eq!(other.node_count, baseline.node_count);
            assert_eq!(other.plays.len(), baseline.plays.len());
            for (a, b) in baseline.plays.iter().zip(other.plays.iter()) {
                assert_eq!(a.mv, b.mv);
                assert_eq!(
                    a.win_pct_stat.mean().to_bits(),
                    b.win_pct_stat.mean().to_bits()
                );
                assert_eq!(
                    a.equity_stat.mean().to_bits(),
                    b.equity_stat.mean().to_bits()
                );
                assert_eq!(a.win_pct_stat.weight(), b.win_pct_stat.weight());
            }
        }
    }

    #[test]
    fn test_seed_changes_results() {
        let art = artifacts(&["VORTEX", "VEX", "OX", "EX", "SO", "TO"]);
        let a = run_sim(&art, 2, 1, 24);
        let b = run_sim(&art, 2, 2, 24);
        // Same candidates, different rollouts.
        let ae: Vec<u64> = a.plays.iter().map(|p| p.equity_stat.mean().to_bits()).collect();
        let be: Vec<u64> = b.plays.iter().map(|p| p.equity_stat.mean().to_bits()).collect();
        assert_ne!(ae, be);
    }

    #[test]
    fn test_similar_plays_are_merged() -> Result<()> {
        let art = artifacts(&["VORTEX", "VEX"]);
        let game = opening_game(&art);
        let moves = candidates(&game, 1);
        let duplicated = vec![moves[0].clone(), moves[0].clone()];
        let tc = ThreadControl::new(1, 5);
        let params = SimParams {
            plies: 1,
            max_iterations: 8,
            check_interval: 4,
            ..SimParams::default()
        };
        let results = simulate(&game, &duplicated, &params, &tc, &art.win_pct)?;
        let pruned = results.plays.iter().filter(|p| p.is_pruned).count();
        assert_eq!(pruned, 1);
        // The merged copy collected no samples.
        let loser = results.plays.iter().find(|p| p.is_pruned).unwrap();
        assert_eq!(loser.win_pct_stat.weight(), 0);
        Ok(())
    }

    #[test]
    fn test_stopping_rule_prunes_dominated_play() -> Result<()> {
        // Bag empty, both players hold an S: whoever plays CATS goes
        // out and wins, so the pass candidate loses every rollout.
        let art = artifacts(&["CAT", "CATS", "AT", "TA"]);
        let mut game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            3,
        );
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        game.load_position(&rows, ["S", "S"], [0, 0], 0, 0)?;
        while game.bag_mut().draw_random().is_some() {}
        let list = candidates(&game, 8);
        let outplay = list
            .iter()
            .find(|m| m.kind == MoveKind::Place)
            .unwrap()
            .clone();
        let pass = list
            .iter()
            .find(|m| m.kind == MoveKind::Pass)
            .unwrap()
            .clone();
        let tc = ThreadControl::new(2, 11);
        let params = SimParams {
            plies: 2,
            max_iterations: 512,
            stopping_condition: StoppingCondition::P95,
            check_interval: 8,
            known_opponent_rack: None,
        };
        let results = simulate(&game, &[outplay.clone(), pass], &params, &tc, &art.win_pct)?;
        // The sim stopped well before the iteration budget.
        assert!(results.iteration_count < 512);
        assert_eq!(results.plays.iter().filter(|p| !p.is_pruned).count(), 1);
        let winner = &results.plays[0];
        assert!(!winner.is_pruned);
        assert!(winner.last_move_chosen);
        assert_eq!(winner.mv, outplay);
        assert!(winner.win_pct_stat.mean() > 0.99);
        assert_eq!(tc.status(), ThreadControlStatus::Finished);
        Ok(())
    }

    #[test]
    fn test_known_opponent_rack_is_drawn() -> Result<()> {
        let art = artifacts(&["VORTEX", "VEX", "OX", "EX"]);
        let game = opening_game(&art);
        let moves = candidates(&game, 2);
        let known = Rack::from_letters(art.tileset.size(), &art.tileset.encode("AEIOUNN")?);
        let tc = ThreadControl::new(1, 21);
        let params = SimParams {
            plies: 1,
            max_iterations: 8,
            check_interval: 4,
            known_opponent_rack: Some(known),
            ..SimParams::default()
        };
        let results = simulate(&game, &moves, &params, &tc, &art.win_pct)?;
        assert_eq!(results.iteration_count, 8);
        Ok(())
    }
}
