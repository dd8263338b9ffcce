//! Endgame solving.
//!
//! Negascout over the bag-empty game tree with iterative deepening.
//! Generated moves live in a per-worker arena (a vector used as a bump
//! allocator); each node remembers the arena length on entry and
//! truncates back on unwind, so move allocation never touches the heap
//! after warm-up and unwinding is O(1).

use crate::equity::EQUITY_RESOLUTION;
use crate::error::Error;
use crate::game::Game;
use crate::moves::{Move, MoveKind, MoveList, MoveRecordType, MoveSortType};
use crate::movegen::{generate_moves, MoveGenArgs};
use crate::thread_control::{ThreadControl, ThreadControlStatus};
use log::trace;
use tinyvec::ArrayVec;

/// Estimate flag: consider pass first right after a pass.
const EARLY_PASS_BF: i32 = 1 << 29;
/// Estimate flag: plays that empty the rack sort first.
const GOING_OUT_BF: i32 = 1 << 27;

const LARGE_VALUE: i32 = 1 << 30;

const ENDGAME_MOVELIST_CAPACITY: usize = 65536;

/// Deepest supported search; bounds the principal variation.
pub const ENDGAME_MAX_PLIES: usize = 25;

/// The line of moves behind a solved value, at most one move per
/// requested ply. The score is the spread difference relative to the
/// position's initial spread.
#[derive(Debug, Clone, Default)]
pub struct PVLine {
    pub moves: ArrayVec<[Move; ENDGAME_MAX_PLIES]>,
    pub score: i32,
}

impl PVLine {
    fn clear(&mut self) {
        self.moves.clear();
        self.score = 0;
    }

    fn update(&mut self, child: &PVLine, mv: &Move, score: i32) {
        self.clear();
        self.moves.push(mv.clone());
        self.moves.extend(child.moves.iter().cloned());
        self.score = score;
    }
}

#[derive(Debug, Clone)]
struct SmallMove {
    estimated_value: i32,
    mv: Move,
}

pub struct EndgameSolver<'c> {
    thread_control: &'c ThreadControl,
    first_win_optim: bool,
    iterative_deepening_optim: bool,
    negascout_optim: bool,
    solving_player: usize,
    initial_spread: i32,
}

struct SolverWorker<'a, 'g> {
    thread_index: usize,
    game: Game<'g>,
    move_list: MoveList,
    arena: Vec<SmallMove>,
    initial_spread: i32,
    negascout_optim: bool,
    current_id_depth: usize,
    n_initial_moves: usize,
    args: MoveGenArgs<'a>,
}

impl<'c> EndgameSolver<'c> {
    /// Prepare a solver for the game's current position.
    /// ## Errors
    /// If the bag is not empty.
    pub fn new(thread_control: &'c ThreadControl, game: &Game) -> Result<EndgameSolver<'c>, Error> {
        if !game.bag().is_empty() {
            return Err(Error::BagNotEmpty);
        }
        let solving_player = game.on_turn_index();
        Ok(EndgameSolver {
            thread_control,
            first_win_optim: false,
            iterative_deepening_optim: true,
            negascout_optim: true,
            solving_player,
            initial_spread: game.spread(solving_player).raw() / EQUITY_RESOLUTION,
        })
    }

    /// Solve to `plies`, returning the principal variation. A halt
    /// returns the best line found at the deepest completed depth.
    pub fn solve(&self, game: &Game, plies: usize) -> PVLine {
        self.run(game, plies)
    }

    /// Search the null window `(-1, +1)`: enough to answer "is there a
    /// win", cheaper than a full solve. The returned score is only a
    /// bound, and deeper searches are not guaranteed to refine it
    /// monotonically.
    pub fn solve_first_win(&self, game: &Game, plies: usize) -> PVLine {
        let solver = EndgameSolver {
            thread_control: self.thread_control,
            first_win_optim: true,
            iterative_deepening_optim: self.iterative_deepening_optim,
            negascout_optim: self.negascout_optim,
            solving_player: self.solving_player,
            initial_spread: self.initial_spread,
        };
        solver.run(game, plies)
    }

    fn run(&self, game: &Game, plies: usize) -> PVLine {
        let plies = plies.min(ENDGAME_MAX_PLIES);
        self.thread_control.set_status(ThreadControlStatus::Started);
        self.thread_control.record_start_time();
        let mut worker = SolverWorker {
            thread_index: 0,
            game: game.clone(),
            move_list: MoveList::new(ENDGAME_MOVELIST_CAPACITY),
            arena: Vec::new(),
            initial_spread: self.initial_spread,
            negascout_optim: self.negascout_optim,
            current_id_depth: 0,
            n_initial_moves: 0,
            args: MoveGenArgs {
                record_type: MoveRecordType::All,
                sort_type: MoveSortType::Score,
                ..MoveGenArgs::default()
            },
        };
        let pv = worker.iterative_deepening(
            plies,
            self.first_win_optim,
            self.iterative_deepening_optim,
            self.thread_control,
        );
        if self.thread_control.is_halt_requested() {
            self.thread_control.set_status(ThreadControlStatus::Halted);
        } else {
            self.thread_control.set_status(ThreadControlStatus::Finished);
        }
        pv
    }
}

impl<'a, 'g> SolverWorker<'a, 'g> {
    /// Generate the side-to-move's plays into the arena. Returns the
    /// number generated; the caller owns the arena range.
    fn generate_stm_plays(&mut self) -> usize {
        generate_moves(&self.game, &self.args, &mut self.move_list);
        let count = self.move_list.count();
        for i in 0..count {
            self.arena.push(SmallMove {
                estimated_value: 0,
                mv: self.move_list.get(i).clone(),
            });
        }
        count
    }

    /// Move-ordering estimates: raw score, a large bonus for going out,
    /// a bonus for answering a pass with a pass, and per-thread jitter
    /// to diversify parallel workers.
    fn assign_estimates(&mut self, depth: usize, arena_begin: usize, count: usize) {
        let tiles_on_rack = self.game.on_turn_player().rack.total();
        let opp_rack_score = self
            .game
            .opponent()
            .rack
            .score(self.game.tileset())
            .raw()
            / EQUITY_RESOLUTION;
        let last_move_was_pass = self.game.consecutive_scoreless_turns() == 1;
        for small in &mut self.arena[arena_begin..arena_begin + count] {
            let score = small.mv.score.raw() / EQUITY_RESOLUTION;
            let tiles_played = i32::from(small.mv.tiles_played);
            small.estimated_value = if small.mv.kind == MoveKind::Place
                && small.mv.tiles_played == tiles_on_rack
            {
                score + 2 * opp_rack_score + GOING_OUT_BF
            } else if depth > 2 {
                if self.thread_index >= 6 {
                    score + 3 * tiles_played
                } else {
                    score - 5 * tiles_played
                }
            } else {
                score
            };
            if last_move_was_pass && small.mv.kind == MoveKind::Pass {
                small.estimated_value += EARLY_PASS_BF;
            }
        }
        Self::sort_by_estimate(&mut self.arena[arena_begin..arena_begin + count]);
    }

    fn sort_by_estimate(moves: &mut [SmallMove]) {
        moves.sort_by(|a, b| {
            b.estimated_value
                .cmp(&a.estimated_value)
                .then_with(|| a.mv.natural_cmp(&b.mv))
        });
    }

    fn negamax(&mut self, depth: usize, alpha: i32, beta: i32, pv: &mut PVLine, pv_node: bool) -> i32 {
        debug_assert!(pv_node || alpha == beta - 1);
        if depth == 0 || self.game.is_over() {
            // Negamax convention: the leaf is valued for the player on
            // turn and negated on the way up.
            let on_turn = self.game.on_turn_index();
            return self.game.spread(on_turn).raw() / EQUITY_RESOLUTION;
        }
        let mut alpha = alpha;
        let arena_begin = self.arena.len();
        let (base, nplays, generated) = if self.current_id_depth != depth {
            let nplays = self.generate_stm_plays();
            self.assign_estimates(depth, arena_begin, nplays);
            (arena_begin, nplays, true)
        } else {
            (0, self.n_initial_moves, false)
        };
        let mut best_value = -LARGE_VALUE;
        let mut child_pv = PVLine::default();
        for idx in 0..nplays {
            let mv = self.arena[base + idx].mv.clone();
            self.game.play_move(&mv, true);
            let value = if idx == 0 || !self.negascout_optim {
                -self.negamax(depth - 1, -beta, -alpha, &mut child_pv, pv_node)
            } else {
                let mut value =
                    -self.negamax(depth - 1, -alpha - 1, -alpha, &mut child_pv, false);
                if alpha < value && value < beta {
                    value = -self.negamax(depth - 1, -beta, -alpha, &mut child_pv, pv_node);
                }
                value
            };
            self.game.unplay_last_move();
            if value > best_value {
                best_value = value;
                pv.update(&child_pv, &mv, best_value - self.initial_spread);
            }
            if self.current_id_depth == depth {
                self.arena[base + idx].estimated_value = value;
            }
            if best_value > alpha {
                alpha = best_value;
            }
            if best_value >= beta {
                child_pv.clear();
                break;
            }
            child_pv.clear();
        }
        if generated {
            self.arena.truncate(arena_begin);
        }
        best_value
    }

    fn iterative_deepening(
        &mut self,
        plies: usize,
        first_win: bool,
        deepen: bool,
        thread_control: &ThreadControl,
    ) -> PVLine {
        let (alpha, beta) = if first_win {
            (-1, 1)
        } else {
            (-LARGE_VALUE, LARGE_VALUE)
        };
        debug_assert!(self.arena.is_empty());
        let initial_count = self.generate_stm_plays();
        self.assign_estimates(0, 0, initial_count);
        self.n_initial_moves = initial_count;

        let mut best = PVLine::default();
        let start = if deepen { 1 } else { plies.max(1) };
        for p in start..=plies.max(1) {
            if thread_control.is_halt_requested() {
                break;
            }
            self.current_id_depth = p;
            let mut pv = PVLine::default();
            let value = self.negamax(p, alpha, beta, &mut pv, true);
            Self::sort_by_estimate(&mut self.arena[..initial_count]);
            pv.score = value - self.initial_spread;
            best = pv;
        }
        trace!("endgame worker {} exiting", self.thread_index);
        best
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
    }

    fn artifacts(words: &[&str]) -> Artifacts {
        let tileset = TileSet::new(Language::EN);
        let lexicon = Lexicon::from_words(words, &tileset).unwrap();
        Artifacts {
            layout: BoardLayout::standard15(),
            leaves: LeaveTable::empty(),
            tileset,
            lexicon,
        }
    }

    /// Empty the bag of a fresh game by drawing everything not already
    /// accounted for.
    fn empty_bag(game: &mut Game) {
        while game.bag_mut().draw_random().is_some() {}
    }

    #[test]
    fn test_outplay_is_found() -> Result<()> {
        let art = artifacts(&["CAT", "CATS", "AT", "TA"]);
        let mut game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            0,
        );
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        game.load_position(&rows, ["S", "Q"], [0, 0], 0, 0)?;
        empty_bag(&mut game);
        let tc = ThreadControl::new(1, 0);
        let solver = EndgameSolver::new(&tc, &game)?;
        let pv = solver.solve(&game, 3);
        // CATS scores 6, going out gains 2 * 10 for the stranded Q.
        assert_eq!(pv.score, 26);
        let first = &pv.moves[0];
        assert_eq!(first.kind, MoveKind::Place);
        assert_eq!(first.score.raw() / EQUITY_RESOLUTION, 6);
        assert_eq!(tc.status(), ThreadControlStatus::Finished);
        Ok(())
    }

    #[test]
    fn test_depth_one_equals_best_static_outplay() -> Result<()> {
        // At one ply the solver just takes the best immediate spread.
        let art = artifacts(&["CAT", "CATS", "AT", "TA"]);
        let mut game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            0,
        );
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        game.load_position(&rows, ["S", "Q"], [10, 40], 0, 0)?;
        empty_bag(&mut game);
        let tc = ThreadControl::new(1, 0);
        let solver = EndgameSolver::new(&tc, &game)?;
        let pv = solver.solve(&game, 1);
        // Initial spread -30; playing out for 6 + 20 leaves spread -4.
        assert_eq!(pv.score, 26);
        assert_eq!(pv.moves.len(), 1);
        Ok(())
    }

    #[test]
    fn test_first_win_reports_win() -> Result<()> {
        let art = artifacts(&["CAT", "CATS", "AT", "TA"]);
        let mut game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            0,
        );
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        game.load_position(&rows, ["S", "Q"], [0, 0], 0, 0)?;
        empty_bag(&mut game);
        let tc = ThreadControl::new(1, 0);
        let solver = EndgameSolver::new(&tc, &game)?;
        let pv = solver.solve_first_win(&game, 2);
        assert!(pv.score > 0);
        Ok(())
    }

    #[test]
    fn test_solver_requires_empty_bag() {
        let art = artifacts(&["CAT"]);
        let game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            0,
        );
        let tc = ThreadControl::new(1, 0);
        assert!(EndgameSolver::new(&tc, &game).is_err());
    }

    #[test]
    fn test_halt_returns_partial() -> Result<()> {
        let art = artifacts(&["CAT", "CATS", "AT", "TA"]);
        let mut game = Game::new(
            &art.tileset,
            &art.layout,
            [&art.lexicon, &art.lexicon],
            [&art.leaves, &art.leaves],
            0,
        );
        let mut rows = vec![String::from("...............") ; 15];
        rows[7] = String::from("......CAT......");
        game.load_position(&rows, ["S", "Q"], [0, 0], 0, 0)?;
        empty_bag(&mut game);
        let tc = ThreadControl::new(1, 0);
        let solver = EndgameSolver::new(&tc, &game)?;
        tc.halt();
        let pv = solver.solve(&game, 5);
        assert!(pv.moves.is_empty());
        assert_eq!(tc.status(), ThreadControlStatus::Halted);
        Ok(())
    }
}
