// Copyright 2026 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! Adversarial search for any number of players
//!
//! The player to move and its allies form one side, everybody else the
//! other. Values are always seen from the side to move at the root:
//! its movers maximize, every enemy minimizes. The search runs in passes:
//!
//! * A full-width pass to `SearchConfig::depth` plies, followed at the
//!   horizon (or once a line is losing badly) by a captures-only
//!   exchange search. The best line under each root move is offered to
//!   a small pool of _superbranches_.
//!
//! * Every superbranch that is not yet at the depth ceiling is replayed
//!   and searched one more ply. Its value blends the old estimate with
//!   the deeper one. This repeats until no superbranch is active.
//!
//! * The superbranch with the best value, discounted for being shallower
//!   than the deepest line, gives the move.
//!
//! All work happens on the caller's `Game` through `Game::apply`, so the
//! board is exactly as it was when the search returns.

mod cache;
mod config;
mod eval;
mod superbranch;

pub use cache::*;
pub use config::*;
pub use eval::*;
pub use superbranch::*;

use log::{debug, trace, warn};
#[cfg(feature = "random")]
use rand::rngs::StdRng;
use rand::Rng;
#[cfg(feature = "random")]
use rand::SeedableRng;

use crate::board::{Game, Move, Piece, PlayerId, Square, Validation};

/// What a search decided.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// `None` when the side to move has no legal move.
    pub best: Option<Move>,
    pub value: f32,
    /// The expected line of play, starting with `best`.
    pub line: Vec<Move>,
    pub depth: usize,
    pub nodes: u64,
}

/// Search state for one engine seat: tuning, randomness, the move cache
/// and the superbranch pool. Reusable across turns; anything derived from
/// an older position is discarded when the game's revision moves on.
#[derive(Debug)]
pub struct SearchContext<R: Rng> {
    config: SearchConfig,
    rng: R,
    cache: MoveCache,
    pool: Pool,
    revision: Option<u64>,
    nodes: u64,
}

#[cfg(feature = "random")]
impl SearchContext<StdRng> {
    pub fn from_entropy(config: SearchConfig) -> Self {
        Self::new(config, StdRng::from_entropy())
    }
}

/// Value of a position below some node and the line that leads to it.
#[derive(Debug, Clone, Default)]
struct Scored {
    value: f32,
    line: Vec<Branch>,
    /// The line ends with a player who cannot move.
    terminal: bool,
}

impl Scored {
    fn quiet(value: f32) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    fn terminal(value: f32) -> Self {
        Self {
            value,
            line: Vec::new(),
            terminal: true,
        }
    }
}

/// Alpha-beta bounds, relative to the node they are handed to.
#[derive(Debug, Clone, Copy)]
struct Window {
    alpha: f32,
    beta: f32,
}

impl Window {
    const OPEN: Self = Self {
        alpha: f32::NEG_INFINITY,
        beta: f32::INFINITY,
    };

    /// The window seen by a child reached through a move worth `gain`.
    fn shift(self, gain: f32) -> Self {
        Self {
            alpha: self.alpha - gain,
            beta: self.beta - gain,
        }
    }

    fn raise(&mut self, maximizing: bool, value: f32) {
        if maximizing {
            self.alpha = self.alpha.max(value);
        } else {
            self.beta = self.beta.min(value);
        }
    }

    fn is_closed(&self) -> bool {
        self.alpha >= self.beta
    }
}

#[inline]
fn improves(maximizing: bool, value: f32, best: f32) -> bool {
    if maximizing {
        value > best
    } else {
        value < best
    }
}

impl<R: Rng> SearchContext<R> {
    pub fn new(config: SearchConfig, rng: R) -> Self {
        let pool = Pool::new(config.pool_size);
        Self {
            config,
            rng,
            cache: MoveCache::default(),
            pool,
            revision: None,
            nodes: 0,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Forgets everything derived from the last position searched.
    pub fn invalidate(&mut self) {
        self.revision = None;
    }

    fn sync(&mut self, game: &Game) {
        if self.revision != Some(game.revision()) {
            self.cache.reset(game.dims().area());
            self.revision = Some(game.revision());
        }
        self.pool.clear(self.config.pool_size);
        self.nodes = 0;
    }

    /// Searches for the best move of the player to move without playing
    /// it. The game is left as it was found.
    pub fn analyse(&mut self, game: &mut Game) -> SearchOutcome {
        self.sync(game);
        let root = game.current();
        if game.is_won() {
            return self.outcome(None, MATE_VALUE);
        }
        let observed = self.count_moves(game);
        let ceiling = self.config.depth_ceiling(observed);
        let first = self.config.depth.clamp(1, ceiling);
        debug!(
            "searching for player {}: {} moves on the board, ceiling {}",
            root, observed, ceiling
        );

        for mv in self.moves_of(game, root) {
            let gain = self.gain(game, root, root, mv);
            let below = self.branch(game, mv, |ctx, g| {
                if g.player_check(root) {
                    return None;
                }
                Some(ctx.after_move(g, root, root, first - 1, gain, Window::OPEN))
            });
            let Some(below) = below else {
                continue;
            };
            let mut branches = vec![Branch {
                mv,
                player: root,
                gain,
            }];
            branches.extend(below.line);
            let line = Superbranch::new(gain + below.value, branches, below.terminal);
            trace!("root line {} valued {}", mv, line.value);
            self.pool.offer(line, &mut self.rng);
        }

        if self.pool.is_empty() {
            let checked = game.player_check(root) || game.rules().elimination;
            return self.outcome(None, stuck_value(checked));
        }
        self.deepen(game, root, ceiling);

        let Some(best) = self.pool.best(self.config.discount, &mut self.rng) else {
            return self.outcome(None, 0.0);
        };
        let outcome = SearchOutcome {
            best: best.first_move(),
            value: best.value,
            line: best.moves(),
            depth: best.depth(),
            nodes: self.nodes,
        };
        debug!(
            "best {:?} valued {} at depth {} after {} nodes",
            outcome.best, outcome.value, outcome.depth, outcome.nodes
        );
        outcome
    }

    /// Searches and commits the best move for the player to move.
    pub fn run(&mut self, game: &mut Game) -> SearchOutcome {
        let root = game.current();
        let mut outcome = self.analyse(game);
        if let Some(mv) = outcome.best {
            if let Err(err) = game.apply_move(mv, Validation::STRICT, root) {
                warn!("engine move {} for player {} rejected: {}", mv, root, err);
                outcome.best = None;
            }
        }
        outcome
    }

    fn outcome(&self, best: Option<Move>, value: f32) -> SearchOutcome {
        SearchOutcome {
            best,
            value,
            line: best.into_iter().collect(),
            depth: 0,
            nodes: self.nodes,
        }
    }

    /// Plays `mv`, keeps the cache in step, runs `f` and takes both back.
    fn branch<T>(
        &mut self,
        game: &mut Game,
        mv: Move,
        f: impl FnOnce(&mut Self, &mut Game) -> T,
    ) -> T {
        let mut applied = game.apply(mv);
        let mark = self.cache.invalidate(&applied, &mv);
        let result = f(self, &mut *applied);
        self.cache.restore(mark);
        result
    }

    fn moves_of(&mut self, game: &Game, player: PlayerId) -> Vec<Move> {
        let squares: Vec<Square> = game.board().pieces_of(player).map(|(sq, _)| sq).collect();
        let mut moves = Vec::new();
        for square in squares {
            moves.extend_from_slice(self.cache.moves(game, square));
        }
        moves
    }

    fn count_moves(&mut self, game: &Game) -> usize {
        let squares: Vec<Square> = game.board().occupied().map(|(sq, _)| sq).collect();
        squares
            .into_iter()
            .map(|square| self.cache.moves(game, square).len())
            .sum()
    }

    /// Material swung by `mover` playing `mv`, signed to `root`'s side.
    fn gain(&mut self, game: &Game, root: PlayerId, mover: PlayerId, mv: Move) -> f32 {
        let mut gain = 0.0;
        if !mv.is_castle() {
            if let Some(captured) = game.board().material(mv.to) {
                let mobility = self.cache.moves(game, mv.to).len();
                let value = piece_value(captured.piece(), mobility, game.dims().area());
                if game.is_ally(root, captured.owner()) {
                    gain -= value;
                } else {
                    gain += value;
                }
            }
        }
        if game.rules().auto_promote && game.promotes(mv) {
            let swing = piece_weight(game.rules().promote_to) - piece_weight(Piece::Pawn);
            if game.is_ally(root, mover) {
                gain += swing;
            } else {
                gain -= swing;
            }
        }
        gain
    }

    /// Value of a player who cannot move, signed to `root`'s side.
    fn stuck(&self, game: &Game, root: PlayerId, player: PlayerId) -> Scored {
        let checked = game.player_check(player) || game.rules().elimination;
        let value = stuck_value(checked);
        Scored::terminal(if game.is_ally(root, player) {
            value
        } else {
            -value
        })
    }

    /// Hands the turn on from `mover` and searches from there.
    fn after_move(
        &mut self,
        game: &mut Game,
        root: PlayerId,
        mover: PlayerId,
        depth: usize,
        running: f32,
        window: Window,
    ) -> Scored {
        match game.next_player(mover) {
            Some(next) => self.search(game, root, next, depth, running, window),
            None if game.is_ally(root, mover) => Scored::terminal(MATE_VALUE),
            None => Scored::terminal(-MATE_VALUE),
        }
    }

    /// Full-width search with `mover` to play. `running` is the material
    /// swing along the path so far.
    fn search(
        &mut self,
        game: &mut Game,
        root: PlayerId,
        mover: PlayerId,
        depth: usize,
        running: f32,
        mut window: Window,
    ) -> Scored {
        if depth == 0 || running < -self.config.loss_threshold {
            return self.exchange(game, root, mover, self.config.exchange_depth, window);
        }
        self.nodes += 1;
        let maximizing = game.is_ally(root, mover);
        let mut best: Option<Scored> = None;
        for mv in self.moves_of(game, mover) {
            let gain = self.gain(game, root, mover, mv);
            let below = self.branch(game, mv, |ctx, g| {
                if g.player_check(mover) {
                    return None;
                }
                Some(ctx.after_move(g, root, mover, depth - 1, running + gain, window.shift(gain)))
            });
            let Some(below) = below else {
                continue;
            };
            let value = gain + below.value;
            if best
                .as_ref()
                .map_or(true, |best| improves(maximizing, value, best.value))
            {
                let mut line = Vec::with_capacity(below.line.len() + 1);
                line.push(Branch {
                    mv,
                    player: mover,
                    gain,
                });
                line.extend(below.line);
                best = Some(Scored {
                    value,
                    line,
                    terminal: below.terminal,
                });
            }
            window.raise(maximizing, value);
            if window.is_closed() {
                break;
            }
        }
        best.unwrap_or_else(|| self.stuck(game, root, mover))
    }

    /// Captures-only search. The mover may always decline to capture, so
    /// the value never falls below standing pat, unless the mover has no
    /// legal move at all.
    fn exchange(
        &mut self,
        game: &mut Game,
        root: PlayerId,
        mover: PlayerId,
        plies: usize,
        mut window: Window,
    ) -> Scored {
        self.nodes += 1;
        if plies == 0 {
            return Scored::quiet(0.0);
        }
        let maximizing = game.is_ally(root, mover);
        let moves = self.moves_of(game, mover);
        let captures: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|mv| !mv.is_castle() && game.board().material(mv.to).is_some())
            .collect();
        let mut best = 0.0;
        let mut legal = false;
        for mv in captures {
            let gain = self.gain(game, root, mover, mv);
            let below = self.branch(game, mv, |ctx, g| {
                if g.player_check(mover) {
                    return None;
                }
                Some(match g.next_player(mover) {
                    Some(next) => {
                        ctx.exchange(g, root, next, plies - 1, window.shift(gain))
                            .value
                    }
                    None if g.is_ally(root, mover) => MATE_VALUE,
                    None => -MATE_VALUE,
                })
            });
            let Some(below) = below else {
                continue;
            };
            legal = true;
            let value = gain + below;
            if improves(maximizing, value, best) {
                best = value;
            }
            window.raise(maximizing, value);
            if window.is_closed() {
                break;
            }
        }
        if !legal && !self.can_move(game, mover, &moves) {
            return self.stuck(game, root, mover);
        }
        Scored::quiet(best)
    }

    fn can_move(&mut self, game: &mut Game, player: PlayerId, moves: &[Move]) -> bool {
        moves
            .iter()
            .any(|mv| !self.branch(game, *mv, |_, g| g.player_check(player)))
    }

    /// Searches every active superbranch one ply deeper until all of them
    /// have reached `ceiling` or ended.
    fn deepen(&mut self, game: &mut Game, root: PlayerId, ceiling: usize) {
        let discount = self.config.discount;
        loop {
            let active: Vec<usize> = (0..self.pool.len())
                .filter(|&index| self.pool.lines()[index].is_active(ceiling))
                .collect();
            if active.is_empty() {
                break;
            }
            for index in active {
                let line = self.pool.lines()[index].clone();
                let gained = line.gain();
                let leaf = self.replay(game, root, &line.branches, root, 0.0);
                let kept = &mut self.pool.lines_mut()[index];
                kept.value = discount * kept.value + (1.0 - discount) * (gained + leaf.value);
                kept.terminal = leaf.terminal || leaf.line.is_empty();
                kept.branches.extend(leaf.line);
                trace!(
                    "deepened {:?} to {} plies, valued {}",
                    kept.first_move(),
                    kept.depth(),
                    kept.value
                );
            }
        }
    }

    /// Walks down `branches` and searches one ply past the end of them.
    fn replay(
        &mut self,
        game: &mut Game,
        root: PlayerId,
        branches: &[Branch],
        last: PlayerId,
        running: f32,
    ) -> Scored {
        match branches.split_first() {
            Some((head, rest)) => self.branch(game, head.mv, |ctx, g| {
                ctx.replay(g, root, rest, head.player, running + head.gain)
            }),
            None => self.after_move(game, root, last, 1, running, Window::OPEN),
        }
    }
}

/// Searches and plays the best move for the player to move in `game`.
pub fn run_search<R: Rng>(game: &mut Game, ctx: &mut SearchContext<R>) -> SearchOutcome {
    ctx.run(game)
}
