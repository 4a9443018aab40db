// Copyright 2023 Tobin Edwards
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

use std::collections::HashMap;

use log::info;
#[cfg(feature = "random")]
use rand::{thread_rng, Rng};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::{BoardResult, Game, Move, PlayerId, Validation};
use crate::search::{SearchConfig, SearchContext};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameId(u64);

impl GameId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
    #[cfg(feature = "random")]
    pub fn random() -> Self {
        Self(thread_rng().gen())
    }
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum GameResult {
    /// The last player able to move, together with its allies.
    Win(Vec<PlayerId>),
    /// The player to move cannot move but is not in check.
    StaleMate(PlayerId),
}

/// A game together with the engines playing some of its seats.
#[derive(Debug)]
pub struct Session {
    id: GameId,
    game: Game,
    engines: HashMap<PlayerId, SearchContext<StdRng>>,
    config: SearchConfig,
}

impl Session {
    /// Wraps `game`, starting an engine for every seat already marked as
    /// engine-controlled. Engines are seeded from `id` so that a session
    /// can be replayed.
    pub fn new(id: GameId, game: Game, config: SearchConfig) -> Self {
        let mut session = Self {
            id,
            game,
            engines: HashMap::new(),
            config,
        };
        let seats: Vec<PlayerId> = session
            .game
            .player_ids()
            .filter(|seat| session.game.player(*seat).is_engine())
            .collect();
        for seat in seats {
            session.start_engine(seat);
        }
        session
    }

    #[inline]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn is_engine(&self, seat: PlayerId) -> bool {
        self.engines.contains_key(&seat)
    }

    /// Hands `seat` to an engine or back to a human.
    pub fn set_engine(&mut self, seat: PlayerId, engine: bool) {
        self.game.set_engine(seat, engine);
        if engine {
            self.start_engine(seat);
        } else {
            self.engines.remove(&seat);
        }
    }

    fn start_engine(&mut self, seat: PlayerId) {
        let seed = self.id.value() ^ seat.to_index() as u64;
        let config = self.config.clone();
        self.engines
            .entry(seat)
            .or_insert_with(|| SearchContext::new(config, StdRng::seed_from_u64(seed)));
    }

    fn invalidate_engines(&mut self) {
        for engine in self.engines.values_mut() {
            engine.invalidate();
        }
    }

    /// Plays a move for `player`.
    ///
    /// # Errors
    ///
    /// Returns the `MoveError` from `Game::apply_move` if the move is
    /// rejected. The game is unchanged in that case.
    pub fn submit_move(&mut self, mv: Move, player: PlayerId) -> anyhow::Result<()> {
        self.game.apply_move(mv, Validation::STRICT, player)?;
        info!("game {}: player {} played {}", self.id.value(), player, mv);
        self.invalidate_engines();
        Ok(())
    }

    /// Takes back the last human move and the engine replies to it.
    pub fn take_back(&mut self) -> bool {
        let undone = self.game.undo_last();
        if undone {
            info!(
                "game {}: took back to move {}",
                self.id.value(),
                self.game.history().len()
            );
            self.invalidate_engines();
        }
        undone
    }

    /// Lets engines move until a human is to play, the game is over or
    /// `limit` moves have been made. Returns the moves played.
    pub fn play_engines(&mut self, limit: usize) -> Vec<Move> {
        let mut played = Vec::new();
        while played.len() < limit && !self.game.is_won() {
            let seat = self.game.current();
            let Some(engine) = self.engines.get_mut(&seat) else {
                break;
            };
            let outcome = engine.run(&mut self.game);
            let Some(mv) = outcome.best else {
                break;
            };
            info!(
                "game {}: engine {} played {} valued {}",
                self.id.value(),
                seat,
                mv,
                outcome.value
            );
            played.push(mv);
        }
        played
    }

    pub fn result(&mut self) -> Option<GameResult> {
        match self.game.board_result()? {
            BoardResult::Won(winner) => {
                let side = self
                    .game
                    .player_ids()
                    .filter(|id| self.game.is_ally(winner, *id))
                    .collect();
                Some(GameResult::Win(side))
            }
            BoardResult::StaleMate(player) => Some(GameResult::StaleMate(player)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::MoveError;

    const WHITE: PlayerId = PlayerId::new(0);
    const BLACK: PlayerId = PlayerId::new(1);

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn quick() -> SearchConfig {
        SearchConfig {
            depth: 1,
            exchange_depth: 1,
            pool_size: 2,
            max_depth: 2,
            ..SearchConfig::default()
        }
    }

    fn submit(session: &mut Session, text: &str, player: PlayerId) {
        let mv = session.game().parse_move(text).unwrap();
        session.submit_move(mv, player).unwrap();
    }

    #[test]
    fn test_engine_answers_human() {
        init_logging();
        let mut session = Session::new(GameId::new(11), Game::standard(), quick());
        session.set_engine(BLACK, true);
        assert!(session.is_engine(BLACK));
        submit(&mut session, "e2e4", WHITE);
        let played = session.play_engines(10);
        assert_eq!(played.len(), 1);
        assert_eq!(session.game().current(), WHITE);
        assert_eq!(session.game().history().len(), 2);
    }
    #[test]
    fn test_take_back_removes_engine_reply() {
        init_logging();
        let mut session = Session::new(GameId::new(12), Game::standard(), quick());
        session.set_engine(BLACK, true);
        submit(&mut session, "d2d4", WHITE);
        session.play_engines(10);
        assert!(session.take_back());
        assert!(session.game().history().is_empty());
        assert_eq!(session.game().current(), WHITE);
        assert!(!session.take_back());
    }
    #[test]
    fn test_rejected_move_reports_error() {
        let mut session = Session::new(GameId::new(13), Game::standard(), quick());
        let mv = session.game().parse_move("e7e5").unwrap();
        let err = session.submit_move(mv, BLACK).unwrap_err();
        assert_eq!(err.downcast_ref::<MoveError>(), Some(&MoveError::WrongTurn));
        assert!(session.game().history().is_empty());
    }
    #[test]
    fn test_checkmate_result() {
        let mut session = Session::new(GameId::new(14), Game::standard(), quick());
        assert_eq!(session.result(), None);
        submit(&mut session, "f2f3", WHITE);
        submit(&mut session, "e7e5", BLACK);
        submit(&mut session, "g2g4", WHITE);
        submit(&mut session, "d8h4", BLACK);
        assert_eq!(session.result(), Some(GameResult::Win(vec![BLACK])));
        assert!(session.play_engines(5).is_empty());
    }
    #[test]
    fn test_engines_play_each_other_within_limit() {
        init_logging();
        let layout = format!("engine White Black\n{}", crate::board::STANDARD);
        let game: Game = layout.parse().unwrap();
        let mut session = Session::new(GameId::new(15), game, quick());
        assert!(session.is_engine(WHITE) && session.is_engine(BLACK));
        let played = session.play_engines(4);
        assert_eq!(played.len(), 4);
        assert_eq!(session.game().history().len(), 4);
        session.set_engine(WHITE, false);
        assert!(session.play_engines(4).is_empty());
    }
    #[test]
    fn test_same_id_same_game() {
        let play = || {
            let mut session = Session::new(GameId::new(99), Game::standard(), quick());
            session.set_engine(WHITE, true);
            session.set_engine(BLACK, true);
            session.play_engines(4)
        };
        assert_eq!(play(), play());
    }
    #[cfg(feature = "random")]
    #[test]
    fn test_random_ids_differ() {
        assert_ne!(GameId::random(), GameId::random());
    }
}
