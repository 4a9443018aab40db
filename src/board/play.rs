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

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Index;

use super::layout::LayoutError;
use super::material::{Cell, Piece, PlayerId};
use super::moves::{Move, MoveError};
use super::player::Player;
use super::position::Board;
use super::square::{Dimensions, Square};
use super::undo::UndoLog;
use super::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardResult {
    /// Every other seat is mated; the player still to move won, along
    /// with its allies.
    Won(PlayerId),
    /// The player to move is not in check and has no legal move.
    StaleMate(PlayerId),
}

/// Variant switches that hold for the whole game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Pawns that reach the edge they face turn into `promote_to`.
    pub auto_promote: bool,
    pub promote_to: Piece,
    /// Kings are ordinary pieces and a player is out once it cannot move.
    pub elimination: bool,
    /// Piece types a king may castle with.
    pub castleable: BTreeSet<Piece>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            auto_promote: true,
            promote_to: Piece::Queen,
            elimination: false,
            castleable: BTreeSet::from([Piece::Rook]),
        }
    }
}

/// How `apply_move` treats a move. `validate` checks turn, ownership and
/// legality; `commit` plays the move and advances the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    pub validate: bool,
    pub commit: bool,
}

impl Validation {
    pub const STRICT: Self = Self {
        validate: true,
        commit: true,
    };
    pub const CHECK_ONLY: Self = Self {
        validate: true,
        commit: false,
    };
    pub const TRUSTED: Self = Self {
        validate: false,
        commit: true,
    };
}

/// A committed move and the player who made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Played {
    pub mv: Move,
    pub player: PlayerId,
}

/// Board, seats, turn order and history of one game.
///
/// Search explores variations by applying moves to the game itself and
/// reverting them (see `Game::apply`); positions are never copied while
/// searching. Committed moves go through `apply_move`.
#[derive(Debug)]
pub struct Game {
    board: Board,
    initial: Board,
    players: Vec<Player>,
    rules: Rules,
    current: PlayerId,
    won: bool,
    history: Vec<Played>,
    undo: UndoLog,
    revision: u64,
}

impl Game {
    /// Seats `players` at `board`. Turn order is the order of `players`.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no players, or if a piece belongs to
    /// a player who is not seated.
    pub fn new(board: Board, players: Vec<Player>, rules: Rules) -> anyhow::Result<Self> {
        if players.is_empty() {
            return Err(LayoutError::NoPlayers.into());
        }
        if players.len() > usize::from(u8::MAX) {
            return Err(LayoutError::TooManyPlayers(players.len()).into());
        }
        if let Some((square, material)) = board
            .occupied()
            .find(|(_, material)| material.owner().to_index() >= players.len())
        {
            return Err(LayoutError::UnknownOwner {
                owner: material.owner().to_index(),
                square,
            }
            .into());
        }
        let mut game = Self {
            initial: board.clone(),
            board,
            players,
            rules,
            current: PlayerId::default(),
            won: false,
            history: Vec::new(),
            undo: UndoLog::default(),
            revision: 0,
        };
        game.reset_to_initial();
        Ok(game)
    }

    /// A fresh game from the same starting board, seats and rules.
    pub fn restart(&self) -> Self {
        let mut game = Self {
            board: self.initial.clone(),
            initial: self.initial.clone(),
            players: self.players.clone(),
            rules: self.rules.clone(),
            current: PlayerId::default(),
            won: false,
            history: Vec::new(),
            undo: UndoLog::default(),
            revision: 0,
        };
        game.reset_to_initial();
        game
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }
    #[inline]
    pub fn initial_board(&self) -> &Board {
        &self.initial
    }
    #[inline]
    pub fn dims(&self) -> Dimensions {
        self.board.dims()
    }
    #[inline]
    pub fn players(&self) -> &[Player] {
        &self.players
    }
    /// # Panics
    ///
    /// Panics if `id` is not seated in this game.
    #[inline]
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.to_index()]
    }
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.players.len()).map(|index| PlayerId::new(index as u8))
    }
    #[inline]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }
    #[inline]
    pub fn current(&self) -> PlayerId {
        self.current
    }
    #[inline]
    pub fn is_won(&self) -> bool {
        self.won
    }
    #[inline]
    pub fn history(&self) -> &[Played] {
        &self.history
    }
    /// Bumped by every committed move, take-back and reset. Anything
    /// derived from the position can compare revisions to detect that it
    /// is stale.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Alliance is symmetric and reflexive.
    #[inline]
    pub fn is_ally(&self, a: PlayerId, b: PlayerId) -> bool {
        self.players
            .get(a.to_index())
            .map_or(a == b, |player| player.is_ally(b))
    }

    pub fn set_engine(&mut self, player: PlayerId, engine: bool) {
        if let Some(player) = self.players.get_mut(player.to_index()) {
            player.set_engine(engine);
        }
    }

    #[inline]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
    #[inline]
    pub(crate) fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.to_index()]
    }
    #[inline]
    pub(crate) fn undo_log(&self) -> &UndoLog {
        &self.undo
    }
    #[inline]
    pub(crate) fn undo_log_mut(&mut self) -> &mut UndoLog {
        &mut self.undo
    }

    /// Validates and/or commits `mv` on behalf of `actor`. Nothing changes
    /// when an error is returned.
    pub fn apply_move(
        &mut self,
        mv: Move,
        validation: Validation,
        actor: PlayerId,
    ) -> Result<(), MoveError> {
        let mv = if validation.validate {
            self.validate_move(mv, actor)?
        } else {
            mv
        };
        if validation.commit {
            self.commit_move(mv, actor);
        }
        Ok(())
    }

    /// Checks `mv` for `actor` and returns it in the form the move
    /// generator produces. A castle may be submitted without naming its
    /// partner; an ordinary move to the same square takes precedence.
    pub fn validate_move(&mut self, mv: Move, actor: PlayerId) -> Result<Move, MoveError> {
        let Some(player) = self.players.get(actor.to_index()) else {
            return Err(MoveError::WrongTurn);
        };
        if self.won || self.current != actor || player.is_mate() {
            return Err(MoveError::WrongTurn);
        }
        match self.board.get(mv.from) {
            None => return Err(MoveError::InvalidMove),
            Some(cell) if !cell.is_owned_by(actor) => return Err(MoveError::WrongOwner),
            Some(_) => (),
        }
        if mv.from == mv.to {
            return Err(MoveError::InvalidMove);
        }
        let legal = self.legal_moves(mv.from);
        let matching = |castle: bool| {
            legal
                .iter()
                .copied()
                .find(|candidate| candidate.to == mv.to && candidate.is_castle() == castle)
        };
        if legal.contains(&mv) {
            return Ok(mv);
        }
        match mv.castle {
            Some(_) => Err(MoveError::InvalidMove),
            None => matching(false)
                .or_else(|| matching(true))
                .ok_or(MoveError::InvalidMove),
        }
    }

    pub(crate) fn commit_move(&mut self, mv: Move, actor: PlayerId) {
        debug_assert!(self.undo.is_empty(), "commit while a variation is applied");
        let mark = self.apply_unguarded(mv);
        self.undo.forget(mark);
        self.history.push(Played { mv, player: actor });
        self.refresh_status();
        self.advance_turn(actor);
        self.revision += 1;
    }

    /// Recomputes check and mate for every seat. A player is mate when it
    /// cannot move and is either in check or playing under elimination.
    pub fn refresh_status(&mut self) {
        for id in self.player_ids() {
            let check = self.player_check(id);
            let mate = (check || self.rules.elimination) && !self.has_legal_move(id);
            let player = self.player_mut(id);
            player.set_check(check);
            player.set_mate(mate);
        }
    }

    /// The next seat after `after` in turn order that is not mate, or
    /// `None` if the order comes back round to `after`.
    pub fn next_player(&self, after: PlayerId) -> Option<PlayerId> {
        let count = self.players.len();
        let mut index = after.to_index();
        loop {
            index = (index + 1) % count;
            if index == after.to_index() {
                return None;
            }
            if !self.players[index].is_mate() {
                return Some(PlayerId::new(index as u8));
            }
        }
    }

    fn advance_turn(&mut self, actor: PlayerId) {
        match self.next_player(actor) {
            Some(next) => self.current = next,
            None => self.won = true,
        }
    }

    pub fn board_result(&mut self) -> Option<BoardResult> {
        if self.won {
            return Some(BoardResult::Won(self.current));
        }
        let current = self.current;
        if !self.player(current).is_check() && !self.has_legal_move(current) {
            return Some(BoardResult::StaleMate(current));
        }
        None
    }

    /// Takes back the most recent move made by a player who is not an
    /// engine, along with every engine move made after it, and replays the
    /// rest of the history from the initial board. Returns false when there
    /// is nothing to take back.
    pub fn undo_last(&mut self) -> bool {
        let Some(index) = self
            .history
            .iter()
            .rposition(|played| !self.player(played.player).is_engine())
        else {
            return false;
        };
        let kept: Vec<Played> = self.history[..index].to_vec();
        self.replay(&kept);
        true
    }

    /// Back to the initial board with an empty history. Seats, alliances
    /// and engine flags are kept.
    pub(crate) fn reset_to_initial(&mut self) {
        debug_assert!(self.undo.is_empty());
        self.board = self.initial.clone();
        self.history.clear();
        self.current = PlayerId::default();
        self.won = false;
        for id in self.player_ids() {
            let kings = self.board.royal_squares(id);
            *self.player_mut(id).kings_mut() = kings;
        }
        self.refresh_status();
        self.revision += 1;
    }

    /// Resets the game and commits `moves` in order.
    pub(crate) fn replay(&mut self, moves: &[Played]) {
        self.reset_to_initial();
        for played in moves {
            self.commit_move(played.mv, played.player);
        }
    }
}

impl Turn for Game {
    fn turn(&self) -> PlayerId {
        self.current
    }
}

impl Index<Square> for Game {
    type Output = Cell;
    fn index(&self, index: Square) -> &Self::Output {
        self.board.index(index)
    }
}
