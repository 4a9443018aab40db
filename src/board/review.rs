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

use std::ops::Index;

use super::material::{Cell, PlayerId};
use super::play::{Game, Played};
use super::position::Board;
use super::square::Square;
use super::Turn;

/// Position index within a reviewed game: 0 is the initial board, `n` is
/// the board after the n-th committed move.
#[allow(clippy::len_without_is_empty)]
pub trait Review {
    fn len(&self) -> usize;
    fn offset(&self) -> usize;
    fn get(&self, offset: usize) -> Option<&Board>;

    #[inline]
    fn at_start(&self) -> bool {
        self.offset() == 0
    }
    #[inline]
    fn at_end(&self) -> bool {
        self.offset() + 1 == self.len()
    }
    #[inline]
    fn first(&self) -> &Board {
        self.get(0).expect("Review::first - out of bounds")
    }
    #[inline]
    fn last(&self) -> &Board {
        self.get(self.len() - 1).expect("Review::last - out of bounds")
    }
    #[inline]
    fn current(&self) -> &Board {
        self.get(self.offset())
            .expect("Review::current - out of bounds")
    }
}

pub trait ReviewMut: Review {
    fn set_offset(&mut self, offset: usize);

    #[inline]
    fn forward(&mut self) {
        if !self.at_end() {
            self.set_offset(self.offset() + 1);
        }
    }
    #[inline]
    fn back(&mut self) {
        if !self.at_start() {
            self.set_offset(self.offset() - 1);
        }
    }
    #[inline]
    fn skip_to_start(&mut self) {
        self.set_offset(0);
    }
    #[inline]
    fn skip_to_end(&mut self) {
        self.set_offset(self.len() - 1);
    }
}

/// Every board of a finished or ongoing game, rebuilt by replaying its
/// history from the initial board.
#[derive(Debug, Clone)]
pub struct ReviewState {
    offset: usize,
    boards: Vec<Board>,
    history: Vec<Played>,
}

impl ReviewState {
    /// Starts at the latest position.
    pub fn new(game: &Game) -> Self {
        let mut replay = game.restart();
        let mut boards = Vec::with_capacity(game.history().len() + 1);
        boards.push(replay.board().clone());
        for played in game.history() {
            replay.commit_move(played.mv, played.player);
            boards.push(replay.board().clone());
        }
        Self {
            offset: boards.len() - 1,
            boards,
            history: game.history().to_vec(),
        }
    }

    /// The move that led to the current board, if any.
    pub fn last_move(&self) -> Option<&Played> {
        self.offset.checked_sub(1).and_then(|index| self.history.get(index))
    }
}

impl Turn for ReviewState {
    /// Whoever made the next move in the reviewed game. At the final
    /// position there is no such move and the last mover is reported.
    fn turn(&self) -> PlayerId {
        self.history
            .get(self.offset)
            .or_else(|| self.history.last())
            .map_or(PlayerId::default(), |played| played.player)
    }
}

impl Review for ReviewState {
    #[inline]
    fn len(&self) -> usize {
        self.boards.len()
    }
    #[inline]
    fn offset(&self) -> usize {
        self.offset
    }
    #[inline]
    fn get(&self, offset: usize) -> Option<&Board> {
        self.boards.get(offset)
    }
}

impl ReviewMut for ReviewState {
    #[inline]
    fn set_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.boards.len() - 1);
    }
}

impl Index<Square> for ReviewState {
    type Output = Cell;
    fn index(&self, index: Square) -> &Self::Output {
        self.current().index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::play::Validation;

    fn play(game: &mut Game, moves: &[&str]) {
        for text in moves {
            let mv = game.parse_move(text).unwrap();
            let player = game.current();
            game.apply_move(mv, Validation::STRICT, player).unwrap();
        }
    }

    #[test]
    fn test_review_empty_game() {
        let game = Game::standard();
        let review = ReviewState::new(&game);
        assert_eq!(review.len(), 1);
        assert!(review.at_start());
        assert!(review.at_end());
        assert_eq!(review.current(), game.board());
        assert!(review.last_move().is_none());
    }
    #[test]
    fn test_review_steps() {
        let mut game = Game::standard();
        play(&mut game, &["e2e4", "e7e5", "g1f3"]);
        let mut review = ReviewState::new(&game);
        assert_eq!(review.len(), 4);
        assert!(review.at_end());
        assert_eq!(review.current(), game.board());

        review.back();
        assert!(review[Square::new(5, 5)].is_empty());
        assert_eq!(review.last_move().map(|played| played.player), Some(PlayerId::new(1)));

        review.skip_to_start();
        assert_eq!(review.current(), game.initial_board());
        assert_eq!(review.turn(), PlayerId::new(0));
        review.back();
        assert!(review.at_start());

        review.forward();
        assert!(review[Square::new(4, 6)].is_empty());
        assert!(review[Square::new(4, 4)].is_occupied());
        assert_eq!(review.turn(), PlayerId::new(1));

        review.skip_to_end();
        assert_eq!(review.last(), game.board());
        assert_eq!(review.first(), game.initial_board());
    }
}
