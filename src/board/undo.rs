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

use std::ops::{Deref, DerefMut};

use super::material::{Cell, PlayerId};
use super::moves::Move;
use super::play::Game;
use super::square::Square;

/// One reversible change made while applying a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Undo {
    Cell { square: Square, prior: Cell },
    Kings { player: PlayerId, prior: Vec<Square> },
}

/// Position in the undo log. Reverting to a mark undoes every change
/// recorded after it, most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UndoMark(usize);

#[derive(Debug, Clone, Default)]
pub(crate) struct UndoLog {
    entries: Vec<Undo>,
}

impl UndoLog {
    #[inline]
    pub fn mark(&self) -> UndoMark {
        UndoMark(self.entries.len())
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    #[inline]
    pub fn push(&mut self, undo: Undo) {
        self.entries.push(undo);
    }
    /// Entries recorded after `mark`, in the order they were recorded.
    pub fn since(&self, mark: UndoMark) -> &[Undo] {
        &self.entries[mark.0.min(self.entries.len())..]
    }
    pub fn pop_to(&mut self, mark: UndoMark) -> Option<Undo> {
        if self.entries.len() > mark.0 {
            self.entries.pop()
        } else {
            None
        }
    }
    /// Keeps the changes after `mark` permanently.
    pub fn forget(&mut self, mark: UndoMark) {
        self.entries.truncate(mark.0);
    }
}

/// A move applied speculatively. Dereferences to the game in its new
/// state and reverts the move when dropped.
#[must_use = "the move is reverted as soon as the guard is dropped"]
pub struct Applied<'a> {
    game: &'a mut Game,
    mark: UndoMark,
    mv: Move,
}

impl Applied<'_> {
    #[inline]
    pub fn mv(&self) -> Move {
        self.mv
    }
    /// Reverts now rather than at the end of scope.
    pub fn revert(self) {}
}

impl Deref for Applied<'_> {
    type Target = Game;
    fn deref(&self) -> &Self::Target {
        self.game
    }
}

impl DerefMut for Applied<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.game
    }
}

impl Drop for Applied<'_> {
    fn drop(&mut self) {
        self.game.revert_to(self.mark);
    }
}

impl Game {
    /// Plays `mv` on the board without touching turn order, history or
    /// player flags. The move is not validated.
    pub fn apply(&mut self, mv: Move) -> Applied<'_> {
        let mark = self.apply_unguarded(mv);
        Applied {
            game: self,
            mark,
            mv,
        }
    }

    /// Applies `mv` and returns the mark to revert to. Every cell write
    /// goes through `set_cell`, so king lists follow the board.
    pub(crate) fn apply_unguarded(&mut self, mv: Move) -> UndoMark {
        let mark = self.undo_log().mark();
        let Some(material) = self.board().material(mv.from) else {
            return mark;
        };
        let mut placed = material.moved();
        if material.piece().is_pawn() && self.rules().auto_promote && self.promotes(mv) {
            placed.set_piece(self.rules().promote_to);
        }
        let castle = mv.castle.and_then(|partner| {
            let step = (partner - mv.from).to_unit()?;
            let partner_material = self.board().material(partner)?;
            Some((partner, partner_material, mv.to + -step))
        });
        match castle {
            Some((partner, partner_material, partner_to)) => {
                self.set_cell(mark, mv.from, Cell::Empty);
                self.set_cell(mark, partner, Cell::Empty);
                self.set_cell(mark, mv.to, placed.into());
                self.set_cell(mark, partner_to, partner_material.moved().into());
            }
            None => {
                self.set_cell(mark, mv.to, placed.into());
                self.set_cell(mark, mv.from, Cell::Empty);
            }
        }
        mark
    }

    /// True when a pawn making `mv` would have no square ahead of it.
    pub fn promotes(&self, mv: Move) -> bool {
        match self.board().material(mv.from) {
            Some(material) if material.piece().is_pawn() => {
                !self.board().contains(mv.to + material.facing())
            }
            _ => false,
        }
    }

    fn set_cell(&mut self, mark: UndoMark, square: Square, cell: Cell) {
        let prior = self.board_mut().replace(square, cell);
        self.undo_log_mut().push(Undo::Cell { square, prior });
        if let Some(material) = prior.material().filter(|m| m.piece().is_royal()) {
            self.save_kings(mark, material.owner());
            self.player_mut(material.owner())
                .kings_mut()
                .retain(|king| *king != square);
        }
        if let Some(material) = cell.material().filter(|m| m.piece().is_royal()) {
            self.save_kings(mark, material.owner());
            self.player_mut(material.owner()).kings_mut().push(square);
        }
    }

    /// Records a player's king list once per applied move, before its
    /// first change.
    fn save_kings(&mut self, mark: UndoMark, player: PlayerId) {
        let saved = self
            .undo_log()
            .since(mark)
            .iter()
            .any(|undo| matches!(undo, Undo::Kings { player: p, .. } if *p == player));
        if !saved {
            let prior = self.player(player).kings().to_vec();
            self.undo_log_mut().push(Undo::Kings { player, prior });
        }
    }

    pub(crate) fn revert_to(&mut self, mark: UndoMark) {
        while let Some(undo) = self.undo_log_mut().pop_to(mark) {
            match undo {
                Undo::Cell { square, prior } => {
                    self.board_mut().replace(square, prior);
                }
                Undo::Kings { player, prior } => {
                    *self.player_mut(player).kings_mut() = prior;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::material::Piece;
    use crate::board::position::Board;
    use crate::board::player::Player;

    fn sq(x: i32, y: i32) -> Square {
        Square::new(x, y)
    }

    fn snapshot(game: &Game) -> (Board, Vec<Player>) {
        (game.board().clone(), game.players().to_vec())
    }

    #[test]
    fn test_apply_then_drop_restores() {
        let mut game = Game::standard();
        let before = snapshot(&game);
        {
            let applied = game.apply(Move::new(sq(4, 6), sq(4, 4)));
            assert!(applied.board().is_vacant(sq(4, 6)));
            assert_eq!(applied.mv(), Move::new(sq(4, 6), sq(4, 4)));
        }
        assert_eq!(snapshot(&game), before);
        assert!(game.undo_log().is_empty());
    }
    #[test]
    fn test_nested_applies_restore_in_order() {
        let mut game = Game::standard();
        let before = snapshot(&game);
        {
            let mut first = game.apply(Move::new(sq(4, 6), sq(4, 4)));
            let middle = snapshot(&first);
            {
                let second = first.apply(Move::new(sq(3, 1), sq(3, 3)));
                assert!(second.board().is_vacant(sq(3, 1)));
                assert!(second.board().is_vacant(sq(4, 6)));
            }
            assert_eq!(snapshot(&first), middle);
            first.revert();
        }
        assert_eq!(snapshot(&game), before);
    }
    #[test]
    fn test_king_capture_updates_and_restores_kings() {
        let layout = "0 White\n2 Black\nrule elimination\n\n1K 0R\n. .\n0K .\n";
        let mut game: Game = layout.parse().unwrap();
        let black = PlayerId::new(1);
        assert_eq!(game.player(black).kings(), &[sq(0, 0)]);
        {
            let applied = game.apply(Move::new(sq(1, 0), sq(0, 0)));
            assert!(applied.player(black).kings().is_empty());
        }
        assert_eq!(game.player(black).kings(), &[sq(0, 0)]);
    }
    #[test]
    fn test_king_move_tracks_square() {
        let layout = "0 White\n2 Black\n\n1K . .\n. . .\n0H . 0K\n";
        let mut game: Game = layout.parse().unwrap();
        let white = PlayerId::new(0);
        assert_eq!(game.player(white).kings(), &[sq(0, 2), sq(2, 2)]);
        {
            let applied = game.apply(Move::new(sq(2, 2), sq(2, 1)));
            assert_eq!(applied.player(white).kings(), &[sq(0, 2), sq(2, 1)]);
        }
        assert_eq!(game.player(white).kings(), &[sq(0, 2), sq(2, 2)]);
    }
    #[test]
    fn test_promotion_to_king_adds_royal_square() {
        let layout = "0 White\n2 Black\nrule promote K\n\n. . 1K\n0P↑ . .\n0K . .\n";
        let mut game: Game = layout.parse().unwrap();
        let white = PlayerId::new(0);
        {
            let applied = game.apply(Move::new(sq(0, 1), sq(0, 0)));
            let promoted = applied.board().material(sq(0, 0)).unwrap();
            assert_eq!(promoted.piece(), Piece::King);
            assert_eq!(applied.player(white).kings(), &[sq(0, 2), sq(0, 0)]);
        }
        assert_eq!(game.player(white).kings(), &[sq(0, 2)]);
        let pawn = game.board().material(sq(0, 1)).unwrap();
        assert_eq!(pawn.piece(), Piece::Pawn);
        assert!(pawn.is_unmoved());
    }
    #[test]
    fn test_promotes_only_at_the_edge() {
        let game = Game::standard();
        assert!(!game.promotes(Move::new(sq(4, 6), sq(4, 5))));
        let layout = "0 White\n2 Black\n\n. 1K\n0P→ .\n0K .\n";
        let game: Game = layout.parse().unwrap();
        assert!(game.promotes(Move::new(sq(0, 1), sq(1, 1))));
    }
    #[test]
    fn test_castle_round_trip() {
        let layout = "0 White\n2 Black\n\n. . . . 1K . . .\n. . . . . . . .\n0R . . . 0K . . 0R\n";
        let mut game: Game = layout.parse().unwrap();
        let before = snapshot(&game);
        {
            let applied = game.apply(Move::castle(sq(4, 2), sq(2, 2), sq(0, 2)));
            assert_eq!(applied.board().material(sq(3, 2)).map(|m| m.piece()), Some(Piece::Rook));
            assert_eq!(applied.player(PlayerId::new(0)).kings(), &[sq(2, 2)]);
        }
        assert_eq!(snapshot(&game), before);
    }
}
